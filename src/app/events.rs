use crate::artwork::ArtworkState;
use crate::overlay::ArtworkLayer;
use crossterm::event::Event;

pub enum AppEvent {
    Input(Event),
    ArtworkUpdate(ArtworkLayer, ArtworkState),
}
