pub mod card;
pub mod config_errors;
pub mod tween;
pub mod utils;

use crate::app::config::{ConfigError, OverlayConfig};
use crate::artwork::ArtworkCache;
use crate::overlay::RenderSnapshot;
use crate::theme::Theme;
use ratatui::Frame;
use tween::Sampled;

/// Everything one frame needs, borrowed from the event loop.
pub struct View<'a> {
    pub config: &'a OverlayConfig,
    pub theme: &'a Theme,
    pub snapshot: &'a RenderSnapshot,
    pub sampled: Sampled,
    pub artwork: &'a mut ArtworkCache,
}

pub fn ui(f: &mut Frame, view: &mut View) {
    let area = f.area();

    // Transparent scene: only the card is painted
    card::render(f, area, view);
}

pub fn ui_config_error(f: &mut Frame, error: &ConfigError, theme: &Theme) {
    let area = f.area();
    config_errors::render(f, area, error, theme);
}
