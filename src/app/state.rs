use super::config::OverlayConfig;
use crate::artwork::{ArtworkCache, ArtworkState};
use crate::overlay::metrics::FontParseError;
use crate::overlay::sequencer::Timing;
use crate::overlay::{ArtworkLayer, RenderSnapshot, Sequencer, TextMetrics, Track};
use crate::theme::Theme;
use crate::ui::tween::Animator;
use crate::ui::View;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

/// Runtime state owned by the event loop. The sequencer is the only writer of
/// presentation state; everything else follows its snapshots.
pub struct App {
    pub config: OverlayConfig,
    pub theme: Theme,
    pub sequencer: Sequencer,
    pub animator: Animator,
    pub artwork: ArtworkCache,
    /// Last emitted snapshot
    pub snapshot: RenderSnapshot,
    pub is_running: bool,
}

impl App {
    pub fn new(config: OverlayConfig) -> Result<Self, FontParseError> {
        let theme = Theme::new(config.theme);
        let sequencer = Sequencer::new(&config, theme.text_fonts()?, TextMetrics::default());
        let snapshot = sequencer.snapshot();
        let animator = Animator::new(Timing::from(&config), &snapshot);

        Ok(Self {
            config,
            theme,
            sequencer,
            animator,
            artwork: ArtworkCache::new(),
            snapshot,
            is_running: true,
        })
    }

    /// Hand a changed track to the sequencer. `None` if it was turned away.
    pub fn present(&mut self, track: Track, now: Duration) -> Option<RenderSnapshot> {
        let snap = self.sequencer.present(track, now)?;
        self.record(std::slice::from_ref(&snap), now);
        Some(snap)
    }

    /// Fire due timers; returns the snapshots they produced.
    pub fn advance(&mut self, now: Duration) -> Vec<RenderSnapshot> {
        let snaps = self.sequencer.advance(now);
        self.record(&snaps, now);
        snaps
    }

    fn record(&mut self, snaps: &[RenderSnapshot], now: Duration) {
        for snap in snaps {
            self.animator.apply(snap, now);
        }
        if let Some(last) = snaps.last() {
            self.snapshot = last.clone();
            self.artwork
                .retain_only(&[last.artwork_old.as_ref(), last.artwork_new.as_ref()]);
        }
    }

    /// Layers the snapshot shows that have not been requested yet. Each one
    /// is marked as loading on the way out.
    pub fn missing_artwork(&mut self) -> Vec<ArtworkLayer> {
        let shown = [
            self.snapshot.artwork_old.clone(),
            self.snapshot.artwork_new.clone(),
        ];
        shown
            .into_iter()
            .flatten()
            .filter(|layer| self.artwork.request(layer))
            .collect()
    }

    pub fn on_artwork(&mut self, layer: ArtworkLayer, state: ArtworkState) {
        self.artwork.finish(layer, state);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.is_running = false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.is_running = false
            }
            _ => {}
        }
    }

    pub fn view(&mut self, now: Duration) -> View<'_> {
        View {
            config: &self.config,
            theme: &self.theme,
            snapshot: &self.snapshot,
            sampled: self.animator.sample(now),
            artwork: &mut self.artwork,
        }
    }
}
