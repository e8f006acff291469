//! Show / hold / hide orchestration for the overlay card.
//!
//! Everything runs on a virtual millisecond timeline handed in by the caller
//! (`now` is time since the overlay started). Timers are chained: a step is
//! only scheduled once the step before it has fired, counted from the moment
//! it fired. The `is_showing` guard keeps at most one sequence in flight.
//! Crossfade timers may outlive their sequence (a long `textFadeTime`), so
//! every timer carries the generation of the sequence that scheduled it and
//! stale ones are dropped when they come due.

use super::layout::{self, TextFonts};
use super::metrics::{GlyphSurface, MeasureSurface, TextMetrics};
use super::store::{ArtworkLayer, Track, TrackStore};
use crate::app::config::OverlayConfig;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Width reserved for the skeleton loader before any track arrived.
const SKELETON_TEXT_WIDTH: f32 = 256.0;

/// Container motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OverlayPhase {
    /// Off screen (or nothing shown yet)
    #[default]
    Idle,
    /// Sliding towards the rest position
    Entering,
    /// Held fully visible
    Showing,
    /// Sliding back out
    Exiting,
}

/// Text swap micro-sequence used when the card never hides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TextPhase {
    #[default]
    Settled,
    FadingOut,
    Swapping,
    FadingIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    HoldStart,
    ExitStart,
    ExitDone,
    TextSwap,
    TextReveal,
    TextSettle,
    CrossfadeFlip,
    CrossfadeDone,
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    due: Duration,
    seq: u64,
    generation: u64,
    kind: TimerKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub transition: Duration,
    pub text_fade: Duration,
    pub display: Duration,
}

impl From<&OverlayConfig> for Timing {
    fn from(config: &OverlayConfig) -> Self {
        Self {
            transition: config.transition_time,
            text_fade: config.text_fade_time,
            display: config.display_time,
        }
    }
}

/// Two artwork layers dissolving into each other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Crossfade {
    pub old: Option<ArtworkLayer>,
    pub new: Option<ArtworkLayer>,
    /// Opacity target of the new layer
    pub opacity: f32,
}

/// Presentation state owned by the sequencer. Views only ever see a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayState {
    pub phase: OverlayPhase,
    pub text_phase: TextPhase,
    pub container_offset: f32,
    pub container_width: f32,
    pub text_opacity: f32,
    pub displayed_title: Option<String>,
    pub displayed_artists: Option<String>,
    pub crossfade: Crossfade,
    pub is_showing: bool,
}

/// Render-ready copy of the state, emitted after every transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSnapshot {
    pub at_ms: u64,
    pub phase: OverlayPhase,
    pub text_phase: TextPhase,
    pub container_offset: f32,
    pub container_width: f32,
    pub text_opacity: f32,
    pub displayed_title: Option<String>,
    pub displayed_artists: Option<String>,
    pub artwork_old: Option<ArtworkLayer>,
    pub artwork_new: Option<ArtworkLayer>,
    pub crossfade_opacity: f32,
    pub is_showing: bool,
}

/// The overlay state machine 🎬
pub struct Sequencer<S = GlyphSurface> {
    timing: Timing,
    always_show: bool,
    rest_offset: f32,
    viewport_width: f32,
    fonts: TextFonts,
    metrics: TextMetrics<S>,
    store: TrackStore,
    state: OverlayState,
    pending: Option<Track>,
    timers: Vec<Timer>,
    next_seq: u64,
    /// Bumped on every accepted track
    generation: u64,
    now: Duration,
}

impl<S: MeasureSurface> Sequencer<S> {
    pub fn new(config: &OverlayConfig, fonts: TextFonts, metrics: TextMetrics<S>) -> Self {
        let rest_offset = layout::rest_offset(config.animate_from, config.always_show);
        let viewport_width = config.viewport_width as f32;

        Self {
            timing: Timing::from(config),
            always_show: config.always_show,
            rest_offset,
            viewport_width,
            fonts,
            metrics,
            store: TrackStore::new(),
            state: OverlayState {
                phase: OverlayPhase::Idle,
                text_phase: TextPhase::Settled,
                container_offset: rest_offset,
                container_width: layout::container_width(SKELETON_TEXT_WIDTH, viewport_width),
                text_opacity: 0.0,
                displayed_title: None,
                displayed_artists: None,
                crossfade: Crossfade::default(),
                is_showing: false,
            },
            pending: None,
            timers: Vec::new(),
            next_seq: 0,
            generation: 0,
            now: Duration::ZERO,
        }
    }

    /// True while a sequence is in flight; the poller stays quiet meanwhile.
    pub fn is_showing(&self) -> bool {
        self.state.is_showing
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn store(&self) -> &TrackStore {
        &self.store
    }

    /// Track the poller compares against. A track waiting for its text swap
    /// already counts as displayed.
    pub fn current_track(&self) -> Option<&Track> {
        self.pending.as_ref().or(self.store.current())
    }

    /// True when `track` would not start a new sequence.
    pub fn is_displayed(&self, track: &Track) -> bool {
        self.current_track().is_some_and(|t| t.is_same_as(track))
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.iter().map(|t| t.due).min()
    }

    /// Start a new sequence for `track`. Rejected (returns `None`) while a
    /// sequence is already running or when the title did not change.
    pub fn present(&mut self, track: Track, now: Duration) -> Option<RenderSnapshot> {
        self.now = self.now.max(now);

        if self.state.is_showing {
            trace!(title = %track.title, "sequence in flight, track ignored");
            return None;
        }
        if self.is_displayed(&track) {
            return None;
        }

        self.generation += 1;
        info!(title = %track.title, artists = %track.artist_line(), generation = self.generation, "now playing");
        self.state.is_showing = true;

        if self.always_show {
            // Fade out first, content swaps once the text is invisible.
            self.state.phase = OverlayPhase::Showing;
            self.state.text_phase = TextPhase::FadingOut;
            self.state.text_opacity = 0.0;
            self.pending = Some(track);
            self.schedule(TimerKind::TextSwap, self.timing.text_fade);
        } else {
            self.swap_in(track);
            self.state.text_opacity = 1.0;
            self.state.container_offset = 0.0;
            self.state.phase = OverlayPhase::Entering;
            self.schedule(TimerKind::HoldStart, self.timing.transition);
        }

        Some(self.snapshot())
    }

    /// Fire every timer that is due at `now`, in order. Returns one snapshot
    /// per transition.
    pub fn advance(&mut self, now: Duration) -> Vec<RenderSnapshot> {
        self.now = self.now.max(now);
        let mut out = Vec::new();

        while let Some(idx) = self.due_timer() {
            let timer = self.timers.remove(idx);
            if timer.generation != self.generation {
                trace!(kind = ?timer.kind, generation = timer.generation, "stale timer dropped");
                continue;
            }
            debug!(kind = ?timer.kind, due_ms = timer.due.as_millis() as u64, "timer fired");
            self.fire(timer.kind);
            out.push(self.snapshot());
        }

        out
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        let s = &self.state;
        RenderSnapshot {
            at_ms: self.now.as_millis() as u64,
            phase: s.phase,
            text_phase: s.text_phase,
            container_offset: s.container_offset,
            container_width: s.container_width,
            text_opacity: s.text_opacity,
            displayed_title: s.displayed_title.clone(),
            displayed_artists: s.displayed_artists.clone(),
            artwork_old: s.crossfade.old.clone(),
            artwork_new: s.crossfade.new.clone(),
            crossfade_opacity: s.crossfade.opacity,
            is_showing: s.is_showing,
        }
    }

    fn due_timer(&self) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= self.now)
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(i, _)| i)
    }

    fn schedule(&mut self, kind: TimerKind, after: Duration) {
        self.timers.push(Timer {
            due: self.now + after,
            seq: self.next_seq,
            generation: self.generation,
            kind,
        });
        self.next_seq += 1;
    }

    fn fire(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::HoldStart => {
                self.state.phase = OverlayPhase::Showing;
                self.schedule(TimerKind::ExitStart, self.timing.display);
            }
            TimerKind::ExitStart => {
                self.state.phase = OverlayPhase::Exiting;
                self.state.container_offset = self.rest_offset;
                self.schedule(TimerKind::ExitDone, self.timing.transition);
            }
            TimerKind::ExitDone => {
                self.state.phase = OverlayPhase::Idle;
                self.state.is_showing = false;
            }
            TimerKind::TextSwap => {
                self.state.text_phase = TextPhase::Swapping;
                if let Some(track) = self.pending.take() {
                    self.swap_in(track);
                }
                // Give the width transition time to settle before revealing.
                self.schedule(TimerKind::TextReveal, self.timing.transition);
            }
            TimerKind::TextReveal => {
                self.state.text_phase = TextPhase::FadingIn;
                self.state.text_opacity = 1.0;
                self.schedule(TimerKind::TextSettle, self.timing.text_fade);
            }
            TimerKind::TextSettle => {
                self.state.text_phase = TextPhase::Settled;
                self.state.is_showing = false;
            }
            TimerKind::CrossfadeFlip => {
                self.state.crossfade.opacity = 1.0;
                self.schedule(TimerKind::CrossfadeDone, self.timing.text_fade);
            }
            TimerKind::CrossfadeDone => {
                self.state.crossfade.old = None;
                self.store.retire_previous();
            }
        }
    }

    /// Install `track` as current, refit the card and start the artwork crossfade.
    fn swap_in(&mut self, track: Track) {
        self.fit(&track);

        let old = self.state.crossfade.new.take();
        self.state.crossfade = Crossfade {
            old,
            new: track
                .artwork
                .clone()
                .map(|art| ArtworkLayer::new(art, self.generation)),
            opacity: 0.0,
        };
        self.store.set(track);
        self.schedule(TimerKind::CrossfadeFlip, Duration::ZERO);
    }

    fn fit(&mut self, track: &Track) {
        let fitted = layout::fit_track(&mut self.metrics, track, &self.fonts, self.viewport_width);
        self.state.container_width = fitted.container_width;
        self.state.displayed_title = Some(fitted.title);
        self.state.displayed_artists = Some(fitted.artists);
    }
}
