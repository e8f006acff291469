use crate::overlay::{MeasureSurface, Sequencer, Track};
use crate::source::NowPlayingSource;
use tracing::{debug, trace};

/// What a single poll tick ended with.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// A sequence was in flight; no request was made
    Skipped,
    /// Fetch or parse failed; retried next tick
    Failed,
    /// Source reported no title
    NothingPlaying,
    Unchanged,
    Changed(Track),
}

/// Interval-driven fetcher. Best effort: errors never leave this type.
pub struct Poller<T> {
    source: T,
    use_local_file: bool,
    fetches: u64,
}

impl<T: NowPlayingSource> Poller<T> {
    pub fn new(source: T, use_local_file: bool) -> Self {
        Self {
            source,
            use_local_file,
            fetches: 0,
        }
    }

    /// Number of requests issued so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetches
    }

    /// Run one tick against the sequencer's current state. The caller hands a
    /// `Changed` track to [`Sequencer::present`].
    pub async fn poll<S: MeasureSurface>(&mut self, sequencer: &Sequencer<S>) -> PollOutcome {
        // Backpressure: wait for the running sequence to finish.
        if sequencer.is_showing() {
            trace!("overlay busy, poll skipped");
            return PollOutcome::Skipped;
        }

        self.fetches += 1;
        let now_playing = match self.source.fetch().await {
            Ok(np) => np,
            Err(e) => {
                debug!(error = %e, "now playing fetch failed");
                return PollOutcome::Failed;
            }
        };

        if now_playing.is_empty() {
            return PollOutcome::NothingPlaying;
        }
        let track = now_playing.into_track(self.use_local_file);
        if sequencer.is_displayed(&track) {
            return PollOutcome::Unchanged;
        }

        PollOutcome::Changed(track)
    }
}
