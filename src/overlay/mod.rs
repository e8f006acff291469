pub mod layout;
pub mod metrics;
pub mod sequencer;
pub mod store;

pub use layout::{FittedText, TextFonts};
pub use metrics::{ComputedStyle, FontDescriptor, GlyphSurface, MeasureSurface, TextMetrics, ELLIPSIS};
pub use sequencer::{OverlayPhase, OverlayState, RenderSnapshot, Sequencer, TextPhase};
pub use store::{ArtworkLayer, ArtworkRef, Track, TrackStore};
