use super::metrics::{FontDescriptor, MeasureSurface, TextMetrics};
use super::store::Track;
use crate::app::config::AnimateFrom;

/// Card height in logical px.
pub const CARD_HEIGHT: f32 = 160.0;
/// Outer margin around the card, top and bottom combined.
pub const CARD_PADDING: f32 = 32.0;
/// How far the card slides to leave the viewport.
pub const TRAVEL_DISTANCE: f32 = CARD_HEIGHT + CARD_PADDING;
pub const ART_SIZE: f32 = 128.0;
/// Art + inner padding + gap before the text column.
pub const BASE_WIDTH: f32 = 176.0;
/// Horizontal margins kept free between card and viewport edges.
pub const MARGINS: f32 = 32.0;

/// Offset of the container when it is not on screen.
pub fn rest_offset(animate_from: AnimateFrom, always_show: bool) -> f32 {
    if always_show {
        return 0.0;
    }
    match animate_from {
        AnimateFrom::Top => -TRAVEL_DISTANCE,
        AnimateFrom::Bottom => TRAVEL_DISTANCE,
    }
}

/// Room left for text once art, padding and margins are taken.
pub fn max_text_width(viewport_width: f32) -> f32 {
    (viewport_width - BASE_WIDTH - MARGINS).max(0.0)
}

/// Clamp to `[BASE_WIDTH, viewport - MARGINS]`; the base width wins on tiny viewports.
pub fn container_width(text_width: f32, viewport_width: f32) -> f32 {
    (BASE_WIDTH + text_width)
        .min(viewport_width - MARGINS)
        .max(BASE_WIDTH)
}

/// Fonts of the two text lines, resolved from the live theme.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFonts {
    pub artist: FontDescriptor,
    pub song: FontDescriptor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FittedText {
    pub title: String,
    pub artists: String,
    pub container_width: f32,
}

/// Size the card for `track` and cut both lines down to the space left.
pub fn fit_track<S: MeasureSurface>(
    metrics: &mut TextMetrics<S>,
    track: &Track,
    fonts: &TextFonts,
    viewport_width: f32,
) -> FittedText {
    let artist_line = track.artist_line();

    let widest = metrics
        .measure(&track.title, &fonts.song)
        .max(metrics.measure(&artist_line, &fonts.artist));

    let room = max_text_width(viewport_width);

    FittedText {
        title: metrics.truncate(&track.title, &fonts.song, room),
        artists: metrics.truncate(&artist_line, &fonts.artist, room),
        container_width: container_width(widest, viewport_width),
    }
}
