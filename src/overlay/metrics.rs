use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use unicode_width::UnicodeWidthChar;

/// Marker appended to text that had to be shortened.
pub const ELLIPSIS: &str = "...";

#[derive(Debug, Error, PartialEq)]
pub enum FontParseError {
    #[error("font shorthand is empty")]
    Empty,
    #[error("font size missing or not in px: '{0}'")]
    Size(String),
    #[error("font weight not recognised: '{0}'")]
    Weight(String),
    #[error("font family missing in '{0}'")]
    Family(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl FontStyle {
    fn keyword(&self) -> &'static str {
        match self {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
            FontStyle::Oblique => "oblique",
        }
    }

    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "normal" => Some(FontStyle::Normal),
            "italic" => Some(FontStyle::Italic),
            "oblique" => Some(FontStyle::Oblique),
            _ => None,
        }
    }
}

/// A resolved font, equivalent to the CSS `font` shorthand
/// `"<style> <weight> <size>px <family>"`.
#[derive(Debug, Clone, PartialEq)]
pub struct FontDescriptor {
    pub style: FontStyle,
    pub weight: u16,
    pub size_px: f32,
    pub family: String,
}

impl FontDescriptor {
    pub fn new(weight: u16, size_px: f32, family: &str) -> Self {
        Self {
            style: FontStyle::Normal,
            weight,
            size_px,
            family: family.to_string(),
        }
    }

    /// Build a descriptor from the style a live text element actually resolved to.
    /// Nothing is cached: re-derive after every theme change.
    pub fn from_computed_style(style: &ComputedStyle) -> Result<Self, FontParseError> {
        [
            style.font_style.as_str(),
            style.font_weight.as_str(),
            style.font_size.as_str(),
            style.font_family.as_str(),
        ]
        .join(" ")
        .parse()
    }
}

fn parse_weight(word: &str) -> Option<u16> {
    match word {
        "normal" => Some(400),
        "bold" => Some(700),
        "lighter" => Some(300),
        "bolder" => Some(800),
        w => w.parse::<u16>().ok().filter(|w| (1..=1000).contains(w)),
    }
}

impl FromStr for FontDescriptor {
    type Err = FontParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(FontParseError::Empty);
        }

        let mut style = FontStyle::Normal;
        let mut weight = 400;
        let mut words = s.split_whitespace().peekable();

        // Style and weight are optional and come before the size.
        while let Some(word) = words.peek().copied() {
            if word.ends_with("px") {
                break;
            }
            if let Some(st) = FontStyle::from_keyword(word) {
                // "normal" is ambiguous; treat it as the style slot first.
                style = if st == FontStyle::Normal { style } else { st };
            } else if let Some(w) = parse_weight(word) {
                weight = w;
            } else {
                return Err(FontParseError::Weight(word.to_string()));
            }
            words.next();
        }

        let size_word = words.next().ok_or_else(|| FontParseError::Size(s.to_string()))?;
        let size_px = size_word
            .strip_suffix("px")
            .and_then(|n| n.parse::<f32>().ok())
            .filter(|n| *n > 0.0)
            .ok_or_else(|| FontParseError::Size(size_word.to_string()))?;

        let family = words.collect::<Vec<_>>().join(" ");
        if family.is_empty() {
            return Err(FontParseError::Family(s.to_string()));
        }

        Ok(Self {
            style,
            weight,
            size_px,
            family,
        })
    }
}

impl fmt::Display for FontDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}px {}",
            self.style.keyword(),
            self.weight,
            self.size_px,
            self.family
        )
    }
}

/// The four font properties read back from a rendered element.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub font_style: String,
    pub font_weight: String,
    pub font_size: String,
    pub font_family: String,
}

/// Off-screen surface that text is measured on. Never part of the visible layout.
pub trait MeasureSurface {
    fn set_font(&mut self, font: &FontDescriptor);
    fn measure_text(&mut self, text: &str) -> f32;
}

/// Estimates advances from terminal cell widths scaled by the font.
#[derive(Debug, Default)]
pub struct GlyphSurface {
    font: Option<FontDescriptor>,
    advance_px: f32,
}

impl GlyphSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn family_ratio(family: &str) -> f32 {
        let primary = family
            .split(',')
            .next()
            .unwrap_or("")
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
            .to_lowercase();

        if primary.contains("mono") {
            0.6
        } else if primary == "inter" {
            0.58
        } else if primary.contains("serif") && !primary.contains("sans") {
            0.5
        } else {
            0.55
        }
    }
}

impl MeasureSurface for GlyphSurface {
    fn set_font(&mut self, font: &FontDescriptor) {
        if self.font.as_ref() == Some(font) {
            return;
        }
        let weight_factor = 1.0 + (font.weight as f32 - 400.0) / 2500.0;
        self.advance_px = font.size_px * Self::family_ratio(&font.family) * weight_factor;
        self.font = Some(font.clone());
    }

    fn measure_text(&mut self, text: &str) -> f32 {
        let cells: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
        cells as f32 * self.advance_px
    }
}

/// Measurement and ellipsis fitting on a single reusable surface 📏
pub struct TextMetrics<S = GlyphSurface> {
    surface: S,
}

impl Default for TextMetrics<GlyphSurface> {
    fn default() -> Self {
        Self::new(GlyphSurface::new())
    }
}

impl<S: MeasureSurface> TextMetrics<S> {
    pub fn new(surface: S) -> Self {
        Self { surface }
    }

    pub fn measure(&mut self, text: &str, font: &FontDescriptor) -> f32 {
        self.surface.set_font(font);
        self.surface.measure_text(text)
    }

    /// Shorten `text` one character at a time, appending [`ELLIPSIS`], until it
    /// fits `max_width`. Returns the bare ellipsis when nothing else fits.
    pub fn truncate(&mut self, text: &str, font: &FontDescriptor, max_width: f32) -> String {
        if self.measure(text, font) <= max_width {
            return text.to_string();
        }

        // Every char boundary is a candidate cut; the longest prefix wins.
        for (cut, _) in text.char_indices().rev() {
            let candidate = format!("{}{}", &text[..cut], ELLIPSIS);
            if self.measure(&candidate, font) <= max_width {
                return candidate;
            }
        }

        ELLIPSIS.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every character is 10px wide.
    struct FixedSurface;

    impl MeasureSurface for FixedSurface {
        fn set_font(&mut self, _font: &FontDescriptor) {}
        fn measure_text(&mut self, text: &str) -> f32 {
            text.chars().count() as f32 * 10.0
        }
    }

    fn font() -> FontDescriptor {
        FontDescriptor::new(700, 36.0, "Inter")
    }

    #[test]
    fn test_truncate_keeps_fitting_text() {
        let mut metrics = TextMetrics::new(FixedSurface);
        assert_eq!(metrics.truncate("Hello", &font(), 50.0), "Hello");
    }

    #[test]
    fn test_truncate_shortens_with_ellipsis() {
        let mut metrics = TextMetrics::new(FixedSurface);
        // 8 chars fit into 80px: 5 kept + "..."
        let out = metrics.truncate("Hello World", &font(), 80.0);
        assert_eq!(out, "Hello...");
        assert!(metrics.measure(&out, &font()) <= 80.0);
    }

    #[test]
    fn test_truncate_degenerate_floor() {
        let mut metrics = TextMetrics::new(FixedSurface);
        assert_eq!(metrics.truncate("Hello", &font(), 20.0), ELLIPSIS);
        // Applying it again must not grow the marker.
        assert_eq!(metrics.truncate(ELLIPSIS, &font(), 20.0), ELLIPSIS);
    }

    #[test]
    fn test_truncate_idempotent() {
        let mut metrics = TextMetrics::new(FixedSurface);
        for text in ["", "a", "Bohemian Rhapsody", "日本語のタイトル", "..."] {
            for width in [0.0, 25.0, 30.0, 55.0, 120.0, 500.0] {
                let once = metrics.truncate(text, &font(), width);
                let twice = metrics.truncate(&once, &font(), width);
                assert_eq!(once, twice, "text {:?} width {}", text, width);
            }
        }
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let mut metrics = TextMetrics::new(FixedSurface);
        let out = metrics.truncate("héllo wörld", &font(), 60.0);
        assert_eq!(out, "hél...");
    }

    #[test]
    fn test_glyph_surface_wide_chars_take_two_cells() {
        let mut metrics = TextMetrics::default();
        let f = FontDescriptor::new(400, 10.0, "monospace");
        let narrow = metrics.measure("ab", &f);
        let wide = metrics.measure("日", &f);
        assert!((narrow - wide).abs() < f32::EPSILON);
        assert!((narrow - 12.0).abs() < 0.001);
    }

    #[test]
    fn test_glyph_surface_bold_is_wider() {
        let mut metrics = TextMetrics::default();
        let regular = metrics.measure("Title", &FontDescriptor::new(400, 36.0, "Inter"));
        let bold = metrics.measure("Title", &FontDescriptor::new(700, 36.0, "Inter"));
        assert!(bold > regular);
    }

    #[test]
    fn test_parse_font_shorthand() {
        let f: FontDescriptor = "normal 700 36px Inter".parse().unwrap();
        assert_eq!(f, FontDescriptor::new(700, 36.0, "Inter"));

        let f: FontDescriptor = "italic bold 24px \"Inter\", sans-serif".parse().unwrap();
        assert_eq!(f.style, FontStyle::Italic);
        assert_eq!(f.weight, 700);
        assert_eq!(f.family, "\"Inter\", sans-serif");

        assert_eq!(
            "700 Inter".parse::<FontDescriptor>(),
            Err(FontParseError::Weight("Inter".to_string()))
        );
        assert!(matches!(
            "normal 600 36px".parse::<FontDescriptor>(),
            Err(FontParseError::Family(_))
        ));
    }

    #[test]
    fn test_font_round_trips_through_display() {
        let f = FontDescriptor::new(600, 36.0, "Inter");
        assert_eq!(f.to_string(), "normal 600 36px Inter");
        assert_eq!(f.to_string().parse::<FontDescriptor>().unwrap(), f);
    }

    #[test]
    fn test_from_computed_style() {
        let style = ComputedStyle {
            font_style: "normal".into(),
            font_weight: "600".into(),
            font_size: "36px".into(),
            font_family: "Inter".into(),
        };
        let f = FontDescriptor::from_computed_style(&style).unwrap();
        assert_eq!(f.weight, 600);
        assert_eq!(f.size_px, 36.0);
    }
}
