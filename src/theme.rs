use crate::app::config::{Flavour, Keyword, ThemeColor};
use crate::overlay::metrics::{ComputedStyle, FontDescriptor, FontParseError};
use crate::overlay::TextFonts;
use ratatui::style::Color;

type Rgb = (u8, u8, u8);

/// Accent colours in `ThemeColor` order, then overlay0, surface0, base, mantle, crust.
struct Palette {
    accents: [Rgb; 15],
    overlay: Rgb,
    surface: Rgb,
    base: Rgb,
    mantle: Rgb,
    crust: Rgb,
}

const LATTE: Palette = Palette {
    accents: [
        (220, 138, 120),
        (221, 120, 120),
        (234, 118, 203),
        (136, 57, 239),
        (210, 15, 57),
        (230, 69, 83),
        (254, 100, 11),
        (223, 142, 29),
        (64, 160, 43),
        (23, 146, 153),
        (4, 165, 229),
        (32, 159, 181),
        (30, 102, 245),
        (114, 135, 253),
        (76, 79, 105),
    ],
    overlay: (156, 160, 176),
    surface: (204, 208, 218),
    base: (239, 241, 245),
    mantle: (230, 233, 239),
    crust: (220, 224, 232),
};

const FRAPPE: Palette = Palette {
    accents: [
        (242, 213, 207),
        (238, 190, 190),
        (244, 184, 228),
        (202, 158, 230),
        (231, 130, 132),
        (234, 153, 156),
        (239, 159, 118),
        (229, 200, 144),
        (166, 209, 137),
        (129, 200, 190),
        (153, 209, 219),
        (133, 193, 220),
        (140, 170, 238),
        (186, 187, 241),
        (198, 208, 245),
    ],
    overlay: (115, 121, 148),
    surface: (65, 69, 89),
    base: (48, 52, 70),
    mantle: (41, 44, 60),
    crust: (35, 38, 52),
};

const MACCHIATO: Palette = Palette {
    accents: [
        (244, 219, 214),
        (240, 198, 198),
        (245, 189, 230),
        (198, 160, 246),
        (237, 135, 150),
        (238, 153, 160),
        (245, 169, 127),
        (238, 212, 159),
        (166, 218, 149),
        (139, 213, 202),
        (145, 215, 227),
        (125, 196, 228),
        (138, 173, 244),
        (183, 189, 248),
        (202, 211, 245),
    ],
    overlay: (110, 115, 141),
    surface: (54, 58, 79),
    base: (36, 39, 58),
    mantle: (30, 32, 48),
    crust: (24, 25, 38),
};

const MOCHA: Palette = Palette {
    accents: [
        (245, 224, 220),
        (242, 205, 205),
        (245, 194, 231),
        (203, 166, 247),
        (243, 139, 168),
        (235, 160, 172),
        (250, 179, 135),
        (249, 226, 175),
        (166, 227, 161),
        (148, 226, 213),
        (137, 220, 235),
        (116, 199, 236),
        (137, 180, 250),
        (180, 190, 254),
        (205, 214, 244),
    ],
    overlay: (108, 112, 134),
    surface: (49, 50, 68),
    base: (30, 30, 46),
    mantle: (24, 24, 37),
    crust: (17, 17, 27),
};

/// Which text line a style is read for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Artist,
    Song,
}

const FONT_FAMILY: &str = "Inter";
const FONT_SIZE: &str = "36px"; // text-4xl

#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
    pub flavour: Flavour,
    pub text: Color,
    pub overlay: Color,
    pub surface: Color,
    pub base: Color,
    pub mantle: Color,
    pub crust: Color,
    accents: [Color; 15],
}

fn rgb((r, g, b): Rgb) -> Color {
    Color::Rgb(r, g, b)
}

impl Theme {
    pub fn new(flavour: Flavour) -> Self {
        let p = match flavour {
            Flavour::Latte => &LATTE,
            Flavour::Frappe => &FRAPPE,
            Flavour::Macchiato => &MACCHIATO,
            Flavour::Mocha => &MOCHA,
        };
        Self {
            flavour,
            text: rgb(p.accents[14]),
            overlay: rgb(p.overlay),
            surface: rgb(p.surface),
            base: rgb(p.base),
            mantle: rgb(p.mantle),
            crust: rgb(p.crust),
            accents: p.accents.map(rgb),
        }
    }

    pub fn color(&self, role: ThemeColor) -> Color {
        let idx = ThemeColor::VARIANTS
            .iter()
            .position(|(_, c)| *c == role)
            .unwrap_or(14);
        self.accents[idx]
    }

    /// The style a rendered text line of `role` resolves to under this theme.
    pub fn computed_style(&self, role: TextRole) -> ComputedStyle {
        let weight = match role {
            TextRole::Artist => "700", // font-bold
            TextRole::Song => "600",   // font-semibold
        };
        ComputedStyle {
            font_style: "normal".to_string(),
            font_weight: weight.to_string(),
            font_size: FONT_SIZE.to_string(),
            font_family: FONT_FAMILY.to_string(),
        }
    }

    /// Read both line fonts back from the theme. Call again after a theme swap.
    pub fn text_fonts(&self) -> Result<TextFonts, FontParseError> {
        Ok(TextFonts {
            artist: FontDescriptor::from_computed_style(&self.computed_style(TextRole::Artist))?,
            song: FontDescriptor::from_computed_style(&self.computed_style(TextRole::Song))?,
        })
    }
}

/// Linear mix of two RGB colours; `t = 0` gives `a`, `t = 1` gives `b`.
/// Non-RGB colours are returned as-is from the nearer end.
pub fn mix(a: Color, b: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    match (a, b) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
            let lerp = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
            Color::Rgb(lerp(r1, r2), lerp(g1, g2), lerp(b1, b2))
        }
        _ if t < 0.5 => a,
        _ => b,
    }
}
