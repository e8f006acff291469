use super::utils::{px_to_cells, truncate_cells};
use super::View;
use crate::app::config::{AnimateFrom, BackgroundStyle, Justify};
use crate::artwork::ArtworkRenderer;
use crate::overlay::layout::{ART_SIZE, CARD_HEIGHT, CARD_PADDING, MARGINS};
use crate::theme::mix;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// Card geometry in terminal cells, before clipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardCells {
    pub x: i32,
    pub y: i32,
    pub cols: i32,
    pub rows: i32,
    pub art_cols: i32,
    pub art_rows: i32,
}

/// Map the card from logical px onto `area`. The viewport width spans the
/// full terminal width; a cell is taken to be twice as tall as it is wide.
pub fn place_card(area: Rect, view: &View) -> CardCells {
    let cfg = view.config;
    let s = view.sampled;
    let width = area.width as i32;
    let height = area.height as i32;

    let px_per_col = cfg.viewport_width as f32 / area.width.max(1) as f32;
    let px_per_row = px_per_col * 2.0;

    let cols = px_to_cells(s.container_width, px_per_col).clamp(4, width.max(4));
    let rows = px_to_cells(CARD_HEIGHT, px_per_row).max(4);
    let margin_cols = px_to_cells(MARGINS / 2.0, px_per_col);
    let margin_rows = px_to_cells(CARD_PADDING / 2.0, px_per_row);

    let x = match cfg.justify {
        Justify::Left => margin_cols,
        Justify::Center => (width - cols) / 2,
        Justify::Right => width - cols - margin_cols,
    }
    .max(0);

    let anchor_y = match cfg.animate_from {
        AnimateFrom::Top => margin_rows,
        AnimateFrom::Bottom => height - rows - margin_rows,
    };
    let y = anchor_y + px_to_cells(s.container_offset, px_per_row);

    let inner_rows = rows - 2;
    CardCells {
        x,
        y,
        cols,
        rows,
        art_cols: px_to_cells(ART_SIZE, px_per_col).max(2),
        art_rows: px_to_cells(ART_SIZE, px_per_row).clamp(1, inner_rows.max(1)),
    }
}

fn pad(spans: &mut Vec<Span<'static>>, used: usize, width: usize) {
    if width > used {
        spans.push(Span::raw(" ".repeat(width - used)));
    }
}

pub fn render(f: &mut Frame, area: Rect, view: &mut View) {
    if area.width < 4 || area.height < 4 {
        return;
    }

    let cfg = view.config;
    let theme = view.theme;
    let snap = view.snapshot;
    let cells = place_card(area, view);

    // 1. Clip against the viewport
    let top = cells.y.max(0);
    let bottom = (cells.y + cells.rows).min(area.height as i32);
    if bottom <= top {
        return;
    }
    let cols = cells.cols.min(area.width as i32 - cells.x).max(0) as u16;
    let visible = Rect::new(
        area.x + cells.x as u16,
        area.y + top as u16,
        cols,
        (bottom - top) as u16,
    );
    let skip_rows = (top - cells.y) as u16;

    // 2. Background + artwork layers
    let old_layer = snap.artwork_old.as_ref();
    let new_layer = snap.artwork_new.as_ref();
    let art_width = cells.art_cols as u32;
    let art_height = cells.art_rows as u32 * 2;
    view.artwork.fit(&[old_layer, new_layer], art_width, art_height);
    let artwork = &*view.artwork;

    let bg = match cfg.background_style {
        BackgroundStyle::Solid => theme.base,
        BackgroundStyle::Blur => match artwork.average(new_layer).or(artwork.average(old_layer)) {
            // bg-base at 75% over the blurred cover
            Some((r, g, b)) => mix(theme.base, Color::Rgb(r, g, b), 0.25),
            None => theme.base,
        },
    };
    let border = match cfg.background_style {
        BackgroundStyle::Blur => mix(bg, theme.color(cfg.accent_color), 0.7),
        BackgroundStyle::Solid => theme.crust,
    };
    let ring = theme.color(cfg.album_color);

    let old_img = artwork.fitted(old_layer);
    let new_img = artwork.fitted(new_layer);
    let art_lines = if old_img.is_some() || new_img.is_some() {
        let crust = match theme.crust {
            Color::Rgb(r, g, b) => (r, g, b),
            _ => (0, 0, 0),
        };
        let img = ArtworkRenderer::blend_layers(
            old_img,
            new_img,
            view.sampled.crossfade,
            art_width,
            art_height,
            crust,
        );
        Some(ArtworkRenderer::render_to_lines(&img))
    } else {
        None
    };

    // 3. Rows
    let inner = (cells.cols - 2).max(0) as usize;
    let inner_rows = (cells.rows - 2).max(0);
    let art_top = (inner_rows - cells.art_rows) / 2;
    let text_first = (inner_rows - 2).max(0) / 2;
    let text_cols = inner.saturating_sub(1 + 1 + cells.art_cols as usize + 1 + 2);
    let opacity = view.sampled.text_opacity;

    let artist_style = Style::default()
        .fg(mix(bg, theme.color(cfg.artist_color), opacity))
        .add_modifier(Modifier::BOLD);
    let song_style = Style::default()
        .fg(mix(bg, theme.color(cfg.song_color), opacity))
        .add_modifier(Modifier::BOLD);
    let skeleton = Style::default().fg(theme.crust);

    let edge = Style::default().fg(border);
    let mut lines: Vec<Line<'static>> = Vec::with_capacity(cells.rows as usize);
    lines.push(Line::from(Span::styled(
        format!("╭{}╮", "─".repeat(inner)),
        edge,
    )));

    for row in 0..inner_rows {
        let mut spans: Vec<Span<'static>> = vec![Span::styled("│", edge), Span::raw(" ")];
        let mut used = 1;

        // Album art with its ring
        let art_row = row - art_top;
        if (0..cells.art_rows).contains(&art_row) {
            spans.push(Span::styled("▐", Style::default().fg(ring)));
            match &art_lines {
                Some(art) => {
                    if let Some((chars, colors)) = art.get(art_row as usize) {
                        for (ch, c) in chars.chars().zip(colors.iter()) {
                            spans.push(Span::styled(
                                ch.to_string(),
                                Style::default()
                                    .fg(Color::Rgb(c.0, c.1, c.2))
                                    .bg(Color::Rgb(c.3, c.4, c.5)),
                            ));
                        }
                    }
                }
                None => spans.push(Span::styled(
                    " ".repeat(cells.art_cols as usize),
                    Style::default().bg(theme.crust),
                )),
            }
            spans.push(Span::styled("▌", Style::default().fg(ring)));
        } else {
            spans.push(Span::raw(" ".repeat(cells.art_cols as usize + 2)));
        }
        used += cells.art_cols as usize + 2;
        spans.push(Span::raw("  "));
        used += 2;

        // Artist above title, both centred on the art
        let text = if row == text_first {
            Some((snap.displayed_artists.as_deref(), artist_style, 12))
        } else if row == text_first + 1 {
            Some((snap.displayed_title.as_deref(), song_style, 16))
        } else {
            None
        };
        match text {
            Some((Some(s), style, _)) => {
                let cut = truncate_cells(s, text_cols);
                used += cut.width();
                spans.push(Span::styled(cut, style));
            }
            Some((None, _, loader)) => {
                let n = text_cols.min(loader);
                used += n;
                spans.push(Span::styled("█".repeat(n), skeleton));
            }
            None => {}
        }

        pad(&mut spans, used, inner);
        spans.push(Span::styled("│", edge));
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(Span::styled(
        format!("╰{}╯", "─".repeat(inner)),
        edge,
    )));

    f.render_widget(Clear, visible);
    let card = Paragraph::new(lines)
        .style(Style::default().bg(bg))
        .scroll((skip_rows, 0));
    f.render_widget(card, visible);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::OverlayConfig;
    use crate::artwork::ArtworkCache;
    use crate::overlay::{RenderSnapshot, OverlayPhase, TextPhase};
    use crate::theme::Theme;
    use crate::ui::tween::Sampled;

    fn snapshot(offset: f32, width: f32) -> RenderSnapshot {
        RenderSnapshot {
            at_ms: 0,
            phase: OverlayPhase::Showing,
            text_phase: TextPhase::Settled,
            container_offset: offset,
            container_width: width,
            text_opacity: 1.0,
            displayed_title: Some("Title".into()),
            displayed_artists: Some("Artist".into()),
            artwork_old: None,
            artwork_new: None,
            crossfade_opacity: 1.0,
            is_showing: true,
        }
    }

    fn place(config: &OverlayConfig, offset: f32, width: f32) -> CardCells {
        let theme = Theme::new(config.theme);
        let mut cache = ArtworkCache::new();
        let snap = snapshot(offset, width);
        let view = View {
            config,
            theme: &theme,
            snapshot: &snap,
            sampled: Sampled {
                container_offset: offset,
                container_width: width,
                text_opacity: 1.0,
                crossfade: 1.0,
            },
            artwork: &mut cache,
        };
        place_card(Rect::new(0, 0, 120, 40), &view)
    }

    #[test]
    fn test_card_scaled_to_terminal() {
        // 1920px over 120 cols: 16px per col, 32px per row
        let cells = place(&OverlayConfig::default(), 0.0, 960.0);
        assert_eq!(cells.cols, 60);
        assert_eq!(cells.rows, 5);
        assert_eq!(cells.x, 30);
        assert_eq!(cells.y, 1);
        assert_eq!(cells.art_cols, 8);
    }

    #[test]
    fn test_hidden_card_is_above_viewport() {
        let cells = place(&OverlayConfig::default(), -192.0, 960.0);
        assert!(cells.y + cells.rows <= 0);
    }

    #[test]
    fn test_bottom_and_right() {
        let config = OverlayConfig {
            animate_from: AnimateFrom::Bottom,
            justify: Justify::Right,
            ..OverlayConfig::default()
        };
        let cells = place(&config, 0.0, 480.0);
        assert_eq!(cells.x + cells.cols, 120 - 1);
        assert_eq!(cells.y + cells.rows, 40 - 1);

        let hidden = place(&config, 192.0, 480.0);
        assert!(hidden.y >= 40);
    }

    #[test]
    fn test_render_fits_cover_to_art_box() {
        use crate::artwork::{ArtworkState, LoadedArt};
        use crate::overlay::{ArtworkLayer, ArtworkRef};
        use image::{DynamicImage, Rgb, RgbImage};
        use ratatui::{backend::TestBackend, Terminal};

        let config = OverlayConfig::default();
        let theme = Theme::new(config.theme);
        let layer = ArtworkLayer::new(ArtworkRef::Local("cover.png".into()), 1);
        let mut cache = ArtworkCache::new();
        cache.request(&layer);
        let cover = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([90, 40, 20])));
        cache.finish(layer.clone(), ArtworkState::Loaded(LoadedArt::new(cover)));

        let snap = RenderSnapshot {
            artwork_new: Some(layer.clone()),
            ..snapshot(0.0, 960.0)
        };
        let mut view = View {
            config: &config,
            theme: &theme,
            snapshot: &snap,
            sampled: Sampled {
                container_offset: 0.0,
                container_width: 960.0,
                text_opacity: 1.0,
                crossfade: 1.0,
            },
            artwork: &mut cache,
        };

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        for _ in 0..2 {
            terminal
                .draw(|f| {
                    let area = f.area();
                    render(f, area, &mut view);
                })
                .unwrap();
        }
        let cells = place_card(Rect::new(0, 0, 120, 40), &view);
        let fitted = view.artwork.fitted(Some(&layer)).map(|f| f.dimensions());
        assert_eq!(fitted, Some((cells.art_cols as u32, cells.art_rows as u32 * 2)));
    }
}
