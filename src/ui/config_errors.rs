use crate::app::config::{ConfigError, ThemeColor};
use crate::theme::Theme;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Issue list in place of the card when the configuration did not validate.
pub fn render(f: &mut Frame, area: Rect, error: &ConfigError, theme: &Theme) {
    let mut lines: Vec<Line> = Vec::new();
    for issue in &error.issues {
        lines.push(Line::from(Span::styled(
            issue.path.as_str(),
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            issue.message.as_str(),
            Style::default().fg(theme.overlay),
        )));
        lines.push(Line::default());
    }

    let width = area.width.saturating_sub(4).min(72);
    let height = (lines.len() as u16 + 2).min(area.height);
    let popup = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    );
    if popup.is_empty() {
        return;
    }

    let red = theme.color(ThemeColor::Red);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(red))
        .title(Span::styled(
            format!(" {} ", error),
            Style::default().fg(red).add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(theme.base));

    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        popup,
    );
}
