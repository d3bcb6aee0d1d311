//! Top header: view tabs and connection indicator.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::ui::theme::Palette;
use crate::ui::View;
use crate::ws::LiveStatus;

pub fn draw_header(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    view: View,
    status: &LiveStatus,
    p: &Palette,
) {
    let mut spans = vec![Span::styled(
        "agentdash ",
        Style::default().fg(p.fg).add_modifier(Modifier::BOLD),
    )];
    for v in [View::Dashboard, View::Commands] {
        let style = if v == view {
            Style::default().fg(p.bg).bg(p.fg).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(p.muted)
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(format!(" {} ", v.title()), style));
    }

    let conn = if status.connected() {
        Span::styled("  ● Connected", Style::default().fg(p.ok))
    } else if status.connect_attempts > 1 {
        Span::styled(
            format!("  ○ Disconnected (attempt {})", status.connect_attempts),
            Style::default().fg(p.bad),
        )
    } else {
        Span::styled("  ○ Disconnected", Style::default().fg(p.bad))
    };
    spans.push(conn);
    spans.push(Span::styled(
        "   (Tab: switch view, 'q' to quit)",
        Style::default().fg(p.muted),
    ));

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(p.border));
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}
