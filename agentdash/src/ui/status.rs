//! Connection status box and the recent-commands list on the dashboard.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::history::CommandHistory;
use crate::ui::theme::Palette;
use crate::ui::util::{local_time, truncate_end};
use crate::ws::LiveStatus;

pub fn draw_status(f: &mut ratatui::Frame<'_>, area: Rect, status: &LiveStatus, api: &str, p: &Palette) {
    let row = |label: &str, value: String, color| {
        Line::from(vec![
            Span::styled(format!("{label:<12}"), Style::default().fg(p.muted)),
            Span::styled(value, Style::default().fg(color)),
        ])
    };

    let (ws_text, ws_color) = if status.connected() {
        ("Active".to_string(), p.ok)
    } else {
        ("Inactive".to_string(), p.bad)
    };
    let mut lines = vec![
        row("WebSocket", ws_text, ws_color),
        row("API", api.to_string(), p.fg),
        row("Attempts", status.connect_attempts.to_string(), p.fg),
    ];
    if let Some(err) = status.last_error.as_deref() {
        lines.push(row("Last error", err.to_string(), p.warn));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(p.border))
        .title("System Status");
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

pub fn draw_recent(f: &mut ratatui::Frame<'_>, area: Rect, history: &CommandHistory, p: &Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(p.border))
        .title("Recent Commands");
    let rows = area.height.saturating_sub(2) as usize;
    let width = area.width.saturating_sub(14) as usize;

    let lines: Vec<Line> = if history.is_empty() {
        vec![Line::styled("No commands yet", Style::default().fg(p.muted))]
    } else {
        history
            .iter()
            .take(rows)
            .map(|r| {
                let (mark, color) = if r.success { ("✓", p.ok) } else { ("✗", p.bad) };
                Line::from(vec![
                    Span::styled(format!("{mark} "), Style::default().fg(color)),
                    Span::styled(
                        format!("{:<9}", local_time(&r.timestamp)),
                        Style::default().fg(p.muted),
                    ),
                    Span::styled(truncate_end(&r.command, width), Style::default().fg(p.fg)),
                ])
            })
            .collect()
    };
    f.render_widget(Paragraph::new(lines).block(block), area);
}
