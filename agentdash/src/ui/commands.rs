//! Command console view: input line and the scrollable history.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::history::CommandHistory;
use crate::ui::theme::Palette;
use crate::ui::util::{local_time, truncate_end};

const PLACEHOLDER: &str = "Type a command... (e.g., 'show system info', 'search for *.py files')";
// Longest result text rendered per record
const RESULT_PREVIEW: usize = 300;

pub fn draw_command_input(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    input: &str,
    busy: bool,
    p: &Palette,
) {
    let title = if busy {
        "Command Input (running...)"
    } else {
        "Command Input (Enter to execute)"
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if busy { p.warn } else { p.border }))
        .title(title);

    let line = if input.is_empty() && !busy {
        Line::styled(PLACEHOLDER, Style::default().fg(p.muted))
    } else {
        Line::from(vec![
            Span::styled("> ", Style::default().fg(p.muted)),
            Span::styled(input.to_string(), Style::default().fg(p.fg)),
        ])
    };
    f.render_widget(Paragraph::new(line).block(block), area);

    if !busy && area.height > 2 {
        let offset = if input.is_empty() { 0 } else { 2 + input.chars().count() as u16 };
        let x = (area.x + 1 + offset).min(area.x + area.width.saturating_sub(2));
        f.set_cursor_position((x, area.y + 1));
    }
}

/// Lines for the history pane, newest first.
pub fn history_lines<'a>(history: &'a CommandHistory, p: &Palette) -> Vec<Line<'a>> {
    if history.is_empty() {
        return vec![Line::styled(
            "No commands executed yet. Try running a command above!",
            Style::default().fg(p.muted),
        )];
    }
    let mut lines = Vec::new();
    for r in history.iter() {
        let (mark, color) = if r.success { ("✓", p.ok) } else { ("✗", p.bad) };
        lines.push(Line::from(vec![
            Span::styled(format!("{mark} "), Style::default().fg(color)),
            Span::styled(
                r.command.as_str(),
                Style::default().fg(p.fg).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", local_time(&r.timestamp)),
                Style::default().fg(p.muted),
            ),
        ]));
        for text in truncate_end(&r.result, RESULT_PREVIEW).lines() {
            lines.push(Line::styled(
                format!("  {text}"),
                Style::default().fg(p.muted),
            ));
        }
        lines.push(Line::raw(""));
    }
    lines
}

pub fn draw_command_history(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    history: &CommandHistory,
    scroll: usize,
    p: &Palette,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(p.border))
        .title(format!("Command History ({})", history.len()));
    let para = Paragraph::new(history_lines(history, p))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll.min(u16::MAX as usize) as u16, 0));
    f.render_widget(para, area);
}
