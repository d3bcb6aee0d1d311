//! CPU / memory / disk usage gauges.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Gauge},
};

use crate::types::TelemetrySample;
use crate::ui::theme::{self, Palette};
use crate::ui::util::{gauge_percent, usage_color};

pub fn draw_stats(f: &mut ratatui::Frame<'_>, area: Rect, stats: Option<&TelemetrySample>, p: &Palette) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let cards = [
        ("CPU Usage", stats.map(|s| s.cpu), theme::CPU),
        ("Memory Usage", stats.map(|s| s.memory), theme::MEMORY),
        ("Disk Usage", stats.map(|s| s.disk), theme::DISK),
    ];
    for ((title, value, accent), slot) in cards.into_iter().zip(cols.iter()) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent))
            .title(title);
        let g = match value {
            Some(v) => Gauge::default()
                .block(block)
                .gauge_style(Style::default().fg(usage_color(p, v)).bg(p.bg))
                .percent(gauge_percent(v))
                .label(format!("{}%", gauge_percent(v))),
            None => Gauge::default()
                .block(block)
                .gauge_style(Style::default().fg(p.muted).bg(p.bg))
                .percent(0)
                .label("waiting for data..."),
        };
        f.render_widget(g, *slot);
    }
}
