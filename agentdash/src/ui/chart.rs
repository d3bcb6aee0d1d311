//! Rolling line chart of the buffered telemetry window.

use ratatui::{
    layout::Rect,
    style::Style,
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
};

use crate::history::{TimeSeriesBuffer, TELEMETRY_WINDOW};
use crate::ui::theme::{self, Palette};
use crate::ui::util::local_time;

pub fn draw_live_chart(f: &mut ratatui::Frame<'_>, area: Rect, buf: &TimeSeriesBuffer, p: &Palette) {
    let cpu = buf.series(|s| s.cpu);
    let memory = buf.series(|s| s.memory);
    let disk = buf.series(|s| s.disk);

    let datasets = vec![
        Dataset::default()
            .name("CPU %")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(theme::CPU))
            .data(&cpu),
        Dataset::default()
            .name("Memory %")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(theme::MEMORY))
            .data(&memory),
        Dataset::default()
            .name("Disk %")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(theme::DISK))
            .data(&disk),
    ];

    // Oldest and newest sample times under the x axis
    let first = buf.iter().next().map(|s| local_time(&s.timestamp)).unwrap_or_default();
    let last = buf.latest().map(|s| local_time(&s.timestamp)).unwrap_or_default();

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(p.border))
                .title(format!("Real-time Performance ({} samples)", buf.len())),
        )
        .x_axis(
            Axis::default()
                .style(Style::default().fg(p.muted))
                .bounds([0.0, (TELEMETRY_WINDOW - 1) as f64])
                .labels(vec![Span::raw(first), Span::raw(last)]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(p.muted))
                .bounds([0.0, 100.0])
                .labels(vec![Span::raw("0"), Span::raw("50"), Span::raw("100")]),
        );
    f.render_widget(chart, area);
}
