//! Small UI helpers: usage coloring, truncation, timestamps.

use chrono::{DateTime, Local, NaiveDateTime};
use ratatui::style::Color;

use crate::ui::theme::Palette;

pub fn usage_color(p: &Palette, pct: f64) -> Color {
    if pct >= 90.0 {
        p.bad
    } else if pct >= 70.0 {
        p.warn
    } else {
        p.ok
    }
}

pub fn gauge_percent(v: f64) -> u16 {
    v.clamp(0.0, 100.0).round() as u16
}

// Char-based so multi-byte output never splits
pub fn truncate_end(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push_str("...");
    out
}

/// `HH:MM:SS` in local time. Accepts RFC 3339 and the server's naive ISO
/// form (already local); anything else is shown as-is.
pub fn local_time(ts: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return dt.with_timezone(&Local).format("%H:%M:%S").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%H:%M:%S").to_string();
    }
    ts.to_string()
}
