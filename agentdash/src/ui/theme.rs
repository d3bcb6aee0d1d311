//! Light and dark palettes.

use ratatui::style::Color;

use crate::store::Theme;

// Series colors, same in both themes
pub const CPU: Color = Color::Rgb(59, 130, 246);
pub const MEMORY: Color = Color::Rgb(168, 85, 247);
pub const DISK: Color = Color::Rgb(249, 115, 22);

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg: Color,
    pub fg: Color,
    pub muted: Color,
    pub border: Color,
    pub ok: Color,
    pub warn: Color,
    pub bad: Color,
}

pub fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            bg: Color::Rgb(15, 17, 21),
            fg: Color::Rgb(226, 232, 240),
            muted: Color::Rgb(120, 128, 140),
            border: Color::Rgb(60, 66, 78),
            ok: Color::Rgb(34, 197, 94),
            warn: Color::Rgb(234, 179, 8),
            bad: Color::Rgb(239, 68, 68),
        },
        Theme::Light => Palette {
            bg: Color::Rgb(250, 250, 250),
            fg: Color::Rgb(24, 24, 27),
            muted: Color::Rgb(113, 113, 122),
            border: Color::Rgb(212, 212, 216),
            ok: Color::Rgb(22, 163, 74),
            warn: Color::Rgb(202, 138, 4),
            bad: Color::Rgb(220, 38, 38),
        },
    }
}
