//! Parrot/neon theme tokens for the Backview TUI
//!
//! # Color Palette
//! - **Background**: Near-black / deep charcoal (base layer)
//! - **Accent**: Electric cyan (primary highlights, focus)
//! - **Positive**: Neon green (gains, long entries)
//! - **Negative**: Hot pink (losses, failures, short entries)
//! - **Warning**: Neon orange (alerts, loading states)
//! - **Neutral**: Cool purple (secondary info, selection)
//! - **Muted**: Steel blue (disabled, secondary text)
//!
//! Chart series and signal markers use their own fixed palettes from
//! `backview_core::chart`; [`series_color`] and [`marker_color`] map those
//! onto terminal colors.

use ratatui::style::{Color, Modifier, Style};

use backview_core::chart::{MarkerColor, SeriesColor};
use backview_core::domain::Direction;

pub const ACCENT: Color = Color::Rgb(0, 255, 255);
pub const POSITIVE: Color = Color::Rgb(0, 255, 128);
pub const NEGATIVE: Color = Color::Rgb(255, 20, 147);
pub const WARNING: Color = Color::Rgb(255, 140, 0);
pub const NEUTRAL: Color = Color::Rgb(147, 112, 219);
pub const MUTED: Color = Color::Rgb(100, 149, 237);

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Color,
    pub accent: Color,
    pub positive: Color,
    pub negative: Color,
    pub warning: Color,
    pub neutral: Color,
    pub muted: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::parrot_neon()
    }
}

impl Theme {
    pub fn parrot_neon() -> Self {
        Self {
            background: Color::Rgb(18, 18, 20),
            accent: ACCENT,
            positive: POSITIVE,
            negative: NEGATIVE,
            warning: WARNING,
            neutral: NEUTRAL,
            muted: MUTED,
            text_primary: Color::White,
            text_secondary: Color::Rgb(170, 170, 170),
        }
    }

    /// Get color for PnL value (positive = green, negative = pink)
    pub fn pnl_color(&self, value: f64) -> Color {
        if value >= 0.0 {
            self.positive
        } else {
            self.negative
        }
    }

    /// Long-side legs (LONG, SELL) green, short-side legs (SHORT, COVER) pink,
    /// matching the chart marker table.
    pub fn direction_color(&self, direction: &Direction) -> Color {
        match direction {
            Direction::Long | Direction::Sell => self.positive,
            Direction::Short | Direction::Cover => self.negative,
            Direction::Other(_) => self.text_secondary,
        }
    }
}

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn neutral() -> Style {
    Style::default().fg(NEUTRAL)
}

pub fn positive() -> Style {
    Style::default().fg(POSITIVE)
}

pub fn negative() -> Style {
    Style::default().fg(NEGATIVE)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        muted()
    }
}

/// Highlighted row in lists and tables.
pub fn cursor() -> Style {
    accent().add_modifier(Modifier::REVERSED)
}

/// Sign-based color for a metric value.
pub fn metric_color(value: f64) -> Style {
    if value > 0.0 {
        positive()
    } else if value < 0.0 {
        negative()
    } else {
        muted()
    }
}

pub fn series_color(color: SeriesColor) -> Color {
    match color {
        SeriesColor::White => Color::White,
        SeriesColor::Gray => Color::Gray,
        SeriesColor::Red => Color::Red,
        SeriesColor::Orange => Color::Rgb(255, 165, 0),
        SeriesColor::Purple => Color::Rgb(128, 0, 128),
        SeriesColor::Cyan => Color::Cyan,
        SeriesColor::Magenta => Color::Magenta,
    }
}

pub fn marker_color(color: MarkerColor) -> Color {
    match color {
        MarkerColor::Green => Color::Green,
        MarkerColor::Red => Color::Red,
        MarkerColor::Yellow => Color::Yellow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_creation() {
        let theme = Theme::default();
        assert_eq!(theme.background, Color::Rgb(18, 18, 20));
        assert_eq!(theme.accent, ACCENT);
    }

    #[test]
    fn test_pnl_color() {
        let theme = Theme::default();
        assert_eq!(theme.pnl_color(100.0), theme.positive);
        assert_eq!(theme.pnl_color(-50.0), theme.negative);
        assert_eq!(theme.pnl_color(0.0), theme.positive);
    }

    #[test]
    fn test_direction_color() {
        let theme = Theme::default();
        assert_eq!(theme.direction_color(&Direction::Long), theme.positive);
        assert_eq!(theme.direction_color(&Direction::Sell), theme.positive);
        assert_eq!(theme.direction_color(&Direction::Cover), theme.negative);
        assert_eq!(
            theme.direction_color(&Direction::Other("HOLD".into())),
            theme.text_secondary
        );
    }

    #[test]
    fn test_metric_color_by_sign() {
        assert_eq!(metric_color(0.1), positive());
        assert_eq!(metric_color(-0.1), negative());
        assert_eq!(metric_color(0.0), muted());
    }
}
