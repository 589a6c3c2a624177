//! Chart series derived from a backtest payload.
//!
//! Everything here is pure data shaping; the TUI turns these into ratatui
//! datasets. The x coordinate is unix seconds.

use chrono::{DateTime, Utc};

use crate::domain::{Direction, EquityPoint, PricePoint, Signal};

/// Series colours for price lines, assigned by symbol index.
pub const SERIES_PALETTE: [SeriesColor; 7] = [
    SeriesColor::White,
    SeriesColor::Gray,
    SeriesColor::Red,
    SeriesColor::Orange,
    SeriesColor::Purple,
    SeriesColor::Cyan,
    SeriesColor::Magenta,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesColor {
    White,
    Gray,
    Red,
    Orange,
    Purple,
    Cyan,
    Magenta,
}

pub fn series_color(index: usize) -> SeriesColor {
    SERIES_PALETTE[index % SERIES_PALETTE.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerColor {
    Green,
    Red,
    Yellow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    ArrowUp,
    ArrowDown,
    Circle,
}

impl MarkerShape {
    pub fn glyph(self) -> &'static str {
        match self {
            MarkerShape::ArrowUp => "▲",
            MarkerShape::ArrowDown => "▼",
            MarkerShape::Circle => "●",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerStyle {
    pub color: MarkerColor,
    pub shape: MarkerShape,
}

/// Fixed direction → marker table.
pub fn marker_style(direction: &Direction) -> MarkerStyle {
    let (color, shape) = match direction {
        Direction::Long => (MarkerColor::Green, MarkerShape::ArrowUp),
        Direction::Short => (MarkerColor::Red, MarkerShape::ArrowDown),
        Direction::Sell => (MarkerColor::Green, MarkerShape::ArrowDown),
        Direction::Cover => (MarkerColor::Red, MarkerShape::ArrowUp),
        Direction::Other(_) => (MarkerColor::Yellow, MarkerShape::Circle),
    };
    MarkerStyle { color, shape }
}

/// Which chart the dashboard shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartKind {
    #[default]
    Equity,
    Return,
    Drawdown,
    Signals,
}

impl ChartKind {
    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Equity => "Equity",
            ChartKind::Return => "Return %",
            ChartKind::Drawdown => "Drawdown %",
            ChartKind::Signals => "Signals",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ChartKind::Equity => ChartKind::Return,
            ChartKind::Return => ChartKind::Drawdown,
            ChartKind::Drawdown => ChartKind::Signals,
            ChartKind::Signals => ChartKind::Equity,
        }
    }
}

fn x(ts: DateTime<Utc>) -> f64 {
    ts.timestamp() as f64
}

fn sorted_series(points: &[EquityPoint], y: impl Fn(&EquityPoint) -> f64) -> Vec<(f64, f64)> {
    let mut out: Vec<(f64, f64)> = points.iter().map(|p| (x(p.timestamp), y(p))).collect();
    out.sort_by(|a, b| a.0.total_cmp(&b.0));
    out
}

pub fn equity_series(points: &[EquityPoint]) -> Vec<(f64, f64)> {
    sorted_series(points, |p| p.equity_value)
}

pub fn return_series(points: &[EquityPoint]) -> Vec<(f64, f64)> {
    sorted_series(points, |p| p.percent_return)
}

pub fn drawdown_series(points: &[EquityPoint]) -> Vec<(f64, f64)> {
    sorted_series(points, |p| p.percent_drawdown)
}

/// Series for `kind`; `Signals` has its own overlay and yields nothing here.
pub fn line_series(kind: ChartKind, points: &[EquityPoint]) -> Vec<(f64, f64)> {
    match kind {
        ChartKind::Equity => equity_series(points),
        ChartKind::Return => return_series(points),
        ChartKind::Drawdown => drawdown_series(points),
        ChartKind::Signals => Vec::new(),
    }
}

/// Axis bounds with 5% padding; a flat series gets a unit band.
pub fn bounds(points: &[(f64, f64)]) -> Option<([f64; 2], [f64; 2])> {
    let first = points.first()?;
    let (mut x0, mut x1, mut y0, mut y1) = (first.0, first.0, first.1, first.1);
    for &(px, py) in points {
        x0 = x0.min(px);
        x1 = x1.max(px);
        y0 = y0.min(py);
        y1 = y1.max(py);
    }
    let pad = if y1 > y0 { (y1 - y0) * 0.05 } else { 1.0 };
    if x1 <= x0 {
        x1 = x0 + 1.0;
    }
    Some(([x0, x1], [y0 - pad, y1 + pad]))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub x: f64,
    /// Close price of the series at (or just before) the marker time.
    pub y: f64,
    pub direction: Direction,
    pub style: MarkerStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSeries {
    pub symbol: String,
    pub color: SeriesColor,
    pub points: Vec<(f64, f64)>,
    pub markers: Vec<Marker>,
}

/// Price lines per symbol with signal markers overlaid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignalOverlay {
    pub series: Vec<SymbolSeries>,
}

impl SignalOverlay {
    pub fn build(price_data: &[PricePoint], signals: &[Signal]) -> Self {
        let mut series: Vec<SymbolSeries> = Vec::new();
        for p in price_data {
            let idx = match series.iter().position(|s| s.symbol == p.symbol) {
                Some(i) => i,
                None => {
                    series.push(SymbolSeries {
                        symbol: p.symbol.clone(),
                        color: series_color(series.len()),
                        points: Vec::new(),
                        markers: Vec::new(),
                    });
                    series.len() - 1
                }
            };
            series[idx].points.push((x(p.timestamp), p.close));
        }

        for s in &mut series {
            // The backend does not guarantee price ordering.
            s.points.sort_by(|a, b| a.0.total_cmp(&b.0));
        }

        for signal in signals {
            let sx = x(signal.timestamp);
            for ti in &signal.trade_instructions {
                if let Some(s) = series.iter_mut().find(|s| s.symbol == ti.ticker) {
                    let y = price_at(&s.points, sx);
                    s.markers.push(Marker {
                        x: sx,
                        y,
                        direction: ti.direction.clone(),
                        style: marker_style(&ti.direction),
                    });
                }
            }
        }

        Self { series }
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }

    pub fn all_points(&self) -> Vec<(f64, f64)> {
        self.series
            .iter()
            .flat_map(|s| s.points.iter().copied())
            .collect()
    }
}

/// Close at the last point not after `at`, else the first point.
fn price_at(points: &[(f64, f64)], at: f64) -> f64 {
    let idx = points.partition_point(|p| p.0 <= at);
    if idx == 0 {
        points.first().map(|p| p.1).unwrap_or(0.0)
    } else {
        points[idx - 1].1
    }
}
