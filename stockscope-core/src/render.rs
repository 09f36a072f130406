//! Presentation of pipeline results.
//!
//! `Renderer` is the seam between the pipeline and whatever draws the
//! results. `TextRenderer` draws terminal tables: a detail view (close, moving
//! averages, volume bars), a candlestick view, and a normalized comparison.

use crate::domain::{ComparisonSeries, DailySeries, Observation};
use std::io::{self, Write};

/// Default number of most recent rows shown per view.
pub const DEFAULT_ROWS: usize = 15;

const CANDLE_WIDTH: usize = 32;
const VOLUME_WIDTH: usize = 20;

pub trait Renderer {
    /// Close price with moving averages, plus volume.
    fn render_detail(&mut self, symbol: &str, series: &DailySeries) -> io::Result<()>;

    /// Open/high/low/close candles.
    fn render_candlestick(&mut self, symbol: &str, series: &DailySeries) -> io::Result<()>;

    /// Overlay of normalized series, one per symbol.
    fn render_comparison(&mut self, series: &[ComparisonSeries]) -> io::Result<()>;
}

pub struct TextRenderer<W> {
    out: W,
    rows: usize,
}

impl TextRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            rows: DEFAULT_ROWS,
        }
    }

    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = rows.max(1);
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn tail_start(&self, len: usize) -> usize {
        len.saturating_sub(self.rows)
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render_detail(&mut self, symbol: &str, series: &DailySeries) -> io::Result<()> {
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            return writeln!(self.out, "{symbol}: no data");
        };

        writeln!(
            self.out,
            "{symbol} stock price and moving averages ({} days, {} to {})",
            series.len(),
            first.date,
            last.date
        )?;

        let ma_columns: Vec<&str> = series
            .column_names()
            .filter(|name| name.starts_with("MA"))
            .collect();

        write!(self.out, "{:<12} {:>12}", "Date", "Close")?;
        for name in &ma_columns {
            write!(self.out, " {name:>12}")?;
        }
        writeln!(self.out, " {:>14}  Volume", "")?;

        let start = self.tail_start(series.len());
        let shown = &series.observations()[start..];
        let max_volume = shown.iter().map(|o| o.volume).fold(0.0, f64::max);

        for (offset, obs) in shown.iter().enumerate() {
            let index = start + offset;
            write!(self.out, "{:<12} {:>12.2}", obs.date.to_string(), obs.close)?;
            for name in &ma_columns {
                write!(self.out, " {:>12}", fmt_opt(series.value_at(name, index)))?;
            }
            writeln!(
                self.out,
                " {:>14.0}  {}",
                obs.volume,
                bar(obs.volume, max_volume, VOLUME_WIDTH)
            )?;
        }

        let change = (last.close / first.close - 1.0) * 100.0;
        let (lo, hi) = close_range(series.observations());
        writeln!(
            self.out,
            "latest close {:.2} ({change:+.2}% since {}), range {lo:.2} to {hi:.2}",
            last.close, first.date
        )?;
        writeln!(self.out)
    }

    fn render_candlestick(&mut self, symbol: &str, series: &DailySeries) -> io::Result<()> {
        if series.is_empty() {
            return writeln!(self.out, "{symbol}: no data");
        }

        writeln!(self.out, "{symbol} candlestick chart")?;
        writeln!(
            self.out,
            "{:<12} {:>10} {:>10} {:>10} {:>10}  ",
            "Date", "Open", "High", "Low", "Close"
        )?;

        let start = self.tail_start(series.len());
        let shown = &series.observations()[start..];
        let lo = shown.iter().map(|o| o.low).fold(f64::INFINITY, f64::min);
        let hi = shown.iter().map(|o| o.high).fold(f64::NEG_INFINITY, f64::max);

        for obs in shown {
            writeln!(
                self.out,
                "{:<12} {:>10.2} {:>10.2} {:>10.2} {:>10.2}  {} {}",
                obs.date.to_string(),
                obs.open,
                obs.high,
                obs.low,
                obs.close,
                candle(obs, lo, hi, CANDLE_WIDTH),
                if obs.is_up() { "up" } else { "down" }
            )?;
        }
        writeln!(self.out)
    }

    fn render_comparison(&mut self, series: &[ComparisonSeries]) -> io::Result<()> {
        writeln!(self.out, "Stock price comparison (normalized, first close = 1.00)")?;
        writeln!(
            self.out,
            "{:<8} {:<12} {:<12} {:>8} {:>8} {:>8} {:>9}",
            "Symbol", "From", "To", "Last", "Min", "Max", "Change"
        )?;

        for s in series {
            let (Some(from), Some(to), Some(last), Some((lo, hi))) =
                (s.first_date(), s.last_date(), s.last_value(), s.range())
            else {
                writeln!(self.out, "{:<8} no data", s.symbol)?;
                continue;
            };
            writeln!(
                self.out,
                "{:<8} {:<12} {:<12} {last:>8.3} {lo:>8.3} {hi:>8.3} {:>+8.2}%",
                s.symbol,
                from.to_string(),
                to.to_string(),
                (last - 1.0) * 100.0
            )?;
        }
        writeln!(self.out)
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

fn close_range(observations: &[Observation]) -> (f64, f64) {
    observations
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), o| {
            (lo.min(o.close), hi.max(o.close))
        })
}

/// Horizontal bar of `value / max` scaled to `width` cells.
fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 {
        return String::new();
    }
    let cells = ((value / max) * width as f64).round() as usize;
    "#".repeat(cells.min(width))
}

/// One text candle on a `[lo, hi]` price axis: `-` wick, `=` body, `|` doji.
fn candle(obs: &Observation, lo: f64, hi: f64, width: usize) -> String {
    let span = hi - lo;
    let pos = |price: f64| -> usize {
        if span <= 0.0 {
            return 0;
        }
        (((price - lo) / span) * (width - 1) as f64).round() as usize
    };

    let (wick_lo, wick_hi) = (pos(obs.low), pos(obs.high));
    let (body_lo, body_hi) = {
        let (a, b) = (pos(obs.open), pos(obs.close));
        (a.min(b), a.max(b))
    };

    (0..width)
        .map(|i| {
            if (body_lo..=body_hi).contains(&i) {
                if body_lo == body_hi {
                    '|'
                } else {
                    '='
                }
            } else if (wick_lo..=wick_hi).contains(&i) {
                '-'
            } else {
                ' '
            }
        })
        .collect()
}
