//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed samples: `o`
//! - combined trend + season model over the data: `-`
//! - forecast beyond the data: `~`

use crate::domain::{ForecastPoint, Series};
use crate::models::CombinedModel;

/// Render observations, the fitted model and an optional forecast.
pub fn render_ascii_plot(
    series: &Series,
    model: &CombinedModel,
    forecast: &[ForecastPoint],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let t_min = series.first_time();
    let t_max = forecast.last().map(|p| p.time).unwrap_or(series.last_time()).max(series.last_time());
    let (t_min, t_max) = if t_max > t_min { (t_min, t_max) } else { (t_min - 0.5, t_min + 0.5) };

    // Model curve over the observed range, one sample per column.
    let model_curve = sample_curve(model, series.first_time(), series.last_time(), width);
    let forecast_curve: Vec<(f64, f64)> = forecast.iter().map(|p| (p.time, p.value)).collect();

    let (y_min, y_max) = y_range(series, &[&model_curve, &forecast_curve]).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut canvas = Canvas::new(width, height, (t_min, t_max), (y_min, y_max));

    // Curves first so observations overlay them.
    canvas.polyline(&model_curve, '-');
    canvas.polyline(&forecast_curve, '~');
    for (t, y) in series.iter() {
        canvas.put(t, y, 'o');
    }

    format!("Plot: t=[{t_min:.3}, {t_max:.3}] | y=[{y_min:.2}, {y_max:.2}]\n{}", canvas.render())
}

fn sample_curve(model: &CombinedModel, t_min: f64, t_max: f64, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            let t = t_min + u * (t_max - t_min);
            (t, model.evaluate(t))
        })
        .collect()
}

fn y_range(series: &Series, curves: &[&[(f64, f64)]]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for &y in series.values() {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    for curve in curves {
        for &(_, y) in curve.iter() {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

/// Character grid addressed in data coordinates. Row 0 is the top (largest y).
struct Canvas {
    cells: Vec<Vec<char>>,
    t_range: (f64, f64),
    y_range: (f64, f64),
}

impl Canvas {
    fn new(width: usize, height: usize, t_range: (f64, f64), y_range: (f64, f64)) -> Self {
        Self {
            cells: vec![vec![' '; width.max(2)]; height.max(2)],
            t_range,
            y_range,
        }
    }

    fn width(&self) -> usize {
        self.cells[0].len()
    }

    fn height(&self) -> usize {
        self.cells.len()
    }

    /// Column and row of a data point, clamped onto the grid.
    fn cell(&self, t: f64, y: f64) -> (usize, usize) {
        let fx = unit(t, self.t_range);
        let fy = unit(y, self.y_range);
        let col = (fx * (self.width() - 1) as f64).round() as usize;
        let row = ((1.0 - fy) * (self.height() - 1) as f64).round() as usize;
        (col, row)
    }

    /// Overwrite whatever is at the point.
    fn put(&mut self, t: f64, y: f64, ch: char) {
        let (col, row) = self.cell(t, y);
        self.cells[row][col] = ch;
    }

    /// Connect consecutive points; never overwrites a drawn cell.
    fn polyline(&mut self, points: &[(f64, f64)], ch: char) {
        let cells: Vec<(usize, usize)> = points.iter().map(|&(t, y)| self.cell(t, y)).collect();
        if let [only] = cells.as_slice() {
            self.fill_blank(*only, ch);
        }
        for pair in cells.windows(2) {
            self.segment(pair[0], pair[1], ch);
        }
    }

    /// Straight segment sampled once per cell along its longer axis.
    fn segment(&mut self, from: (usize, usize), to: (usize, usize), ch: char) {
        let (c0, r0) = (from.0 as f64, from.1 as f64);
        let (dc, dr) = (to.0 as f64 - c0, to.1 as f64 - r0);
        let steps = dc.abs().max(dr.abs()) as usize;
        for k in 0..=steps {
            let f = if steps == 0 { 0.0 } else { k as f64 / steps as f64 };
            let col = (c0 + f * dc).round() as usize;
            let row = (r0 + f * dr).round() as usize;
            self.fill_blank((col, row), ch);
        }
    }

    fn fill_blank(&mut self, (col, row): (usize, usize), ch: char) {
        if let Some(cell) = self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            if *cell == ' ' {
                *cell = ch;
            }
        }
    }

    fn render(&self) -> String {
        let mut out = String::with_capacity(self.height() * (self.width() + 1));
        for row in &self.cells {
            out.extend(row.iter());
            out.push('\n');
        }
        out
    }
}

/// Position of `v` within `range` as a fraction in `[0, 1]`.
fn unit(v: f64, (lo, hi): (f64, f64)) -> f64 {
    ((v - lo) / (hi - lo)).clamp(0.0, 1.0)
}
