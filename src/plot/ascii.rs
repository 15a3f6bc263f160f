//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - actual values: `o`
//! - forecast: `*` joined by `-`

use chrono::NaiveDate;

use crate::domain::DatedSeries;

/// Render actuals and forecast on one grid, x = date.
pub fn render_forecast_plot(actual: &DatedSeries, forecast: &DatedSeries, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let actual_pts = present_points(actual);
    let forecast_pts = present_points(forecast);

    let Some((d_min, d_max)) = date_range(&actual_pts, &forecast_pts) else {
        return "Plot: (no data)\n".to_string();
    };
    let (y_min, y_max) = y_range(&actual_pts, &forecast_pts).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let t_max = (d_max - d_min).num_days().max(1) as f64;
    let to_xy = |(d, y): (NaiveDate, f64)| {
        let t = (d - d_min).num_days() as f64;
        (map_x(t, 0.0, t_max, width), map_y(y, y_min, y_max, height))
    };

    let mut grid = vec![vec![' '; width]; height];

    // Forecast line first so markers overlay it.
    let mut prev = None;
    for &p in &forecast_pts {
        let (x, y) = to_xy(p);
        if let Some((x0, y0)) = prev {
            draw_line(&mut grid, x0, y0, x, y, '-');
        }
        prev = Some((x, y));
    }
    for &p in &forecast_pts {
        let (x, y) = to_xy(p);
        grid[y][x] = '*';
    }
    for &p in &actual_pts {
        let (x, y) = to_xy(p);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: date=[{d_min}, {d_max}] | y=[{y_min:.2}, {y_max:.2}] | o actual, * forecast\n"
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out
}

fn present_points(series: &DatedSeries) -> Vec<(NaiveDate, f64)> {
    series
        .points()
        .iter()
        .filter_map(|(d, v)| v.map(|v| (*d, v)))
        .collect()
}

fn date_range(a: &[(NaiveDate, f64)], b: &[(NaiveDate, f64)]) -> Option<(NaiveDate, NaiveDate)> {
    let min = a.iter().chain(b).map(|(d, _)| *d).min()?;
    let max = a.iter().chain(b).map(|(d, _)| *d).max()?;
    Some((min, max))
}

fn y_range(a: &[(NaiveDate, f64)], b: &[(NaiveDate, f64)]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in a.iter().chain(b) {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
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

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish). Only fills blank cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
