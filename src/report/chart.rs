//! SVG chart of actuals against the forecast (Plotters, SVG backend).
//!
//! Dates are plotted as day offsets from the first plotted date and formatted
//! back to dates on the axis, which keeps us off Plotters' datetime coordinates.

use chrono::{Duration, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::domain::DatedSeries;
use crate::error::AppError;

/// Render `actual` (red) and `forecast` (blue) into an SVG document.
pub fn render_forecast_svg(
    actual: &DatedSeries,
    forecast: &DatedSeries,
    title: &str,
    width: u32,
    height: u32,
) -> Result<String, AppError> {
    let origin = match (actual.first_date(), forecast.first_date()) {
        (Some(a), Some(f)) => a.min(f),
        (Some(a), None) => a,
        (None, Some(f)) => f,
        (None, None) => return Err(AppError::new(2, "Nothing to chart.")),
    };
    let actual_pts = to_points(actual, origin);
    let forecast_pts = to_points(forecast, origin);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        draw_chart(&root, &actual_pts, &forecast_pts, origin, title)
            .map_err(|e| AppError::new(2, format!("Failed to render chart: {e}")))?;
        root.present()
            .map_err(|e| AppError::new(2, format!("Failed to render chart: {e}")))?;
    }
    Ok(svg)
}

fn to_points(series: &DatedSeries, origin: NaiveDate) -> Vec<(f64, f64)> {
    series
        .points()
        .iter()
        .filter_map(|(d, v)| v.map(|v| ((*d - origin).num_days() as f64, v)))
        .collect()
}

fn bounds(points: &[(f64, f64)]) -> Option<([f64; 2], [f64; 2])> {
    let mut x = [f64::INFINITY, f64::NEG_INFINITY];
    let mut y = [f64::INFINITY, f64::NEG_INFINITY];
    for &(px, py) in points {
        x = [x[0].min(px), x[1].max(px)];
        y = [y[0].min(py), y[1].max(py)];
    }
    if !(x[0].is_finite() && y[0].is_finite()) {
        return None;
    }
    if x[1] <= x[0] {
        x[1] = x[0] + 1.0;
    }
    let pad = ((y[1] - y[0]).abs() * 0.05).max(1e-9);
    Some((x, [y[0] - pad, y[1] + pad]))
}

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    actual: &[(f64, f64)],
    forecast: &[(f64, f64)],
    origin: NaiveDate,
    title: &str,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let all: Vec<(f64, f64)> = actual.iter().chain(forecast).copied().collect();
    let Some((xb, yb)) = bounds(&all) else {
        return Ok(());
    };

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 18).into_font())
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(xb[0]..xb[1], yb[0]..yb[1])?;

    let fmt_x = |v: &f64| (origin + Duration::days(v.round() as i64)).format("%m-%d").to_string();
    chart
        .configure_mesh()
        .x_labels(8)
        .y_labels(8)
        .x_label_formatter(&fmt_x)
        .y_label_formatter(&|v| format!("{v:.0}"))
        .y_desc("repayment")
        .draw()?;

    chart
        .draw_series(LineSeries::new(actual.iter().copied(), &RED))?
        .label("actual")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
    chart.draw_series(actual.iter().map(|&(x, y)| Circle::new((x, y), 2, RED.filled())))?;

    chart
        .draw_series(LineSeries::new(forecast.iter().copied(), &BLUE))?
        .label("forecast")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
    chart.draw_series(forecast.iter().map(|&(x, y)| Circle::new((x, y), 2, BLUE.filled())))?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn svg_contains_both_series() {
        let d = NaiveDate::from_ymd_opt(2018, 3, 25).unwrap();
        let actual = DatedSeries::from_start(d, [10.0, 12.0, 11.0, 13.0]);
        let forecast = DatedSeries::from_start(d + Duration::days(2), [11.5, 12.5, 12.0]);
        let svg = render_forecast_svg(&actual, &forecast, "forecast", 640, 400).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("actual"));
        assert!(svg.contains("forecast"));
        assert!(svg.contains("<polyline"));
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let empty = DatedSeries::default();
        assert!(render_forecast_svg(&empty, &empty, "x", 100, 100).is_err());
    }
}
