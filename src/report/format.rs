//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes are localized

use crate::calendar::HolidayCalendar;
use crate::domain::{ForecastPoint, ForecastRequest, RunConfig, Stage};
use crate::io::IngestedData;
use crate::models::FitDiagnostics;
use crate::report::ErrorMetrics;

/// Dataset, windows, stages and fit diagnostics.
pub fn format_run_summary(
    ingest: &IngestedData,
    request: &ForecastRequest,
    stages: &[Stage],
    model_name: &str,
    diagnostics: &FitDiagnostics,
    config: &RunConfig,
) -> String {
    let mut out = String::new();

    out.push_str("=== repay - Repayment Forecast ===\n");
    out.push_str(&format!(
        "Data: {} ({})\n",
        config.data_path.display(),
        ingest.column
    ));
    if let (Some(first), Some(last)) = (ingest.data_start(), ingest.data_end()) {
        out.push_str(&format!(
            "Observations: {first} ~ {last}, {} days ({} missing) | values=[{:.2}, {:.2}] mean={:.2}\n",
            ingest.stats.n_points, ingest.stats.n_missing, ingest.stats.min, ingest.stats.max, ingest.stats.mean
        ));
    }
    if !ingest.row_errors.is_empty() {
        out.push_str(&format!("Row errors: {} (see log)\n", ingest.row_errors.len()));
    }
    out.push_str(&format!(
        "Sample: {} ~ {}, {} days\n",
        request.sample_start,
        request.sample_end,
        request.sample_days()
    ));
    out.push_str(&format!(
        "Forecast: {} ~ {}, {} days (horizon {} days from sample end)\n",
        request.predict_start,
        request.predict_end,
        request.predict_days,
        request.horizon_days()
    ));
    out.push_str(&format!("Stages: {}\n", fmt_stages(stages)));

    out.push_str("\nModel diagnostics:\n");
    out.push_str(&format_diagnostics(model_name, config.order.p, config.order.q, diagnostics));
    out.push('\n');

    out
}

pub fn format_diagnostics(model_name: &str, p: usize, q: usize, diag: &FitDiagnostics) -> String {
    let mut out = String::new();
    out.push_str(&format!("- model: {model_name} (p={p}, q={q})\n"));
    out.push_str(&format!(
        "- nobs={} sigma2={:.6} llf={:.3} iterations={}\n",
        diag.nobs, diag.sigma2, diag.llf, diag.iterations
    ));
    out.push_str(&format!(
        "- aic={:.3} bic={:.3} hqic={:.3}\n",
        diag.aic, diag.bic, diag.hqic
    ));
    if !diag.ar.is_empty() || !diag.ma.is_empty() {
        out.push_str(&format!("- const: {:.6}\n", diag.constant));
        out.push_str(&format!("- ar   : {}\n", fmt_vec(&diag.ar)));
        out.push_str(&format!("- ma   : {}\n", fmt_vec(&diag.ma)));
    }
    out
}

/// Forecast rows, with the calendar category of each day when available.
pub fn format_forecast_table(rows: &[ForecastPoint], calendar: Option<&HolidayCalendar>) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<10} {:<3} {:>14} {:>14} {:>8} {:<22}\n",
            "date", "dow", "forecast", "actual", "err%", "day type"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!("{:-<10} {:-<3} {:-<14} {:-<14} {:-<8} {:-<22}\n", "", "", "", "", "", "").trim_end(),
    );
    out.push('\n');

    for r in rows {
        let actual = r.actual.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string());
        let pct = match r.actual {
            Some(a) if a != 0.0 => format!("{:+.2}", (r.value - a) / a * 100.0),
            _ => "-".to_string(),
        };
        let category = calendar.map(|c| c.category(r.date).label()).unwrap_or("");
        out.push_str(
            format!(
                "{:<10} {:<3} {:>14.2} {:>14} {:>8} {:<22}\n",
                r.date,
                r.date.format("%a"),
                r.value,
                actual,
                pct,
                category
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

pub fn format_metrics(m: &ErrorMetrics) -> String {
    let mut out = String::new();
    out.push_str(&format!("Error analysis ({} days with actuals):\n", m.n));
    out.push_str(&format!("MSE is {:.4}\n", m.mse));
    out.push_str(&format!("RMSE is {:.4}\n", m.rmse));
    out.push_str(&format!("MAE is {:.4}\n", m.mae));
    out.push_str(&format!("MAPE is {:.4}%\n", m.mape));
    out.push_str(&format!("R2 is {:.4}\n", m.r2));
    out
}

pub fn fmt_stages(stages: &[Stage]) -> String {
    if stages.is_empty() {
        return "(none)".to_string();
    }
    stages.iter().map(|s| s.name()).collect::<Vec<_>>().join(" -> ")
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn forecast_table_snapshot() {
        let d = NaiveDate::from_ymd_opt(2018, 4, 1).unwrap();
        let rows = vec![
            ForecastPoint {
                date: d,
                value: 110.0,
                actual: Some(100.0),
            },
            ForecastPoint {
                date: d.succ_opt().unwrap(),
                value: 95.5,
                actual: None,
            },
        ];
        let txt = format_forecast_table(&rows, None);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "date       dow       forecast         actual     err% day type");
        assert_eq!(lines[2], "2018-04-01 Sun         110.00         100.00   +10.00");
        assert_eq!(lines[3], "2018-04-02 Mon          95.50              -        -");
    }

    #[test]
    fn stages_are_listed_in_order() {
        assert_eq!(fmt_stages(&[Stage::Log, Stage::Diff7]), "log -> diff7");
        assert_eq!(fmt_stages(&[]), "(none)");
    }
}
