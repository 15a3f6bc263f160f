//! HTML report: the forecast table plus the chart image.

use std::path::Path;

use chrono::NaiveDate;

use crate::domain::ForecastPoint;
use crate::report::ErrorMetrics;

/// Render the report page. `figure` is relative to the HTML file.
pub fn render_html_report(
    generated: NaiveDate,
    rows: &[ForecastPoint],
    metrics: Option<&ErrorMetrics>,
    figure: &Path,
) -> String {
    let mut table = String::new();
    table.push_str("<table border=\"1\" class=\"dataframe\" align=\"center\">\n");
    table.push_str("  <thead><tr><th>date</th><th>forecast</th><th>actual</th></tr></thead>\n");
    table.push_str("  <tbody>\n");
    for r in rows {
        table.push_str(&format!(
            "    <tr><th>{}</th><td>{:.4}</td><td>{}</td></tr>\n",
            r.date,
            r.value,
            r.actual.map(|v| format!("{v:.4}")).unwrap_or_default()
        ));
    }
    table.push_str("  </tbody>\n</table>\n");

    let metrics_html = metrics
        .map(|m| {
            format!(
                "<p align=\"center\">MSE {:.4} | RMSE {:.4} | MAE {:.4} | MAPE {:.4}% | R2 {:.4}</p>\n",
                m.mse, m.rmse, m.mae, m.mape, m.r2
            )
        })
        .unwrap_or_default();

    format!(
        r#"<html>
    <head>
        <meta http-equiv="content-type" content="text/html;charset=utf-8">
        <title>Repayment analysis</title>
    </head>
    <body>
        <h1 align="center">{generated} repayment analysis</h1>
        {table}
        {metrics_html}
        <img src="{src}" style="display: block; margin: 0 auto;">
    </body>
</html>
"#,
        src = escape_attr(&figure.to_string_lossy().replace('\\', "/")),
    )
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;")
}
