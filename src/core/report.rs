use crate::core::correlation::{pearson, round_to};
use crate::domain::model::{
    ComparisonReport, ComparisonSpec, MergedTable, SeriesSpec, TraceStyle, YearRange,
};
use crate::utils::error::{EtlError, Result};
use serde_json::{json, Value};

const UNAVAILABLE: &str = "unavailable";

/// Renders one comparison over `range` (the whole table when `None`).
///
/// Missing series or an undefined r do not fail the report; the coefficient
/// then reads "unavailable".
pub fn build_report(
    spec: &ComparisonSpec,
    series: &[SeriesSpec],
    merged: &MergedTable,
    range: Option<YearRange>,
) -> ComparisonReport {
    let filtered = match range {
        Some(range) => merged.filter_years(range),
        None => merged.clone(),
    };

    let overall_r = rounded_r(merged, spec);
    let range_r = rounded_r(&filtered, spec);
    let r_text = range_r
        .map(|r| r.to_string())
        .unwrap_or_else(|| UNAVAILABLE.to_string());

    let left_label = label_for(series, &spec.left);
    let right_label = label_for(series, &spec.right);
    let rows = filtered.pair_rows(&spec.left, &spec.right).unwrap_or_default();
    let figure = figure_json(spec, &rows, &left_label, &right_label);

    ComparisonReport {
        key: spec.key.clone(),
        title: spec.title.clone(),
        left_label,
        right_label,
        years: filtered.year_span(),
        rows,
        overall_r,
        range_r,
        headline: spec.headline.replace("{r}", &r_text),
        paragraphs: spec
            .paragraphs
            .iter()
            .map(|p| p.replace("{r}", &r_text))
            .collect(),
        caveat: spec.caveat.clone(),
        figure,
    }
}

fn rounded_r(table: &MergedTable, spec: &ComparisonSpec) -> Option<f64> {
    let Some((left, right)) = table.paired_values(&spec.left, &spec.right) else {
        tracing::warn!(
            "Comparison '{}' skipped: series '{}' or '{}' unavailable",
            spec.key,
            spec.left,
            spec.right
        );
        return None;
    };
    match pearson(&left, &right) {
        Ok(r) => Some(round_to(r, 2)),
        Err(e) => {
            tracing::warn!("Correlation for '{}' undefined: {}", spec.key, e);
            None
        }
    }
}

fn label_for(series: &[SeriesSpec], name: &str) -> String {
    series
        .iter()
        .find(|s| s.name == name)
        .map(|s| s.label.clone())
        .unwrap_or_else(|| name.to_string())
}

/// Plotly figure with the right-hand series on a secondary y axis.
pub fn figure_json(
    spec: &ComparisonSpec,
    rows: &[(i32, Option<f64>, Option<f64>)],
    left_label: &str,
    right_label: &str,
) -> Value {
    let years: Vec<i32> = rows.iter().map(|(year, _, _)| *year).collect();
    let left: Vec<Option<f64>> = rows.iter().map(|(_, l, _)| *l).collect();
    let right: Vec<Option<f64>> = rows.iter().map(|(_, _, r)| *r).collect();

    json!({
        "data": [
            trace(spec.left_style, left_label, &spec.left_color, &years, &left, "y"),
            trace(spec.right_style, right_label, &spec.right_color, &years, &right, "y2"),
        ],
        "layout": {
            "title": {"text": spec.title},
            "xaxis": {"title": {"text": "Year"}},
            "yaxis": {"title": {"text": left_label}},
            "yaxis2": {"title": {"text": right_label}, "overlaying": "y", "side": "right"},
            "legend": {"orientation": "h", "yanchor": "bottom", "y": 1.02, "xanchor": "center", "x": 0.5},
            "hovermode": "x",
            "plot_bgcolor": "white",
            "height": 600
        }
    })
}

fn trace(
    style: TraceStyle,
    name: &str,
    color: &str,
    years: &[i32],
    values: &[Option<f64>],
    axis: &str,
) -> Value {
    match style {
        TraceStyle::Line => json!({
            "type": "scatter",
            "mode": "lines",
            "name": name,
            "x": years,
            "y": values,
            "yaxis": axis,
            "line": {"color": color, "width": 3}
        }),
        TraceStyle::Bar => json!({
            "type": "bar",
            "name": name,
            "x": years,
            "y": values,
            "yaxis": axis,
            "marker": {"color": color},
            "opacity": 0.7
        }),
    }
}

/// Merged table as delimited text with a `Year` column first.
pub fn table_to_delimited(table: &MergedTable, delimiter: u8) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    let mut header = vec!["Year".to_string()];
    header.extend(table.columns.iter().map(|c| c.name.clone()));
    writer.write_record(&header)?;

    for (row, year) in table.years.iter().enumerate() {
        let mut fields = vec![year.to_string()];
        fields.extend(
            table
                .columns
                .iter()
                .map(|c| c.values[row].map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&fields)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| EtlError::ProcessingError {
        message: format!("delimited output is not UTF-8: {}", e),
    })
}

pub fn correlations_json(reports: &[ComparisonReport]) -> Value {
    Value::Array(
        reports
            .iter()
            .map(|report| {
                json!({
                    "key": report.key,
                    "left": report.left_label,
                    "right": report.right_label,
                    "years": report.years,
                    "overall_r": report.overall_r,
                    "range_r": report.range_r,
                })
            })
            .collect(),
    )
}

pub fn render_markdown(reports: &[ComparisonReport], generated_at: &str) -> String {
    let mut out = String::new();
    out.push_str("# Spurious Ireland: When Correlation Doesn't Equal Causation\n\n");
    out.push_str(&format!("_Generated {}_\n", generated_at));

    for report in reports {
        out.push_str(&format!("\n## {}\n\n", report.title));
        out.push_str(&format!("### {}\n\n", report.headline));
        if let Some(years) = report.years {
            out.push_str(&format!("Years {} to {}", years.from, years.to));
            if let Some(overall) = report.overall_r {
                out.push_str(&format!(" (all years: r = {})", overall));
            }
            out.push_str("\n\n");
        }
        for paragraph in &report.paragraphs {
            out.push_str(paragraph);
            out.push_str("\n\n");
        }
        if !report.caveat.is_empty() {
            out.push_str(&format!("_{}_\n\n", report.caveat));
        }

        out.push_str(&format!("| Year | {} | {} |\n", report.left_label, report.right_label));
        out.push_str("|---:|---:|---:|\n");
        for (year, left, right) in &report.rows {
            out.push_str(&format!("| {} | {} | {} |\n", year, cell(*left), cell(*right)));
        }
    }

    out
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{default_comparisons, default_series};
    use crate::domain::model::YearSeries;

    fn sample_table() -> MergedTable {
        let series: Vec<YearSeries> = default_series()
            .iter()
            .map(|s| s.sample.as_ref().unwrap().to_series(&s.name))
            .collect();
        MergedTable::outer_join(&series)
    }

    #[test]
    fn test_report_substitutes_rounded_r() {
        let comparisons = default_comparisons();
        let report = build_report(&comparisons[0], &default_series(), &sample_table(), None);

        let r = report.range_r.unwrap();
        assert_eq!(r, round_to(r, 2));
        assert_eq!(report.overall_r, report.range_r);
        assert_eq!(report.headline, format!("Potato Yields & Migration: r = {}", r));
        assert!(report.paragraphs[0].contains(&format!("coefficient of {},", r)));
        assert_eq!(report.rows.len(), 14);
        assert_eq!(report.left_label, "Potato Yield (tonnes/hectare)");
    }

    #[test]
    fn test_year_range_narrows_rows() {
        let comparisons = default_comparisons();
        let range = YearRange { from: 2014, to: 2016 };
        let report = build_report(&comparisons[1], &default_series(), &sample_table(), Some(range));

        assert_eq!(report.years, Some(range));
        assert_eq!(
            report.rows,
            vec![
                (2014, Some(22500.0), Some(8.6)),
                (2015, Some(23600.0), Some(25.2)),
                (2016, Some(24200.0), Some(3.7)),
            ]
        );
        assert!(report.range_r.is_some());
    }

    #[test]
    fn test_missing_series_reads_unavailable() {
        let comparisons = default_comparisons();
        let table = MergedTable::outer_join(&[YearSeries::from_points("marriages", [(2010, 1.0)])]);
        let report = build_report(&comparisons[1], &default_series(), &table, None);

        assert_eq!(report.range_r, None);
        assert_eq!(report.headline, "Marriages & GDP Growth: r = unavailable");
        assert!(report.rows.is_empty());
    }

    #[test]
    fn test_nan_point_reads_unavailable() {
        let comparisons = default_comparisons();
        let table = MergedTable::outer_join(&[
            YearSeries::from_points("marriages", [(2010, 1.0), (2011, 2.0), (2012, 4.0)]),
            YearSeries::from_points("gdp_growth", [(2010, 3.0), (2011, f64::NAN), (2012, 1.0)]),
        ]);
        let report = build_report(&comparisons[1], &default_series(), &table, None);

        assert_eq!(report.range_r, None);
        assert_eq!(report.headline, "Marriages & GDP Growth: r = unavailable");
    }

    #[test]
    fn test_figure_uses_secondary_axis_and_bar() {
        let comparisons = default_comparisons();
        let report = build_report(&comparisons[1], &default_series(), &sample_table(), None);

        assert_eq!(report.figure["data"][0]["type"], "scatter");
        assert_eq!(report.figure["data"][1]["type"], "bar");
        assert_eq!(report.figure["data"][1]["yaxis"], "y2");
        assert_eq!(report.figure["layout"]["yaxis2"]["overlaying"], "y");
        assert_eq!(report.figure["layout"]["height"], 600);
    }

    #[test]
    fn test_delimited_output_leaves_gaps_empty() {
        let table = MergedTable::outer_join(&[
            YearSeries::from_points("a", [(2010, 1.5)]),
            YearSeries::from_points("b", [(2011, 2.0)]),
        ]);
        assert_eq!(table_to_delimited(&table, b',').unwrap(), "Year,a,b\n2010,1.5,\n2011,,2\n");
        assert_eq!(table_to_delimited(&table, b'\t').unwrap(), "Year\ta\tb\n2010\t1.5\t\n2011\t\t2\n");
    }

    #[test]
    fn test_markdown_lists_each_comparison() {
        let table = sample_table();
        let reports: Vec<ComparisonReport> = default_comparisons()
            .iter()
            .map(|c| build_report(c, &default_series(), &table, None))
            .collect();
        let markdown = render_markdown(&reports, "2024-01-01T00:00:00Z");

        assert!(markdown.contains("## The Curious Relationship Between Potato Yields and Migration"));
        assert!(markdown.contains("## Marriage Rates and Economic Prosperity: A Love Story?"));
        assert!(markdown.contains("| 2020 | 16000 | -3 |"));
    }
}
