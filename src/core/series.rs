use crate::domain::model::{Aggregate, CsoSource, Record, YearSeries};
use crate::utils::error::{EtlError, Result};
use std::collections::BTreeMap;

/// Reduces flattened cube records to a single yearly series.
///
/// Keeps records whose labels match every filter, skips missing cells and
/// groups the rest by the year parsed from `year_dimension`.
pub fn extract_series(name: &str, records: &[Record], source: &CsoSource) -> Result<YearSeries> {
    let Some(first) = records.first() else {
        return Ok(YearSeries::new(name));
    };

    let required = std::iter::once(source.year_dimension.as_str())
        .chain(source.filters.keys().map(String::as_str));
    for dimension in required {
        if first.label(dimension).is_none() {
            let available: Vec<&str> = first.labels.iter().map(|(n, _)| n.as_str()).collect();
            return Err(EtlError::ProcessingError {
                message: format!(
                    "series '{}' refers to unknown dimension '{}' (available: {})",
                    name,
                    dimension,
                    available.join(", ")
                ),
            });
        }
    }

    let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for record in records {
        let matches = source
            .filters
            .iter()
            .all(|(dimension, wanted)| record.label(dimension) == Some(wanted.as_str()));
        if !matches {
            continue;
        }
        let Some(value) = record.value else {
            continue;
        };
        let year_label = record.label(&source.year_dimension).unwrap_or_default();
        by_year.entry(parse_year(year_label)?).or_default().push(value);
    }

    let scale = source.scale.unwrap_or(1.0);
    let mut series = YearSeries::new(name);
    for (year, values) in by_year {
        let value = reduce(name, year, &values, source.aggregate)?;
        series.points.insert(year, value * scale);
    }

    tracing::debug!(
        "Extracted {} yearly points for '{}' from {} records",
        series.points.len(),
        name,
        records.len()
    );
    Ok(series)
}

/// Reads the leading four-digit year from labels like `2010`, `2010Q1` or `2010M03`.
pub fn parse_year(label: &str) -> Result<i32> {
    let digits = label.trim().get(..4).filter(|p| p.bytes().all(|b| b.is_ascii_digit()));
    digits
        .and_then(|d| d.parse().ok())
        .ok_or_else(|| EtlError::ProcessingError {
            message: format!("'{}' does not start with a year", label),
        })
}

fn reduce(name: &str, year: i32, values: &[f64], aggregate: Aggregate) -> Result<f64> {
    match aggregate {
        Aggregate::Single => match values {
            [only] => Ok(*only),
            _ => Err(EtlError::ProcessingError {
                message: format!(
                    "series '{}' has {} cells for {}; add filters or choose an aggregate",
                    name,
                    values.len(),
                    year
                ),
            }),
        },
        Aggregate::Sum => Ok(values.iter().sum()),
        Aggregate::Mean => Ok(values.iter().sum::<f64>() / values.len() as f64),
        Aggregate::Last => values.last().copied().ok_or_else(|| EtlError::ProcessingError {
            message: format!("series '{}' has no cells for {}", name, year),
        }),
    }
}
