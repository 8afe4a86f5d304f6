//! Built-in series and comparisons.
//!
//! Each series names the CSO table it is read from and carries bundled yearly
//! values for 2010-2023 that stand in when the service is skipped or fails.

use crate::domain::model::{
    Aggregate, ComparisonSpec, CsoSource, DimensionNaming, SampleData, SeriesSpec, TraceStyle,
};
use std::collections::BTreeMap;

pub const CSO_API_BASE: &str =
    "https://ws.cso.ie/public/api.restful/PxStat.Data.Cube_API.ReadDataset";

pub const POTATO_YIELD: &str = "potato_yield";
pub const NET_MIGRATION: &str = "net_migration";
pub const MARRIAGES: &str = "marriages";
pub const GDP_GROWTH: &str = "gdp_growth";

const SAMPLE_START_YEAR: i32 = 2010;

fn cso(table: &str, year_dimension: &str, filters: &[(&str, &str)], aggregate: Aggregate) -> CsoSource {
    CsoSource {
        table: table.to_string(),
        year_dimension: year_dimension.to_string(),
        filters: filters
            .iter()
            .map(|(dimension, label)| (dimension.to_string(), label.to_string()))
            .collect(),
        request: BTreeMap::new(),
        aggregate,
        scale: None,
        naming: DimensionNaming::Label,
    }
}

fn sample(values: &[f64]) -> Option<SampleData> {
    Some(SampleData {
        start_year: SAMPLE_START_YEAR,
        values: values.to_vec(),
    })
}

pub fn default_series() -> Vec<SeriesSpec> {
    vec![
        SeriesSpec {
            name: POTATO_YIELD.to_string(),
            label: "Potato Yield (tonnes/hectare)".to_string(),
            // AQA04: Area, Yield and Production of Crops
            cso: Some(cso(
                "AQA04",
                "Year",
                &[("Type of Crop", "Potatoes"), ("Statistic", "Crop Yield per Hectare")],
                Aggregate::Single,
            )),
            sample: sample(&[
                32.0, 33.0, 30.0, 28.0, 35.0, 37.0, 31.0, 33.0, 29.0, 31.0, 36.0, 34.0, 32.0, 35.0,
            ]),
        },
        SeriesSpec {
            name: NET_MIGRATION.to_string(),
            label: "Net Migration (thousands)".to_string(),
            // PEA15: Estimated Migration (Persons in April)
            cso: Some(cso("PEA15", "Year", &[("Component", "Net migration")], Aggregate::Single)),
            sample: sample(&[
                -27.0, -34.0, -25.0, -10.0, -1.0, 5.0, 16.0, 19.0, 28.0, 33.0, 30.0, 11.0, 14.0, 19.0,
            ]),
        },
        SeriesSpec {
            name: MARRIAGES.to_string(),
            label: "Number of Marriages".to_string(),
            // VSA01: Marriages
            cso: Some(cso("VSA01", "Year", &[("Statistic", "Marriages")], Aggregate::Single)),
            sample: sample(&[
                21200.0, 20500.0, 22000.0, 21300.0, 22500.0, 23600.0, 24200.0, 22300.0, 21800.0,
                23200.0, 16000.0, 18500.0, 21900.0, 22800.0,
            ]),
        },
        SeriesSpec {
            name: GDP_GROWTH.to_string(),
            label: "GDP Growth Rate (%)".to_string(),
            // NQQ28 is quarterly; quarters are averaged into a yearly rate
            cso: Some(cso(
                "NQQ28",
                "Quarter",
                &[("Statistic", "Percentage Change Over Previous Period")],
                Aggregate::Mean,
            )),
            sample: sample(&[
                1.8, 0.2, 0.0, 1.6, 8.6, 25.2, 3.7, 9.1, 9.0, 5.7, -3.0, 13.6, 12.0, 2.5,
            ]),
        },
    ]
}

pub fn default_comparisons() -> Vec<ComparisonSpec> {
    vec![
        ComparisonSpec {
            key: "potato_migration".to_string(),
            title: "The Curious Relationship Between Potato Yields and Migration".to_string(),
            left: POTATO_YIELD.to_string(),
            right: NET_MIGRATION.to_string(),
            left_style: TraceStyle::Line,
            right_style: TraceStyle::Line,
            left_color: "#8B4513".to_string(),
            right_color: "#2E8B57".to_string(),
            headline: "Potato Yields & Migration: r = {r}".to_string(),
            paragraphs: vec![
                "Who would have thought? As Ireland's potato yields fluctuate, so too does the \
                 migration pattern! With a correlation coefficient of {r}, one might humorously \
                 suggest that Irish people are making life decisions based on the health of the \
                 potato crop. Perhaps the collective memory of the Great Famine still influences \
                 the national psyche? Or maybe people just really like potatoes?"
                    .to_string(),
            ],
            caveat: "Of course, this is purely coincidental. Migration is influenced by economic \
                     opportunities, housing costs, and global conditions, while potato yields \
                     depend on agricultural practices, weather, and growing conditions."
                .to_string(),
        },
        ComparisonSpec {
            key: "marriages_gdp".to_string(),
            title: "Marriage Rates and Economic Prosperity: A Love Story?".to_string(),
            left: MARRIAGES.to_string(),
            right: GDP_GROWTH.to_string(),
            left_style: TraceStyle::Line,
            right_style: TraceStyle::Bar,
            left_color: "#FF69B4".to_string(),
            right_color: "#4682B4".to_string(),
            headline: "Marriages & GDP Growth: r = {r}".to_string(),
            paragraphs: vec![
                "With a correlation coefficient of {r}, one might be tempted to believe that \
                 economic prosperity drives people to tie the knot! Or perhaps all those wedding \
                 expenses are boosting Ireland's GDP? The wedding industry must be more powerful \
                 than we thought!"
                    .to_string(),
            ],
            caveat: "In reality, marriage rates are influenced by social trends, age demographics, \
                     and changing attitudes toward relationships, while GDP growth depends on \
                     countless economic factors including global trade, investment, productivity, \
                     and government policies."
                .to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_cover_2010_to_2023() {
        for spec in default_series() {
            let series = spec.sample.as_ref().unwrap().to_series(&spec.name);
            assert_eq!(series.points.len(), 14, "{}", spec.name);
            assert_eq!(series.points.keys().next(), Some(&2010));
            assert_eq!(series.points.keys().last(), Some(&2023));
        }
    }

    #[test]
    fn test_comparisons_reference_known_series() {
        let names: Vec<String> = default_series().into_iter().map(|s| s.name).collect();
        for comparison in default_comparisons() {
            assert!(names.contains(&comparison.left));
            assert!(names.contains(&comparison.right));
            assert!(comparison.headline.contains("{r}"));
        }
    }
}
