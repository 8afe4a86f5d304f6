use crate::domain::model::{Column, MergedTable, YearRange, YearSeries};
use std::collections::BTreeSet;

impl MergedTable {
    /// Full outer join on year. Years ascend; a series without a point for a
    /// year gets `None` there.
    pub fn outer_join(series: &[YearSeries]) -> Self {
        let years: Vec<i32> = series
            .iter()
            .flat_map(|s| s.points.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let columns = series
            .iter()
            .map(|s| Column {
                name: s.name.clone(),
                values: years.iter().map(|year| s.points.get(year).copied()).collect(),
            })
            .collect();

        Self { years, columns }
    }

    /// Keeps only the rows inside `range` (inclusive).
    pub fn filter_years(&self, range: YearRange) -> Self {
        let keep: Vec<usize> = self
            .years
            .iter()
            .enumerate()
            .filter(|(_, year)| range.contains(**year))
            .map(|(row, _)| row)
            .collect();

        Self {
            years: keep.iter().map(|row| self.years[*row]).collect(),
            columns: self
                .columns
                .iter()
                .map(|column| Column {
                    name: column.name.clone(),
                    values: keep.iter().map(|row| column.values[*row]).collect(),
                })
                .collect(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn year_span(&self) -> Option<YearRange> {
        match (self.years.first(), self.years.last()) {
            (Some(from), Some(to)) => Some(YearRange { from: *from, to: *to }),
            _ => None,
        }
    }

    /// Rows of `(year, left, right)` for two named columns.
    pub fn pair_rows(&self, left: &str, right: &str) -> Option<Vec<(i32, Option<f64>, Option<f64>)>> {
        let left = self.column(left)?;
        let right = self.column(right)?;
        Some(
            self.years
                .iter()
                .enumerate()
                .map(|(row, year)| (*year, left.values[row], right.values[row]))
                .collect(),
        )
    }

    /// Values of two columns on the rows where both are present.
    pub fn paired_values(&self, left: &str, right: &str) -> Option<(Vec<f64>, Vec<f64>)> {
        let rows = self.pair_rows(left, right)?;
        Some(
            rows.into_iter()
                .filter_map(|(_, l, r)| Some((l?, r?)))
                .unzip(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}
