// =============================================================================
// Indicator Table: price bars merged with derived columns
// =============================================================================
//
// Layout (one row per bar, same order as the series):
//
//   Date | Ticker | Open | High | Low | Close | Adj Close | Volume | <indicators...>
//
// Indicator columns follow in request order under their fixed names. Missing
// values serialise as `null`.
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::{DerivedColumn, PriceSeries};

/// Names of the columns taken from the price series itself.
pub const PRICE_COLUMNS: [&str; 8] = [
    "Date", "Ticker", "Open", "High", "Low", "Close", "Adj Close", "Volume",
];

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Date(NaiveDate),
    Text(String),
    Count(u64),
    Number(Option<f64>),
}

#[cfg(test)]
impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => *v,
            _ => None,
        }
    }
}

/// Labeled, index-aligned table for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl IndicatorTable {
    /// Merge `series` with its derived columns.
    ///
    /// Derived columns are expected to be as long as the series; a shorter
    /// column is padded with missing values.
    pub fn build(series: &PriceSeries, derived: &[DerivedColumn]) -> Self {
        let mut columns: Vec<String> = PRICE_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.extend(derived.iter().map(|d| d.name.clone()));

        let rows = series
            .bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let mut row = Vec::with_capacity(columns.len());
                row.push(Cell::Date(bar.date));
                row.push(Cell::Text(series.ticker.clone()));
                row.push(Cell::Number(Some(bar.open)));
                row.push(Cell::Number(Some(bar.high)));
                row.push(Cell::Number(Some(bar.low)));
                row.push(Cell::Number(Some(bar.close)));
                row.push(Cell::Number(bar.adj_close));
                row.push(Cell::Count(bar.volume));
                row.extend(
                    derived
                        .iter()
                        .map(|d| Cell::Number(d.values.get(i).copied().flatten())),
                );
                row
            })
            .collect();

        Self { columns, rows }
    }
}

#[cfg(test)]
impl IndicatorTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All cells of the column called `name`.
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().filter_map(|r| r.get(idx)).collect())
    }
}
