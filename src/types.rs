// =============================================================================
// Shared types used across Ticker Lens
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::RequestError;

// =============================================================================
// Price data
// =============================================================================

/// One trading day for a ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Split/dividend adjusted close. Not every source supplies it.
    #[serde(default)]
    pub adj_close: Option<f64>,
    #[serde(default)]
    pub volume: u64,
}

/// Daily bars for a single ticker, ascending by date with no synthesized
/// days. Non-trading days are simply absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub ticker: String,
    pub bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series from bars in any order. Bars are sorted by date and a
    /// repeated date keeps its last occurrence.
    pub fn new(ticker: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.date);
        let mut unique: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match unique.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => unique.push(bar),
            }
        }
        Self {
            ticker: ticker.into(),
            bars: unique,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The closing-price sequence the indicator engine works on.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

/// A named, index-aligned derived series. `None` marks an index where the
/// indicator is not computable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl DerivedColumn {
    /// Non-finite values are stored as missing.
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of leading missing entries.
    pub fn leading_missing(&self) -> usize {
        self.values.iter().take_while(|v| v.is_none()).count()
    }
}

// =============================================================================
// Indicator selection
// =============================================================================

pub const DEFAULT_MA_PERIOD: usize = 5;
pub const DEFAULT_VOLATILITY_PERIOD: usize = 5;
pub const DEFAULT_EMA_SPAN: usize = 20;
pub const DEFAULT_MACD_FAST: usize = 12;
pub const DEFAULT_MACD_SLOW: usize = 26;
pub const DEFAULT_MACD_SIGNAL: usize = 9;
pub const DEFAULT_RSI_PERIOD: usize = 14;

/// An indicator together with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum IndicatorKind {
    DailyReturn,
    MovingAverage { period: usize },
    Volatility { period: usize },
    Ema { span: usize },
    Macd { fast: usize, slow: usize, signal: usize },
    Rsi { period: usize },
}

impl IndicatorKind {
    /// Every indicator with its default parameters, in display order.
    pub const ALL: [IndicatorKind; 6] = [
        IndicatorKind::DailyReturn,
        IndicatorKind::MovingAverage {
            period: DEFAULT_MA_PERIOD,
        },
        IndicatorKind::Volatility {
            period: DEFAULT_VOLATILITY_PERIOD,
        },
        IndicatorKind::Ema {
            span: DEFAULT_EMA_SPAN,
        },
        IndicatorKind::Macd {
            fast: DEFAULT_MACD_FAST,
            slow: DEFAULT_MACD_SLOW,
            signal: DEFAULT_MACD_SIGNAL,
        },
        IndicatorKind::Rsi {
            period: DEFAULT_RSI_PERIOD,
        },
    ];

    /// Column name this indicator produces in the output table.
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::DailyReturn => "Daily Return",
            Self::MovingAverage { .. } => "Moving Average",
            Self::Volatility { .. } => "Volatility",
            Self::Ema { .. } => "EMA",
            Self::Macd { .. } => "MACD",
            Self::Rsi { .. } => "RSI",
        }
    }

    /// Label shown in the selection widget.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Ema { .. } => "Exponential Moving Average",
            other => other.column_name(),
        }
    }

    /// Resolve a selection label (or column name) to an indicator with the
    /// given moving-average and volatility periods. The remaining indicators
    /// use their conventional fixed parameters.
    pub fn from_name(
        name: &str,
        ma_period: usize,
        volatility_period: usize,
    ) -> Result<Self, RequestError> {
        let kind = match name.trim().to_ascii_lowercase().as_str() {
            "daily return" => Self::DailyReturn,
            "moving average" => Self::MovingAverage { period: ma_period },
            "volatility" => Self::Volatility {
                period: volatility_period,
            },
            "exponential moving average" | "ema" => Self::Ema {
                span: DEFAULT_EMA_SPAN,
            },
            "macd" => Self::Macd {
                fast: DEFAULT_MACD_FAST,
                slow: DEFAULT_MACD_SLOW,
                signal: DEFAULT_MACD_SIGNAL,
            },
            "rsi" => Self::Rsi {
                period: DEFAULT_RSI_PERIOD,
            },
            _ => return Err(RequestError::UnknownIndicator(name.to_string())),
        };
        Ok(kind)
    }

    fn periods(&self) -> Vec<usize> {
        match *self {
            Self::DailyReturn => vec![],
            Self::MovingAverage { period } | Self::Volatility { period } | Self::Rsi { period } => {
                vec![period]
            }
            Self::Ema { span } => vec![span],
            Self::Macd { fast, slow, signal } => vec![fast, slow, signal],
        }
    }
}

impl std::fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DailyReturn => write!(f, "Daily Return"),
            Self::MovingAverage { period } => write!(f, "Moving Average({period})"),
            Self::Volatility { period } => write!(f, "Volatility({period})"),
            Self::Ema { span } => write!(f, "EMA({span})"),
            Self::Macd { fast, slow, signal } => write!(f, "MACD({fast},{slow},{signal})"),
            Self::Rsi { period } => write!(f, "RSI({period})"),
        }
    }
}

/// The validated set of indicators to compute for each ticker.
///
/// Order is preserved; a second selection producing an already-present
/// column name is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndicatorRequest {
    kinds: Vec<IndicatorKind>,
}

impl IndicatorRequest {
    pub fn new(kinds: impl IntoIterator<Item = IndicatorKind>) -> Result<Self, RequestError> {
        let mut out: Vec<IndicatorKind> = Vec::new();
        for kind in kinds {
            if kind.periods().contains(&0) {
                return Err(RequestError::InvalidPeriod {
                    indicator: kind.column_name(),
                    value: 0,
                });
            }
            if out.iter().any(|k| k.column_name() == kind.column_name()) {
                continue;
            }
            out.push(kind);
        }
        Ok(Self { kinds: out })
    }

    pub fn kinds(&self) -> &[IndicatorKind] {
        &self.kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            adj_close: None,
            volume: 0,
        }
    }

    #[test]
    fn price_series_sorts_and_dedups() {
        let series = PriceSeries::new("AAPL", vec![bar(3, 3.0), bar(1, 1.0), bar(3, 4.0), bar(2, 2.0)]);
        assert_eq!(series.closes(), vec![1.0, 2.0, 4.0]);
        assert!(series.bars.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn derived_column_drops_non_finite() {
        let col = DerivedColumn::new("x", vec![None, Some(f64::NAN), Some(1.0), Some(f64::INFINITY)]);
        assert_eq!(col.values, vec![None, None, Some(1.0), None]);
        assert_eq!(col.leading_missing(), 2);
    }

    #[test]
    fn from_name_accepts_labels_and_column_names() {
        assert_eq!(
            IndicatorKind::from_name("Exponential Moving Average", 5, 5).unwrap(),
            IndicatorKind::Ema { span: 20 }
        );
        assert_eq!(IndicatorKind::from_name("EMA", 5, 5).unwrap(), IndicatorKind::Ema { span: 20 });
        assert_eq!(
            IndicatorKind::from_name("moving average", 7, 5).unwrap(),
            IndicatorKind::MovingAverage { period: 7 }
        );
        assert_eq!(
            IndicatorKind::from_name("Volatility", 7, 9).unwrap(),
            IndicatorKind::Volatility { period: 9 }
        );
        assert!(matches!(
            IndicatorKind::from_name("Bollinger", 5, 5),
            Err(RequestError::UnknownIndicator(_))
        ));
    }

    #[test]
    fn request_rejects_zero_period() {
        let err = IndicatorRequest::new([IndicatorKind::MovingAverage { period: 0 }]).unwrap_err();
        assert_eq!(
            err,
            RequestError::InvalidPeriod {
                indicator: "Moving Average",
                value: 0
            }
        );
    }

    #[test]
    fn request_keeps_order_and_drops_duplicate_columns() {
        let req = IndicatorRequest::new([
            IndicatorKind::Rsi { period: 14 },
            IndicatorKind::DailyReturn,
            IndicatorKind::Rsi { period: 7 },
        ])
        .unwrap();
        assert_eq!(
            req.kinds(),
            &[IndicatorKind::Rsi { period: 14 }, IndicatorKind::DailyReturn]
        );
    }

    #[test]
    fn column_names_are_exact() {
        let names: Vec<_> = IndicatorKind::ALL.iter().map(|k| k.column_name()).collect();
        assert_eq!(
            names,
            vec!["Daily Return", "Moving Average", "Volatility", "EMA", "MACD", "RSI"]
        );
    }
}
