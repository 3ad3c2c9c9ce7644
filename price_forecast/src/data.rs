//! Daily time series data handling for forecasting

use crate::error::{ForecastError, Result};
use crate::features::FeatureSpec;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// One day of OHLCV data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    /// Trading day
    pub date: NaiveDate,
    /// Open price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Close price
    pub close: f64,
    /// Volume
    pub volume: f64,
}

/// Ordered daily records with a date column and named numeric columns
#[derive(Debug, Clone)]
pub struct TimeSeriesFrame {
    /// Data frame containing the time series data
    df: DataFrame,
    /// Name of the date column
    date_column: String,
    /// Parsed dates, strictly increasing
    dates: Vec<NaiveDate>,
}

/// Data loader for time series data
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load time series data from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<TimeSeriesFrame> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(Some(100))
            .has_header(true)
            .finish()?;

        TimeSeriesFrame::new(df)
    }

    /// Create time series data from an existing DataFrame
    pub fn from_dataframe(df: DataFrame) -> Result<TimeSeriesFrame> {
        TimeSeriesFrame::new(df)
    }

    /// Detect the date column in a DataFrame
    fn detect_date_column(df: &DataFrame) -> Result<String> {
        for name in df.get_column_names() {
            let lower_name = name.to_lowercase();
            if lower_name.contains("date")
                || lower_name.contains("time")
                || lower_name.contains("timestamp")
            {
                return Ok(name.to_string());
            }
        }

        // If not found, use the first column if it looks like a date/time
        if let Some(first_col) = df.get_columns().first() {
            if first_col.dtype().is_temporal() {
                return Ok(first_col.name().to_string());
            }
        }

        Err(ForecastError::DataError(
            "No date column found in data".to_string(),
        ))
    }
}

impl TimeSeriesFrame {
    /// Wrap a DataFrame, detecting and validating its date column.
    ///
    /// Dates must be strictly increasing.
    pub fn new(df: DataFrame) -> Result<Self> {
        let date_column = DataLoader::detect_date_column(&df)?;
        let dates = parse_dates(df.column(&date_column)?)?;

        if let Some(pair) = dates.windows(2).find(|pair| pair[1] <= pair[0]) {
            return Err(ForecastError::DataError(format!(
                "Dates must be strictly increasing, found {} followed by {}",
                pair[0], pair[1]
            )));
        }

        Ok(Self {
            df,
            date_column,
            dates,
        })
    }

    /// Build a frame with `date, open, high, low, close, volume` columns
    pub fn from_bars(bars: &[DailyBar]) -> Result<Self> {
        let days: Vec<i32> = bars.iter().map(|bar| date_to_days(bar.date)).collect();
        let field = |f: fn(&DailyBar) -> f64| bars.iter().map(f).collect::<Vec<f64>>();

        let df = DataFrame::new(vec![
            Series::new("date", days).cast(&DataType::Date)?,
            Series::new("open", field(|bar| bar.open)),
            Series::new("high", field(|bar| bar.high)),
            Series::new("low", field(|bar| bar.low)),
            Series::new("close", field(|bar| bar.close)),
            Series::new("volume", field(|bar| bar.volume)),
        ])?;

        Self::new(df)
    }

    /// Get the DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Get the date column name
    pub fn date_column(&self) -> &str {
        &self.date_column
    }

    /// Get the dates in order
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Last date in the frame
    pub fn last_date(&self) -> Result<NaiveDate> {
        self.dates.last().copied().ok_or_else(|| {
            ForecastError::InsufficientData("Time series frame is empty".to_string())
        })
    }

    /// Names of all numeric (non-date) columns
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .filter(|series| series.name() != self.date_column && series.dtype().is_numeric())
            .map(|series| series.name().to_string())
            .collect()
    }

    /// Get a numeric column as f64 values, nulls become `NaN`
    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        let series = self.df.column(name).map_err(|_| {
            ForecastError::DataError(format!("Column '{}' not found", name))
        })?;

        if name == self.date_column || !series.dtype().is_numeric() {
            return Err(ForecastError::DataError(format!(
                "Column '{}' cannot be converted to f64",
                name
            )));
        }

        let values = series.cast(&DataType::Float64)?;
        let values = values
            .f64()?
            .into_iter()
            .map(|value| value.unwrap_or(f64::NAN))
            .collect();
        Ok(values)
    }

    /// Last value of a column; it must be finite
    pub fn last_value(&self, name: &str) -> Result<f64> {
        let value = self.column(name)?.last().copied().ok_or_else(|| {
            ForecastError::InsufficientData("Time series frame is empty".to_string())
        })?;

        if !value.is_finite() {
            return Err(ForecastError::DataError(format!(
                "Last value of column '{}' is not finite",
                name
            )));
        }
        Ok(value)
    }

    /// Rows x columns matrix of the spec's columns, in spec order.
    ///
    /// Every value must be finite.
    pub fn feature_matrix(&self, spec: &FeatureSpec) -> Result<Array2<f64>> {
        let mut matrix = Array2::zeros((self.len(), spec.len()));

        for (j, name) in spec.columns().iter().enumerate() {
            let values = self.column(name)?;
            if let Some(row) = values.iter().position(|v| !v.is_finite()) {
                return Err(ForecastError::DataError(format!(
                    "Column '{}' has a non-finite value at row {} ({})",
                    name, row, self.dates[row]
                )));
            }
            matrix.column_mut(j).assign(&Array1::from(values));
        }

        Ok(matrix)
    }

    /// Return a new frame with `values` added as column `name`.
    ///
    /// An existing column with the same name is replaced.
    pub fn with_column(&self, name: &str, values: Vec<f64>) -> Result<Self> {
        if name == self.date_column {
            return Err(ForecastError::DataError(format!(
                "Cannot replace the date column '{}'",
                name
            )));
        }
        if values.len() != self.len() {
            return Err(ForecastError::DataError(format!(
                "Column '{}' has {} values, frame has {} rows",
                name,
                values.len(),
                self.len()
            )));
        }

        let mut df = self.df.clone();
        df.with_column(Series::new(name, values))?;

        Ok(Self {
            df,
            date_column: self.date_column.clone(),
            dates: self.dates.clone(),
        })
    }

    /// Drop every row where one of the spec's columns is not finite.
    ///
    /// Used to remove indicator warm-up rows before training.
    pub fn drop_incomplete_rows(&self, spec: &FeatureSpec) -> Result<Self> {
        let mut keep = vec![true; self.len()];
        for name in spec.columns() {
            for (flag, value) in keep.iter_mut().zip(self.column(name)?) {
                *flag &= value.is_finite();
            }
        }

        let mask: BooleanChunked = keep.iter().copied().collect();
        let df = self.df.filter(&mask)?;
        let dates = self
            .dates
            .iter()
            .zip(&keep)
            .filter(|(_, kept)| **kept)
            .map(|(date, _)| *date)
            .collect();

        Ok(Self {
            df,
            date_column: self.date_column.clone(),
            dates,
        })
    }

    /// Get a slice of the data from start to end index
    pub fn slice(&self, start: usize, end: Option<usize>) -> Result<Self> {
        let end = end.unwrap_or(self.len());
        if start > end || end > self.len() {
            return Err(ForecastError::DataError(format!(
                "Invalid slice {}..{} for frame of {} rows",
                start,
                end,
                self.len()
            )));
        }

        Ok(Self {
            df: self.df.slice(start as i64, end - start),
            date_column: self.date_column.clone(),
            dates: self.dates[start..end].to_vec(),
        })
    }

    /// Last `n` rows (all rows if the frame is shorter)
    pub fn tail(&self, n: usize) -> Result<Self> {
        self.slice(self.len().saturating_sub(n), None)
    }

    /// Check if the time series is empty
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Get the length of the time series
    pub fn len(&self) -> usize {
        self.dates.len()
    }
}

pub(crate) fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

fn parse_date_str(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            // Timestamps with an offset suffix, e.g. "2024-01-02 00:00:00-05:00"
            text.get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        })
}

fn parse_dates(series: &Series) -> Result<Vec<NaiveDate>> {
    let missing = |row: usize| {
        ForecastError::DataError(format!(
            "Invalid or missing date in column '{}' at row {}",
            series.name(),
            row
        ))
    };

    match series.dtype() {
        DataType::Utf8 => series
            .utf8()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| value.and_then(parse_date_str).ok_or_else(|| missing(row)))
            .collect(),
        DataType::Date | DataType::Datetime(_, _) => {
            let days = series.cast(&DataType::Date)?.cast(&DataType::Int32)?;
            let dates = days
                .i32()?
                .into_iter()
                .enumerate()
                .map(|(row, value)| value.and_then(days_to_date).ok_or_else(|| missing(row)))
                .collect();
            dates
        }
        other => Err(ForecastError::DataError(format!(
            "Column '{}' has unsupported date type {}",
            series.name(),
            other
        ))),
    }
}
