//! Ordered feature column selection

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered list of columns used for training.
///
/// Order determines the tensor layout; the column at index 0 is the
/// forecast target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureSpec {
    columns: Vec<String>,
}

impl FeatureSpec {
    /// Create a feature spec from column names, first column is the target
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();

        if columns.is_empty() {
            return Err(ForecastError::ConfigurationError(
                "At least one feature column is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for name in &columns {
            if name.trim().is_empty() {
                return Err(ForecastError::ConfigurationError(
                    "Feature column names must not be empty".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(ForecastError::ConfigurationError(format!(
                    "Feature column '{}' is listed more than once",
                    name
                )));
            }
        }

        Ok(Self { columns })
    }

    /// Create a feature spec with `target` moved to index 0.
    ///
    /// The remaining columns keep their relative order. If `target` is not in
    /// `columns` it is prepended.
    pub fn with_target<I, S>(target: &str, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered = vec![target.to_string()];
        ordered.extend(
            columns
                .into_iter()
                .map(Into::into)
                .filter(|name: &String| name != target),
        );
        Self::new(ordered)
    }

    /// Name of the forecast target column
    pub fn target(&self) -> &str {
        &self.columns[0]
    }

    /// All columns in tensor order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of a column in tensor order
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of feature columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false, a spec holds at least one column
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl TryFrom<Vec<String>> for FeatureSpec {
    type Error = ForecastError;

    fn try_from(columns: Vec<String>) -> Result<Self> {
        Self::new(columns)
    }
}

impl From<FeatureSpec> for Vec<String> {
    fn from(spec: FeatureSpec) -> Self {
        spec.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_target_moves_target_first() {
        let spec =
            FeatureSpec::with_target("close", ["open", "high", "low", "close", "volume"]).unwrap();

        assert_eq!(spec.target(), "close");
        assert_eq!(spec.columns(), &["close", "open", "high", "low", "volume"]);
        assert_eq!(spec.index_of("volume"), Some(4));
    }

    #[test]
    fn test_with_target_prepends_missing_target() {
        let spec = FeatureSpec::with_target("close", ["open"]).unwrap();
        assert_eq!(spec.columns(), &["close", "open"]);
    }

    #[test]
    fn test_rejects_empty_and_duplicates() {
        assert!(FeatureSpec::new(Vec::<String>::new()).is_err());
        assert!(FeatureSpec::new(["close", "close"]).is_err());
        assert!(FeatureSpec::new(["close", " "]).is_err());
    }

    #[test]
    fn test_serde_validates() {
        let spec: FeatureSpec = serde_json::from_str(r#"["close", "volume"]"#).unwrap();
        assert_eq!(spec.len(), 2);

        let invalid: std::result::Result<FeatureSpec, _> = serde_json::from_str("[]");
        assert!(invalid.is_err());
    }
}
