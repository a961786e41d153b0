use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Error;

pub const DEFAULT_CONF_LEVEL: f64 = 0.95;

/// Options for building a coefficient table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TidyOptions {
    /// Append `conf.low` and `conf.high` columns.
    pub conf_int: bool,
    /// Confidence level of the interval, in (0, 1).
    pub conf_level: f64,
    /// Only report `term` and `estimate`.
    pub quick: bool,
}

impl Default for TidyOptions {
    fn default() -> Self {
        TidyOptions {
            conf_int: false,
            conf_level: DEFAULT_CONF_LEVEL,
            quick: false,
        }
    }
}

impl TidyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, with the confidence level taken from `LMTIDY_CONF_LEVEL` if it is set
    /// to a valid level.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Ok(level) = std::env::var("LMTIDY_CONF_LEVEL") {
            match level.parse::<f64>() {
                Ok(level) if valid_level(level) => options.conf_level = level,
                _ => warn!("Ignoring invalid LMTIDY_CONF_LEVEL {}", level),
            }
        }
        options
    }

    pub fn conf_int(mut self, conf_int: bool) -> Self {
        self.conf_int = conf_int;
        self
    }

    pub fn conf_level(mut self, conf_level: f64) -> Self {
        self.conf_level = conf_level;
        self
    }

    pub fn quick(mut self, quick: bool) -> Self {
        self.quick = quick;
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.conf_int && !self.quick && !valid_level(self.conf_level) {
            return Err(Error::InvalidConfidenceLevel(self.conf_level));
        }
        Ok(())
    }
}

#[inline]
fn valid_level(level: f64) -> bool {
    level > 0.0 && level < 1.0
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_defaults() {
        let o = TidyOptions::default();
        assert!(!o.conf_int);
        assert!(!o.quick);
        assert_eq!(o.conf_level, 0.95);
        assert!(o.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        assert!(TidyOptions::new().conf_int(true).conf_level(0.9).validate().is_ok());
        for level in [0.0, 1.0, -0.5, 95.0, f64::NAN] {
            assert!(matches!(
                TidyOptions::new()
                    .conf_int(true)
                    .conf_level(level)
                    .validate()
                    .unwrap_err(),
                Error::InvalidConfidenceLevel(_)
            ));
        }
        // the level is irrelevant without an interval
        assert!(TidyOptions::new().conf_level(2.0).validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let o: TidyOptions = serde_json::from_str(r#"{"conf_int": true}"#).unwrap();
        assert_eq!(o, TidyOptions::new().conf_int(true));
    }
}
