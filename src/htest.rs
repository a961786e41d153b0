use serde::{Deserialize, Serialize};

use crate::{Error, Glance, Table, Tidy, TidyOptions};

/// Method label of a Welch two sample t-test.
pub const WELCH_TWO_SAMPLE_T_TEST: &str = "Welch Two Sample t-test";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TestKind {
    /// Fall back to the method label.
    #[default]
    Unspecified,
    /// Two sample comparison of means, the estimate is the difference of the group means.
    TwoSampleMeans,
    Other,
}

/// The result of a hypothesis test. Every field is optional since tests report
/// different things.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HTest {
    /// One value (a mean, a correlation) or one per group.
    pub estimate: Option<Vec<f64>>,
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
    /// Usually degrees of freedom, two of them for an F test.
    pub parameter: Option<Vec<f64>>,
    pub conf_int: Option<(f64, f64)>,
    pub method: Option<String>,
    pub alternative: Option<String>,
    pub kind: TestKind,
}

impl HTest {
    pub fn is_two_sample_means(&self) -> bool {
        match self.kind {
            TestKind::TwoSampleMeans => true,
            TestKind::Other => false,
            TestKind::Unspecified => self.method.as_deref() == Some(WELCH_TWO_SAMPLE_T_TEST),
        }
    }
}

/// One row describing the test. Fields the test lacks are left out, so the columns
/// depend on the test:
///
/// - a multi-valued estimate becomes `estimate1`, `estimate2`, ... and, for a two sample
///   comparison of means, is preceded by `estimate = estimate1 - estimate2`
/// - then `estimate`, `statistic`, `p.value`, `parameter` as present, with a
///   multi-valued parameter split into `parameter1`, `parameter2`, ...
/// - then `conf.low` and `conf.high` if the test has an interval
#[tracing::instrument]
pub fn tidy(test: &HTest) -> Result<Table, Error> {
    let mut table = Table::new();
    let estimate = test.estimate.as_deref().unwrap_or_default();
    if estimate.len() > 1 {
        if test.is_two_sample_means() {
            table.push_column("estimate", vec![estimate[0] - estimate[1]])?;
        }
        for (i, e) in estimate.iter().enumerate() {
            table.push_column(format!("estimate{}", i + 1), vec![*e])?;
        }
    } else if let [e] = estimate {
        table.push_column("estimate", vec![*e])?;
    }
    if let Some(statistic) = test.statistic {
        table.push_column("statistic", vec![statistic])?;
    }
    if let Some(p_value) = test.p_value {
        table.push_column("p.value", vec![p_value])?;
    }
    match test.parameter.as_deref().unwrap_or_default() {
        [] => {},
        [parameter] => {
            table.push_column("parameter", vec![*parameter])?;
        },
        parameters => {
            for (i, p) in parameters.iter().enumerate() {
                table.push_column(format!("parameter{}", i + 1), vec![*p])?;
            }
        },
    }
    if let Some((low, high)) = test.conf_int {
        table
            .push_column("conf.low", vec![low])?
            .push_column("conf.high", vec![high])?;
    }
    if table.ncols() == 0 {
        return Err(Error::InvalidTestResult);
    }
    Ok(table)
}

/// A test has no model level diagnostics beyond its own summary, so this is [`tidy`].
pub fn glance(test: &HTest) -> Result<Table, Error> {
    tidy(test)
}

impl Tidy for HTest {
    /// Options are ignored, a test reports its interval whenever it has one.
    fn tidy(&self, _options: &TidyOptions) -> Result<Table, Error> {
        tidy(self)
    }
}

impl Glance for HTest {
    fn glance(&self) -> Result<Table, Error> {
        glance(self)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn one_sample() -> HTest {
        HTest {
            estimate: Some(vec![5.1]),
            statistic: Some(3.2),
            p_value: Some(0.0108),
            parameter: Some(vec![9.0]),
            conf_int: Some((4.2, 6.0)),
            method: Some("One Sample t-test".to_string()),
            alternative: Some("two.sided".to_string()),
            ..Default::default()
        }
    }

    fn welch() -> HTest {
        HTest {
            estimate: Some(vec![5.0, 3.0]),
            statistic: Some(2.5),
            p_value: Some(0.02),
            parameter: Some(vec![17.8]),
            conf_int: Some((0.3, 3.7)),
            method: Some(WELCH_TWO_SAMPLE_T_TEST.to_string()),
            alternative: Some("two.sided".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_one_sample() {
        let t = tidy(&one_sample()).unwrap();
        assert_eq!(t.nrows(), 1);
        assert_eq!(
            t.colnames(),
            vec![
                "estimate",
                "statistic",
                "p.value",
                "parameter",
                "conf.low",
                "conf.high"
            ]
        );
        let estimate = t.floats("estimate").unwrap()[0];
        assert!(t.floats("conf.low").unwrap()[0] <= estimate);
        assert!(estimate <= t.floats("conf.high").unwrap()[0]);
    }

    #[test]
    fn test_welch_difference_of_means() {
        let t = tidy(&welch()).unwrap();
        assert_eq!(t.nrows(), 1);
        assert_eq!(
            t.colnames(),
            vec![
                "estimate",
                "estimate1",
                "estimate2",
                "statistic",
                "p.value",
                "parameter",
                "conf.low",
                "conf.high"
            ]
        );
        assert_eq!(t.floats("estimate").unwrap(), &[2.0]);
        assert_eq!(t.floats("estimate1").unwrap(), &[5.0]);
        assert_eq!(t.floats("estimate2").unwrap(), &[3.0]);
    }

    #[test]
    fn test_two_sample_kind_tag_overrides_label() {
        let test = HTest {
            method: Some(" Two Sample t-test".to_string()),
            kind: TestKind::TwoSampleMeans,
            ..welch()
        };
        assert_eq!(tidy(&test).unwrap().floats("estimate").unwrap(), &[2.0]);

        let test = HTest {
            kind: TestKind::Other,
            ..welch()
        };
        let t = tidy(&test).unwrap();
        assert!(!t.has_column("estimate"));
        assert_eq!(t.colnames()[0], "estimate1");
    }

    #[test]
    fn test_multi_estimate_without_difference() {
        // e.g. a two sample proportion test
        let test = HTest {
            estimate: Some(vec![0.4, 0.6]),
            statistic: Some(1.2),
            p_value: Some(0.27),
            parameter: Some(vec![1.0]),
            method: Some(
                "2-sample test for equality of proportions with continuity correction"
                    .to_string(),
            ),
            ..Default::default()
        };
        let t = tidy(&test).unwrap();
        assert_eq!(
            t.colnames(),
            vec!["estimate1", "estimate2", "statistic", "p.value", "parameter"]
        );
    }

    #[test]
    fn test_missing_fields_are_dropped() {
        // e.g. a Wilcoxon test reports neither estimate nor parameter
        let test = HTest {
            statistic: Some(42.0),
            p_value: Some(0.3),
            parameter: Some(vec![]),
            estimate: Some(vec![]),
            ..Default::default()
        };
        let t = tidy(&test).unwrap();
        assert_eq!(t.colnames(), vec!["statistic", "p.value"]);
    }

    #[test]
    fn test_multi_parameter_split() {
        // var.test reports numerator and denominator degrees of freedom
        let test = HTest {
            estimate: Some(vec![1.4]),
            statistic: Some(1.4),
            p_value: Some(0.6),
            parameter: Some(vec![9.0, 9.0]),
            conf_int: Some((0.35, 5.6)),
            ..Default::default()
        };
        let t = tidy(&test).unwrap();
        assert_eq!(t.nrows(), 1);
        assert_eq!(
            t.colnames(),
            vec![
                "estimate",
                "statistic",
                "p.value",
                "parameter1",
                "parameter2",
                "conf.low",
                "conf.high"
            ]
        );
    }

    #[test]
    fn test_conf_int_is_positional() {
        let test = HTest {
            estimate: Some(vec![1.0]),
            conf_int: Some((2.0, -1.0)),
            ..Default::default()
        };
        let t = tidy(&test).unwrap();
        assert_eq!(t.floats("conf.low").unwrap(), &[2.0]);
        assert_eq!(t.floats("conf.high").unwrap(), &[-1.0]);
    }

    #[test]
    fn test_no_fields() {
        assert!(matches!(
            tidy(&HTest::default()).unwrap_err(),
            Error::InvalidTestResult
        ));
        let test = HTest {
            method: Some(WELCH_TWO_SAMPLE_T_TEST.to_string()),
            ..Default::default()
        };
        assert!(matches!(tidy(&test).unwrap_err(), Error::InvalidTestResult));
    }

    #[test]
    fn test_glance_is_tidy() {
        let test = welch();
        assert_eq!(test.glance().unwrap(), test.tidy(&TidyOptions::default()).unwrap());
        assert_eq!(glance(&test).unwrap(), tidy(&test).unwrap());
    }

    #[test]
    fn test_deserialize() {
        let test: HTest = serde_json::from_str(
            r#"{"estimate": [0.8], "statistic": 5.1, "p_value": 0.001, "method": "Pearson's product-moment correlation"}"#,
        )
        .unwrap();
        let t = tidy(&test).unwrap();
        assert_eq!(t.colnames(), vec!["estimate", "statistic", "p.value"]);
    }
}
