use serde::{Deserialize, Serialize};

/// One row of a model's coefficient table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coef {
    label: String,
    estimate: f64,
    std_err: f64,
    statistic: f64,
    p_value: f64,
}

impl Coef {
    pub fn new(
        label: impl ToString,
        estimate: f64,
        std_err: f64,
        statistic: f64,
        p_value: f64,
    ) -> Self {
        Coef {
            label: label.to_string(),
            estimate,
            std_err,
            statistic,
            p_value,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn estimate(&self) -> f64 {
        self.estimate
    }

    pub fn std_err(&self) -> f64 {
        self.std_err
    }

    pub fn statistic(&self) -> f64 {
        self.statistic
    }

    pub fn p_value(&self) -> f64 {
        self.p_value
    }
}
