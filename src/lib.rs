//! Tidy tables from fitted models.
//!
//! Every supported model gives up to three tables: [`Tidy`] (one row per parameter),
//! [`Augment`] (one row per observation, with `.fitted` and `.resid`) and [`Glance`]
//! (one row of model level diagnostics).

mod coef;
mod data;
mod env;
mod error;
pub mod htest;
pub mod nls;
mod options;
mod table;

pub use crate::{
    coef::*,
    data::*,
    env::*,
    error::*,
    htest::{HTest, TestKind, WELCH_TWO_SAMPLE_T_TEST},
    nls::{Convergence, Interval, Nls, NlsFit, NlsSummary, Verbosity},
    options::*,
    table::*,
};

pub trait Tidy {
    fn tidy(&self, options: &TidyOptions) -> Result<Table, Error>;
}

pub trait Augment {
    /// `data` should be the observations the model was fit on.
    fn augment(&self, data: Option<&Data>) -> Result<Table, Error>;
}

pub trait Glance {
    fn glance(&self) -> Result<Table, Error>;
}
