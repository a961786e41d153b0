use faer::{linalg::solvers::DenseSolveCore, MatRef, Side};
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::{debug, warn};

use crate::{Augment, Coef, Data, Environment, Error, Glance, Table, Tidy, TidyOptions, Values};

/// How chatty a model may be while computing confidence intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    #[default]
    Quiet,
    Progress,
}

/// Confidence bounds as returned by a model, either one `(low, high)` pair per parameter
/// or a single flat pair for a one parameter model.
#[derive(Debug, Clone, PartialEq)]
pub enum Interval {
    Table(Vec<(f64, f64)>),
    Flat(f64, f64),
}

impl Interval {
    pub fn into_rows(self) -> Vec<(f64, f64)> {
        match self {
            Interval::Table(rows) => rows,
            Interval::Flat(low, high) => vec![(low, high)],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NlsSummary {
    sigma: f64,
    is_conv: bool,
    fin_tol: f64,
}

impl NlsSummary {
    pub fn new(sigma: f64, is_conv: bool, fin_tol: f64) -> Self {
        NlsSummary {
            sigma,
            is_conv,
            fin_tol,
        }
    }

    /// Residual standard error.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn is_conv(&self) -> bool {
        self.is_conv
    }

    /// Achieved convergence tolerance.
    pub fn fin_tol(&self) -> f64 {
        self.fin_tol
    }
}

/// A fitted nonlinear least squares model, as far as tidying is concerned.
///
/// Implement this for the result type of a solver to get [`tidy`], [`augment`] and
/// [`glance`] for free.
pub trait NlsFit {
    /// One row per parameter, in parameter order. `None` if the model has none.
    fn coef_table(&self) -> Option<&[Coef]>;

    /// Confidence bounds for every parameter at `level`. Progress messages may only be
    /// emitted when `verbosity` is [`Verbosity::Progress`].
    fn confint(&self, level: f64, verbosity: Verbosity) -> Result<Interval, Error>;

    fn parameter_names(&self) -> Vec<String> {
        self.coef_table()
            .map(|c| c.iter().map(|c| c.label().to_string()).collect())
            .unwrap_or_default()
    }

    /// The variables the model was fit in, if the solver kept them.
    fn environment(&self) -> Option<&Environment>;

    fn fitted(&self) -> Vec<f64>;

    fn residuals(&self) -> Vec<f64>;

    fn summary(&self) -> Option<NlsSummary>;
}

/// The coefficient table: `term`, `estimate`, `stderror`, `statistic`, `p.value`, and
/// optionally `conf.low` and `conf.high`.
#[tracing::instrument(skip(model))]
pub fn tidy<M: NlsFit + ?Sized>(model: &M, options: &TidyOptions) -> Result<Table, Error> {
    options.validate()?;
    let coefs = model
        .coef_table()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| Error::InvalidModel("model has no coefficient table".to_string()))?;
    let column = |f: fn(&Coef) -> f64| coefs.iter().map(f).collect::<Vec<_>>();

    let mut table = Table::new();
    table
        .push_column(
            "term",
            coefs
                .iter()
                .map(|c| c.label().to_string())
                .collect::<Vec<_>>(),
        )?
        .push_column("estimate", column(Coef::estimate))?;
    if options.quick {
        return Ok(table);
    }
    table
        .push_column("stderror", column(Coef::std_err))?
        .push_column("statistic", column(Coef::statistic))?
        .push_column("p.value", column(Coef::p_value))?;

    if options.conf_int {
        let rows = model
            .confint(options.conf_level, Verbosity::Quiet)
            .map_err(|e| match e {
                e @ Error::IntervalComputation(_) => e,
                e => Error::IntervalComputation(e.to_string()),
            })?
            .into_rows();
        if rows.len() != coefs.len() {
            return Err(Error::DimensionMismatch {
                expected: coefs.len(),
                found: rows.len(),
            });
        }
        table
            .push_column("conf.low", rows.iter().map(|r| r.0).collect::<Vec<_>>())?
            .push_column("conf.high", rows.iter().map(|r| r.1).collect::<Vec<_>>())?;
    }
    Ok(table)
}

/// The observations with `.fitted` and `.resid` appended.
///
/// Without `data` (or with empty data) the observations are rebuilt from the fit
/// environment, which is best effort; prefer passing the data.
///
/// Non-trivial row labels on `data` become a leading `.rownames` column, so data that
/// already has a `.rownames` column and also carries such labels fails with
/// [`Error::DuplicateColumnName`].
#[tracing::instrument(skip(model, data))]
pub fn augment<M: NlsFit + ?Sized>(model: &M, data: Option<&Data>) -> Result<Table, Error> {
    let fitted = model.fitted();
    let mut table = match data.filter(|d| !d.is_empty()) {
        Some(data) => data.normalize()?,
        None => model
            .environment()
            .ok_or(Error::DataReconstruction)?
            .reconstruct(&model.parameter_names(), fitted.len())?,
    };
    let nrows = table.nrows();
    if fitted.len() != nrows {
        return Err(Error::DimensionMismatch {
            expected: nrows,
            found: fitted.len(),
        });
    }
    let residuals = model.residuals();
    if residuals.len() != nrows {
        return Err(Error::DimensionMismatch {
            expected: nrows,
            found: residuals.len(),
        });
    }
    table
        .set_column(".fitted", fitted)?
        .set_column(".resid", residuals)?;
    Ok(table)
}

/// One row of `sigma`, `isConv` and `finTol`.
#[tracing::instrument(skip(model))]
pub fn glance<M: NlsFit + ?Sized>(model: &M) -> Result<Table, Error> {
    let summary = model
        .summary()
        .ok_or_else(|| Error::InvalidModel("model has no summary".to_string()))?;
    Table::from_columns([
        ("sigma", Values::Float(vec![summary.sigma()])),
        ("isConv", Values::Bool(vec![summary.is_conv()])),
        ("finTol", Values::Float(vec![summary.fin_tol()])),
    ])
}

#[derive(Debug, Clone, PartialEq)]
pub struct Convergence {
    is_conv: bool,
    fin_tol: f64,
    iterations: usize,
    message: String,
}

impl Convergence {
    pub fn new(is_conv: bool, fin_tol: f64, iterations: usize, message: impl ToString) -> Self {
        Convergence {
            is_conv,
            fin_tol,
            iterations,
            message: message.to_string(),
        }
    }

    pub fn is_conv(&self) -> bool {
        self.is_conv
    }

    pub fn fin_tol(&self) -> f64 {
        self.fin_tol
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A converged (or not) nonlinear least squares fit handed over by a solver.
#[derive(Debug, Clone)]
pub struct Nls {
    coefs: Vec<Coef>,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
    df_residual: usize,
    sigma: f64,
    convergence: Convergence,
    environment: Option<Environment>,
}

impl Nls {
    /// Summarize a fit from its parameter estimates and the Jacobian of the model at
    /// those estimates (one row per observation, one column per parameter).
    ///
    /// Standard errors are `sigma * sqrt(diag((J'J)^-1))` with `sigma` the residual
    /// standard error on `n - p` degrees of freedom; p-values are two sided Student t.
    #[tracing::instrument(skip_all)]
    pub fn new(
        labels: &[impl ToString],
        estimates: &[f64],
        jacobian: MatRef<'_, f64>,
        fitted: Vec<f64>,
        residuals: Vec<f64>,
        convergence: Convergence,
    ) -> Result<Self, Error> {
        let p = estimates.len();
        if p == 0 {
            return Err(Error::InvalidModel("model has no parameters".to_string()));
        }
        if labels.len() != p || jacobian.ncols() != p {
            return Err(Error::InvalidModel(format!(
                "{} labels and {} jacobian columns for {} parameters",
                labels.len(),
                jacobian.ncols(),
                p
            )));
        }
        let n = residuals.len();
        for len in [fitted.len(), jacobian.nrows()] {
            if len != n {
                return Err(Error::DimensionMismatch {
                    expected: n,
                    found: len,
                });
            }
        }
        if n <= p {
            return Err(Error::InvalidModel(format!(
                "{} observations cannot support {} parameters",
                n, p
            )));
        }
        if !(convergence.fin_tol >= 0.0) {
            return Err(Error::InvalidModel(format!(
                "invalid convergence tolerance {}",
                convergence.fin_tol
            )));
        }

        let df_residual = n - p;
        let rss = residuals.iter().map(|r| r * r).sum::<f64>();
        let sigma = (rss / df_residual as f64).sqrt();

        let jtj = jacobian.transpose() * jacobian;
        let unscaled = match jtj.llt(Side::Lower) {
            Ok(llt) => llt.inverse(),
            Err(_) => {
                warn!("Using pseudo inverse");
                jtj.thin_svd()
                    .map_err(|e| Error::InvalidModel(format!("could not invert J'J: {:?}", e)))?
                    .pseudoinverse()
            },
        };
        let t_distr = StudentsT::new(0.0, 1.0, df_residual as f64)
            .map_err(|e| Error::InvalidModel(e.to_string()))?;
        let coefs = labels
            .iter()
            .zip(estimates.iter())
            .enumerate()
            .map(|(i, (label, estimate))| {
                let std_err = unscaled[(i, i)].sqrt() * sigma;
                let statistic = estimate / std_err;
                let p_value = 2.0 * (1.0 - t_distr.cdf(statistic.abs()));
                Coef::new(label.to_string(), *estimate, std_err, statistic, p_value)
            })
            .collect::<Vec<_>>();
        debug!(sigma, df_residual, "Summarized nonlinear fit");

        Ok(Nls {
            coefs,
            fitted,
            residuals,
            df_residual,
            sigma,
            convergence,
            environment: None,
        })
    }

    /// Keep the variables the model was fit in, for [`augment`] without data.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn coefs(&self) -> &[Coef] {
        &self.coefs
    }

    pub fn nobs(&self) -> usize {
        self.residuals.len()
    }

    pub fn df_residual(&self) -> usize {
        self.df_residual
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn convergence(&self) -> &Convergence {
        &self.convergence
    }
}

impl NlsFit for Nls {
    fn coef_table(&self) -> Option<&[Coef]> {
        Some(&self.coefs)
    }

    /// Wald intervals, `estimate +/- t * std_err` on the residual degrees of freedom.
    fn confint(&self, level: f64, verbosity: Verbosity) -> Result<Interval, Error> {
        if !(level > 0.0 && level < 1.0) {
            return Err(Error::InvalidConfidenceLevel(level));
        }
        let t_distr = StudentsT::new(0.0, 1.0, self.df_residual as f64)
            .map_err(|e| Error::IntervalComputation(e.to_string()))?;
        let q = t_distr.inverse_cdf((1.0 + level) / 2.0);
        let mut rows = self
            .coefs
            .iter()
            .map(|c| {
                if verbosity == Verbosity::Progress {
                    debug!("Computing interval for {}", c.label());
                }
                if !c.std_err().is_finite() {
                    return Err(Error::IntervalComputation(format!(
                        "standard error of {} is not finite",
                        c.label()
                    )));
                }
                let half = q * c.std_err();
                Ok((c.estimate() - half, c.estimate() + half))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if rows.len() == 1 {
            let (low, high) = rows.remove(0);
            Ok(Interval::Flat(low, high))
        } else {
            Ok(Interval::Table(rows))
        }
    }

    fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    fn fitted(&self) -> Vec<f64> {
        self.fitted.clone()
    }

    fn residuals(&self) -> Vec<f64> {
        self.residuals.clone()
    }

    fn summary(&self) -> Option<NlsSummary> {
        Some(NlsSummary::new(
            self.sigma,
            self.convergence.is_conv,
            self.convergence.fin_tol,
        ))
    }
}

impl Tidy for Nls {
    fn tidy(&self, options: &TidyOptions) -> Result<Table, Error> {
        tidy(self, options)
    }
}

impl Augment for Nls {
    fn augment(&self, data: Option<&Data>) -> Result<Table, Error> {
        augment(self, data)
    }
}

impl Glance for Nls {
    fn glance(&self) -> Result<Table, Error> {
        glance(self)
    }
}
