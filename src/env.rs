use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Table, Values};

/// The variable bindings a model was fit in, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    vars: Vec<(String, Values)>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing any existing binding in place.
    pub fn insert(&mut self, name: impl ToString, values: impl Into<Values>) -> &mut Self {
        let name = name.to_string();
        let values = values.into();
        match self.vars.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = values,
            None => self.vars.push((name, values)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Values> {
        self.vars.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Values)> {
        self.vars.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Rebuild the observations from the bindings.
    ///
    /// Parameters are skipped, as is anything whose length is not `nobs` (constants and
    /// other scalars the model formula referenced). This cannot recover variables the
    /// fitting environment never held, so callers should pass their data explicitly.
    pub fn reconstruct(&self, parameters: &[String], nobs: usize) -> Result<Table, Error> {
        warn!("No data supplied, reconstructing observations from the fit environment");
        let mut table = Table::new();
        for (name, values) in self.iter() {
            if parameters.iter().any(|p| p == name) {
                continue;
            }
            if values.len() != nobs {
                debug!(
                    "Skipping {} with length {} (expected {})",
                    name,
                    values.len(),
                    nobs
                );
                continue;
            }
            table.push_column(name, values.clone())?;
        }
        if table.ncols() == 0 {
            return Err(Error::DataReconstruction);
        }
        Ok(table)
    }
}

impl<N: ToString, V: Into<Values>> FromIterator<(N, V)> for Environment {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut env = Environment::new();
        for (n, v) in iter {
            env.insert(n, v);
        }
        env
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn env() -> Environment {
        [
            ("x", Values::from(vec![1.0, 2.0, 3.0])),
            ("a", Values::from(vec![0.5])),
            ("y", Values::from(vec![2.0, 4.0, 6.0])),
            ("offset", Values::from(vec![10.0])),
            ("group", Values::from(vec!["a", "b", "a"])),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut env = env();
        env.insert("x", vec![9.0]);
        assert_eq!(env.names().collect::<Vec<_>>(), vec!["x", "a", "y", "offset", "group"]);
        assert_eq!(env.get("x"), Some(&Values::Float(vec![9.0])));
    }

    #[test]
    fn test_reconstruct_skips_parameters_and_scalars() {
        let t = env().reconstruct(&["a".to_string()], 3).unwrap();
        assert_eq!(t.colnames(), vec!["x", "y", "group"]);
        assert_eq!(t.nrows(), 3);
    }

    #[test]
    fn test_reconstruct_nothing_usable() {
        let env: Environment = [("a", vec![0.5])].into_iter().collect();
        let err = env.reconstruct(&["a".to_string()], 3).unwrap_err();
        assert!(matches!(err, Error::DataReconstruction));
        assert!(matches!(
            Environment::new().reconstruct(&[], 3).unwrap_err(),
            Error::DataReconstruction
        ));
    }
}
