use tracing::debug;

use crate::{Error, Table, Values};

pub const ROWNAMES: &str = ".rownames";

/// The original observations of a model, optionally with row labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Data {
    table: Table,
    rownames: Option<Vec<String>>,
}

impl Data {
    pub fn new(table: Table) -> Self {
        Data {
            table,
            rownames: None,
        }
    }

    pub fn with_rownames(table: Table, rownames: Vec<impl ToString>) -> Result<Self, Error> {
        if table.ncols() > 0 && rownames.len() != table.nrows() {
            return Err(Error::DimensionMismatch {
                expected: table.nrows(),
                found: rownames.len(),
            });
        }
        Ok(Data {
            table,
            rownames: Some(rownames.iter().map(|r| r.to_string()).collect()),
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn rownames(&self) -> Option<&[String]> {
        self.rownames.as_deref()
    }

    pub fn nrows(&self) -> usize {
        self.table.nrows()
    }

    /// Data with no columns carries no observations worth augmenting.
    pub fn is_empty(&self) -> bool {
        self.table.ncols() == 0
    }

    /// Row labels are trivial when absent or when each is just its 1-based position.
    pub fn has_trivial_rownames(&self) -> bool {
        match &self.rownames {
            None => true,
            Some(r) => r
                .iter()
                .enumerate()
                .all(|(i, name)| name.parse::<usize>().ok() == Some(i + 1)),
        }
    }

    /// A fresh table of the observations, with non-trivial row labels moved into a
    /// leading `.rownames` column.
    ///
    /// Fails with [`Error::DuplicateColumnName`] if the table already has a `.rownames`
    /// column and the labels are non-trivial.
    pub fn normalize(&self) -> Result<Table, Error> {
        let mut table = self.table.clone();
        if let (false, Some(rownames)) = (self.has_trivial_rownames(), &self.rownames) {
            debug!("Moving row names into {}", ROWNAMES);
            table.insert_column(0, ROWNAMES, Values::Str(rownames.clone()))?;
        }
        Ok(table)
    }
}

impl From<Table> for Data {
    fn from(table: Table) -> Self {
        Data::new(table)
    }
}
