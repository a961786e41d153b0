use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Error;

/// The values of a single column. Every variant holds one entry per row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum Values {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
}

impl PartialEq for Values {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // bitwise so NaN == NaN, tables compare equal when they were built the same way
            (Values::Float(a), Values::Float(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.to_bits() == b.to_bits())
            },
            (Values::Int(a), Values::Int(b)) => a == b,
            (Values::Bool(a), Values::Bool(b)) => a == b,
            (Values::Str(a), Values::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Values {
    pub fn len(&self) -> usize {
        match self {
            Values::Float(v) => v.len(),
            Values::Int(v) => v.len(),
            Values::Bool(v) => v.len(),
            Values::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Values::Float(_) => "float",
            Values::Int(_) => "int",
            Values::Bool(_) => "bool",
            Values::Str(_) => "str",
        }
    }

    pub fn get(&self, i: usize) -> Option<Value<'_>> {
        match self {
            Values::Float(v) => v.get(i).copied().map(Value::Float),
            Values::Int(v) => v.get(i).copied().map(Value::Int),
            Values::Bool(v) => v.get(i).copied().map(Value::Bool),
            Values::Str(v) => v.get(i).map(|s| Value::Str(s.as_str())),
        }
    }

    /// Append `other` to the end of `self`, returning `false` if the variants differ.
    fn extend_from(&mut self, other: &Values) -> bool {
        match (self, other) {
            (Values::Float(a), Values::Float(b)) => a.extend_from_slice(b),
            (Values::Int(a), Values::Int(b)) => a.extend_from_slice(b),
            (Values::Bool(a), Values::Bool(b)) => a.extend_from_slice(b),
            (Values::Str(a), Values::Str(b)) => a.extend_from_slice(b),
            _ => return false,
        }
        true
    }

    fn same_type(&self, other: &Values) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl From<Vec<f64>> for Values {
    fn from(v: Vec<f64>) -> Self {
        Values::Float(v)
    }
}

impl From<Vec<i64>> for Values {
    fn from(v: Vec<i64>) -> Self {
        Values::Int(v)
    }
}

impl From<Vec<bool>> for Values {
    fn from(v: Vec<bool>) -> Self {
        Values::Bool(v)
    }
}

impl From<Vec<String>> for Values {
    fn from(v: Vec<String>) -> Self {
        Values::Str(v)
    }
}

impl From<Vec<&str>> for Values {
    fn from(v: Vec<&str>) -> Self {
        Values::Str(v.into_iter().map(|s| s.to_string()).collect())
    }
}

/// A single cell of a [`Table`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Float(f64),
    Int(i64),
    Bool(bool),
    Str(&'a str),
}

impl fmt::Display for Value<'_> {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(x) if x.is_nan() => write!(f, "NA"),
            Value::Float(x) => {
                if x.abs() >= 1e-4 && x.abs() < 1e6 || *x == 0.0 {
                    write!(f, "{:.4}", x)
                } else {
                    write!(f, "{:.4e}", x)
                }
            },
            Value::Int(x) => write!(f, "{}", x),
            Value::Bool(x) => write!(f, "{}", if *x { "TRUE" } else { "FALSE" }),
            Value::Str(x) => write!(f, "{}", x),
        }
    }
}

impl From<Value<'_>> for serde_json::Value {
    fn from(v: Value<'_>) -> Self {
        match v {
            // non-finite floats have no JSON representation
            Value::Float(x) => serde_json::Number::from_f64(x)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Int(x) => serde_json::Value::from(x),
            Value::Bool(x) => serde_json::Value::Bool(x),
            Value::Str(x) => serde_json::Value::String(x.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    values: Values,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &Values {
        &self.values
    }
}

/// An ordered set of named columns of equal length.
///
/// A table never carries row labels. Anything identifying a row is an ordinary
/// column such as `term` or `.rownames`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    nrows: usize,
    columns: Vec<Column>,
}

/// Wire form of a [`Table`], rebuilt column by column so deserialized tables get the
/// same checks as ones built in code.
#[derive(Deserialize)]
struct RawTable {
    #[serde(default)]
    nrows: Option<usize>,
    columns: Vec<Column>,
}

impl TryFrom<RawTable> for Table {
    type Error = Error;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        let table = Self::from_columns(raw.columns.into_iter().map(|c| (c.name, c.values)))?;
        match raw.nrows {
            Some(nrows) if nrows != table.nrows => Err(Error::DimensionMismatch {
                expected: nrows,
                found: table.nrows,
            }),
            _ => Ok(table),
        }
    }
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(name, values)` pairs, checking lengths and names.
    pub fn from_columns<N, V>(columns: impl IntoIterator<Item = (N, V)>) -> Result<Self, Error>
    where
        N: ToString,
        V: Into<Values>,
    {
        let mut table = Self::new();
        for (name, values) in columns {
            table.push_column(name, values)?;
        }
        Ok(table)
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn colnames(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Result<&Values, Error> {
        self.position(name)
            .map(|i| &self.columns[i].values)
            .ok_or_else(|| Error::ColumnNameNotFound(name.to_string()))
    }

    pub fn floats(&self, name: &str) -> Result<&[f64], Error> {
        match self.column(name)? {
            Values::Float(v) => Ok(v),
            _ => Err(Error::ColumnTypeMismatch(name.to_string())),
        }
    }

    pub fn ints(&self, name: &str) -> Result<&[i64], Error> {
        match self.column(name)? {
            Values::Int(v) => Ok(v),
            _ => Err(Error::ColumnTypeMismatch(name.to_string())),
        }
    }

    pub fn bools(&self, name: &str) -> Result<&[bool], Error> {
        match self.column(name)? {
            Values::Bool(v) => Ok(v),
            _ => Err(Error::ColumnTypeMismatch(name.to_string())),
        }
    }

    pub fn strs(&self, name: &str) -> Result<&[String], Error> {
        match self.column(name)? {
            Values::Str(v) => Ok(v),
            _ => Err(Error::ColumnTypeMismatch(name.to_string())),
        }
    }

    /// Get a single cell.
    pub fn get(&self, row: usize, name: &str) -> Result<Option<Value<'_>>, Error> {
        Ok(self.column(name)?.get(row))
    }

    pub fn push_column(
        &mut self,
        name: impl ToString,
        values: impl Into<Values>,
    ) -> Result<&mut Self, Error> {
        let at = self.ncols();
        self.insert_column(at, name, values)
    }

    /// Insert a column at `index`. The first column added to an empty table sets the row count.
    pub fn insert_column(
        &mut self,
        index: usize,
        name: impl ToString,
        values: impl Into<Values>,
    ) -> Result<&mut Self, Error> {
        let name = name.to_string();
        let values = values.into();
        if self.has_column(&name) {
            return Err(Error::DuplicateColumnName(name));
        }
        if self.columns.is_empty() {
            self.nrows = values.len();
        } else if values.len() != self.nrows {
            return Err(Error::DimensionMismatch {
                expected: self.nrows,
                found: values.len(),
            });
        }
        self.columns
            .insert(index.min(self.columns.len()), Column { name, values });
        Ok(self)
    }

    /// Replace the column called `name` in place, or append it if it does not exist.
    pub fn set_column(
        &mut self,
        name: impl ToString,
        values: impl Into<Values>,
    ) -> Result<&mut Self, Error> {
        let name = name.to_string();
        let values = values.into();
        match self.position(&name) {
            Some(i) => {
                if values.len() != self.nrows {
                    return Err(Error::DimensionMismatch {
                        expected: self.nrows,
                        found: values.len(),
                    });
                }
                self.columns[i].values = values;
                Ok(self)
            },
            None => self.push_column(name, values),
        }
    }

    pub fn remove_column(&mut self, name: &str) -> Result<Values, Error> {
        let i = self
            .position(name)
            .ok_or_else(|| Error::ColumnNameNotFound(name.to_string()))?;
        let column = self.columns.remove(i);
        if self.columns.is_empty() {
            self.nrows = 0;
        }
        Ok(column.values)
    }

    pub fn rename_column(&mut self, old: &str, new: &str) -> Result<&mut Self, Error> {
        if old == new {
            self.column(old)?;
            return Ok(self);
        }
        if self.has_column(new) {
            return Err(Error::DuplicateColumnName(new.to_string()));
        }
        let i = self
            .position(old)
            .ok_or_else(|| Error::ColumnNameNotFound(old.to_string()))?;
        self.columns[i].name = new.to_string();
        Ok(self)
    }

    /// Append the rows of `others` below this table. All tables must have the same
    /// column names, in the same order, with the same column types.
    pub fn combine_rows(&mut self, others: &[Table]) -> Result<&mut Self, Error> {
        for other in others {
            if other.colnames() != self.colnames() {
                return Err(Error::ColumnNamesMismatch);
            }
            if let Some(c) = self
                .columns
                .iter()
                .zip(other.columns.iter())
                .find(|(a, b)| !a.values.same_type(&b.values))
            {
                return Err(Error::ColumnTypeMismatch(c.0.name.clone()));
            }
        }
        for other in others {
            for (a, b) in self.columns.iter_mut().zip(other.columns.iter()) {
                a.values.extend_from(&b.values);
            }
            self.nrows += other.nrows;
        }
        Ok(self)
    }

    pub fn row(&self, i: usize) -> Option<Vec<Value<'_>>> {
        if i >= self.nrows {
            return None;
        }
        self.columns.iter().map(|c| c.values.get(i)).collect()
    }

    /// Serialize as an array of row records, `[{"term": "a", "estimate": 1.0}, ...]`.
    /// Non-finite floats become `null`.
    pub fn to_json(&self) -> Result<String, Error> {
        let records = (0..self.nrows)
            .map(|i| {
                self.columns
                    .iter()
                    .map(|c| {
                        let v = c
                            .values
                            .get(i)
                            .map(serde_json::Value::from)
                            .unwrap_or(serde_json::Value::Null);
                        (c.name.clone(), v)
                    })
                    .collect::<serde_json::Map<_, _>>()
            })
            .collect::<Vec<_>>();
        Ok(serde_json::to_string(&records)?)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Convert into an R tibble (a `data.frame` with class `tbl_df`).
    #[cfg(feature = "r")]
    pub fn into_robj(self) -> Result<extendr_api::Robj, Error> {
        use extendr_api::prelude::*;

        let row_names = r_row_names(self.nrows)?;
        let (names, values): (Vec<_>, Vec<_>) = self
            .columns
            .into_iter()
            .map(|c| {
                let values = match c.values {
                    Values::Float(v) => Robj::from(v),
                    // R integers are 32 bit
                    Values::Int(v) => Robj::from(v.into_iter().map(|x| x as f64).collect::<Vec<_>>()),
                    Values::Bool(v) => Robj::from(v),
                    Values::Str(v) => Robj::from(v),
                };
                (c.name, values)
            })
            .unzip();
        let mut robj: Robj = List::from_names_and_values(names, values)?.into();
        robj.set_class(["tbl_df", "tbl", "data.frame"])?;
        robj.set_attrib("row.names", row_names)?;
        Ok(robj)
    }
}

/// The `row.names` attribute of an R data frame with `nrows` rows, `1..=nrows`.
/// R indexes rows with 32 bit integers.
#[cfg_attr(not(feature = "r"), allow(dead_code))]
fn r_row_names(nrows: usize) -> Result<Vec<i32>, Error> {
    let n = i32::try_from(nrows)
        .map_err(|_| Error::R(format!("{nrows} rows do not fit in an R data frame")))?;
    Ok((1..=n).collect())
}

impl fmt::Display for Table {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# A tibble: {} x {}", self.nrows, self.ncols())?;
        let cells = self
            .columns
            .iter()
            .map(|c| {
                (0..self.nrows)
                    .map(|i| c.values.get(i).map(|v| v.to_string()).unwrap_or_default())
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        let widths = self
            .columns
            .iter()
            .zip(cells.iter())
            .map(|(c, cells)| {
                cells
                    .iter()
                    .map(|s| s.len())
                    .chain(std::iter::once(c.name.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect::<Vec<_>>();
        let header = self
            .columns
            .iter()
            .zip(widths.iter())
            .map(|(c, w)| format!("{:>w$}", c.name, w = *w))
            .collect::<Vec<_>>();
        writeln!(f, "{}", header.join(" "))?;
        for i in 0..self.nrows {
            let row = cells
                .iter()
                .zip(widths.iter())
                .map(|(c, w)| format!("{:>w$}", c[i], w = *w))
                .collect::<Vec<_>>();
            writeln!(f, "{}", row.join(" "))?;
        }
        Ok(())
    }
}
