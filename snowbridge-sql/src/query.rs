use snowbridge_core::data::{DataType, DataValue};

/// A query template with its interpolated parameters.
///
/// The template is held as the literal fragments surrounding each
/// insertion, so a query with `n` parameters has `n + 1` fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterizedQuery {
    /// The literal sql fragments
    pub strings: Vec<String>,
    /// The values interpolated between the fragments
    pub insertions: Vec<DataValue>,
}

impl ParameterizedQuery {
    pub fn new(strings: Vec<impl Into<String>>, insertions: Vec<DataValue>) -> Self {
        Self {
            strings: strings.into_iter().map(Into::into).collect(),
            insertions,
        }
    }
}

impl From<&str> for ParameterizedQuery {
    fn from(sql: &str) -> Self {
        Self::new(vec![sql], vec![])
    }
}

/// The structure of a row
#[derive(Debug, Clone, PartialEq)]
pub struct RowStructure {
    /// The list of named columns in the row with their corrosponding data types
    pub cols: Vec<(String, DataType)>,
}

impl RowStructure {
    pub fn new(cols: Vec<(String, DataType)>) -> Self {
        Self { cols }
    }

    pub fn types(&self) -> Vec<DataType> {
        self.cols.iter().map(|i| i.1).collect()
    }
}

/// The shape rows should be returned in
#[derive(Debug, Clone, PartialEq)]
pub enum RowShape {
    /// Every column returned by the query, as-is
    Open,
    /// A fixed set of typed fields, looked up by column name
    Record(Vec<(String, DataType)>),
}

impl RowShape {
    pub fn record(fields: Vec<(impl Into<String>, DataType)>) -> Self {
        Self::Record(fields.into_iter().map(|(n, t)| (n.into(), t)).collect())
    }
}

/// A row returned from a query
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cols: Vec<(String, DataValue)>,
}

impl Row {
    pub fn new(cols: Vec<(String, DataValue)>) -> Self {
        Self { cols }
    }

    /// Gets the value of the supplied field
    pub fn get(&self, name: &str) -> Option<&DataValue> {
        self.cols.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cols.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &DataValue> {
        self.cols.iter().map(|(_, v)| v)
    }

    pub fn into_inner(self) -> Vec<(String, DataValue)> {
        self.cols
    }
}

/// The outcome of a modifying statement
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecutionResult {
    /// Number of rows affected by the statement, if reported by the driver
    pub affected_row_count: Option<u64>,
    /// The key generated by the statement, only retrieved when the
    /// client requests generated keys
    pub last_insert_id: Option<DataValue>,
}
