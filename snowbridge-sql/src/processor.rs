use itertools::Itertools;
use snowbridge_core::{
    data::DataValue,
    err::{bail, ensure, Result},
};

use crate::{ParameterizedQuery, Row, RowShape, RowStructure};

/// A statement ready to be handed to the driver
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    /// The sql with `?` placeholders for each parameter
    pub sql: String,
    /// The positional parameter values
    pub params: Vec<DataValue>,
}

/// Converts a parameterized query into driver sql and parameters
pub trait StatementParameterProcessor: Send + Sync {
    fn bind(&self, query: &ParameterizedQuery) -> Result<BoundStatement>;
}

/// Converts driver rows into the requested row shape
pub trait ResultParameterProcessor: Send + Sync {
    fn create_row(
        &self,
        structure: &RowStructure,
        values: Vec<DataValue>,
        shape: &RowShape,
    ) -> Result<Row>;
}

/// Binds every insertion as a positional `?` parameter
#[derive(Debug, Default)]
pub struct DefaultStatementParameterProcessor;

static DEFAULT_STATEMENT_PROCESSOR: DefaultStatementParameterProcessor =
    DefaultStatementParameterProcessor;

impl DefaultStatementParameterProcessor {
    pub fn instance() -> &'static Self {
        &DEFAULT_STATEMENT_PROCESSOR
    }
}

impl StatementParameterProcessor for DefaultStatementParameterProcessor {
    fn bind(&self, query: &ParameterizedQuery) -> Result<BoundStatement> {
        ensure!(
            query.strings.len() == query.insertions.len() + 1,
            "Malformed parameterized query: expected {} sql fragments for {} parameters, found {}",
            query.insertions.len() + 1,
            query.insertions.len(),
            query.strings.len()
        );

        Ok(BoundStatement {
            sql: query.strings.iter().join("?"),
            params: query.insertions.clone(),
        })
    }
}

/// Maps columns onto record fields by case-insensitive name
#[derive(Debug, Default)]
pub struct DefaultResultParameterProcessor;

static DEFAULT_RESULT_PROCESSOR: DefaultResultParameterProcessor = DefaultResultParameterProcessor;

impl DefaultResultParameterProcessor {
    pub fn instance() -> &'static Self {
        &DEFAULT_RESULT_PROCESSOR
    }
}

impl ResultParameterProcessor for DefaultResultParameterProcessor {
    fn create_row(
        &self,
        structure: &RowStructure,
        values: Vec<DataValue>,
        shape: &RowShape,
    ) -> Result<Row> {
        ensure!(
            structure.cols.len() == values.len(),
            "Driver returned {} values for a row of {} columns",
            values.len(),
            structure.cols.len()
        );

        let fields = match shape {
            RowShape::Open => {
                return Ok(Row::new(
                    structure
                        .cols
                        .iter()
                        .map(|(name, _)| name.clone())
                        .zip(values)
                        .collect(),
                ))
            }
            RowShape::Record(fields) => fields,
        };

        let mut values = values.into_iter().map(Some).collect::<Vec<_>>();
        let mut cols = Vec::with_capacity(fields.len());

        for (field, r#type) in fields {
            let idx = match structure
                .cols
                .iter()
                .position(|(col, _)| col.eq_ignore_ascii_case(field))
            {
                Some(idx) => idx,
                None => bail!("No column found for the record field '{}'", field),
            };

            let value = match values[idx].take() {
                Some(v) => v,
                None => bail!("Record field '{}' maps to a column more than once", field),
            };

            if !value.r#type().is_assignable_to(r#type) {
                bail!(
                    "Column '{}' of type {:?} cannot be assigned to the record field '{}' of type {:?}",
                    structure.cols[idx].0,
                    value.r#type(),
                    field,
                    r#type
                );
            }

            cols.push((field.clone(), value.coerce_into(r#type)));
        }

        Ok(Row::new(cols))
    }
}
