//! Params module - bind value conversion and batch parameter sets

use rusqlite::ToSql;
use serde_json::Value;

use crate::error::{Error, Result};

/// One element of a batch: either a full bind sequence or a lone scalar.
///
/// A scalar binds as a one-element sequence, a sequence binds unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterSet {
    Scalar(Value),
    Sequence(Vec<Value>),
}

impl ParameterSet {
    /// Bind values for one execution
    pub fn into_values(self) -> Vec<Value> {
        match self {
            ParameterSet::Scalar(v) => vec![v],
            ParameterSet::Sequence(values) => values,
        }
    }
}

impl From<Value> for ParameterSet {
    fn from(v: Value) -> Self {
        match v {
            Value::Array(values) => ParameterSet::Sequence(values),
            other => ParameterSet::Scalar(other),
        }
    }
}

impl From<Vec<Value>> for ParameterSet {
    fn from(values: Vec<Value>) -> Self {
        ParameterSet::Sequence(values)
    }
}

/// Convert JSON parameters to SQLite parameters
///
/// # Arguments
/// * `params` - Slice of JSON values representing the positional parameters
///
/// # Returns
/// Vector of boxed traits that implement ToSql
pub fn convert_params(params: &[Value]) -> Result<Vec<Box<dyn ToSql + Send>>> {
    params.iter().map(convert_single_param).collect()
}

/// Convert a single JSON value to a SQLite parameter
///
/// Arrays and objects have no SQLite counterpart and bind as their JSON text.
/// Integers above `i64::MAX` are rejected rather than rounded to a float.
pub fn convert_single_param(v: &Value) -> Result<Box<dyn ToSql + Send>> {
    Ok(match v {
        Value::Null => Box::new(rusqlite::types::Null) as Box<dyn ToSql + Send>,
        Value::Bool(b) => Box::new(*b) as Box<dyn ToSql + Send>,
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Box::new(i) as Box<dyn ToSql + Send>
            } else if n.is_u64() {
                return Err(Error::InvalidParameter(format!(
                    "integer {} does not fit in a signed 64-bit value",
                    n
                )));
            } else {
                Box::new(n.as_f64().unwrap_or(0.0)) as Box<dyn ToSql + Send>
            }
        }
        Value::String(s) => Box::new(s.clone()) as Box<dyn ToSql + Send>,
        Value::Array(_) | Value::Object(_) => Box::new(v.to_string()) as Box<dyn ToSql + Send>,
    })
}
