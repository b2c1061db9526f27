use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::error::FilterError;
use super::types::{FilterOp, FilterWhereInfo};
use crate::types::Document;

/// Evaluates Mongo-style condition documents against stored documents
pub struct FilterWhere {
    conditions: Vec<FilterWhereInfo>,
    logical: Vec<(String, Value)>,
}

impl FilterWhere {
    pub fn new() -> Self {
        Self {
            conditions: vec![],
            logical: vec![],
        }
    }

    /// Check whether `document` satisfies `where_data`
    pub fn matches(where_data: &Document, document: &Document) -> Result<bool, FilterError> {
        let mut filter_where = Self::new();
        filter_where.parse_where_data(where_data)?;
        filter_where.evaluate(document)
    }

    /// Validate a condition document without evaluating it
    pub fn validate(where_data: &Document) -> Result<(), FilterError> {
        let mut filter_where = Self::new();
        filter_where.parse_where_data(where_data)?;
        for (op, value) in &filter_where.logical {
            for branch in Self::branches(op, value)? {
                Self::validate(branch)?;
            }
        }
        Ok(())
    }

    fn parse_where_data(&mut self, where_data: &Document) -> Result<(), FilterError> {
        for (key, value) in where_data {
            if key.starts_with('$') {
                self.parse_logical_operator(key, value)?;
            } else {
                self.parse_field_condition(key, value)?;
            }
        }
        Ok(())
    }

    fn parse_logical_operator(&mut self, op: &str, value: &Value) -> Result<(), FilterError> {
        match op {
            "$and" | "$or" | "$nor" => {
                if !value.is_array() {
                    return Err(FilterError::InvalidOperatorData(format!("{} requires array", op)));
                }
                self.logical.push((op.to_string(), value.clone()));
                Ok(())
            }
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field_condition(&mut self, field: &str, value: &Value) -> Result<(), FilterError> {
        if field.is_empty() {
            return Err(FilterError::InvalidField("Field name cannot be empty".to_string()));
        }
        match value {
            Value::Object(obj) if Self::is_operator_object(obj) => {
                for (op_key, op_val) in obj {
                    let operator = Self::map_operator(op_key)?;
                    self.conditions.push(FilterWhereInfo {
                        field: field.to_string(),
                        operator,
                        data: op_val.clone(),
                    });
                }
            }
            // Implicit equality: { field: value }
            _ => self.conditions.push(FilterWhereInfo {
                field: field.to_string(),
                operator: FilterOp::Eq,
                data: value.clone(),
            }),
        }
        Ok(())
    }

    fn is_operator_object(obj: &Map<String, Value>) -> bool {
        !obj.is_empty() && obj.keys().all(|k| k.starts_with('$'))
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NIn,
            "$exists" => FilterOp::Exists,
            "$not" => FilterOp::Not,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn branches<'a>(op: &str, value: &'a Value) -> Result<Vec<&'a Document>, FilterError> {
        let arr = value
            .as_array()
            .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
        arr.iter()
            .map(|v| {
                v.as_object().ok_or_else(|| {
                    FilterError::InvalidOperatorData(format!("{} entries must be objects", op))
                })
            })
            .collect()
    }

    fn evaluate(&self, document: &Document) -> Result<bool, FilterError> {
        for condition in &self.conditions {
            let actual = Self::lookup(document, &condition.field);
            if !Self::check(condition.operator, actual, &condition.data)? {
                return Ok(false);
            }
        }

        for (op, value) in &self.logical {
            let mut results = Vec::new();
            for branch in Self::branches(op, value)? {
                results.push(Self::matches(branch, document)?);
            }
            let passed = match op.as_str() {
                "$and" => results.iter().all(|r| *r),
                "$or" => results.iter().any(|r| *r),
                _ => !results.iter().any(|r| *r),
            };
            if !passed {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Resolve a dotted path; None when any segment is missing
    fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
        let mut segments = path.split('.');
        let mut current = document.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    fn check(operator: FilterOp, actual: Option<&Value>, data: &Value) -> Result<bool, FilterError> {
        Ok(match operator {
            FilterOp::Eq => Self::equals(actual, data),
            FilterOp::Ne => !Self::equals(actual, data),
            FilterOp::Gt => Self::compare(actual, data) == Some(Ordering::Greater),
            FilterOp::Gte => matches!(Self::compare(actual, data), Some(Ordering::Greater | Ordering::Equal)),
            FilterOp::Lt => Self::compare(actual, data) == Some(Ordering::Less),
            FilterOp::Lte => matches!(Self::compare(actual, data), Some(Ordering::Less | Ordering::Equal)),
            FilterOp::In => {
                let values = data.as_array().ok_or_else(|| {
                    FilterError::InvalidOperatorData("$in requires array".to_string())
                })?;
                values.iter().any(|v| Self::equals(actual, v))
            }
            FilterOp::NIn => {
                let values = data.as_array().ok_or_else(|| {
                    FilterError::InvalidOperatorData("$nin requires array".to_string())
                })?;
                !values.iter().any(|v| Self::equals(actual, v))
            }
            FilterOp::Exists => {
                let wanted = data.as_bool().ok_or_else(|| {
                    FilterError::InvalidOperatorData("$exists requires boolean".to_string())
                })?;
                actual.is_some() == wanted
            }
            FilterOp::Not => {
                let inner = data.as_object().ok_or_else(|| {
                    FilterError::InvalidOperatorData("$not requires operator object".to_string())
                })?;
                let mut all = true;
                for (op_key, op_val) in inner {
                    all &= Self::check(Self::map_operator(op_key)?, actual, op_val)?;
                }
                !all
            }
        })
    }

    /// Missing fields equal null; arrays match when any element matches
    fn equals(actual: Option<&Value>, expected: &Value) -> bool {
        match actual {
            None => expected.is_null(),
            Some(Value::Array(items)) if !expected.is_array() => items.iter().any(|i| i == expected),
            Some(value) => value == expected,
        }
    }

    fn compare(actual: Option<&Value>, expected: &Value) -> Option<Ordering> {
        match (actual?, expected) {
            (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl Default for FilterWhere {
    fn default() -> Self {
        Self::new()
    }
}
