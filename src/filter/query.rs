use serde_json::{Map, Value};

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterOrderInfo, QueryOptions};
use crate::types::Document;

/// Read query handed to the store: conditions plus projection, sort and paging
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    conditions: Document,
    projection: Option<Vec<String>>,
    sort: Vec<FilterOrderInfo>,
    limit: Option<usize>,
    skip: Option<usize>,
    options: QueryOptions,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_conditions(conditions: Document) -> Result<Self, FilterError> {
        let mut query = Self::new();
        query.filter(conditions)?;
        Ok(query)
    }

    /// Replace the conditions document
    pub fn filter(&mut self, conditions: Document) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.conditions = conditions;
        Ok(self)
    }

    /// Add a condition on one field, keeping whatever is already there
    ///
    /// Operator objects merge; any other collision is combined under `$and`
    /// so both conditions must hold.
    pub fn where_field(&mut self, field: &str, condition: Value) -> &mut Self {
        let conflict = match self.conditions.get_mut(field) {
            None => {
                self.conditions.insert(field.to_string(), condition);
                return self;
            }
            Some(Value::Object(existing)) if is_operator_map(existing) => match condition {
                Value::Object(incoming) if is_operator_map(&incoming) => {
                    let mut leftover = Map::new();
                    for (op, value) in incoming {
                        match existing.get(&op) {
                            Some(previous) if previous != &value => {
                                leftover.insert(op, value);
                            }
                            _ => {
                                existing.insert(op, value);
                            }
                        }
                    }
                    if leftover.is_empty() {
                        return self;
                    }
                    Value::Object(leftover)
                }
                other => other,
            },
            Some(_) => condition,
        };
        self.push_and(field, conflict);
        self
    }

    fn push_and(&mut self, field: &str, condition: Value) {
        let clause = Value::Object(Map::from_iter([(field.to_string(), condition)]));
        match self.conditions.get_mut("$and") {
            Some(Value::Array(clauses)) => clauses.push(clause),
            _ => {
                self.conditions.insert("$and".to_string(), Value::Array(vec![clause]));
            }
        }
    }

    pub fn select<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn sort(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        self.sort = FilterOrder::validate_and_parse(&order_spec)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: usize) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(&mut self, skip: usize) -> &mut Self {
        self.skip = Some(skip);
        self
    }

    pub fn options(&mut self, options: QueryOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub fn conditions(&self) -> &Document {
        &self.conditions
    }

    pub fn projection(&self) -> Option<&[String]> {
        self.projection.as_deref()
    }

    pub fn sort_order(&self) -> &[FilterOrderInfo] {
        &self.sort
    }

    pub fn limit_value(&self) -> Option<usize> {
        self.limit
    }

    pub fn skip_value(&self) -> Option<usize> {
        self.skip
    }

    pub fn query_options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn matches(&self, document: &Document) -> Result<bool, FilterError> {
        FilterWhere::matches(&self.conditions, document)
    }

    /// Apply the projection; `_id` is always kept
    pub fn project(&self, document: Document) -> Document {
        match &self.projection {
            None => document,
            Some(fields) => document
                .into_iter()
                .filter(|(k, _)| k == "_id" || fields.iter().any(|f| f == k))
                .collect(),
        }
    }
}

fn is_operator_map(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().all(|k| k.starts_with('$'))
}
