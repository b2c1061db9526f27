use std::cmp::Ordering;

use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection};
use crate::types::Document;

pub struct FilterOrder;

impl FilterOrder {
    /// Accepts `"name -createdAt"`, `["name asc", "createdAt desc"]`, or `{ "name": 1, "createdAt": -1 }`
    pub fn validate_and_parse(order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        match order {
            Value::Null => Ok(vec![]),
            Value::String(s) => Self::parse_order_string(s),
            Value::Array(arr) => {
                let mut out = Vec::new();
                for v in arr {
                    match v {
                        Value::String(s) => out.extend(Self::parse_order_string(s)?),
                        other => return Err(FilterError::InvalidSort(format!("expected string, got {}", other))),
                    }
                }
                Ok(out)
            }
            Value::Object(obj) => {
                let mut out = Vec::new();
                for (k, v) in obj {
                    let sort = match v {
                        Value::Number(n) if n.as_i64() == Some(-1) => SortDirection::Desc,
                        Value::Number(n) if n.as_i64() == Some(1) => SortDirection::Asc,
                        Value::String(s) if s.eq_ignore_ascii_case("desc") => SortDirection::Desc,
                        Value::String(s) if s.eq_ignore_ascii_case("asc") => SortDirection::Asc,
                        other => return Err(FilterError::InvalidSort(format!("invalid direction for '{}': {}", k, other))),
                    };
                    out.push(FilterOrderInfo { field: k.clone(), sort });
                }
                Ok(out)
            }
            other => Err(FilterError::InvalidSort(format!("unsupported sort value: {}", other))),
        }
    }

    fn parse_order_string(s: &str) -> Result<Vec<FilterOrderInfo>, FilterError> {
        // split on commas, then each token into field and direction
        let mut out = Vec::new();
        for part in s.split(',') {
            let mut it = part.split_whitespace().peekable();
            while let Some(token) = it.next() {
                let (field, mut sort) = match token.strip_prefix('-') {
                    Some(rest) => (rest, SortDirection::Desc),
                    None => (token, SortDirection::Asc),
                };
                if field.is_empty() {
                    return Err(FilterError::InvalidSort(format!("empty field in '{}'", s)));
                }
                if let Some(dir) = it.peek() {
                    if dir.eq_ignore_ascii_case("desc") {
                        sort = SortDirection::Desc;
                        it.next();
                    } else if dir.eq_ignore_ascii_case("asc") {
                        it.next();
                    }
                }
                out.push(FilterOrderInfo { field: field.to_string(), sort });
            }
        }
        Ok(out)
    }

    /// Compare two documents by the parsed sort keys; missing values sort first
    pub fn compare(infos: &[FilterOrderInfo], a: &Document, b: &Document) -> Ordering {
        for info in infos {
            let ordering = Self::compare_values(a.get(&info.field), b.get(&info.field));
            let ordering = match info.sort {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(Value::Number(x)), Some(Value::Number(y))) => x
                .as_f64()
                .zip(y.as_f64())
                .and_then(|(x, y)| x.partial_cmp(&y))
                .unwrap_or(Ordering::Equal),
            (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
            (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
            _ => Ordering::Equal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_shapes() {
        let from_str = FilterOrder::validate_and_parse(&json!("name -createdAt")).unwrap();
        let from_arr = FilterOrder::validate_and_parse(&json!(["name asc", "createdAt desc"])).unwrap();
        let from_obj = FilterOrder::validate_and_parse(&json!({ "name": 1, "createdAt": -1 })).unwrap();
        assert_eq!(from_str, from_arr);
        assert_eq!(from_str, from_obj);
        assert_eq!(from_str[1].sort, SortDirection::Desc);
    }

    #[test]
    fn test_invalid_direction() {
        assert!(FilterOrder::validate_and_parse(&json!({ "name": 2 })).is_err());
        assert!(FilterOrder::validate_and_parse(&json!(5)).is_err());
    }

    #[test]
    fn test_compare() {
        let order = FilterOrder::validate_and_parse(&json!("-n")).unwrap();
        let a = json!({ "n": 1 }).as_object().cloned().unwrap();
        let b = json!({ "n": 2 }).as_object().cloned().unwrap();
        assert_eq!(FilterOrder::compare(&order, &a, &b), Ordering::Greater);
    }
}
