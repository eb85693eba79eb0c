//! Filter expression compiler.
//!
//! Turns comparison strings such as `user.name == 'bob'` into the remote
//! store's nested JSON filter dialect:
//!
//! ```text
//! price > 10            =>  {"price":{"_gt":10}}
//! user.name == 'bob'    =>  {"user":{"name":{"_eq":"bob"}}}
//! ```
//!
//! Clauses on different top-level fields become sibling keys, which the
//! remote store combines with AND. A later clause on the same top-level
//! field replaces the earlier one.

mod lexer;
mod parser;

pub use lexer::CompareOp;
pub use parser::Comparison;

use crate::core::Result;
use log::warn;
use serde_json::{Map, Value};
use std::fmt;

/// Compiled filter object sent as the `filter` request parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    root: Map<String, Value>,
}

impl Filter {
    /// Compiles and merges every expression into one filter.
    pub fn compile<I, S>(expressions: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::default();
        for expression in expressions {
            filter.push(expression.as_ref())?;
        }
        Ok(filter)
    }

    /// Compiles one expression and folds it into this filter.
    pub fn push(&mut self, expression: &str) -> Result<()> {
        let comparison = parser::parse(expression)?;
        let (key, node) = fold(comparison);
        if self.root.insert(key.clone(), node).is_some() {
            warn!(
                "filter clause '{}' replaces an earlier clause on '{}'",
                expression, key
            );
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.root.get(field)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string(&self.root).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

/// Compiles a single expression.
pub fn compile(expression: &str) -> Result<Filter> {
    Filter::compile([expression])
}

/// Parses an expression without folding it.
pub fn parse(expression: &str) -> Result<Comparison> {
    parser::parse(expression)
}

// The deepest segment holds `{op: value}`; each shallower segment wraps it.
fn fold(comparison: Comparison) -> (String, Value) {
    let Comparison { path, op, value } = comparison;
    let mut node = Value::Object(Map::from_iter([(op.as_operator().to_string(), value)]));
    let mut segments = path.into_iter();
    let top = segments.next().unwrap_or_default();
    for segment in segments.rev() {
        node = Value::Object(Map::from_iter([(segment, node)]));
    }
    (top, node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;
    use serde_json::json;

    #[test]
    fn test_numeric_literal_is_unquoted() {
        let filter = compile("price > 10").unwrap();
        assert_eq!(filter.to_string(), r#"{"price":{"_gt":10}}"#);
    }

    #[test]
    fn test_nested_path_folds_right() {
        let filter = compile("user.name == 'bob'").unwrap();
        assert_eq!(filter.to_string(), r#"{"user":{"name":{"_eq":"bob"}}}"#);
    }

    #[test]
    fn test_all_operators() {
        let cases = [
            ("a == 1", "_eq"),
            ("a != 1", "_neq"),
            ("a < 1", "_lt"),
            ("a <= 1", "_lte"),
            ("a > 1", "_gt"),
            ("a >= 1", "_gte"),
        ];
        for (expression, operator) in cases {
            let filter = compile(expression).unwrap();
            assert_eq!(filter.into_value(), json!({"a": {operator: 1}}));
        }
    }

    #[test]
    fn test_distinct_top_level_paths_are_siblings() {
        let filter = Filter::compile(["price >= 2.5", "location.code == \"de\""]).unwrap();
        assert_eq!(
            filter.into_value(),
            json!({
                "price": {"_gte": 2.5},
                "location": {"code": {"_eq": "de"}}
            })
        );
    }

    #[test]
    fn test_same_top_level_path_last_clause_wins() {
        let filter = Filter::compile(["user.name == 'bob'", "user.age > 30"]).unwrap();
        assert_eq!(filter.len(), 1);
        assert_eq!(filter.into_value(), json!({"user": {"age": {"_gt": 30}}}));
    }

    #[test]
    fn test_empty_input_is_empty_filter() {
        let filter = Filter::compile(Vec::<String>::new()).unwrap();
        assert!(filter.is_empty());
        assert_eq!(filter.to_string(), "{}");
    }

    #[test]
    fn test_unsupported_operator_is_compile_error() {
        let err = compile("name =~ 'bo'").unwrap_err();
        assert!(matches!(err, Error::Compile { ref expression, .. } if expression == "name =~ 'bo'"));
    }

    #[test]
    fn test_one_bad_clause_fails_whole_filter() {
        assert!(Filter::compile(["price > 10", "name"]).is_err());
    }

    #[test]
    fn test_variable_is_encoded_as_string() {
        let filter = compile("date_created < $NOW(-1 day)").unwrap();
        assert_eq!(
            filter.into_value(),
            json!({"date_created": {"_lt": "$NOW(-1 day)"}})
        );
    }

    #[test]
    fn test_current_user_field_compiles() {
        let filter = compile("owner.id == $CURRENT_USER.id").unwrap();
        assert_eq!(
            filter.into_value(),
            json!({"owner": {"id": {"_eq": "$CURRENT_USER.id"}}})
        );
    }
}
