//! Result filtering
//!
//! Two ways to select records:
//! - [`filter_by`]: exact equality on parallel key/value lists
//! - [`QueryEngine::parse_filter`]: a SQL `WHERE` expression compiled into a
//!   [`Predicate`]
//!
//! ## Supported `WHERE` subset
//!
//! - Comparisons: `=`, `!=`, `<>`, `<`, `<=`, `>`, `>=`
//! - Logic: `AND`, `OR`, `NOT`, parentheses
//! - `IS NULL`, `IS NOT NULL`
//! - Literals: `'strings'`, numbers, `TRUE`/`FALSE`, `NULL`
//!
//! References:
//! - sqlparser-rs: <https://docs.rs/sqlparser>

mod predicate;

pub use predicate::{filter_by, print_matches, CompareOp, Predicate};

use serde_json::{Number, Value};
use sqlparser::ast::{BinaryOperator, Expr, SetExpr, Statement, UnaryOperator, Value as SqlValue};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use crate::{Error, Result};

/// Filter expression parser
pub struct QueryEngine {
    dialect: GenericDialect,
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryEngine {
    /// Create a new query engine
    #[must_use]
    pub const fn new() -> Self {
        Self {
            dialect: GenericDialect {},
        }
    }

    /// Parse a SQL `WHERE` expression into a predicate
    ///
    /// An empty expression matches every record.
    ///
    /// # Errors
    /// Returns error if:
    /// - SQL syntax is invalid
    /// - The expression uses operators outside the supported subset
    /// - The left side of a comparison is not a column name
    ///
    /// # Example
    /// ```
    /// use unmix_sweep::query::QueryEngine;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let engine = QueryEngine::new();
    /// let predicate = engine.parse_filter("unmixer_name = 'FCLS' AND sad < 0.3")?;
    /// # let _ = predicate;
    /// # Ok(())
    /// # }
    /// ```
    pub fn parse_filter(&self, expr: &str) -> Result<Predicate> {
        if expr.trim().is_empty() {
            return Ok(Predicate::Always);
        }

        let sql = format!("SELECT * FROM results WHERE {expr}");
        let statements = Parser::parse_sql(&self.dialect, &sql)
            .map_err(|e| Error::ParseError(format!("SQL parse error: {e}")))?;

        if statements.len() != 1 {
            return Err(Error::ParseError(
                "Only a single filter expression is supported".to_string(),
            ));
        }

        let Statement::Query(query) = &statements[0] else {
            return Err(Error::ParseError("Expected a filter expression".to_string()));
        };
        if query.order_by.is_some() || query.limit.is_some() {
            return Err(Error::ParseError(
                "ORDER BY / LIMIT are not supported in filters".to_string(),
            ));
        }

        let SetExpr::Select(select) = query.body.as_ref() else {
            return Err(Error::ParseError("Expected a filter expression".to_string()));
        };
        let Some(selection) = select.selection.as_ref() else {
            return Err(Error::ParseError("Empty filter expression".to_string()));
        };

        Self::convert(selection)
    }

    fn convert(expr: &Expr) -> Result<Predicate> {
        match expr {
            Expr::Nested(inner) => Self::convert(inner),
            Expr::UnaryOp {
                op: UnaryOperator::Not,
                expr,
            } => Ok(!Self::convert(expr)?),
            Expr::IsNotNull(inner) => Ok(Predicate::Exists(Self::column(inner)?)),
            Expr::IsNull(inner) => Ok(!Predicate::Exists(Self::column(inner)?)),
            Expr::BinaryOp { left, op, right } => Self::convert_binary(left, op, right),
            other => Err(Error::ParseError(format!(
                "Unsupported filter expression: {other}"
            ))),
        }
    }

    fn convert_binary(left: &Expr, op: &BinaryOperator, right: &Expr) -> Result<Predicate> {
        match op {
            BinaryOperator::And => Ok(Self::convert(left)?.and(Self::convert(right)?)),
            BinaryOperator::Or => Ok(Self::convert(left)?.or(Self::convert(right)?)),
            BinaryOperator::Eq => Ok(Predicate::Eq(Self::column(left)?, Self::literal(right)?)),
            BinaryOperator::NotEq => {
                Ok(Predicate::NotEq(Self::column(left)?, Self::literal(right)?))
            }
            BinaryOperator::Lt | BinaryOperator::LtEq | BinaryOperator::Gt | BinaryOperator::GtEq => {
                let op = match op {
                    BinaryOperator::Lt => CompareOp::Lt,
                    BinaryOperator::LtEq => CompareOp::Le,
                    BinaryOperator::Gt => CompareOp::Gt,
                    _ => CompareOp::Ge,
                };
                let key = Self::column(left)?;
                let bound = Self::literal(right)?.as_f64().ok_or_else(|| {
                    Error::ParseError(format!(
                        "'{key} {} {right}' needs a numeric bound",
                        op_symbol(op)
                    ))
                })?;
                Ok(Predicate::compare(key, op, bound))
            }
            other => Err(Error::ParseError(format!("Unsupported operator: {other}"))),
        }
    }

    fn column(expr: &Expr) -> Result<String> {
        match expr {
            Expr::Identifier(ident) => Ok(ident.value.clone()),
            Expr::CompoundIdentifier(parts) => Ok(parts
                .iter()
                .map(|p| p.value.as_str())
                .collect::<Vec<_>>()
                .join(".")),
            other => Err(Error::ParseError(format!(
                "Expected a column name, found: {other}"
            ))),
        }
    }

    fn literal(expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Value(value) => match value {
                SqlValue::Number(n, _) => parse_number(n),
                SqlValue::SingleQuotedString(s) => Ok(Value::String(s.clone())),
                SqlValue::Boolean(b) => Ok(Value::Bool(*b)),
                SqlValue::Null => Ok(Value::Null),
                other => Err(Error::ParseError(format!("Unsupported literal: {other}"))),
            },
            Expr::UnaryOp {
                op: UnaryOperator::Minus,
                expr,
            } => match Self::literal(expr)? {
                Value::Number(n) => negate(&n),
                other => Err(Error::ParseError(format!("Cannot negate {other}"))),
            },
            Expr::Nested(inner) => Self::literal(inner),
            other => Err(Error::ParseError(format!(
                "Expected a literal value, found: {other}"
            ))),
        }
    }
}

const fn op_symbol(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Lt => "<",
        CompareOp::Le => "<=",
        CompareOp::Gt => ">",
        CompareOp::Ge => ">=",
    }
}

fn parse_number(text: &str) -> Result<Value> {
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Value::from(i));
    }
    if let Ok(u) = text.parse::<u64>() {
        return Ok(Value::from(u));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| Error::ParseError(format!("Invalid number: {text}")))
}

fn negate(n: &Number) -> Result<Value> {
    if let Some(i) = n.as_i64().and_then(i64::checked_neg) {
        return Ok(Value::from(i));
    }
    n.as_f64()
        .and_then(|f| Number::from_f64(-f))
        .map(Value::Number)
        .ok_or_else(|| Error::ParseError(format!("Cannot negate {n}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_empty_matches_all() {
        let engine = QueryEngine::new();
        assert_eq!(engine.parse_filter("  ").unwrap(), Predicate::Always);
    }

    #[test]
    fn test_parse_equality_types() {
        let engine = QueryEngine::new();
        assert_eq!(
            engine.parse_filter("resolution = '4'").unwrap(),
            Predicate::eq("resolution", "4")
        );
        assert_eq!(
            engine.parse_filter("epochs = 4").unwrap(),
            Predicate::eq("epochs", 4)
        );
    }

    #[test]
    fn test_parse_conjunction() {
        let engine = QueryEngine::new();
        let p = engine
            .parse_filter("unmixer_name = 'FCLS' AND extractor_name = 'VCA'")
            .unwrap();
        assert_eq!(
            p,
            Predicate::And(vec![
                Predicate::eq("unmixer_name", "FCLS"),
                Predicate::eq("extractor_name", "VCA"),
            ])
        );
    }

    #[test]
    fn test_parse_negative_bound() {
        let engine = QueryEngine::new();
        let p = engine.parse_filter("delta > -0.5").unwrap();
        assert_eq!(p, Predicate::compare("delta", CompareOp::Gt, -0.5));
    }

    #[test]
    fn test_parse_is_null() {
        let engine = QueryEngine::new();
        let p = engine.parse_filter("extractor_name IS NULL").unwrap();
        assert_eq!(p, !Predicate::Exists("extractor_name".into()));
    }

    #[test]
    fn test_parse_rejects_non_numeric_bound() {
        let engine = QueryEngine::new();
        let err = engine.parse_filter("sad < 'low'").unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }

    #[test]
    fn test_parse_rejects_literal_on_left() {
        let engine = QueryEngine::new();
        assert!(engine.parse_filter("'FCLS' = unmixer_name").is_err());
    }

    #[test]
    fn test_parse_invalid_sql() {
        let engine = QueryEngine::new();
        assert!(engine.parse_filter("sad <").is_err());
    }

    #[test]
    fn test_parse_number_kinds() {
        assert_eq!(parse_number("64").unwrap(), json!(64));
        assert_eq!(parse_number("0.25").unwrap(), json!(0.25));
    }
}
