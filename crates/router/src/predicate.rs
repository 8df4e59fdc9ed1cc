//! Filter predicates attached to query, update and delete operations.
//!
//! Predicates are a small expression tree so the tenant equality term can be
//! found structurally. Hand-written SQL fragments are still accepted through
//! [`Predicate::Raw`]; for those the tenant is recovered by a textual scan of
//! the fragment with its placeholders substituted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal operand of a predicate term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Unquoted textual form, `None` for SQL NULL.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Text(s) => Some(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Like => "LIKE",
        };
        f.write_str(op)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Eq(String, Value),
    Compare(String, CompareOp, Value),
    In(String, Vec<Value>),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    /// SQL fragment with `?` placeholders bound positionally to `params`
    Raw { sql: String, params: Vec<Value> },
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Eq(column.into(), value.into())
    }

    pub fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Predicate::Compare(column.into(), op, value.into())
    }

    pub fn is_in<V: Into<Value>>(column: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Predicate::In(column.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn raw(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Predicate::Raw {
            sql: sql.into(),
            params,
        }
    }

    /// Conjunction, flattening nested `And` nodes on the left.
    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::And(mut terms) => {
                terms.push(other);
                Predicate::And(terms)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Predicate) -> Self {
        match self {
            Predicate::Or(mut terms) => {
                terms.push(other);
                Predicate::Or(terms)
            }
            first => Predicate::Or(vec![first, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Value the predicate pins `field` to, if any.
    ///
    /// Only equality terms in conjunctive position count. A disjunction pins the
    /// field only when every branch pins it to the same value.
    pub fn tenant_value(&self, field: &str) -> Option<String> {
        match self {
            Predicate::Eq(column, value) if column.trim() == field => value.as_text(),
            Predicate::Eq(..) | Predicate::Compare(..) | Predicate::In(..) | Predicate::Not(_) => {
                None
            }
            Predicate::And(terms) => terms.iter().find_map(|term| term.tenant_value(field)),
            Predicate::Or(branches) => {
                let mut pinned: Option<String> = None;
                for branch in branches {
                    let value = branch.tenant_value(field)?;
                    match &pinned {
                        Some(existing) if existing.trim() != value.trim() => return None,
                        Some(_) => {}
                        None => pinned = Some(value),
                    }
                }
                pinned
            }
            Predicate::Raw { sql, params } => scan_raw_fragment(sql, params, field),
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::And(_) | Predicate::Or(_) | Predicate::Raw { .. } => {
                write!(f, "({})", self)
            }
            _ => write!(f, "{}", self),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Eq(column, value) => write!(f, "{} = {}", column, value),
            Predicate::Compare(column, op, value) => write!(f, "{} {} {}", column, op, value),
            Predicate::In(column, values) => {
                let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{} IN ({})", column, rendered.join(", "))
            }
            Predicate::And(terms) | Predicate::Or(terms) => {
                let joiner = if matches!(self, Predicate::And(_)) {
                    " AND "
                } else {
                    " OR "
                };
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(joiner)?;
                    }
                    term.fmt_nested(f)?;
                }
                Ok(())
            }
            Predicate::Not(inner) => {
                f.write_str("NOT ")?;
                inner.fmt_nested(f)
            }
            Predicate::Raw { sql, params } => {
                f.write_str(&bind_placeholders(sql, params, |param| param.to_string()))
            }
        }
    }
}

/// Textual tenant scan for raw fragments: substitute placeholders, split on the
/// `AND` token, then on `=`. Values containing either token are misread.
///
/// NULL parameters bind as empty text, so a tenant term bound to NULL pins nothing.
fn scan_raw_fragment(sql: &str, params: &[Value], field: &str) -> Option<String> {
    let flattened = bind_placeholders(sql, params, |param| param.as_text().unwrap_or_default());

    flattened.split("AND").find_map(|clause| {
        let mut sides = clause.split('=');
        let lhs = sides.next()?;
        let rhs = sides.next()?;
        if lhs.trim() != field {
            return None;
        }
        let value = unquote(rhs.trim());
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Replaces each `?` of `sql` with the next parameter in a single pass, so
/// placeholders inside bound values are never re-bound. Surplus `?` stay as is.
fn bind_placeholders(sql: &str, params: &[Value], render: impl Fn(&Value) -> String) -> String {
    let mut params = params.iter().peekable();
    let mut bound = String::with_capacity(sql.len());
    for c in sql.chars() {
        match (c, params.next_if(|_| c == '?')) {
            (_, Some(param)) => bound.push_str(&render(param)),
            (c, None) => bound.push(c),
        }
    }
    bound
}

fn unquote(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'\'' || first == b'"') {
            return &text[1..text.len() - 1];
        }
    }
    text
}
