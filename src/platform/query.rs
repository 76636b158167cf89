//! Row filters in the platform's REST query syntax

use std::fmt;

/// Comparison applied to a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Is,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Eq => "eq",
            Op::Neq => "neq",
            Op::Lt => "lt",
            Op::Lte => "lte",
            Op::Gt => "gt",
            Op::Gte => "gte",
            Op::Is => "is",
        }
    }
}

/// `column=op.value`
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: Op,
    pub value: String,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: Op, value: impl fmt::Display) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.to_string(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl fmt::Display) -> Self {
        Self::new(column, Op::Eq, value)
    }

    pub fn lt(column: impl Into<String>, value: impl fmt::Display) -> Self {
        Self::new(column, Op::Lt, value)
    }

    pub fn gte(column: impl Into<String>, value: impl fmt::Display) -> Self {
        Self::new(column, Op::Gte, value)
    }

    pub fn is(column: impl Into<String>, value: impl fmt::Display) -> Self {
        Self::new(column, Op::Is, value)
    }

    /// Query-string pair for this filter
    pub fn to_pair(&self) -> (String, String) {
        (self.column.clone(), format!("{}.{}", self.op.as_str(), self.value))
    }
}

/// Encode `select=*` plus filters as a query string
pub fn encode_query(select: &str, filters: &[Filter]) -> String {
    let mut pairs = vec![("select".to_string(), select.to_string())];
    pairs.extend(filters.iter().map(Filter::to_pair));
    serde_urlencoded::to_string(&pairs).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_pair() {
        assert_eq!(
            Filter::eq("user_id", "abc").to_pair(),
            ("user_id".to_string(), "eq.abc".to_string())
        );
        assert_eq!(Filter::is("read_at", "null").to_pair().1, "is.null");
    }

    #[test]
    fn test_encode_query() {
        let q = encode_query("*", &[Filter::eq("user_id", "a b"), Filter::lt("created_at", "2024-01-01")]);
        assert_eq!(q, "select=*&user_id=eq.a+b&created_at=lt.2024-01-01");
    }
}
