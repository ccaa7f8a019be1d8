//! Feature activation conditions.
//!
//! A feature's attribute carries a condition expression that decides whether
//! an observed value activates the feature. Three syntaxes are recognised,
//! tried in order:
//!
//! 1. **Range** `"<int>:<int>"`: the observed value parses as an integer
//!    inside the inclusive bounds.
//! 2. **Discrete set** `"[a,b,c]"`: the observed value equals one element.
//! 3. **Exact**: the observed value equals the whole expression.
//!
//! Evaluation never fails. A value that cannot be compared is a non-match.

use std::fmt;

/// A parsed activation condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Inclusive integer range.
    Range { low: i64, high: i64 },
    /// Any one of the listed values.
    OneOf(Vec<String>),
    /// Exactly this value.
    Exact(String),
}

impl Condition {
    /// Parse a condition expression. Never fails: anything that is neither a
    /// range nor a bracketed set is an exact-match condition.
    pub fn parse(expr: &str) -> Self {
        if let Some((low, high)) = parse_range(expr) {
            return Condition::Range { low, high };
        }
        if let Some(inner) = expr.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            return Condition::OneOf(inner.split(',').map(str::to_string).collect());
        }
        Condition::Exact(expr.to_string())
    }

    /// Whether `observed` satisfies this condition.
    pub fn matches(&self, observed: &str) -> bool {
        match self {
            Condition::Range { low, high } => observed
                .trim()
                .parse::<i64>()
                .is_ok_and(|v| (*low..=*high).contains(&v)),
            Condition::OneOf(values) => values.iter().any(|v| v == observed),
            Condition::Exact(value) => value == observed,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Range { low, high } => write!(f, "{low}:{high}"),
            Condition::OneOf(values) => write!(f, "[{}]", values.join(",")),
            Condition::Exact(value) => f.write_str(value),
        }
    }
}

fn parse_range(expr: &str) -> Option<(i64, i64)> {
    let (low, high) = expr.split_once(':')?;
    Some((low.trim().parse().ok()?, high.trim().parse().ok()?))
}

/// Evaluate `condition` against an observed value.
pub fn evaluate(condition: &str, observed: &str) -> bool {
    Condition::parse(condition).matches(observed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_inclusive() {
        assert!(evaluate("10:20", "15"));
        assert!(evaluate("10:20", "10"));
        assert!(evaluate("10:20", "20"));
        assert!(!evaluate("10:20", "25"));
        assert!(!evaluate("10:20", "9"));
    }

    #[test]
    fn range_with_non_numeric_value_is_no_match() {
        assert!(!evaluate("10:20", "abc"));
        assert!(!evaluate("10:20", ""));
        assert!(!evaluate("10:20", "15.5"));
    }

    #[test]
    fn range_accepts_negative_bounds() {
        assert!(evaluate("-5:5", "-3"));
        assert!(!evaluate("-5:5", "-6"));
    }

    #[test]
    fn discrete_set() {
        assert!(evaluate("[A,B,C]", "B"));
        assert!(!evaluate("[A,B,C]", "D"));
        assert!(!evaluate("[A,B,C]", "[A,B,C]"));
    }

    #[test]
    fn exact_match() {
        assert!(evaluate("yes", "yes"));
        assert!(!evaluate("yes", "no"));
        assert!(!evaluate("yes", "Yes"));
    }

    #[test]
    fn malformed_range_falls_back_to_exact() {
        assert_eq!(Condition::parse("a:b"), Condition::Exact("a:b".into()));
        assert!(evaluate("a:b", "a:b"));
        assert!(!evaluate("a:b", "a"));
    }

    #[test]
    fn display_round_trips_expression() {
        for expr in ["10:20", "[x,y]", "present"] {
            assert_eq!(Condition::parse(expr).to_string(), expr);
        }
    }
}
