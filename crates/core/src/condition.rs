//! Three-token condition language gating dialogue lines (`gold >= 10`).

use crate::story::Variables;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    AtLeast,
    Equal,
    LessThan,
}

impl Operator {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            ">=" => Some(Operator::AtLeast),
            "==" => Some(Operator::Equal),
            "<" => Some(Operator::LessThan),
            _ => None,
        }
    }

    fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Operator::AtLeast => lhs >= rhs,
            Operator::Equal => lhs == rhs,
            Operator::LessThan => lhs < rhs,
        }
    }
}

/// A tokenized `key op value` expression. Operator and literal are kept as
/// written; they are only interpreted at evaluation time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Condition<'a> {
    pub key: &'a str,
    pub op: &'a str,
    pub value: &'a str,
}

impl<'a> Condition<'a> {
    /// Splits on whitespace; anything other than exactly three tokens is `None`.
    pub fn parse(input: &'a str) -> Option<Self> {
        let mut tokens = input.split_whitespace();
        let key = tokens.next()?;
        let op = tokens.next()?;
        let value = tokens.next()?;
        if tokens.next().is_some() {
            return None;
        }
        Some(Self { key, op, value })
    }

    /// Never fails: unknown operators or non-numeric literals are `false`,
    /// missing or non-numeric variables read as `0`.
    pub fn evaluate(&self, variables: &Variables) -> bool {
        let Some(op) = Operator::parse(self.op) else {
            return false;
        };
        let Ok(target) = self.value.parse::<f64>() else {
            return false;
        };
        let current = variables
            .get(self.key)
            .map(|value| value.as_number())
            .unwrap_or(0.0);
        op.apply(current, target)
    }
}

/// Whether a dialogue line with this condition should be shown.
///
/// An empty or untokenizable condition always holds.
pub fn condition_holds(expression: &str, variables: &Variables) -> bool {
    if expression.trim().is_empty() {
        return true;
    }
    match Condition::parse(expression) {
        Some(condition) => condition.evaluate(variables),
        None => true,
    }
}
