//! Generate-loop replication with symbolic bounds.
//!
//! Loop bounds stay as the source text (`i = 0; i < N; i = i + 1`) so the
//! generated port bindings can index wire arrays with the loop variable. They
//! are reduced to a concrete iteration count only for address placement.

use ghostbus_common::Ident;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound on iterations when counting a loop from literal bounds.
const MAX_ITERATIONS: u32 = 1 << 16;

/// Loop condition operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    /// `=`
    #[serde(rename = "=")]
    Eq,
    /// `!=`
    #[serde(rename = "!=")]
    Ne,
    /// `>`
    #[serde(rename = ">")]
    Gt,
    /// `>=`
    #[serde(rename = ">=")]
    Ge,
    /// `<`
    #[serde(rename = "<")]
    Lt,
    /// `<=`
    #[serde(rename = "<=")]
    Le,
}

impl CompareOp {
    fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }
}

impl FromStr for CompareOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" | "==" => Ok(CompareOp::Eq),
            "!=" => Ok(CompareOp::Ne),
            ">" => Ok(CompareOp::Gt),
            ">=" => Ok(CompareOp::Ge),
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::Le),
            other => Err(format!("unknown loop comparison '{other}'")),
        }
    }
}

/// Loop increment operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOp {
    /// `i = i + v`
    #[serde(rename = "+")]
    Add,
    /// `i = i - v`
    #[serde(rename = "-")]
    Sub,
    /// `i = i * v`
    #[serde(rename = "*")]
    Mul,
    /// `i = i / v`
    #[serde(rename = "/")]
    Div,
}

/// The increment clause, e.g. `+1` or `*2`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Operator.
    pub op: StepOp,
    /// Operand text.
    pub value: String,
}

impl Step {
    fn apply(&self, index: i64, value: i64) -> Option<i64> {
        match self.op {
            StepOp::Add => index.checked_add(value),
            StepOp::Sub => index.checked_sub(value),
            StepOp::Mul => index.checked_mul(value),
            StepOp::Div => index.checked_div(value),
        }
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let op = match chars.next() {
            Some('+') => StepOp::Add,
            Some('-') => StepOp::Sub,
            Some('*') => StepOp::Mul,
            Some('/') => StepOp::Div,
            _ => return Err(format!("unknown loop increment '{s}'")),
        };
        let value = chars.as_str().trim();
        if value.is_empty() {
            return Err(format!("loop increment '{s}' has no operand"));
        }
        Ok(Step {
            op,
            value: value.to_string(),
        })
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.op {
            StepOp::Add => '+',
            StepOp::Sub => '-',
            StepOp::Mul => '*',
            StepOp::Div => '/',
        };
        write!(f, "{op}{}", self.value)
    }
}

/// `for (index = init; index op limit; index = index step)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopBounds {
    /// Loop variable (a `genvar`).
    pub index: Ident,
    /// Initial value expression.
    pub init: String,
    /// Condition operator.
    pub op: CompareOp,
    /// Right-hand side of the condition.
    pub limit: String,
    /// Increment clause.
    pub step: Step,
}

impl LoopBounds {
    /// Counts iterations when all three expressions are integer literals.
    ///
    /// Returns `None` for parametrized bounds, non-terminating loops and
    /// loops longer than an internal iteration cap.
    pub fn evaluate(&self) -> Option<u32> {
        let init = parse_literal(&self.init)?;
        let limit = parse_literal(&self.limit)?;
        let step = parse_literal(&self.step.value)?;
        let mut index = init;
        let mut count = 0u32;
        while self.op.holds(index, limit) {
            count += 1;
            if count > MAX_ITERATIONS {
                return None;
            }
            let next = self.step.apply(index, step)?;
            if next == index {
                return None;
            }
            index = next;
        }
        Some(count)
    }

    /// Renders the loop header with `name` standing in for the index.
    pub fn header(&self, name: &str) -> String {
        format!(
            "for ({name}={}; {name}{}{}; {name}={name}{})",
            self.init,
            self.op.symbol(),
            self.limit,
            self.step
        )
    }
}

/// `count` structurally identical instances produced by one generate loop.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationGroup {
    /// Generate block label.
    pub label: Ident,
    /// Symbolic loop bounds.
    pub bounds: LoopBounds,
    /// Resolved iteration count.
    pub count: u32,
}

/// Parses a decimal, `0x` hex, or Verilog based literal such as `8'hff`.
pub fn parse_literal(text: &str) -> Option<i64> {
    let cleaned: String = text.trim().chars().filter(|&c| c != '_').collect();
    let (negative, body) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };
    let magnitude = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(tick) = body.find('\'') {
        let based = body[tick + 1..].trim_start_matches(['s', 'S']);
        let mut chars = based.chars();
        let radix = match chars.next()?.to_ascii_lowercase() {
            'h' => 16,
            'd' => 10,
            'o' => 8,
            'b' => 2,
            _ => return None,
        };
        i64::from_str_radix(chars.as_str(), radix).ok()?
    } else {
        body.parse::<i64>().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}
