use crate::ast::*;
use crate::error::ResolveError;
use crate::parser;
use crate::value::Value;

/// Parse and evaluate expression source in one step.
pub fn eval_source(source: &str) -> Result<Value, ResolveError> {
    let expr = parser::parse(source)?;
    evaluate(&expr)
}

/// Evaluate an expression tree. Pure: no state, no I/O, left to right.
pub fn evaluate(expr: &Expr) -> Result<Value, ResolveError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::List(items) => items
            .iter()
            .map(evaluate)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Expr::Unary { op, operand } => {
            let operand = evaluate(operand)?;
            eval_unary(*op, operand)
        }
        Expr::Binary { op, left, right } => {
            let left = evaluate(left)?;
            let right = evaluate(right)?;
            eval_binary(*op, left, right)
        }
        Expr::Length(operand) => match evaluate(operand)? {
            Value::List(items) => Ok(Value::Int(items.len() as i64)),
            other => Err(ResolveError::type_mismatch(".len", other.kind())),
        },
        Expr::Index { base, index } => {
            let base = evaluate(base)?;
            let index = evaluate(index)?;
            eval_index(base, index)
        }
    }
}

fn eval_unary(op: UnaryOp, operand: Value) -> Result<Value, ResolveError> {
    match (op, operand) {
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or(ResolveError::IntegerOverflow("-")),
        (op, other) => Err(ResolveError::type_mismatch(op.symbol(), other.kind())),
    }
}

fn eval_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, ResolveError> {
    let (a, b) = match (left, right) {
        (Value::Int(a), Value::Int(b)) => (a, b),
        (Value::Str(a), Value::Str(b)) if op == BinaryOp::Add => return Ok(Value::Str(a + &b)),
        (left, right) => {
            return Err(ResolveError::type_mismatch(
                op.symbol(),
                format!("{} and {}", left.kind(), right.kind()),
            ))
        }
    };

    let overflow = || ResolveError::IntegerOverflow(op.symbol());
    let n = match op {
        BinaryOp::Add => a.checked_add(b).ok_or_else(overflow)?,
        BinaryOp::Sub => a.checked_sub(b).ok_or_else(overflow)?,
        BinaryOp::Mul => a.checked_mul(b).ok_or_else(overflow)?,
        BinaryOp::FloorDiv => floor_div(a, b)?,
        BinaryOp::Mod => floor_mod(a, b)?,
    };
    Ok(Value::Int(n))
}

/// Division rounding toward negative infinity.
fn floor_div(a: i64, b: i64) -> Result<i64, ResolveError> {
    if b == 0 {
        return Err(ResolveError::DivisionByZero);
    }
    let q = a
        .checked_div(b)
        .ok_or(ResolveError::IntegerOverflow("//"))?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

/// Remainder paired with `floor_div`: takes the sign of the divisor, so
/// `a == floor_div(a, b) * b + floor_mod(a, b)`.
fn floor_mod(a: i64, b: i64) -> Result<i64, ResolveError> {
    if b == 0 {
        return Err(ResolveError::DivisionByZero);
    }
    // wrapping_rem only wraps for i64::MIN % -1, where the answer is 0
    let r = a.wrapping_rem(b);
    if r != 0 && ((r < 0) != (b < 0)) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

fn eval_index(base: Value, index: Value) -> Result<Value, ResolveError> {
    let mut items = match base {
        Value::List(items) => items,
        other => return Err(ResolveError::type_mismatch("[]", other.kind())),
    };
    let index = match index {
        Value::Int(n) => n,
        other => {
            return Err(ResolveError::type_mismatch(
                "[]",
                format!("an index of {}", other.kind()),
            ))
        }
    };

    let len = items.len();
    let resolved = if index < 0 {
        (len as i64).checked_add(index)
    } else {
        Some(index)
    };
    match resolved {
        Some(i) if i >= 0 && (i as usize) < len => Ok(items.swap_remove(i as usize)),
        _ => Err(ResolveError::IndexOutOfRange { index, len }),
    }
}
