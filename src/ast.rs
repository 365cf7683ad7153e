//! Intermediate representation produced by the expression parser and
//! consumed by the interpreter. Built once per `$!` template and dropped
//! after evaluation.

use crate::value::Value;

/// A prefix operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`: boolean negation
    Not,
    /// `-`: integer negation
    Neg,
}

/// An infix operator. All share one precedence and associate left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    /// `//`: floor division
    FloorDiv,
    /// `%`: modulo with the sign of the divisor
    Mod,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
        }
    }
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
        }
    }
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A boolean, integer or string literal.
    Literal(Value),
    /// `[a, b, ...]`
    List(Vec<Expr>),
    /// `base[index]`
    Index { base: Box<Expr>, index: Box<Expr> },
    /// `!x` or `-x`
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// `left op right`
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `x.len`
    Length(Box<Expr>),
}
