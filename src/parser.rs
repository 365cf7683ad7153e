use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::*;
use crate::error::ResolveError;
use crate::value::Value;

static INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9]+").expect("integer literal pattern"));
static BOOLEAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i:true|false)").expect("boolean literal pattern"));

/// List literals nest at most this many levels (`[[1, 2], [3]]`).
const MAX_LIST_DEPTH: usize = 2;
/// Bound on the depth of the expression tree. Parentheses, prefix
/// operators, each chained binary operator and each postfix suffix add a
/// level, so parsing, evaluating and dropping the tree stay within the stack.
const MAX_NESTING: usize = 128;

/// Parser state: tracks position in the input string.
struct Parser<'a> {
    input: &'a str,
    pos: usize,
    nesting: usize,
}

/// Parse expression source into an `Expr`.
///
/// Only literals, list literals, `[index]`, `.len`, prefix `!`/`-`,
/// infix `+ - * // %` and parentheses are accepted. Names, calls and
/// attribute access are rejected, so nothing outside this closed set can
/// ever be evaluated.
pub fn parse(input: &str) -> Result<Expr, ResolveError> {
    let mut parser = Parser {
        input,
        pos: 0,
        nesting: 0,
    };

    parser.skip_ws();
    if parser.at_end() {
        return Err(parser.error("empty expression"));
    }
    let expr = parser.parse_expr()?;
    parser.skip_ws();
    if let Some(ch) = parser.peek_char() {
        return Err(parser.error(format!("unexpected `{}`", ch)));
    }
    Ok(expr)
}

impl<'a> Parser<'a> {
    // ── Helpers ──────────────────────────────────────────────────────

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    fn starts_with(&self, s: &str) -> bool {
        self.remaining().starts_with(s)
    }

    fn eat_char(&mut self, ch: char) -> bool {
        if self.peek_char() == Some(ch) {
            self.advance(ch.len_utf8());
            true
        } else {
            false
        }
    }

    fn expect_char(&mut self, ch: char) -> Result<(), ResolveError> {
        if self.eat_char(ch) {
            Ok(())
        } else {
            match self.peek_char() {
                Some(found) => Err(self.error(format!("expected `{}`, found `{}`", ch, found))),
                None => Err(self.error(format!("expected `{}`, found end of input", ch))),
            }
        }
    }

    /// True if the character `offset` bytes ahead continues an identifier.
    fn is_ident_char_at(&self, offset: usize) -> bool {
        self.remaining()
            .get(offset..)
            .and_then(|s| s.chars().next())
            .map_or(false, is_ident_char)
    }

    fn error(&self, reason: impl Into<String>) -> ResolveError {
        ResolveError::invalid_expression(self.input, self.pos, reason)
    }

    fn error_at(&self, offset: usize, reason: impl Into<String>) -> ResolveError {
        ResolveError::invalid_expression(self.input, offset, reason)
    }

    fn skip_ws(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance(ch.len_utf8());
            } else {
                break;
            }
        }
    }

    fn enter(&mut self) -> Result<(), ResolveError> {
        self.nesting += 1;
        if self.nesting > MAX_NESTING {
            return Err(self.error("expression nests too deeply"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting -= 1;
    }

    // ── Binary chain ────────────────────────────────────────────────

    /// `operand (op operand)*`, folded left with a single precedence.
    fn parse_expr(&mut self) -> Result<Expr, ResolveError> {
        let mut left = self.parse_operand()?;
        let mut chained = 0;
        loop {
            self.skip_ws();
            let op = match self.peek_binary_op() {
                Some(op) => op,
                None => break,
            };
            self.advance(op.symbol().len());
            // every fold deepens the left spine by one
            self.enter()?;
            chained += 1;
            let right = self.parse_operand()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.nesting -= chained;
        Ok(left)
    }

    fn peek_binary_op(&self) -> Option<BinaryOp> {
        if self.starts_with("//") {
            return Some(BinaryOp::FloorDiv);
        }
        match self.peek_char() {
            Some('+') => Some(BinaryOp::Add),
            Some('-') => Some(BinaryOp::Sub),
            Some('*') => Some(BinaryOp::Mul),
            Some('%') => Some(BinaryOp::Mod),
            _ => None,
        }
    }

    // ── Prefix operators ────────────────────────────────────────────

    fn parse_operand(&mut self) -> Result<Expr, ResolveError> {
        self.skip_ws();
        let op = match self.peek_char() {
            Some('!') => UnaryOp::Not,
            // `-5` is a signed literal, `-[1][0]` and `- 5` are negation
            Some('-') if !self.starts_with_signed_integer() => UnaryOp::Neg,
            _ => return self.parse_postfix(),
        };
        self.advance(1);
        self.enter()?;
        let operand = self.parse_operand()?;
        self.leave();
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn starts_with_signed_integer(&self) -> bool {
        let mut chars = self.remaining().chars();
        matches!(chars.next(), Some('+' | '-'))
            && matches!(chars.next(), Some(c) if c.is_ascii_digit())
    }

    // ── Postfix operators ───────────────────────────────────────────

    /// `primary ('[' expr ']' | '.len')*`, applied left to right.
    fn parse_postfix(&mut self) -> Result<Expr, ResolveError> {
        let mut expr = self.parse_primary()?;
        let mut chained = 0;
        loop {
            self.skip_ws();
            if self.eat_char('[') {
                self.enter()?;
                chained += 1;
                let index = self.parse_expr()?;
                self.skip_ws();
                self.expect_char(']')?;
                expr = Expr::Index {
                    base: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.starts_with(".len") && !self.is_ident_char_at(4) {
                self.enter()?;
                chained += 1;
                self.advance(4);
                expr = Expr::Length(Box::new(expr));
            } else {
                break;
            }
        }
        self.nesting -= chained;
        Ok(expr)
    }

    // ── Primaries ───────────────────────────────────────────────────

    fn parse_primary(&mut self) -> Result<Expr, ResolveError> {
        self.skip_ws();
        match self.peek_char() {
            Some('(') => {
                self.advance(1);
                self.enter()?;
                let inner = self.parse_expr()?;
                self.leave();
                self.skip_ws();
                self.expect_char(')')?;
                Ok(inner)
            }
            Some('[') => self.parse_list(1),
            Some(_) => self.parse_literal().map(Expr::Literal),
            None => Err(self.error("expected a value, found end of input")),
        }
    }

    /// A list literal whose elements are literals or, below the top
    /// level, lists of literals.
    fn parse_list(&mut self, depth: usize) -> Result<Expr, ResolveError> {
        let begin = self.pos;
        if depth > MAX_LIST_DEPTH {
            return Err(self.error(format!(
                "list literals nest at most {} levels deep",
                MAX_LIST_DEPTH
            )));
        }
        self.expect_char('[')?;

        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.eat_char(']') {
                break;
            }
            let item = match self.peek_char() {
                Some('[') => self.parse_list(depth + 1)?,
                Some(_) => Expr::Literal(self.parse_literal()?),
                None => return Err(self.error_at(begin, "unterminated list")),
            };
            items.push(item);

            self.skip_ws();
            if self.eat_char(',') {
                continue;
            }
            self.expect_char(']')?;
            break;
        }
        Ok(Expr::List(items))
    }

    /// A boolean, integer or string literal.
    fn parse_literal(&mut self) -> Result<Value, ResolveError> {
        match self.peek_char() {
            Some(quote @ ('\'' | '"')) => return self.parse_string(quote).map(Value::Str),
            None => return Err(self.error("expected a value, found end of input")),
            _ => {}
        }

        if let Some(m) = BOOLEAN.find(self.remaining()) {
            if !self.is_ident_char_at(m.end()) {
                let value = m.as_str().eq_ignore_ascii_case("true");
                self.advance(m.end());
                return Ok(Value::Bool(value));
            }
        }

        if let Some(m) = INTEGER.find(self.remaining()) {
            let n: i64 = m
                .as_str()
                .parse()
                .map_err(|_| self.error(format!("integer `{}` is out of range", m.as_str())))?;
            self.advance(m.end());
            return Ok(Value::Int(n));
        }

        let word: String = self
            .remaining()
            .chars()
            .take_while(|&c| is_ident_char(c))
            .collect();
        if word.is_empty() {
            let ch = self.peek_char().unwrap_or_default();
            Err(self.error(format!("unexpected `{}`", ch)))
        } else {
            Err(self.error(format!("`{}` is not a literal; names are not allowed", word)))
        }
    }

    /// A single- or double-quoted string. `\\`, `\'`, `\"`, `\n` and `\t`
    /// are unescaped; any other backslash is kept as is.
    fn parse_string(&mut self, quote: char) -> Result<String, ResolveError> {
        let begin = self.pos;
        self.advance(quote.len_utf8());
        let mut result = String::new();
        loop {
            match self.peek_char() {
                None => return Err(self.error_at(begin, "unterminated string")),
                Some(ch) if ch == quote => {
                    self.advance(ch.len_utf8());
                    return Ok(result);
                }
                Some('\\') => {
                    self.advance(1);
                    let escaped = match self.peek_char() {
                        None => return Err(self.error_at(begin, "unterminated string")),
                        Some(c) => c,
                    };
                    self.advance(escaped.len_utf8());
                    match escaped {
                        'n' => result.push('\n'),
                        't' => result.push('\t'),
                        '\\' | '\'' | '"' => result.push(escaped),
                        other => {
                            result.push('\\');
                            result.push(other);
                        }
                    }
                }
                Some(ch) => {
                    self.advance(ch.len_utf8());
                    result.push(ch);
                }
            }
        }
    }
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}
