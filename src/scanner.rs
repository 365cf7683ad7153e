use tracing::trace;

use crate::error::ResolveError;
use crate::value::{ReferenceRecord, Value};

/// Prefix marking a template as a restricted expression.
pub const EXPRESSION_PREFIX: &str = "$!";

/// What a template string turned into after placeholder substitution.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanResult {
    /// The whole template was one `$$` or `$name$` token; the bound value
    /// keeps its native type.
    Value(Value),
    /// Literal text and stringified substitutions, concatenated.
    Text(String),
    /// A `$!` template: substituted expression source, not yet parsed.
    Expression(String),
}

/// Output accumulated so far. Starts `Empty`, becomes `Single` on a first
/// substitution with nothing before it, and degrades to `Text` as soon as
/// anything else is appended.
enum Output {
    Empty,
    Single(Value),
    Text(String),
}

impl Output {
    fn text_mut(&mut self) -> &mut String {
        match std::mem::replace(self, Output::Empty) {
            Output::Empty => *self = Output::Text(String::new()),
            Output::Single(v) => *self = Output::Text(v.to_string()),
            Output::Text(s) => *self = Output::Text(s),
        }
        match self {
            Output::Text(s) => s,
            _ => unreachable!(),
        }
    }

    fn push_char(&mut self, ch: char) {
        self.text_mut().push(ch);
    }

    fn push_value(&mut self, value: Value, keep_native: bool) {
        match self {
            Output::Empty if keep_native => *self = Output::Single(value),
            _ => {
                let text = value.to_string();
                self.text_mut().push_str(&text);
            }
        }
    }

    fn into_result(self) -> ScanResult {
        match self {
            Output::Empty => ScanResult::Text(String::new()),
            Output::Single(v) => ScanResult::Value(v),
            Output::Text(s) => ScanResult::Text(s),
        }
    }
}

/// Scanner state: the input, a cursor, and the "collecting name" flag with
/// its name buffer.
struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    reference: &'a ReferenceRecord,
    own_key: &'a str,
    /// When false every substitution is stringified.
    keep_native: bool,
    output: Output,
    collecting: bool,
    name: String,
}

/// Substitute placeholders in `raw` against `reference`. `own_key` is the
/// output key being resolved; `$$` refers to it.
///
/// A `$!` template is not interpreted here: its remainder is substituted
/// and handed back as `ScanResult::Expression`.
pub fn scan(
    raw: &str,
    reference: &ReferenceRecord,
    own_key: &str,
) -> Result<ScanResult, ResolveError> {
    if let Some(rest) = raw.strip_prefix(EXPRESSION_PREFIX) {
        let source = scan_expression_source(rest, reference, own_key)?;
        return Ok(ScanResult::Expression(source));
    }
    Scanner::new(raw, reference, own_key, true).run()
}

/// Substitute placeholders in an expression body, stringifying every
/// substitution so the result is plain source text.
pub fn scan_expression_source(
    raw: &str,
    reference: &ReferenceRecord,
    own_key: &str,
) -> Result<String, ResolveError> {
    let source = match Scanner::new(raw, reference, own_key, false).run()? {
        ScanResult::Text(s) | ScanResult::Expression(s) => s,
        ScanResult::Value(v) => v.to_string(),
    };
    trace!(key = own_key, source = %source, "expression source");
    Ok(source)
}

impl<'a> Scanner<'a> {
    fn new(
        input: &'a str,
        reference: &'a ReferenceRecord,
        own_key: &'a str,
        keep_native: bool,
    ) -> Self {
        Scanner {
            input,
            pos: 0,
            reference,
            own_key,
            keep_native,
            output: Output::Empty,
            collecting: false,
            name: String::new(),
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self, ch: char) {
        self.pos += ch.len_utf8();
    }

    fn emit(&mut self, ch: char) {
        if self.collecting {
            self.name.push(ch);
        } else {
            self.output.push_char(ch);
        }
    }

    fn substitute(&mut self, key: &str) -> Result<(), ResolveError> {
        let value = self
            .reference
            .get(key)
            .cloned()
            .ok_or_else(|| ResolveError::UnknownKey(key.to_string()))?;
        trace!(key, value = %value, "substitute");
        self.output.push_value(value, self.keep_native);
        Ok(())
    }

    fn run(mut self) -> Result<ScanResult, ResolveError> {
        while let Some(ch) = self.peek_char() {
            self.advance(ch);
            match ch {
                '\\' => match self.peek_char() {
                    Some(next @ ('$' | '\\')) => {
                        self.advance(next);
                        self.emit(next);
                    }
                    _ => self.emit('\\'),
                },
                '$' if self.collecting => {
                    self.collecting = false;
                    let name = std::mem::take(&mut self.name);
                    self.substitute(&name)?;
                }
                '$' => {
                    if self.peek_char() == Some('$') {
                        self.advance('$');
                        let own_key = self.own_key;
                        self.substitute(own_key)?;
                    } else {
                        self.collecting = true;
                    }
                }
                other => self.emit(other),
            }
        }

        if self.collecting {
            return Err(ResolveError::UnterminatedPlaceholder(self.name));
        }
        Ok(self.output.into_result())
    }
}
