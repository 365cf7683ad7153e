use tracing::{debug, trace};

use crate::command::{self, CommandOptions};
use crate::error::ResolveError;
use crate::interpreter;
use crate::scanner::{self, ScanResult};
use crate::value::{Entry, OutputRecord, Record, ReferenceRecord, Value};

/// Template reserved for "the caller supplies this value later".
pub const UNRESOLVED_TOKEN: &str = "$?";

/// One template-record entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Template {
    /// Subject to placeholder scanning and, for `$!`, evaluation.
    Text(String),
    /// Copied to the output unchanged.
    Literal(Value),
}

impl From<&str> for Template {
    fn from(s: &str) -> Self {
        Template::Text(s.to_string())
    }
}

impl From<String> for Template {
    fn from(s: String) -> Self {
        Template::Text(s)
    }
}

impl From<Value> for Template {
    fn from(v: Value) -> Self {
        Template::Literal(v)
    }
}

/// Output keys mapped to templates, in declared order.
pub type TemplateRecord = Record<Template>;

/// Result of one resolution pass. May still hold `$?` markers, which must
/// be patched before the output record can be read.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    entries: Record<Entry>,
}

/// Resolve every template against `reference`, in declared order.
///
/// The first failing entry aborts the pass; its error is wrapped in
/// `ResolveError::Template` naming the key.
pub fn resolve(
    templates: &TemplateRecord,
    reference: &ReferenceRecord,
) -> Result<Resolution, ResolveError> {
    let mut entries = Record::new();
    for (key, template) in templates.iter() {
        let entry = resolve_entry(key, template, reference).map_err(|e| {
            debug!(key, error = %e, "template failed");
            ResolveError::Template {
                key: key.to_string(),
                source: Box::new(e),
            }
        })?;
        entries.insert(key, entry);
    }
    debug!(entries = entries.len(), "resolved template record");
    Ok(Resolution { entries })
}

/// Resolve a single template for output key `key`.
pub fn resolve_entry(
    key: &str,
    template: &Template,
    reference: &ReferenceRecord,
) -> Result<Entry, ResolveError> {
    let raw = match template {
        Template::Literal(v) => return Ok(Entry::Resolved(v.clone())),
        Template::Text(raw) if raw == UNRESOLVED_TOKEN => {
            trace!(key, "left unresolved");
            return Ok(Entry::Unresolved);
        }
        Template::Text(raw) => raw,
    };

    let value = match scanner::scan(raw, reference, key)? {
        ScanResult::Value(v) => v,
        ScanResult::Text(s) => Value::Str(s),
        ScanResult::Expression(source) => interpreter::eval_source(&source)?,
    };
    trace!(key, value = %value, "resolved");
    Ok(Entry::Resolved(value))
}

impl Resolution {
    /// The entry for `key`, or `None` if the template record had no such key.
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Keys still holding the `$?` marker, in output order.
    pub fn unresolved_keys(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, e)| e.is_unresolved())
            .map(|(k, _)| k)
    }

    pub fn is_complete(&self) -> bool {
        self.unresolved_keys().next().is_none()
    }

    /// Supply the value for a `$?` entry. Fails if `key` is absent or is
    /// not currently unresolved, so each marker can be patched only once.
    pub fn patch_unresolved(
        &mut self,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<(), ResolveError> {
        match self.entries.get_mut(key) {
            Some(slot) if slot.is_unresolved() => {
                *slot = Entry::Resolved(value.into());
                debug!(key, "patched unresolved entry");
                Ok(())
            }
            _ => Err(ResolveError::PatchTargetInvalid(key.to_string())),
        }
    }

    /// The resolved output record, provided no `$?` marker remains.
    pub fn record(&self) -> Result<OutputRecord, ResolveError> {
        self.clone().into_record()
    }

    pub fn into_record(self) -> Result<OutputRecord, ResolveError> {
        self.entries
            .into_iter()
            .map(|(key, entry)| match entry {
                Entry::Resolved(v) => Ok((key, v)),
                Entry::Unresolved => Err(ResolveError::UnresolvedEntryRemaining(key)),
            })
            .collect()
    }

    /// Format the output record as a `--key=value` command line.
    pub fn to_command(&self, options: &CommandOptions) -> Result<String, ResolveError> {
        let record = self.record()?;
        Ok(command::to_command(&record, options))
    }
}
