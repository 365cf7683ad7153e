//! Resolve a template record against a reference record.
//!
//! Templates use `$$` (the output key's own reference value), `$name$`
//! (another reference value), `\$` / `\\` escapes, `$!` for a restricted
//! expression and `$?` for a value the caller supplies later:
//!
//! ```
//! use argimpl::{resolve, Template, TemplateRecord, ReferenceRecord, Value};
//!
//! let reference: ReferenceRecord = [
//!     ("name", Value::from("John")),
//!     ("pre_class", Value::Int(1)),
//! ]
//! .into_iter()
//! .collect();
//! let templates: TemplateRecord = [
//!     ("name", Template::from("$$ Williams")),
//!     ("class", Template::from("$! ($pre_class$ + 1) * 2")),
//! ]
//! .into_iter()
//! .collect();
//!
//! let record = resolve(&templates, &reference)?.into_record()?;
//! assert_eq!(record.get("name"), Some(&Value::from("John Williams")));
//! assert_eq!(record.get("class"), Some(&Value::Int(4)));
//! # Ok::<(), argimpl::ResolveError>(())
//! ```

pub mod ast;
pub mod command;
pub mod error;
pub mod from_json;
pub mod interpreter;
pub mod json;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod value;

use std::path::Path;

pub use command::{to_command, CommandOptions};
pub use error::{Error, LoadError, ResolveError};
pub use resolver::{resolve, Resolution, Template, TemplateRecord, UNRESOLVED_TOKEN};
pub use value::{Entry, OutputRecord, Record, ReferenceRecord, Value};

// ── Core API ───────────────────────────────────────────────────────

/// Load a reference variant and a template variant from JSON files and
/// resolve one against the other.
pub fn resolve_files(
    reference_path: impl AsRef<Path>,
    reference_variant: &str,
    templates_path: impl AsRef<Path>,
    templates_variant: &str,
) -> Result<Resolution, Error> {
    let reference = from_json::load_reference(reference_path, reference_variant)?;
    let templates = from_json::load_templates(templates_path, templates_variant)?;
    Ok(resolve(&templates, &reference)?)
}

#[cfg(test)]
mod tests;
