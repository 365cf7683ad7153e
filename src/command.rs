use crate::value::{OutputRecord, Value};

/// How an output record is rendered as a command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOptions {
    /// Program (or any prefix) placed before the arguments.
    pub start: Option<String>,
    /// Render booleans as `--key=true` / `--key=false` instead of a bare
    /// `--key` flag for `true` and nothing for `false`.
    pub show_booleans: bool,
}

impl CommandOptions {
    pub fn with_start(start: impl Into<String>) -> Self {
        CommandOptions {
            start: Some(start.into()),
            show_booleans: false,
        }
    }
}

/// Render `record` as `--key=value` arguments in output order.
pub fn to_command(record: &OutputRecord, options: &CommandOptions) -> String {
    let mut args = Vec::with_capacity(record.len());
    for (key, value) in record.iter() {
        match value {
            Value::Bool(b) if options.show_booleans => args.push(format!("--{}={}", key, b)),
            Value::Bool(true) => args.push(format!("--{}", key)),
            Value::Bool(false) => {}
            other => args.push(format!("--{}={}", key, other)),
        }
    }
    let args = args.join(" ");

    match &options.start {
        Some(start) if args.is_empty() => start.clone(),
        Some(start) => format!("{} {}", start, args),
        None => args,
    }
}
