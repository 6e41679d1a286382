use std::fmt;

/// Errors surfaced to callers of the config and loader APIs.
///
/// Malformed *data* never produces one of these: the pipeline recovers
/// locally and reports the condition in
/// [`ResolutionReport::issues`](crate::model::ResolutionReport).
#[derive(Debug)]
pub enum ResolveError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad threshold, conflicting columns, etc.).
    ConfigValidation(String),
    /// A logical column role was left unbound.
    MissingRole { table: String, role: String },
    /// A similarity cutoff outside [0, 1].
    CutoffOutOfRange { name: String, value: f64 },
    /// CSV decode / encode error.
    Csv(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingRole { table, role } => {
                write!(f, "{table}: no column bound to role '{role}'")
            }
            Self::CutoffOutOfRange { name, value } => {
                write!(f, "{name} must be within [0, 1], got {value}")
            }
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<csv::Error> for ResolveError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}
