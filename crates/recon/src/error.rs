use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (threshold out of range, empty fragment, etc.).
    ConfigValidation(String),
    /// A stage needs a column the table does not have.
    Schema { stage: String, column: String },
    /// No usable reference partition was supplied.
    Selection(String),
    /// Reference table maps one name to two different funder ids.
    DuplicateReference { name: String, first: String, second: String },
    /// IO error (file read, write, decode).
    Io(String),
}

impl ReconError {
    pub fn schema(stage: &str, column: &str) -> Self {
        Self::Schema {
            stage: stage.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Schema { stage, column } => {
                write!(f, "stage '{stage}': missing required column '{column}'")
            }
            Self::Selection(msg) => write!(f, "reference selection error: {msg}"),
            Self::DuplicateReference { name, first, second } => write!(
                f,
                "reference name '{name}' is listed twice with different ids ('{first}' and '{second}')"
            ),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
