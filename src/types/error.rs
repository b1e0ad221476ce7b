use thiserror::Error;

use crate::parse::ParseError;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("missing rule group '{rule}' listed in {chain}")]
    MissingRule { chain: &'static str, rule: String },

    #[error("rule '{rule}' is listed more than once in {chain}")]
    DuplicateRule { chain: &'static str, rule: String },

    #[error("invalid '{key}' in rule '{rule}': '{value}' is not a recognised result")]
    InvalidResult {
        rule: String,
        key: &'static str,
        value: String,
    },

    #[error(transparent)]
    Value(#[from] ParseError),
}
