use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid status '{given}', valid values: {valid}")]
    InvalidStatus { given: String, valid: String },

    #[error("required field '{0}' is missing or empty")]
    MissingField(&'static str),

    #[error("field '{field}' is out of range: {detail}")]
    OutOfRange { field: &'static str, detail: String },
}
