use std::error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    InvalidChoice {
        field: &'static str,
        value: std::string::String,
    },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelError::InvalidChoice { field, value } => {
                write!(f, "\"{}\" is not a valid choice for {}", value, field)
            }
        }
    }
}

impl error::Error for ModelError {}
