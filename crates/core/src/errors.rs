use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl ApplicationError {
    /// Stable short label used as a structured log field.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Persistence(_) => "persistence",
        }
    }
}
