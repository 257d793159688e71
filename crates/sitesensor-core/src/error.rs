use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Recipe {field} is required")]
    Validation { field: &'static str },

    #[error("{}", describe_missing(.blank))]
    NotARecipe { blank: bool },

    #[error("Recipe block is damaged: {0}")]
    CorruptBlock(String),

    #[error("State store error: {0}")]
    Store(String),

    #[error("Host did not become ready within {0} seconds")]
    NotReady(u64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    /// Character offset into the serialized input, when the error carries one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            CoreError::Serialization(e) if e.line() == 1 && e.column() > 0 => Some(e.column() - 1),
            _ => None,
        }
    }
}

fn describe_missing(blank: &bool) -> &'static str {
    if *blank {
        "No recipe text was given"
    } else {
        "Text does not contain a SiteSensor recipe"
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
