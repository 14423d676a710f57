use thiserror::Error;

/// Errors raised while converting entities to and from their wire shape.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The JSON document did not match the expected shape of a model.
    #[error("Invalid {model} JSON: {source}")]
    Json {
        model: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A field was present but its value could not be interpreted.
    #[error("Invalid {model}.{field}: {reason}")]
    Field {
        model: &'static str,
        field: &'static str,
        reason: String,
    },

    /// A duration string in none of the accepted formats.
    #[error("Invalid duration: {0:?}")]
    Duration(String),

    /// Chrono parsing error.
    #[error("Timestamp parse error: {0}")]
    ChronoParse(#[from] chrono::ParseError),
}

pub type Result<T> = std::result::Result<T, ModelError>;
