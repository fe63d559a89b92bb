use thiserror::Error;

/// Failures raised by the data layer.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("unknown collection `{0}`")]
    UnknownCollection(String),

    #[error("document in `{collection}` is not an object")]
    NotAnObject { collection: String },

    #[error("failed to map document in `{collection}`: {source}")]
    Mapping {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl DbError {
    pub(crate) fn mapping(collection: &str, source: serde_json::Error) -> Self {
        Self::Mapping {
            collection: collection.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
