use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("classifier is not trained")]
    NotTrained,
    #[error("malformed features: {0}")]
    MalformedFeatures(String),
    #[error("invalid model: {0}")]
    InvalidModel(String),
    #[error("invalid scaler: {0}")]
    InvalidScaler(String),
    #[error("degenerate dataset: {0}")]
    DegenerateDataset(String),
}

impl ModelError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type ModelResult<T> = Result<T, ModelError>;
