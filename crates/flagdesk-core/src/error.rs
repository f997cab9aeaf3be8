use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeskError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("template record not found: {0}")]
    TemplateNotFound(String),

    #[error("record '{0}' changed while setting its flag; try again")]
    FlagConflict(String),

    #[error("invalid block list JSON: {0}")]
    MalformedImport(String),

    #[error("enter a valid URL or domain: '{0}'")]
    InvalidUrl(String),

    #[error("that URL is already in the block list: {0}")]
    DuplicateUrl(String),

    #[error("unknown block list category: {0}")]
    UnknownCategory(String),

    #[error("invalid action '{0}': must be block, warn, or accept")]
    InvalidAction(String),

    #[error("invalid record id '{0}': must not be empty or contain '/'")]
    InvalidRecordId(String),

    #[error("invalid refresh interval {0}s: must be between 2 and 3600 seconds")]
    InvalidInterval(u64),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DeskError>;
