use thiserror::Error;

#[derive(Error, Debug)]
pub enum TellerError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Category catalog inconsistent: insert of '{0}' hit a uniqueness conflict but no row exists")]
    CatalogInconsistent(String),

    #[error("Event log error: {0}")]
    Log(String),
}

pub type Result<T> = std::result::Result<T, TellerError>;
