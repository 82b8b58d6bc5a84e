use thiserror::Error;

#[derive(Error, Debug)]
pub enum KakuhoError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Broken reference: {0}")]
    BrokenReference(String),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid QR code: {0}")]
    InvalidQrCode(String),

    #[error("Sold out: {0}")]
    SoldOut(String),

    #[error("Deletion blocked: {0}")]
    DeleteBlocked(String),

    #[error("Ticket type change failed, original reservation restored as #{restored_id}: {source}")]
    ChangeRolledBack {
        restored_id: i64,
        #[source]
        source: Box<KakuhoError>,
    },

    #[error("Reservation #{reservation_id} was deleted and could not be restored: {source}")]
    ReservationLost {
        reservation_id: i64,
        #[source]
        source: Box<KakuhoError>,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl KakuhoError {
    /// True for errors raised by client-side checks before any request is sent.
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            KakuhoError::Validation(_)
                | KakuhoError::InvalidQrCode(_)
                | KakuhoError::SoldOut(_)
                | KakuhoError::DeleteBlocked(_)
                | KakuhoError::NotAuthenticated
        )
    }
}

pub type Result<T> = std::result::Result<T, KakuhoError>;
