use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("invalid date range: {from} is after {to}")]
    InvalidRange { from: String, to: String },
    #[error("invalid time '{0}' (expected HH:MM)")]
    InvalidTime(String),
    #[error("unknown time slot '{0}'")]
    UnknownTimeSlot(String),
    #[error("{0}")]
    Validation(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
