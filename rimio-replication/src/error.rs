use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReplError>;

#[derive(Error, Debug)]
pub enum ReplError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid range: [{start}, {end})")]
    InvalidRange { start: u64, end: u64 },

    #[error("Interval log corrupted at byte {offset} ({trailing} trailing bytes): {reason}")]
    LogCorruption {
        offset: u64,
        trailing: u64,
        reason: String,
    },

    #[error("Transfer strategy invariant violated: {0}")]
    StrategyInvariantViolation(String),

    #[error("No peer available for object {object_no}")]
    NoPeerAvailable { object_no: u64 },

    #[error("Unsupported replication strategy flags: {0:#x}")]
    UnsupportedStrategy(u32),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
