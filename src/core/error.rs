//! Error types for the Bluefruit DFU tool

use std::time::Duration;

use thiserror::Error;

use super::types::Command;

/// Result type for collaborator (backend) operations
pub type DfuResult<T> = Result<T, DfuError>;

/// Result type for dispatcher operations
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors raised while tokenizing arguments in strict mode
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Conflicting commands: {first} and {second}")]
    ConflictingCommands { first: Command, second: Command },
}

/// Radio availability problems reported before any command runs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreflightError {
    #[error("Bluetooth is powered off")]
    PoweredOff,

    #[error("Bluetooth LE is not supported: {0}")]
    Unsupported(String),

    #[error("Bluetooth access is not authorized")]
    Unauthorized,

    #[error("Bluetooth adapter unavailable: {0}")]
    Unavailable(String),
}

/// Errors reading and decoding firmware files
#[derive(Error, Debug)]
pub enum FirmwareError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid hex record on line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },

    #[error("Hex file contains no data")]
    Empty,

    #[error("Image spans {0} bytes, more than a peripheral can hold")]
    TooLarge(u32),
}

/// Errors raised by the radio/DFU collaborator
#[derive(Error, Debug)]
pub enum DfuError {
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] bluer::Error),

    #[error("Adapter not ready, preflight check has not run")]
    NotReady,

    #[error("Invalid peripheral address: {0}")]
    InvalidAddress(String),

    #[error("Peripheral {0} not found")]
    DeviceNotFound(String),

    #[error("Peripheral {0} does not expose the DFU service")]
    ServiceNotFound(String),

    #[error("DFU characteristic {0} not found")]
    CharacteristicNotFound(uuid::Uuid),

    #[error("DFU protocol error: {0}")]
    Protocol(String),

    #[error("Notification stream closed")]
    NotificationsClosed,

    #[error("Firmware error: {0}")]
    Firmware(#[from] FirmwareError),
}

/// Errors from waiting on the worker task
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BarrierError {
    #[error("Operation did not complete within {0:?}")]
    TimedOut(Duration),

    #[error("Worker task ended without signalling completion")]
    WorkerLost,
}

/// Fatal conditions that terminate the process with a failure status
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Preflight(#[from] PreflightError),

    #[error(".hex file not defined")]
    MissingHexFile,

    #[error("Peripheral UUID invalid")]
    InvalidPeripheral,

    #[error("{0}")]
    Barrier(#[from] BarrierError),

    #[error("DFU failed: {0}")]
    Update(#[source] DfuError),

    #[error("{0}")]
    Backend(#[from] DfuError),

    #[error("Input error: {0}")]
    Input(#[from] std::io::Error),
}
