use ports::PortError;
use thiserror::Error;

/// A fatal condition raised while executing. The machine stops at the
/// instruction that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("unknown opcode {opcode} at pc {pc}")]
    UnknownOpcode { pc: usize, opcode: i64 },

    #[error("invalid mode digit {digit} for parameter {parameter} at pc {pc}")]
    InvalidMode { pc: usize, parameter: usize, digit: i64 },

    #[error("address {address} out of bounds (capacity {capacity})")]
    AddressOutOfBounds { address: i64, capacity: usize },

    #[error("parameter {parameter} at pc {pc} is an immediate-mode write target")]
    ImmediateWrite { pc: usize, parameter: usize },

    #[error("input failed: {0}")]
    Input(#[from] PortError),

    #[error("cannot allocate {cells} memory cells")]
    OutOfMemory { cells: usize },

    #[error("step limit of {limit} instructions exceeded")]
    StepLimitExceeded { limit: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("program text is empty")]
    Empty,

    #[error("cell {index} is not a signed 64-bit integer: {token:?}")]
    InvalidCell { index: usize, token: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {message}")]
    Io { path: String, message: String },

    #[error("malformed config: {0}")]
    Json(String),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("unknown dialect {0:?} (expected basic, extended or full)")]
    UnknownDialect(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntcodeError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fault(#[from] Fault),
}
