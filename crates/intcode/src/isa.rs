use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Fault};

/// Highest parameter count of any opcode.
pub const MAX_PARAMS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    // --- Core Execution ---
    NoOp = 0,
    Halt = 99,

    // --- Arithmetic ---
    Add = 1, // dst = a + b
    Mul = 2, // dst = a * b

    // --- I/O ---
    Input = 3,  // dst = next input
    Output = 4, // emit a

    // --- Control Flow ---
    JumpIfTrue = 5,  // a != 0 => pc = b
    JumpIfFalse = 6, // a == 0 => pc = b

    // --- Comparison ---
    LessThan = 7, // dst = a < b
    Equals = 8,   // dst = a == b

    // --- Registers ---
    AdjustBase = 9, // relative base += a
}

impl Opcode {
    pub fn from_code(code: i64) -> Option<Self> {
        let op = match code {
            0 => Self::NoOp,
            1 => Self::Add,
            2 => Self::Mul,
            3 => Self::Input,
            4 => Self::Output,
            5 => Self::JumpIfTrue,
            6 => Self::JumpIfFalse,
            7 => Self::LessThan,
            8 => Self::Equals,
            9 => Self::AdjustBase,
            99 => Self::Halt,
            _ => return None,
        };
        Some(op)
    }

    pub const fn code(self) -> i64 {
        self as i64
    }

    pub const fn param_count(self) -> usize {
        match self {
            Self::NoOp | Self::Halt => 0,
            Self::Input | Self::Output | Self::AdjustBase => 1,
            Self::JumpIfTrue | Self::JumpIfFalse => 2,
            Self::Add | Self::Mul | Self::LessThan | Self::Equals => 3,
        }
    }

    /// Cells occupied by the instruction word plus its parameters.
    pub const fn width(self) -> i64 {
        self.param_count() as i64 + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ParameterMode {
    Position = 0,
    Immediate = 1,
    Relative = 2,
}

impl ParameterMode {
    pub fn from_digit(digit: i64) -> Option<Self> {
        match digit {
            0 => Some(Self::Position),
            1 => Some(Self::Immediate),
            2 => Some(Self::Relative),
            _ => None,
        }
    }
}

/// The subset of the instruction set a machine accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Add, multiply and halt over position-mode operands.
    Basic,
    /// Everything except the relative base: opcodes 0-8 and 99, modes 0-1.
    Extended,
    #[default]
    Full,
}

impl Dialect {
    pub fn supports_opcode(self, op: Opcode) -> bool {
        match self {
            Self::Basic => matches!(op, Opcode::Add | Opcode::Mul | Opcode::Halt),
            Self::Extended => op != Opcode::AdjustBase,
            Self::Full => true,
        }
    }

    pub fn supports_mode(self, mode: ParameterMode) -> bool {
        match self {
            Self::Basic => mode == ParameterMode::Position,
            Self::Extended => mode != ParameterMode::Relative,
            Self::Full => true,
        }
    }
}

impl FromStr for Dialect {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "extended" => Ok(Self::Extended),
            "full" => Ok(Self::Full),
            other => Err(ConfigError::UnknownDialect(other.to_string())),
        }
    }
}

/// Mode digit of parameter `parameter` (1-indexed): `raw / 10^(parameter+1) mod 10`.
pub fn mode_digit(raw: i64, parameter: usize) -> i64 {
    match 10i64.checked_pow(parameter as u32 + 1) {
        Some(place) => (raw / place) % 10,
        None => 0,
    }
}

/// A decoded instruction word. Modes are decoded for every parameter the
/// opcode consumes, so a bad digit is reported before anything executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub raw: i64,
    pub opcode: Opcode,
    modes: [ParameterMode; MAX_PARAMS],
}

impl Instruction {
    pub fn decode(raw: i64, pc: usize, dialect: Dialect) -> Result<Self, Fault> {
        let code = raw % 100;
        let opcode = Opcode::from_code(code)
            .filter(|op| dialect.supports_opcode(*op))
            .ok_or(Fault::UnknownOpcode { pc, opcode: code })?;

        let mut modes = [ParameterMode::Position; MAX_PARAMS];
        for parameter in 1..=opcode.param_count() {
            let digit = mode_digit(raw, parameter);
            modes[parameter - 1] = ParameterMode::from_digit(digit)
                .filter(|mode| dialect.supports_mode(*mode))
                .ok_or(Fault::InvalidMode { pc, parameter, digit })?;
        }

        Ok(Self { raw, opcode, modes })
    }

    /// Mode of parameter `parameter` (1-indexed). Parameters past the
    /// opcode's count read as position mode.
    pub fn mode(&self, parameter: usize) -> ParameterMode {
        parameter
            .checked_sub(1)
            .and_then(|i| self.modes.get(i))
            .copied()
            .unwrap_or(ParameterMode::Position)
    }
}

/// `raw (opcode)`, the form used in execution traces.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.raw, self.opcode.code())
    }
}
