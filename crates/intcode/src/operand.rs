//! Operand resolution.
//!
//! Sources go through [`resolve_value`], destinations through
//! [`resolve_address`]. Neither touches memory beyond reading it.

use crate::error::Fault;
use crate::isa::{Instruction, ParameterMode};
use crate::memory::Memory;

/// Raw operand stored right after the instruction word.
fn operand(pc: usize, memory: &Memory, parameter: usize) -> Result<i64, Fault> {
    let at = (pc as i64).saturating_add(parameter as i64);
    memory.read(at)
}

/// Effective value of a source parameter.
pub fn resolve_value(
    pc: usize,
    relative_base: i64,
    memory: &Memory,
    instruction: &Instruction,
    parameter: usize,
) -> Result<i64, Fault> {
    let raw = operand(pc, memory, parameter)?;
    match instruction.mode(parameter) {
        ParameterMode::Immediate => Ok(raw),
        ParameterMode::Position => memory.read(raw),
        ParameterMode::Relative => memory.read(raw.saturating_add(relative_base)),
    }
}

/// Validated memory index of a destination parameter.
pub fn resolve_address(
    pc: usize,
    relative_base: i64,
    memory: &Memory,
    instruction: &Instruction,
    parameter: usize,
) -> Result<usize, Fault> {
    let raw = operand(pc, memory, parameter)?;
    match instruction.mode(parameter) {
        ParameterMode::Position => memory.check(raw),
        ParameterMode::Relative => memory.check(raw.saturating_add(relative_base)),
        ParameterMode::Immediate => Err(Fault::ImmediateWrite { pc, parameter }),
    }
}
