//! Intcode virtual machine.
//!
//! Programs are flat lists of signed 64-bit cells. A [`Machine`] owns its
//! memory, program counter and relative base, and talks to the outside world
//! only through the [`ports::Input`] and [`ports::Output`] traits.
//!
//! ```
//! use intcode::{program, Machine, MachineConfig};
//! use ports::Scripted;
//!
//! let cells = program::parse("1,9,10,3,2,3,11,0,99,30,40,50")?;
//! let mut vm = Machine::new(&cells, &MachineConfig::default());
//! vm.run(&mut Scripted::default(), &mut Vec::<i64>::new())?;
//! assert_eq!(vm.memory().read(0), Ok(3500));
//! # Ok::<(), intcode::IntcodeError>(())
//! ```

pub mod config;
pub mod error;
pub mod isa;
pub mod memory;
pub mod operand;
pub mod program;
pub mod search;
pub mod vm;

pub use config::MachineConfig;
pub use error::{ConfigError, Fault, IntcodeError, ParseError};
pub use isa::{Dialect, Instruction, Opcode, ParameterMode};
pub use memory::{CapacityPolicy, Memory};
pub use vm::{execute, Machine, RunSummary, State, VmStatus};
