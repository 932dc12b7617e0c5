use log::{debug, trace, warn};
use ports::{Input, Output};
use serde::Serialize;

use crate::config::MachineConfig;
use crate::error::Fault;
use crate::isa::{Dialect, Instruction, Opcode};
use crate::memory::Memory;
use crate::operand::{resolve_address, resolve_value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    Running,
    Halted,
    Failed(Fault),
}

/// Outcome of a single successful step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmStatus {
    Running,
    Halted,
}

pub struct Machine {
    memory: Memory,
    pc: i64,
    relative_base: i64,
    dialect: Dialect,
    step_limit: Option<u64>,
    steps: u64,
    state: State,
}

impl Machine {
    pub fn new(program: &[i64], config: &MachineConfig) -> Self {
        Self {
            memory: Memory::new(program, config.capacity),
            pc: 0,
            relative_base: 0,
            dialect: config.dialect,
            step_limit: config.step_limit,
            steps: 0,
            state: State::Running,
        }
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn pc(&self) -> i64 {
        self.pc
    }

    pub fn relative_base(&self) -> i64 {
        self.relative_base
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Instructions executed so far, including the final halt.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn into_memory(self) -> Memory {
        self.memory
    }

    /// Executes exactly one instruction. A halted or failed machine keeps
    /// returning its terminal outcome without executing anything.
    pub fn step<I, O>(&mut self, input: &mut I, output: &mut O) -> Result<VmStatus, Fault>
    where
        I: Input + ?Sized,
        O: Output + ?Sized,
    {
        match &self.state {
            State::Halted => return Ok(VmStatus::Halted),
            State::Failed(fault) => return Err(fault.clone()),
            State::Running => {}
        }

        match self.execute(input, output) {
            Ok(status) => {
                self.steps += 1;
                if status == VmStatus::Halted {
                    debug!("halted at pc {} after {} steps", self.pc, self.steps);
                    self.state = State::Halted;
                }
                Ok(status)
            }
            Err(fault) => {
                warn!("fault at pc {}: {fault}", self.pc);
                self.state = State::Failed(fault.clone());
                Err(fault)
            }
        }
    }

    /// Steps until the program halts, faults or runs out of its step budget.
    pub fn run<I, O>(&mut self, input: &mut I, output: &mut O) -> Result<(), Fault>
    where
        I: Input + ?Sized,
        O: Output + ?Sized,
    {
        loop {
            if let Some(limit) = self.step_limit {
                if self.steps >= limit && self.state == State::Running {
                    let fault = Fault::StepLimitExceeded { limit };
                    warn!("{fault}");
                    self.state = State::Failed(fault.clone());
                    return Err(fault);
                }
            }
            if self.step(input, output)? == VmStatus::Halted {
                return Ok(());
            }
        }
    }

    fn value(&self, pc: usize, instruction: &Instruction, parameter: usize) -> Result<i64, Fault> {
        resolve_value(pc, self.relative_base, &self.memory, instruction, parameter)
    }

    fn address(&self, pc: usize, instruction: &Instruction, parameter: usize) -> Result<usize, Fault> {
        resolve_address(pc, self.relative_base, &self.memory, instruction, parameter)
    }

    // Fetch, decode and resolve everything first; memory and registers only
    // change once the instruction can no longer fail.
    fn execute<I, O>(&mut self, input: &mut I, output: &mut O) -> Result<VmStatus, Fault>
    where
        I: Input + ?Sized,
        O: Output + ?Sized,
    {
        // Fetch
        let raw = self.memory.read(self.pc)?;
        let pc = self.pc as usize; // in bounds: the fetch succeeded

        // Decode
        let instruction = Instruction::decode(raw, pc, self.dialect)?;
        trace!("{pc}: {instruction}");

        let next = pc as i64 + instruction.opcode.width();

        // Execute
        match instruction.opcode {
            Opcode::Halt => return Ok(VmStatus::Halted),
            Opcode::NoOp => {}

            Opcode::Add | Opcode::Mul | Opcode::LessThan | Opcode::Equals => {
                let a = self.value(pc, &instruction, 1)?;
                let b = self.value(pc, &instruction, 2)?;
                let dst = self.address(pc, &instruction, 3)?;
                let result = match instruction.opcode {
                    Opcode::Add => a.wrapping_add(b),
                    Opcode::Mul => a.wrapping_mul(b),
                    Opcode::LessThan => i64::from(a < b),
                    _ => i64::from(a == b),
                };
                self.memory.store(dst, result)?;
            }

            Opcode::Input => {
                let dst = self.address(pc, &instruction, 1)?;
                let value = input.next_input()?;
                self.memory.store(dst, value)?;
            }

            Opcode::Output => {
                let value = self.value(pc, &instruction, 1)?;
                output.emit(value);
            }

            Opcode::JumpIfTrue | Opcode::JumpIfFalse => {
                let predicate = self.value(pc, &instruction, 1)?;
                let wanted = instruction.opcode == Opcode::JumpIfTrue;
                if (predicate != 0) == wanted {
                    // Target is checked by the next fetch, not here.
                    self.pc = self.value(pc, &instruction, 2)?;
                    return Ok(VmStatus::Running);
                }
            }

            Opcode::AdjustBase => {
                let delta = self.value(pc, &instruction, 1)?;
                self.relative_base = self.relative_base.wrapping_add(delta);
                debug!("relative base {}", self.relative_base);
            }
        }

        self.pc = next;
        Ok(VmStatus::Running)
    }
}

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub outputs: Vec<i64>,
    pub last_output: Option<i64>,
    /// Cell 0 after the halt.
    pub first_cell: i64,
    pub steps: u64,
}

/// Runs `program` to completion, collecting every output value.
pub fn execute<I>(program: &[i64], config: &MachineConfig, input: &mut I) -> Result<RunSummary, Fault>
where
    I: Input + ?Sized,
{
    let mut machine = Machine::new(program, config);
    let mut outputs: Vec<i64> = Vec::new();
    machine.run(input, &mut outputs)?;
    Ok(RunSummary {
        last_output: outputs.last().copied(),
        first_cell: machine.memory().read(0)?,
        steps: machine.steps(),
        outputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{CapacityPolicy, MAX_CELLS};
    use ports::{PortError, Scripted};
    use proptest::prelude::*;

    fn machine(program: &[i64]) -> Machine {
        Machine::new(program, &MachineConfig::default())
    }

    fn run(program: &[i64], inputs: &[i64]) -> (Machine, Result<(), Fault>, Vec<i64>) {
        let mut vm = machine(program);
        let mut input = Scripted::new(inputs.iter().copied());
        let mut outputs: Vec<i64> = Vec::new();
        let result = vm.run(&mut input, &mut outputs);
        (vm, result, outputs)
    }

    #[test]
    fn add_and_multiply_touch_only_the_destination() {
        let program = [1, 5, 6, 7, 99, 20, 22, 0];
        let (vm, result, _) = run(&program, &[]);
        assert_eq!(result, Ok(()));
        let cells = vm.memory().cells();
        assert_eq!(cells[7], 42);
        for (i, (&before, &after)) in program.iter().zip(cells).enumerate() {
            if i != 7 {
                assert_eq!(before, after, "cell {i} changed");
            }
        }

        let (vm, _, _) = run(&[1102, -6, 7, 5, 99, 0], &[]);
        assert_eq!(vm.memory().read(5), Ok(-42));
    }

    #[test]
    fn arithmetic_wraps() {
        let (vm, result, _) = run(&[1101, i64::MAX, 1, 5, 99, 0], &[]);
        assert_eq!(result, Ok(()));
        assert_eq!(vm.memory().read(5), Ok(i64::MIN));
    }

    #[test]
    fn comparisons_over_boundary_values() {
        let values = [-1, 0, 1, i64::MIN, i64::MAX];
        for &a in &values {
            for &b in &values {
                let (vm, _, _) = run(&[1107, a, b, 5, 99, -9], &[]);
                assert_eq!(vm.memory().read(5), Ok(i64::from(a < b)), "{a} < {b}");
                let (vm, _, _) = run(&[1108, a, b, 5, 99, -9], &[]);
                assert_eq!(vm.memory().read(5), Ok(i64::from(a == b)), "{a} == {b}");
            }
        }
    }

    fn compare(opcode: i64, a: i64, b: i64) -> Result<i64, Fault> {
        let (vm, result, _) = run(&[opcode, a, b, 5, 99, -9], &[]);
        result?;
        vm.memory().read(5)
    }

    proptest! {
        #[test]
        fn less_than_stores_flag(a in any::<i64>(), b in any::<i64>()) {
            prop_assert_eq!(compare(1107, a, b), Ok(i64::from(a < b)));
        }

        #[test]
        fn equals_stores_flag(a in any::<i64>(), b in any::<i64>()) {
            prop_assert_eq!(compare(1108, a, b), Ok(i64::from(a == b)));
            prop_assert_eq!(compare(1108, a, a), Ok(1));
        }
    }

    #[test]
    fn far_write_under_unvalidated_growth_limit_faults() {
        let config = MachineConfig { capacity: CapacityPolicy::Growable { limit: usize::MAX }, ..MachineConfig::default() };
        let mut vm = Machine::new(&[1101, 1, 1, 1 << 62, 99], &config);
        let result = vm.run(&mut Scripted::default(), &mut Vec::<i64>::new());
        assert_eq!(result, Err(Fault::AddressOutOfBounds { address: 1 << 62, capacity: MAX_CELLS }));
        assert_eq!(vm.memory().cells().len(), 5);
    }

    #[test]
    fn input_and_output_flow_through_ports() {
        // Echo the input doubled.
        let (_, result, outputs) = run(&[3, 9, 1002, 9, 2, 9, 4, 9, 99, 0], &[21]);
        assert_eq!(result, Ok(()));
        assert_eq!(outputs, vec![42]);
    }

    #[test]
    fn missing_input_is_fatal() {
        let (vm, result, _) = run(&[3, 0, 99], &[]);
        assert_eq!(result, Err(Fault::Input(PortError::Exhausted)));
        assert_eq!(vm.state(), &State::Failed(Fault::Input(PortError::Exhausted)));
        assert_eq!(vm.memory().read(0), Ok(3));
    }

    #[test]
    fn jump_if_true_falls_through_on_zero() {
        let mut vm = machine(&[1105, 0, 7, 99]);
        let (mut input, mut out) = (Scripted::default(), Vec::<i64>::new());
        assert_eq!(vm.step(&mut input, &mut out), Ok(VmStatus::Running));
        assert_eq!(vm.pc(), 3);
        assert_eq!(vm.step(&mut input, &mut out), Ok(VmStatus::Halted));
    }

    #[test]
    fn jump_if_true_takes_the_branch() {
        let mut vm = machine(&[1105, 5, 7, 99, 0, 0, 0, 99]);
        let (mut input, mut out) = (Scripted::default(), Vec::<i64>::new());
        assert_eq!(vm.step(&mut input, &mut out), Ok(VmStatus::Running));
        assert_eq!(vm.pc(), 7);
    }

    #[test]
    fn jump_if_false_mirrors_jump_if_true() {
        let mut vm = machine(&[1106, 0, 4, 99, 99]);
        let (mut input, mut out) = (Scripted::default(), Vec::<i64>::new());
        vm.step(&mut input, &mut out).unwrap();
        assert_eq!(vm.pc(), 4);

        let mut vm = machine(&[1106, 3, 4, 99, 99]);
        vm.step(&mut input, &mut out).unwrap();
        assert_eq!(vm.pc(), 3);
    }

    #[test]
    fn bad_jump_target_fails_on_next_fetch() {
        let mut vm = machine(&[1105, 1, -1, 99]);
        let (mut input, mut out) = (Scripted::default(), Vec::<i64>::new());
        assert_eq!(vm.step(&mut input, &mut out), Ok(VmStatus::Running));
        assert_eq!(vm.pc(), -1);
        assert_eq!(
            vm.step(&mut input, &mut out),
            Err(Fault::AddressOutOfBounds { address: -1, capacity: 40 })
        );

        let mut vm = machine(&[1105, 1, 40, 99]);
        vm.step(&mut input, &mut out).unwrap();
        assert_eq!(
            vm.step(&mut input, &mut out),
            Err(Fault::AddressOutOfBounds { address: 40, capacity: 40 })
        );
    }

    #[test]
    fn capacity_boundary() {
        let (vm, result, _) = run(&[1101, 1, 1, 49, 99], &[]);
        assert_eq!(result, Ok(()));
        assert_eq!(vm.memory().read(49), Ok(2));

        let (_, result, _) = run(&[1101, 1, 1, 50, 99], &[]);
        assert_eq!(result, Err(Fault::AddressOutOfBounds { address: 50, capacity: 50 }));

        let (_, result, _) = run(&[4, -1, 99], &[]);
        assert_eq!(result, Err(Fault::AddressOutOfBounds { address: -1, capacity: 30 }));
    }

    #[test]
    fn failed_instruction_changes_nothing() {
        let mut vm = machine(&[1, 0, 100, 0, 99]);
        let (mut input, mut out) = (Scripted::default(), Vec::<i64>::new());
        assert!(vm.step(&mut input, &mut out).is_err());
        assert_eq!(vm.memory().read(0), Ok(1));
        assert_eq!(vm.pc(), 0);
        assert_eq!(vm.steps(), 0);
        // Input is not consumed when the destination is invalid.
        let mut vm = machine(&[103, 0, 99]);
        let mut input = Scripted::new([5]);
        assert_eq!(
            vm.step(&mut input, &mut out),
            Err(Fault::ImmediateWrite { pc: 0, parameter: 1 })
        );
        assert_eq!(input.remaining(), 1);
    }

    #[test]
    fn terminal_states_are_sticky() {
        let mut vm = machine(&[42]);
        let (mut input, mut out) = (Scripted::default(), Vec::<i64>::new());
        let fault = Fault::UnknownOpcode { pc: 0, opcode: 42 };
        assert_eq!(vm.step(&mut input, &mut out), Err(fault.clone()));
        assert_eq!(vm.step(&mut input, &mut out), Err(fault));

        let mut vm = machine(&[99]);
        assert_eq!(vm.step(&mut input, &mut out), Ok(VmStatus::Halted));
        assert_eq!(vm.step(&mut input, &mut out), Ok(VmStatus::Halted));
        assert_eq!(vm.steps(), 1);
    }

    #[test]
    fn relative_base_accumulates() {
        let (vm, result, outputs) = run(&[109, 5, 109, -2, 204, 0, 99], &[]);
        assert_eq!(result, Ok(()));
        assert_eq!(vm.relative_base(), 3);
        // Relative 0 with base 3 reads cell 3, which holds -2.
        assert_eq!(outputs, vec![-2]);
    }

    #[test]
    fn step_limit_stops_infinite_loops() {
        let config = MachineConfig { step_limit: Some(10), ..MachineConfig::default() };
        let mut vm = Machine::new(&[1105, 1, 0], &config);
        let result = vm.run(&mut Scripted::default(), &mut Vec::<i64>::new());
        assert_eq!(result, Err(Fault::StepLimitExceeded { limit: 10 }));
        assert_eq!(vm.steps(), 10);

        // A program that halts exactly on its last allowed step succeeds.
        let config = MachineConfig { step_limit: Some(2), ..MachineConfig::default() };
        let mut vm = Machine::new(&[1, 0, 0, 0, 99], &config);
        assert_eq!(vm.run(&mut Scripted::default(), &mut Vec::<i64>::new()), Ok(()));
    }

    #[test]
    fn no_op_advances_one_cell() {
        let (vm, result, _) = run(&[0, 0, 99], &[]);
        assert_eq!(result, Ok(()));
        assert_eq!(vm.pc(), 2);
        assert_eq!(vm.steps(), 3);
    }

    #[test]
    fn execute_summarises_the_run() {
        let summary = execute(&[104, 7, 104, 8, 99], &MachineConfig::default(), &mut Scripted::default()).unwrap();
        assert_eq!(
            summary,
            RunSummary { outputs: vec![7, 8], last_output: Some(8), first_cell: 104, steps: 3 }
        );
    }
}
