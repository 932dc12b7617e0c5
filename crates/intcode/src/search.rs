use log::debug;
use ports::Scripted;
use serde::Serialize;

use crate::config::MachineConfig;
use crate::vm::Machine;

pub const DEFAULT_SEARCH_BOUND: i64 = 100;

/// Step budget for each candidate run when the config sets none.
pub const DEFAULT_CANDIDATE_STEPS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NounVerb {
    pub noun: i64,
    pub verb: i64,
}

impl NounVerb {
    pub fn answer(&self) -> i64 {
        100 * self.noun + self.verb
    }
}

/// Finds the first `(noun, verb)` in `[0, bound)²` which, patched into cells
/// 1 and 2, makes the program halt with `target` in cell 0.
///
/// Runs that fault are skipped, and so are runs that exhaust their step
/// budget ([`DEFAULT_CANDIDATE_STEPS`] unless `config` sets one). Programs
/// shorter than three cells have no noun or verb to patch.
pub fn find_noun_verb(program: &[i64], target: i64, bound: i64, config: &MachineConfig) -> Option<NounVerb> {
    if program.len() < 3 {
        return None;
    }
    let config = MachineConfig {
        step_limit: config.step_limit.or(Some(DEFAULT_CANDIDATE_STEPS)),
        ..*config
    };

    let mut patched = program.to_vec();
    for noun in 0..bound {
        for verb in 0..bound {
            patched[1] = noun;
            patched[2] = verb;

            let mut vm = Machine::new(&patched, &config);
            let mut discard: Vec<i64> = Vec::new();
            if let Err(fault) = vm.run(&mut Scripted::default(), &mut discard) {
                debug!("noun {noun}, verb {verb}: {fault}");
                continue;
            }
            if vm.memory().read(0) == Ok(target) {
                return Some(NounVerb { noun, verb });
            }
        }
    }
    None
}
