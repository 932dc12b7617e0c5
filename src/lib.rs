use wasm_bindgen::prelude::*;

pub use intcode;
pub use ports;

use intcode::{execute, program, MachineConfig};
use ports::Scripted;

pub const SYSTEM_STATUS: &str = r#"
================================================================================
INTCODE // DETERMINISTIC EXECUTION ENVIRONMENT
================================================================================
[ ARCHITECTURE ]
Fixed-capacity integer memory + three addressing modes + injected I/O ports.

[ BUILD LOG ]
[x] Memory, decoder and operand resolver.
[x] Execution engine with single-step and bounded runs.
[x] CLI shell, wasm shell, conformance report.

SELF TEST:
"#;

struct Check {
    name: &'static str,
    program: &'static str,
    inputs: &'static [i64],
    expect: Expect,
}

enum Expect {
    FirstCell(i64),
    Outputs(&'static [i64]),
}

const CHECKS: &[Check] = &[
    Check {
        name: "POSITION_MODE_ARITHMETIC",
        program: "1,9,10,3,2,3,11,0,99,30,40,50",
        inputs: &[],
        expect: Expect::FirstCell(3500),
    },
    Check {
        name: "INPUT_ECHO",
        program: "3,0,4,0,99",
        inputs: &[42],
        expect: Expect::Outputs(&[42]),
    },
    Check {
        name: "RELATIVE_MODE_QUINE",
        program: "109,1,204,-1,1001,100,1,100,1008,100,16,101,1006,101,0,99",
        inputs: &[],
        expect: Expect::Outputs(&[109, 1, 204, -1, 1001, 100, 1, 100, 1008, 100, 16, 101, 1006, 101, 0, 99]),
    },
];

fn check(c: &Check) -> Result<(), String> {
    let cells = program::parse(c.program).map_err(|e| e.to_string())?;
    let summary = execute(&cells, &MachineConfig::default(), &mut Scripted::new(c.inputs.iter().copied()))
        .map_err(|e| e.to_string())?;
    match c.expect {
        Expect::FirstCell(v) if summary.first_cell == v => Ok(()),
        Expect::FirstCell(_) => Err(format!("Val: {}", summary.first_cell)),
        Expect::Outputs(out) if summary.outputs == out => Ok(()),
        Expect::Outputs(_) => Err(format!("Out: {:?}", summary.outputs)),
    }
}

pub fn run_suite() -> String {
    let mut report = String::from(SYSTEM_STATUS);
    for c in CHECKS {
        report.push_str(&format!("TEST: {} ... ", c.name));
        match check(c) {
            Ok(()) => report.push_str("PASS\n"),
            Err(e) => report.push_str(&format!("FAIL ({})\n", e)),
        }
    }
    report
}

#[wasm_bindgen]
pub fn init_shell() -> String { run_suite() }
