use colored::*;
use intcode::{execute, program, CapacityPolicy, Dialect, Fault, Machine, MachineConfig, VmStatus};
use ports::Scripted;

const BANNER: &str = r#"
================================================================================
INTCODE // CONFORMANCE REPORT
================================================================================

[ COMPONENTS ]
--------------------------------------------------------------------------------
[x] Memory            fixed capacity, 10x program length by default
[x] Operand resolver  position / immediate / relative
[x] Decoder           opcodes 0-9, 99; dialects basic, extended, full
[x] Engine            single-step + run, step limit
[x] Ports             scripted, console, line sink

================================================================================
SCENARIOS
================================================================================
"#;

const QUINE: &str = "109,1,204,-1,1001,100,1,100,1008,100,16,101,1006,101,0,99";

fn main() {
    println!("{}", BANNER);
    let mut passed = 0;
    let mut failed = 0;

    run_test("GRAVITY_ASSIST_3500", test_gravity_assist, &mut passed, &mut failed);
    run_test("SIXTEEN_DIGIT_PRODUCT", test_large_product, &mut passed, &mut failed);
    run_test("LARGE_IMMEDIATE_OUTPUT", test_large_immediate, &mut passed, &mut failed);
    run_test("RELATIVE_MODE_QUINE", test_quine, &mut passed, &mut failed);
    run_test("CAPACITY_BOUNDARY", test_capacity_boundary, &mut passed, &mut failed);
    run_test("JUMP_TARGET_CHECKED_ON_FETCH", test_jump_target, &mut passed, &mut failed);
    run_test("EXTENDED_DIALECT_REJECTS_OP9", test_extended_dialect, &mut passed, &mut failed);

    println!("\n--------------------------------------------------------------------------------");
    println!("{} passed, {} failed", passed, failed);
    if failed == 0 {
        println!("{}", "ALL SYSTEMS NOMINAL.".green().bold());
    } else {
        std::process::exit(1);
    }
}

// --- TEST INFRASTRUCTURE ---

fn run_test<F>(name: &str, test_fn: F, passed: &mut i32, failed: &mut i32)
where F: Fn() -> Result<(), String> {
    print!("TEST: {:<30} ... ", name);
    match test_fn() {
        Ok(_) => { println!("{}", "PASS".green()); *passed += 1; }
        Err(e) => { println!("{}", "FAIL".red()); println!("  -> {}", e); *failed += 1; }
    }
}

fn outputs(text: &str, config: &MachineConfig) -> Result<Vec<i64>, String> {
    let cells = program::parse(text).map_err(|e| e.to_string())?;
    let summary = execute(&cells, config, &mut Scripted::default()).map_err(|e| e.to_string())?;
    Ok(summary.outputs)
}

fn expect_fault(text: &str, config: &MachineConfig, expected: Fault) -> Result<(), String> {
    let cells = program::parse(text).map_err(|e| e.to_string())?;
    match execute(&cells, config, &mut Scripted::default()) {
        Err(fault) if fault == expected => Ok(()),
        Err(fault) => Err(format!("Expected {expected}, got {fault}")),
        Ok(summary) => Err(format!("Expected {expected}, halted with {:?}", summary.outputs)),
    }
}

// --- SCENARIOS ---

fn test_gravity_assist() -> Result<(), String> {
    let cells = program::parse("1,9,10,3,2,3,11,0,99,30,40,50").map_err(|e| e.to_string())?;
    let summary = execute(&cells, &MachineConfig::default(), &mut Scripted::default()).map_err(|e| e.to_string())?;
    if summary.first_cell != 3500 { return Err(format!("cell 0 = {}", summary.first_cell)); }
    Ok(())
}

fn test_large_product() -> Result<(), String> {
    let out = outputs("1102,34915192,34915192,7,4,7,99,0", &MachineConfig::default())?;
    match out.as_slice() {
        [v] if v.to_string().len() == 16 && *v == 34915192 * 34915192 => Ok(()),
        other => Err(format!("Unexpected output {other:?}")),
    }
}

fn test_large_immediate() -> Result<(), String> {
    let out = outputs("104,1125899906842624,99", &MachineConfig::default())?;
    if out != [1125899906842624] { return Err(format!("Unexpected output {out:?}")); }
    Ok(())
}

fn test_quine() -> Result<(), String> {
    let expected = program::parse(QUINE).map_err(|e| e.to_string())?;
    let out = outputs(QUINE, &MachineConfig::default())?;
    if out != expected { return Err(format!("Quine printed {out:?}")); }
    Ok(())
}

fn test_capacity_boundary() -> Result<(), String> {
    // Five cells: capacity 50, so 49 is the last writable address.
    outputs("1101,1,1,49,99", &MachineConfig::default())?;
    expect_fault(
        "1101,1,1,50,99",
        &MachineConfig::default(),
        Fault::AddressOutOfBounds { address: 50, capacity: 50 },
    )?;
    let fixed = MachineConfig { capacity: CapacityPolicy::Fixed { cells: 64 }, ..MachineConfig::default() };
    outputs("1101,1,1,63,99", &fixed)?;
    Ok(())
}

fn test_jump_target() -> Result<(), String> {
    let mut vm = Machine::new(&[1105, 1, -1, 99], &MachineConfig::default());
    let (mut input, mut out) = (Scripted::default(), Vec::<i64>::new());
    if vm.step(&mut input, &mut out) != Ok(VmStatus::Running) { return Err("Jump itself failed".into()); }
    match vm.step(&mut input, &mut out) {
        Err(Fault::AddressOutOfBounds { address: -1, .. }) => Ok(()),
        other => Err(format!("Next fetch gave {other:?}")),
    }
}

fn test_extended_dialect() -> Result<(), String> {
    let config = MachineConfig { dialect: Dialect::Extended, ..MachineConfig::default() };
    expect_fault(QUINE, &config, Fault::UnknownOpcode { pc: 0, opcode: 9 })
}
