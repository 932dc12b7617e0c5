mod options;

use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::process;

use colored::*;
use intcode::search::find_noun_verb;
use intcode::{program, Fault, Machine, MachineConfig, RunSummary};
use log::{LevelFilter, info};
use ports::{Console, Input, LineSink, Scripted};

use options::{Command, Options, USAGE};

fn print_usage(program: &str) {
    eprintln!("{}", USAGE.replace("{program}", program));
}

fn init_logging(trace: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if trace {
        builder.filter_level(LevelFilter::Trace);
    }
    builder.format_timestamp(None).init();
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let binary = args.first().map(String::as_str).unwrap_or("intcode");

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage(binary);
        process::exit(0);
    }

    let options = match Options::parse(args.get(1..).unwrap_or_default()) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}\n");
            print_usage(binary);
            process::exit(2);
        }
    };
    init_logging(options.trace);

    let config = match options.machine_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            process::exit(2);
        }
    };

    let stdin = io::stdin();
    let mut stdin = stdin.lock();
    let cells = match load_program(&options.program, &mut stdin) {
        Ok(cells) => cells,
        Err(message) => {
            eprintln!("{message}");
            process::exit(2);
        }
    };
    info!("loaded {} cells, capacity policy {:?}", cells.len(), config.capacity);

    let code = match options.command {
        Command::Run => match &options.inputs {
            Some(values) => run(
                &cells,
                &config,
                &options,
                &mut Scripted::new(values.iter().copied()),
                io::stdout().lock(),
            ),
            None => run(&cells, &config, &options, &mut Console::new(stdin, io::stderr()), io::stdout().lock()),
        },
        Command::Search { target, bound } => search(&cells, &config, target, bound),
    };
    process::exit(code);
}

fn load_program(path: &str, stdin: &mut impl BufRead) -> Result<Vec<i64>, String> {
    let text = if path == "-" {
        let mut line = String::new();
        stdin
            .read_line(&mut line)
            .map_err(|e| format!("Failed to read program from stdin: {e}"))?;
        line
    } else {
        fs::read_to_string(path).map_err(|e| format!("Failed to read {path}: {e}"))?
    };
    program::parse(&text).map_err(|e| format!("Invalid program: {e}"))
}

fn crash(fault: &Fault) -> i32 {
    eprintln!("{} {}", "VM CRASH:".red().bold(), fault);
    1
}

fn run<I: Input, W: Write>(cells: &[i64], config: &MachineConfig, options: &Options, input: &mut I, out: W) -> i32 {
    if options.json {
        return match intcode::execute(cells, config, input) {
            Ok(summary) => print_json(&summary),
            Err(fault) => crash(&fault),
        };
    }

    let mut vm = Machine::new(cells, config);
    let mut sink = LineSink::new(out);
    let result = vm.run(input, &mut sink);
    let last = sink.last();
    let mut out = match sink.finish() {
        Ok(out) => out,
        Err(e) => {
            eprintln!("Failed to write output: {e}");
            return match result {
                Ok(()) => 1,
                Err(fault) => crash(&fault),
            };
        }
    };

    match result {
        Ok(()) => {
            let report = match (last, vm.memory().read(0)) {
                (Some(value), _) => writeln!(out, "Result: {value}"),
                (None, Ok(first)) => writeln!(out, "cell[0] = {first}"),
                (None, Err(_)) => Ok(()),
            };
            info!("halted after {} steps", vm.steps());
            match report {
                Ok(()) => 0,
                Err(e) => {
                    eprintln!("Failed to write output: {e}");
                    1
                }
            }
        }
        Err(fault) => crash(&fault),
    }
}

fn print_json(summary: &RunSummary) -> i32 {
    match serde_json::to_string_pretty(summary) {
        Ok(json) => {
            println!("{json}");
            0
        }
        Err(e) => {
            eprintln!("Failed to encode summary: {e}");
            1
        }
    }
}

fn search(cells: &[i64], config: &MachineConfig, target: i64, bound: i64) -> i32 {
    match find_noun_verb(cells, target, bound, config) {
        Some(found) => {
            println!("noun = {}, verb = {}", found.noun, found.verb);
            println!("100 * noun + verb = {}", found.answer());
            0
        }
        None => {
            println!("search space exhausted");
            1
        }
    }
}
