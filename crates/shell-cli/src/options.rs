use intcode::{program, CapacityPolicy, Dialect, IntcodeError, MachineConfig};

pub const USAGE: &str = "\
Usage:
  {program} run <program-file|-> [OPTIONS]
  {program} search <program-file|-> --target <N> [--max <N>] [OPTIONS]

Options:
  --input <v1,v2,...>   Feed these values to input instructions instead of stdin
  --config <file.json>  Load machine settings from a JSON file
  --scale <N>           Memory is N times the program length (default 10)
  --capacity <N>        Memory is exactly N cells
  --growable <N>        Memory grows on write, up to N cells
  --dialect <name>      basic, extended or full (default full)
  --max-steps <N>       Fail after N instructions
  --trace               Log every executed instruction
  --json                Print the run summary as JSON

A program path of '-' reads the program from the first line of stdin.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run,
    Search { target: i64, bound: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub command: Command,
    pub program: String,
    pub inputs: Option<Vec<i64>>,
    pub config_path: Option<String>,
    pub capacity: Option<CapacityPolicy>,
    pub dialect: Option<Dialect>,
    pub step_limit: Option<u64>,
    pub trace: bool,
    pub json: bool,
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
    args.get(i).map(String::as_str).ok_or_else(|| format!("{flag} requires an argument"))
}

fn number<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> Result<T, String> {
    let raw = value(args, i, flag)?;
    raw.parse().map_err(|_| format!("Invalid value for {flag}: {raw}"))
}

impl Options {
    /// Parses everything after the binary name.
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let command = match args.first().map(String::as_str) {
            Some("run") => Command::Run,
            Some("search") => Command::Search { target: 0, bound: intcode::search::DEFAULT_SEARCH_BOUND },
            Some(other) => return Err(format!("Unknown command: {other}")),
            None => return Err("Missing command".into()),
        };
        let program = value(args, 1, "command")
            .map_err(|_| "Missing program file".to_string())?
            .to_string();

        let mut options = Self {
            command,
            program,
            inputs: None,
            config_path: None,
            capacity: None,
            dialect: None,
            step_limit: None,
            trace: false,
            json: false,
        };
        let mut target = None;

        let mut i = 2;
        while i < args.len() {
            let flag = args[i].as_str();
            match flag {
                "--input" => {
                    let raw = value(args, i + 1, flag)?;
                    let values = program::parse(raw).map_err(|e| format!("Invalid --input: {e}"))?;
                    options.inputs = Some(values);
                    i += 2;
                }
                "--config" => {
                    options.config_path = Some(value(args, i + 1, flag)?.to_string());
                    i += 2;
                }
                "--scale" => {
                    options.capacity = Some(CapacityPolicy::Scaled { factor: number(args, i + 1, flag)? });
                    i += 2;
                }
                "--capacity" => {
                    options.capacity = Some(CapacityPolicy::Fixed { cells: number(args, i + 1, flag)? });
                    i += 2;
                }
                "--growable" => {
                    options.capacity = Some(CapacityPolicy::Growable { limit: number(args, i + 1, flag)? });
                    i += 2;
                }
                "--dialect" => {
                    let raw = value(args, i + 1, flag)?;
                    options.dialect = Some(raw.parse().map_err(|e: intcode::ConfigError| e.to_string())?);
                    i += 2;
                }
                "--max-steps" => {
                    options.step_limit = Some(number(args, i + 1, flag)?);
                    i += 2;
                }
                "--target" => {
                    target = Some(number(args, i + 1, flag)?);
                    i += 2;
                }
                "--max" => {
                    let bound = number(args, i + 1, flag)?;
                    if let Command::Search { bound: b, .. } = &mut options.command {
                        *b = bound;
                    }
                    i += 2;
                }
                "--trace" => {
                    options.trace = true;
                    i += 1;
                }
                "--json" => {
                    options.json = true;
                    i += 1;
                }
                other => return Err(format!("Unexpected argument: {other}")),
            }
        }

        if let Command::Search { target: t, .. } = &mut options.command {
            *t = target.ok_or_else(|| "search requires --target".to_string())?;
        }
        Ok(options)
    }

    /// Config file (if any) with command-line overrides applied.
    pub fn machine_config(&self) -> Result<MachineConfig, IntcodeError> {
        let mut config = match &self.config_path {
            Some(path) => MachineConfig::from_path(path)?,
            None => MachineConfig::default(),
        };
        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }
        if let Some(dialect) = self.dialect {
            config.dialect = dialect;
        }
        if self.step_limit.is_some() {
            config.step_limit = self.step_limit;
        }
        config.validate()?;
        Ok(config)
    }
}
