// I/O ports for the Intcode machine.
// The engine only sees these two traits. Consoles, scripted test input
// and wasm hosts all plug in behind them.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use log::{debug, warn};
use thiserror::Error;

pub const PROMPT: &str = "Please enter something:";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("input exhausted")]
    Exhausted,
    #[error("malformed input {0:?}")]
    Malformed(String),
    #[error("i/o failure: {0}")]
    Io(String),
}

/// Source of values for the `input` opcode. Called once per executed input
/// instruction and allowed to block.
pub trait Input {
    fn next_input(&mut self) -> Result<i64, PortError>;
}

/// Sink for the `output` opcode.
pub trait Output {
    fn emit(&mut self, value: i64);
}

impl<T: Input + ?Sized> Input for &mut T {
    fn next_input(&mut self) -> Result<i64, PortError> {
        (**self).next_input()
    }
}

impl<T: Output + ?Sized> Output for &mut T {
    fn emit(&mut self, value: i64) {
        (**self).emit(value)
    }
}

impl Output for Vec<i64> {
    fn emit(&mut self, value: i64) {
        self.push(value);
    }
}

// --- Scripted input (tests, wasm, --input) ---

#[derive(Debug, Clone, Default)]
pub struct Scripted {
    values: VecDeque<i64>,
}

impl Scripted {
    pub fn new(values: impl IntoIterator<Item = i64>) -> Self {
        Self { values: values.into_iter().collect() }
    }

    pub fn push(&mut self, value: i64) {
        self.values.push_back(value);
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl Input for Scripted {
    fn next_input(&mut self) -> Result<i64, PortError> {
        self.values.pop_front().ok_or(PortError::Exhausted)
    }
}

/// Adapts a closure into an input port.
pub struct FromFn<F>(pub F);

impl<F> Input for FromFn<F>
where
    F: FnMut() -> Result<i64, PortError>,
{
    fn next_input(&mut self) -> Result<i64, PortError> {
        (self.0)()
    }
}

// --- Console ---

/// Interactive input: writes a prompt, then reads one integer per line.
pub struct Console<R, W> {
    reader: R,
    prompt: W,
    line: String,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(reader: R, prompt: W) -> Self {
        Self { reader, prompt, line: String::new() }
    }
}

impl<R: BufRead, W: Write> Input for Console<R, W> {
    fn next_input(&mut self) -> Result<i64, PortError> {
        writeln!(self.prompt, "{PROMPT}").map_err(|e| PortError::Io(e.to_string()))?;
        self.prompt.flush().map_err(|e| PortError::Io(e.to_string()))?;

        self.line.clear();
        let read = self
            .reader
            .read_line(&mut self.line)
            .map_err(|e| PortError::Io(e.to_string()))?;
        if read == 0 {
            return Err(PortError::Exhausted);
        }

        let text = self.line.trim();
        debug!("console input {text:?}");
        text.parse::<i64>().map_err(|_| PortError::Malformed(text.to_string()))
    }
}

// --- Line-oriented output ---

/// Writes each emitted value on its own line. Write failures never reach the
/// engine; the first one is kept and reported by `finish`.
pub struct LineSink<W: Write> {
    writer: W,
    emitted: usize,
    last: Option<i64>,
    error: Option<String>,
}

impl<W: Write> LineSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, emitted: 0, last: None, error: None }
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn last(&self) -> Option<i64> {
        self.last
    }

    pub fn finish(mut self) -> Result<W, PortError> {
        if let Some(message) = self.error.take() {
            return Err(PortError::Io(message));
        }
        self.writer.flush().map_err(|e| PortError::Io(e.to_string()))?;
        Ok(self.writer)
    }
}

impl<W: Write> Output for LineSink<W> {
    fn emit(&mut self, value: i64) {
        self.emitted += 1;
        self.last = Some(value);
        if let Err(e) = writeln!(self.writer, "{value}") {
            warn!("failed to write output {value}: {e}");
            self.error.get_or_insert_with(|| e.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn scripted_drains_in_order() {
        let mut input = Scripted::new([5, -7]);
        assert_eq!(input.next_input(), Ok(5));
        assert_eq!(input.remaining(), 1);
        assert_eq!(input.next_input(), Ok(-7));
        assert_eq!(input.next_input(), Err(PortError::Exhausted));
    }

    #[test]
    fn console_prompts_and_parses() {
        let mut prompt = Vec::new();
        let mut console = Console::new(Cursor::new("42\n  -3 \nnope\n"), &mut prompt);
        assert_eq!(console.next_input(), Ok(42));
        assert_eq!(console.next_input(), Ok(-3));
        assert_eq!(console.next_input(), Err(PortError::Malformed("nope".into())));
        assert_eq!(console.next_input(), Err(PortError::Exhausted));
        drop(console);
        let text = String::from_utf8(prompt).unwrap();
        assert_eq!(text.matches(PROMPT).count(), 4);
    }

    #[test]
    fn line_sink_writes_one_value_per_line() {
        let mut sink = LineSink::new(Vec::new());
        sink.emit(1);
        sink.emit(-20);
        assert_eq!(sink.emitted(), 2);
        assert_eq!(sink.last(), Some(-20));
        let bytes = sink.finish().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "1\n-20\n");
    }

    #[test]
    fn closures_and_references_forward() {
        let mut n: i64 = 0;
        let mut counter = FromFn(|| {
            n += 1;
            Ok::<i64, PortError>(n)
        });
        let by_ref: &mut dyn Input = &mut counter;
        assert_eq!(by_ref.next_input(), Ok(1));
        assert_eq!(by_ref.next_input(), Ok(2));

        let mut collected: Vec<i64> = Vec::new();
        let out: &mut dyn Output = &mut collected;
        out.emit(9);
        assert_eq!(collected, vec![9]);
    }
}
