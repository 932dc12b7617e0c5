use intcode::{execute, program, IntcodeError, MachineConfig};
use ports::Scripted;
use wasm_bindgen::prelude::*;

/// Runs `source` with `inputs` (comma-separated, may be empty) and returns
/// the run summary as JSON.
pub fn summarize(source: &str, inputs: &str) -> Result<String, String> {
    let cells = program::parse(source).map_err(|e| IntcodeError::from(e).to_string())?;
    let values = if inputs.trim().is_empty() {
        Vec::new()
    } else {
        program::parse(inputs).map_err(|e| format!("invalid inputs: {e}"))?
    };
    let summary = execute(&cells, &MachineConfig::default(), &mut Scripted::new(values))
        .map_err(|e| IntcodeError::from(e).to_string())?;
    serde_json::to_string(&summary).map_err(|e| e.to_string())
}

#[wasm_bindgen]
pub fn run_intcode(source: &str, inputs: &str) -> Result<String, JsValue> {
    summarize(source, inputs).map_err(|e| JsValue::from_str(&e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_is_json() {
        let json = summarize("3,0,4,0,99", "17").unwrap();
        assert_eq!(json, r#"{"outputs":[17],"last_output":17,"first_cell":17,"steps":3}"#);
    }

    #[test]
    fn faults_become_messages() {
        assert_eq!(summarize("3,0,99", ""), Err("input failed: input exhausted".to_string()));
        assert!(summarize("1,x", "").unwrap_err().contains("cell 1"));
    }
}
