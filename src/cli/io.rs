//! JSON I/O handling for CLI
//!
//! - Input: JSON files named on the command line
//! - Output: single JSON object via stdout
//! - Logs go to stderr

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read and parse a JSON file
pub fn read_json_file(path: &Path) -> CliResult<Value> {
    let content = fs::read_to_string(path)
        .map_err(|e| CliError::io_error(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| CliError::io_error(format!("Invalid JSON in {}: {}", path.display(), e)))
}

/// Read a JSON file holding an array of entities
pub fn read_entities(path: &Path) -> CliResult<Vec<Value>> {
    match read_json_file(path)? {
        Value::Array(entities) => Ok(entities),
        _ => Err(CliError::io_error(format!(
            "{} must contain a JSON array of entities",
            path.display()
        ))),
    }
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_read_entities() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"CustomerID": "A"}}, {{"CustomerID": "B"}}]"#).unwrap();
        let entities = read_entities(file.path()).unwrap();
        assert_eq!(entities.len(), 2);
    }

    #[test]
    fn test_read_entities_rejects_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"CustomerID": "A"}}"#).unwrap();
        let err = read_entities(file.path()).unwrap_err();
        assert!(err.message().contains("JSON array"));
    }
}
