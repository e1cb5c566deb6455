use serde_json::Value;
use std::io::{self, Write};

/// Pretty-print JSON to stdout.
pub fn print_json(value: &Value) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match serde_json::to_writer_pretty(&mut out, value) {
        Ok(()) => {
            let _ = writeln!(out);
        }
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// Print the same document as YAML, handy for editing into an input file.
pub fn print_yaml(value: &Value) {
    match serde_yaml::to_string(value) {
        Ok(s) => print!("{}", s),
        Err(e) => eprintln!("YAML serialization error: {}", e),
    }
}
