use serde_json::Value;
use std::io::{self, Write};

/// Pretty-print the envelope to stdout, newline terminated.
pub fn print_json(value: &Value) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = write_json(&mut out, value) {
        eprintln!("JSON serialization error: {}", e);
    }
}

fn write_json(out: &mut impl Write, value: &Value) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}
