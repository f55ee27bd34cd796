use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Serialize `value` and write it to `output_path`, or stdout when `None`.
pub fn emit<T: Serialize>(value: &T, compact: bool, output_path: Option<&str>) -> Result<(), String> {
    let json = to_json(value, compact)?;
    write_output(&json, output_path)
}

/// Write a JSON document to stdout or a file, creating missing parent directories.
pub fn write_output(json: &str, output_path: Option<&str>) -> Result<(), String> {
    match output_path {
        Some(path) => {
            let path = Path::new(path);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    format!("Failed to create directory '{}': {}", parent.display(), e)
                })?;
            }
            std::fs::write(path, format!("{}\n", json))
                .map_err(|e| format!("Failed to write output file '{}': {}", path.display(), e))
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", json).map_err(|e| format!("Failed to write to stdout: {}", e))
        }
    }
}

pub fn to_json<T: Serialize>(value: &T, compact: bool) -> Result<String, String> {
    let result = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    result.map_err(|e| format!("JSON serialization failed: {}", e))
}
