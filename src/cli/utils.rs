use std::io::Read;

use anyhow::Context;
use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Read a JSON document from a file, or from stdin when `path` is `-`
pub fn read_json(path: &str) -> anyhow::Result<Value> {
    let content = if path == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?
    };
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path))
}

/// Read a list that may be given bare or wrapped in an object under `key`
pub fn read_json_list(path: &str, key: &str) -> anyhow::Result<Value> {
    match read_json(path)? {
        Value::Object(mut obj) if obj.contains_key(key) => Ok(obj.remove(key).unwrap_or(Value::Null)),
        other => Ok(other),
    }
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let (Some(Value::Object(extra)), Some(obj)) = (data, response.as_object_mut()) {
                obj.extend(extra);
            }
            print_json(&response)?;
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}
