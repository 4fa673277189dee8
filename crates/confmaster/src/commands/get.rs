//! Get command implementation

use super::{InputFormat, load};
use anyhow::{Result, bail};
use confmaster_kv::{ConfigObject, Value};

pub fn execute(input: &str, from: Option<InputFormat>, path: &str) -> Result<()> {
    let config = load(input, from)?;
    println!("{}", lookup(&config, path)?);
    Ok(())
}

/// Strings print bare, everything else as JSON.
fn lookup(config: &ConfigObject, path: &str) -> Result<String> {
    let Some(value) = config.get(path) else {
        bail!("No value at '{path}'");
    };
    Ok(match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(&other.to_json())?,
    })
}
