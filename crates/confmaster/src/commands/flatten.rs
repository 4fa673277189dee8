//! Flatten command implementation

use super::{InputFormat, load};
use anyhow::Result;
use confmaster_kv::ConfigObject;

pub fn execute(input: &str, from: Option<InputFormat>) -> Result<()> {
    let config = load(input, from)?;
    for line in lines(&config)? {
        println!("{line}");
    }
    Ok(())
}

fn lines(config: &ConfigObject) -> Result<Vec<String>> {
    config
        .flatten()
        .into_iter()
        .map(|(path, value)| -> Result<String> {
            Ok(format!("{path}={}", serde_json::to_string(&value.to_json())?))
        })
        .collect()
}
