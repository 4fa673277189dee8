//! Command implementations for the confmaster CLI
//!
//! Commands read config files, hand them to confmaster-kv and write the
//! result to stdout.

pub mod flatten;
pub mod format;
pub mod get;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use confmaster_kv::{ConfigObject, Labels, MemoryApplication};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Json,
    Yaml,
}

impl InputFormat {
    fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yml" | "yaml") => InputFormat::Yaml,
            _ => InputFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
    Properties,
}

/// Reads and decodes one config file.
pub fn load(path: &str, from: Option<InputFormat>) -> Result<ConfigObject> {
    let file = Path::new(path);
    let format = from.unwrap_or_else(|| InputFormat::for_path(file));
    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {path}"))?;
    let config = match format {
        InputFormat::Json => ConfigObject::from_json(&bytes),
        InputFormat::Yaml => {
            let text = std::str::from_utf8(&bytes).with_context(|| format!("{path} is not UTF-8"))?;
            ConfigObject::from_yaml(text)
        }
    }
    .with_context(|| format!("Failed to decode {path}"))?;
    debug!(path, ?format, keys = config.len(), "loaded config");
    Ok(config)
}

/// Parses `[NAMESPACE/]KEY=VALUE,...@FILE` into an application.
pub fn parse_app(app_arg: &str, from: Option<InputFormat>) -> Result<MemoryApplication> {
    let Some((selector, file)) = app_arg.rsplit_once('@') else {
        bail!("Application '{app_arg}' must look like [NAMESPACE/]KEY=VALUE,...@FILE");
    };
    let (namespace, pairs) = match selector.split_once('/') {
        Some((ns, pairs)) => (ns, pairs),
        None => ("default", selector),
    };
    let labels = parse_labels(pairs)?;
    Ok(MemoryApplication::new(namespace, labels, load(file, from)?))
}

fn parse_labels(pairs: &str) -> Result<Labels> {
    let mut labels = Labels::new();
    for pair in pairs.split(',').filter(|p| !p.is_empty()) {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Label '{pair}' must look like KEY=VALUE");
        };
        labels.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use confmaster_kv::{Application, ConfigRead};
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_picks_format_from_extension() {
        let yaml = write_temp(".yaml", "a:\n  b: 1\n");
        let json = write_temp(".json", r#"{"a":{"b":1}}"#);
        let from_yaml = load(yaml.path().to_str().unwrap(), None).unwrap();
        let from_json = load(json.path().to_str().unwrap(), None).unwrap();
        assert_eq!(from_yaml, from_json);
    }

    #[test]
    fn test_load_with_explicit_format() {
        let file = write_temp(".conf", "a: x\n");
        let path = file.path().to_str().unwrap();
        assert!(load(path, None).is_err());
        let config = load(path, Some(InputFormat::Yaml)).unwrap();
        assert_eq!(config.get_str("a"), Some("x"));
    }

    #[test]
    fn test_parse_app() {
        let file = write_temp(".json", r#"{"k":"v"}"#);
        let app_arg = format!("prod/app=db,cluster=1@{}", file.path().display());
        let app = parse_app(&app_arg, None).unwrap();
        assert_eq!(app.namespace(), "prod");
        assert_eq!(app.labels().get("cluster").map(String::as_str), Some("1"));
        assert_eq!(app.config().get_str("k"), Some("v"));

        let app_arg = format!("app=db@{}", file.path().display());
        assert_eq!(parse_app(&app_arg, None).unwrap().namespace(), "default");

        assert!(parse_app("app=db", None).is_err());
        assert!(parse_labels("app").is_err());
    }
}
