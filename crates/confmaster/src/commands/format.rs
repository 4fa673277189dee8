//! Format command implementation

use super::{InputFormat, OutputFormat, load, parse_app};
use anyhow::{Context, Result};
use confmaster_kv::{
    Config, Formatter, JsonFormatter, MemoryLocator, PropertiesFormatter, Resolver, YamlFormatter,
};
use std::io::Write;
use tracing::info;

pub struct FormatArgs {
    pub input: String,
    pub fallbacks: Vec<String>,
    pub apps: Vec<String>,
    pub from: Option<InputFormat>,
    pub to: OutputFormat,
    pub indent: usize,
}

pub fn execute(args: FormatArgs) -> Result<()> {
    let out = render(&args)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&out)?;
    if !out.ends_with(b"\n") {
        stdout.write_all(b"\n")?;
    }
    Ok(())
}

fn render(args: &FormatArgs) -> Result<Vec<u8>> {
    let mut config = Config::from(load(&args.input, args.from)?);
    for path in &args.fallbacks {
        config = config.with_fallback(&Config::from(load(path, args.from)?));
    }

    let mut locator = MemoryLocator::new();
    for app_arg in &args.apps {
        locator.register(parse_app(app_arg, args.from)?);
    }
    info!(
        layers = config.depth(),
        apps = locator.len(),
        "resolving {}",
        args.input
    );

    let resolved = Resolver::new(&locator)
        .resolve(&config)
        .with_context(|| format!("Failed to resolve {}", args.input))?;

    let formatter: Box<dyn Formatter> = match args.to {
        OutputFormat::Json => Box::new(JsonFormatter::new(args.indent)),
        OutputFormat::Yaml => Box::new(YamlFormatter),
        OutputFormat::Properties => Box::new(PropertiesFormatter),
    };
    Ok(resolved.format(formatter.as_ref())?)
}
