use accessible::config::AccessibleConfig;
use accessible::dispatch::{Dispatcher, Outcome};
use accessible::registry::ClassRegistry;
use accessible::validation::NoopValidator;
use accessible::value::Value;
use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod args;
use args::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = AccessibleConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Inspect { classes, class } => handle_inspect(&config, &classes, &class),
        Commands::Run {
            classes,
            class,
            args,
            calls,
        } => handle_run(&config, &classes, &class, args, calls),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn dispatcher(config: &AccessibleConfig, classes: &Path) -> Result<Dispatcher> {
    let registry = ClassRegistry::load(classes)
        .with_context(|| format!("loading class file {}", classes.display()))?;
    Ok(Dispatcher::from_config(
        config,
        Arc::new(registry),
        Arc::new(NoopValidator),
    )?)
}

fn handle_inspect(config: &AccessibleConfig, classes: &Path, class: &str) -> Result<()> {
    let dispatcher = dispatcher(config, classes)?;
    let metadata = dispatcher.cache().metadata(class)?;
    println!("{}", serde_json::to_string_pretty(&*metadata)?);
    Ok(())
}

fn handle_run(
    config: &AccessibleConfig,
    classes: &Path,
    class: &str,
    args: Vec<String>,
    calls: Vec<String>,
) -> Result<()> {
    let dispatcher = dispatcher(config, classes)?;
    let args = args
        .iter()
        .map(|raw| parse_json(raw))
        .collect::<Result<Vec<_>>>()?;
    let mut instance = dispatcher.construct(class, args)?;

    for call in &calls {
        let (method, args) = parse_call(call)?;
        match dispatcher.call(&mut instance, method, args)? {
            Outcome::Value(value) => {
                println!("{} {}", method.cyan(), serde_json::Value::from(value));
            }
            Outcome::Chained => println!("{} {}", method.cyan(), "ok".green()),
        }
    }

    println!("{}", serde_json::to_string_pretty(&instance.to_json())?);
    Ok(())
}

fn parse_json(raw: &str) -> Result<Value> {
    let json: serde_json::Value =
        serde_json::from_str(raw).with_context(|| format!("invalid JSON argument {}", raw))?;
    Ok(Value::from(json))
}

/// `getFoo` or `setFoo=["x"]`.
fn parse_call(call: &str) -> Result<(&str, Vec<Value>)> {
    let Some((method, raw)) = call.split_once('=') else {
        return Ok((call, Vec::new()));
    };
    match parse_json(raw)? {
        Value::List(args) => Ok((method, args)),
        _ => bail!("arguments of {} must be a JSON array", method),
    }
}
