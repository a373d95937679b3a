//! Loads a pipeline definition whose stages and sinks are chosen in the
//! config file.
//!
//! ```bash
//! cargo run --example pipeline -- --config demos/pipeline.toml
//! PIPELINE__SINKS__DEFAULT__CLASS_PATH=pipeline.sinks.File \
//!   PIPELINE__SINKS__DEFAULT__PATH=/tmp/out.log \
//!   cargo run --example pipeline -- --config demos/pipeline.toml
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use dragon_dyncfg::{specialize_fields, Base, Config, Dynamic, Element, Instance, TypeRegistry};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pipeline")]
#[command(about = "Load a pipeline config with dynamically typed stages")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "demos/pipeline.toml")]
    config: PathBuf,

    /// Environment variable prefix for overrides
    #[arg(long, default_value = "PIPELINE")]
    env_prefix: String,

    /// List registered types and exit
    #[arg(long)]
    types: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

trait Stage: Instance {
    fn describe(&self) -> String;
}

trait Sink: Instance {
    fn describe(&self) -> String;
}

struct AnyStage;

impl Base for AnyStage {
    type Object = dyn Stage;
    const TYPE_NAME: &'static str = "pipeline.Stage";
}

struct AnySink;

impl Base for AnySink {
    type Object = dyn Sink;
    const TYPE_NAME: &'static str = "pipeline.Sink";
}

#[derive(Debug, Serialize, Deserialize)]
struct Read {
    path: PathBuf,
}

impl Stage for Read {
    fn describe(&self) -> String {
        format!("read {}", self.path.display())
    }
}

impl Element for Read {
    const TYPE_NAME: &'static str = "pipeline.stages.Read";
    const PARENT: Option<&'static str> = Some("pipeline.Stage");
}

#[derive(Debug, Serialize, Deserialize)]
struct Filter {
    pattern: String,
    #[serde(default)]
    invert: bool,
}

impl Stage for Filter {
    fn describe(&self) -> String {
        let op = if self.invert { "drop" } else { "keep" };
        format!("{op} lines matching '{}'", self.pattern)
    }
}

impl Element for Filter {
    const TYPE_NAME: &'static str = "pipeline.stages.Filter";
    const PARENT: Option<&'static str> = Some("pipeline.Stage");
}

#[derive(Debug, Serialize, Deserialize)]
struct Tee {
    label: String,
    sink: Dynamic<AnySink>,
}

impl Stage for Tee {
    fn describe(&self) -> String {
        let sink = self.sink.get().map(Sink::describe).unwrap_or_default();
        format!("tee '{}' into {sink}", self.label)
    }
}

impl Element for Tee {
    const TYPE_NAME: &'static str = "pipeline.stages.Tee";
    const PARENT: Option<&'static str> = Some("pipeline.Stage");
}

#[derive(Debug, Serialize, Deserialize)]
struct Stdout {}

impl Sink for Stdout {
    fn describe(&self) -> String {
        "stdout".to_string()
    }
}

impl Element for Stdout {
    const TYPE_NAME: &'static str = "pipeline.sinks.Stdout";
    const PARENT: Option<&'static str> = Some("pipeline.Sink");
}

#[derive(Debug, Serialize, Deserialize)]
struct File {
    path: PathBuf,
}

impl Sink for File {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

impl Element for File {
    const TYPE_NAME: &'static str = "pipeline.sinks.File";
    const PARENT: Option<&'static str> = Some("pipeline.Sink");
}

specialize_fields!(Read { path });
specialize_fields!(Filter { pattern, invert });
specialize_fields!(Tee { label, sink });
specialize_fields!(Stdout {});
specialize_fields!(File { path });

#[derive(Debug, Serialize, Deserialize)]
struct PipelineConfig {
    name: String,
    stages: Vec<Dynamic<AnyStage>>,
    #[serde(default)]
    sinks: BTreeMap<String, Dynamic<AnySink>>,
}

specialize_fields!(PipelineConfig { name, stages, sinks });

fn registry() -> Result<TypeRegistry, dragon_dyncfg::RegistryError> {
    let mut registry = TypeRegistry::new();
    registry
        .register::<Read, dyn Stage>(|s| s)?
        .register::<Filter, dyn Stage>(|s| s)?
        .register::<Tee, dyn Stage>(|s| s)?
        .register::<Stdout, dyn Sink>(|s| s)?
        .register::<File, dyn Sink>(|s| s)?;
    Ok(registry)
}

fn main() -> Result<(), dragon_dyncfg::Error> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let registry = registry()?;
    if args.types {
        for name in registry.type_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let pipeline: PipelineConfig = Config::builder()
        .with_file(&args.config, true)
        .with_env(args.env_prefix.as_str(), "__")
        .build(&registry)?;

    tracing::info!(name = %pipeline.name, stages = pipeline.stages.len(), "pipeline loaded");
    for (i, stage) in pipeline.stages.iter().enumerate() {
        if let Some(stage) = stage.get() {
            println!("stage {i}: {}", stage.describe());
        }
    }
    for (name, sink) in &pipeline.sinks {
        if let Some(sink) = sink.get() {
            println!("sink {name}: {}", sink.describe());
        }
    }

    println!("\n{}", dragon_dyncfg::config::to_string(&pipeline)?);
    Ok(())
}
