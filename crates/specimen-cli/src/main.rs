use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use specimen::node::NodeGraph;
use specimen::{create_list, create_with_report, ModelContext, Value};
use specimen_cli::{load_schema, load_settings};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "specimen")]
#[command(about = "Generate populated instances of schema-declared types", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate instances of a root type and print them as JSON
    Generate(GenerateArgs),
    /// Print the node tree built for a root type
    Graph(TargetArgs),
}

#[derive(Args)]
struct TargetArgs {
    /// YAML file with the class declarations
    #[arg(long)]
    schema: PathBuf,

    /// Root type expression, e.g. `PairContainer<Integer, String>`
    #[arg(long)]
    root: String,

    /// YAML file with generation settings
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[derive(Args)]
struct GenerateArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Number of instances to generate
    #[arg(long, default_value_t = 1)]
    count: usize,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate(args) => generate(args),
        Commands::Graph(args) => graph(args),
    }
}

fn context(args: &TargetArgs, seed: Option<u64>) -> Result<ModelContext> {
    let schema = load_schema(&args.schema)?;
    let mut builder = ModelContext::builder_for(Arc::new(schema), &args.root)
        .with_context(|| format!("Invalid root type '{}'", args.root))?;
    if let Some(path) = &args.settings {
        builder = builder.settings(load_settings(path)?);
    }
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }
    builder.build().context("Invalid model context")
}

fn generate(args: GenerateArgs) -> Result<()> {
    let ctx = context(&args.target, args.seed)?;

    let values = if args.count == 1 {
        let report = create_with_report(&ctx)?;
        info!(seed = report.seed, warnings = report.warnings.len(), "generated instance");
        vec![report.value]
    } else {
        create_list(&ctx, args.count)?
    };

    let json: Vec<_> = values.iter().map(Value::to_json).collect();
    let json = match json.as_slice() {
        [single] => single.clone(),
        _ => serde_json::Value::Array(json),
    };
    let output = if args.pretty {
        serde_json::to_string_pretty(&json)?
    } else {
        serde_json::to_string(&json)?
    };
    println!("{}", output);
    Ok(())
}

fn graph(args: TargetArgs) -> Result<()> {
    let ctx = context(&args, None)?;
    let graph = NodeGraph::build(&ctx)?;
    print!("{}", graph.render());
    Ok(())
}
