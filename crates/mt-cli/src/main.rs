use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use mt_core::{OutputMode, RuleProcessor, load_rule_lines, load_variable_files};

#[derive(Parser)]
#[command(name = "metric-tuner", about = "Rule-driven MySQL metric analyzer")]
struct Cli {
    /// Path to the rule file
    #[arg(short, long)]
    config: PathBuf,

    /// Comma-separated variable snapshot files (SHOW STATUS / SHOW VARIABLES dumps)
    #[arg(short, long)]
    filelist: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    output: OutputFormat,

    /// Print the recommendations section for matched rules
    #[arg(short, long)]
    recommend: bool,

    /// Enable debug tracing of substitution and evaluation
    #[arg(short, long)]
    debug: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Pretty,
    Csv,
}

impl From<OutputFormat> for OutputMode {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Pretty => OutputMode::Pretty,
            OutputFormat::Csv => OutputMode::Csv,
        }
    }
}

fn init_tracing(debug: bool) {
    // RUST_LOG wins over the --debug default when set.
    let default_level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let vars = load_variable_files(&cli.filelist).map_err(|e| anyhow::anyhow!("{e}"))?;
    tracing::debug!("variable table holds {} entries", vars.len());

    let lines = load_rule_lines(&cli.config).map_err(|e| anyhow::anyhow!("{e}"))?;

    let processor = RuleProcessor::new(vars, cli.output.into(), cli.recommend);
    for line in processor.run(&lines) {
        println!("{line}");
    }

    Ok(())
}
