/*!
 * progcall CLI - offline inspection of program definitions
 *
 * Shows what the engine would send to a program and checks caller layouts
 * against the layout the remote side declares, without opening a session.
 */

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use progcall::{
    config::Config,
    error::{EXIT_FATAL, EXIT_SUCCESS},
    load_definition, logging,
    marshal::{
        check_conformance, marshal, mixed_usage, AccessPlan, Direction, MemoryDocument, Record,
    },
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "progcall")]
#[command(version, about = "Inspect and check remote program call definitions", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the document accesses a pass over a definition performs, in order
    Plan {
        /// Program definition file (.toml or .json)
        #[arg(short, long, value_name = "FILE")]
        definition: PathBuf,

        /// Which pass to show
        #[arg(long, value_enum, default_value = "write")]
        direction: DirectionArg,
    },

    /// Marshal a JSON object into an in-memory document and print the writes
    Marshal {
        /// Program definition file (.toml or .json)
        #[arg(short, long, value_name = "FILE")]
        definition: PathBuf,

        /// JSON file holding the object to marshal
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },

    /// Check a caller definition against the remote program's definition
    Check {
        /// Caller-side definition
        #[arg(short, long, value_name = "FILE")]
        definition: PathBuf,

        /// Remote-side definition to check against
        #[arg(short, long, value_name = "FILE")]
        against: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DirectionArg {
    Write,
    Read,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Write => Direction::Write,
            DirectionArg::Read => Direction::Read,
        }
    }
}

fn main() {
    let code = match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_FATAL
        }
    };
    std::process::exit(code);
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = if let Some(ref config_path) = cli.config {
        Config::from_file(config_path).unwrap_or_else(|e| {
            eprintln!("Warning: failed to load config file: {}", e);
            Config::default()
        })
    } else {
        Config::default()
    };
    config.verbose |= cli.verbose;
    logging::init_logging(&config)?;

    match cli.command {
        Commands::Plan {
            definition,
            direction,
        } => handle_plan(definition, direction.into()),
        Commands::Marshal { definition, input } => handle_marshal(definition, input),
        Commands::Check {
            definition,
            against,
        } => handle_check(definition, against),
    }
}

fn handle_plan(definition: PathBuf, direction: Direction) -> Result<()> {
    let definition = load_definition(&definition)?;
    let plan = AccessPlan::build(&definition.program, &definition.fields, direction)?;

    println!("{} pass for {}:", direction, definition.program);
    for access in plan.accesses() {
        println!("  {}", access);
    }
    info!(
        program = %definition.program,
        accesses = plan.accesses().len(),
        "Plan built"
    );
    Ok(())
}

fn handle_marshal(definition: PathBuf, input: PathBuf) -> Result<()> {
    let definition = load_definition(&definition)?;
    let contents = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let json: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not valid JSON", input.display()))?;
    let record = Record::from_json(&json)
        .with_context(|| format!("{} cannot be used as an object graph", input.display()))?;

    let mut document = MemoryDocument::new();
    let writes = marshal(&definition.program, &definition.fields, &record, &mut document)?;

    println!("{}", serde_json::to_string_pretty(&document.ops())?);
    info!(program = %definition.program, writes, "Marshalled");
    Ok(())
}

fn handle_check(definition: PathBuf, against: PathBuf) -> Result<()> {
    let local = load_definition(&definition)?;
    let remote = load_definition(&against)?;

    for member in mixed_usage(&local.fields) {
        warn!(member = %member, "Member usage differs from its container");
    }

    check_conformance(&local.program, &local.fields, &remote.fields)?;
    println!("{} conforms to {}", definition.display(), against.display());
    Ok(())
}
