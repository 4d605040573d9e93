use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use erdkit::diff::{DiffAction, SchemaDiff};
use erdkit::validator::Severity;
use erdkit::{
    Config, ConfigError, DatabaseSchema, Direction, GraphBuilder, LayoutRegistry, ParserError,
    diff_schemas, parse_dsl, print_dsl, validate_schema,
};

/// ERD schema toolkit: parse, check, lay out and compare DSL schemas.
#[derive(Parser)]
#[command(name = "erdkit", version, propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(Args, Debug)]
pub struct GlobalOpts {
    /// Configuration file path [env: ERDKIT_CONFIG]
    #[arg(short = 'c', long = "config", global = true, env = "ERDKIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Emit single-line JSON
    #[arg(long, global = true)]
    pub compact: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a DSL file and print the schema as JSON
    Parse(InputArgs),

    /// Check a DSL file for structural and referential problems
    Validate(InputArgs),

    /// Build the unpositioned graph for a DSL file
    Graph(InputArgs),

    /// Build and lay out the graph for a DSL file
    Layout(LayoutArgs),

    /// Compare two DSL files
    Diff(DiffArgs),

    /// Reprint a DSL file in canonical form
    Fmt(FmtArgs),
}

#[derive(Args)]
pub struct InputArgs {
    /// DSL file, or `-` for stdin
    pub file: PathBuf,
}

#[derive(Args)]
pub struct LayoutArgs {
    /// DSL file, or `-` for stdin
    #[arg(required_unless_present = "list_engines")]
    pub file: Option<PathBuf>,

    /// Layout engine name
    #[arg(short, long)]
    pub engine: Option<String>,

    /// Rank direction: TB, BT, LR or RL
    #[arg(short, long)]
    pub direction: Option<Direction>,

    /// Gap between nodes within a rank
    #[arg(long)]
    pub spacing_x: Option<f64>,

    /// Gap between ranks
    #[arg(long)]
    pub spacing_y: Option<f64>,

    /// Distance from the origin to the drawing
    #[arg(long)]
    pub padding: Option<f64>,

    /// List registered engines and exit
    #[arg(long, conflicts_with_all = ["engine", "direction"])]
    pub list_engines: bool,
}

#[derive(Args)]
pub struct DiffArgs {
    /// Previous schema version
    pub old: PathBuf,

    /// New schema version
    pub new: PathBuf,

    /// Print the diff as JSON instead of a changelog
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct FmtArgs {
    /// DSL file, or `-` for stdin
    pub file: PathBuf,

    /// Rewrite the file in place
    #[arg(short, long)]
    pub write: bool,
}

/// Exit codes for the CLI process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    GeneralError = 1,
    ParseError = 3,
    ValidationFailed = 4,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("IO error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}:{}:{}: {}", .path.display(), .source.line, .source.column, .source.message)]
    Parse { path: PathBuf, source: ParserError },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{} has {errors} validation error(s)", .path.display())]
    Invalid { path: PathBuf, errors: usize },
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Parse { .. } => ExitCode::ParseError,
            CliError::Invalid { .. } => ExitCode::ValidationFailed,
            _ => ExitCode::GeneralError,
        }
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` wins over `-v` flags.
pub fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(cli: Cli) -> Result<(), CliError> {
    let global = &cli.global;
    let config = match &global.config {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            Config::load(path)?
        }
        None => Config::default(),
    };

    match cli.command {
        Commands::Parse(args) => {
            let schema = load_schema(&args.file)?;
            emit_json(&schema, global.compact)
        }
        Commands::Validate(args) => validate(&args.file),
        Commands::Graph(args) => {
            let schema = load_schema(&args.file)?;
            let graph = GraphBuilder::new(config.metrics).build(&schema);
            emit_json(&graph, global.compact)
        }
        Commands::Layout(args) => layout(args, config, global.compact),
        Commands::Diff(args) => {
            let diff = diff_schemas(&load_schema(&args.old)?, &load_schema(&args.new)?);
            if args.json {
                emit_json(&diff, global.compact)
            } else {
                print!("{}", changelog(&diff));
                Ok(())
            }
        }
        Commands::Fmt(args) => {
            let formatted = print_dsl(&load_schema(&args.file)?);
            if args.write && !is_stdin(&args.file) {
                std::fs::write(&args.file, formatted).map_err(|source| CliError::Io {
                    path: args.file.clone(),
                    source,
                })
            } else {
                print!("{formatted}");
                Ok(())
            }
        }
    }
}

fn validate(path: &Path) -> Result<(), CliError> {
    let schema = load_schema(path)?;
    let result = validate_schema(&schema);

    for finding in &result.errors {
        let severity = match finding.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        println!("{severity}: {}", finding.message);
    }

    if result.valid {
        println!("{}: ok", display_path(path));
        Ok(())
    } else {
        Err(CliError::Invalid {
            path: path.to_path_buf(),
            errors: result.errors().count(),
        })
    }
}

fn layout(args: LayoutArgs, config: Config, compact: bool) -> Result<(), CliError> {
    let registry = LayoutRegistry::default();
    if args.list_engines {
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(());
    }

    let mut options = config.layout;
    if let Some(direction) = args.direction {
        options.direction = direction;
    }
    if let Some(x) = args.spacing_x {
        options.node_spacing_x = x;
    }
    if let Some(y) = args.spacing_y {
        options.node_spacing_y = y;
    }
    if let Some(padding) = args.padding {
        options.padding = padding;
    }
    let engine = args.engine.unwrap_or(config.engine);

    let file = args.file.unwrap_or_else(|| PathBuf::from("-"));
    let schema = load_schema(&file)?;
    let builder = GraphBuilder::new(config.metrics);
    let graph = builder.build(&schema);
    let graph = registry.layout_with_metrics(graph, Some(engine.as_str()), &options, builder.metrics());
    emit_json(&graph, compact)
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn display_path(path: &Path) -> String {
    if is_stdin(path) {
        "<stdin>".to_string()
    } else {
        path.display().to_string()
    }
}

fn read_source(path: &Path) -> Result<String, CliError> {
    let io_err = |source: std::io::Error| CliError::Io {
        path: path.to_path_buf(),
        source,
    };
    if is_stdin(path) {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).map_err(io_err)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).map_err(io_err)
    }
}

fn load_schema(path: &Path) -> Result<DatabaseSchema, CliError> {
    let source = read_source(path)?;
    parse_dsl(&source).map_err(|source| CliError::Parse {
        path: PathBuf::from(display_path(path)),
        source,
    })
}

fn emit_json<T: Serialize>(value: &T, compact: bool) -> Result<(), CliError> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{json}");
    Ok(())
}

/// Human-readable changelog; unchanged entries are left out.
fn changelog(diff: &SchemaDiff) -> String {
    if !diff.has_changes() {
        return "no changes\n".to_string();
    }

    let mut out = String::new();
    for table in diff.tables.iter().filter(|t| t.action != DiffAction::Unchanged) {
        out.push_str(&format!("{} {}\n", table.action.marker(), table.name));
        if table.action != DiffAction::Modified {
            continue;
        }
        for column in table.columns.iter().filter(|c| c.action != DiffAction::Unchanged) {
            let types = match (&column.old_type, &column.new_type) {
                (Some(old), Some(new)) if old != new => format!("{old} -> {new}"),
                (_, Some(ty)) | (Some(ty), None) => ty.clone(),
                (None, None) => String::new(),
            };
            out.push_str(&format!(
                "    {} {} {}\n",
                column.action.marker(),
                column.name,
                types
            ));
        }
    }

    let relations: Vec<_> = diff
        .relations
        .iter()
        .filter(|r| r.action != DiffAction::Unchanged)
        .collect();
    if !relations.is_empty() {
        out.push_str("relations:\n");
        for relation in relations {
            out.push_str(&format!("  {} {}\n", relation.action.marker(), relation.key));
        }
    }

    let summary = diff.summary();
    out.push_str(&format!(
        "{} added, {} removed, {} modified\n",
        summary.added, summary.removed, summary.modified
    ));
    out
}
