use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Which store(s) a command acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// SurrealDB property graph
    Graph,
    /// SQLite relational schema
    Relational,
    Both,
}

impl Backend {
    pub fn graph(self) -> bool {
        matches!(self, Backend::Graph | Backend::Both)
    }

    pub fn relational(self) -> bool {
        matches!(self, Backend::Relational | Backend::Both)
    }
}

/// Benchmark output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

#[derive(Parser)]
#[command(name = "egonet")]
#[command(about = "egonet - load ego-network snapshots into a graph and a relational store, then benchmark both")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses config file value or defaults to 'info'
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to ~/.config/egonet/config.toml)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the <ego>.edges, .featnames, .feat, .egofeat and .circles files
    #[arg(short = 'd', long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// SQLite database file (overrides config file)
    #[arg(long, global = true)]
    pub sqlite_path: Option<PathBuf>,

    /// On-disk graph store directory (requires the `rocksdb` feature)
    #[arg(long, global = true)]
    pub graph_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse every ego network in the data directory and write it to the selected stores
    Import {
        #[command(flatten)]
        import: ImportArgs,
    },

    /// Run the simple and complex query sets and report timings
    Bench {
        #[arg(short, long, value_enum, default_value = "both")]
        backend: Backend,

        #[command(flatten)]
        bench: BenchArgs,
    },

    /// Import then benchmark in one process (required for the in-memory graph store)
    Run {
        #[command(flatten)]
        import: ImportArgs,

        #[command(flatten)]
        bench: BenchArgs,
    },

    /// Delete every record from the selected stores
    Wipe {
        #[arg(short, long, value_enum, default_value = "both")]
        backend: Backend,
    },

    /// Show record counts per table
    Stats {
        #[arg(short, long, value_enum, default_value = "both")]
        backend: Backend,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(clap::Args, Debug, Clone)]
pub struct ImportArgs {
    #[arg(short, long, value_enum, default_value = "both")]
    pub backend: Backend,

    /// Records per write operation (overrides config file)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Wipe the selected stores before importing
    #[arg(long)]
    pub wipe: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct BenchArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write an example config file
    Init {
        /// Destination (defaults to ~/.config/egonet/config.toml)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration after every override
    Show,
}
