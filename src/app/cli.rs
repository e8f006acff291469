use clap::Parser;
use std::path::PathBuf;

/// tunacard - A now-playing overlay card for your stream 🎵
#[derive(Parser, Debug)]
#[command(name = "tunacard", version, about)]
pub struct Args {
    /// Config file (default: ~/.config/tunacard/config.toml)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Parameters as a URL query string, e.g. "theme=latte&justify=left"
    #[arg(long, short = 'q', value_name = "QUERY")]
    pub query: Option<String>,

    /// Override a single parameter (repeatable), e.g. --set displayTime=8000
    #[arg(long = "set", short = 's', value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Write one JSON render snapshot per transition to stdout instead of drawing
    #[arg(long)]
    pub snapshots: bool,

    /// Generate default config.toml to stdout
    #[arg(long)]
    pub generate_config: bool,

    /// Max level written to the log file
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    pub log_level: tracing::Level,
}
