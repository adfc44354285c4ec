//! # treefig demo application
//!
//! A sample CLI that loads a config file into a typed struct and writes it
//! back out in canonical form. It exists to demonstrate and manually verify
//! treefig's behavior.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example treefig_demo -- decode service.toml
//! cargo run --example treefig_demo -- --verbose encode service.toml --indent 4
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                  | How to exercise it                                                  |
//! |--------------------------|---------------------------------------------------------------------|
//! | Typed decode             | `decode service.toml`                                               |
//! | Missing field error      | Remove `server.port` from the file, then run `decode`               |
//! | Type mismatch error      | Set `port = "eighty"`, then run `decode`                            |
//! | Layered defaults         | `decode service.toml --defaults base.toml`                          |
//! | Canonical encoding       | `encode service.toml` (`timeout = "30000ms"` prints as `30s`)       |
//! | Raw tree lookup          | `get service.toml cache.capacity`                                   |
//! | Bare scalars             | `scalar duration 1.5h`, `scalar memory "2 GB"`, `scalar bool yes`   |
//! | Trace logging            | `--verbose` (or `RUST_LOG=treefig=trace`)                           |

mod config;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use treefig::{ConfigTree, Encoder, MemorySize, Period};

use config::DemoConfig;

// ---------------------------------------------------------------------------
// CLI definitions
// ---------------------------------------------------------------------------

/// treefig demo: decode and re-encode typed configuration files.
#[derive(Parser, Debug)]
#[command(name = "treefig-demo")]
struct Cli {
    /// Log every resolved field and ignored key.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a TOML or JSON file into the demo config and print it.
    Decode {
        file: PathBuf,
        /// File whose keys fill in anything the main file leaves out.
        #[arg(long)]
        defaults: Option<PathBuf>,
    },
    /// Decode a file, then print its canonical encoding.
    Encode {
        file: PathBuf,
        #[arg(long)]
        defaults: Option<PathBuf>,
        #[arg(long, default_value_t = 2)]
        indent: usize,
    },
    /// Print the raw node at a dotted key.
    Get { file: PathBuf, key: String },
    /// Decode a single literal as one of the unit types.
    Scalar { kind: ScalarKind, text: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ScalarKind {
    Duration,
    Period,
    Memory,
    Bool,
}

#[derive(Deserialize)]
struct DurationScalar(#[serde(with = "treefig::duration")] Duration);

#[derive(Deserialize)]
struct BoolScalar(#[serde(with = "treefig::lenient_bool")] bool);

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn load_tree(file: &Path, defaults: Option<&Path>) -> treefig::Result<ConfigTree> {
    let tree = ConfigTree::from_path(file)?;
    match defaults {
        Some(path) => Ok(tree.with_fallback(ConfigTree::from_path(path)?)),
        None => Ok(tree),
    }
}

fn load_config(file: &Path, defaults: Option<&Path>) -> treefig::Result<DemoConfig> {
    let tree = load_tree(file, defaults)?;
    treefig::from_tree(&tree)
}

fn print_scalar(kind: ScalarKind, text: &str) -> treefig::Result<()> {
    match kind {
        ScalarKind::Duration => {
            let DurationScalar(d) = treefig::decode_scalar(text)?;
            println!("{d:?} (canonical: {})", treefig::duration::format(&d));
        }
        ScalarKind::Period => {
            let p: Period = treefig::decode_scalar(text)?;
            println!("{}y {}m {}d", p.years, p.months, p.days);
        }
        ScalarKind::Memory => {
            let m: MemorySize = treefig::decode_scalar(text)?;
            println!("{} bytes (canonical: {m})", m.bytes());
        }
        ScalarKind::Bool => {
            let BoolScalar(b) = treefig::decode_scalar(text)?;
            println!("{b}");
        }
    }
    Ok(())
}

fn run(cli: Cli) -> treefig::Result<()> {
    match cli.command {
        Commands::Decode { file, defaults } => {
            let config = load_config(&file, defaults.as_deref())?;
            println!("{config:#?}");
        }
        Commands::Encode {
            file,
            defaults,
            indent,
        } => {
            let config = load_config(&file, defaults.as_deref())?;
            println!("{}", Encoder::new().indent(indent).encode(&config)?);
        }
        Commands::Get { file, key } => {
            let tree = ConfigTree::from_path(&file)?;
            match tree.get_value(&key) {
                Some(value) => println!("{key} = {value}"),
                None => println!("{key} is not set"),
            }
        }
        Commands::Scalar { kind, text } => print_scalar(kind, &text)?,
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("treefig=trace")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
