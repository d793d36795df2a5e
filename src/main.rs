use clap::Parser;
use std::io::Read;
use std::path::PathBuf;

use shell_expansion::ast::types::SimpleCommand;
use shell_expansion::session::{Session, SessionConfig, SessionError};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shell-expand")]
#[command(about = "Expand a parsed shell command into its arguments")]
#[command(version)]
struct Cli {
    /// Session configuration (TOML)
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Command to expand, as JSON; read from stdin when absent
    #[arg(long = "command")]
    command: Option<PathBuf>,

    /// Print the arguments as a JSON array
    #[arg(long = "json")]
    json: bool,

    /// set -f: disable pathname expansion
    #[arg(long = "noglob")]
    noglob: bool,

    /// Drop patterns that match nothing
    #[arg(long = "nullglob")]
    nullglob: bool,

    /// Enable @( ) *( ) +( ) ?( ) !( ) patterns
    #[arg(long = "extglob")]
    extglob: bool,

    /// set -u: fail on unset variables
    #[arg(long = "nounset")]
    nounset: bool,

    /// Log expansion steps
    #[arg(long = "debug")]
    debug: bool,

    /// Positional parameters
    #[arg(last = true)]
    params: Vec<String>,
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_command(path: Option<&PathBuf>) -> Result<SimpleCommand, SessionError> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.clone(),
            source,
        })?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|source| SessionError::Io {
                    path: PathBuf::from("<stdin>"),
                    source,
                })?;
            buf
        }
    };
    Ok(serde_json::from_str(&text)?)
}

fn run(cli: Cli) -> Result<Vec<String>, SessionError> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    config.inherit_environment();
    if !cli.params.is_empty() {
        config.positional = cli.params;
    }
    config.options.noglob |= cli.noglob;
    config.options.nounset |= cli.nounset;
    config.options.debug |= cli.debug;
    config.shopt_options.nullglob |= cli.nullglob;
    config.shopt_options.extglob |= cli.extglob;

    let mut command = read_command(cli.command.as_ref())?;
    let mut session = Session::new(config);
    let args = session.expand(&mut command)?;
    // Nothing runs the command here, so its substitutions end now
    session.finish_command();
    Ok(args)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);
    let json = cli.json;

    match run(cli) {
        Ok(args) => {
            if json {
                println!("{}", serde_json::json!(args));
            } else {
                for arg in args {
                    println!("{}", arg);
                }
            }
        }
        Err(e) => {
            eprintln!("shell-expand: {}", e);
            std::process::exit(e.exit_status());
        }
    }
}
