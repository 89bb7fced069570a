//! CLI entry point for the emotion research session store.
//!
//! # Responsibility
//! - Resolve configuration from flags layered over `EMOTION_VR_*` variables.
//! - Serve JSON-lines requests on stdin/stdout or run a single request.

use clap::{Parser, Subcommand};
use emotion_api::ApiContext;
use emotion_core::{init_logging, CoreConfig};
use log::{info, warn};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "emotion_cli")]
#[command(about = "Participant and emotion record store for VR research sessions")]
#[command(version)]
struct Args {
    /// SQLite database file (`sqlite:///` prefix accepted)
    #[arg(long, env = "EMOTION_VR_DB_PATH")]
    db: Option<String>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, env = "EMOTION_VR_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files
    #[arg(long, env = "EMOTION_VR_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read one JSON request per line from stdin, answer one line each
    Serve,
    /// Run a single JSON request and print the response
    Request { frame: String },
    /// Print core linkage and version info
    Ping,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("emotion_cli: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), String> {
    let config = resolve_config(&args)?;

    if let Some(dir) = &config.log_dir {
        init_logging(config.log_level, &dir.to_string_lossy()).map_err(|err| err.to_string())?;
    }

    let context = ApiContext::new(&config.db_path);
    match args.command {
        Command::Serve => serve(&context),
        Command::Request { frame } => {
            println!("{}", context.handle_json(&frame));
            Ok(())
        }
        Command::Ping => {
            println!("emotion_core ping={}", emotion_core::ping());
            println!("emotion_core version={}", emotion_core::core_version());
            Ok(())
        }
    }
}

fn resolve_config(args: &Args) -> Result<CoreConfig, String> {
    // Flags win over the environment; clap already folded env into `args`.
    CoreConfig::from_lookup(|name| match name {
        emotion_core::config::ENV_DB_PATH => args.db.clone(),
        emotion_core::config::ENV_LOG_LEVEL => args.log_level.clone(),
        emotion_core::config::ENV_LOG_DIR => args
            .log_dir
            .as_ref()
            .map(|dir| dir.to_string_lossy().into_owned()),
        _ => None,
    })
    .map_err(|err| err.to_string())
}

fn serve(context: &ApiContext) -> Result<(), String> {
    info!(
        "event=serve module=cli status=start db_path={}",
        context.db_path().display()
    );
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    let mut handled = 0u64;

    for line in stdin.lock().lines() {
        let line = line.map_err(|err| format!("stdin read failed: {err}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let response = context.handle_json(&line);
        writeln!(stdout, "{response}")
            .and_then(|()| stdout.flush())
            .map_err(|err| {
                warn!("event=serve module=cli status=error error_code=stdout_write_failed");
                format!("stdout write failed: {err}")
            })?;
        handled += 1;
    }

    info!("event=serve module=cli status=ok requests={handled}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{resolve_config, Args};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn db_flag_strips_sqlite_url_prefix() {
        let args =
            Args::try_parse_from(["emotion_cli", "--db", "sqlite:///./study.db", "ping"]).unwrap();
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.db_path, PathBuf::from("./study.db"));
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let args =
            Args::try_parse_from(["emotion_cli", "--log-dir", "relative/logs", "ping"]).unwrap();
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn request_subcommand_takes_one_frame() {
        let args = Args::try_parse_from(["emotion_cli", "request", r#"{"op":"health"}"#]).unwrap();
        assert!(matches!(args.command, super::Command::Request { .. }));
    }
}
