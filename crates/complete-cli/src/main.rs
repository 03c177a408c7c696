//! `complete-cli` entrypoint: process wiring for the completion core.
//!
//! Reads one command per line from stdin and drives a [`CompletionCore`],
//! writing replies to stdout. This is a manual-testing harness, not the
//! RPC/connection layer spec.md §1 treats as external -- a real deployment
//! replaces [`StdoutConnection`] with that layer's transport.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Once;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use complete_engine::ClangLibrary;
use complete_model::{Connection, Flags, Location};
use complete_worker::CompletionCore;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "complete-cli", version, about = "Completion core driver")]
struct Args {
    /// Optional path to a `complete.toml` configuration file (overrides discovery).
    #[arg(long = "config")]
    config: Option<PathBuf>,
}

/// Connection that writes one reply per line to stdout. `finish` flushes;
/// the core calls it at most once per connection (spec.md §5).
struct StdoutConnection;

impl Connection for StdoutConnection {
    fn write(&mut self, bytes: &[u8]) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        let _ = lock.write_all(bytes);
        let _ = lock.write_all(b"\n");
    }

    fn finish(&mut self) {
        let _ = std::io::stdout().flush();
    }
}

enum Command {
    Complete {
        location: Location,
        flags: Flags,
        args: Vec<String>,
    },
    Prepare {
        path: PathBuf,
        args: Vec<String>,
    },
    Dump,
    Stop,
}

/// Parses one line of the stdin protocol:
///
/// ```text
/// complete PATH:LINE:COL [refresh] [elisp|xml|json] [macros] [-- COMPILER_ARGS...]
/// prepare PATH [-- COMPILER_ARGS...]
/// dump
/// stop
/// ```
fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let verb = parts.next()?;
    match verb {
        "dump" => Some(Command::Dump),
        "stop" | "quit" => Some(Command::Stop),
        "complete" => {
            let location = Location::parse(parts.next()?).ok()?;
            let (flags, args) = parse_flags_and_args(parts);
            Some(Command::Complete { location, flags, args })
        }
        "prepare" => {
            let path = PathBuf::from(parts.next()?);
            let (_flags, args) = parse_flags_and_args(parts);
            Some(Command::Prepare { path, args })
        }
        _ => None,
    }
}

fn parse_flags_and_args<'a>(parts: impl Iterator<Item = &'a str>) -> (Flags, Vec<String>) {
    let mut flags = Flags::empty();
    let mut args = Vec::new();
    let mut in_args = false;
    for token in parts {
        if in_args {
            args.push(token.to_string());
            continue;
        }
        match token {
            "--" => in_args = true,
            "refresh" => flags |= Flags::REFRESH,
            "elisp" => flags |= Flags::ELISP,
            "xml" => flags |= Flags::XML,
            "json" => flags |= Flags::JSON,
            "macros" => flags |= Flags::INCLUDE_MACROS,
            other => args.push(other.to_string()),
        }
    }
    (flags, args)
}

fn configure_logging(dir: &std::path::Path) -> Result<WorkerGuard> {
    let _ = std::fs::create_dir_all(dir);
    let file_appender = tracing_appender::rolling::never(dir, "complete.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init();
    Ok(guard)
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = complete_config::load_from(args.config.clone());
    let _log_guard = configure_logging(&config.logging.directory).context("failed to configure logging")?;
    install_panic_hook();

    info!(target: "runtime", "startup");

    let engine = ClangLibrary::new().context("failed to initialize the semantic analysis library")?;
    let core = CompletionCore::spawn(engine, config.worker_config());

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_command(line) {
            Some(Command::Complete { location, flags, args }) => {
                let path = location.path.clone();
                if let Err(err) = core.complete_at(path, args, location, flags, None, Box::new(StdoutConnection)) {
                    warn!(target: "cli", error = %err, "completeAt rejected");
                }
            }
            Some(Command::Prepare { path, args }) => {
                if let Err(err) = core.prepare(path, args, None) {
                    warn!(target: "cli", error = %err, "prepare rejected");
                }
            }
            Some(Command::Dump) => match core.dump() {
                Ok(report) => println!("{report}"),
                Err(err) => println!("error: {err}"),
            },
            Some(Command::Stop) => break,
            None => {
                eprintln!("unrecognized command: {line}");
            }
        }
    }

    core.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_complete_with_flags_and_compiler_args() {
        let cmd = parse_command("complete /tmp/a.cpp:10:5 refresh json -- -std=c++17 -Iinclude").unwrap();
        match cmd {
            Command::Complete { location, flags, args } => {
                assert_eq!(location.line, 10);
                assert_eq!(location.column, 5);
                assert!(flags.is_refresh());
                assert_eq!(flags.encoding(), complete_model::Encoding::Json);
                assert_eq!(args, vec!["-std=c++17", "-Iinclude"]);
            }
            _ => panic!("expected a Complete command"),
        }
    }

    #[test]
    fn parses_prepare_and_control_verbs() {
        assert!(matches!(parse_command("prepare /tmp/a.cpp"), Some(Command::Prepare { .. })));
        assert!(matches!(parse_command("dump"), Some(Command::Dump)));
        assert!(matches!(parse_command("stop"), Some(Command::Stop)));
    }

    #[test]
    fn rejects_unknown_verbs_and_bad_locations() {
        assert!(parse_command("bogus").is_none());
        assert!(parse_command("complete /tmp/a.cpp").is_none());
    }
}
