use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use matguard_core::{DurabilityConfig, DurabilityLayer, DurabilityMetricsSnapshot};
use matguard_error::Result;
use matguard_store::{DirStore, MemoryStore};
use matguard_types::{HeartbeatRecord, StorageTier};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Audit,
    Recover,
    Restore,
    Status,
    Enable,
    Disable,
    Clear,
}

impl Command {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "audit" => Some(Self::Audit),
            "recover" => Some(Self::Recover),
            "restore" => Some(Self::Restore),
            "status" => Some(Self::Status),
            "enable" => Some(Self::Enable),
            "disable" => Some(Self::Disable),
            "clear" => Some(Self::Clear),
            _ => None,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Audit => "audit",
            Self::Recover => "recover",
            Self::Restore => "restore",
            Self::Status => "status",
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::Clear => "clear",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    dir: Option<PathBuf>,
    config: Option<PathBuf>,
    command: Option<Command>,
    verbose: bool,
    show_help: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    enabled: bool,
    heartbeat: Option<HeartbeatRecord>,
    present_tiers: Vec<StorageTier>,
    all_consistent: bool,
    metrics: DurabilityMetricsSnapshot,
}

fn main() {
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();

    let exit_code = run(std::env::args_os(), &mut stdout, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run<I, W, E>(args: I, out: &mut W, err: &mut E) -> i32
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let options = match parse_args(args) {
        Ok(options) => options,
        Err(message) => {
            let _ = writeln!(err, "error: {message}");
            let _ = write_usage(err);
            return 2;
        }
    };

    if options.show_help {
        if write_usage(out).is_err() {
            return 1;
        }
        return 0;
    }

    let (Some(dir), Some(command)) = (options.dir.clone(), options.command) else {
        let _ = writeln!(err, "error: both `--dir` and a command are required");
        let _ = write_usage(err);
        return 2;
    };

    init_tracing(options.verbose);

    let layer = match open_layer(dir, options.config.clone()) {
        Ok(layer) => layer,
        Err(error) => {
            let _ = writeln!(err, "error: {error}");
            if let Some(hint) = error.suggestion() {
                let _ = writeln!(err, "hint: {hint}");
            }
            return 1;
        }
    };

    info!(target: "matguard::cli", command = command.as_str(), "running command");
    match execute(&layer, command, out) {
        Ok(code) => code,
        Err(error) => {
            let _ = writeln!(err, "error: {error}");
            1
        }
    }
}

fn parse_args<I>(args: I) -> std::result::Result<CliOptions, String>
where
    I: IntoIterator<Item = OsString>,
{
    let mut iter = args.into_iter();
    let _argv0 = iter.next();

    let mut dir: Option<PathBuf> = None;
    let mut config: Option<PathBuf> = None;
    let mut command: Option<Command> = None;
    let mut verbose = false;
    let mut show_help = false;

    while let Some(argument) = iter.next() {
        let arg = argument.to_string_lossy();
        let arg_str = arg.as_ref();

        match arg_str {
            "-h" | "--help" => {
                show_help = true;
            }
            "-v" | "--verbose" => {
                verbose = true;
            }
            "-d" | "--dir" => {
                if dir.is_some() {
                    return Err(String::from("`-d/--dir` may only be provided once"));
                }
                let next = iter
                    .next()
                    .ok_or_else(|| String::from("missing path argument for `-d/--dir`"))?;
                dir = Some(PathBuf::from(next));
            }
            "-c" | "--config" => {
                if config.is_some() {
                    return Err(String::from("`-c/--config` may only be provided once"));
                }
                let next = iter
                    .next()
                    .ok_or_else(|| String::from("missing path argument for `-c/--config`"))?;
                config = Some(PathBuf::from(next));
            }
            _ => {
                if let Some(value) = arg_str.strip_prefix("--dir=") {
                    if dir.is_some() {
                        return Err(String::from("`-d/--dir` may only be provided once"));
                    }
                    dir = Some(PathBuf::from(value));
                    continue;
                }

                if let Some(value) = arg_str.strip_prefix("--config=") {
                    if config.is_some() {
                        return Err(String::from("`-c/--config` may only be provided once"));
                    }
                    config = Some(PathBuf::from(value));
                    continue;
                }

                if arg_str.starts_with('-') {
                    return Err(format!("unknown option `{arg_str}`"));
                }

                if command.is_some() {
                    return Err(String::from(
                        "too many positional arguments; expected exactly one command",
                    ));
                }

                command = Some(
                    Command::parse(arg_str)
                        .ok_or_else(|| format!("unknown command `{arg_str}`"))?,
                );
            }
        }
    }

    Ok(CliOptions {
        dir,
        config,
        command,
        verbose,
        show_help,
    })
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .compact()
        .try_init();
}

fn open_layer(dir: PathBuf, config_path: Option<PathBuf>) -> Result<DurabilityLayer> {
    let config = match config_path {
        Some(path) => DurabilityConfig::from_toml_file(&path)?,
        None => DurabilityConfig::default(),
    };
    let durable = DirStore::open(dir)?;
    // A fresh process has no session context, so volatile tiers start empty.
    DurabilityLayer::new(Arc::new(durable), Arc::new(MemoryStore::new()), config)
}

fn execute<W>(layer: &DurabilityLayer, command: Command, out: &mut W) -> io::Result<i32>
where
    W: Write,
{
    match command {
        Command::Audit => write_json(out, &layer.audit())?,
        Command::Recover => write_json(out, &layer.recover())?,
        Command::Restore => write_json(out, &layer.recover_and_restore())?,
        Command::Status => {
            let audit = layer.audit();
            let report = StatusReport {
                enabled: layer.is_enabled(),
                heartbeat: layer.heartbeat(),
                present_tiers: audit.present_tiers(),
                all_consistent: audit.all_consistent,
                metrics: layer.metrics(),
            };
            write_json(out, &report)?;
        }
        Command::Enable | Command::Disable => {
            layer.set_enabled(command == Command::Enable);
            write_json(out, &serde_json::json!({ "enabled": layer.is_enabled() }))?;
        }
        Command::Clear => {
            let cleared = layer.clear_all();
            write_json(out, &serde_json::json!({ "cleared": cleared }))?;
            if !cleared {
                return Ok(1);
            }
        }
    }
    Ok(0)
}

fn write_json<W, T>(out: &mut W, value: &T) -> io::Result<()>
where
    W: Write,
    T: Serialize,
{
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

fn write_usage<W>(out: &mut W) -> io::Result<()>
where
    W: Write,
{
    writeln!(
        out,
        "Usage: matguard --dir PATH [--config FILE] [--verbose] COMMAND\n\
         \n\
         Commands:\n\
         \n\
         audit      Print a cross-tier audit report\n\
         recover    Print the best recoverable snapshot\n\
         restore    Recover and write the result back to primary\n\
         status     Print preservation, heartbeat and tier summary\n\
         enable     Turn preservation on\n\
         disable    Turn preservation off\n\
         clear      Remove every tier and the heartbeat\n\
         \n\
         Examples:\n\
         \n\
         matguard --dir ./state audit\n\
         matguard --dir ./state --config matguard.toml recover\n",
    )
}
