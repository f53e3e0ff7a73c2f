use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use colored::Colorize;
use exe_delegate_core::{DelegateError, Settings, author, codec, runner};
use log::LevelFilter;

/// Wrap a command line into a self-describing delegate executable
#[derive(Parser, Debug)]
#[command(
    name = "exe-delegate",
    about = "Create executables that run a fixed command with extra arguments appended",
    version,
    arg_required_else_help = true
)]
#[command(group(ArgGroup::new("mode").required(true).args(["output", "parse", "update"])))]
struct Cli {
    /// Generate a delegate at this path that runs COMMAND
    #[arg(short, long, value_name = "DELEGATE", requires = "command")]
    output: Option<PathBuf>,

    /// Print the command embedded in a delegate
    #[arg(short, long, value_name = "DELEGATE", conflicts_with = "command")]
    parse: Option<PathBuf>,

    /// Rebuild a delegate on top of this executable, keeping its command
    #[arg(short, long, value_name = "DELEGATE", conflicts_with = "command")]
    update: Option<PathBuf>,

    /// Program and fixed arguments for --output
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    command: Vec<String>,
}

fn init_logging(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .filter_module("goblin", LevelFilter::Warn)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} {}",
                std::process::id(),
                record.level(),
                record.args()
            )
        })
        .init();
}

/// Delegate mode when the running binary carries a record, author mode
/// otherwise. Returns the process exit code.
fn run(settings: &Settings) -> Result<i32> {
    log::debug!("args: {:?}", settings.args);

    if let Some(record) = codec::detect(&settings.current_exe) {
        log::debug!("delegating to {:?}", record.command);
        let status = runner::run(&record, settings.extra_args())?;
        return Ok(runner::exit_code(status));
    }

    let cli = match Cli::try_parse_from(settings.args.iter()) {
        Ok(cli) => cli,
        Err(err) => {
            err.print()?;
            return Ok(err.exit_code());
        }
    };

    if let Some(output) = cli.output {
        let written = author::generate(&settings.current_exe, &output, cli.command)
            .with_context(|| format!("cannot generate delegate {}", output.display()))?;
        log::info!("generated {}", written.display());
    } else if let Some(path) = cli.parse {
        let record = author::inspect(&path)
            .with_context(|| format!("cannot parse delegate {}", path.display()))?;
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else if let Some(path) = cli.update {
        let record = author::update(&settings.current_exe, &path)
            .with_context(|| format!("cannot update delegate {}", path.display()))?;
        log::info!("updated {} running {:?}", path.display(), record.command);
    }

    Ok(0)
}

fn report(err: &anyhow::Error) -> i32 {
    eprintln!("{} {err:#}", "error:".red().bold());
    err.downcast_ref::<DelegateError>()
        .map_or(1, DelegateError::exit_code)
}

fn main() {
    let settings = Settings::from_env();
    init_logging(settings.debug);

    let code = match run(&settings) {
        Ok(code) => code,
        Err(err) => report(&err),
    };
    std::process::exit(code);
}
