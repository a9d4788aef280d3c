use anyhow::Result;
use clap::{CommandFactory, Parser};
use log::LevelFilter;
use std::path::{Path, PathBuf};
use thoughtstream::app::{run_capture, run_replay, summary_line};
use thoughtstream::cli::{Cli, Commands, ConfigAction};
use thoughtstream::config::{Config, TEMPLATE};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    log::debug!("thoughtstream {}", thoughtstream::version_string());

    match cli.command {
        Commands::Capture {
            board,
            serial_port,
            duration,
            output,
            show,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(b) = board {
                config.source.board = b;
            }
            if let Some(p) = serial_port {
                config.source.serial_port = p;
            }
            if let Some(d) = duration {
                config.capture.duration_secs = d.as_secs_f64();
            }
            if let Some(o) = output {
                config.output.destination = Some(o);
            }
            let report = run_capture(&config, show)?;
            if !cli.quiet {
                eprintln!("{}", summary_line(&report));
            }
        }
        Commands::Replay { path, output, show } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(o) = output {
                config.output.destination = Some(o);
            }
            let report = run_replay(&config, &path, show)?;
            if !cli.quiet {
                eprintln!("{}", summary_line(&report));
            }
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "thoughtstream",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Warn by default; each -v raises one level, -q drops to errors. RUST_LOG wins.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, 2) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    builder.parse_default_env();
    builder.format(|buf, record| {
        use std::io::Write;
        writeln!(buf, "[{}] {}", record.level(), record.args())
    });
    if let Err(e) = builder.try_init() {
        eprintln!("Failed to initialize logging: {}", e);
    }
}

fn config_path(custom_path: Option<&Path>) -> Result<PathBuf> {
    match custom_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(Config::default_path()?),
    }
}

fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        // An explicit path must exist
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path()?)?
    };

    Ok(config.with_env_overrides())
}

fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Path => {
            println!("{}", config_path(custom_path)?.display());
        }
        ConfigAction::Show => {
            let config = Config::load_or_default(&config_path(custom_path)?)?.with_env_overrides();
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Dump => {
            print!("{}", TEMPLATE);
        }
    }
    Ok(())
}
