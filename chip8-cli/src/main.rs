//! Entrypoint for CLI
use std::{env, fs, process};

use chip8_cli::{AppError, Chip8App, CliConf};
use chip8_hw::prelude::*;
use log::{error, info};
use slog::{o, Drain};

static USAGE: &str = r#"
usage: chip8 CMD FILE [CONFIG]

commands:
    run     Run the target ROM file, with optional YAML configuration
    dis     Disassemble the target ROM into readable assembly

examples:
    chip8 run maze.rom
    chip8 run breakout.rom breakout.yaml
    chip8 dis breakout.rom
"#;

fn run_rom(filepath: &str, config: Option<&str>) -> Result<i32, AppError> {
    let conf = match config {
        Some(path) => CliConf::from_file(path)?,
        None => CliConf::default(),
    };

    let decorator = slog_term::PlainDecorator::new(std::io::stdout());
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = drain.filter_level(conf.log_level.into()).fuse();
    let logger = slog::Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")));

    let _scope_guard = slog_scope::set_global_logger(logger.clone());
    if let Err(err) = slog_stdlog::init_with_level(conf.log_level.into()) {
        eprintln!("failed to install log bridge: {err}");
    }

    info!("starting...");
    let mut app = Chip8App::new(conf, &logger);
    app.load_rom(filepath)?;

    let state = app.run()?;
    println!("{}", app.vm().dump_display()?);

    match state {
        MachineState::Crashed { .. } => {
            error!("{state}");
            Ok(1)
        }
        _ => {
            info!("done");
            Ok(0)
        }
    }
}

fn disassemble(filepath: &str) -> Result<i32, AppError> {
    let bytecode = fs::read(filepath)?;
    print!("{}", Disassembler::new(&bytecode).listing()?);
    Ok(0)
}

fn main() {
    let result = match parse_args(env::args().skip(1)) {
        Some(Cmd::Run { filepath, config }) => run_rom(&filepath, config.as_deref()),
        Some(Cmd::Dis { filepath }) => disassemble(&filepath),
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            process::exit(64)
        }
    };

    match result {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("{err}");
            process::exit(1)
        }
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Cmd> {
    let cmd = match args.next()?.as_str() {
        "run" => Cmd::Run {
            filepath: args.next()?,
            config: args.next(),
        },
        "dis" => Cmd::Dis {
            filepath: args.next()?,
        },
        _ => return None,
    };

    // Trailing arguments are a usage error.
    match args.next() {
        Some(_) => None,
        None => Some(cmd),
    }
}

fn print_usage() {
    println!("Chip8 v{}", env!("CARGO_PKG_VERSION"));
    println!("{USAGE}");
}

#[derive(Debug, PartialEq, Eq)]
enum Cmd {
    /// Run file
    Run {
        filepath: String,
        config: Option<String>,
    },
    /// Disassemble
    Dis { filepath: String },
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> Option<Cmd> {
        parse_args(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn test_parse_run() {
        assert_eq!(
            parse(&["run", "maze.rom"]),
            Some(Cmd::Run {
                filepath: "maze.rom".to_string(),
                config: None,
            })
        );
        assert_eq!(
            parse(&["run", "maze.rom", "maze.yaml"]),
            Some(Cmd::Run {
                filepath: "maze.rom".to_string(),
                config: Some("maze.yaml".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_dis() {
        assert_eq!(
            parse(&["dis", "maze.rom"]),
            Some(Cmd::Dis {
                filepath: "maze.rom".to_string(),
            })
        );
    }

    #[test]
    fn test_usage_errors() {
        assert_eq!(parse(&[]), None);
        assert_eq!(parse(&["play", "maze.rom"]), None);
        assert_eq!(parse(&["run"]), None);
        assert_eq!(parse(&["dis"]), None);
    }

    #[test]
    fn test_trailing_arguments() {
        assert_eq!(parse(&["run", "maze.rom", "maze.yaml", "extra"]), None);
        assert_eq!(parse(&["dis", "maze.rom", "maze.yaml"]), None);
    }
}
