//! `bugsmith` command-line tool
//!
//! Reads a Python file (or stdin), injects bugs at the requested chaos level
//! and writes the mutant to stdout or a file. The bug log goes to stderr.

mod inject;

use std::path::PathBuf;

use bugsmith_engine::policy::DEFAULT_LEVEL;
use bugsmith_engine::ChaosLevel;
use clap::{value_parser, Arg, ArgAction, Command};
use tracing_subscriber::EnvFilter;

use crate::inject::{Input, InjectArgs, EXIT_USAGE};

fn cli() -> Command {
    Command::new("bugsmith")
        .version(bugsmith_engine::VERSION)
        .about("Inject deliberate, plausible bugs into Python source")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("inject")
                .about("Mutate a Python program")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Python file to mutate, or - for stdin"),
                )
                .arg(
                    Arg::new("level")
                        .long("level")
                        .short('l')
                        .default_value("5")
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(i64))
                        .help("Chaos level (1-10)"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the mutated program here instead of stdout"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the result as JSON"),
                )
                .arg(
                    Arg::new("no-header")
                        .long("no-header")
                        .action(ArgAction::SetTrue)
                        .help("Omit the metadata docstring"),
                ),
        )
        .subcommand(Command::new("levels").about("Show the injection probability of each level"))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_levels() {
    println!("Level  Probability");
    for level in ChaosLevel::all() {
        println!("{:>5}  {:>10.0}%", level.get(), level.probability() * 100.0);
    }
}

fn main() {
    init_tracing();

    let matches = cli().get_matches();

    let code = match matches.subcommand() {
        Some(("inject", args)) => {
            let input = match args.get_one::<PathBuf>("file") {
                Some(path) if path.as_os_str() == "-" => Input::Stdin,
                Some(path) => Input::File(path.clone()),
                None => Input::Stdin,
            };
            let inject_args = InjectArgs {
                input,
                level: args.get_one::<i64>("level").copied().unwrap_or(i64::from(DEFAULT_LEVEL)),
                seed: args.get_one::<u64>("seed").copied(),
                output: args.get_one::<PathBuf>("output").cloned(),
                json: args.get_flag("json"),
                header: !args.get_flag("no-header"),
            };
            let stdout = std::io::stdout();
            let stderr = std::io::stderr();
            inject::run(&inject_args, &mut stdout.lock(), &mut stderr.lock())
        }
        Some(("levels", _)) => {
            print_levels();
            0
        }
        _ => EXIT_USAGE,
    };

    std::process::exit(code);
}
