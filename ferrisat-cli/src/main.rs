use std::env;
use std::fs;
use std::io::{self, Read, Write};

use anyhow::Error;
use clap::{value_t, App, AppSettings, Arg};
use env_logger::{fmt, Builder, Target};
use log::{error, info};
use log::{Level, LevelFilter, Record};

use ferrisat::{SolveResult, Solver};

fn main() {
    let exit_code = match main_with_err() {
        Err(err) => {
            error!("{}", err);
            1
        }
        Ok(exit_code) => exit_code,
    };
    std::process::exit(exit_code);
}

fn init_logging() {
    let format = |buf: &mut fmt::Formatter, record: &Record| {
        if record.level() == Level::Info {
            writeln!(buf, "c {}", record.args())
        } else {
            writeln!(buf, "c {}: {}", record.level(), record.args())
        }
    };

    let mut builder = Builder::new();
    builder
        .target(Target::Stdout)
        .format(format)
        .filter(None, LevelFilter::Info);

    if let Ok(ref env_var) = env::var("FERRISAT_LOG") {
        builder.parse_filters(env_var);
    }

    builder.init();
}

fn banner() {
    info!("This is ferrisat {}", env!("CARGO_PKG_VERSION"));
}

fn main_with_err() -> Result<i32, Error> {
    let matches = App::new("ferrisat")
        .version(env!("CARGO_PKG_VERSION"))
        .setting(AppSettings::DisableHelpSubcommand)
        .arg_from_usage("[INPUT] 'The input file to use (stdin if omitted)'")
        .arg(
            Arg::from_usage(
                "[max-conflicts] --max-conflicts=[N] 'Give up after N conflicts and report unknown'",
            ),
        )
        .get_matches();

    init_logging();
    banner();

    let max_conflicts = if matches.is_present("max-conflicts") {
        Some(value_t!(matches, "max-conflicts", u64)?)
    } else {
        None
    };

    let mut solver = Solver::new();

    let stdin = io::stdin();

    let mut locked_stdin;
    let mut opened_file;

    let file = match matches.value_of("INPUT") {
        Some(path) => {
            info!("Reading file '{}'", path);
            opened_file = fs::File::open(path)?;
            &mut opened_file as &mut dyn Read
        }
        None => {
            info!("Reading from stdin");
            locked_stdin = stdin.lock();
            &mut locked_stdin as &mut dyn Read
        }
    };

    solver.add_dimacs_cnf(file)?;

    let result = match max_conflicts {
        Some(budget) => solver.solve_limited(budget),
        None => solver.solve(),
    };

    match result {
        SolveResult::Sat(model) => {
            println!("s SATISFIABLE");
            print!("v");
            for lit in model {
                print!(" {}", lit);
            }
            println!(" 0");
            Ok(10)
        }
        SolveResult::Unsat(_) => {
            println!("s UNSATISFIABLE");
            Ok(20)
        }
        SolveResult::Unknown => {
            println!("s UNKNOWN");
            Ok(0)
        }
    }
}
