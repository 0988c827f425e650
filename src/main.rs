use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgEnum, Parser, Subcommand};
use log::{error, info};

use rebalance::generate::{self, Shape};
use rebalance::solver;
use rebalance::{Error, Problem, RebalancingModel};

/// Builds and solves multi-period bike rebalancing models
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a configuration
    Validate {
        /// Path to a JSON configuration
        config: PathBuf,
    },
    /// Build the model of a configuration and write it
    Build {
        /// Path to a JSON configuration
        config: PathBuf,
        #[clap(long, arg_enum, default_value = "json")]
        format: Format,
        /// Where to write the model, stdout if absent
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Write a generated configuration
    Generate {
        /// The five-station baseline instance, ignoring the shape options
        #[clap(long)]
        baseline: bool,
        #[clap(long, default_value_t = 5)]
        stations: usize,
        #[clap(long, default_value_t = 2)]
        vehicles: usize,
        #[clap(long, default_value_t = 3)]
        timesteps: usize,
        /// Add electric bikes next to classic bikes
        #[clap(long)]
        electric: bool,
        #[clap(long, default_value_t = 0)]
        seed: u64,
        /// Where to write the configuration, stdout if absent
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Build and solve the model of a configuration, writing the results
    Solve {
        /// Path to a JSON configuration
        config: PathBuf,
        /// Time limit in seconds
        #[clap(long)]
        time_limit: Option<f64>,
        /// Where to write the results, stdout if absent
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ArgEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Json,
    Lp,
}

fn read_problem(path: &Path) -> Result<Problem, Error> {
    let file = File::open(path)?;
    Problem::from_reader(BufReader::new(file))
}

fn writer(output: &Option<PathBuf>) -> Result<Box<dyn Write>, Error> {
    Ok(match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout()),
    })
}

fn write_json<T: serde::Serialize>(output: &Option<PathBuf>, value: &T) -> Result<(), Error> {
    let mut out = writer(output)?;
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Writes the results of a solved model. Any other outcome is logged and fails the run.
#[cfg(feature = "gurobi")]
fn solve(
    model: &RebalancingModel,
    time_limit: Option<Duration>,
    output: &Option<PathBuf>,
) -> Result<ExitCode, Error> {
    use rebalance::solver::{gurobi::Gurobi, SolveOutcome};

    match model.solve(&Gurobi::default(), time_limit)? {
        SolveOutcome::Solved(results) => {
            info!(
                "Unmet demand {} (weighted {}), {} bikes moved",
                results.total_lost_demand(),
                results.objective,
                results.total_moved()
            );
            write_json(output, &results)?;
            Ok(ExitCode::SUCCESS)
        }
        SolveOutcome::Infeasible => {
            error!("The model is infeasible");
            Ok(ExitCode::FAILURE)
        }
        SolveOutcome::Unbounded => {
            error!("The model is unbounded");
            Ok(ExitCode::FAILURE)
        }
        SolveOutcome::TimedOut => {
            error!("The time limit was reached before a solution was proven optimal");
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(not(feature = "gurobi"))]
fn solve(
    _: &RebalancingModel,
    _: Option<Duration>,
    _: &Option<PathBuf>,
) -> Result<ExitCode, Error> {
    Err(Error::Solve(solver::SolveError::Backend(
        "no solver available, rebuild with `--features gurobi`".to_string(),
    )))
}

fn run(args: Args) -> Result<ExitCode, Error> {
    match args.command {
        Command::Validate { config } => {
            let problem = read_problem(&config)?;
            info!(
                "{} is valid: {} stations, {} vehicles, {} periods, bike types {:?}",
                config.display(),
                problem.stations().len(),
                problem.vehicles().len(),
                problem.timesteps(),
                problem
                    .bike_types()
                    .iter()
                    .map(|k| k.name())
                    .collect::<Vec<_>>()
            );
            Ok(ExitCode::SUCCESS)
        }
        Command::Build {
            config,
            format,
            output,
        } => {
            let model = RebalancingModel::build(&read_problem(&config)?)?.into_model();
            match format {
                Format::Json => write_json(&output, &model)?,
                Format::Lp => {
                    let mut out = writer(&output)?;
                    model.write_lp(&mut out)?;
                    out.flush()?;
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Generate {
            baseline,
            stations,
            vehicles,
            timesteps,
            electric,
            seed,
            output,
        } => {
            let config = if baseline {
                generate::baseline()
            } else {
                let shape = Shape {
                    stations,
                    vehicles,
                    timesteps,
                    electric,
                };
                generate::random(&shape, seed)
            };
            write_json(&output, &config)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Solve {
            config,
            time_limit,
            output,
        } => {
            let time_limit = time_limit.map(solver::time_limit).transpose()?;
            let model = RebalancingModel::build(&read_problem(&config)?)?;
            solve(&model, time_limit, &output)
        }
    }
}

pub fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
