pub mod generate;
pub mod models;
pub mod problem;
pub mod solver;
pub mod validate;

#[cfg(feature = "python")]
pub mod python;

use derive_more::{Display, From};

use crate::models::milp::BuildError;
use crate::solver::SolveError;
use crate::validate::ConfigError;

pub use crate::models::rebalancing::{RebalancingModel, RebalancingResults};
pub use crate::problem::{Config, Problem};

/// Any error raised between reading a configuration and writing results
#[derive(Debug, Display, From)]
pub enum Error {
    #[display(fmt = "invalid configuration: {}", _0)]
    Config(ConfigError),
    #[display(fmt = "failed to build model: {}", _0)]
    Build(BuildError),
    #[display(fmt = "failed to solve model: {}", _0)]
    Solve(SolveError),
    #[display(fmt = "malformed JSON: {}", _0)]
    Json(serde_json::Error),
    #[display(fmt = "I/O error: {}", _0)]
    Io(std::io::Error),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(err) => Some(err),
            Error::Build(err) => Some(err),
            Error::Solve(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Validates `config` and builds its rebalancing model
pub fn build(config: Config) -> Result<RebalancingModel> {
    let problem = Problem::new(config)?;
    Ok(RebalancingModel::build(&problem)?)
}
