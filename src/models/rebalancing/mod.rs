//! The multi-period bike rebalancing model.
//!
//! Every bike type gets its own inventories, trip flows, pickups and drops, while the
//! binary location of the vehicles is shared by all bike types. Pickups remove bikes from
//! a station and drops add bikes to it.

pub mod constraints;
pub mod model;
pub mod objective;
pub mod results;
pub mod sets_and_parameters;
pub mod variables;

pub use model::RebalancingModel;
pub use results::{RebalancingResults, TypeResults};
pub use variables::{TypeVariables, Variables};
