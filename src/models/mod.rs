pub mod milp;
pub mod rebalancing;
pub mod utils;

pub use rebalancing::RebalancingModel;
