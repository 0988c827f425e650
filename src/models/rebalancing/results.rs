use itertools::Itertools;
use log::warn;
use ndarray::{s, Array2, Array3};
use serde::{Deserialize, Serialize};

use super::model::RebalancingModel;
use crate::models::utils::ConvertVars;
use crate::problem::StationIndex;
use crate::solver::{Solution, SolveError};

/// Solved values for the variables of one bike type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeResults {
    pub name: String,
    /// indexed [[s, t]]
    pub station_inventory: Array2<f64>,
    /// indexed [[v, t]]
    pub vehicle_inventory: Array2<f64>,
    /// indexed [[s, t]]
    pub trips_out: Array2<f64>,
    /// indexed [[s, t]]
    pub trips_in: Array2<f64>,
    /// indexed [[s, v, t]]
    pub pickup: Array3<f64>,
    /// indexed [[s, v, t]]
    pub drop: Array3<f64>,
    /// Forecast rentals that were not served, indexed [[s, t]]
    pub lost_rentals: Array2<f64>,
    /// Forecast returns that were not served, indexed [[s, t]]
    pub lost_returns: Array2<f64>,
}

/// A solved rebalancing plan in domain terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalancingResults {
    /// The weighted unmet demand
    pub objective: f64,
    /// indexed [[s, v, t]]
    pub location: Array3<f64>,
    pub types: Vec<TypeResults>,
    /// The station each vehicle occupies in each period, indexed [v][t]
    pub routes: Vec<Vec<StationIndex>>,
    /// The number of distinct stations each vehicle visits
    pub stations_visited: Vec<usize>,
}

impl RebalancingResults {
    pub fn new(model: &RebalancingModel, solution: &Solution) -> Result<Self, SolveError> {
        let (milp, vars, sets, parameters) = (
            model.model(),
            model.vars(),
            model.sets(),
            model.parameters(),
        );
        let assignment = &solution.assignment;

        let objective = milp
            .objective_value(assignment)
            .ok_or_else(|| SolveError::MissingValue("objective".to_string()))?;
        if (objective - solution.objective).abs() > 1e-6 * objective.abs().max(1.0) {
            warn!(
                "Solver reported objective {} but the assignment evaluates to {}",
                solution.objective, objective
            );
        }

        let types = sets
            .K
            .iter()
            .map(|k| {
                let v = &vars.types[*k];
                let trips_out = v.trips_out.convert(milp, assignment)?;
                let trips_in = v.trips_in.convert(milp, assignment)?;
                Ok(TypeResults {
                    name: parameters.names[*k].clone(),
                    station_inventory: v.station_inventory.convert(milp, assignment)?,
                    vehicle_inventory: v.vehicle_inventory.convert(milp, assignment)?,
                    lost_rentals: &parameters.f_plus[*k] - &trips_out,
                    lost_returns: &parameters.f_minus[*k] - &trips_in,
                    trips_out,
                    trips_in,
                    pickup: v.pickup.convert(milp, assignment)?,
                    drop: v.drop.convert(milp, assignment)?,
                })
            })
            .collect::<Result<Vec<_>, SolveError>>()?;

        let location = vars.location.convert(milp, assignment)?;
        let routes: Vec<Vec<StationIndex>> = sets
            .V
            .iter()
            .map(|v| {
                sets.T
                    .iter()
                    .map(|t| {
                        location
                            .slice(s![.., *v, *t])
                            .iter()
                            .position_max_by(|a, b| a.total_cmp(b))
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();
        let stations_visited = routes
            .iter()
            .map(|route| route.iter().unique().count())
            .collect();

        Ok(RebalancingResults {
            objective,
            location,
            types,
            routes,
            stations_visited,
        })
    }

    /// Total unmet demand over all bike types, unweighted
    pub fn total_lost_demand(&self) -> f64 {
        self.types
            .iter()
            .map(|k| k.lost_rentals.sum() + k.lost_returns.sum())
            .sum()
    }

    /// Total number of bikes picked up or dropped off over all bike types
    pub fn total_moved(&self) -> f64 {
        self.types
            .iter()
            .map(|k| k.pickup.sum() + k.drop.sum())
            .sum()
    }
}
