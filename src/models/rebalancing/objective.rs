use itertools::iproduct;
use log::debug;

use super::sets_and_parameters::{Parameters, Sets};
use super::variables::Variables;
use crate::models::milp::{BuildError, LinExpr, ModelBuilder, ObjectiveSense};

/// The weighted unmet demand: for every bike type, station and period, the rentals and
/// returns that were forecast but not served, weighted by the value of the bike type.
pub fn unmet_demand(sets: &Sets, parameters: &Parameters, vars: &Variables) -> LinExpr {
    let mut obj = LinExpr::new();
    for (k, s, t) in iproduct!(&sets.K, &sets.S, &sets.T) {
        let a = parameters.a[*k];
        let x = &vars.types[*k];

        let lost_rentals = LinExpr::from(parameters.f_plus[*k][[*s, *t]]) - x.trips_out[[*s, *t]];
        let lost_returns = LinExpr::from(parameters.f_minus[*k][[*s, *t]]) - x.trips_in[[*s, *t]];
        obj += a * (lost_rentals + lost_returns);
    }
    obj
}

/// Sets the objective of the model to minimizing the weighted unmet demand
pub fn set_objective(
    builder: &mut ModelBuilder,
    sets: &Sets,
    parameters: &Parameters,
    vars: &Variables,
) -> Result<(), BuildError> {
    let obj = unmet_demand(sets, parameters, vars);
    debug!(
        "Objective has {} terms and constant {}",
        obj.terms().len(),
        obj.constant()
    );
    builder.set_objective(ObjectiveSense::Minimize, obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate;
    use crate::problem::{BikeTypeIndex, Problem};

    #[test]
    fn objective_counts_every_forecast_trip() {
        let mut config = generate::baseline();
        config.bike_types[0].value = 1.5;
        let problem = Problem::new(config).unwrap();
        let sets = Sets::new(&problem);
        let parameters = Parameters::new(&problem, &sets);
        let mut builder = ModelBuilder::new("objective");
        let vars = Variables::register(&mut builder, &sets, &parameters);
        set_objective(&mut builder, &sets, &parameters, &vars).unwrap();
        let model = builder.build().unwrap();

        let objective = model.objective();
        let classic = &vars.types[BikeTypeIndex::from(0)];
        let forecast: f64 = problem.bike_types()[BikeTypeIndex::from(0)]
            .rental_demand()
            .sum()
            + problem.bike_types()[BikeTypeIndex::from(0)]
                .return_demand()
                .sum();

        assert_eq!(objective.sense(), ObjectiveSense::Minimize);
        assert_eq!(objective.constant(), 1.5 * forecast);
        assert_eq!(objective.terms().len(), 2 * 5 * 3);
        let coefficient = |var| {
            objective
                .terms()
                .iter()
                .find(|(v, _)| *v == var)
                .map(|(_, c)| *c)
        };
        assert_eq!(coefficient(classic.trips_out[[4, 2]]), Some(-1.5));
        assert_eq!(coefficient(classic.trips_in[[0, 0]]), Some(-1.5));
        assert_eq!(coefficient(classic.pickup[[0, 0, 0]]), None);
    }
}
