use ndarray::Array2;
use typed_index_collections::TiVec;

use crate::problem::{
    BikeTypeIndex, Problem, Quantity, QuantityDomain, StationIndex, TimeIndex, VehicleIndex,
};

/// Index sets of the rebalancing model
#[derive(Debug)]
#[allow(non_snake_case)]
pub struct Sets {
    /// Set of stations
    pub S: Vec<StationIndex>,
    /// Set of vehicles
    pub V: Vec<VehicleIndex>,
    /// Set of time periods
    pub T: Vec<TimeIndex>,
    /// Set of bike types
    pub K: Vec<BikeTypeIndex>,
}

#[allow(non_snake_case)]
impl Sets {
    pub fn new(problem: &Problem) -> Sets {
        Sets {
            S: problem.stations().iter().map(|s| s.index()).collect(),
            V: problem.vehicles().iter().map(|v| v.index()).collect(),
            T: (0..problem.timesteps()).collect(),
            K: problem.bike_types().iter().map(|k| k.index()).collect(),
        }
    }

    /// Time periods with a successor, i.e. those starting an inventory transition
    pub fn transitions(&self) -> &[TimeIndex] {
        &self.T[..self.T.len().saturating_sub(1)]
    }

    /// Shape of a (station, time) tensor
    pub fn st(&self) -> (usize, usize) {
        (self.S.len(), self.T.len())
    }

    /// Shape of a (vehicle, time) tensor
    pub fn vt(&self) -> (usize, usize) {
        (self.V.len(), self.T.len())
    }

    /// Shape of a (station, vehicle, time) tensor
    pub fn svt(&self) -> (usize, usize, usize) {
        (self.S.len(), self.V.len(), self.T.len())
    }
}

/// Parameters of the rebalancing model, per bike type where applicable
#[derive(Debug)]
#[allow(non_snake_case)]
pub struct Parameters {
    /// Capacity of station s, all bike types combined
    pub C_s: Vec<Quantity>,
    /// Capacity of vehicle v for bike type k, indexed (k, v)
    pub C_v: TiVec<BikeTypeIndex, Vec<Quantity>>,
    /// Initial inventory of bike type k at station s, indexed (k, s)
    pub d_0: TiVec<BikeTypeIndex, Vec<Quantity>>,
    /// Initial load of bike type k in vehicle v, indexed (k, v)
    pub l_0: TiVec<BikeTypeIndex, Vec<Quantity>>,
    /// Expected rental demand of bike type k, indexed (k)[[s, t]]
    pub f_plus: TiVec<BikeTypeIndex, Array2<Quantity>>,
    /// Expected return demand of bike type k, indexed (k)[[s, t]]
    pub f_minus: TiVec<BikeTypeIndex, Array2<Quantity>>,
    /// Bikes of type k lost at station s during period t, indexed (k)[[s, t]]
    pub w: TiVec<BikeTypeIndex, Array2<Quantity>>,
    /// Value of a served rental or return of bike type k
    pub a: TiVec<BikeTypeIndex, f64>,
    /// Name of bike type k, used in variable names
    pub names: TiVec<BikeTypeIndex, String>,
    /// Domain of the quantity variables
    pub domain: QuantityDomain,
}

#[allow(non_snake_case)]
impl Parameters {
    pub fn new(problem: &Problem, sets: &Sets) -> Parameters {
        let C_s = problem.stations().iter().map(|s| s.capacity()).collect();

        let per_vehicle = |f: &dyn Fn(VehicleIndex, BikeTypeIndex) -> Quantity| -> TiVec<_, Vec<_>> {
            sets.K
                .iter()
                .map(|k| sets.V.iter().map(|v| f(*v, *k)).collect())
                .collect()
        };
        let C_v = per_vehicle(&|v, k| problem.vehicles()[v].capacity()[k]);
        let l_0 = per_vehicle(&|v, k| problem.vehicles()[v].initial_load()[k]);

        let d_0 = sets
            .K
            .iter()
            .map(|k| {
                sets.S
                    .iter()
                    .map(|s| problem.stations()[*s].initial_inventory()[*k])
                    .collect()
            })
            .collect();

        let bike_types = problem.bike_types();
        Parameters {
            C_s,
            C_v,
            d_0,
            l_0,
            f_plus: bike_types.iter().map(|k| k.rental_demand().clone()).collect(),
            f_minus: bike_types.iter().map(|k| k.return_demand().clone()).collect(),
            w: bike_types.iter().map(|k| k.losses().clone()).collect(),
            a: bike_types.iter().map(|k| k.value()).collect(),
            names: bike_types.iter().map(|k| k.name().to_string()).collect(),
            domain: problem.domain(),
        }
    }

    /// Whether any bike of type k is lost over the horizon
    pub fn has_losses(&self, k: BikeTypeIndex) -> bool {
        self.w[k].iter().any(|&w| w > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate;

    #[test]
    fn transitions_exclude_the_last_period() {
        let problem = Problem::new(generate::baseline()).unwrap();
        let sets = Sets::new(&problem);

        assert_eq!(sets.T, vec![0, 1, 2]);
        assert_eq!(sets.transitions(), &[0, 1]);
        assert_eq!(sets.svt(), (5, 2, 3));
    }

    #[test]
    fn single_period_has_no_transitions() {
        let mut config = generate::baseline();
        config.timesteps = 1;
        for k in config.bike_types.iter_mut() {
            k.rental_demand.iter_mut().for_each(|row| row.truncate(1));
            k.return_demand.iter_mut().for_each(|row| row.truncate(1));
        }
        let sets = Sets::new(&Problem::new(config).unwrap());

        assert!(sets.transitions().is_empty());
    }

    #[test]
    fn parameters_are_indexed_by_bike_type() {
        let problem = Problem::new(generate::baseline()).unwrap();
        let sets = Sets::new(&problem);
        let parameters = Parameters::new(&problem, &sets);
        let classic = BikeTypeIndex::from(0);

        assert_eq!(parameters.C_s, vec![10.0; 5]);
        assert_eq!(parameters.C_v[classic], vec![20.0, 20.0]);
        assert_eq!(parameters.d_0[classic], vec![5.0, 9.0, 10.0, 4.0, 3.0]);
        assert_eq!(parameters.l_0[classic], vec![3.0, 10.0]);
        assert_eq!(parameters.f_plus[classic][[1, 1]], 4.0);
        assert_eq!(parameters.a[classic], 1.0);
        assert!(!parameters.has_losses(classic));
    }
}
