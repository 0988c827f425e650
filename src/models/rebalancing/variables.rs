use std::ops::Range;

use log::debug;
use ndarray::{Array2, Array3};
use typed_index_collections::TiVec;

use super::sets_and_parameters::{Parameters, Sets};
use crate::models::milp::{ModelBuilder, VarId, VarKind};
use crate::models::utils::AddVars;
use crate::problem::{BikeTypeIndex, QuantityDomain};

/// The variables of a single bike type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeVariables {
    /// Bikes at station s at the start of period t, indexed [[s, t]]
    pub station_inventory: Array2<VarId>,
    /// Bikes in vehicle v at the start of period t, indexed [[v, t]]
    pub vehicle_inventory: Array2<VarId>,
    /// Successful rentals at station s during period t, indexed [[s, t]]
    pub trips_out: Array2<VarId>,
    /// Successful returns at station s during period t, indexed [[s, t]]
    pub trips_in: Array2<VarId>,
    /// Bikes vehicle v picks up at station s during period t, indexed [[s, v, t]]
    pub pickup: Array3<VarId>,
    /// Bikes vehicle v drops off at station s during period t, indexed [[s, v, t]]
    pub drop: Array3<VarId>,
}

/// Every decision variable of the rebalancing model.
#[derive(Debug, Clone, PartialEq)]
pub struct Variables {
    /// 1 if vehicle v is at station s during period t, shared by all bike types, indexed [[s, v, t]]
    pub location: Array3<VarId>,
    /// The per bike type variables
    pub types: TiVec<BikeTypeIndex, TypeVariables>,
}

impl Variables {
    /// Registers every variable of the model. Nothing is registered afterwards.
    #[allow(non_snake_case)]
    pub fn register(builder: &mut ModelBuilder, sets: &Sets, parameters: &Parameters) -> Variables {
        let kind = match parameters.domain {
            QuantityDomain::Integer => VarKind::Integer,
            QuantityDomain::Continuous => VarKind::Continuous,
        };
        let upto = |ub: f64| -> (VarKind, Range<f64>) { (kind, 0.0..ub) };

        let location = sets.svt().binary(builder, "at");

        let types = sets
            .K
            .iter()
            .map(|&k| {
                let name = &parameters.names[k];
                let C_v = &parameters.C_v[k];

                let station_inventory = sets
                    .st()
                    .vars_with(builder, &format!("station_inventory_{name}"), |(s, _)| {
                        upto(parameters.C_s[s])
                    });
                let vehicle_inventory = sets
                    .vt()
                    .vars_with(builder, &format!("vehicle_inventory_{name}"), |(v, _)| {
                        upto(C_v[v])
                    });
                let trips_out = sets
                    .st()
                    .vars_with(builder, &format!("trips_out_{name}"), |(s, t)| {
                        upto(parameters.f_plus[k][[s, t]])
                    });
                let trips_in = sets
                    .st()
                    .vars_with(builder, &format!("trips_in_{name}"), |(s, t)| {
                        upto(parameters.f_minus[k][[s, t]])
                    });
                let pickup = sets
                    .svt()
                    .vars_with(builder, &format!("pickup_{name}"), |(_, v, _)| upto(C_v[v]));
                let drop = sets
                    .svt()
                    .vars_with(builder, &format!("drop_{name}"), |(_, v, _)| upto(C_v[v]));

                TypeVariables {
                    station_inventory,
                    vehicle_inventory,
                    trips_out,
                    trips_in,
                    pickup,
                    drop,
                }
            })
            .collect();

        debug!("Registered {} variables", builder.num_vars());

        Variables { location, types }
    }
}
