use itertools::iproduct;
use log::debug;
use ndarray::{Array2, Array3};

use super::sets_and_parameters::{Parameters, Sets};
use super::variables::Variables;
use crate::models::milp::{BuildError, LinSum, ModelBuilder, Relation, VarId};
use crate::problem::BikeTypeIndex;

type Family = fn(&mut ModelBuilder, &Sets, &Parameters, &Variables) -> Result<(), BuildError>;

/// Adds every constraint family of the rebalancing model
pub fn add_all(
    builder: &mut ModelBuilder,
    sets: &Sets,
    parameters: &Parameters,
    vars: &Variables,
) -> Result<(), BuildError> {
    let families: [(&str, Family); 6] = [
        ("initial conditions", initial_conditions),
        ("vehicle balance", vehicle_balance),
        ("station balance", station_balance),
        ("location exclusivity", location_exclusivity),
        ("capacity coupling", capacity_coupling),
        ("combined station capacity", combined_station_capacity),
    ];

    for &(family, add) in families.iter() {
        let before = builder.num_constrs();
        add(builder, sets, parameters, vars)?;
        debug!("Added {} {} constraints", builder.num_constrs() - before, family);
    }

    Ok(())
}

/// Inventories at t = 0 equal the configured initial inventories
pub fn initial_conditions(
    builder: &mut ModelBuilder,
    sets: &Sets,
    parameters: &Parameters,
    vars: &Variables,
) -> Result<(), BuildError> {
    for k in &sets.K {
        let name = &parameters.names[*k];
        let d = &vars.types[*k].station_inventory;
        let l = &vars.types[*k].vehicle_inventory;

        for s in &sets.S {
            builder.add_constr(
                format!("init_station_{name}_{s}"),
                d[[*s, 0]].equals(parameters.d_0[*k][*s]),
            )?;
        }
        for v in &sets.V {
            builder.add_constr(
                format!("init_vehicle_{name}_{v}"),
                l[[*v, 0]].equals(parameters.l_0[*k][*v]),
            )?;
        }
    }
    Ok(())
}

/// A vehicle's load grows by what it picks up and shrinks by what it drops
pub fn vehicle_balance(
    builder: &mut ModelBuilder,
    sets: &Sets,
    parameters: &Parameters,
    vars: &Variables,
) -> Result<(), BuildError> {
    for (k, v, t) in iproduct!(&sets.K, &sets.V, sets.transitions()) {
        let name = &parameters.names[*k];
        let TypeVars { l, p, r, .. } = TypeVars::of(vars, *k);

        let moved = sets
            .S
            .iter()
            .map(|s| p[[*s, *v, *t]] - r[[*s, *v, *t]])
            .lin_sum();

        builder.add_constr(
            format!("vehicle_balance_{name}_{v}_{t}"),
            l[[*v, *t + 1]].equals(l[[*v, *t]] + moved),
        )?;
    }
    Ok(())
}

/// Station inventory loses pickups, rentals and lost bikes, and gains drops and returns
pub fn station_balance(
    builder: &mut ModelBuilder,
    sets: &Sets,
    parameters: &Parameters,
    vars: &Variables,
) -> Result<(), BuildError> {
    for k in &sets.K {
        let name = &parameters.names[*k];
        let losses = parameters.has_losses(*k);
        let TypeVars {
            d,
            p,
            r,
            x_plus,
            x_minus,
            ..
        } = TypeVars::of(vars, *k);

        for (s, t) in iproduct!(&sets.S, sets.transitions()) {
            let moved = sets
                .V
                .iter()
                .map(|v| p[[*s, *v, *t]] - r[[*s, *v, *t]])
                .lin_sum();

            let mut rhs = d[[*s, *t]] - moved - x_plus[[*s, *t]] + x_minus[[*s, *t]];
            if losses {
                rhs = rhs - parameters.w[*k][[*s, *t]];
            }

            builder.add_constr(
                format!("station_balance_{name}_{s}_{t}"),
                d[[*s, *t + 1]].equals(rhs),
            )?;
        }
    }
    Ok(())
}

/// Every vehicle occupies exactly one station in every period
pub fn location_exclusivity(
    builder: &mut ModelBuilder,
    sets: &Sets,
    _: &Parameters,
    vars: &Variables,
) -> Result<(), BuildError> {
    for (v, t) in iproduct!(&sets.V, &sets.T) {
        let occupied = sets.S.iter().map(|s| vars.location[[*s, *v, *t]]).lin_sum();
        builder.add_constr(format!("location_{v}_{t}"), occupied.equals(1.0))?;
    }
    Ok(())
}

/// Bikes are only moved between a vehicle and the station the vehicle is at, and never
/// more than the vehicle's capacity for that bike type.
pub fn capacity_coupling(
    builder: &mut ModelBuilder,
    sets: &Sets,
    parameters: &Parameters,
    vars: &Variables,
) -> Result<(), BuildError> {
    for (k, s, v, t) in iproduct!(&sets.K, &sets.S, &sets.V, &sets.T) {
        let name = &parameters.names[*k];
        let TypeVars { p, r, .. } = TypeVars::of(vars, *k);
        let z = vars.location[[*s, *v, *t]];

        builder.add_constr(
            format!("coupling_{name}_{s}_{v}_{t}"),
            (p[[*s, *v, *t]] + r[[*s, *v, *t]]).at_most(parameters.C_v[*k][*v] * z),
        )?;
    }
    Ok(())
}

/// All bike types at a station share its capacity. Redundant with the bounds for a single type.
pub fn combined_station_capacity(
    builder: &mut ModelBuilder,
    sets: &Sets,
    parameters: &Parameters,
    vars: &Variables,
) -> Result<(), BuildError> {
    if sets.K.len() < 2 {
        return Ok(());
    }

    for (s, t) in iproduct!(&sets.S, &sets.T) {
        let total = sets
            .K
            .iter()
            .map(|k| vars.types[*k].station_inventory[[*s, *t]])
            .lin_sum();
        builder.add_constr(
            format!("station_capacity_{s}_{t}"),
            total.at_most(parameters.C_s[*s]),
        )?;
    }
    Ok(())
}

/// Short names for the variables of one bike type
struct TypeVars<'a> {
    d: &'a Array2<VarId>,
    l: &'a Array2<VarId>,
    x_plus: &'a Array2<VarId>,
    x_minus: &'a Array2<VarId>,
    p: &'a Array3<VarId>,
    r: &'a Array3<VarId>,
}

impl<'a> TypeVars<'a> {
    fn of(vars: &'a Variables, k: BikeTypeIndex) -> Self {
        let t = &vars.types[k];
        TypeVars {
            d: &t.station_inventory,
            l: &t.vehicle_inventory,
            x_plus: &t.trips_out,
            x_minus: &t.trips_in,
            p: &t.pickup,
            r: &t.drop,
        }
    }
}
