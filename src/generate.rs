//! Problem instances: the baseline instance and seeded random instances.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::problem::{BikeTypeConfig, Config, QuantityDomain};

/// Five stations, two vehicles and three periods of classic bikes.
pub fn baseline() -> Config {
    Config {
        stations: 5,
        vehicles: 2,
        timesteps: 3,
        station_capacity: vec![10.0; 5],
        domain: QuantityDomain::Integer,
        bike_types: vec![BikeTypeConfig {
            name: "classic".to_string(),
            value: 1.0,
            vehicle_capacity: vec![20.0, 20.0],
            initial_station_inventory: vec![5.0, 9.0, 10.0, 4.0, 3.0],
            initial_vehicle_load: vec![3.0, 10.0],
            rental_demand: vec![
                vec![6.0, 0.0, 0.0],
                vec![1.0, 4.0, 0.0],
                vec![1.0, 1.0, 0.0],
                vec![1.0, 1.0, 3.0],
                vec![1.0, 1.0, 7.0],
            ],
            return_demand: vec![
                vec![0.0, 0.0, 0.0],
                vec![2.0, 0.0, 0.0],
                vec![1.0, 3.0, 0.0],
                vec![0.0, 0.0, 1.0],
                vec![2.0, 0.0, 1.0],
            ],
            losses: None,
        }],
    }
}

/// The dimensions of a random instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub stations: usize,
    pub vehicles: usize,
    pub timesteps: usize,
    /// Whether electric bikes are offered next to classic bikes
    pub electric: bool,
}

impl Shape {
    pub fn classic(stations: usize, vehicles: usize, timesteps: usize) -> Self {
        Shape {
            stations,
            vehicles,
            timesteps,
            electric: false,
        }
    }

    pub fn electric(stations: usize, vehicles: usize, timesteps: usize) -> Self {
        Shape {
            electric: true,
            ..Shape::classic(stations, vehicles, timesteps)
        }
    }
}

/// A `[station][time]` matrix drawn entry by entry
fn matrix(
    rng: &mut StdRng,
    shape: &Shape,
    mut f: impl FnMut(&mut StdRng, usize) -> f64,
) -> Vec<Vec<f64>> {
    (0..shape.stations)
        .map(|s| (0..shape.timesteps).map(|_| f(rng, s)).collect())
        .collect()
}

/// A valid random instance of the given shape. Equal seeds give equal instances.
pub fn random(shape: &Shape, seed: u64) -> Config {
    let mut rng = StdRng::seed_from_u64(seed);

    let station_capacity: Vec<f64> = (0..shape.stations)
        .map(|_| rng.gen_range(5..=20) as f64)
        .collect();

    let mut types = vec![("classic", 1.0, 5..=20)];
    if shape.electric {
        types.push(("electric", 2.0, 0..=10));
    }

    // Room left at each station once earlier bike types are placed
    let mut room = station_capacity.clone();
    let bike_types = types
        .into_iter()
        .map(|(name, value, vehicle_capacity)| {
            let vehicle_capacity: Vec<f64> = (0..shape.vehicles)
                .map(|_| rng.gen_range(vehicle_capacity.clone()) as f64)
                .collect();
            let initial_vehicle_load = vehicle_capacity
                .iter()
                .map(|&c| rng.gen_range(0..=c as u32) as f64)
                .collect();
            let initial_station_inventory = room
                .iter_mut()
                .map(|r| {
                    let inventory = rng.gen_range(0..=*r as u32) as f64;
                    *r -= inventory;
                    inventory
                })
                .collect();

            let demand = |rng: &mut StdRng, s: usize| {
                rng.gen_range(0..=(station_capacity[s] / 2.0) as u32) as f64
            };
            let rental_demand = matrix(&mut rng, shape, demand);
            let return_demand = matrix(&mut rng, shape, demand);
            let losses = (name == "electric")
                .then(|| matrix(&mut rng, shape, |rng, _| rng.gen_bool(0.1) as u32 as f64));

            BikeTypeConfig {
                name: name.to_string(),
                value,
                vehicle_capacity,
                initial_station_inventory,
                initial_vehicle_load,
                rental_demand,
                return_demand,
                losses,
            }
        })
        .collect();

    Config {
        stations: shape.stations,
        vehicles: shape.vehicles,
        timesteps: shape.timesteps,
        station_capacity,
        domain: QuantityDomain::Integer,
        bike_types,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate;

    #[test]
    fn random_instances_are_reproducible() {
        let shape = Shape::electric(6, 2, 4);

        assert_eq!(random(&shape, 42), random(&shape, 42));
        assert_ne!(random(&shape, 42), random(&shape, 43));
    }

    #[test]
    fn random_instances_are_valid() {
        for seed in 0..50 {
            for shape in [
                Shape::classic(1, 0, 1),
                Shape::classic(4, 3, 5),
                Shape::electric(5, 2, 3),
            ] {
                let config = random(&shape, seed);
                assert_eq!(validate(&config), Ok(()), "{shape:?} with seed {seed}");
            }
        }
    }

    #[test]
    fn electric_bikes_are_worth_more() {
        let config = random(&Shape::electric(3, 1, 2), 0);

        assert_eq!(config.bike_types.len(), 2);
        assert_eq!(config.bike_types[1].name, "electric");
        assert_eq!(config.bike_types[1].value, 2.0);
        assert!(config.bike_types[1].losses.is_some());
        assert!(config.bike_types[0].losses.is_none());
    }
}
