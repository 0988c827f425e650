use derive_more::{Deref, From, Into};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use typed_index_collections::TiVec;

use crate::validate::{self, ConfigError};

/// The type used for bike quantities (inventories, demands, capacities)
pub type Quantity = f64;

pub type StationIndex = usize;
pub type VehicleIndex = usize;
pub type TimeIndex = usize;

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
pub struct BikeTypeIndex(usize);

/// The domain used for every quantity variable of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityDomain {
    /// Whole bikes only
    #[default]
    Integer,
    /// Fractional quantities are allowed (LP relaxation of the flows)
    Continuous,
}

/// The raw, unvalidated configuration of a rebalancing instance.
///
/// Every vector is indexed by station, vehicle or time period, and every matrix
/// is indexed `[station][time]`. Use [`Problem::new`] to validate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Number of stations (S)
    pub stations: usize,
    /// Number of vehicles (V)
    pub vehicles: usize,
    /// Number of time periods (T)
    pub timesteps: usize,
    /// Maximum number of bikes at each station, all bike types combined
    pub station_capacity: Vec<Quantity>,
    /// Domain of the quantity variables
    #[serde(default)]
    pub domain: QuantityDomain,
    /// The bike types (commodities) of the instance
    pub bike_types: Vec<BikeTypeConfig>,
}

/// Configuration of a single bike type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BikeTypeConfig {
    /// Name of the bike type, used in variable names
    pub name: String,
    /// Value of a served rental or return of this type
    pub value: f64,
    /// Capacity of each vehicle for this bike type
    pub vehicle_capacity: Vec<Quantity>,
    /// Initial number of bikes of this type at each station
    pub initial_station_inventory: Vec<Quantity>,
    /// Initial number of bikes of this type in each vehicle
    pub initial_vehicle_load: Vec<Quantity>,
    /// Expected rental demand, indexed `[station][time]`
    pub rental_demand: Vec<Vec<Quantity>>,
    /// Expected return demand, indexed `[station][time]`
    pub return_demand: Vec<Vec<Quantity>>,
    /// Bikes lost from the station inventory (e.g. depleted batteries), indexed `[station][time]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub losses: Option<Vec<Vec<Quantity>>>,
}

/// A validated rebalancing instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    /// The stations, ordered by index
    stations: Vec<Station>,
    /// The vehicles, ordered by index
    vehicles: Vec<Vehicle>,
    /// The bike types, ordered by index
    bike_types: TiVec<BikeTypeIndex, BikeType>,
    /// The number of time periods
    timesteps: usize,
    /// Domain of the quantity variables
    domain: QuantityDomain,
}

impl Problem {
    /// Validates `config` and builds the problem from it.
    pub fn new(config: Config) -> Result<Problem, ConfigError> {
        validate::validate(&config)?;

        let Config {
            stations,
            vehicles,
            timesteps,
            station_capacity,
            domain,
            bike_types,
        } = config;

        let stations = (0..stations)
            .map(|s| Station {
                index: s,
                capacity: station_capacity[s],
                initial_inventory: bike_types
                    .iter()
                    .map(|k| k.initial_station_inventory[s])
                    .collect(),
            })
            .collect();

        let vehicles = (0..vehicles)
            .map(|v| Vehicle {
                index: v,
                capacity: bike_types.iter().map(|k| k.vehicle_capacity[v]).collect(),
                initial_load: bike_types.iter().map(|k| k.initial_vehicle_load[v]).collect(),
            })
            .collect();

        let matrix = |rows: &[Vec<Quantity>]| {
            Array2::from_shape_fn((rows.len(), timesteps), |(s, t)| rows[s][t])
        };

        let bike_types = bike_types
            .into_iter()
            .enumerate()
            .map(|(k, bike_type)| BikeType {
                index: BikeTypeIndex(k),
                rental_demand: matrix(&bike_type.rental_demand),
                return_demand: matrix(&bike_type.return_demand),
                losses: match &bike_type.losses {
                    Some(losses) => matrix(losses),
                    None => Array2::zeros((bike_type.rental_demand.len(), timesteps)),
                },
                name: bike_type.name,
                value: bike_type.value,
            })
            .collect();

        Ok(Problem {
            stations,
            vehicles,
            bike_types,
            timesteps,
            domain,
        })
    }

    /// Deserializes a configuration from JSON and validates it.
    pub fn from_json(string: &str) -> Result<Problem, crate::Error> {
        let config: Config = serde_json::from_str(string)?;
        Ok(Problem::new(config)?)
    }

    /// Reads a JSON configuration and validates it.
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Problem, crate::Error> {
        let config: Config = serde_json::from_reader(reader)?;
        Ok(Problem::new(config)?)
    }

    /// The stations, ordered by index (continuous, starting at 0)
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// The vehicles, ordered by index (continuous, starting at 0)
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// The bike types sharing the stations and vehicles
    pub fn bike_types(&self) -> &TiVec<BikeTypeIndex, BikeType> {
        &self.bike_types
    }

    /// The number of time periods in the horizon
    pub fn timesteps(&self) -> usize {
        self.timesteps
    }

    /// Domain of the quantity variables
    pub fn domain(&self) -> QuantityDomain {
        self.domain
    }
}

impl TryFrom<Config> for Problem {
    type Error = ConfigError;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        Problem::new(config)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// The index of the station
    index: StationIndex,
    /// Maximum number of bikes, all types combined
    capacity: Quantity,
    /// Initial number of bikes of each type
    initial_inventory: TiVec<BikeTypeIndex, Quantity>,
}

impl Station {
    /// The index of the station
    pub fn index(&self) -> StationIndex {
        self.index
    }
    /// Maximum number of bikes, all types combined
    pub fn capacity(&self) -> Quantity {
        self.capacity
    }
    /// Initial number of bikes of each type
    pub fn initial_inventory(&self) -> &TiVec<BikeTypeIndex, Quantity> {
        &self.initial_inventory
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    /// The index of the vehicle
    index: VehicleIndex,
    /// Carrying capacity for each bike type
    capacity: TiVec<BikeTypeIndex, Quantity>,
    /// Initial load of each bike type
    initial_load: TiVec<BikeTypeIndex, Quantity>,
}

impl Vehicle {
    /// The index of the vehicle
    pub fn index(&self) -> VehicleIndex {
        self.index
    }
    /// Carrying capacity for each bike type
    pub fn capacity(&self) -> &TiVec<BikeTypeIndex, Quantity> {
        &self.capacity
    }
    /// Initial load of each bike type
    pub fn initial_load(&self) -> &TiVec<BikeTypeIndex, Quantity> {
        &self.initial_load
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BikeType {
    /// The index of the bike type
    index: BikeTypeIndex,
    /// The name of the bike type
    name: String,
    /// Value of a served rental or return
    value: f64,
    /// Expected rental demand, indexed `[[station, time]]`
    rental_demand: Array2<Quantity>,
    /// Expected return demand, indexed `[[station, time]]`
    return_demand: Array2<Quantity>,
    /// Bikes lost from the station inventory, indexed `[[station, time]]`
    losses: Array2<Quantity>,
}

impl BikeType {
    /// The index of the bike type
    pub fn index(&self) -> BikeTypeIndex {
        self.index
    }
    /// The name of the bike type
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
    /// Value of a served rental or return
    pub fn value(&self) -> f64 {
        self.value
    }
    /// Expected rental demand, indexed `[[station, time]]`
    pub fn rental_demand(&self) -> &Array2<Quantity> {
        &self.rental_demand
    }
    /// Expected return demand, indexed `[[station, time]]`
    pub fn return_demand(&self) -> &Array2<Quantity> {
        &self.return_demand
    }
    /// Bikes lost from the station inventory, indexed `[[station, time]]`
    pub fn losses(&self) -> &Array2<Quantity> {
        &self.losses
    }
    /// Whether any bikes of this type are lost over the horizon
    pub fn has_losses(&self) -> bool {
        self.losses.iter().any(|&w| w > 0.0)
    }
}
