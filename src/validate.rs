//! Shape and range checks on a [`Config`], run before any variable is created.

use std::collections::HashSet;

use derive_more::Display;

use crate::problem::{Config, Quantity, QuantityDomain};

/// The dimension a vector or matrix axis is expected to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Dimension {
    #[display(fmt = "stations (S)")]
    Stations,
    #[display(fmt = "vehicles (V)")]
    Vehicles,
    #[display(fmt = "time periods (T)")]
    Timesteps,
}

#[derive(Debug, Clone, PartialEq, Display)]
pub enum ConfigError {
    /// There must be at least one station
    #[display(fmt = "the configuration has no stations")]
    NoStations,
    /// The horizon must contain at least one time period
    #[display(fmt = "the configuration has no time periods")]
    NoTimesteps,
    /// There must be at least one bike type
    #[display(fmt = "the configuration has no bike types")]
    NoBikeTypes,
    /// A vector or matrix axis does not match the declared dimension
    #[display(
        fmt = "`{}` has length {}, expected {} (one per {})",
        field,
        actual,
        expected,
        dimension
    )]
    LengthMismatch {
        field: String,
        dimension: Dimension,
        expected: usize,
        actual: usize,
    },
    /// A quantity is NaN or infinite
    #[display(fmt = "`{}` must be finite, got {}", field, value)]
    NotFinite { field: String, value: f64 },
    /// A capacity, inventory, demand or value is negative
    #[display(fmt = "`{}` must be non-negative, got {}", field, value)]
    Negative { field: String, value: f64 },
    /// An initial inventory or loss is fractional while quantities are whole bikes
    #[display(fmt = "`{}` must be a whole number of bikes, got {}", field, value)]
    NotIntegral { field: String, value: f64 },
    /// The initial inventory of a station or vehicle exceeds its capacity
    #[display(
        fmt = "`{}` has initial inventory {} exceeding capacity {}",
        field,
        inventory,
        capacity
    )]
    InventoryExceedsCapacity {
        field: String,
        inventory: Quantity,
        capacity: Quantity,
    },
    /// Bike type names must be non-empty and consist of ASCII alphanumerics or `_`
    #[display(fmt = "`bike_types[{}].name` is not a valid identifier: {:?}", index, name)]
    InvalidName { index: usize, name: String },
    /// Two bike types share the same name
    #[display(fmt = "`bike_types[{}].name` duplicates the name {:?}", index, name)]
    DuplicateName { index: usize, name: String },
}

impl std::error::Error for ConfigError {}

fn check_length(
    field: impl Into<String>,
    dimension: Dimension,
    expected: usize,
    actual: usize,
) -> Result<(), ConfigError> {
    if expected != actual {
        return Err(ConfigError::LengthMismatch {
            field: field.into(),
            dimension,
            expected,
            actual,
        });
    }
    Ok(())
}

fn check_quantity(field: impl Fn() -> String, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite {
            field: field(),
            value,
        });
    }
    if value < 0.0 {
        return Err(ConfigError::Negative {
            field: field(),
            value,
        });
    }
    Ok(())
}

/// Quantities fixed by an equality must be whole when the variables are integer
fn check_integral(field: &str, values: &[Quantity]) -> Result<(), ConfigError> {
    match values.iter().position(|value| value.fract() != 0.0) {
        Some(i) => Err(ConfigError::NotIntegral {
            field: format!("{field}[{i}]"),
            value: values[i],
        }),
        None => Ok(()),
    }
}

fn check_vector(
    field: &str,
    values: &[Quantity],
    dimension: Dimension,
    expected: usize,
) -> Result<(), ConfigError> {
    check_length(field, dimension, expected, values.len())?;
    for (i, &value) in values.iter().enumerate() {
        check_quantity(|| format!("{field}[{i}]"), value)?;
    }
    Ok(())
}

/// Checks a `[station][time]` matrix
fn check_matrix(
    field: &str,
    rows: &[Vec<Quantity>],
    stations: usize,
    timesteps: usize,
) -> Result<(), ConfigError> {
    check_length(field, Dimension::Stations, stations, rows.len())?;
    for (s, row) in rows.iter().enumerate() {
        check_vector(&format!("{field}[{s}]"), row, Dimension::Timesteps, timesteps)?;
    }
    Ok(())
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validates the shapes and ranges of every field of `config`.
///
/// The first violation found is returned; nothing is built from a configuration
/// that fails validation.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let (s, v, t) = (config.stations, config.vehicles, config.timesteps);

    if s == 0 {
        return Err(ConfigError::NoStations);
    }
    if t == 0 {
        return Err(ConfigError::NoTimesteps);
    }
    if config.bike_types.is_empty() {
        return Err(ConfigError::NoBikeTypes);
    }

    check_vector(
        "station_capacity",
        &config.station_capacity,
        Dimension::Stations,
        s,
    )?;

    let mut names = HashSet::new();
    for (k, bike_type) in config.bike_types.iter().enumerate() {
        if !is_identifier(&bike_type.name) {
            return Err(ConfigError::InvalidName {
                index: k,
                name: bike_type.name.clone(),
            });
        }
        if !names.insert(bike_type.name.as_str()) {
            return Err(ConfigError::DuplicateName {
                index: k,
                name: bike_type.name.clone(),
            });
        }

        let field = |name: &str| format!("bike_types[{k}].{name}");

        check_quantity(|| field("value"), bike_type.value)?;
        check_vector(
            &field("vehicle_capacity"),
            &bike_type.vehicle_capacity,
            Dimension::Vehicles,
            v,
        )?;
        check_vector(
            &field("initial_station_inventory"),
            &bike_type.initial_station_inventory,
            Dimension::Stations,
            s,
        )?;
        check_vector(
            &field("initial_vehicle_load"),
            &bike_type.initial_vehicle_load,
            Dimension::Vehicles,
            v,
        )?;
        check_matrix(&field("rental_demand"), &bike_type.rental_demand, s, t)?;
        check_matrix(&field("return_demand"), &bike_type.return_demand, s, t)?;
        if let Some(losses) = &bike_type.losses {
            check_matrix(&field("losses"), losses, s, t)?;
        }

        if config.domain == QuantityDomain::Integer {
            check_integral(
                &field("initial_station_inventory"),
                &bike_type.initial_station_inventory,
            )?;
            check_integral(
                &field("initial_vehicle_load"),
                &bike_type.initial_vehicle_load,
            )?;
            for (station, row) in bike_type.losses.iter().flatten().enumerate() {
                check_integral(&format!("{}[{station}]", field("losses")), row)?;
            }
        }

        for (vehicle, (&load, &capacity)) in bike_type
            .initial_vehicle_load
            .iter()
            .zip(&bike_type.vehicle_capacity)
            .enumerate()
        {
            if load > capacity {
                return Err(ConfigError::InventoryExceedsCapacity {
                    field: format!("{}[{vehicle}]", field("initial_vehicle_load")),
                    inventory: load,
                    capacity,
                });
            }
        }
    }

    // Station capacity is shared by all bike types
    for (station, &capacity) in config.station_capacity.iter().enumerate() {
        let inventory: Quantity = config
            .bike_types
            .iter()
            .map(|k| k.initial_station_inventory[station])
            .sum();

        if inventory > capacity {
            return Err(ConfigError::InventoryExceedsCapacity {
                field: format!("initial_station_inventory[{station}]"),
                inventory,
                capacity,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate;

    fn field_of(err: ConfigError) -> String {
        match err {
            ConfigError::LengthMismatch { field, .. }
            | ConfigError::NotFinite { field, .. }
            | ConfigError::Negative { field, .. }
            | ConfigError::NotIntegral { field, .. }
            | ConfigError::InventoryExceedsCapacity { field, .. } => field,
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn baseline_is_valid() {
        assert_eq!(validate(&generate::baseline()), Ok(()));
    }

    #[test]
    fn empty_dimensions_are_rejected() {
        let mut config = generate::baseline();
        config.stations = 0;
        assert_eq!(validate(&config), Err(ConfigError::NoStations));

        let mut config = generate::baseline();
        config.timesteps = 0;
        assert_eq!(validate(&config), Err(ConfigError::NoTimesteps));

        let mut config = generate::baseline();
        config.bike_types.clear();
        assert_eq!(validate(&config), Err(ConfigError::NoBikeTypes));
    }

    #[test]
    fn demand_rows_must_span_the_horizon() {
        let mut config = generate::baseline();
        config.bike_types[0].rental_demand[3].pop();

        assert_eq!(
            validate(&config),
            Err(ConfigError::LengthMismatch {
                field: "bike_types[0].rental_demand[3]".to_string(),
                dimension: Dimension::Timesteps,
                expected: 3,
                actual: 2,
            })
        );
    }

    #[test]
    fn vectors_must_match_their_dimension() {
        let mut config = generate::baseline();
        config.bike_types[0].vehicle_capacity.push(20.0);

        let err = validate(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::LengthMismatch {
                dimension: Dimension::Vehicles,
                expected: 2,
                actual: 3,
                ..
            }
        ));
        assert_eq!(field_of(err), "bike_types[0].vehicle_capacity");

        let mut config = generate::baseline();
        config.station_capacity.pop();
        assert_eq!(field_of(validate(&config).unwrap_err()), "station_capacity");
    }

    #[test]
    fn negative_and_non_finite_quantities_are_rejected() {
        let mut config = generate::baseline();
        config.bike_types[0].return_demand[1][2] = -1.0;
        assert_eq!(
            validate(&config),
            Err(ConfigError::Negative {
                field: "bike_types[0].return_demand[1][2]".to_string(),
                value: -1.0,
            })
        );

        let mut config = generate::baseline();
        config.station_capacity[4] = f64::NAN;
        assert_eq!(
            field_of(validate(&config).unwrap_err()),
            "station_capacity[4]"
        );

        let mut config = generate::baseline();
        config.bike_types[0].value = -2.0;
        assert_eq!(
            field_of(validate(&config).unwrap_err()),
            "bike_types[0].value"
        );
    }

    #[test]
    fn whole_bikes_are_required_for_integer_quantities() {
        let mut config = generate::baseline();
        config.bike_types[0].initial_station_inventory[0] = 2.5;
        assert_eq!(
            validate(&config),
            Err(ConfigError::NotIntegral {
                field: "bike_types[0].initial_station_inventory[0]".to_string(),
                value: 2.5,
            })
        );

        let mut config = generate::baseline();
        config.bike_types[0].initial_vehicle_load[1] = 0.5;
        assert_eq!(
            field_of(validate(&config).unwrap_err()),
            "bike_types[0].initial_vehicle_load[1]"
        );

        let mut config = generate::baseline();
        config.bike_types[0].losses = Some(vec![vec![0.0, 0.25, 0.0]; 5]);
        assert_eq!(
            field_of(validate(&config).unwrap_err()),
            "bike_types[0].losses[0][1]"
        );

        // only bounds see capacities and demands, so those may be fractional
        let mut config = generate::baseline();
        config.station_capacity[0] = 10.5;
        config.bike_types[0].rental_demand[0][0] = 1.5;
        assert_eq!(validate(&config), Ok(()));

        let mut config = generate::baseline();
        config.domain = QuantityDomain::Continuous;
        config.bike_types[0].initial_station_inventory[0] = 2.5;
        assert_eq!(validate(&config), Ok(()));
    }

    #[test]
    fn initial_inventory_must_fit() {
        let mut config = generate::baseline();
        config.bike_types[0].initial_station_inventory[2] = 11.0;
        assert_eq!(
            validate(&config),
            Err(ConfigError::InventoryExceedsCapacity {
                field: "initial_station_inventory[2]".to_string(),
                inventory: 11.0,
                capacity: 10.0,
            })
        );

        let mut config = generate::baseline();
        config.bike_types[0].initial_vehicle_load[1] = 21.0;
        assert_eq!(
            field_of(validate(&config).unwrap_err()),
            "bike_types[0].initial_vehicle_load[1]"
        );
    }

    #[test]
    fn station_capacity_is_shared_between_bike_types() {
        let mut config = generate::baseline();
        let mut electric = config.bike_types[0].clone();
        electric.name = "electric".to_string();
        electric.initial_station_inventory = vec![5.0, 1.0, 0.0, 0.0, 0.0];
        config.bike_types.push(electric);

        // 9 classic + 1 electric fits, 5 classic + 5 electric fits, 10 + 0 fits
        assert_eq!(validate(&config), Ok(()));

        config.bike_types[1].initial_station_inventory[2] = 1.0;
        assert_eq!(
            field_of(validate(&config).unwrap_err()),
            "initial_station_inventory[2]"
        );
    }

    #[test]
    fn bike_type_names_must_be_unique_identifiers() {
        let mut config = generate::baseline();
        config.bike_types[0].name = "e bike".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidName { index: 0, .. })
        ));

        let mut config = generate::baseline();
        let duplicate = config.bike_types[0].clone();
        config.bike_types.push(duplicate);
        assert!(matches!(
            validate(&config),
            Err(ConfigError::DuplicateName { index: 1, .. })
        ));
    }

    #[test]
    fn errors_name_the_offending_field() {
        let err = ConfigError::LengthMismatch {
            field: "bike_types[0].rental_demand".to_string(),
            dimension: Dimension::Stations,
            expected: 5,
            actual: 4,
        };
        assert_eq!(
            err.to_string(),
            "`bike_types[0].rental_demand` has length 4, expected 5 (one per stations (S))"
        );
    }
}
