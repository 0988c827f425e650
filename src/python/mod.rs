use std::collections::HashMap;
use std::fmt::Debug;

use log::trace;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::generate::{self, Shape};
use crate::models::milp::Assignment;
use crate::models::rebalancing::model::TOLERANCE;
use crate::problem::{Config, Problem};
use crate::RebalancingModel;

pub fn pyerr<D: Debug>(err: D) -> PyErr {
    PyErr::new::<PyValueError, _>(format!("{:?}", err))
}

fn config_from_json(string: &str) -> PyResult<Config> {
    serde_json::from_str(string).map_err(pyerr)
}

/// A built rebalancing model
#[pyclass(name = "Model")]
pub struct PyModel {
    inner: RebalancingModel,
}

#[pymethods]
impl PyModel {
    /// Validates a JSON configuration and builds its model
    #[new]
    pub fn new(config: &str) -> PyResult<PyModel> {
        let problem = Problem::new(config_from_json(config)?).map_err(pyerr)?;
        let inner = RebalancingModel::build(&problem).map_err(pyerr)?;
        Ok(PyModel { inner })
    }

    #[getter]
    pub fn num_vars(&self) -> usize {
        self.inner.model().num_vars()
    }

    #[getter]
    pub fn num_constrs(&self) -> usize {
        self.inner.model().num_constrs()
    }

    /// The model interface as JSON
    pub fn json(&self) -> PyResult<String> {
        serde_json::to_string(self.inner.model()).map_err(pyerr)
    }

    /// The model in CPLEX LP format
    pub fn lp(&self) -> String {
        self.inner.model().to_lp_string()
    }

    /// The objective value of an assignment, if it assigns every variable of the objective
    pub fn objective_value(&self, assignment: HashMap<String, f64>) -> Option<f64> {
        let assignment: Assignment = assignment.into_iter().collect();
        self.inner.model().objective_value(&assignment)
    }

    /// Every way in which an assignment fails to satisfy the model
    pub fn check(&self, assignment: HashMap<String, f64>) -> Vec<String> {
        let assignment: Assignment = assignment.into_iter().collect();
        let violations = self.inner.model().check(&assignment, TOLERANCE);
        trace!("{} violations", violations.len());
        violations.iter().map(|v| v.to_string()).collect()
    }

    pub fn __str__(&self) -> String {
        format!(
            "Model({} variables, {} constraints)",
            self.num_vars(),
            self.num_constrs()
        )
    }

    pub fn __repr__(&self) -> String {
        self.__str__()
    }
}

/// Validates a JSON configuration, raising `ValueError` on the first violation
#[pyfunction]
pub fn validate(config: &str) -> PyResult<()> {
    crate::validate::validate(&config_from_json(config)?).map_err(pyerr)
}

/// The baseline configuration as JSON
#[pyfunction]
pub fn baseline() -> PyResult<String> {
    serde_json::to_string(&generate::baseline()).map_err(pyerr)
}

/// A random configuration as JSON
#[pyfunction]
pub fn random(
    stations: usize,
    vehicles: usize,
    timesteps: usize,
    electric: bool,
    seed: u64,
) -> PyResult<String> {
    let shape = Shape {
        stations,
        vehicles,
        timesteps,
        electric,
    };
    serde_json::to_string(&generate::random(&shape, seed)).map_err(pyerr)
}

/// The name of this function must match the `lib.name` setting in `Cargo.toml`
#[pymodule]
fn rebalance(_py: Python, m: &PyModule) -> PyResult<()> {
    pyo3_log::init();

    m.add_class::<PyModel>()?;
    m.add_function(wrap_pyfunction!(validate, m)?)?;
    m.add_function(wrap_pyfunction!(baseline, m)?)?;
    m.add_function(wrap_pyfunction!(random, m)?)?;
    Ok(())
}
