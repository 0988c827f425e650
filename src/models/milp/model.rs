use std::collections::{HashMap, HashSet};
use std::ops::Range;

use derive_more::Display;
use log::trace;
use serde::{Deserialize, Serialize};

use super::expr::{Comparison, LinExpr, Sense, VarId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarKind {
    #[display(fmt = "continuous")]
    Continuous,
    #[display(fmt = "integer")]
    Integer,
    #[display(fmt = "binary")]
    Binary,
}

/// An entry of the variable domain table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
    pub lower: f64,
    /// `None` means unbounded above
    pub upper: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    name: String,
    terms: Vec<(VarId, f64)>,
    sense: Sense,
    rhs: f64,
}

impl Constraint {
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
    /// Terms sorted by variable, without repetitions or zero coefficients
    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }
    pub fn sense(&self) -> Sense {
        self.sense
    }
    pub fn rhs(&self) -> f64 {
        self.rhs
    }
    /// The coefficient of `var`, zero if it does not appear
    pub fn coefficient(&self, var: VarId) -> f64 {
        self.terms
            .binary_search_by_key(&var, |(v, _)| *v)
            .map(|i| self.terms[i].1)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveSense {
    #[default]
    #[display(fmt = "minimize")]
    Minimize,
    #[display(fmt = "maximize")]
    Maximize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Objective {
    sense: ObjectiveSense,
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl Objective {
    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }
    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }
    pub fn constant(&self) -> f64 {
        self.constant
    }
}

#[derive(Debug, Clone, PartialEq, Display)]
pub enum BuildError {
    /// A constraint or the objective refers to a variable handle that was never registered
    #[display(
        fmt = "`{}` refers to variable {} but only {} variables are registered",
        context,
        var,
        registered
    )]
    UnregisteredVariable {
        context: String,
        var: VarId,
        registered: usize,
    },
    /// A constraint or the objective refers to a variable name that is not in the domain table
    #[display(fmt = "`{}` refers to unknown variable `{}`", context, name)]
    UnknownVariable { context: String, name: String },
    #[display(fmt = "variable `{}` is declared twice", _0)]
    DuplicateVariable(String),
    #[display(fmt = "constraint `{}` is declared twice", _0)]
    DuplicateConstraint(String),
    #[display(fmt = "variable `{}` has bounds [{}, {:?}]", name, lower, upper)]
    InvalidBounds {
        name: String,
        lower: f64,
        upper: Option<f64>,
    },
}

impl std::error::Error for BuildError {}

/// A complete mixed-integer linear program: variable domain table, constraint list and
/// objective. Variables live in one flat store and are referred to by [`VarId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ModelInterface", try_from = "ModelInterface")]
pub struct Model {
    name: String,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: Objective,
    index: HashMap<String, VarId>,
}

impl Model {
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, var: VarId) -> &Variable {
        &self.variables[var.index()]
    }

    /// Looks up a variable by name
    pub fn var_id(&self, name: &str) -> Option<VarId> {
        self.index.get(name).copied()
    }

    /// Iterates over the variable handles in registration order
    pub fn var_ids(&self) -> impl Iterator<Item = VarId> {
        (0..self.variables.len()).map(VarId::from)
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn num_vars(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constrs(&self) -> usize {
        self.constraints.len()
    }

    /// Whether the model has integer or binary variables
    pub fn is_mip(&self) -> bool {
        self.variables.iter().any(|v| v.kind != VarKind::Continuous)
    }

    /// The name-based view of the model, suitable for serialization
    pub fn interface(&self) -> ModelInterface {
        let named = |terms: &[(VarId, f64)]| {
            terms
                .iter()
                .map(|(var, coeff)| (self.variable(*var).name.clone(), *coeff))
                .collect()
        };

        ModelInterface {
            name: self.name.clone(),
            variables: self.variables.clone(),
            constraints: self
                .constraints
                .iter()
                .map(|c| ConstraintInterface {
                    name: c.name.clone(),
                    terms: named(&c.terms),
                    sense: c.sense,
                    rhs: c.rhs,
                })
                .collect(),
            objective: ObjectiveInterface {
                sense: self.objective.sense,
                terms: named(&self.objective.terms),
                constant: self.objective.constant,
            },
        }
    }

    /// Rebuilds a model from its name-based view, resolving every name.
    pub fn from_interface(interface: ModelInterface) -> Result<Model, BuildError> {
        let mut builder = ModelBuilder::new(&interface.name);
        for variable in interface.variables {
            builder.push_var(variable);
        }

        let index = builder.index()?;
        let resolve = |context: &str, name: String| {
            index
                .get(&name)
                .copied()
                .ok_or_else(|| BuildError::UnknownVariable {
                    context: context.to_string(),
                    name,
                })
        };

        for constraint in interface.constraints {
            let mut lhs = LinExpr::new();
            for (name, coeff) in constraint.terms {
                lhs.add_term(coeff, resolve(&constraint.name, name)?);
            }
            let comparison = Comparison {
                lhs,
                sense: constraint.sense,
                rhs: LinExpr::from(constraint.rhs),
            };
            builder.add_constr(constraint.name, comparison)?;
        }

        let mut objective = LinExpr::new();
        for (name, coeff) in interface.objective.terms {
            objective.add_term(coeff, resolve("objective", name)?);
        }
        objective.add_constant(interface.objective.constant);
        builder.set_objective(interface.objective.sense, objective)?;

        builder.build()
    }
}

impl From<Model> for ModelInterface {
    fn from(model: Model) -> Self {
        model.interface()
    }
}

impl TryFrom<ModelInterface> for Model {
    type Error = BuildError;

    fn try_from(interface: ModelInterface) -> Result<Self, Self::Error> {
        Model::from_interface(interface)
    }
}

/// The serialized form of a [`Model`]: every variable is referred to by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInterface {
    pub name: String,
    pub variables: Vec<Variable>,
    pub constraints: Vec<ConstraintInterface>,
    pub objective: ObjectiveInterface,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintInterface {
    pub name: String,
    pub terms: Vec<(String, f64)>,
    pub sense: Sense,
    pub rhs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveInterface {
    pub sense: ObjectiveSense,
    pub terms: Vec<(String, f64)>,
    pub constant: f64,
}

/// Incrementally assembles a [`Model`]. Variables must be registered before any
/// constraint or objective refers to them.
#[derive(Debug)]
pub struct ModelBuilder {
    name: String,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: Objective,
}

impl ModelBuilder {
    pub fn new(name: &str) -> Self {
        ModelBuilder {
            name: name.to_string(),
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: Objective::default(),
        }
    }

    /// Registers a variable. An infinite end of `bounds` leaves that side unbounded;
    /// binary variables are always bounded by `[0, 1]`.
    pub fn add_var(&mut self, name: String, kind: VarKind, bounds: &Range<f64>) -> VarId {
        let (lower, upper) = match kind {
            VarKind::Binary => (0.0, Some(1.0)),
            _ => (
                bounds.start,
                Some(bounds.end).filter(|ub| ub.is_finite()),
            ),
        };

        self.push_var(Variable {
            name,
            kind,
            lower,
            upper,
        })
    }

    fn push_var(&mut self, variable: Variable) -> VarId {
        self.variables.push(variable);
        VarId::from(self.variables.len() - 1)
    }

    pub fn num_vars(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constrs(&self) -> usize {
        self.constraints.len()
    }

    fn check_registered(&self, context: &str, terms: &[(VarId, f64)]) -> Result<(), BuildError> {
        let registered = self.variables.len();
        match terms.iter().find(|(var, _)| var.index() >= registered) {
            Some((var, _)) => Err(BuildError::UnregisteredVariable {
                context: context.to_string(),
                var: *var,
                registered,
            }),
            None => Ok(()),
        }
    }

    pub fn add_constr(
        &mut self,
        name: impl Into<String>,
        comparison: Comparison,
    ) -> Result<(), BuildError> {
        let name = name.into();
        let (terms, sense, rhs) = comparison.normalize();
        self.check_registered(&name, &terms)?;

        trace!("{}: {} terms {} {}", name, terms.len(), sense, rhs);
        self.constraints.push(Constraint {
            name,
            terms,
            sense,
            rhs,
        });
        Ok(())
    }

    pub fn set_objective(
        &mut self,
        sense: ObjectiveSense,
        expr: impl Into<LinExpr>,
    ) -> Result<(), BuildError> {
        let (terms, constant) = expr.into().into_parts();
        self.check_registered("objective", &terms)?;

        self.objective = Objective {
            sense,
            terms,
            constant,
        };
        Ok(())
    }

    fn index(&self) -> Result<HashMap<String, VarId>, BuildError> {
        let mut index = HashMap::with_capacity(self.variables.len());
        for (i, variable) in self.variables.iter().enumerate() {
            let valid = match variable.upper {
                Some(ub) => variable.lower <= ub,
                None => true,
            };
            if !valid || !variable.lower.is_finite() {
                return Err(BuildError::InvalidBounds {
                    name: variable.name.clone(),
                    lower: variable.lower,
                    upper: variable.upper,
                });
            }
            if index.insert(variable.name.clone(), VarId::from(i)).is_some() {
                return Err(BuildError::DuplicateVariable(variable.name.clone()));
            }
        }
        Ok(index)
    }

    /// Finishes the model, checking that every variable and constraint name is unique
    pub fn build(self) -> Result<Model, BuildError> {
        let index = self.index()?;

        let mut names = HashSet::with_capacity(self.constraints.len());
        for constraint in &self.constraints {
            if !names.insert(constraint.name.as_str()) {
                return Err(BuildError::DuplicateConstraint(constraint.name.clone()));
            }
        }

        Ok(Model {
            name: self.name,
            variables: self.variables,
            constraints: self.constraints,
            objective: self.objective,
            index,
        })
    }
}
