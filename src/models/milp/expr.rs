use std::collections::BTreeMap;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Handle to a variable registered in a [`super::ModelBuilder`]. The handle is the
/// position of the variable in the model's flat variable store.
#[derive(Debug, Display, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
#[display(fmt = "#{}", _0)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A linear combination of variables plus a constant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_term(&mut self, coeff: f64, var: VarId) -> &mut Self {
        self.terms.push((var, coeff));
        self
    }

    pub fn add_constant(&mut self, constant: f64) -> &mut Self {
        self.constant += constant;
        self
    }

    /// The raw terms, in insertion order and possibly repeating variables
    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Merges repeated variables, drops zero coefficients and sorts the terms by variable.
    pub fn into_parts(self) -> (Vec<(VarId, f64)>, f64) {
        let mut merged = BTreeMap::new();
        for (var, coeff) in self.terms {
            *merged.entry(var).or_insert(0.0) += coeff;
        }

        let terms = merged.into_iter().filter(|(_, c)| *c != 0.0).collect();
        (terms, self.constant)
    }

    fn scale(mut self, factor: f64) -> Self {
        for (_, coeff) in self.terms.iter_mut() {
            *coeff *= factor;
        }
        self.constant *= factor;
        self
    }
}

impl From<VarId> for LinExpr {
    fn from(var: VarId) -> Self {
        LinExpr {
            terms: vec![(var, 1.0)],
            constant: 0.0,
        }
    }
}

impl From<&VarId> for LinExpr {
    fn from(var: &VarId) -> Self {
        LinExpr::from(*var)
    }
}

impl From<f64> for LinExpr {
    fn from(constant: f64) -> Self {
        LinExpr {
            terms: Vec::new(),
            constant,
        }
    }
}

impl From<&f64> for LinExpr {
    fn from(constant: &f64) -> Self {
        LinExpr::from(*constant)
    }
}

impl<T: Into<LinExpr>> AddAssign<T> for LinExpr {
    fn add_assign(&mut self, rhs: T) {
        let rhs = rhs.into();
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
    }
}

impl<T: Into<LinExpr>> Add<T> for LinExpr {
    type Output = LinExpr;

    fn add(mut self, rhs: T) -> LinExpr {
        self += rhs;
        self
    }
}

impl<T: Into<LinExpr>> Sub<T> for LinExpr {
    type Output = LinExpr;

    fn sub(mut self, rhs: T) -> LinExpr {
        self += rhs.into().scale(-1.0);
        self
    }
}

impl Neg for LinExpr {
    type Output = LinExpr;

    fn neg(self) -> LinExpr {
        self.scale(-1.0)
    }
}

impl Mul<f64> for LinExpr {
    type Output = LinExpr;

    fn mul(self, rhs: f64) -> LinExpr {
        self.scale(rhs)
    }
}

impl Mul<LinExpr> for f64 {
    type Output = LinExpr;

    fn mul(self, rhs: LinExpr) -> LinExpr {
        rhs.scale(self)
    }
}

impl<T: Into<LinExpr>> Add<T> for VarId {
    type Output = LinExpr;

    fn add(self, rhs: T) -> LinExpr {
        LinExpr::from(self) + rhs
    }
}

impl<T: Into<LinExpr>> Sub<T> for VarId {
    type Output = LinExpr;

    fn sub(self, rhs: T) -> LinExpr {
        LinExpr::from(self) - rhs
    }
}

impl Mul<VarId> for f64 {
    type Output = LinExpr;

    fn mul(self, rhs: VarId) -> LinExpr {
        LinExpr {
            terms: vec![(rhs, self)],
            constant: 0.0,
        }
    }
}

/// Sums an iterator of variables or expressions into a single expression.
pub trait LinSum {
    fn lin_sum(self) -> LinExpr;
}

impl<I> LinSum for I
where
    I: IntoIterator,
    I::Item: Into<LinExpr>,
{
    fn lin_sum(self) -> LinExpr {
        let mut expr = LinExpr::new();
        for item in self {
            expr += item;
        }
        expr
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum Sense {
    #[serde(rename = "<=")]
    #[display(fmt = "<=")]
    Le,
    #[serde(rename = ">=")]
    #[display(fmt = ">=")]
    Ge,
    #[serde(rename = "=")]
    #[display(fmt = "=")]
    Eq,
}

impl Sense {
    /// Whether `lhs (sense) rhs` holds up to `tolerance`
    pub fn holds(self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            Sense::Le => lhs <= rhs + tolerance,
            Sense::Ge => lhs >= rhs - tolerance,
            Sense::Eq => (lhs - rhs).abs() <= tolerance,
        }
    }
}

/// A linear (in)equality `lhs (sense) rhs` between two expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub lhs: LinExpr,
    pub sense: Sense,
    pub rhs: LinExpr,
}

impl Comparison {
    /// Moves every variable to the left and every constant to the right.
    pub fn normalize(self) -> (Vec<(VarId, f64)>, Sense, f64) {
        let (terms, constant) = (self.lhs - self.rhs).into_parts();
        // `-0.0` would otherwise leak into the right-hand side
        (terms, self.sense, 0.0 - constant)
    }
}

/// Builds comparisons from anything that converts into a [`LinExpr`].
pub trait Relation: Into<LinExpr> + Sized {
    fn equals(self, rhs: impl Into<LinExpr>) -> Comparison {
        Comparison {
            lhs: self.into(),
            sense: Sense::Eq,
            rhs: rhs.into(),
        }
    }

    fn at_most(self, rhs: impl Into<LinExpr>) -> Comparison {
        Comparison {
            lhs: self.into(),
            sense: Sense::Le,
            rhs: rhs.into(),
        }
    }

    fn at_least(self, rhs: impl Into<LinExpr>) -> Comparison {
        Comparison {
            lhs: self.into(),
            sense: Sense::Ge,
            rhs: rhs.into(),
        }
    }
}

impl<T: Into<LinExpr>> Relation for T {}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(i: usize) -> VarId {
        VarId::from(i)
    }

    #[test]
    fn repeated_variables_are_merged() {
        let expr = var(2) + var(0) + 3.0 * var(2) - var(0) + 4.0;
        let (terms, constant) = expr.into_parts();

        assert_eq!(terms, vec![(var(2), 4.0)]);
        assert_eq!(constant, 4.0);
    }

    #[test]
    fn sums_accept_variables_and_expressions() {
        let vars = [var(0), var(1), var(2)];
        let (terms, _) = vars.iter().lin_sum().into_parts();
        assert_eq!(terms.len(), 3);

        let doubled = vars.iter().map(|v| 2.0 * *v).lin_sum();
        let (terms, _) = doubled.into_parts();
        assert!(terms.iter().all(|(_, c)| *c == 2.0));

        let empty: Vec<VarId> = Vec::new();
        assert_eq!(empty.lin_sum(), LinExpr::new());
    }

    #[test]
    fn comparisons_move_constants_right() {
        // x1 + 2 == x0 - 3  =>  x1 - x0 == -5
        let (terms, sense, rhs) = (var(1) + 2.0).equals(var(0) - 3.0).normalize();

        assert_eq!(terms, vec![(var(0), -1.0), (var(1), 1.0)]);
        assert_eq!(sense, Sense::Eq);
        assert_eq!(rhs, -5.0);
    }

    #[test]
    fn zero_coefficients_vanish() {
        // x0 + x1 <= 0 * x2
        let (terms, sense, rhs) = (var(0) + var(1)).at_most(0.0 * var(2)).normalize();
        assert_eq!(terms, vec![(var(0), 1.0), (var(1), 1.0)]);
        assert_eq!(sense, Sense::Le);
        assert_eq!(rhs, 0.0);
        assert!(rhs.is_sign_positive());
    }

    #[test]
    fn senses_hold_with_tolerance() {
        assert!(Sense::Le.holds(1.0 + 1e-9, 1.0, 1e-6));
        assert!(!Sense::Ge.holds(0.5, 1.0, 1e-6));
        assert!(Sense::Eq.holds(2.0, 2.0, 0.0));
    }
}
