use std::ops::Range;

use ndarray::{Array, Array2, Array3, Dimension};

use crate::models::milp::{Assignment, Model, ModelBuilder, VarId, VarKind};
use crate::solver::SolveError;

/// Registers a tensor of variables, one per index of `Self`, named `{base_name}_{i}_{j}..`.
pub trait AddVars: Copy {
    type Out;

    /// Create variables whose kind and bounds are chosen per index
    fn vars_with<F: FnMut(Self) -> (VarKind, Range<f64>)>(
        &self,
        builder: &mut ModelBuilder,
        base_name: &str,
        func: F,
    ) -> Self::Out;

    /// Create variables sharing one kind and one set of bounds
    fn vars(
        &self,
        builder: &mut ModelBuilder,
        base_name: &str,
        kind: VarKind,
        bounds: &Range<f64>,
    ) -> Self::Out {
        self.vars_with(builder, base_name, |_| (kind, bounds.clone()))
    }

    /// Binary variables
    fn binary(&self, builder: &mut ModelBuilder, base_name: &str) -> Self::Out {
        self.vars(builder, base_name, VarKind::Binary, &(0.0..1.0))
    }

    /// A continuous non-negative variable
    fn cont(&self, builder: &mut ModelBuilder, base_name: &str) -> Self::Out {
        self.vars(builder, base_name, VarKind::Continuous, &(0.0..f64::INFINITY))
    }
}

impl AddVars for (usize, usize) {
    type Out = Array2<VarId>;

    fn vars_with<F: FnMut(Self) -> (VarKind, Range<f64>)>(
        &self,
        builder: &mut ModelBuilder,
        base_name: &str,
        mut func: F,
    ) -> Self::Out {
        Array2::from_shape_fn(*self, |(i, j)| {
            let (kind, bounds) = func((i, j));
            builder.add_var(format!("{}_{}_{}", base_name, i, j), kind, &bounds)
        })
    }
}

impl AddVars for (usize, usize, usize) {
    type Out = Array3<VarId>;

    fn vars_with<F: FnMut(Self) -> (VarKind, Range<f64>)>(
        &self,
        builder: &mut ModelBuilder,
        base_name: &str,
        mut func: F,
    ) -> Self::Out {
        Array3::from_shape_fn(*self, |(i, j, k)| {
            let (kind, bounds) = func((i, j, k));
            builder.add_var(format!("{}_{}_{}_{}", base_name, i, j, k), kind, &bounds)
        })
    }
}

/// Reads the solved values of variables back out of an assignment
pub trait ConvertVars {
    type Out;
    fn convert(&self, model: &Model, assignment: &Assignment) -> Result<Self::Out, SolveError>;
}

impl ConvertVars for VarId {
    type Out = f64;

    fn convert(&self, model: &Model, assignment: &Assignment) -> Result<Self::Out, SolveError> {
        model
            .value(assignment, *self)
            .ok_or_else(|| SolveError::MissingValue(model.variable(*self).name.clone()))
    }
}

impl<D: Dimension> ConvertVars for Array<VarId, D> {
    type Out = Array<f64, D>;

    fn convert(&self, model: &Model, assignment: &Assignment) -> Result<Self::Out, SolveError> {
        let mut out = Array::zeros(self.raw_dim());
        for (value, var) in out.iter_mut().zip(self.iter()) {
            *value = var.convert(model, assignment)?;
        }
        Ok(out)
    }
}

impl<T: ConvertVars> ConvertVars for Vec<T> {
    type Out = Vec<T::Out>;

    fn convert(&self, model: &Model, assignment: &Assignment) -> Result<Self::Out, SolveError> {
        let mut out = Vec::with_capacity(self.len());
        for e in self {
            out.push(e.convert(model, assignment)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tensors_are_named_by_index() {
        let mut builder = ModelBuilder::new("tensor");
        let x = (2, 3).cont(&mut builder, "x");
        let z = (2, 1, 2).binary(&mut builder, "z");
        let model = builder.build().unwrap();

        assert_eq!(x.shape(), &[2, 3]);
        assert_eq!(model.variable(x[[1, 2]]).name, "x_1_2");
        assert_eq!(model.variable(z[[1, 0, 1]]).name, "z_1_0_1");
        assert_eq!(model.variable(z[[0, 0, 0]]).kind, VarKind::Binary);
        // Registration follows the index order
        assert_eq!(x[[0, 1]].index() + 1, x[[0, 2]].index());
        assert_eq!(z[[0, 0, 0]].index(), 6);
    }

    #[test]
    fn bounds_can_vary_per_index() {
        let mut builder = ModelBuilder::new("bounded");
        let y = (2, 2).vars_with(&mut builder, "y", |(i, j)| {
            (VarKind::Integer, 0.0..(i * 2 + j) as f64)
        });
        let model = builder.build().unwrap();

        assert_eq!(model.variable(y[[1, 1]]).upper, Some(3.0));
        assert_eq!(model.variable(y[[0, 0]]).upper, Some(0.0));
    }

    #[test]
    fn values_are_converted_with_shape() {
        let mut builder = ModelBuilder::new("convert");
        let x = (2, 2).cont(&mut builder, "x");
        let model = builder.build().unwrap();

        let assignment: Assignment = x
            .iter()
            .map(|v| (model.variable(*v).name.clone(), v.index() as f64))
            .collect();
        let values = x.convert(&model, &assignment).unwrap();
        assert_eq!(values[[1, 0]], 2.0);

        let partial: Assignment = assignment
            .iter()
            .filter(|(name, _)| *name != "x_0_1")
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        assert_eq!(
            x.convert(&model, &partial).unwrap_err(),
            SolveError::MissingValue("x_0_1".to_string())
        );
    }
}
