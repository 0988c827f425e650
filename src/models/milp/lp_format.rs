//! Writes a [`Model`] in CPLEX LP format, readable by most MILP solvers.

use std::io::{self, Write};

use super::expr::VarId;
use super::model::{Model, ObjectiveSense, VarKind};

/// Number of terms written per line; LP readers limit line length
const TERMS_PER_LINE: usize = 8;

fn fmt_num(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{}", v.round() as i64)
    } else {
        format!("{}", v)
    }
}

impl Model {
    fn write_terms<W: Write>(&self, out: &mut W, terms: &[(VarId, f64)]) -> io::Result<()> {
        if terms.is_empty() {
            return write!(out, " 0");
        }

        for (i, (var, coeff)) in terms.iter().enumerate() {
            if i > 0 && i % TERMS_PER_LINE == 0 {
                write!(out, "\n  ")?;
            }
            let sign = if *coeff < 0.0 { '-' } else { '+' };
            let name = &self.variable(*var).name;
            match coeff.abs() {
                c if c == 1.0 => write!(out, " {} {}", sign, name)?,
                c => write!(out, " {} {} {}", sign, fmt_num(c), name)?,
            }
        }
        Ok(())
    }

    /// Writes the model in CPLEX LP format
    pub fn write_lp<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "\\ Model {}", self.name())?;

        let objective = self.objective();
        match objective.sense() {
            ObjectiveSense::Minimize => writeln!(out, "Minimize")?,
            ObjectiveSense::Maximize => writeln!(out, "Maximize")?,
        }
        write!(out, " obj:")?;
        self.write_terms(out, objective.terms())?;
        if objective.constant() != 0.0 {
            let sign = if objective.constant() < 0.0 { '-' } else { '+' };
            write!(out, " {} {}", sign, fmt_num(objective.constant().abs()))?;
        }
        writeln!(out)?;

        writeln!(out, "Subject To")?;
        for constraint in self.constraints() {
            write!(out, " {}:", constraint.name())?;
            self.write_terms(out, constraint.terms())?;
            writeln!(out, " {} {}", constraint.sense(), fmt_num(constraint.rhs()))?;
        }

        writeln!(out, "Bounds")?;
        for variable in self.variables() {
            if variable.kind == VarKind::Binary {
                continue;
            }
            match variable.upper {
                Some(ub) => writeln!(
                    out,
                    " {} <= {} <= {}",
                    fmt_num(variable.lower),
                    variable.name,
                    fmt_num(ub)
                )?,
                None => writeln!(out, " {} >= {}", variable.name, fmt_num(variable.lower))?,
            }
        }

        let of_kind = |kind: VarKind| {
            self.variables()
                .iter()
                .filter(move |v| v.kind == kind)
                .map(|v| v.name.as_str())
        };

        let general: Vec<&str> = of_kind(VarKind::Integer).collect();
        if !general.is_empty() {
            writeln!(out, "General")?;
            for chunk in general.chunks(TERMS_PER_LINE) {
                writeln!(out, " {}", chunk.join(" "))?;
            }
        }

        let binary: Vec<&str> = of_kind(VarKind::Binary).collect();
        if !binary.is_empty() {
            writeln!(out, "Binary")?;
            for chunk in binary.chunks(TERMS_PER_LINE) {
                writeln!(out, " {}", chunk.join(" "))?;
            }
        }

        writeln!(out, "End")
    }

    /// The model in CPLEX LP format
    pub fn to_lp_string(&self) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_lp(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use crate::models::milp::expr::{LinExpr, Relation};
    use crate::models::milp::model::{ModelBuilder, ObjectiveSense, VarKind};

    #[test]
    fn sections_are_written_in_order() {
        let mut builder = ModelBuilder::new("toy");
        let x = builder.add_var("x".to_string(), VarKind::Integer, &(0.0..10.0));
        let y = builder.add_var("y".to_string(), VarKind::Continuous, &(0.0..f64::INFINITY));
        let b = builder.add_var("b".to_string(), VarKind::Binary, &(0.0..1.0));
        builder.add_constr("link", (x + y).at_most(10.0 * b)).unwrap();
        builder.add_constr("fix", y.equals(2.5)).unwrap();
        builder
            .set_objective(ObjectiveSense::Minimize, LinExpr::from(4.0) - 2.0 * x)
            .unwrap();
        let model = builder.build().unwrap();

        let lp = model.to_lp_string();
        let expected = "\\ Model toy\n\
                        Minimize\n obj: - 2 x + 4\n\
                        Subject To\n link: + x + y - 10 b <= 0\n fix: + y = 2.5\n\
                        Bounds\n 0 <= x <= 10\n y >= 0\n\
                        General\n x\n\
                        Binary\n b\n\
                        End\n";
        assert_eq!(lp, expected);
    }

    #[test]
    fn long_rows_are_wrapped() {
        let mut builder = ModelBuilder::new("wide");
        let vars: Vec<_> = (0..20)
            .map(|i| builder.add_var(format!("x{i}"), VarKind::Continuous, &(0.0..1.0)))
            .collect();
        let sum = vars.iter().fold(LinExpr::new(), |acc, v| acc + v);
        builder.add_constr("sum", sum.at_most(3.0)).unwrap();
        let model = builder.build().unwrap();

        let lp = model.to_lp_string();
        assert!(lp.lines().all(|line| line.len() < 255));
        assert!(lp.contains("\n   + x8"));
    }
}
