use std::io::{self, Write};

use super::*;
use crate::Map;

const TERMS_PER_LINE: usize = 8;

impl Model {
    fn write_expr(&self, mut w: impl Write, expr: &LinExpr) -> io::Result<()> {
        if expr.terms().is_empty() {
            return write!(w, " 0");
        }
        for (k, &(v, c)) in expr.terms().iter().enumerate() {
            if k > 0 && k % TERMS_PER_LINE == 0 {
                write!(w, "\n   ")?;
            }
            let sign = if c < 0.0 { '-' } else { '+' };
            write!(w, " {} {} {}", sign, c.abs(), self.variable(v).name())?;
        }
        Ok(())
    }

    /// Write the model in CPLEX LP format.  Rows are named `<family>_<k>`, with `k` counting
    /// within the family.
    pub fn write_lp(&self, mut w: impl Write) -> io::Result<()> {
        writeln!(w, "\\ E-VRPTW, vehicle penalty {}", self.vehicle_penalty)?;
        writeln!(w, "Minimize")?;
        write!(w, " obj:")?;
        self.write_expr(&mut w, &self.objective())?;
        writeln!(w)?;

        writeln!(w, "Subject To")?;
        let mut counts: Map<Family, usize> = Map::default();
        for c in &self.constraints {
            let k = counts.entry(c.family).or_insert(0);
            write!(w, " {}_{}:", c.family, k)?;
            *k += 1;
            self.write_expr(&mut w, &c.lhs)?;
            writeln!(w, " {} {}", c.sense, c.rhs)?;
        }

        writeln!(w, "Bounds")?;
        for v in self.variables.iter().filter(|v| !v.binary) {
            match v.ub {
                Some(ub) => writeln!(w, " {} <= {} <= {}", v.lb, v.name(), ub)?,
                None => writeln!(w, " {} >= {}", v.name(), v.lb)?,
            }
        }

        writeln!(w, "Binaries")?;
        for v in self.variables.iter().filter(|v| v.binary) {
            writeln!(w, " {}", v.name())?;
        }
        writeln!(w, "End")?;
        Ok(())
    }
}
