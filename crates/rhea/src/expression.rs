//! Linear expressions over solver variables.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::variable::Variable;

/// A linear expression: a constant plus a sum of variable terms.
///
/// Expressions are immutable values. Arithmetic via the standard operators
/// produces fresh expressions, merging terms that share a variable by
/// summing their coefficients. Terms are kept in variable id order, so the
/// text form and term iteration are stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    constant: f64,
    terms: BTreeMap<Variable, f64>,
}

impl Expression {
    /// Create a constant expression.
    pub fn from_constant(value: f64) -> Expression {
        Expression {
            constant: value,
            terms: BTreeMap::new(),
        }
    }

    /// Create an expression holding a single scaled variable.
    pub fn from_term(variable: Variable, coefficient: f64) -> Expression {
        let mut terms = BTreeMap::new();
        terms.insert(variable, coefficient);
        Expression {
            constant: 0.0,
            terms,
        }
    }

    /// The constant term.
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// The terms, in variable id order.
    pub fn terms(&self) -> impl Iterator<Item = (&Variable, f64)> + '_ {
        self.terms.iter().map(|(variable, &coefficient)| (variable, coefficient))
    }

    /// The coefficient for a variable, zero if absent.
    pub fn coefficient_for(&self, variable: &Variable) -> f64 {
        self.terms.get(variable).copied().unwrap_or(0.0)
    }

    /// Whether the expression has no variable terms.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluate the expression against the variables' current values.
    pub fn value(&self) -> f64 {
        self.terms
            .iter()
            .fold(self.constant, |sum, (variable, coefficient)| {
                sum + coefficient * variable.value()
            })
    }

    fn add_variable(&mut self, variable: Variable, coefficient: f64) {
        *self.terms.entry(variable).or_insert(0.0) += coefficient;
    }

    fn add_expression(&mut self, other: Expression, multiplier: f64) {
        self.constant += other.constant * multiplier;
        for (variable, coefficient) in other.terms {
            self.add_variable(variable, coefficient * multiplier);
        }
    }

    fn scale(mut self, factor: f64) -> Expression {
        self.constant *= factor;
        for coefficient in self.terms.values_mut() {
            *coefficient *= factor;
        }
        self
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Expression {
        Expression::from_constant(value)
    }
}

impl From<Variable> for Expression {
    fn from(variable: Variable) -> Expression {
        Expression::from_term(variable, 1.0)
    }
}

impl From<(f64, Variable)> for Expression {
    fn from((coefficient, variable): (f64, Variable)) -> Expression {
        Expression::from_term(variable, coefficient)
    }
}

impl From<(f64, Expression)> for Expression {
    fn from((factor, expression): (f64, Expression)) -> Expression {
        expression.scale(factor)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote_term = false;
        for (variable, coefficient) in &self.terms {
            if wrote_term {
                f.write_str(" + ")?;
            }
            if coefficient == &1.0 {
                write!(f, "{}", variable)?;
            } else {
                write!(f, "{}*{}", coefficient, variable)?;
            }
            wrote_term = true;
        }
        if !wrote_term {
            write!(f, "{}", self.constant)
        } else if self.constant != 0.0 {
            write!(f, " + {}", self.constant)
        } else {
            Ok(())
        }
    }
}

// Arithmetic on expressions.

impl Neg for Expression {
    type Output = Expression;
    fn neg(self) -> Expression {
        self.scale(-1.0)
    }
}

impl Add<Expression> for Expression {
    type Output = Expression;
    fn add(mut self, rhs: Expression) -> Expression {
        self.add_expression(rhs, 1.0);
        self
    }
}

impl Add<Variable> for Expression {
    type Output = Expression;
    fn add(mut self, rhs: Variable) -> Expression {
        self.add_variable(rhs, 1.0);
        self
    }
}

impl Add<f64> for Expression {
    type Output = Expression;
    fn add(mut self, rhs: f64) -> Expression {
        self.constant += rhs;
        self
    }
}

impl Sub<Expression> for Expression {
    type Output = Expression;
    fn sub(mut self, rhs: Expression) -> Expression {
        self.add_expression(rhs, -1.0);
        self
    }
}

impl Sub<Variable> for Expression {
    type Output = Expression;
    fn sub(mut self, rhs: Variable) -> Expression {
        self.add_variable(rhs, -1.0);
        self
    }
}

impl Sub<f64> for Expression {
    type Output = Expression;
    fn sub(mut self, rhs: f64) -> Expression {
        self.constant -= rhs;
        self
    }
}

impl Mul<f64> for Expression {
    type Output = Expression;
    fn mul(self, rhs: f64) -> Expression {
        self.scale(rhs)
    }
}

impl Div<f64> for Expression {
    type Output = Expression;
    fn div(self, rhs: f64) -> Expression {
        self.scale(1.0 / rhs)
    }
}

// Arithmetic on variables, producing expressions.

impl Neg for Variable {
    type Output = Expression;
    fn neg(self) -> Expression {
        Expression::from_term(self, -1.0)
    }
}

impl Add<Expression> for Variable {
    type Output = Expression;
    fn add(self, rhs: Expression) -> Expression {
        rhs + self
    }
}

impl Add<Variable> for Variable {
    type Output = Expression;
    fn add(self, rhs: Variable) -> Expression {
        Expression::from(self) + rhs
    }
}

impl Add<f64> for Variable {
    type Output = Expression;
    fn add(self, rhs: f64) -> Expression {
        Expression::from(self) + rhs
    }
}

impl Sub<Expression> for Variable {
    type Output = Expression;
    fn sub(self, rhs: Expression) -> Expression {
        Expression::from(self) - rhs
    }
}

impl Sub<Variable> for Variable {
    type Output = Expression;
    fn sub(self, rhs: Variable) -> Expression {
        Expression::from(self) - rhs
    }
}

impl Sub<f64> for Variable {
    type Output = Expression;
    fn sub(self, rhs: f64) -> Expression {
        Expression::from(self) - rhs
    }
}

impl Mul<f64> for Variable {
    type Output = Expression;
    fn mul(self, rhs: f64) -> Expression {
        Expression::from_term(self, rhs)
    }
}

impl Div<f64> for Variable {
    type Output = Expression;
    fn div(self, rhs: f64) -> Expression {
        Expression::from_term(self, 1.0 / rhs)
    }
}

// Mirror impls with the scalar on the left.

impl Add<Expression> for f64 {
    type Output = Expression;
    fn add(self, rhs: Expression) -> Expression {
        rhs + self
    }
}

impl Add<Variable> for f64 {
    type Output = Expression;
    fn add(self, rhs: Variable) -> Expression {
        rhs + self
    }
}

impl Sub<Expression> for f64 {
    type Output = Expression;
    fn sub(self, rhs: Expression) -> Expression {
        -rhs + self
    }
}

impl Sub<Variable> for f64 {
    type Output = Expression;
    fn sub(self, rhs: Variable) -> Expression {
        -rhs + self
    }
}

impl Mul<Expression> for f64 {
    type Output = Expression;
    fn mul(self, rhs: Expression) -> Expression {
        rhs * self
    }
}

impl Mul<Variable> for f64 {
    type Output = Expression;
    fn mul(self, rhs: Variable) -> Expression {
        rhs * self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merging_sums_shared_coefficients() {
        let x = Variable::named("x");
        let y = Variable::named("y");
        let e = x.clone() + y.clone() + x.clone() * 2.0;
        assert_eq!(e.coefficient_for(&x), 3.0);
        assert_eq!(e.coefficient_for(&y), 1.0);
        assert_eq!(e.constant(), 0.0);
    }

    #[test]
    fn summation_is_commutative() {
        let x = Variable::named("x");
        let y = Variable::named("y");
        let a = x.clone() + y.clone() * 2.0 + 5.0;
        let b = 5.0 + y.clone() * 2.0 + x.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn summation_is_associative() {
        let x = Variable::named("x");
        let y = Variable::named("y");
        let z = Variable::named("z");
        let a = (x.clone() + y.clone()) + z.clone();
        let b = x.clone() + (y.clone() + z.clone());
        assert_eq!(a, b);
    }

    #[test]
    fn scaling_distributes() {
        let x = Variable::named("x");
        let e = (x.clone() * 2.0 + 4.0) * 0.5;
        assert_eq!(e.coefficient_for(&x), 1.0);
        assert_eq!(e.constant(), 2.0);
        let d = (x.clone() * 2.0 + 4.0) / 2.0;
        assert_eq!(d, e);
    }

    #[test]
    fn pair_conversions() {
        let x = Variable::named("x");
        let from_pair: Expression = (3.0, x.clone()).into();
        assert_eq!(from_pair.coefficient_for(&x), 3.0);
        let scaled: Expression = (2.0, x.clone() + 1.0).into();
        assert_eq!(scaled.coefficient_for(&x), 2.0);
        assert_eq!(scaled.constant(), 2.0);
    }

    #[test]
    fn value_tracks_variables() {
        let x = Variable::named("x");
        let y = Variable::named("y");
        x.set_value(2.0);
        y.set_value(3.0);
        let e = x.clone() * 2.0 + y.clone() + 1.0;
        assert_eq!(e.value(), 8.0);
        assert!(!e.is_constant());
        assert!(Expression::from_constant(4.0).is_constant());
    }

    #[test]
    fn display_is_stable() {
        let x = Variable::named("x");
        let y = Variable::named("y");
        let e = y.clone() * 2.0 + x.clone() + 7.0;
        // Terms print in creation order of the variables, not insertion order.
        assert_eq!(e.to_string(), "x + 2*y + 7");
        assert_eq!(Expression::from_constant(0.0).to_string(), "0");
    }
}
