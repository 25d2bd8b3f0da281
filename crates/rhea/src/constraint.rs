//! Constraints relating expressions to zero.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::expression::Expression;
use crate::strength::Strength;

static NEXT_CONSTRAINT_ID: AtomicU64 = AtomicU64::new(0);

/// The relational operator of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    LessOrEqual,
    Equal,
    GreaterOrEqual,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Relation::LessOrEqual => "<=",
            Relation::Equal => "==",
            Relation::GreaterOrEqual => ">=",
        })
    }
}

struct ConstraintData {
    id: u64,
    expression: Expression,
    relation: Relation,
    strength: Strength,
}

/// A weighted assertion that an expression relates to zero.
///
/// A `Constraint` is an immutable handle with a stable identity; clones
/// refer to the same constraint and compare equal. The stored strength is
/// clipped to the valid range at construction.
#[derive(Clone)]
pub struct Constraint(Rc<ConstraintData>);

impl Constraint {
    /// Create a constraint `expression relation 0` at the given strength.
    pub fn new(
        expression: impl Into<Expression>,
        relation: Relation,
        strength: Strength,
    ) -> Constraint {
        Constraint(Rc::new(ConstraintData {
            id: NEXT_CONSTRAINT_ID.fetch_add(1, AtomicOrdering::Relaxed),
            expression: expression.into(),
            relation,
            strength: strength.clip(),
        }))
    }

    /// Create a constraint `lhs relation rhs`, folding the right-hand side
    /// into the stored expression by subtraction.
    pub fn with_rhs(
        lhs: impl Into<Expression>,
        relation: Relation,
        rhs: impl Into<Expression>,
        strength: Strength,
    ) -> Constraint {
        Constraint::new(lhs.into() - rhs.into(), relation, strength)
    }

    /// The stable unique id of this constraint.
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// The normalized left-hand expression, asserted against zero.
    pub fn expression(&self) -> &Expression {
        &self.0.expression
    }

    /// The relational operator.
    pub fn relation(&self) -> Relation {
        self.0.relation
    }

    /// The clipped strength.
    pub fn strength(&self) -> Strength {
        self.0.strength
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("id", &self.0.id)
            .field("expression", &self.0.expression)
            .field("relation", &self.0.relation)
            .field("strength", &self.0.strength)
            .finish()
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} 0 | {}",
            self.0.expression,
            self.0.relation,
            self.0.strength.value()
        )
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Constraint) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Constraint {}

impl Hash for Constraint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl PartialOrd for Constraint {
    fn partial_cmp(&self, other: &Constraint) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Constraint {
    fn cmp(&self, other: &Constraint) -> Ordering {
        self.0.id.cmp(&other.0.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::Variable;

    #[test]
    fn rhs_folds_into_expression() {
        let x = Variable::named("x");
        let c = Constraint::with_rhs(x.clone(), Relation::Equal, 20.0, Strength::REQUIRED);
        assert_eq!(c.expression().constant(), -20.0);
        assert_eq!(c.expression().coefficient_for(&x), 1.0);
        assert_eq!(c.relation(), Relation::Equal);
    }

    #[test]
    fn strength_is_clipped_on_construction() {
        let x = Variable::new();
        let c = Constraint::new(x, Relation::Equal, Strength::new(f64::MAX));
        assert_eq!(c.strength(), Strength::REQUIRED);
    }

    #[test]
    fn identity_not_structure() {
        let x = Variable::named("x");
        let a = Constraint::with_rhs(x.clone(), Relation::Equal, 1.0, Strength::WEAK);
        let b = Constraint::with_rhs(x.clone(), Relation::Equal, 1.0, Strength::WEAK);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert!(a < b);
    }

    #[test]
    fn display_form() {
        let x = Variable::named("x");
        let c = Constraint::with_rhs(x, Relation::LessOrEqual, 10.0, Strength::WEAK);
        assert_eq!(c.to_string(), "x + -10 <= 0 | 1");
    }
}
