//! User-visible solver variables.

use std::any::Any;
use std::cell::{Cell, Ref, RefCell};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

static NEXT_VARIABLE_ID: AtomicU64 = AtomicU64::new(0);

struct VariableData {
    id: u64,
    name: Option<String>,
    value: Cell<f64>,
    context: RefCell<Option<Box<dyn Any>>>,
}

/// A real-valued variable determined by the solver.
///
/// A `Variable` is a cheap handle: clones refer to the same underlying
/// value, and identity rather than name distinguishes variables. The solver
/// writes the solved value back through the handle in
/// [`Solver::update_variables`](crate::Solver::update_variables); until
/// then, `value` returns whatever was last published (initially zero).
#[derive(Clone)]
pub struct Variable(Rc<VariableData>);

impl Variable {
    /// Create a new anonymous variable.
    pub fn new() -> Variable {
        Self::build(None)
    }

    /// Create a new named variable. The name is only used for display.
    pub fn named(name: impl Into<String>) -> Variable {
        Self::build(Some(name.into()))
    }

    fn build(name: Option<String>) -> Variable {
        Variable(Rc::new(VariableData {
            id: NEXT_VARIABLE_ID.fetch_add(1, AtomicOrdering::Relaxed),
            name,
            value: Cell::new(0.0),
            context: RefCell::new(None),
        }))
    }

    /// The stable unique id of this variable.
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// The name given at creation, if any.
    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    /// The most recently published value.
    pub fn value(&self) -> f64 {
        self.0.value.get()
    }

    /// Overwrite the published value.
    ///
    /// The next [`Solver::update_variables`](crate::Solver::update_variables)
    /// call replaces it again; the solver itself never reads it.
    pub fn set_value(&self, value: f64) {
        self.0.value.set(value);
    }

    /// Attach arbitrary user data to this variable.
    pub fn set_context(&self, context: Option<Box<dyn Any>>) {
        *self.0.context.borrow_mut() = context;
    }

    /// Borrow the user data attached to this variable.
    pub fn context(&self) -> Ref<'_, Option<Box<dyn Any>>> {
        self.0.context.borrow()
    }
}

impl Default for Variable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .field("value", &self.0.value.get())
            .finish()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "v{}", self.id()),
        }
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Variable) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Variable) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variable {
    fn cmp(&self, other: &Variable) -> Ordering {
        self.0.id.cmp(&other.0.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_ordered() {
        let a = Variable::new();
        let b = Variable::new();
        assert_ne!(a.id(), b.id());
        assert!(a < b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn clones_share_value() {
        let a = Variable::new();
        let b = a.clone();
        a.set_value(7.5);
        assert_eq!(b.value(), 7.5);
    }

    #[test]
    fn display_uses_name_or_id() {
        let named = Variable::named("width");
        assert_eq!(named.to_string(), "width");
        let anon = Variable::new();
        assert_eq!(anon.to_string(), format!("v{}", anon.id()));
    }

    #[test]
    fn context_round_trips() {
        let v = Variable::new();
        assert!(v.context().is_none());
        v.set_context(Some(Box::new(42_u32)));
        let context = v.context();
        let value = context.as_ref().and_then(|c| c.downcast_ref::<u32>());
        assert_eq!(value, Some(&42));
    }
}
