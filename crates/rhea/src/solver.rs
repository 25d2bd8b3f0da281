//! The incremental constraint solver core.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::constraint::{Constraint, Relation};
use crate::errors::{
    AddConstraintError, AddEditVariableError, InternalSolverError, RemoveConstraintError,
    RemoveEditVariableError, SuggestValueError,
};
use crate::expression::Expression;
use crate::row::{near_zero, Row};
use crate::strength::Strength;
use crate::symbol::{Symbol, SymbolKind};
use crate::variable::Variable;

/// The symbols recorded for an admitted constraint, used to locate it in
/// the tableau for removal.
#[derive(Debug, Clone, Copy)]
struct Tag {
    marker: Symbol,
    other: Symbol,
}

/// Bookkeeping for a registered edit variable.
#[derive(Debug)]
struct EditInfo {
    tag: Tag,
    constraint: Constraint,
    constant: f64,
}

/// Which owned row an optimization pass minimizes.
#[derive(Clone, Copy)]
enum Target {
    Objective,
    Artificial,
}

/// An incremental solver for systems of weighted linear constraints.
///
/// The solver maintains a simplex tableau that stays optimal and feasible
/// across mutations, so adding or removing a constraint, or suggesting a
/// new value for an edit variable, costs far less than solving the system
/// from scratch. Call [`update_variables`](Solver::update_variables) after
/// a batch of mutations to publish the solution into the variables.
#[derive(Debug)]
pub struct Solver {
    constraints: IndexMap<Constraint, Tag>,
    vars: IndexMap<Variable, Symbol>,
    edits: IndexMap<Variable, EditInfo>,
    rows: BTreeMap<Symbol, Row>,
    infeasible_rows: Vec<Symbol>,
    objective: Row,
    artificial: Option<Row>,
    id_tick: i64,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    /// Create an empty solver.
    pub fn new() -> Solver {
        Solver {
            constraints: IndexMap::new(),
            vars: IndexMap::new(),
            edits: IndexMap::new(),
            rows: BTreeMap::new(),
            infeasible_rows: Vec::new(),
            objective: Row::new(0.0),
            artificial: None,
            id_tick: 1,
        }
    }

    /// Create and add the constraint `lhs relation rhs`, returning the
    /// handle for later removal.
    pub fn create_constraint(
        &mut self,
        lhs: impl Into<Expression>,
        relation: Relation,
        rhs: impl Into<Expression>,
        strength: Strength,
    ) -> Result<Constraint, AddConstraintError> {
        let constraint = Constraint::with_rhs(lhs, relation, rhs, strength);
        self.add_constraint(constraint.clone())?;
        Ok(constraint)
    }

    /// Add every constraint in the iterator, stopping at the first failure.
    pub fn add_constraints(
        &mut self,
        constraints: impl IntoIterator<Item = Constraint>,
    ) -> Result<(), AddConstraintError> {
        for constraint in constraints {
            self.add_constraint(constraint)?;
        }
        Ok(())
    }

    /// Add a constraint to the solver.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), AddConstraintError> {
        if self.constraints.contains_key(&constraint) {
            return Err(AddConstraintError::DuplicateConstraint);
        }

        // Symbols reserved in `vars` for newly seen variables are kept even
        // if the add fails below; later constraints on the same variable
        // reuse them.
        let (mut row, tag) = self.create_row(&constraint);
        let mut subject = choose_subject(&row, tag);

        // A row holding only dummy symbols is either redundant with the
        // existing system or in conflict with it.
        if subject.is_invalid() && row.all_dummies() {
            if !near_zero(row.constant) {
                return Err(AddConstraintError::UnsatisfiableConstraint);
            }
            subject = tag.marker;
        }

        if subject.is_invalid() {
            if !self.add_with_artificial_variable(&row)? {
                return Err(AddConstraintError::UnsatisfiableConstraint);
            }
        } else {
            row.solve_for(subject);
            self.substitute(subject, &row);
            self.rows.insert(subject, row);
        }

        self.constraints.insert(constraint, tag);

        // Re-optimizing after every add keeps the average system small and
        // leaves the tableau consistent between calls.
        self.optimize(Target::Objective)?;
        Ok(())
    }

    /// Remove a previously added constraint.
    pub fn remove_constraint(
        &mut self,
        constraint: &Constraint,
    ) -> Result<(), RemoveConstraintError> {
        let tag = self
            .constraints
            .shift_remove(constraint)
            .ok_or(RemoveConstraintError::UnknownConstraint)?;

        // The error effects must leave the objective before any pivoting;
        // substitutions into a stale objective corrupt the optimum.
        self.remove_constraint_effects(constraint, tag);

        // Drop the marker row, pivoting the marker into the basis first
        // when it is parametric.
        if self.rows.remove(&tag.marker).is_none() {
            let (leaving, mut row) = self.marker_leaving_row(tag.marker).ok_or(
                RemoveConstraintError::Internal(InternalSolverError(
                    "the constraint marker is missing from the tableau",
                )),
            )?;
            row.solve_for_pair(leaving, tag.marker);
            self.substitute(tag.marker, &row);
        }

        self.optimize(Target::Objective)?;
        Ok(())
    }

    /// Whether the constraint is currently in the solver.
    pub fn has_constraint(&self, constraint: &Constraint) -> bool {
        self.constraints.contains_key(constraint)
    }

    /// Register an edit variable at the given strength.
    ///
    /// Edit variables are driven through [`suggest_value`](Solver::suggest_value).
    /// The strength must be below [`Strength::REQUIRED`].
    pub fn add_edit_variable(
        &mut self,
        variable: &Variable,
        strength: Strength,
    ) -> Result<(), AddEditVariableError> {
        if self.edits.contains_key(variable) {
            return Err(AddEditVariableError::DuplicateEditVariable);
        }
        let strength = strength.clip();
        if strength.is_required() {
            return Err(AddEditVariableError::BadRequiredStrength);
        }

        let constraint = Constraint::new(variable.clone(), Relation::Equal, strength);
        self.add_constraint(constraint.clone())
            .expect("an edit constraint on a fresh error pair cannot conflict");
        let tag = *self
            .constraints
            .get(&constraint)
            .expect("the edit constraint was just admitted");
        self.edits.insert(
            variable.clone(),
            EditInfo {
                tag,
                constraint,
                constant: 0.0,
            },
        );
        Ok(())
    }

    /// Unregister an edit variable and retract its suggestions.
    pub fn remove_edit_variable(
        &mut self,
        variable: &Variable,
    ) -> Result<(), RemoveEditVariableError> {
        let info = self
            .edits
            .shift_remove(variable)
            .ok_or(RemoveEditVariableError::UnknownEditVariable)?;
        self.remove_constraint(&info.constraint)
            .map_err(|error| match error {
                RemoveConstraintError::UnknownConstraint => RemoveEditVariableError::Internal(
                    InternalSolverError("the edit constraint is missing from the solver"),
                ),
                RemoveConstraintError::Internal(internal) => {
                    RemoveEditVariableError::Internal(internal)
                }
            })
    }

    /// Whether the variable is registered as an edit variable.
    pub fn has_edit_variable(&self, variable: &Variable) -> bool {
        self.edits.contains_key(variable)
    }

    /// Suggest a value for an edit variable.
    ///
    /// The change propagates as a delta against the previous suggestion,
    /// followed by a dual optimization to restore feasibility.
    pub fn suggest_value(
        &mut self,
        variable: &Variable,
        value: f64,
    ) -> Result<(), SuggestValueError> {
        let (marker, other, delta) = {
            let info = self
                .edits
                .get_mut(variable)
                .ok_or(SuggestValueError::UnknownEditVariable)?;
            let delta = value - info.constant;
            info.constant = value;
            (info.tag.marker, info.tag.other, delta)
        };

        // When either error symbol of the edit is basic, its row absorbs
        // the delta directly.
        if let Some(row) = self.rows.get_mut(&marker) {
            if row.add(-delta) < 0.0 {
                self.infeasible_rows.push(marker);
            }
        } else if let Some(row) = self.rows.get_mut(&other) {
            if row.add(delta) < 0.0 {
                self.infeasible_rows.push(other);
            }
        } else {
            // Both error symbols are parametric; spread the delta across
            // every row holding the marker.
            for (symbol, row) in self.rows.iter_mut() {
                let coefficient = row.coefficient_for(marker);
                if coefficient != 0.0
                    && row.add(delta * coefficient) < 0.0
                    && !symbol.is_external()
                {
                    self.infeasible_rows.push(*symbol);
                }
            }
        }

        self.dual_optimize()?;
        Ok(())
    }

    /// Publish the solved values into the registered variables.
    ///
    /// A variable whose symbol is basic takes its row constant; a
    /// parametric variable takes zero.
    pub fn update_variables(&self) {
        for (variable, symbol) in &self.vars {
            let value = self
                .rows
                .get(symbol)
                .map(|row| row.constant)
                .unwrap_or(0.0);
            variable.set_value(value);
        }
    }

    /// Reset the solver to the empty starting state without deallocating
    /// it. Variable values are left as last published.
    pub fn reset(&mut self) {
        self.constraints.clear();
        self.vars.clear();
        self.edits.clear();
        self.rows.clear();
        self.infeasible_rows.clear();
        self.objective = Row::new(0.0);
        self.artificial = None;
        self.id_tick = 1;
    }

    fn new_symbol(&mut self, kind: SymbolKind) -> Symbol {
        let symbol = Symbol::new(self.id_tick, kind);
        self.id_tick += 1;
        symbol
    }

    /// The external symbol for a user variable, allocated on first sight.
    fn external_symbol(&mut self, variable: &Variable) -> Symbol {
        if let Some(&symbol) = self.vars.get(variable) {
            return symbol;
        }
        let symbol = self.new_symbol(SymbolKind::External);
        self.vars.insert(variable.clone(), symbol);
        symbol
    }

    /// Build the tableau row for a constraint.
    ///
    /// Variables that are already basic are substituted eagerly, the
    /// auxiliary symbols for the relation and strength are allocated, and
    /// the sign is normalized so the constant is non-negative.
    fn create_row(&mut self, constraint: &Constraint) -> (Row, Tag) {
        let expression = constraint.expression();
        let mut row = Row::new(expression.constant());

        for (variable, coefficient) in expression.terms() {
            if near_zero(coefficient) {
                continue;
            }
            let symbol = self.external_symbol(variable);
            if let Some(basic) = self.rows.get(&symbol) {
                row.insert_row(basic, coefficient);
            } else {
                row.insert_symbol(symbol, coefficient);
            }
        }

        let strength = constraint.strength();
        let tag = match constraint.relation() {
            Relation::LessOrEqual | Relation::GreaterOrEqual => {
                let coefficient = if constraint.relation() == Relation::LessOrEqual {
                    1.0
                } else {
                    -1.0
                };
                let slack = self.new_symbol(SymbolKind::Slack);
                row.insert_symbol(slack, coefficient);
                if strength.is_required() {
                    Tag {
                        marker: slack,
                        other: Symbol::INVALID,
                    }
                } else {
                    let error = self.new_symbol(SymbolKind::Error);
                    row.insert_symbol(error, -coefficient);
                    self.objective.insert_symbol(error, strength.value());
                    Tag {
                        marker: slack,
                        other: error,
                    }
                }
            }
            Relation::Equal => {
                if strength.is_required() {
                    let dummy = self.new_symbol(SymbolKind::Dummy);
                    row.insert_symbol(dummy, 1.0);
                    Tag {
                        marker: dummy,
                        other: Symbol::INVALID,
                    }
                } else {
                    // expr == 0 becomes expr - eplus + eminus == 0; both
                    // error symbols are penalized so the objective carries
                    // the absolute violation.
                    let eplus = self.new_symbol(SymbolKind::Error);
                    let eminus = self.new_symbol(SymbolKind::Error);
                    row.insert_symbol(eplus, -1.0);
                    row.insert_symbol(eminus, 1.0);
                    self.objective.insert_symbol(eplus, strength.value());
                    self.objective.insert_symbol(eminus, strength.value());
                    Tag {
                        marker: eplus,
                        other: eminus,
                    }
                }
            }
        };

        if row.constant < 0.0 {
            row.reverse_sign();
        }
        (row, tag)
    }

    /// Admit a row that has no natural subject by driving an artificial
    /// objective to zero. Returns whether the row was satisfiable.
    fn add_with_artificial_variable(&mut self, row: &Row) -> Result<bool, InternalSolverError> {
        let art = self.new_symbol(SymbolKind::Slack);
        self.rows.insert(art, row.clone());
        self.artificial = Some(row.clone());

        self.optimize(Target::Artificial)?;
        let artificial = self
            .artificial
            .take()
            .expect("the artificial objective is live during admission");
        let success = near_zero(artificial.constant);

        // If the artificial symbol is still basic, pivot it out of the
        // basis before purging it.
        if let Some(mut art_row) = self.rows.remove(&art) {
            if art_row.cells.is_empty() {
                return Ok(success);
            }
            let entering = art_row.any_pivotable_symbol();
            if entering.is_invalid() {
                return Ok(false);
            }
            art_row.solve_for_pair(art, entering);
            self.substitute(entering, &art_row);
            self.rows.insert(entering, art_row);
        }

        for row in self.rows.values_mut() {
            row.remove(art);
        }
        self.objective.remove(art);
        Ok(success)
    }

    /// Replace every occurrence of a parametric symbol with the given row:
    /// in the tableau, the objective, and a live artificial objective.
    /// Restricted rows whose constants go negative are queued for the dual
    /// pass.
    fn substitute(&mut self, symbol: Symbol, row: &Row) {
        for (basic, target) in self.rows.iter_mut() {
            target.substitute(symbol, row);
            if !basic.is_external() && target.constant < 0.0 {
                self.infeasible_rows.push(*basic);
            }
        }
        self.objective.substitute(symbol, row);
        if let Some(artificial) = self.artificial.as_mut() {
            artificial.substitute(symbol, row);
        }
    }

    fn target_row(&self, target: Target) -> &Row {
        match target {
            Target::Objective => &self.objective,
            Target::Artificial => self
                .artificial
                .as_ref()
                .expect("the artificial objective is live during admission"),
        }
    }

    /// Phase 2 of the simplex method: pivot until the target row has no
    /// negative coefficient on a non-dummy symbol.
    fn optimize(&mut self, target: Target) -> Result<(), InternalSolverError> {
        loop {
            let entering = self.target_row(target).entering_symbol();
            if entering.is_invalid() {
                return Ok(());
            }
            let (leaving, mut row) = self
                .leaving_row(entering)
                .ok_or(InternalSolverError("the objective is unbounded"))?;
            row.solve_for_pair(leaving, entering);
            self.substitute(entering, &row);
            self.rows.insert(entering, row);
        }
    }

    /// The dual simplex pass: restore feasibility for queued rows while
    /// keeping the objective optimal.
    fn dual_optimize(&mut self) -> Result<(), InternalSolverError> {
        while let Some(leaving) = self.infeasible_rows.pop() {
            let still_infeasible = self
                .rows
                .get(&leaving)
                .map(|row| row.constant < 0.0)
                .unwrap_or(false);
            if !still_infeasible {
                continue;
            }
            let mut row = self
                .rows
                .remove(&leaving)
                .expect("the infeasible row is present");
            let entering = self.dual_entering_symbol(&row);
            if entering.is_invalid() {
                return Err(InternalSolverError("dual optimize found no entering symbol"));
            }
            row.solve_for_pair(leaving, entering);
            self.substitute(entering, &row);
            self.rows.insert(entering, row);
        }
        Ok(())
    }

    /// The dual entering choice: among positive-coefficient non-dummy
    /// cells, the one minimizing objective coefficient over row
    /// coefficient. Ties resolve to the lowest symbol id.
    fn dual_entering_symbol(&self, row: &Row) -> Symbol {
        let mut entering = Symbol::INVALID;
        let mut ratio = f64::INFINITY;
        for (&symbol, &coefficient) in &row.cells {
            if coefficient > 0.0 && !symbol.is_dummy() {
                let candidate = self.objective.coefficient_for(symbol) / coefficient;
                if candidate < ratio {
                    ratio = candidate;
                    entering = symbol;
                }
            }
        }
        entering
    }

    /// The basic row limiting how far the entering symbol may grow: among
    /// restricted rows with a negative coefficient, the minimum of
    /// -constant over coefficient. Ties resolve to the lowest symbol id.
    fn leaving_row(&mut self, entering: Symbol) -> Option<(Symbol, Row)> {
        let mut ratio = f64::INFINITY;
        let mut found = None;
        for (symbol, row) in &self.rows {
            if symbol.is_external() {
                continue;
            }
            let coefficient = row.coefficient_for(entering);
            if coefficient < 0.0 {
                let candidate = -row.constant / coefficient;
                if candidate < ratio {
                    ratio = candidate;
                    found = Some(*symbol);
                }
            }
        }
        found.map(|symbol| {
            let row = self
                .rows
                .remove(&symbol)
                .expect("the leaving row is present");
            (symbol, row)
        })
    }

    /// The row to pivot a removed constraint's marker through, chosen by
    /// a three tier rule: restricted rows with a negative marker
    /// coefficient first, then restricted rows with a positive one, then
    /// the last external row holding the marker.
    fn marker_leaving_row(&mut self, marker: Symbol) -> Option<(Symbol, Row)> {
        let mut first_ratio = f64::INFINITY;
        let mut second_ratio = f64::INFINITY;
        let mut first = None;
        let mut second = None;
        let mut third = None;
        for (symbol, row) in &self.rows {
            let coefficient = row.coefficient_for(marker);
            if coefficient == 0.0 {
                continue;
            }
            if symbol.is_external() {
                third = Some(*symbol);
            } else if coefficient < 0.0 {
                let ratio = -row.constant / coefficient;
                if ratio < first_ratio {
                    first_ratio = ratio;
                    first = Some(*symbol);
                }
            } else {
                let ratio = row.constant / coefficient;
                if ratio < second_ratio {
                    second_ratio = ratio;
                    second = Some(*symbol);
                }
            }
        }
        first.or(second).or(third).map(|symbol| {
            let row = self
                .rows
                .remove(&symbol)
                .expect("the leaving row is present");
            (symbol, row)
        })
    }

    /// Undo a removed constraint's contribution to the objective for each
    /// of its error symbols.
    fn remove_constraint_effects(&mut self, constraint: &Constraint, tag: Tag) {
        if tag.marker.is_error() {
            self.remove_marker_effects(tag.marker, constraint.strength());
        }
        if tag.other.is_error() {
            self.remove_marker_effects(tag.other, constraint.strength());
        }
    }

    fn remove_marker_effects(&mut self, marker: Symbol, strength: Strength) {
        if let Some(row) = self.rows.get(&marker) {
            self.objective.insert_row(row, -strength.value());
        } else {
            self.objective.insert_symbol(marker, -strength.value());
        }
    }
}

/// Choose the symbol to become basic for a freshly built row: an external
/// symbol if one is present, otherwise a pivotable tag symbol with a
/// negative coefficient.
fn choose_subject(row: &Row, tag: Tag) -> Symbol {
    for &symbol in row.cells.keys() {
        if symbol.is_external() {
            return symbol;
        }
    }
    if tag.marker.is_pivotable() && row.coefficient_for(tag.marker) < 0.0 {
        return tag.marker;
    }
    if tag.other.is_pivotable() && row.coefficient_for(tag.other) < 0.0 {
        return tag.other;
    }
    Symbol::INVALID
}
