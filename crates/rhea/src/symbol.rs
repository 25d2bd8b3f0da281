//! Internal tableau symbols.

/// The role a symbol plays in the tableau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum SymbolKind {
    /// The "no symbol" sentinel.
    Invalid,
    /// Stands for a user variable; unrestricted in sign.
    External,
    /// Turns an inequality into an equality; restricted to non-negative.
    Slack,
    /// Measures the violation of a non-required constraint.
    Error,
    /// Pads required equalities; never enters the objective.
    Dummy,
}

/// An opaque tableau identifier.
///
/// The `id` field leads so that the derived ordering is monotonic in
/// allocation order, which the pivot tie-break rules rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Symbol {
    id: i64,
    kind: SymbolKind,
}

impl Symbol {
    pub(crate) const INVALID: Symbol = Symbol {
        id: -1,
        kind: SymbolKind::Invalid,
    };

    pub(crate) fn new(id: i64, kind: SymbolKind) -> Symbol {
        Symbol { id, kind }
    }

    pub(crate) fn is_invalid(self) -> bool {
        self.kind == SymbolKind::Invalid
    }

    pub(crate) fn is_external(self) -> bool {
        self.kind == SymbolKind::External
    }

    pub(crate) fn is_error(self) -> bool {
        self.kind == SymbolKind::Error
    }

    pub(crate) fn is_dummy(self) -> bool {
        self.kind == SymbolKind::Dummy
    }

    /// Slack and error symbols may be pivoted into the basis.
    pub(crate) fn is_pivotable(self) -> bool {
        matches!(self.kind, SymbolKind::Slack | SymbolKind::Error)
    }
}
