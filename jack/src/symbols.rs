//! Two-tier symbol table.
use smol_str::SmolStr;
use std::{collections::BTreeMap, fmt};

use crate::{
    error::{JackError, JackResult},
    vm::Segment,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: SmolStr,
    /// Declared type, either a primitive (`int`, `char`, `boolean`)
    /// or a class name.
    pub ty: SmolStr,
    pub kind: SymbolKind,
    /// Position within the kind's storage segment.
    pub index: u16,
}

impl Symbol {
    #[inline]
    pub fn segment(&self) -> Segment {
        self.kind.segment()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Class variable shared by all instances.
    Static,
    /// Per-instance variable.
    Field,
    /// Subroutine parameter, including the implicit `this` of methods.
    Argument,
    /// Subroutine local variable.
    Local,
}

impl SymbolKind {
    /// Storage segment the kind lives in.
    #[rustfmt::skip]
    pub fn segment(&self) -> Segment {
        match self {
            Self::Static   => Segment::Static,
            Self::Field    => Segment::This,
            Self::Argument => Segment::Argument,
            Self::Local    => Segment::Local,
        }
    }

    #[inline]
    fn is_class_level(&self) -> bool {
        matches!(self, Self::Static | Self::Field)
    }
}

impl fmt::Display for SymbolKind {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Static   => write!(f, "static"),
            Self::Field    => write!(f, "field"),
            Self::Argument => write!(f, "argument"),
            Self::Local    => write!(f, "local"),
        }
    }
}

/// What `define` does when a name is declared twice in one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// The later declaration wins. It takes the next index, and
    /// the earlier slot stays counted.
    Replace,
    /// Return [`JackError::DuplicateSymbol`].
    Reject,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        DuplicatePolicy::Replace
    }
}

/// One partition of the name space with its own index counters.
#[derive(Debug, Default)]
struct Scope {
    symbols: BTreeMap<SmolStr, Symbol>,
    /// Next index per kind. Only the two kinds owned by
    /// the scope are ever incremented.
    counts: [u16; 4],
}

impl Scope {
    fn clear(&mut self) {
        self.symbols.clear();
        self.counts = [0; 4];
    }

    #[inline]
    fn count(&self, kind: SymbolKind) -> u16 {
        self.counts[kind as usize]
    }
}

/// Resolves every declared name to a `(kind, type, index)` triple.
///
/// Class scope holds statics and fields and lives for the whole class.
/// Subroutine scope holds arguments and locals and is cleared by
/// [`SymbolTable::start_subroutine`].
#[derive(Debug, Default)]
pub struct SymbolTable {
    class: Scope,
    subroutine: Scope,
    policy: DuplicatePolicy,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Declare a name in the scope that owns its kind, assigning it
    /// the next free index of that kind.
    pub fn define(&mut self, name: impl Into<SmolStr>, ty: impl Into<SmolStr>, kind: SymbolKind) -> JackResult<&Symbol> {
        let name = name.into();
        let policy = self.policy;
        let scope = self.scope_mut(kind);

        if policy == DuplicatePolicy::Reject && scope.symbols.contains_key(&name) {
            return Err(JackError::DuplicateSymbol { name, kind });
        }

        let index = scope.count(kind);
        scope.counts[kind as usize] = index
            .checked_add(1)
            .ok_or_else(|| JackError::TooManySymbols { name: name.clone(), kind })?;

        let symbol = Symbol {
            name: name.clone(),
            ty: ty.into(),
            kind,
            index,
        };
        scope.symbols.insert(name.clone(), symbol);

        // Entry was inserted above.
        Ok(&scope.symbols[&name])
    }

    /// Clear the subroutine scope and its counters.
    ///
    /// Class scope is left intact.
    pub fn start_subroutine(&mut self) {
        self.subroutine.clear();
    }

    /// Forget everything, including the class scope.
    pub fn reset(&mut self) {
        self.class.clear();
        self.subroutine.clear();
    }

    /// Lookup the given name according to the scope rules.
    ///
    /// Subroutine scope first, then class scope.
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.subroutine
            .symbols
            .get(name)
            .or_else(|| self.class.symbols.get(name))
    }

    /// Number of symbols of the given kind in the scope that owns the kind.
    pub fn count(&self, kind: SymbolKind) -> u16 {
        self.scope(kind).count(kind)
    }

    fn scope(&self, kind: SymbolKind) -> &Scope {
        if kind.is_class_level() {
            &self.class
        } else {
            &self.subroutine
        }
    }

    fn scope_mut(&mut self, kind: SymbolKind) -> &mut Scope {
        if kind.is_class_level() {
            &mut self.class
        } else {
            &mut self.subroutine
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_indices_are_dense_per_kind() {
        let mut table = SymbolTable::new();
        table.define("a", "int", SymbolKind::Field).unwrap();
        table.define("s", "int", SymbolKind::Static).unwrap();
        table.define("b", "Point", SymbolKind::Field).unwrap();
        table.define("x", "int", SymbolKind::Argument).unwrap();
        table.define("i", "int", SymbolKind::Local).unwrap();
        table.define("j", "char", SymbolKind::Local).unwrap();

        assert_eq!(table.resolve("a").map(|s| s.index), Some(0));
        assert_eq!(table.resolve("b").map(|s| s.index), Some(1));
        assert_eq!(table.resolve("s").map(|s| s.index), Some(0));
        assert_eq!(table.resolve("x").map(|s| s.index), Some(0));
        assert_eq!(table.resolve("j").map(|s| s.index), Some(1));
        assert_eq!(table.resolve("b").map(|s| s.ty.as_str()), Some("Point"));

        assert_eq!(table.count(SymbolKind::Field), 2);
        assert_eq!(table.count(SymbolKind::Static), 1);
        assert_eq!(table.count(SymbolKind::Argument), 1);
        assert_eq!(table.count(SymbolKind::Local), 2);
    }

    #[test]
    fn test_subroutine_scope_shadows_class_scope() {
        let mut table = SymbolTable::new();
        table.define("x", "int", SymbolKind::Field).unwrap();
        table.define("x", "char", SymbolKind::Local).unwrap();

        let symbol = table.resolve("x").unwrap();
        assert_eq!(symbol.kind, SymbolKind::Local);
        assert_eq!(symbol.segment(), Segment::Local);

        table.start_subroutine();
        let symbol = table.resolve("x").unwrap();
        assert_eq!(symbol.kind, SymbolKind::Field);
        assert_eq!(symbol.segment(), Segment::This);
    }

    #[test]
    fn test_start_subroutine_resets_counters() {
        let mut table = SymbolTable::new();
        table.define("count", "int", SymbolKind::Static).unwrap();
        table.define("a", "int", SymbolKind::Argument).unwrap();
        table.define("b", "int", SymbolKind::Local).unwrap();

        table.start_subroutine();
        assert_eq!(table.count(SymbolKind::Argument), 0);
        assert_eq!(table.count(SymbolKind::Local), 0);
        assert_eq!(table.count(SymbolKind::Static), 1);
        assert!(table.resolve("a").is_none());

        let c = table.define("c", "int", SymbolKind::Local).unwrap();
        assert_eq!(c.index, 0);
    }

    #[test]
    fn test_counts_independent_of_declaration_order() {
        let mut first = SymbolTable::new();
        let mut second = SymbolTable::new();
        let decls = [
            ("a", SymbolKind::Static),
            ("b", SymbolKind::Field),
            ("c", SymbolKind::Field),
            ("d", SymbolKind::Argument),
            ("e", SymbolKind::Local),
        ];

        for (name, kind) in decls.iter() {
            first.define(*name, "int", *kind).unwrap();
        }
        for (name, kind) in decls.iter().rev() {
            second.define(*name, "int", *kind).unwrap();
        }

        for kind in &[SymbolKind::Static, SymbolKind::Field, SymbolKind::Argument, SymbolKind::Local] {
            assert_eq!(first.count(*kind), second.count(*kind));
        }
        assert_eq!(first.count(SymbolKind::Static) + first.count(SymbolKind::Field), 3);
        assert_eq!(first.count(SymbolKind::Argument) + first.count(SymbolKind::Local), 2);
    }

    #[test]
    fn test_duplicate_replace_policy() {
        let mut table = SymbolTable::new();
        table.define("x", "int", SymbolKind::Local).unwrap();
        let again = table.define("x", "boolean", SymbolKind::Local).unwrap();
        assert_eq!(again.index, 1);
        assert_eq!(again.ty, "boolean");
        assert_eq!(table.count(SymbolKind::Local), 2);
    }

    #[test]
    fn test_duplicate_reject_policy() {
        let mut table = SymbolTable::with_policy(DuplicatePolicy::Reject);
        table.define("x", "int", SymbolKind::Field).unwrap();
        match table.define("x", "int", SymbolKind::Static) {
            Err(JackError::DuplicateSymbol { name, kind }) => {
                assert_eq!(name, "x");
                assert_eq!(kind, SymbolKind::Static);
            }
            other => panic!("expected duplicate symbol error, got {:?}", other),
        }
        assert_eq!(table.count(SymbolKind::Static), 0);

        // Same name in the other scope is shadowing, not duplication.
        assert!(table.define("x", "int", SymbolKind::Argument).is_ok());
    }

    #[test]
    fn test_index_exhaustion() {
        let mut table = SymbolTable::new();
        table.subroutine.counts[SymbolKind::Local as usize] = u16::MAX - 1;

        let last = table.define("last", "int", SymbolKind::Local).unwrap();
        assert_eq!(last.index, u16::MAX - 1);

        match table.define("overflow", "int", SymbolKind::Local) {
            Err(JackError::TooManySymbols { name, kind }) => {
                assert_eq!(name, "overflow");
                assert_eq!(kind, SymbolKind::Local);
            }
            other => panic!("expected too many symbols, got {:?}", other),
        }
        assert!(table.resolve("overflow").is_none());
        assert_eq!(table.count(SymbolKind::Local), u16::MAX);
    }

    #[test]
    fn test_reset() {
        let mut table = SymbolTable::new();
        table.define("x", "int", SymbolKind::Field).unwrap();
        table.reset();
        assert!(table.resolve("x").is_none());
        assert_eq!(table.count(SymbolKind::Field), 0);
    }
}
