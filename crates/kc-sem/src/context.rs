//! The symbol-subsystem boundary the analyser is written against (spec.md
//! §6): `BlockContext`/`PackageContext` resolve names to already-typed
//! `Expr` nodes, `TypeResolver` turns a `TypeExpr` into a `Type`. The
//! analyser takes these as `&mut dyn`/`&dyn` trait objects; it never
//! constructs a concrete scope table itself.
//!
//! `ScopeChain` below is the one concrete `BlockContext` this crate ships —
//! a rib-per-block linked list, used by kc-sem's own tests and by kc-drv's
//! fixture runner. It is grounded on the same linked-rib shape the teacher
//! used for name resolution, rekeyed from `Symbol -> DefId` to
//! `Symbol -> Expr` to match this crate's actual lookup contract.

use crate::error::SemaError;
use crate::expr::Expr;
use crate::types::Type;
use kc_ast::TypeExpr;
use kc_util::{Idx, IndexVec, Symbol};
use std::collections::HashMap;

pub trait BlockContext {
    fn get_value(&self, name: Symbol) -> Option<Expr>;
    fn package_context(&self) -> Option<&dyn PackageContext>;
    fn set_end(&mut self);
}

pub trait PackageContext {
    fn get_value(&self, name: Symbol) -> Option<(bool, Expr)>;
}

pub trait TypeResolver {
    fn resolve(&self, pkg: Option<&dyn PackageContext>, texpr: &TypeExpr) -> Result<Type, SemaError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RibId(u32);

impl Idx for RibId {
    fn from_usize(idx: usize) -> Self {
        RibId(idx as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct Rib {
    bindings: HashMap<Symbol, Expr>,
    parent: Option<RibId>,
}

/// A linked-list of ribs implementing `BlockContext` by walking outward
/// from the current block to its enclosing function and module scope.
pub struct ScopeChain {
    ribs: IndexVec<RibId, Rib>,
    current: RibId,
    diverged: bool,
    package: Option<Box<dyn PackageContext>>,
}

impl ScopeChain {
    pub fn new() -> Self {
        let mut ribs = IndexVec::new();
        let root = ribs.push(Rib { bindings: HashMap::new(), parent: None });
        Self { ribs, current: root, diverged: false, package: None }
    }

    pub fn with_package(package: Box<dyn PackageContext>) -> Self {
        let mut chain = Self::new();
        chain.package = Some(package);
        chain
    }

    /// Push a fresh block rib nested under the current one, returning its id
    /// so the caller can restore the parent scope on exit.
    pub fn enter_block(&mut self) -> RibId {
        let parent = self.current;
        let child = self.ribs.push(Rib { bindings: HashMap::new(), parent: Some(parent) });
        self.current = child;
        child
    }

    pub fn exit_block(&mut self) {
        if let Some(parent) = self.ribs[self.current].parent {
            self.current = parent;
        }
    }

    pub fn bind(&mut self, name: Symbol, value: Expr) {
        self.ribs[self.current].bindings.insert(name, value);
    }

    /// Whether `set_end` was ever called on this chain (any enclosing
    /// block has diverged via a no-return call).
    pub fn has_diverged(&self) -> bool {
        self.diverged
    }
}

impl Default for ScopeChain {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockContext for ScopeChain {
    fn get_value(&self, name: Symbol) -> Option<Expr> {
        let mut rib_id = self.current;
        loop {
            let rib = &self.ribs[rib_id];
            if let Some(expr) = rib.bindings.get(&name) {
                return Some(expr.clone());
            }
            match rib.parent {
                Some(parent) => rib_id = parent,
                None => return None,
            }
        }
    }

    fn package_context(&self) -> Option<&dyn PackageContext> {
        self.package.as_deref()
    }

    fn set_end(&mut self) {
        self.diverged = true;
    }
}

/// A flat export table, the simplest possible `PackageContext`.
pub struct FlatPackage {
    exports: HashMap<Symbol, (bool, Expr)>,
}

impl FlatPackage {
    pub fn new() -> Self {
        Self { exports: HashMap::new() }
    }

    pub fn insert(&mut self, name: Symbol, exported: bool, value: Expr) {
        self.exports.insert(name, (exported, value));
    }
}

impl Default for FlatPackage {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageContext for FlatPackage {
    fn get_value(&self, name: Symbol) -> Option<(bool, Expr)> {
        self.exports.get(&name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    fn param(ty: Type) -> Expr {
        Expr::Param { ty }
    }

    #[test]
    fn test_resolves_in_current_scope() {
        let mut chain = ScopeChain::new();
        chain.bind(Symbol::intern("x"), param(Type::I32));
        assert!(chain.get_value(Symbol::intern("x")).is_some());
    }

    #[test]
    fn test_resolves_through_parent_scope() {
        let mut chain = ScopeChain::new();
        chain.bind(Symbol::intern("x"), param(Type::I32));
        chain.enter_block();
        assert!(chain.get_value(Symbol::intern("x")).is_some());
    }

    #[test]
    fn test_shadowing_prefers_inner_scope() {
        let mut chain = ScopeChain::new();
        chain.bind(Symbol::intern("x"), param(Type::I32));
        chain.enter_block();
        chain.bind(Symbol::intern("x"), param(Type::Bool));
        assert_eq!(chain.get_value(Symbol::intern("x")).unwrap().get_type(), Type::Bool);
    }

    #[test]
    fn test_exit_block_restores_outer_binding() {
        let mut chain = ScopeChain::new();
        chain.bind(Symbol::intern("x"), param(Type::I32));
        chain.enter_block();
        chain.bind(Symbol::intern("x"), param(Type::Bool));
        chain.exit_block();
        assert_eq!(chain.get_value(Symbol::intern("x")).unwrap().get_type(), Type::I32);
    }

    #[test]
    fn test_unknown_name_resolves_to_none() {
        let chain = ScopeChain::new();
        assert!(chain.get_value(Symbol::intern("nope")).is_none());
    }

    #[test]
    fn test_set_end_marks_divergence() {
        let mut chain = ScopeChain::new();
        assert!(!chain.has_diverged());
        chain.set_end();
        assert!(chain.has_diverged());
    }

    #[test]
    fn test_flat_package_lookup() {
        let mut pkg = FlatPackage::new();
        pkg.insert(Symbol::intern("pi"), true, param(Type::F64));
        let (exported, value) = pkg.get_value(Symbol::intern("pi")).unwrap();
        assert!(exported);
        assert_eq!(value.get_type(), Type::F64);
    }
}
