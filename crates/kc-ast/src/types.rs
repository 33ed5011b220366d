//! Parse-level type syntax.
//!
//! `TypeExpr` is what a (hypothetical) parser hands the analyser for a type
//! annotation: a named type, or a type built up from one. It carries no
//! resolved semantics of its own — `kc_sem::TypeResolver` turns it into a
//! real `Type`.

use kc_util::{Span, Symbol};

use crate::expr::ParseExpr;

/// A parsed type expression.
#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

impl TypeExpr {
    pub fn new(kind: TypeExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// A bare named type, e.g. `i32`, `bool`, or a user-defined struct name.
    pub fn named(name: Symbol, span: Span) -> Self {
        Self::new(TypeExprKind::Named(name), span)
    }

    pub fn ptr(elem: TypeExpr, span: Span) -> Self {
        Self::new(TypeExprKind::Ptr(Box::new(elem)), span)
    }

    pub fn array(elem: TypeExpr, size: ParseExpr, span: Span) -> Self {
        Self::new(TypeExprKind::Array(Box::new(elem), Box::new(size)), span)
    }

    pub fn tuple(elems: Vec<TypeExpr>, span: Span) -> Self {
        Self::new(TypeExprKind::Tuple(elems), span)
    }

    pub fn func(params: Vec<TypeExpr>, ret: TypeExpr, span: Span) -> Self {
        Self::new(TypeExprKind::Func(params, Box::new(ret)), span)
    }
}

#[derive(Debug, Clone)]
pub enum TypeExprKind {
    /// A type referenced by name — a primitive keyword (`i32`, `bool`, ...)
    /// or a user-defined struct, resolved by `TypeResolver` against the
    /// enclosing package context.
    Named(Symbol),

    /// `*T`
    Ptr(Box<TypeExpr>),

    /// `[N]T` — the size is itself a constant expression; the resolver, not
    /// this crate, evaluates it.
    Array(Box<TypeExpr>, Box<ParseExpr>),

    /// `(T1, T2, ...)`
    Tuple(Vec<TypeExpr>),

    /// `fn(T1, T2, ...) -> Tret`
    Func(Vec<TypeExpr>, Box<TypeExpr>),
}
