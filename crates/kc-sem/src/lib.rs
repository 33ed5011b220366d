//! kc-sem — the semantic analyser for K expressions.
//!
//! This crate turns a `kc_ast::ParseExpr` into a typed `Expr` IR: it propagates
//! expected types down through the precedence cascade, checks operator
//! legality against operand kinds, and resolves identifiers through the
//! `BlockContext`/`PackageContext` traits a host compiler implements.
//!
//! Entry points: [`analyse::analyse_expr`] and [`analyse::analyse_constant_expr`].

pub mod analyse;
pub mod context;
pub mod error;
pub mod expr;
pub mod types;

pub use analyse::{analyse_constant_expr, analyse_expr};
pub use context::{BlockContext, FlatPackage, PackageContext, ScopeChain, TypeResolver};
pub use error::SemaError;
pub use expr::{AssignOp, BinaryOp, CompareOp, Expr, UnaryOp};
pub use types::{ArrayType, FuncType, StructType, Type, TypeContext, TypeId};
