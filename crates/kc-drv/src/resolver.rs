//! `FixtureTypeResolver` — the `kc_sem::TypeResolver` the `check` command
//! hands to `analyse_expr`.
//!
//! It resolves primitive type names directly and user-declared struct names
//! against the table a fixture file's `structs` section builds (see
//! `fixture::build_struct_table`). There is no package system in this
//! workspace's scope, so `pkg` is always ignored.

use indexmap::IndexMap;
use kc_ast::{TypeExpr, TypeExprKind};
use kc_sem::{PackageContext, SemaError, StructType, Type, TypeResolver};
use kc_util::Symbol;

use crate::error::{DrvError, Result as DrvResult};
use crate::fixture::FixtureType;

pub struct FixtureTypeResolver {
    structs: IndexMap<Symbol, StructType>,
}

impl FixtureTypeResolver {
    pub fn new(structs: IndexMap<Symbol, StructType>) -> Self {
        Self { structs }
    }
}

impl TypeResolver for FixtureTypeResolver {
    fn resolve(&self, pkg: Option<&dyn PackageContext>, texpr: &TypeExpr) -> Result<Type, SemaError> {
        match &texpr.kind {
            TypeExprKind::Named(name) => resolve_named(*name, &self.structs, texpr.span),
            TypeExprKind::Ptr(elem) => Ok(Type::ptr(self.resolve(pkg, elem)?)),
            TypeExprKind::Array(elem, size_expr) => {
                let size = constant_usize(size_expr, texpr.span)?;
                Ok(Type::array(size, self.resolve(pkg, elem)?))
            }
            TypeExprKind::Tuple(elems) => {
                let resolved =
                    elems.iter().map(|e| self.resolve(pkg, e)).collect::<Result<_, _>>()?;
                Ok(Type::tuple(resolved))
            }
            TypeExprKind::Func(params, ret) => {
                let params =
                    params.iter().map(|p| self.resolve(pkg, p)).collect::<Result<_, _>>()?;
                Ok(Type::func(params, self.resolve(pkg, ret)?))
            }
        }
    }
}

fn constant_usize(expr: &kc_ast::ParseExpr, span: kc_util::Span) -> Result<usize, SemaError> {
    match &expr.kind {
        kc_ast::ParseExprKind::Primary(kc_ast::PrimaryExpr::Integer(n)) if *n >= 0 => {
            Ok(*n as usize)
        }
        _ => Err(SemaError::ExpectIntegerLiteral { span }),
    }
}

fn resolve_named(
    name: Symbol,
    structs: &IndexMap<Symbol, StructType>,
    span: kc_util::Span,
) -> Result<Type, SemaError> {
    match name.as_str() {
        "bool" => Ok(Type::Bool),
        "i8" => Ok(Type::I8),
        "i16" => Ok(Type::I16),
        "i32" => Ok(Type::I32),
        "i64" => Ok(Type::I64),
        "isize" => Ok(Type::Isize),
        "u8" => Ok(Type::U8),
        "u16" => Ok(Type::U16),
        "u32" => Ok(Type::U32),
        "u64" => Ok(Type::U64),
        "usize" => Ok(Type::Usize),
        "f32" => Ok(Type::F32),
        "f64" => Ok(Type::F64),
        _ => structs
            .get(&name)
            .map(|s| Type::Struct(Box::new(s.clone())))
            .ok_or(SemaError::UnknownName { name: name.as_str().to_string(), span }),
    }
}

/// Resolve a `FixtureType` straight to a `Type`, bypassing `TypeExpr` — used
/// only while building a fixture file's `structs` table, before a
/// `FixtureTypeResolver` exists to hand to `analyse_expr`.
pub fn resolve_plain(ty: &FixtureType, structs: &IndexMap<Symbol, StructType>) -> DrvResult<Type> {
    Ok(match ty {
        FixtureType::Named(name) => {
            resolve_named(Symbol::intern(name), structs, kc_util::Span::DUMMY)
                .map_err(|e| DrvError::Fixture(e.to_string()))?
        }
        FixtureType::Ptr(elem) => Type::ptr(resolve_plain(elem, structs)?),
        FixtureType::Array { elem, size } => Type::array(*size, resolve_plain(elem, structs)?),
        FixtureType::Tuple(elems) => {
            Type::tuple(elems.iter().map(|e| resolve_plain(e, structs)).collect::<DrvResult<_>>()?)
        }
        FixtureType::Func { params, ret } => Type::func(
            params.iter().map(|p| resolve_plain(p, structs)).collect::<DrvResult<_>>()?,
            resolve_plain(ret, structs)?,
        ),
    })
}
