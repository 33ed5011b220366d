//! `Type` — K's closed type universe, plus the predicates and defaults the
//! analyser dispatches on.
//!
//! Equality is always structural (`#[derive(PartialEq, Eq)]`); the analyser
//! never compares types by identity. `TypeContext` interns `Type`s keyed by
//! their structure so repeated lookups of the same shape return the same
//! handle and `expectExpr`'s equality check stays cheap (Design Notes §9).

use indexmap::IndexMap;
use kc_util::Symbol;
use std::collections::HashMap;

/// A type in K's type system.
///
/// This is a closed enum by design: K has no generics and no user-defined
/// type operators, so the full set of shapes is known up front.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// The distinguished type of an `Assign` expression; never a legal
    /// operand type anywhere else.
    None,
    Bool,

    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,

    F32,
    F64,

    Array(Box<ArrayType>),
    Tuple(Vec<Type>),
    Struct(Box<StructType>),
    Ptr(Box<Type>),
    Func(Box<FuncType>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayType {
    pub size: usize,
    pub elem: Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncType {
    pub params: Vec<Type>,
    pub ret: Type,
}

/// A struct type's fields, in declaration order. `IndexMap` preserves
/// insertion order so `Fields[i]` (positional struct-literal analysis) and
/// `Fields[name]` (field access) are both cheap.
#[derive(Debug, Clone)]
pub struct StructType {
    pub name: Symbol,
    pub fields: IndexMap<Symbol, Type>,
}

// `IndexMap` doesn't derive `Eq`/`Hash`; struct types compare and hash by
// name only; K has no structural (duck-typed) struct equality — two structs
// are the same type iff they are the same declaration.
impl PartialEq for StructType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for StructType {}
impl std::hash::Hash for StructType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Type {
    pub fn ptr(elem: Type) -> Type {
        Type::Ptr(Box::new(elem))
    }

    pub fn array(size: usize, elem: Type) -> Type {
        Type::Array(Box::new(ArrayType { size, elem }))
    }

    pub fn tuple(elems: Vec<Type>) -> Type {
        Type::Tuple(elems)
    }

    pub fn func(params: Vec<Type>, ret: Type) -> Type {
        Type::Func(Box::new(FuncType { params, ret }))
    }

    pub fn is_number_type(&self) -> bool {
        self.is_int_type() || self.is_float_type()
    }

    pub fn is_int_type(&self) -> bool {
        matches!(
            self,
            Type::I8
                | Type::I16
                | Type::I32
                | Type::I64
                | Type::Isize
                | Type::U8
                | Type::U16
                | Type::U32
                | Type::U64
                | Type::Usize
        )
    }

    pub fn is_sint_type(&self) -> bool {
        matches!(self, Type::I8 | Type::I16 | Type::I32 | Type::I64 | Type::Isize)
    }

    pub fn is_uint_type(&self) -> bool {
        matches!(
            self,
            Type::U8 | Type::U16 | Type::U32 | Type::U64 | Type::Usize
        )
    }

    pub fn is_float_type(&self) -> bool {
        matches!(self, Type::F32 | Type::F64)
    }

    pub fn is_bool_type(&self) -> bool {
        matches!(self, Type::Bool)
    }

    pub fn is_none_type(&self) -> bool {
        matches!(self, Type::None)
    }

    pub fn is_ptr_type(&self) -> bool {
        matches!(self, Type::Ptr(_))
    }

    pub fn is_func_type(&self) -> bool {
        matches!(self, Type::Func(_))
    }

    pub fn is_array_type(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    pub fn is_tuple_type(&self) -> bool {
        matches!(self, Type::Tuple(_))
    }

    pub fn is_struct_type(&self) -> bool {
        matches!(self, Type::Struct(_))
    }

    pub fn as_array(&self) -> Option<&ArrayType> {
        match self {
            Type::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Type]> {
        match self {
            Type::Tuple(elems) => Some(elems),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructType> {
        match self {
            Type::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_ptr(&self) -> Option<&Type> {
        match self {
            Type::Ptr(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<&FuncType> {
        match self {
            Type::Func(f) => Some(f),
            _ => None,
        }
    }
}

/// The zero value of any numeric type, used to desugar unary minus
/// (`-x` => `0 - x`, §4.3) and unary bitwise-not (`~x` => `x ^ -1`, which
/// reuses the integer-literal constructor directly rather than this
/// function).
///
/// Total over every type for which `Type::is_number_type` holds; the
/// analyser never calls it otherwise; the panic below is unreachable by
/// construction, not a recoverable error path.
pub fn default_value_for_type(ty: &Type) -> DefaultValue {
    match ty {
        Type::I8
        | Type::I16
        | Type::I32
        | Type::I64
        | Type::Isize
        | Type::U8
        | Type::U16
        | Type::U32
        | Type::U64
        | Type::Usize => DefaultValue::Integer(0),
        Type::F32 | Type::F64 => DefaultValue::Float(0.0),
        _ => unreachable!("default_value_for_type called on non-numeric type {ty:?}"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Integer(i64),
    Float(f64),
}

/// Interns `Type`s keyed by structure, so that repeated occurrences of the
/// same shape share a table slot and `TypeId` equality substitutes for deep
/// structural equality after the first occurrence (Design Notes §9).
#[derive(Default)]
pub struct TypeContext {
    types: Vec<Type>,
    by_shape: HashMap<Type, TypeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

impl TypeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(id) = self.by_shape.get(&ty) {
            return *id;
        }
        let id = TypeId(self.types.len() as u32);
        self.by_shape.insert(ty.clone(), id);
        self.types.push(ty);
        id
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Predicate tests
    // ========================================================================

    #[test]
    fn test_is_number_type() {
        assert!(Type::I32.is_number_type());
        assert!(Type::F64.is_number_type());
        assert!(!Type::Bool.is_number_type());
        assert!(!Type::None.is_number_type());
    }

    #[test]
    fn test_is_sint_vs_uint() {
        assert!(Type::I32.is_sint_type());
        assert!(!Type::U32.is_sint_type());
        assert!(Type::U32.is_uint_type());
        assert!(!Type::I32.is_uint_type());
    }

    #[test]
    fn test_is_ptr_func_array_tuple_struct() {
        assert!(Type::ptr(Type::I32).is_ptr_type());
        assert!(Type::func(vec![Type::I32], Type::Bool).is_func_type());
        assert!(Type::array(4, Type::I32).is_array_type());
        assert!(Type::tuple(vec![Type::I32, Type::Bool]).is_tuple_type());
    }

    #[test]
    fn test_struct_equality_is_nominal() {
        let mut fields_a = IndexMap::new();
        fields_a.insert(Symbol::intern("x"), Type::I32);
        let mut fields_b = IndexMap::new();
        fields_b.insert(Symbol::intern("y"), Type::I32);

        let a = Type::Struct(Box::new(StructType {
            name: Symbol::intern("Point"),
            fields: fields_a,
        }));
        let b = Type::Struct(Box::new(StructType {
            name: Symbol::intern("Point"),
            fields: fields_b,
        }));
        // Same name, different field sets: still equal, since K structs are
        // nominal rather than structural.
        assert_eq!(a, b);

        let c = Type::Struct(Box::new(StructType {
            name: Symbol::intern("Other"),
            fields: IndexMap::new(),
        }));
        assert_ne!(a, c);
    }

    // ========================================================================
    // default_value_for_type
    // ========================================================================

    #[test]
    fn test_default_value_integer() {
        assert_eq!(default_value_for_type(&Type::I32), DefaultValue::Integer(0));
        assert_eq!(default_value_for_type(&Type::Usize), DefaultValue::Integer(0));
    }

    #[test]
    fn test_default_value_float() {
        assert_eq!(default_value_for_type(&Type::F32), DefaultValue::Float(0.0));
        assert_eq!(default_value_for_type(&Type::F64), DefaultValue::Float(0.0));
    }

    #[test]
    #[should_panic]
    fn test_default_value_panics_on_non_numeric() {
        default_value_for_type(&Type::Bool);
    }

    // ========================================================================
    // TypeContext interning
    // ========================================================================

    #[test]
    fn test_intern_dedups_equal_shapes() {
        let mut ctx = TypeContext::new();
        let a = ctx.intern(Type::array(4, Type::I32));
        let b = ctx.intern(Type::array(4, Type::I32));
        assert_eq!(a, b);
    }

    #[test]
    fn test_intern_distinguishes_different_shapes() {
        let mut ctx = TypeContext::new();
        let a = ctx.intern(Type::I32);
        let b = ctx.intern(Type::I64);
        assert_ne!(a, b);
        assert_eq!(ctx.get(a), &Type::I32);
        assert_eq!(ctx.get(b), &Type::I64);
    }
}
