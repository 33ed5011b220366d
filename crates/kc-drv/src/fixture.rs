//! The fixture notation `kc-drv check` reads.
//!
//! Lexing and parsing full K source text is out of scope for this
//! workspace (spec.md §1), so `check` doesn't read `.k` files. Instead it
//! reads a small JSON notation — just enough to build the `ParseExpr`
//! trees `kc-sem` consumes — for demonstration and integration testing.
//!
//! A fixture file has three parts: `structs` (nominal struct type
//! declarations, registered with the resolver before analysis), `bindings`
//! (named, typed `Param`s visible to the expression as free variables), and
//! the `expr` itself. `expect` optionally seeds the top-level expected type.

use indexmap::IndexMap;
use kc_ast::{
    AddSubOp, AssignOp as AstAssignOp, BitwiseOp, EqualOp, LogicOp, MulDivModOp, ParseExpr,
    PostfixSuffix, PrimaryExpr, TypeExpr, UnaryOp,
};
use kc_sem::{StructType, Type};
use kc_util::{Span, Symbol};
use serde::Deserialize;

use crate::error::{DrvError, Result};

#[derive(Debug, Deserialize)]
pub struct FixtureFile {
    #[serde(default)]
    pub structs: Vec<FixtureStruct>,
    #[serde(default)]
    pub bindings: Vec<FixtureBinding>,
    #[serde(default)]
    pub expect: Option<FixtureType>,
    pub expr: FixtureExpr,
}

#[derive(Debug, Deserialize)]
pub struct FixtureStruct {
    pub name: String,
    pub fields: Vec<FixtureField>,
}

#[derive(Debug, Deserialize)]
pub struct FixtureField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FixtureType,
}

#[derive(Debug, Deserialize)]
pub struct FixtureBinding {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FixtureType,
}

/// A parse-level type reference, the fixture analogue of `kc_ast::TypeExpr`.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum FixtureType {
    Named(String),
    Ptr(Box<FixtureType>),
    Array { elem: Box<FixtureType>, size: usize },
    Tuple(Vec<FixtureType>),
    Func { params: Vec<FixtureType>, ret: Box<FixtureType> },
}

impl FixtureType {
    pub fn to_type_expr(&self) -> TypeExpr {
        match self {
            FixtureType::Named(name) => TypeExpr::named(Symbol::intern(name), Span::DUMMY),
            FixtureType::Ptr(elem) => TypeExpr::ptr(elem.to_type_expr(), Span::DUMMY),
            FixtureType::Array { elem, size } => TypeExpr::array(
                elem.to_type_expr(),
                ParseExpr::integer(*size as i64, Span::DUMMY),
                Span::DUMMY,
            ),
            FixtureType::Tuple(elems) => {
                TypeExpr::tuple(elems.iter().map(FixtureType::to_type_expr).collect(), Span::DUMMY)
            }
            FixtureType::Func { params, ret } => TypeExpr::func(
                params.iter().map(FixtureType::to_type_expr).collect(),
                ret.to_type_expr(),
                Span::DUMMY,
            ),
        }
    }
}

/// The fixture notation's expression surface. Every variant folds down to
/// a `ParseExpr` node at the precedence level the operator implies; there
/// is no separate "level" field because the operator string alone
/// determines it (see [`FixtureExpr::build`]).
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum FixtureExpr {
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    Ident(String),
    QualifiedIdent { package: String, name: String },
    Unary { op: String, operand: Box<FixtureExpr> },
    Binary { op: String, left: Box<FixtureExpr>, right: Box<FixtureExpr> },
    Assign { op: String, left: Box<FixtureExpr>, right: Box<FixtureExpr> },
    Call { callee: Box<FixtureExpr>, args: Vec<FixtureExpr> },
    Index { base: Box<FixtureExpr>, index: Box<FixtureExpr> },
    Dot { base: Box<FixtureExpr>, field: String },
    Select { cond: Box<FixtureExpr>, when_true: Box<FixtureExpr>, when_false: Box<FixtureExpr> },
    As { base: Box<FixtureExpr>, target: FixtureType },
    Tuple(Vec<FixtureExpr>),
    Array(Vec<FixtureExpr>),
    Struct(Vec<FixtureExpr>),
}

impl FixtureExpr {
    pub fn build(&self) -> Result<ParseExpr> {
        let span = Span::DUMMY;
        match self {
            FixtureExpr::Int(value) => Ok(ParseExpr::integer(*value, span)),
            FixtureExpr::Float(value) => Ok(ParseExpr::float(*value, span)),
            FixtureExpr::Bool(value) => Ok(ParseExpr::boolean(*value, span)),
            FixtureExpr::Null => Ok(ParseExpr::null(span)),
            FixtureExpr::Ident(name) => Ok(ParseExpr::ident(Symbol::intern(name), span)),
            FixtureExpr::QualifiedIdent { package, name } => Ok(ParseExpr::qualified_ident(
                Symbol::intern(package),
                Symbol::intern(name),
                span,
            )),
            FixtureExpr::Unary { op, operand } => {
                let unary_op = unary_op_from_str(op)?;
                Ok(ParseExpr::unary(unary_op, operand.build()?, span))
            }
            FixtureExpr::Binary { op, left, right } => {
                build_binary(op, left.build()?, right.build()?, span)
            }
            FixtureExpr::Assign { op, left, right } => {
                let assign_op = assign_op_from_str(op)?;
                Ok(ParseExpr::assign(assign_op, left.build()?, right.build()?, span))
            }
            FixtureExpr::Call { callee, args } => {
                let args = args.iter().map(FixtureExpr::build).collect::<Result<Vec<_>>>()?;
                Ok(ParseExpr::postfix(
                    callee.build()?,
                    vec![PostfixSuffix::Call { args, span }],
                    span,
                ))
            }
            FixtureExpr::Index { base, index } => Ok(ParseExpr::postfix(
                base.build()?,
                vec![PostfixSuffix::Index { index: Box::new(index.build()?), span }],
                span,
            )),
            FixtureExpr::Dot { base, field } => Ok(ParseExpr::postfix(
                base.build()?,
                vec![PostfixSuffix::Dot { field: Symbol::intern(field), span }],
                span,
            )),
            FixtureExpr::Select { cond, when_true, when_false } => Ok(ParseExpr::postfix(
                cond.build()?,
                vec![PostfixSuffix::Select {
                    when_true: Box::new(when_true.build()?),
                    when_false: Box::new(when_false.build()?),
                    span,
                }],
                span,
            )),
            FixtureExpr::As { base, target } => Ok(ParseExpr::postfix(
                base.build()?,
                vec![PostfixSuffix::As { target: target.to_type_expr(), span }],
                span,
            )),
            FixtureExpr::Tuple(elems) => Ok(ParseExpr::primary(
                PrimaryExpr::Tuple(elems.iter().map(FixtureExpr::build).collect::<Result<_>>()?),
                span,
            )),
            FixtureExpr::Array(elems) => Ok(ParseExpr::primary(
                PrimaryExpr::Array(elems.iter().map(FixtureExpr::build).collect::<Result<_>>()?),
                span,
            )),
            FixtureExpr::Struct(elems) => Ok(ParseExpr::primary(
                PrimaryExpr::Struct(elems.iter().map(FixtureExpr::build).collect::<Result<_>>()?),
                span,
            )),
        }
    }
}

fn build_binary(op: &str, left: ParseExpr, right: ParseExpr, span: Span) -> Result<ParseExpr> {
    Ok(match op {
        "&&" => ParseExpr::logic_chain(left, vec![(LogicOp::And, right)], span),
        "||" => ParseExpr::logic_chain(left, vec![(LogicOp::Or, right)], span),
        "==" => ParseExpr::equal_chain(left, vec![(EqualOp::Eq, right)], span),
        "!=" => ParseExpr::equal_chain(left, vec![(EqualOp::Ne, right)], span),
        "<" => ParseExpr::equal_chain(left, vec![(EqualOp::Lt, right)], span),
        "<=" => ParseExpr::equal_chain(left, vec![(EqualOp::Le, right)], span),
        ">" => ParseExpr::equal_chain(left, vec![(EqualOp::Gt, right)], span),
        ">=" => ParseExpr::equal_chain(left, vec![(EqualOp::Ge, right)], span),
        "+" => ParseExpr::add_sub_chain(left, vec![(AddSubOp::Add, right)], span),
        "-" => ParseExpr::add_sub_chain(left, vec![(AddSubOp::Sub, right)], span),
        "*" => ParseExpr::mul_div_mod_chain(left, vec![(MulDivModOp::Mul, right)], span),
        "/" => ParseExpr::mul_div_mod_chain(left, vec![(MulDivModOp::Div, right)], span),
        "%" => ParseExpr::mul_div_mod_chain(left, vec![(MulDivModOp::Mod, right)], span),
        "&" => ParseExpr::bitwise_chain(left, vec![(BitwiseOp::And, right)], span),
        "|" => ParseExpr::bitwise_chain(left, vec![(BitwiseOp::Or, right)], span),
        "^" => ParseExpr::bitwise_chain(left, vec![(BitwiseOp::Xor, right)], span),
        "<<" => ParseExpr::bitwise_chain(left, vec![(BitwiseOp::Shl, right)], span),
        ">>" => ParseExpr::bitwise_chain(left, vec![(BitwiseOp::Shr, right)], span),
        other => return Err(DrvError::Fixture(format!("unknown binary operator `{other}`"))),
    })
}

fn unary_op_from_str(op: &str) -> Result<UnaryOp> {
    Ok(match op {
        "-" => UnaryOp::Neg,
        "~" => UnaryOp::BitNot,
        "!" => UnaryOp::Not,
        "&" => UnaryOp::Ref,
        "*" => UnaryOp::Deref,
        other => return Err(DrvError::Fixture(format!("unknown unary operator `{other}`"))),
    })
}

fn assign_op_from_str(op: &str) -> Result<AstAssignOp> {
    Ok(match op {
        "=" => AstAssignOp::Assign,
        "+=" => AstAssignOp::AddAssign,
        "-=" => AstAssignOp::SubAssign,
        "*=" => AstAssignOp::MulAssign,
        "/=" => AstAssignOp::DivAssign,
        "%=" => AstAssignOp::ModAssign,
        "&=" => AstAssignOp::AndAssign,
        "|=" => AstAssignOp::OrAssign,
        "^=" => AstAssignOp::XorAssign,
        "<<=" => AstAssignOp::ShlAssign,
        ">>=" => AstAssignOp::ShrAssign,
        other => return Err(DrvError::Fixture(format!("unknown assignment operator `{other}`"))),
    })
}

/// Build the nominal `StructType` table a [`FixtureFile`]'s `structs`
/// section declares, keyed by name for `resolver::FixtureTypeResolver`.
pub fn build_struct_table(
    structs: &[FixtureStruct],
) -> Result<IndexMap<Symbol, StructType>> {
    let mut table = IndexMap::new();
    for s in structs {
        let mut fields = IndexMap::new();
        for field in &s.fields {
            let ty = crate::resolver::resolve_plain(&field.ty, &table)?;
            fields.insert(Symbol::intern(&field.name), ty);
        }
        let name = Symbol::intern(&s.name);
        table.insert(name, StructType { name, fields });
    }
    Ok(table)
}
