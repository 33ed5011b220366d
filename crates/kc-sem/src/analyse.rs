//! The tree transducer: `ParseExpr` in, `Expr` out.
//!
//! This module implements spec §4.1-§4.9 directly: `analyse_expr` dispatches
//! on `ParseExprKind`, recursing down through the precedence cascade, and
//! `analyse_constant_expr` is the stricter sibling entry point used wherever
//! the language requires a compile-time value.

use kc_ast::{
    AddSubOp, AssignExpr, BitwiseOp, Chain, EqualOp, LogicOp, MulDivModOp, ParseExpr, ParseExprKind,
    PostfixExpr, PostfixSuffix, PrimaryExpr, UnaryExpr,
};
use kc_ast::expr::AssignOp as AstAssignOp;
use kc_ast::expr::UnaryOp as AstUnaryOp;
use kc_util::{Span, Symbol};

use crate::context::{BlockContext, PackageContext, TypeResolver};
use crate::error::SemaError;
use crate::expr::{AssignOp, BinaryOp, CompareOp, Expr, UnaryOp};
use crate::types::{default_value_for_type, DefaultValue, Type};

/// Top-level entry point (spec §4.1-§4.6): analyse one `ParseExpr` under an
/// optional contextual expected type.
pub fn analyse_expr(
    ctx: &mut dyn BlockContext,
    resolver: &dyn TypeResolver,
    expect: Option<Type>,
    expr: &ParseExpr,
) -> Result<Expr, SemaError> {
    match &expr.kind {
        ParseExprKind::Assign(a) => analyse_assign(ctx, resolver, a, expr.span),
        ParseExprKind::Logic(chain) => analyse_logic(ctx, resolver, chain),
        ParseExprKind::Equal(chain) => analyse_equal(ctx, resolver, expect, chain),
        ParseExprKind::AddSub(chain) => analyse_add_sub(ctx, resolver, expect, chain),
        ParseExprKind::MulDivMod(chain) => analyse_mul_div_mod(ctx, resolver, expect, chain),
        ParseExprKind::Bitwise(chain) => analyse_bitwise(ctx, resolver, expect, chain),
        ParseExprKind::Unary(u) => analyse_unary(ctx, resolver, expect, u, expr.span),
        ParseExprKind::Postfix(p) => analyse_postfix(ctx, resolver, expect, p, expr.span),
        ParseExprKind::Primary(p) => analyse_primary(ctx, resolver, expect, p, expr.span),
    }
}

/// Strict structural coercion check (§4.1): the caller, never the callee,
/// enforces that an analysed value has exactly the expected type.
fn expect_expr(span: Span, expected: &Type, actual: Expr) -> Result<Expr, SemaError> {
    if &actual.get_type() == expected {
        Ok(actual)
    } else {
        Err(SemaError::ExpectType { expected: expected.clone(), span })
    }
}

// ============================================================================
// §4.2 Precedence cascade
// ============================================================================

/// `&&`/`||`: per the Go original, the left operand is seeded with `Bool`
/// from the very first analysis, not just checked after the fact.
fn analyse_logic(
    ctx: &mut dyn BlockContext,
    resolver: &dyn TypeResolver,
    chain: &Chain<LogicOp>,
) -> Result<Expr, SemaError> {
    let left = analyse_expr(ctx, resolver, Some(Type::Bool), &chain.left)?;
    let mut left = expect_expr(chain.left.span, &Type::Bool, left)?;
    for (op, rhs) in &chain.tail {
        let right = analyse_expr(ctx, resolver, Some(Type::Bool), rhs)?;
        let right = expect_expr(rhs.span, &Type::Bool, right)?;
        let op = match op {
            LogicOp::And => BinaryOp::And,
            LogicOp::Or => BinaryOp::Or,
        };
        left = Expr::Binary { op, left: Box::new(left), right: Box::new(right) };
    }
    Ok(left)
}

/// `== != < <= > >=`: equality requires a non-`None` left type, relational
/// comparison requires a numeric one. Always produces `Bool`.
fn analyse_equal(
    ctx: &mut dyn BlockContext,
    resolver: &dyn TypeResolver,
    expect: Option<Type>,
    chain: &Chain<EqualOp>,
) -> Result<Expr, SemaError> {
    let mut left = analyse_expr(ctx, resolver, expect, &chain.left)?;
    for (op, rhs) in &chain.tail {
        let lt = left.get_type();
        if op.is_relational() {
            if !lt.is_number_type() {
                return Err(SemaError::ExpectNumber { span: chain.left.span });
            }
        } else if lt.is_none_type() {
            // `None` only ever arises from an `Assign` result; there's no
            // dedicated taxonomy entry for "not the assignment type", so
            // this reuses the number-kind message.
            return Err(SemaError::ExpectNumber { span: chain.left.span });
        }
        let right = analyse_expr(ctx, resolver, Some(lt.clone()), rhs)?;
        let right = expect_expr(rhs.span, &lt, right)?;
        let op = match op {
            EqualOp::Eq => CompareOp::Eq,
            EqualOp::Ne => CompareOp::Ne,
            EqualOp::Lt => CompareOp::Lt,
            EqualOp::Le => CompareOp::Le,
            EqualOp::Gt => CompareOp::Gt,
            EqualOp::Ge => CompareOp::Ge,
        };
        left = Expr::Equal { op, left: Box::new(left), right: Box::new(right) };
    }
    Ok(left)
}

fn analyse_add_sub(
    ctx: &mut dyn BlockContext,
    resolver: &dyn TypeResolver,
    expect: Option<Type>,
    chain: &Chain<AddSubOp>,
) -> Result<Expr, SemaError> {
    analyse_numeric_chain(
        ctx,
        resolver,
        expect,
        chain,
        Type::is_number_type,
        |span| SemaError::ExpectNumber { span },
        |op| match op {
            AddSubOp::Add => BinaryOp::Add,
            AddSubOp::Sub => BinaryOp::Sub,
        },
    )
}

fn analyse_mul_div_mod(
    ctx: &mut dyn BlockContext,
    resolver: &dyn TypeResolver,
    expect: Option<Type>,
    chain: &Chain<MulDivModOp>,
) -> Result<Expr, SemaError> {
    analyse_numeric_chain(
        ctx,
        resolver,
        expect,
        chain,
        Type::is_number_type,
        |span| SemaError::ExpectNumber { span },
        |op| match op {
            MulDivModOp::Mul => BinaryOp::Mul,
            MulDivModOp::Div => BinaryOp::Div,
            MulDivModOp::Mod => BinaryOp::Mod,
        },
    )
}

fn analyse_bitwise(
    ctx: &mut dyn BlockContext,
    resolver: &dyn TypeResolver,
    expect: Option<Type>,
    chain: &Chain<BitwiseOp>,
) -> Result<Expr, SemaError> {
    analyse_numeric_chain(
        ctx,
        resolver,
        expect,
        chain,
        Type::is_int_type,
        |span| SemaError::ExpectInteger { span },
        |op| match op {
            BitwiseOp::And => BinaryOp::BitAnd,
            BitwiseOp::Or => BinaryOp::BitOr,
            BitwiseOp::Xor => BinaryOp::BitXor,
            BitwiseOp::Shl => BinaryOp::Shl,
            BitwiseOp::Shr => BinaryOp::Shr,
        },
    )
}

/// Shared fold for the three plain-`Binary` precedence levels: seed the
/// left operand with `expect`, then for each `(op, right)` pair check the
/// left type's kind, analyse the right operand against it, and coerce.
fn analyse_numeric_chain<Op: Copy>(
    ctx: &mut dyn BlockContext,
    resolver: &dyn TypeResolver,
    expect: Option<Type>,
    chain: &Chain<Op>,
    require: fn(&Type) -> bool,
    on_fail: fn(Span) -> SemaError,
    map_op: impl Fn(Op) -> BinaryOp,
) -> Result<Expr, SemaError> {
    let mut left = analyse_expr(ctx, resolver, expect, &chain.left)?;
    for (op, rhs) in &chain.tail {
        let lt = left.get_type();
        if !require(&lt) {
            return Err(on_fail(chain.left.span));
        }
        let right = analyse_expr(ctx, resolver, Some(lt.clone()), rhs)?;
        let right = expect_expr(rhs.span, &lt, right)?;
        left = Expr::Binary { op: map_op(*op), left: Box::new(left), right: Box::new(right) };
    }
    Ok(left)
}

// ============================================================================
// §4.3 Unary
// ============================================================================

fn analyse_unary(
    ctx: &mut dyn BlockContext,
    resolver: &dyn TypeResolver,
    expect: Option<Type>,
    u: &UnaryExpr,
    _span: Span,
) -> Result<Expr, SemaError> {
    match u.op {
        AstUnaryOp::Neg => {
            let p = analyse_expr(ctx, resolver, expect, &u.operand)?;
            let lt = p.get_type();
            if !lt.is_number_type() {
                return Err(SemaError::ExpectNumber { span: u.operand.span });
            }
            let zero = match default_value_for_type(&lt) {
                DefaultValue::Integer(v) => Expr::Integer { ty: lt.clone(), value: v },
                DefaultValue::Float(v) => Expr::Float { ty: lt.clone(), value: v },
            };
            Ok(Expr::Binary { op: BinaryOp::Sub, left: Box::new(zero), right: Box::new(p) })
        }
        AstUnaryOp::BitNot => {
            let p = analyse_expr(ctx, resolver, expect, &u.operand)?;
            let lt = p.get_type();
            if !lt.is_sint_type() {
                return Err(SemaError::ExpectSignedInteger { span: u.operand.span });
            }
            let neg_one = Expr::Integer { ty: lt.clone(), value: -1 };
            Ok(Expr::Binary { op: BinaryOp::BitXor, left: Box::new(p), right: Box::new(neg_one) })
        }
        AstUnaryOp::Not => {
            let p = analyse_expr(ctx, resolver, expect, &u.operand)?;
            let p = expect_expr(u.operand.span, &Type::Bool, p)?;
            Ok(Expr::Unary { ty: Type::Bool, op: UnaryOp::Not, value: Box::new(p) })
        }
        AstUnaryOp::Ref => {
            let elem_expect = match &expect {
                Some(t) => t.as_ptr().cloned(),
                None => None,
            };
            let p = analyse_expr(ctx, resolver, elem_expect, &u.operand)?;
            if p.is_temporary() {
                return Err(SemaError::UnexpectedTemporary { span: u.operand.span });
            }
            let ty = Type::ptr(p.get_type());
            Ok(Expr::Unary { ty, op: UnaryOp::Ref, value: Box::new(p) })
        }
        AstUnaryOp::Deref => {
            let pointee_expect = expect.clone().map(Type::ptr);
            let p = analyse_expr(ctx, resolver, pointee_expect, &u.operand)?;
            let pt = p.get_type();
            let elem = pt.as_ptr().cloned().ok_or(SemaError::ExpectPointer { span: u.operand.span })?;
            Ok(Expr::Unary { ty: elem, op: UnaryOp::Deref, value: Box::new(p) })
        }
    }
}

// ============================================================================
// §4.4 Postfix chain
// ============================================================================

fn analyse_postfix(
    ctx: &mut dyn BlockContext,
    resolver: &dyn TypeResolver,
    expect: Option<Type>,
    p: &PostfixExpr,
    _span: Span,
) -> Result<Expr, SemaError> {
    if p.suffixes.is_empty() {
        return analyse_expr(ctx, resolver, expect, &p.primary);
    }

    let first_expect = match &p.suffixes[0] {
        PostfixSuffix::As { target, .. } => {
            Some(resolver.resolve(ctx.package_context(), target)?)
        }
        PostfixSuffix::Select { .. } => Some(Type::Bool),
        _ => None,
    };
    let mut current = analyse_expr(ctx, resolver, first_expect, &p.primary)?;

    for suffix in &p.suffixes {
        current = apply_suffix(ctx, resolver, expect.clone(), current, suffix)?;
    }
    Ok(current)
}

fn apply_suffix(
    ctx: &mut dyn BlockContext,
    resolver: &dyn TypeResolver,
    outer_expect: Option<Type>,
    prefix: Expr,
    suffix: &PostfixSuffix,
) -> Result<Expr, SemaError> {
    match suffix {
        PostfixSuffix::Call { args, span } => {
            let func = prefix
                .get_type()
                .as_func()
                .cloned()
                .ok_or(SemaError::ExpectFunction { span: *span })?;
            if func.params.len() != args.len() {
                return Err(SemaError::ExpectArgumentCount { count: func.params.len(), span: *span });
            }
            let results: Vec<_> = args
                .iter()
                .zip(&func.params)
                .map(|(arg, pt)| {
                    let analysed = analyse_expr(ctx, resolver, Some(pt.clone()), arg)?;
                    expect_expr(arg.span, pt, analysed)
                })
                .collect();
            let args = SemaError::aggregate(results)?;
            // Function declarations (and their `NoReturn`/`Exit` attributes)
            // live outside this crate's scope, so these always start false;
            // a driver that analyses declarations can patch them in.
            Ok(Expr::Call { func: Box::new(prefix), args, no_return: false, exit: false })
        }
        PostfixSuffix::Index { index, span } => {
            let pt = prefix.get_type();
            if let Some(array) = pt.as_array() {
                let elem = array.elem.clone();
                let idx = analyse_expr(ctx, resolver, Some(Type::Usize), index)?;
                let idx = expect_expr(index.span, &Type::Usize, idx)?;
                Ok(Expr::Index { ty: elem, from: Box::new(prefix), index: Box::new(idx) })
            } else if let Some(elem) = pt.as_ptr().cloned() {
                let idx = analyse_expr(ctx, resolver, Some(Type::Usize), index)?;
                let idx = expect_expr(index.span, &Type::Usize, idx)?;
                Ok(Expr::Index { ty: elem, from: Box::new(prefix), index: Box::new(idx) })
            } else if let Some(elems) = pt.as_tuple() {
                let literal = analyse_expr(ctx, resolver, Some(Type::Usize), index)?;
                let value = match &literal {
                    Expr::Integer { value, .. } => *value,
                    _ => return Err(SemaError::ExpectIntegerLiteral { span: index.span }),
                };
                if value < 0 || value as usize >= elems.len() {
                    return Err(SemaError::TupleIndexOutOfBounds {
                        index: value,
                        arity: elems.len(),
                        span: index.span,
                    });
                }
                let ty = elems[value as usize].clone();
                Ok(Expr::Index { ty, from: Box::new(prefix), index: Box::new(literal) })
            } else {
                Err(SemaError::ExpectArrayType { span: *span })
            }
        }
        PostfixSuffix::Dot { field, span } => {
            let struct_ty = prefix
                .get_type()
                .as_struct()
                .cloned()
                .ok_or(SemaError::ExpectStructType { span: *span })?;
            if !struct_ty.fields.contains_key(field) {
                return Err(SemaError::UnknownName { name: field.as_str().to_string(), span: *span });
            }
            Ok(Expr::GetField { from: Box::new(prefix), field: *field })
        }
        PostfixSuffix::Select { when_true, when_false, .. } => {
            let cond = expect_expr(when_true.span, &Type::Bool, prefix)?;
            let t = analyse_expr(ctx, resolver, outer_expect, when_true)?;
            let tt = t.get_type();
            let f = analyse_expr(ctx, resolver, Some(tt.clone()), when_false)?;
            let f = expect_expr(when_false.span, &tt, f)?;
            Ok(Expr::Select { cond: Box::new(cond), when_true: Box::new(t), when_false: Box::new(f) })
        }
        PostfixSuffix::As { target, span } => {
            let to = resolver.resolve(ctx.package_context(), target)?;
            let from_ty = prefix.get_type();
            if !is_legal_cast(&from_ty, &to) {
                return Err(SemaError::CannotConvert { target: to, span: *span });
            }
            Ok(Expr::Covert { from: Box::new(prefix), to })
        }
    }
}

fn is_legal_cast(from: &Type, to: &Type) -> bool {
    (from.is_number_type() && to.is_number_type())
        || (matches!(from, Type::Usize) && (to.is_ptr_type() || to.is_func_type()))
        || (to == &Type::Usize && (from.is_ptr_type() || from.is_func_type()))
        || (from.is_ptr_type() && to.is_ptr_type())
        || (from.is_ptr_type() && to.is_func_type())
        || (from.is_func_type() && to.is_ptr_type())
        || (from.is_func_type() && to.is_func_type())
}

// ============================================================================
// §4.5 Assignment
// ============================================================================

fn analyse_assign(
    ctx: &mut dyn BlockContext,
    resolver: &dyn TypeResolver,
    a: &AssignExpr,
    _span: Span,
) -> Result<Expr, SemaError> {
    let left = analyse_expr(ctx, resolver, None, &a.left)?;
    if !left.get_mut() {
        return Err(SemaError::ExpectMutable { span: a.left.span });
    }
    let lt = left.get_type();
    match a.op {
        AstAssignOp::Assign => {}
        AstAssignOp::AddAssign
        | AstAssignOp::SubAssign
        | AstAssignOp::MulAssign
        | AstAssignOp::DivAssign
        | AstAssignOp::ModAssign => {
            if !lt.is_number_type() {
                return Err(SemaError::ExpectNumber { span: a.left.span });
            }
        }
        AstAssignOp::AndAssign
        | AstAssignOp::OrAssign
        | AstAssignOp::XorAssign
        | AstAssignOp::ShlAssign
        | AstAssignOp::ShrAssign => {
            if !lt.is_int_type() {
                return Err(SemaError::ExpectInteger { span: a.left.span });
            }
        }
    }
    let right = analyse_expr(ctx, resolver, Some(lt.clone()), &a.right)?;
    let right = expect_expr(a.right.span, &lt, right)?;
    let op = map_assign_op(a.op);
    Ok(Expr::Assign { op, left: Box::new(left), right: Box::new(right) })
}

fn map_assign_op(op: AstAssignOp) -> AssignOp {
    match op {
        AstAssignOp::Assign => AssignOp::Assign,
        AstAssignOp::AddAssign => AssignOp::AddAssign,
        AstAssignOp::SubAssign => AssignOp::SubAssign,
        AstAssignOp::MulAssign => AssignOp::MulAssign,
        AstAssignOp::DivAssign => AssignOp::DivAssign,
        AstAssignOp::ModAssign => AssignOp::ModAssign,
        AstAssignOp::AndAssign => AssignOp::AndAssign,
        AstAssignOp::OrAssign => AssignOp::OrAssign,
        AstAssignOp::XorAssign => AssignOp::XorAssign,
        AstAssignOp::ShlAssign => AssignOp::ShlAssign,
        AstAssignOp::ShrAssign => AssignOp::ShrAssign,
    }
}

// ============================================================================
// §4.6 Primary expressions and composite literals, §4.7 Constants
// ============================================================================

fn analyse_primary(
    ctx: &mut dyn BlockContext,
    resolver: &dyn TypeResolver,
    expect: Option<Type>,
    p: &PrimaryExpr,
    span: Span,
) -> Result<Expr, SemaError> {
    match p {
        PrimaryExpr::Integer(_)
        | PrimaryExpr::Float(_)
        | PrimaryExpr::Bool(_)
        | PrimaryExpr::Char(_)
        | PrimaryExpr::CString(_)
        | PrimaryExpr::String(_)
        | PrimaryExpr::Null => analyse_literal(&expect, p, span),
        PrimaryExpr::Ident { package, name } => analyse_ident(ctx, *package, *name, span),
        PrimaryExpr::Tuple(elems) => analyse_tuple(ctx, resolver, expect, elems, span),
        PrimaryExpr::Array(elems) => analyse_array(ctx, resolver, expect, elems, span),
        PrimaryExpr::Struct(elems) => analyse_struct(ctx, resolver, expect, elems, span),
    }
}

fn analyse_ident(
    ctx: &mut dyn BlockContext,
    package: Option<Symbol>,
    name: Symbol,
    span: Span,
) -> Result<Expr, SemaError> {
    match package {
        None => ctx.get_value(name).ok_or(SemaError::UnknownIdentifier { span }),
        Some(_) => {
            let pkg = ctx.package_context().ok_or(SemaError::UnknownIdentifier { span })?;
            let (_exported, value) =
                pkg.get_value(name).ok_or(SemaError::UnknownIdentifier { span })?;
            Ok(value)
        }
    }
}

fn analyse_tuple(
    ctx: &mut dyn BlockContext,
    resolver: &dyn TypeResolver,
    expect: Option<Type>,
    elems: &[ParseExpr],
    span: Span,
) -> Result<Expr, SemaError> {
    match elems.len() {
        0 => match expect {
            Some(Type::Tuple(ts)) => Ok(Expr::EmptyTuple { ty: Type::Tuple(ts) }),
            _ => Err(SemaError::ExpectTupleType { span }),
        },
        1 => match &expect {
            Some(Type::Tuple(ts)) if ts.len() == 1 => {
                let inner = analyse_expr(ctx, resolver, Some(ts[0].clone()), &elems[0])?;
                let inner = expect_expr(elems[0].span, &ts[0], inner)?;
                Ok(Expr::Tuple { ty: Type::tuple(vec![inner.get_type()]), elems: vec![inner] })
            }
            // A parenthesisation is transparent: `(e)` is just `e`.
            _ => analyse_expr(ctx, resolver, None, &elems[0]),
        },
        _ => {
            let target_types: Option<&[Type]> = match &expect {
                Some(Type::Tuple(ts)) if ts.len() == elems.len() => Some(ts),
                _ => None,
            };
            let results: Vec<_> = elems
                .iter()
                .enumerate()
                .map(|(i, e)| match target_types {
                    Some(ts) => {
                        let analysed = analyse_expr(ctx, resolver, Some(ts[i].clone()), e)?;
                        expect_expr(e.span, &ts[i], analysed)
                    }
                    None => analyse_expr(ctx, resolver, None, e),
                })
                .collect();
            let analysed = SemaError::aggregate(results)?;
            let ty = Type::tuple(analysed.iter().map(Expr::get_type).collect());
            Ok(Expr::Tuple { ty, elems: analysed })
        }
    }
}

fn analyse_array(
    ctx: &mut dyn BlockContext,
    resolver: &dyn TypeResolver,
    expect: Option<Type>,
    elems: &[ParseExpr],
    span: Span,
) -> Result<Expr, SemaError> {
    if elems.is_empty() {
        return match expect {
            Some(Type::Array(a)) => Ok(Expr::EmptyArray { ty: Type::Array(a) }),
            _ => Err(SemaError::ExpectArrayType { span }),
        };
    }
    let elem_expect = match &expect {
        Some(Type::Array(a)) if a.size == elems.len() => Some(a.elem.clone()),
        _ => None,
    };
    let first = analyse_expr(ctx, resolver, elem_expect, &elems[0])?;
    let first_ty = first.get_type();
    let mut analysed = vec![first];
    let mut errors = Vec::new();
    for e in &elems[1..] {
        let result = analyse_expr(ctx, resolver, Some(first_ty.clone()), e)
            .and_then(|v| expect_expr(e.span, &first_ty, v));
        match result {
            Ok(v) => analysed.push(v),
            Err(err) => errors.push(err),
        }
    }
    match errors.len() {
        0 => Ok(Expr::Array { ty: Type::array(elems.len(), first_ty), elems: analysed }),
        1 => Err(errors.into_iter().next().unwrap()),
        _ => Err(SemaError::Multi(errors)),
    }
}

fn analyse_struct(
    ctx: &mut dyn BlockContext,
    resolver: &dyn TypeResolver,
    expect: Option<Type>,
    elems: &[ParseExpr],
    span: Span,
) -> Result<Expr, SemaError> {
    if elems.is_empty() {
        return match expect {
            Some(Type::Struct(s)) => Ok(Expr::EmptyStruct { ty: Type::Struct(s) }),
            _ => Err(SemaError::ExpectStructType { span }),
        };
    }
    match expect {
        Some(Type::Struct(s)) if s.fields.len() == elems.len() => {
            let results: Vec<_> = elems
                .iter()
                .zip(s.fields.values())
                .map(|(e, t)| {
                    let analysed = analyse_expr(ctx, resolver, Some(t.clone()), e)?;
                    expect_expr(e.span, t, analysed)
                })
                .collect();
            let fields = SemaError::aggregate(results)?;
            Ok(Expr::Struct { ty: Type::Struct(s), fields })
        }
        // Field count must match before any field is analysed: a struct
        // literal never degrades to "no expectation" the way tuples do.
        _ => Err(SemaError::ExpectStructType { span }),
    }
}

/// The literal-steering table of §4.7. Shared between full expression
/// analysis and constant-expression analysis, since leaf constants are
/// analysed identically in both.
fn analyse_literal(expect: &Option<Type>, lit: &PrimaryExpr, span: Span) -> Result<Expr, SemaError> {
    match lit {
        PrimaryExpr::Integer(v) => match expect {
            Some(t) if t.is_int_type() => Ok(Expr::Integer { ty: t.clone(), value: *v }),
            Some(t) if t.is_float_type() => Ok(Expr::Float { ty: t.clone(), value: *v as f64 }),
            _ => Ok(Expr::Integer { ty: Type::Isize, value: *v }),
        },
        PrimaryExpr::Float(v) => match expect {
            Some(t) if t.is_float_type() => Ok(Expr::Float { ty: t.clone(), value: *v }),
            _ => Ok(Expr::Float { ty: Type::F64, value: *v }),
        },
        PrimaryExpr::Bool(v) => Ok(Expr::Boolean { value: *v }),
        PrimaryExpr::Char(v) => match expect {
            Some(t) if t.is_int_type() => Ok(Expr::Integer { ty: t.clone(), value: *v as i64 }),
            Some(t) if t.is_float_type() => Ok(Expr::Float { ty: t.clone(), value: *v as f64 }),
            _ => Ok(Expr::Integer { ty: Type::I32, value: *v as i64 }),
        },
        PrimaryExpr::CString(bytes) => {
            let elem = match expect {
                Some(Type::Array(a)) if a.elem.is_number_type() && a.size == bytes.len() => a.elem.clone(),
                _ => Type::I8,
            };
            let elems: Vec<_> =
                bytes.iter().map(|b| Expr::Integer { ty: elem.clone(), value: *b as i64 }).collect();
            Ok(Expr::Array { ty: Type::array(bytes.len(), elem), elems })
        }
        PrimaryExpr::String(chars) => {
            let elem = match expect {
                Some(Type::Array(a)) if a.elem.is_number_type() && a.size == chars.len() => a.elem.clone(),
                _ => Type::I32,
            };
            let elems: Vec<_> =
                chars.iter().map(|c| Expr::Integer { ty: elem.clone(), value: *c as i64 }).collect();
            Ok(Expr::Array { ty: Type::array(chars.len(), elem), elems })
        }
        PrimaryExpr::Null => match expect {
            Some(t) if t.is_ptr_type() || t.is_func_type() => Ok(Expr::Null { ty: t.clone() }),
            _ => Err(SemaError::ExpectPointer { span }),
        },
        PrimaryExpr::Ident { .. } | PrimaryExpr::Tuple(_) | PrimaryExpr::Array(_) | PrimaryExpr::Struct(_) => {
            unreachable!("analyse_literal only handles leaf constants")
        }
    }
}

// ============================================================================
// §4.8 Constant expressions
// ============================================================================

/// The stricter sibling of `analyse_expr`: accepts only a bare primary —
/// no operators, no postfix suffixes, no unary prefix — whose payload is a
/// leaf constant or a composite literal of constant elements.
pub fn analyse_constant_expr(expect: Option<Type>, expr: &ParseExpr) -> Result<Expr, SemaError> {
    match &expr.kind {
        ParseExprKind::Primary(p) => analyse_constant_primary(expect, p, expr.span),
        _ => Err(SemaError::ExpectConstant { span: expr.span }),
    }
}

fn analyse_constant_primary(expect: Option<Type>, p: &PrimaryExpr, span: Span) -> Result<Expr, SemaError> {
    match p {
        PrimaryExpr::Integer(_)
        | PrimaryExpr::Float(_)
        | PrimaryExpr::Bool(_)
        | PrimaryExpr::Char(_)
        | PrimaryExpr::CString(_)
        | PrimaryExpr::String(_)
        | PrimaryExpr::Null => analyse_literal(&expect, p, span),
        PrimaryExpr::Ident { .. } => Err(SemaError::ExpectConstant { span }),
        PrimaryExpr::Tuple(elems) => analyse_constant_tuple(expect, elems, span),
        PrimaryExpr::Array(elems) => analyse_constant_array(expect, elems, span),
        PrimaryExpr::Struct(elems) => analyse_constant_struct(expect, elems, span),
    }
}

fn analyse_constant_tuple(expect: Option<Type>, elems: &[ParseExpr], span: Span) -> Result<Expr, SemaError> {
    match elems.len() {
        0 => match expect {
            Some(Type::Tuple(ts)) => Ok(Expr::EmptyTuple { ty: Type::Tuple(ts) }),
            _ => Err(SemaError::ExpectTupleType { span }),
        },
        1 => match &expect {
            Some(Type::Tuple(ts)) if ts.len() == 1 => {
                let inner = analyse_constant_expr(Some(ts[0].clone()), &elems[0])?;
                let inner = expect_expr(elems[0].span, &ts[0], inner)?;
                Ok(Expr::Tuple { ty: Type::tuple(vec![inner.get_type()]), elems: vec![inner] })
            }
            _ => analyse_constant_expr(None, &elems[0]),
        },
        _ => {
            let target_types: Option<&[Type]> = match &expect {
                Some(Type::Tuple(ts)) if ts.len() == elems.len() => Some(ts),
                _ => None,
            };
            let results: Vec<_> = elems
                .iter()
                .enumerate()
                .map(|(i, e)| match target_types {
                    Some(ts) => {
                        let analysed = analyse_constant_expr(Some(ts[i].clone()), e)?;
                        expect_expr(e.span, &ts[i], analysed)
                    }
                    None => analyse_constant_expr(None, e),
                })
                .collect();
            let analysed = SemaError::aggregate(results)?;
            let ty = Type::tuple(analysed.iter().map(Expr::get_type).collect());
            Ok(Expr::Tuple { ty, elems: analysed })
        }
    }
}

fn analyse_constant_array(expect: Option<Type>, elems: &[ParseExpr], span: Span) -> Result<Expr, SemaError> {
    if elems.is_empty() {
        return match expect {
            Some(Type::Array(a)) => Ok(Expr::EmptyArray { ty: Type::Array(a) }),
            _ => Err(SemaError::ExpectArrayType { span }),
        };
    }
    let elem_expect = match &expect {
        Some(Type::Array(a)) if a.size == elems.len() => Some(a.elem.clone()),
        _ => None,
    };
    let first = analyse_constant_expr(elem_expect, &elems[0])?;
    let first_ty = first.get_type();
    let mut analysed = vec![first];
    let mut errors = Vec::new();
    for e in &elems[1..] {
        let result = analyse_constant_expr(Some(first_ty.clone()), e)
            .and_then(|v| expect_expr(e.span, &first_ty, v));
        match result {
            Ok(v) => analysed.push(v),
            Err(err) => errors.push(err),
        }
    }
    match errors.len() {
        0 => Ok(Expr::Array { ty: Type::array(elems.len(), first_ty), elems: analysed }),
        1 => Err(errors.into_iter().next().unwrap()),
        _ => Err(SemaError::Multi(errors)),
    }
}

fn analyse_constant_struct(expect: Option<Type>, elems: &[ParseExpr], span: Span) -> Result<Expr, SemaError> {
    if elems.is_empty() {
        return match expect {
            Some(Type::Struct(s)) => Ok(Expr::EmptyStruct { ty: Type::Struct(s) }),
            _ => Err(SemaError::ExpectStructType { span }),
        };
    }
    match expect {
        Some(Type::Struct(s)) if s.fields.len() == elems.len() => {
            let results: Vec<_> = elems
                .iter()
                .zip(s.fields.values())
                .map(|(e, t)| {
                    let analysed = analyse_constant_expr(Some(t.clone()), e)?;
                    expect_expr(e.span, t, analysed)
                })
                .collect();
            let fields = SemaError::aggregate(results)?;
            Ok(Expr::Struct { ty: Type::Struct(s), fields })
        }
        _ => Err(SemaError::ExpectStructType { span }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{FlatPackage, ScopeChain};
    use kc_ast::TypeExprKind;

    /// A primitives-and-shapes-only resolver, enough to drive the analyser
    /// in isolation without a real package system.
    struct TestResolver;

    impl TypeResolver for TestResolver {
        fn resolve(&self, pkg: Option<&dyn PackageContext>, texpr: &kc_ast::TypeExpr) -> Result<Type, SemaError> {
            match &texpr.kind {
                TypeExprKind::Named(name) => match name.as_str() {
                    "bool" => Ok(Type::Bool),
                    "i8" => Ok(Type::I8),
                    "i16" => Ok(Type::I16),
                    "i32" => Ok(Type::I32),
                    "i64" => Ok(Type::I64),
                    "isize" => Ok(Type::Isize),
                    "u8" => Ok(Type::U8),
                    "u32" => Ok(Type::U32),
                    "u64" => Ok(Type::U64),
                    "usize" => Ok(Type::Usize),
                    "f32" => Ok(Type::F32),
                    "f64" => Ok(Type::F64),
                    other => Err(SemaError::UnknownName { name: other.to_string(), span: texpr.span }),
                },
                TypeExprKind::Ptr(elem) => Ok(Type::ptr(self.resolve(pkg, elem)?)),
                TypeExprKind::Array(elem, size) => match &size.kind {
                    ParseExprKind::Primary(PrimaryExpr::Integer(n)) => {
                        Ok(Type::array(*n as usize, self.resolve(pkg, elem)?))
                    }
                    _ => Err(SemaError::ExpectIntegerLiteral { span: texpr.span }),
                },
                TypeExprKind::Tuple(elems) => {
                    let resolved: Result<Vec<_>, _> = elems.iter().map(|e| self.resolve(pkg, e)).collect();
                    Ok(Type::tuple(resolved?))
                }
                TypeExprKind::Func(params, ret) => {
                    let resolved: Result<Vec<_>, _> = params.iter().map(|p| self.resolve(pkg, p)).collect();
                    Ok(Type::func(resolved?, self.resolve(pkg, ret)?))
                }
            }
        }
    }

    fn resolver() -> TestResolver {
        TestResolver
    }

    fn int(value: i64) -> ParseExpr {
        ParseExpr::integer(value, Span::DUMMY)
    }

    fn ident(name: &str) -> ParseExpr {
        ParseExpr::ident(Symbol::intern(name), Span::DUMMY)
    }

    fn scope_with(bindings: &[(&str, Type)]) -> ScopeChain {
        let mut scope = ScopeChain::new();
        for (name, ty) in bindings {
            scope.bind(Symbol::intern(name), Expr::Param { ty: ty.clone() });
        }
        scope
    }

    fn analyse(ctx: &mut dyn BlockContext, expect: Option<Type>, expr: &ParseExpr) -> Result<Expr, SemaError> {
        analyse_expr(ctx, &resolver(), expect, expr)
    }

    // ========================================================================
    // Invariants
    // ========================================================================

    #[test]
    fn test_edge_binary_result_is_never_none_type() {
        let mut ctx = ScopeChain::new();
        let e = ParseExpr::add_sub_chain(int(1), vec![(AddSubOp::Add, int(2))], Span::DUMMY);
        let result = analyse(&mut ctx, None, &e).unwrap();
        assert!(!result.get_type().is_none_type());
    }

    #[test]
    fn test_edge_assign_result_type_is_none() {
        let mut ctx = scope_with(&[("x", Type::I32)]);
        let assign = ParseExpr::assign(kc_ast::expr::AssignOp::Assign, ident("x"), int(1), Span::DUMMY);
        let result = analyse(&mut ctx, None, &assign).unwrap();
        assert_eq!(result.get_type(), Type::None);
    }

    #[test]
    fn test_edge_arithmetic_binary_is_number_type() {
        let mut ctx = ScopeChain::new();
        let e = ParseExpr::mul_div_mod_chain(int(6), vec![(MulDivModOp::Div, int(2))], Span::DUMMY);
        let result = analyse(&mut ctx, None, &e).unwrap();
        assert!(result.get_type().is_number_type());
    }

    #[test]
    fn test_edge_logical_and_is_bool() {
        let mut ctx = ScopeChain::new();
        let lhs = ParseExpr::primary(PrimaryExpr::Bool(true), Span::DUMMY);
        let rhs = ParseExpr::primary(PrimaryExpr::Bool(false), Span::DUMMY);
        let e = ParseExpr::logic_chain(lhs, vec![(LogicOp::And, rhs)], Span::DUMMY);
        let result = analyse(&mut ctx, None, &e).unwrap();
        assert_eq!(result.get_type(), Type::Bool);
    }

    #[test]
    fn test_edge_equal_is_bool() {
        let mut ctx = ScopeChain::new();
        let e = ParseExpr::equal_chain(int(1), vec![(EqualOp::Eq, int(1))], Span::DUMMY);
        let result = analyse(&mut ctx, None, &e).unwrap();
        assert_eq!(result.get_type(), Type::Bool);
    }

    #[test]
    fn test_err_expect_expr_rejects_type_mismatch() {
        let mut ctx = scope_with(&[("x", Type::Bool)]);
        let e = ParseExpr::add_sub_chain(ident("x"), vec![(AddSubOp::Add, int(1))], Span::DUMMY);
        assert!(matches!(analyse(&mut ctx, None, &e), Err(SemaError::ExpectNumber { .. })));
    }

    #[test]
    fn test_edge_null_literal_requires_pointer_or_function_expectation() {
        let mut ctx = ScopeChain::new();
        let null_expr = ParseExpr::primary(PrimaryExpr::Null, Span::DUMMY);
        let expect = Type::ptr(Type::I8);
        let result = analyse(&mut ctx, Some(expect.clone()), &null_expr).unwrap();
        assert_eq!(result.get_type(), expect);
    }

    #[test]
    fn test_err_null_literal_with_no_pointer_expectation_is_rejected() {
        let mut ctx = ScopeChain::new();
        let null_expr = ParseExpr::primary(PrimaryExpr::Null, Span::DUMMY);
        assert!(matches!(analyse(&mut ctx, None, &null_expr), Err(SemaError::ExpectPointer { .. })));
    }

    #[test]
    fn test_edge_cast_between_numbers_is_legal() {
        let mut ctx = scope_with(&[("x", Type::I32)]);
        let target = kc_ast::TypeExpr::named(Symbol::intern("f64"), Span::DUMMY);
        let e = ParseExpr::postfix(ident("x"), vec![PostfixSuffix::As { target, span: Span::DUMMY }], Span::DUMMY);
        let result = analyse(&mut ctx, None, &e).unwrap();
        assert_eq!(result.get_type(), Type::F64);
    }

    #[test]
    fn test_err_cast_between_bool_and_number_is_illegal() {
        let mut ctx = scope_with(&[("x", Type::Bool)]);
        let target = kc_ast::TypeExpr::named(Symbol::intern("i32"), Span::DUMMY);
        let e = ParseExpr::postfix(ident("x"), vec![PostfixSuffix::As { target, span: Span::DUMMY }], Span::DUMMY);
        assert!(matches!(analyse(&mut ctx, None, &e), Err(SemaError::CannotConvert { .. })));
    }

    // ========================================================================
    // Round-trips / laws
    // ========================================================================

    #[test]
    fn test_unary_minus_desugars_to_zero_minus_operand() {
        let mut lhs = scope_with(&[("x", Type::I32)]);
        let mut rhs = scope_with(&[("x", Type::I32)]);

        let neg = ParseExpr::unary(AstUnaryOp::Neg, ident("x"), Span::DUMMY);
        let desugared = ParseExpr::add_sub_chain(int(0), vec![(AddSubOp::Sub, ident("x"))], Span::DUMMY);

        // Both sides need the same contextual expectation: the literal `0`
        // only adopts `x`'s type (rather than defaulting to `Isize`) when
        // it's seeded with it up front, exactly as `analyse_unary` does by
        // constructing `zero` with `x`'s resolved type directly.
        let via_neg = analyse(&mut lhs, Some(Type::I32), &neg).unwrap();
        let via_sub = analyse(&mut rhs, Some(Type::I32), &desugared).unwrap();
        assert_eq!(format!("{:?}", via_neg), format!("{:?}", via_sub));
    }

    #[test]
    fn test_unary_not_desugars_to_xor_minus_one() {
        let mut lhs = scope_with(&[("x", Type::I32)]);
        let mut rhs = scope_with(&[("x", Type::I32)]);

        let bitnot = ParseExpr::unary(AstUnaryOp::BitNot, ident("x"), Span::DUMMY);
        let desugared = ParseExpr::bitwise_chain(ident("x"), vec![(BitwiseOp::Xor, int(-1))], Span::DUMMY);

        let via_not = analyse(&mut lhs, None, &bitnot).unwrap();
        let via_xor = analyse(&mut rhs, None, &desugared).unwrap();
        assert_eq!(format!("{:?}", via_not), format!("{:?}", via_xor));
    }

    #[test]
    fn test_parenthesised_singleton_matches_bare_expression() {
        let mut lhs = scope_with(&[("x", Type::I32)]);
        let mut rhs = scope_with(&[("x", Type::I32)]);

        let paren = ParseExpr::primary(PrimaryExpr::Tuple(vec![ident("x")]), Span::DUMMY);
        let bare = ident("x");

        let via_paren = analyse(&mut lhs, None, &paren).unwrap();
        let via_bare = analyse(&mut rhs, None, &bare).unwrap();
        assert_eq!(via_paren.get_type(), via_bare.get_type());
    }

    // ========================================================================
    // Concrete scenarios (spec §8)
    // ========================================================================

    #[test]
    fn test_scenario_addition_with_isize_expectation() {
        let mut ctx = ScopeChain::new();
        let e = ParseExpr::add_sub_chain(int(1), vec![(AddSubOp::Add, int(2))], Span::DUMMY);
        let result = analyse(&mut ctx, Some(Type::Isize), &e).unwrap();
        assert_eq!(result.get_type(), Type::Isize);
        match result {
            Expr::Binary { op: BinaryOp::Add, left, right } => {
                assert!(matches!(*left, Expr::Integer { ty: Type::Isize, value: 1 }));
                assert!(matches!(*right, Expr::Integer { ty: Type::Isize, value: 2 }));
            }
            other => panic!("expected a Binary add, got {:?}", other),
        }
    }

    #[test]
    fn test_scenario_addition_with_float_expectation_promotes_both_literals() {
        let mut ctx = ScopeChain::new();
        let e = ParseExpr::add_sub_chain(int(1), vec![(AddSubOp::Add, int(2))], Span::DUMMY);
        let result = analyse(&mut ctx, Some(Type::F32), &e).unwrap();
        assert_eq!(result.get_type(), Type::F32);
        match result {
            Expr::Binary { op: BinaryOp::Add, left, right } => {
                assert!(matches!(*left, Expr::Float { ty: Type::F32, value } if value == 1.0f64));
                assert!(matches!(*right, Expr::Float { ty: Type::F32, value } if value == 2.0f64));
            }
            other => panic!("expected a Binary add, got {:?}", other),
        }
    }

    #[test]
    fn test_scenario_pointer_equals_null_is_bool_but_less_than_fails() {
        let mut ctx = scope_with(&[("a", Type::ptr(Type::I8))]);
        let eq = ParseExpr::equal_chain(
            ident("a"),
            vec![(EqualOp::Eq, ParseExpr::primary(PrimaryExpr::Null, Span::DUMMY))],
            Span::DUMMY,
        );
        let result = analyse(&mut ctx, None, &eq).unwrap();
        assert_eq!(result.get_type(), Type::Bool);

        let mut ctx = scope_with(&[("a", Type::ptr(Type::I8))]);
        let lt = ParseExpr::equal_chain(
            ident("a"),
            vec![(EqualOp::Lt, ParseExpr::primary(PrimaryExpr::Null, Span::DUMMY))],
            Span::DUMMY,
        );
        assert!(matches!(analyse(&mut ctx, None, &lt), Err(SemaError::ExpectNumber { .. })));
    }

    #[test]
    fn test_scenario_tuple_index_requires_integer_literal() {
        let mut ctx = ScopeChain::new();
        let tuple = ParseExpr::primary(PrimaryExpr::Tuple(vec![int(1), int(2), int(3)]), Span::DUMMY);

        let non_literal_index = ParseExpr::postfix(
            tuple.clone(),
            vec![PostfixSuffix::Index { index: Box::new(ident("n")), span: Span::DUMMY }],
            Span::DUMMY,
        );
        let mut ctx_with_n = scope_with(&[("n", Type::Usize)]);
        assert!(matches!(
            analyse(&mut ctx_with_n, None, &non_literal_index),
            Err(SemaError::ExpectIntegerLiteral { .. })
        ));

        let literal_index = ParseExpr::postfix(
            tuple,
            vec![PostfixSuffix::Index { index: Box::new(int(1)), span: Span::DUMMY }],
            Span::DUMMY,
        );
        let result = analyse(&mut ctx, None, &literal_index).unwrap();
        assert_eq!(result.get_type(), Type::Isize);
    }

    #[test]
    fn test_scenario_tuple_index_accepts_char_literal() {
        let mut ctx = ScopeChain::new();
        let tuple = ParseExpr::primary(PrimaryExpr::Tuple(vec![int(1), int(2), int(3)]), Span::DUMMY);
        let char_index = ParseExpr::postfix(
            tuple,
            vec![PostfixSuffix::Index {
                index: Box::new(ParseExpr::primary(PrimaryExpr::Char(1), Span::DUMMY)),
                span: Span::DUMMY,
            }],
            Span::DUMMY,
        );
        let result = analyse(&mut ctx, None, &char_index).unwrap();
        assert_eq!(result.get_type(), Type::Isize);
    }

    #[test]
    fn test_scenario_tuple_index_accepts_parenthesised_literal() {
        let mut ctx = ScopeChain::new();
        let tuple = ParseExpr::primary(PrimaryExpr::Tuple(vec![int(1), int(2), int(3)]), Span::DUMMY);
        let parenthesised = ParseExpr::primary(PrimaryExpr::Tuple(vec![int(1)]), Span::DUMMY);
        let paren_index = ParseExpr::postfix(
            tuple,
            vec![PostfixSuffix::Index { index: Box::new(parenthesised), span: Span::DUMMY }],
            Span::DUMMY,
        );
        let result = analyse(&mut ctx, None, &paren_index).unwrap();
        assert_eq!(result.get_type(), Type::Isize);
    }

    #[test]
    fn test_scenario_ref_of_param_succeeds_ref_of_temporary_fails() {
        let mut ctx = scope_with(&[("x", Type::I32)]);
        let ref_x = ParseExpr::unary(AstUnaryOp::Ref, ident("x"), Span::DUMMY);
        let result = analyse(&mut ctx, None, &ref_x).unwrap();
        assert_eq!(result.get_type(), Type::ptr(Type::I32));

        let mut ctx = ScopeChain::new();
        let sum = ParseExpr::add_sub_chain(int(1), vec![(AddSubOp::Add, int(2))], Span::DUMMY);
        let ref_temp = ParseExpr::unary(AstUnaryOp::Ref, sum, Span::DUMMY);
        assert!(matches!(analyse(&mut ctx, None, &ref_temp), Err(SemaError::UnexpectedTemporary { .. })));
    }

    #[test]
    fn test_scenario_call_propagates_per_argument_expected_types() {
        let func_ty = Type::func(vec![Type::I32, Type::F64], Type::Bool);
        let mut ctx = scope_with(&[("f", func_ty)]);
        let call = ParseExpr::postfix(
            ident("f"),
            vec![PostfixSuffix::Call { args: vec![int(1), int(2)], span: Span::DUMMY }],
            Span::DUMMY,
        );
        let result = analyse(&mut ctx, None, &call).unwrap();
        assert_eq!(result.get_type(), Type::Bool);
        match result {
            Expr::Call { args, .. } => {
                assert!(matches!(&args[0], Expr::Integer { ty: Type::I32, value: 1 }));
                assert!(matches!(&args[1], Expr::Float { ty: Type::F64, value } if *value == 2.0));
            }
            other => panic!("expected a Call, got {:?}", other),
        }
    }

    #[test]
    fn test_scenario_call_with_wrong_argument_count_is_rejected() {
        let func_ty = Type::func(vec![Type::I32, Type::F64], Type::Bool);
        let mut ctx = scope_with(&[("f", func_ty)]);
        let call = ParseExpr::postfix(
            ident("f"),
            vec![PostfixSuffix::Call { args: vec![int(1)], span: Span::DUMMY }],
            Span::DUMMY,
        );
        assert!(matches!(analyse(&mut ctx, None, &call), Err(SemaError::ExpectArgumentCount { .. })));
    }

    // ========================================================================
    // Package-qualified identifiers
    // ========================================================================

    #[test]
    fn test_qualified_ident_resolves_through_package_context() {
        let mut pkg = FlatPackage::new();
        pkg.insert(Symbol::intern("PI"), true, Expr::Float { ty: Type::F64, value: 3.14 });
        let mut ctx = ScopeChain::with_package(Box::new(pkg));

        let e = ParseExpr::qualified_ident(Symbol::intern("math"), Symbol::intern("PI"), Span::DUMMY);
        let result = analyse(&mut ctx, None, &e).unwrap();
        assert_eq!(result.get_type(), Type::F64);
    }

    #[test]
    fn test_unknown_identifier_is_rejected() {
        let mut ctx = ScopeChain::new();
        assert!(matches!(analyse(&mut ctx, None, &ident("nope")), Err(SemaError::UnknownIdentifier { .. })));
    }
}
