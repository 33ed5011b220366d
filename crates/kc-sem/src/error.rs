//! `SemaError` — the analyser's closed error taxonomy (spec.md §7).
//!
//! Every variant carries the `Span` of the offending (sub-)expression.
//! `Multi` aggregates the independent failures of a list context (tuple,
//! array, struct, or call-argument analysis, §4.9); a single failure is
//! never wrapped in it.

use crate::types::Type;
use kc_util::diagnostic::{Diagnostic, DiagnosticBuilder};
use kc_util::Span;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum SemaError {
    #[error("expect a number")]
    ExpectNumber { span: Span },
    #[error("expect a signed integer")]
    ExpectSignedInteger { span: Span },
    #[error("expect a integer")]
    ExpectInteger { span: Span },
    #[error("expect a pointer")]
    ExpectPointer { span: Span },
    #[error("expect a tuple type")]
    ExpectTupleType { span: Span },
    #[error("expect a array type")]
    ExpectArrayType { span: Span },
    #[error("expect a struct type")]
    ExpectStructType { span: Span },
    #[error("expect a function")]
    ExpectFunction { span: Span },

    #[error("expect type `{expected:?}`")]
    ExpectType { expected: Type, span: Span },

    #[error("expect a mutable value")]
    ExpectMutable { span: Span },
    #[error("not expect a temporary value")]
    UnexpectedTemporary { span: Span },

    #[error("expect {count} arguments")]
    ExpectArgumentCount { count: usize, span: Span },
    #[error("expect a integer literal")]
    ExpectIntegerLiteral { span: Span },
    #[error("tuple index {index} out of bounds for a {arity}-element tuple")]
    TupleIndexOutOfBounds { index: i64, arity: usize, span: Span },

    #[error("unknown identifier")]
    UnknownIdentifier { span: Span },
    #[error("unknown `{name}`")]
    UnknownName { name: String, span: Span },

    #[error("can not covert to type `{target:?}`")]
    CannotConvert { target: Type, span: Span },

    #[error("expect a constant value")]
    ExpectConstant { span: Span },

    /// The aggregated failures of an expression-list context. Never
    /// constructed with fewer than two elements.
    #[error("{} errors", .0.len())]
    Multi(Vec<SemaError>),
}

impl SemaError {
    /// The span of the single error this represents, or of the first
    /// element of a `Multi`.
    pub fn span(&self) -> Span {
        match self {
            SemaError::ExpectNumber { span }
            | SemaError::ExpectSignedInteger { span }
            | SemaError::ExpectInteger { span }
            | SemaError::ExpectPointer { span }
            | SemaError::ExpectTupleType { span }
            | SemaError::ExpectArrayType { span }
            | SemaError::ExpectStructType { span }
            | SemaError::ExpectFunction { span }
            | SemaError::ExpectType { span, .. }
            | SemaError::ExpectMutable { span }
            | SemaError::UnexpectedTemporary { span }
            | SemaError::ExpectArgumentCount { span, .. }
            | SemaError::ExpectIntegerLiteral { span }
            | SemaError::TupleIndexOutOfBounds { span, .. }
            | SemaError::UnknownIdentifier { span }
            | SemaError::UnknownName { span, .. }
            | SemaError::CannotConvert { span, .. }
            | SemaError::ExpectConstant { span } => *span,
            SemaError::Multi(errors) => errors.first().map(|e| e.span()).unwrap_or(Span::DUMMY),
        }
    }

    /// Aggregate a batch of list-context results, collecting failures into
    /// a `Multi` (or returning the lone failure unwrapped, per §4.9/§7).
    pub fn aggregate<T>(results: Vec<Result<T, SemaError>>) -> Result<Vec<T>, SemaError> {
        let mut oks = Vec::with_capacity(results.len());
        let mut errs = Vec::new();
        for result in results {
            match result {
                Ok(value) => oks.push(value),
                Err(err) => errs.push(err),
            }
        }
        match errs.len() {
            0 => Ok(oks),
            1 => Err(errs.into_iter().next().unwrap()),
            _ => Err(SemaError::Multi(errs)),
        }
    }

    /// Render as a positioned, leveled diagnostic for the driver.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            SemaError::Multi(errors) => {
                let mut builder = DiagnosticBuilder::error(self.to_string()).span(self.span());
                for err in errors {
                    builder = builder.with_note(err.to_string());
                }
                builder.build()
            }
            other => DiagnosticBuilder::error(other.to_string()).span(other.span()).build(),
        }
    }
}
