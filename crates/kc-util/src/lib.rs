//! kc-util - Core Utilities and Foundation Types
//!
//! ============================================================================
//! MODULE OVERVIEW
//! ============================================================================
//!
//! This crate provides fundamental utilities and types that form the foundation
//! of the K compiler infrastructure. These utilities are designed to be
//! zero-cost abstractions that improve code clarity, type safety, and performance
//! without runtime overhead.
//!
//! DESIGN PRINCIPLES:
//! ------------------
//! 1. ZERO-COST ABSTRACTIONS
//!    All utilities compile down to efficient code with no runtime penalty
//!    compared to hand-written implementations.
//!
//! 2. TYPE SAFETY
//!    Leverage Rust's type system to prevent bugs at compile time.
//!    Examples: Typed indices prevent mixing different ID spaces.
//!
//! 3. PERFORMANCE
//!    Optimize for the common case while maintaining correctness.
//!    Examples: Efficient string interning, lock-free data structures.
//!
//! 4. ERGONOMICS
//!    APIs should be intuitive and easy to use correctly.
//!    Examples: Builder patterns, type inference-friendly interfaces.
//!
//! # Modules
//!
//! - [`symbol`]: Interned identifiers (`Symbol`) with pre-reserved indices for
//!   K's keywords and primitive type names.
//! - [`span`]: Source location tracking (`Span`, `FileId`, `SourceMap`).
//! - [`diagnostic`]: Structured error/warning reporting (`Diagnostic`, `Handler`,
//!   `DiagnosticBuilder`).
//! - [`def_id`]: A typed identifier for top-level definitions, generated
//!   monotonically by `DefIdGenerator`.
//! - [`index_vec`]: `IndexVec<I, T>`, a `Vec` indexed by a newtype `I: Idx`
//!   rather than `usize`.
//! - [`error`]: `thiserror`-backed error enums for this crate's own
//!   fallible operations (symbol lookup, source map queries, index bounds).

pub mod def_id;
pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use def_id::{DefId, DefIdGenerator};
pub use diagnostic::{Diagnostic, DiagnosticBuilder, Handler, Level};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, Span};
pub use symbol::Symbol;

// Re-export commonly used hash collection types, matching the teacher's
// preference for `rustc-hash` over the standard library's `HashMap`/`HashSet`.
pub use rustc_hash::{FxHashMap, FxHashSet};
