//! OCFL conformance validation.
//!
//! Three layers, composed bottom-up:
//!
//! - [`structural::validate_inventory`] — one inventory document against the
//!   OCFL syntactic and semantic rules, accumulating every applicable
//!   diagnostic in a single pass.
//! - [`cross::compare_inventories`] — immutability checks between two
//!   inventories describing overlapping version history.
//! - [`object::ObjectValidator`] — drives storage traversal, both validators,
//!   and content-digest verification into one pass/fail report.
//!
//! Validation never mutates anything and never fails fast: all spec
//! violations are collected as [`Diagnostic`]s, and only truly unprocessable
//! input (a document that is not a JSON object at all) aborts a call.
//! Overall pass/fail is "no error-severity diagnostics"; warnings never fail
//! validation.

pub mod codes;
pub mod cross;
pub mod error;
pub mod object;
pub mod report;
pub mod structural;

pub use codes::{Severity, ValidationCode};
pub use error::{ValidateError, ValidateResult};
pub use object::{ObjectReport, ObjectValidator};
pub use report::{Diagnostic, DiagnosticLog, ValidationOptions};
pub use structural::{validate_inventory, StructuralReport};
