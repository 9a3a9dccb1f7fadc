//! Error kinds for the vector core.
//!
//! One enum, one `Result` alias, same shape as every other error module in
//! this lineage: a variant per failure mode, short `#[error]` messages, no
//! hidden control flow.

/// Errors raised by fixed-width vector operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// `get(i)` was called on a slot whose validity bit is 0.
    #[error("get() called on a null value at index {0}")]
    NullValue(usize),

    /// The non-safe `set(i, ..)` was called with `i >= capacity`.
    #[error("index {index} out of bounds (capacity {capacity})")]
    IndexOutOfBounds { index: usize, capacity: usize },

    /// A nullable-holder `isSet < 0`, a decimal precision/scale violation, or
    /// a negative initial capacity.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A requested allocation size exceeds the configured hard cap.
    #[error("allocation of {requested} bytes exceeds the maximum of {max} bytes")]
    OversizedAllocation { requested: usize, max: usize },

    /// The allocator refused to produce a buffer.
    ///
    /// Unreachable through [`crate::buffer::SystemAllocator`] (the global
    /// Rust allocator aborts the process on exhaustion rather than
    /// returning an error); reachable only through a custom, fallible
    /// [`crate::buffer::Allocator`] implementation.
    #[error("allocator returned no buffer")]
    OutOfMemory,

    /// `transferTo`/`copyFrom` attempted between incompatible concrete
    /// vectors. For the generic façades this is a compile-time
    /// impossibility (the type system already enforces it); it remains
    /// reachable for `DecimalVector`, where `(precision, scale)` is a
    /// runtime field rather than part of the type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
}

/// Crate-wide result alias, matching the teacher's `errors.rs` convention.
pub type Result<T, E = Error> = std::result::Result<T, E>;
