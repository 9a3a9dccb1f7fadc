//! Small by-value struct used to pass optional values without heap
//! allocation, the vehicle the reader/writer layer uses to move data
//! through a façade's nullable-holder get/set operations.

/// `{isSet, value}` pair. `is_set` is signed so a negative value can be
/// used as a distinguished "invalid" sentinel by nullable-holder setters
/// (see `FixedWidthVector::set_holder`), matching the spec's
/// `InvalidArgument` failure mode for `isSet < 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Holder<T> {
    pub is_set: i8,
    pub value: T,
}
