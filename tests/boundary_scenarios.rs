//! Boundary scenarios S1-S6: one test per scenario named in the container
//! core's testable-properties section.

use colvec::bit::BitVector;
use colvec::decimal::DecimalVector;
use colvec::errors::Error;
use colvec::vector::{Float8Vector, IntVector};

/// S1: empty vector, buffer size is zero.
#[test]
fn s1_empty_vector_zero_buffer_size() {
    let v = IntVector::new();
    assert_eq!(v.buffer_size(), 0);
}

/// S2: `Int` vector, `setSafe(1_000_000, 42)`; capacity >= 1_000_001;
/// `get(1_000_000) == 42`; `get(0)` raises `NullValue`.
#[test]
fn s2_set_safe_grows_far_beyond_initial_capacity() {
    let mut v = IntVector::new();
    v.allocate_new_with_capacity(4).unwrap();
    v.set_safe(1_000_000, 42).unwrap();

    assert!(v.value_capacity() >= 1_000_001);
    assert_eq!(v.get(1_000_000).unwrap(), 42);
    assert!(matches!(v.get(0), Err(Error::NullValue(0))));
}

/// S3: `Float8` vector with `[1.0, null, -0.0, +inf, NaN]` at indices 0-4.
#[test]
fn s3_float8_special_values_and_null_count() {
    let mut v = Float8Vector::new();
    v.allocate_new().unwrap();
    v.set_safe(0, 1.0).unwrap();
    v.set_null(1).unwrap();
    v.set_safe(2, -0.0).unwrap();
    v.set_safe(3, f64::INFINITY).unwrap();
    v.set_safe(4, f64::NAN).unwrap();
    v.set_value_count(5).unwrap();

    assert_eq!(v.null_count(), 1);
    assert_eq!(v.get(3).unwrap(), f64::INFINITY);
    assert_eq!(v.get(4).unwrap().to_bits(), f64::NAN.to_bits());
    assert_eq!(v.is_set(1), 0);
    assert_eq!(v.get(2).unwrap().to_bits(), (-0.0f64).to_bits());
}

/// S4: `Bit` vector, alternating 0/1 for i in [0, 17); unaligned
/// `splitAndTransferTo(3, 9, target)` produces a freshly-allocated target
/// value buffer whose bit k equals the source's bit 3+k.
#[test]
fn s4_bit_vector_alternating_and_unaligned_split() {
    let mut v = BitVector::new();
    v.allocate_new().unwrap();
    for i in 0..17 {
        v.set_safe(i, i % 2 == 1).unwrap();
    }
    v.set_value_count(17).unwrap();

    for i in 0..17 {
        assert_eq!(v.get_object(i), Some(i % 2 == 1));
    }

    let mut target = BitVector::new();
    v.split_and_transfer_to(3, 9, &mut target).unwrap();
    assert_eq!(target.value_count(), 9);
    for k in 0..9 {
        assert_eq!(target.get_object(k), v.get_object(3 + k));
    }
}

/// S5: `Decimal(10,2)` vector, `setSafe(0, 1234.56)`; unscaled == 123456,
/// scale == 2; `setSafe(1, 10^11)` raises `InvalidArgument`.
#[test]
fn s5_decimal_scale_and_precision_overflow() {
    let mut v = DecimalVector::new(10, 2).unwrap();
    v.allocate_new().unwrap();
    v.set_safe(0, 123_456).unwrap();

    let d = v.get_object(0).unwrap();
    assert_eq!(d.unscaled, 123_456);
    assert_eq!(d.scale, 2);

    assert!(matches!(v.set_safe(1, 10i128.pow(11)), Err(Error::InvalidArgument(_))));
}

/// S6: `transferTo` across differing concrete decimal parameters raises
/// `TypeMismatch`; both vectors unchanged.
#[test]
fn s6_transfer_across_mismatched_decimal_params_is_type_mismatch() {
    let mut a = DecimalVector::new(10, 2).unwrap();
    a.allocate_new().unwrap();
    a.set_safe(0, 100).unwrap();
    a.set_value_count(1).unwrap();

    let mut b = DecimalVector::new(10, 3).unwrap();
    b.allocate_new().unwrap();

    let result = a.transfer_to(&mut b);
    assert!(matches!(result, Err(Error::TypeMismatch { .. })));

    // Both vectors unchanged: source still holds its value, target is
    // still empty.
    assert_eq!(a.get(0).unwrap().unscaled, 100);
    assert_eq!(b.value_count(), 0);
}
