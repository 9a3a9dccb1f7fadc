//! Generic typed façade over [`FixedWidthBase`], one per scalar width and
//! interpretation. `Bit` is handled separately in [`crate::bit`] (its value
//! buffer is bit-packed, not byte-aligned) and `Decimal` in
//! [`crate::decimal`] (its type parameters are a runtime field); every
//! other roster entry is `FixedWidthVector<T>` for the matching
//! [`ScalarType`].

use std::marker::PhantomData;
use std::sync::Arc;

use crate::base::FixedWidthBase;
use crate::buffer::{Allocator, ByteBuffer, SystemAllocator};
use crate::errors::{Error, Result};
use crate::holder::Holder;
use crate::types::{MinorType, ScalarType, VectorAccessor};

/// A fixed-width nullable column of `T`.
pub struct FixedWidthVector<T: ScalarType> {
    base: FixedWidthBase,
    _marker: PhantomData<T>,
}

impl<T: ScalarType> FixedWidthVector<T> {
    /// An empty, unallocated vector using the system allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::with_allocator(Arc::new(SystemAllocator))
    }

    /// As [`Self::new`], with a caller-supplied allocator.
    #[must_use]
    pub fn with_allocator(allocator: Arc<dyn Allocator>) -> Self {
        Self { base: FixedWidthBase::with_allocator(T::BYTE_WIDTH * 8, allocator), _marker: PhantomData }
    }

    /// # Errors
    /// [`Error::OversizedAllocation`] if `n` elements would exceed the
    /// allocation cap.
    pub fn set_initial_capacity(&mut self, n: usize) -> Result<()> {
        self.base.set_initial_capacity(n)
    }

    /// # Errors
    /// [`Error::OversizedAllocation`] / [`Error::OutOfMemory`].
    pub fn allocate_new(&mut self) -> Result<()> {
        self.base.allocate_new()
    }

    /// # Errors
    /// [`Error::OversizedAllocation`] / [`Error::OutOfMemory`].
    pub fn allocate_new_with_capacity(&mut self, n: usize) -> Result<()> {
        self.base.allocate_new_with_capacity(n)
    }

    #[must_use]
    pub fn value_count(&self) -> usize {
        self.base.value_count()
    }

    #[must_use]
    pub fn value_capacity(&self) -> usize {
        self.base.value_capacity()
    }

    /// # Errors
    /// Propagates growth failures when `n > value_capacity()`.
    pub fn set_value_count(&mut self, n: usize) -> Result<()> {
        self.base.set_value_count(n)
    }

    #[must_use]
    pub fn is_set(&self, i: usize) -> u8 {
        self.base.is_set(i)
    }

    #[must_use]
    pub fn null_count(&self) -> usize {
        self.base.null_count()
    }

    pub fn clear(&mut self) {
        self.base.clear();
    }

    /// # Errors
    /// [`Error::NullValue`] if element `i` is null.
    pub fn get(&self, i: usize) -> Result<T> {
        if self.base.bit_set(i) != 1 {
            return Err(Error::NullValue(i));
        }
        let w = T::BYTE_WIDTH;
        Ok(T::read_le(self.base.values().get_bytes(i * w, w)))
    }

    /// `None` if null, else the boxed value.
    #[must_use]
    pub fn get_object(&self, i: usize) -> Option<T> {
        if self.base.bit_set(i) == 1 {
            let w = T::BYTE_WIDTH;
            Some(T::read_le(self.base.values().get_bytes(i * w, w)))
        } else {
            None
        }
    }

    fn write_unchecked(&mut self, i: usize, v: T) {
        self.base.validity_mut().with_mut(|buf| crate::bitmap::set_bit_to_one(buf, i));
        let w = T::BYTE_WIDTH;
        let mut tmp = vec![0u8; w];
        v.write_le(&mut tmp);
        self.base.values_mut().write_bytes(i * w, &tmp);
    }

    /// Requires `i < capacity()`.
    ///
    /// # Errors
    /// [`Error::IndexOutOfBounds`] if `i >= capacity()`.
    pub fn set(&mut self, i: usize, v: T) -> Result<()> {
        if i >= self.base.capacity() {
            return Err(Error::IndexOutOfBounds { index: i, capacity: self.base.capacity() });
        }
        self.write_unchecked(i, v);
        Ok(())
    }

    /// [`Self::set`], growing capacity first if needed.
    ///
    /// # Errors
    /// Propagates growth failures.
    pub fn set_safe(&mut self, i: usize, v: T) -> Result<()> {
        self.base.handle_safe(i)?;
        self.write_unchecked(i, v);
        Ok(())
    }

    /// Grow if needed, then clear the validity bit at `i`.
    ///
    /// # Errors
    /// Propagates growth failures.
    pub fn set_null(&mut self, i: usize) -> Result<()> {
        self.base.handle_safe(i)?;
        self.base.validity_mut().with_mut(|buf| crate::bitmap::set_bit(buf, i, 0));
        Ok(())
    }

    /// `h.is_set < 0` is [`Error::InvalidArgument`]; `h.is_set > 0` sets
    /// both bit and value; `h.is_set == 0` clears the bit. Grows first.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] if `h.is_set < 0`; otherwise propagates
    /// growth failures.
    pub fn set_holder(&mut self, i: usize, h: Holder<T>) -> Result<()> {
        if h.is_set < 0 {
            return Err(Error::InvalidArgument(format!("holder.is_set must be >= 0, got {}", h.is_set)));
        }
        self.base.handle_safe(i)?;
        if h.is_set > 0 {
            self.write_unchecked(i, h.value);
        } else {
            self.base.validity_mut().with_mut(|buf| crate::bitmap::set_bit(buf, i, 0));
        }
        Ok(())
    }

    /// Fill `h` from slot `i`: `is_set` and, when set, `value`.
    pub fn get_holder(&self, i: usize, h: &mut Holder<T>) {
        if self.base.bit_set(i) == 1 {
            h.is_set = 1;
            let w = T::BYTE_WIDTH;
            h.value = T::read_le(self.base.values().get_bytes(i * w, w));
        } else {
            h.is_set = 0;
        }
    }

    /// Disjoint-form mirror of [`Self::set_holder`]: explicit `is_set` and
    /// `value` parameters instead of a packed struct. Grows first.
    ///
    /// # Errors
    /// Propagates growth failures.
    pub fn set_disjoint(&mut self, i: usize, is_set: bool, value: T) -> Result<()> {
        self.base.handle_safe(i)?;
        if is_set {
            self.write_unchecked(i, value);
        } else {
            self.base.validity_mut().with_mut(|buf| crate::bitmap::set_bit(buf, i, 0));
        }
        Ok(())
    }

    /// Move buffer ownership to `target`. `self` becomes empty.
    pub fn transfer_to(&mut self, target: &mut Self) {
        self.base.transfer_to(&mut target.base);
    }

    /// # Errors
    /// [`Error::IndexOutOfBounds`] if `start + length > value_count()`.
    pub fn split_and_transfer_to(&self, start: usize, length: usize, target: &mut Self) -> Result<()> {
        self.base.split_and_transfer_to(start, length, &mut target.base)
    }

    pub fn copy_from(&self, j: usize, dst: &mut Self, i: usize) {
        self.base.copy_from(j, &mut dst.base, i);
    }

    /// # Errors
    /// Propagates growth failures on `dst`.
    pub fn copy_from_safe(&self, j: usize, dst: &mut Self, i: usize) -> Result<()> {
        self.base.copy_from_safe(j, &mut dst.base, i)
    }

    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.base.buffer_size()
    }

    #[must_use]
    pub fn buffer_size_for(&self, count: usize) -> usize {
        self.base.buffer_size_for(count)
    }

    #[must_use]
    pub fn field_buffers(&self) -> (ByteBuffer, ByteBuffer) {
        self.base.field_buffers()
    }
}

impl<T: ScalarType> Default for FixedWidthVector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ScalarType> VectorAccessor for FixedWidthVector<T> {
    fn is_set(&self, i: usize) -> u8 {
        self.base.is_set(i)
    }

    fn value_count(&self) -> usize {
        self.base.value_count()
    }

    fn minor_type(&self) -> MinorType {
        T::MINOR_TYPE
    }
}

/// Naive-calendar `getObject` conversions, kept next to the façades they
/// apply to rather than bolted onto the generic `get_object`. `DateMilli`
/// and every `TimeStamp*` unit store a signed epoch offset that only makes
/// sense to a caller as a calendar value through one of these.
impl FixedWidthVector<crate::types::DateDay> {
    /// # Errors
    /// [`Error::NullValue`] if null; [`Error::InvalidArgument`] if the
    /// stored day count is out of `chrono`'s representable range.
    pub fn get_date(&self, i: usize) -> Result<chrono::NaiveDate> {
        let days = self.get(i)?.0;
        chrono::NaiveDate::from_num_days_from_ce_opt(days + 719_163)
            .ok_or_else(|| Error::InvalidArgument(format!("day count {days} out of range")))
    }
}

impl FixedWidthVector<crate::types::DateMilli> {
    /// # Errors
    /// [`Error::NullValue`] if null; [`Error::InvalidArgument`] if the
    /// stored millisecond offset is out of range.
    pub fn get_date_time(&self, i: usize) -> Result<chrono::NaiveDateTime> {
        let millis = self.get(i)?.0;
        chrono::DateTime::from_timestamp_millis(millis)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| Error::InvalidArgument(format!("millisecond timestamp {millis} out of range")))
    }
}

macro_rules! impl_timestamp_getter {
    ($ty:ty, $method:ident, $ctor:expr) => {
        impl FixedWidthVector<$ty> {
            /// # Errors
            /// [`Error::NullValue`] if null; [`Error::InvalidArgument`] if
            /// the stored offset is out of `chrono`'s representable range.
            pub fn $method(&self, i: usize) -> Result<chrono::NaiveDateTime> {
                let value = self.get(i)?.0;
                ($ctor)(value)
                    .map(|dt: chrono::DateTime<chrono::Utc>| dt.naive_utc())
                    .ok_or_else(|| Error::InvalidArgument(format!("timestamp {value} out of range")))
            }
        }
    };
}

impl_timestamp_getter!(
    crate::types::TimeStampSec,
    get_timestamp,
    |v: i64| chrono::DateTime::from_timestamp(v, 0)
);
impl_timestamp_getter!(
    crate::types::TimeStampMilli,
    get_timestamp,
    |v: i64| chrono::DateTime::from_timestamp_millis(v)
);
impl_timestamp_getter!(
    crate::types::TimeStampMicro,
    get_timestamp,
    |v: i64| chrono::DateTime::from_timestamp_micros(v)
);
impl_timestamp_getter!(
    crate::types::TimeStampNano,
    get_timestamp,
    |v: i64| Some(chrono::DateTime::from_timestamp_nanos(v))
);

/// Roster type aliases, one per `spec.md` §4.3.1 entry backed directly by
/// a Rust primitive.
pub type TinyIntVector = FixedWidthVector<i8>;
pub type UInt1Vector = FixedWidthVector<u8>;
pub type SmallIntVector = FixedWidthVector<i16>;
pub type UInt2Vector = FixedWidthVector<u16>;
pub type IntVector = FixedWidthVector<i32>;
pub type UInt4Vector = FixedWidthVector<u32>;
pub type BigIntVector = FixedWidthVector<i64>;
pub type UInt8Vector = FixedWidthVector<u64>;
pub type Float4Vector = FixedWidthVector<f32>;
pub type Float8Vector = FixedWidthVector<f64>;
pub type DateDayVector = FixedWidthVector<crate::types::DateDay>;
pub type DateMilliVector = FixedWidthVector<crate::types::DateMilli>;
pub type TimeSecVector = FixedWidthVector<crate::types::TimeSec>;
pub type TimeMilliVector = FixedWidthVector<crate::types::TimeMilli>;
pub type TimeMicroVector = FixedWidthVector<crate::types::TimeMicro>;
pub type TimeNanoVector = FixedWidthVector<crate::types::TimeNano>;
pub type TimeStampSecVector = FixedWidthVector<crate::types::TimeStampSec>;
pub type TimeStampMilliVector = FixedWidthVector<crate::types::TimeStampMilli>;
pub type TimeStampMicroVector = FixedWidthVector<crate::types::TimeStampMicro>;
pub type TimeStampNanoVector = FixedWidthVector<crate::types::TimeStampNano>;
pub type IntervalYearVector = FixedWidthVector<crate::types::IntervalYear>;
pub type IntervalDayVector = FixedWidthVector<crate::types::IntervalDay>;

#[cfg(test)]
mod tests {
    use super::*;

    /// Generates one round-trip test per roster type instead of hand-
    /// writing the same three lines twenty times over, the per-type
    /// duplication this layer is most prone to.
    macro_rules! roundtrip_test {
        ($name:ident, $ty:ty, $sample:expr) => {
            paste::paste! {
                #[test]
                fn [<roundtrip_non_null_ $name>]() {
                    let mut v: FixedWidthVector<$ty> = FixedWidthVector::new();
                    v.allocate_new().unwrap();
                    v.set_safe(0, $sample).unwrap();
                    assert_eq!(v.get(0).unwrap(), $sample);
                    v.set_value_count(1).unwrap();
                    assert_eq!(v.is_set(0), 1);
                }

                #[test]
                fn [<roundtrip_null_ $name>]() {
                    let mut v: FixedWidthVector<$ty> = FixedWidthVector::new();
                    v.allocate_new().unwrap();
                    v.set_safe(0, $sample).unwrap();
                    v.set_null(0).unwrap();
                    assert_eq!(v.is_set(0), 0);
                    assert!(v.get_object(0).is_none());
                }
            }
        };
    }

    roundtrip_test!(tiny_int, i8, 5i8);
    roundtrip_test!(u_int1, u8, 5u8);
    roundtrip_test!(small_int, i16, 1234i16);
    roundtrip_test!(u_int2, u16, 1234u16);
    roundtrip_test!(int, i32, 42i32);
    roundtrip_test!(u_int4, u32, 42u32);
    roundtrip_test!(big_int, i64, 42i64);
    roundtrip_test!(u_int8, u64, 42u64);
    roundtrip_test!(float4, f32, 1.5f32);
    roundtrip_test!(float8, f64, 1.5f64);
    roundtrip_test!(interval_year, crate::types::IntervalYear, crate::types::IntervalYear(6));

    #[test]
    fn get_on_null_slot_is_null_value_error() {
        let v: FixedWidthVector<i32> = FixedWidthVector::new();
        assert!(matches!(v.get(0), Err(Error::NullValue(0))));
    }

    #[test]
    fn set_requires_index_within_capacity() {
        let mut v: FixedWidthVector<i32> = FixedWidthVector::new();
        v.allocate_new_with_capacity(4).unwrap();
        assert!(matches!(
            v.set(100, 1),
            Err(Error::IndexOutOfBounds { index: 100, capacity: 4 })
        ));
    }

    #[test]
    fn set_safe_grows_and_writes() {
        let mut v: FixedWidthVector<i32> = FixedWidthVector::new();
        v.allocate_new_with_capacity(4).unwrap();
        v.set_safe(1_000_000, 42).unwrap();
        assert!(v.value_capacity() >= 1_000_001);
        assert_eq!(v.get(1_000_000).unwrap(), 42);
    }

    #[test]
    fn holder_round_trip() {
        let mut v: FixedWidthVector<i32> = FixedWidthVector::new();
        v.allocate_new().unwrap();
        v.set_holder(0, Holder { is_set: 1, value: 7 }).unwrap();
        let mut h = Holder { is_set: 0, value: 0 };
        v.get_holder(0, &mut h);
        assert_eq!(h.is_set, 1);
        assert_eq!(h.value, 7);

        v.set_holder(1, Holder { is_set: 0, value: 9 }).unwrap();
        let mut h2 = Holder { is_set: 1, value: 0 };
        v.get_holder(1, &mut h2);
        assert_eq!(h2.is_set, 0);
    }

    #[test]
    fn holder_negative_is_set_is_invalid_argument() {
        let mut v: FixedWidthVector<i32> = FixedWidthVector::new();
        v.allocate_new().unwrap();
        assert!(matches!(
            v.set_holder(0, Holder { is_set: -1, value: 0 }),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn transfer_to_empties_source_and_fills_target() {
        let mut src: FixedWidthVector<i32> = FixedWidthVector::new();
        src.allocate_new().unwrap();
        src.set_safe(0, 1).unwrap();
        src.set_value_count(1).unwrap();

        let mut dst: FixedWidthVector<i32> = FixedWidthVector::new();
        src.transfer_to(&mut dst);

        assert_eq!(src.value_capacity(), 0);
        assert_eq!(dst.get(0).unwrap(), 1);
    }

    #[test]
    fn float_vector_preserves_nan_bit_pattern_and_special_values() {
        let mut v: FixedWidthVector<f64> = FixedWidthVector::new();
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
    }

    #[test]
    fn date_day_converts_to_naive_date() {
        let mut v: FixedWidthVector<crate::types::DateDay> = FixedWidthVector::new();
        v.allocate_new().unwrap();
        v.set_safe(0, crate::types::DateDay(0)).unwrap();
        assert_eq!(v.get_date(0).unwrap(), chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
    }
}
