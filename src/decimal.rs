//! `Decimal` façade: 16-byte two's-complement significand plus a
//! `(precision, scale)` pair that, unlike every other roster entry, lives
//! on the value at runtime rather than being baked into a Rust
//! type. That's why `DecimalVector` is hand-written here instead of being
//! another `FixedWidthVector<T>` instantiation: `transferTo`/`copyFrom`
//! between two decimal vectors can fail at runtime with `TypeMismatch`
//! even though the Rust types line up.

use std::sync::Arc;

use crate::base::FixedWidthBase;
use crate::buffer::{Allocator, ByteBuffer, SystemAllocator};
use crate::errors::{Error, Result};
use crate::types::{MinorType, VectorAccessor};

const BYTE_WIDTH: usize = 16;

/// A decoded decimal value: unscaled significand plus the scale it was
/// read at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimal128 {
    pub unscaled: i128,
    pub scale: i8,
}

fn precision_bound(precision: u8) -> i128 {
    10i128.pow(u32::from(precision))
}

fn validate_precision_scale(precision: u8, scale: u8) -> Result<()> {
    if !(1..=38).contains(&precision) {
        return Err(Error::InvalidArgument(format!("precision {precision} out of range [1, 38]")));
    }
    if scale > precision {
        return Err(Error::InvalidArgument(format!(
            "scale {scale} exceeds precision {precision}"
        )));
    }
    Ok(())
}

/// A fixed-width nullable column of 16-byte decimals at a fixed
/// `(precision, scale)`.
pub struct DecimalVector {
    base: FixedWidthBase,
    precision: u8,
    scale: u8,
}

impl DecimalVector {
    /// # Errors
    /// [`Error::InvalidArgument`] if `precision` is outside `[1, 38]` or
    /// `scale > precision`.
    pub fn new(precision: u8, scale: u8) -> Result<Self> {
        Self::with_allocator(precision, scale, Arc::new(SystemAllocator))
    }

    /// # Errors
    /// As [`Self::new`].
    pub fn with_allocator(precision: u8, scale: u8, allocator: Arc<dyn Allocator>) -> Result<Self> {
        validate_precision_scale(precision, scale)?;
        Ok(Self {
            base: FixedWidthBase::with_allocator(BYTE_WIDTH * 8, allocator),
            precision,
            scale,
        })
    }

    #[must_use]
    pub fn precision(&self) -> u8 {
        self.precision
    }

    #[must_use]
    pub fn scale(&self) -> u8 {
        self.scale
    }

    fn check_same_params(&self, other_precision: u8, other_scale: u8) -> Result<()> {
        if self.precision != other_precision || self.scale != other_scale {
            return Err(Error::TypeMismatch {
                expected: format!("Decimal({}, {})", self.precision, self.scale),
                found: format!("Decimal({other_precision}, {other_scale})"),
            });
        }
        Ok(())
    }

    fn validate_unscaled(&self, unscaled: i128) -> Result<()> {
        let bound = precision_bound(self.precision);
        if unscaled >= bound || unscaled <= -bound {
            return Err(Error::InvalidArgument(format!(
                "unscaled value {unscaled} exceeds 10^{} for precision {}",
                self.precision, self.precision
            )));
        }
        Ok(())
    }

    /// # Errors
    /// [`Error::OversizedAllocation`].
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
    /// Propagates growth failures.
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
    pub fn get(&self, i: usize) -> Result<Decimal128> {
        if self.base.bit_set(i) != 1 {
            return Err(Error::NullValue(i));
        }
        let bytes = self.base.values().get_bytes(i * BYTE_WIDTH, BYTE_WIDTH);
        let unscaled = i128::from_le_bytes(bytes.try_into().unwrap());
        Ok(Decimal128 { unscaled, scale: self.scale as i8 })
    }

    #[must_use]
    pub fn get_object(&self, i: usize) -> Option<Decimal128> {
        self.get(i).ok()
    }

    /// Zero-copy view of the raw 16-byte significand. Never allocates,
    /// unlike [`Self::get`]'s decoded `Decimal128`.
    ///
    /// # Errors
    /// [`Error::NullValue`] if element `i` is null.
    pub fn get_bytes(&self, i: usize) -> Result<&[u8]> {
        if self.base.bit_set(i) != 1 {
            return Err(Error::NullValue(i));
        }
        Ok(self.base.values().get_bytes(i * BYTE_WIDTH, BYTE_WIDTH))
    }

    fn write_unchecked(&mut self, i: usize, unscaled: i128) {
        self.base.validity_mut().with_mut(|buf| crate::bitmap::set_bit_to_one(buf, i));
        self.base.values_mut().write_bytes(i * BYTE_WIDTH, &unscaled.to_le_bytes());
    }

    /// `unscaled` is the significand already expressed at this vector's
    /// configured `scale` (e.g. `1234.56` at `scale == 2` is `123456`).
    ///
    /// # Errors
    /// [`Error::IndexOutOfBounds`] if `i >= capacity()`;
    /// [`Error::InvalidArgument`] if `|unscaled| >= 10^precision`.
    pub fn set(&mut self, i: usize, unscaled: i128) -> Result<()> {
        self.validate_unscaled(unscaled)?;
        if i >= self.base.capacity() {
            return Err(Error::IndexOutOfBounds { index: i, capacity: self.base.capacity() });
        }
        self.write_unchecked(i, unscaled);
        Ok(())
    }

    /// # Errors
    /// [`Error::InvalidArgument`] if `|unscaled| >= 10^precision`;
    /// otherwise propagates growth failures.
    pub fn set_safe(&mut self, i: usize, unscaled: i128) -> Result<()> {
        self.validate_unscaled(unscaled)?;
        self.base.handle_safe(i)?;
        self.write_unchecked(i, unscaled);
        Ok(())
    }

    /// # Errors
    /// Propagates growth failures.
    pub fn set_null(&mut self, i: usize) -> Result<()> {
        self.base.handle_safe(i)?;
        self.base.validity_mut().with_mut(|buf| crate::bitmap::set_bit(buf, i, 0));
        Ok(())
    }

    /// # Errors
    /// [`Error::TypeMismatch`] if `target`'s `(precision, scale)` differs.
    pub fn transfer_to(&mut self, target: &mut Self) -> Result<()> {
        self.check_same_params(target.precision, target.scale)?;
        self.base.transfer_to(&mut target.base);
        Ok(())
    }

    /// # Errors
    /// [`Error::TypeMismatch`] if `target`'s `(precision, scale)` differs;
    /// [`Error::IndexOutOfBounds`] if the range exceeds `value_count()`.
    pub fn split_and_transfer_to(&self, start: usize, length: usize, target: &mut Self) -> Result<()> {
        self.check_same_params(target.precision, target.scale)?;
        self.base.split_and_transfer_to(start, length, &mut target.base)
    }

    /// # Errors
    /// [`Error::TypeMismatch`] if `dst`'s `(precision, scale)` differs.
    pub fn copy_from(&self, j: usize, dst: &mut Self, i: usize) -> Result<()> {
        self.check_same_params(dst.precision, dst.scale)?;
        self.base.copy_from(j, &mut dst.base, i);
        Ok(())
    }

    /// # Errors
    /// [`Error::TypeMismatch`] if `dst`'s `(precision, scale)` differs;
    /// otherwise propagates growth failures on `dst`.
    pub fn copy_from_safe(&self, j: usize, dst: &mut Self, i: usize) -> Result<()> {
        self.check_same_params(dst.precision, dst.scale)?;
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

impl VectorAccessor for DecimalVector {
    fn is_set(&self, i: usize) -> u8 {
        self.base.is_set(i)
    }

    fn value_count(&self) -> usize {
        self.base.value_count()
    }

    fn minor_type(&self) -> MinorType {
        MinorType::Decimal { precision: self.precision, scale: self.scale }
    }
}
