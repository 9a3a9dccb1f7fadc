//! `Bit` façade: W=1, value buffer packed identically to the validity
//! bitmap. Kept separate from [`crate::vector::FixedWidthVector`] because
//! its element access is bit-level, not byte-level, and sharing one generic
//! body across both packing rules would need a `bytemuck::Pod`-shaped
//! escape hatch for the one type that isn't byte-aligned.

use std::sync::Arc;

use crate::base::FixedWidthBase;
use crate::bitmap;
use crate::buffer::{Allocator, ByteBuffer, SystemAllocator};
use crate::errors::{Error, Result};
use crate::holder::Holder;
use crate::types::{MinorType, VectorAccessor};

/// A nullable column of booleans, one bit per value.
pub struct BitVector {
    base: FixedWidthBase,
}

impl BitVector {
    #[must_use]
    pub fn new() -> Self {
        Self::with_allocator(Arc::new(SystemAllocator))
    }

    #[must_use]
    pub fn with_allocator(allocator: Arc<dyn Allocator>) -> Self {
        Self { base: FixedWidthBase::with_allocator(1, allocator) }
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
    pub fn get(&self, i: usize) -> Result<bool> {
        if self.base.bit_set(i) != 1 {
            return Err(Error::NullValue(i));
        }
        Ok(bitmap::get_bit(self.base.values().as_slice(), i) == 1)
    }

    #[must_use]
    pub fn get_object(&self, i: usize) -> Option<bool> {
        if self.base.bit_set(i) == 1 {
            Some(bitmap::get_bit(self.base.values().as_slice(), i) == 1)
        } else {
            None
        }
    }

    fn write_unchecked(&mut self, i: usize, v: bool) {
        self.base.validity_mut().with_mut(|buf| bitmap::set_bit_to_one(buf, i));
        self.base.values_mut().with_mut(|buf| bitmap::set_bit(buf, i, u8::from(v)));
    }

    /// # Errors
    /// [`Error::IndexOutOfBounds`] if `i >= capacity()`.
    pub fn set(&mut self, i: usize, v: bool) -> Result<()> {
        if i >= self.base.capacity() {
            return Err(Error::IndexOutOfBounds { index: i, capacity: self.base.capacity() });
        }
        self.write_unchecked(i, v);
        Ok(())
    }

    /// # Errors
    /// Propagates growth failures.
    pub fn set_safe(&mut self, i: usize, v: bool) -> Result<()> {
        self.base.handle_safe(i)?;
        self.write_unchecked(i, v);
        Ok(())
    }

    /// # Errors
    /// Propagates growth failures.
    pub fn set_null(&mut self, i: usize) -> Result<()> {
        self.base.handle_safe(i)?;
        self.base.validity_mut().with_mut(|buf| bitmap::set_bit(buf, i, 0));
        Ok(())
    }

    /// # Errors
    /// [`Error::InvalidArgument`] if `h.is_set < 0`; otherwise propagates
    /// growth failures.
    pub fn set_holder(&mut self, i: usize, h: Holder<bool>) -> Result<()> {
        if h.is_set < 0 {
            return Err(Error::InvalidArgument(format!("holder.is_set must be >= 0, got {}", h.is_set)));
        }
        self.base.handle_safe(i)?;
        if h.is_set > 0 {
            self.write_unchecked(i, h.value);
        } else {
            self.base.validity_mut().with_mut(|buf| bitmap::set_bit(buf, i, 0));
        }
        Ok(())
    }

    pub fn get_holder(&self, i: usize, h: &mut Holder<bool>) {
        if self.base.bit_set(i) == 1 {
            h.is_set = 1;
            h.value = bitmap::get_bit(self.base.values().as_slice(), i) == 1;
        } else {
            h.is_set = 0;
        }
    }

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

impl Default for BitVector {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorAccessor for BitVector {
    fn is_set(&self, i: usize) -> u8 {
        self.base.is_set(i)
    }

    fn value_count(&self) -> usize {
        self.base.value_count()
    }

    fn minor_type(&self) -> MinorType {
        MinorType::Bit
    }
}
