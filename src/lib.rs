//! Fixed-width nullable columnar vectors.
//!
//! The data-plane core of an in-memory tabular library: a shared base
//! container (validity bitmap + value buffer, allocation, growth,
//! transfer, split), and one typed façade per scalar width. Higher layers
//! (schemas, record batches, readers/writers, wire formats) are built on
//! top of these containers; this crate stops at the container boundary.
//!
//! Start with [`vector::FixedWidthVector`] for the primitive/calendar
//! roster, [`bit::BitVector`] for booleans, and [`decimal::DecimalVector`]
//! for fixed-precision decimals.

pub mod base;
pub mod bit;
pub mod bitmap;
pub mod buffer;
pub mod decimal;
pub mod errors;
pub mod holder;
pub mod transfer;
pub mod types;
pub mod vector;

pub use buffer::{Allocator, ByteBuffer};
pub use errors::{Error, Result};
pub use holder::Holder;
pub use transfer::{Transferable, TransferPair};
pub use types::{MinorType, ScalarType, VectorAccessor};
