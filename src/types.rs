//! Scalar type roster: the minor-type tag, the `ScalarType` read/write shim
//! every typed façade is generic over, and the small accessor surface every
//! façade exposes.

/// Minor-type tag. Stands in for the externally-specified `FieldType`'s
/// type descriptor (immutable per vector).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinorType {
    Bit,
    TinyInt,
    UInt1,
    SmallInt,
    UInt2,
    Int,
    UInt4,
    BigInt,
    UInt8,
    Float4,
    Float8,
    DateDay,
    DateMilli,
    TimeSec,
    TimeMilli,
    TimeMicro,
    TimeNano,
    TimeStampSec,
    TimeStampMilli,
    TimeStampMicro,
    TimeStampNano,
    IntervalYear,
    IntervalDay,
    /// Carries `(precision, scale)` since, unlike every other variant, a
    /// decimal's full type isn't determined by the Rust type alone.
    Decimal { precision: u8, scale: u8 },
}

/// A fixed-width scalar with a little-endian on-buffer representation.
///
/// Implemented directly by the primitive integer/float types and by the
/// calendar newtypes below; `DecimalVector` does not implement this (its
/// `(precision, scale)` is a runtime field, not a static property of the
/// Rust type) and instead reads/writes `i128` through its own path.
pub trait ScalarType: Copy + Send + Sync + 'static {
    /// Element width in bytes.
    const BYTE_WIDTH: usize;
    /// The minor-type tag for this Rust type.
    const MINOR_TYPE: MinorType;

    /// Decode from exactly `BYTE_WIDTH` little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;

    /// Encode into exactly `BYTE_WIDTH` little-endian bytes.
    fn write_le(&self, out: &mut [u8]);
}

macro_rules! impl_scalar_primitive {
    ($repr:ty, $minor:ident) => {
        impl ScalarType for $repr {
            const BYTE_WIDTH: usize = std::mem::size_of::<$repr>();
            const MINOR_TYPE: MinorType = MinorType::$minor;

            #[inline]
            fn read_le(bytes: &[u8]) -> Self {
                let mut arr = [0u8; std::mem::size_of::<$repr>()];
                arr.copy_from_slice(bytes);
                <$repr>::from_le_bytes(arr)
            }

            #[inline]
            fn write_le(&self, out: &mut [u8]) {
                out.copy_from_slice(&self.to_le_bytes());
            }
        }
    };
}

impl_scalar_primitive!(i8, TinyInt);
impl_scalar_primitive!(u8, UInt1);
impl_scalar_primitive!(i16, SmallInt);
impl_scalar_primitive!(u16, UInt2);
impl_scalar_primitive!(i32, Int);
impl_scalar_primitive!(u32, UInt4);
impl_scalar_primitive!(i64, BigInt);
impl_scalar_primitive!(u64, UInt8);
impl_scalar_primitive!(f32, Float4);
impl_scalar_primitive!(f64, Float8);

/// Generates a newtype wrapping a little-endian fixed-width integer,
/// tagged with its own `MinorType` variant. Collapses the per-calendar-type
/// boilerplate (date/time/timestamp/interval-year all share this shape,
/// a single wrapped integer with a distinct meaning, not a distinct byte
/// layout) into one macro body instead of one hand-written impl apiece.
macro_rules! impl_calendar_newtype {
    ($name:ident, $repr:ty, $minor:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub $repr);

        impl ScalarType for $name {
            const BYTE_WIDTH: usize = std::mem::size_of::<$repr>();
            const MINOR_TYPE: MinorType = MinorType::$minor;

            #[inline]
            fn read_le(bytes: &[u8]) -> Self {
                Self(<$repr as ScalarType>::read_le(bytes))
            }

            #[inline]
            fn write_le(&self, out: &mut [u8]) {
                self.0.write_le(out);
            }
        }
    };
}

impl_calendar_newtype!(DateDay, i32, DateDay, "Days since the Unix epoch.");
impl_calendar_newtype!(DateMilli, i64, DateMilli, "Milliseconds since the Unix epoch.");
impl_calendar_newtype!(TimeSec, i32, TimeSec, "Seconds since midnight.");
impl_calendar_newtype!(TimeMilli, i32, TimeMilli, "Milliseconds since midnight.");
impl_calendar_newtype!(TimeMicro, i64, TimeMicro, "Microseconds since midnight.");
impl_calendar_newtype!(TimeNano, i64, TimeNano, "Nanoseconds since midnight.");
impl_calendar_newtype!(TimeStampSec, i64, TimeStampSec, "Signed seconds since the Unix epoch.");
impl_calendar_newtype!(
    TimeStampMilli,
    i64,
    TimeStampMilli,
    "Signed milliseconds since the Unix epoch."
);
impl_calendar_newtype!(
    TimeStampMicro,
    i64,
    TimeStampMicro,
    "Signed microseconds since the Unix epoch."
);
impl_calendar_newtype!(
    TimeStampNano,
    i64,
    TimeStampNano,
    "Signed nanoseconds since the Unix epoch."
);
impl_calendar_newtype!(IntervalYear, i32, IntervalYear, "Interval expressed in whole months.");

/// `(days, milliseconds)` interval, packed little-endian as two `i32`s:
/// the one roster entry whose representation isn't a single wrapped
/// integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntervalDay {
    pub days: i32,
    pub millis: i32,
}

impl ScalarType for IntervalDay {
    const BYTE_WIDTH: usize = 8;
    const MINOR_TYPE: MinorType = MinorType::IntervalDay;

    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        let days = i32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let millis = i32::from_le_bytes(bytes[4..8].try_into().unwrap());
        Self { days, millis }
    }

    #[inline]
    fn write_le(&self, out: &mut [u8]) {
        out[0..4].copy_from_slice(&self.days.to_le_bytes());
        out[4..8].copy_from_slice(&self.millis.to_le_bytes());
    }
}

/// Minimal read-only surface every façade exposes, realizing the external
/// "Reader factory" interface point (§6: "the vector only needs to expose
/// `isSet`, `get`, `valueCount`") without building the reader itself.
pub trait VectorAccessor {
    /// `1` if element `i` is non-null, `0` otherwise (including `i >=
    /// value_count()`, which is defined as null).
    fn is_set(&self, i: usize) -> u8;

    /// Logical length.
    fn value_count(&self) -> usize;

    /// This vector's minor-type tag.
    fn minor_type(&self) -> MinorType;
}
