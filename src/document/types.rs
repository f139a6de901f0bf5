//! # Value Type Tags and Adaptive Integer Widths
//!
//! Every value entry in a container footer carries a single-byte type tag
//! identifying how its bytes are decoded. Footer offsets and property ids use
//! an adaptive fixed width chosen per container: the smallest of 1, 2, or 4
//! bytes that holds the container's maximum value. The width tag byte stores
//! the width itself, so footer strides are computable directly from the tag.

use eyre::{bail, Result};

use crate::cursor::{ByteReader, ByteWriter};

/// Value type tag stored per entry in container footers.
///
/// `#[repr(u8)]` keeps the discriminant a single footer byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Undefined = 0,
    Null = 1,
    Document = 2,
    Object = 3,
    Array = 4,

    Boolean = 5,
    String = 6,
    Blob = 7,

    Byte = 8,
    Short = 9,
    Int = 10,
    Long = 11,

    Float = 12,
    Double = 13,
}

impl ValueType {
    pub fn from_tag(tag: u8) -> Result<Self> {
        Ok(match tag {
            0 => ValueType::Undefined,
            1 => ValueType::Null,
            2 => ValueType::Document,
            3 => ValueType::Object,
            4 => ValueType::Array,
            5 => ValueType::Boolean,
            6 => ValueType::String,
            7 => ValueType::Blob,
            8 => ValueType::Byte,
            9 => ValueType::Short,
            10 => ValueType::Int,
            11 => ValueType::Long,
            12 => ValueType::Float,
            13 => ValueType::Double,
            _ => bail!("unknown value type tag: {}", tag),
        })
    }

    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Containers own child entries and have their own footer; everything
    /// else is a scalar.
    #[inline]
    pub fn is_container(self) -> bool {
        matches!(
            self,
            ValueType::Document | ValueType::Object | ValueType::Array
        )
    }
}

/// Fixed integer width used for footer offsets and property ids.
///
/// The discriminant doubles as the byte width, so the width tag in a footer
/// is the stride contribution of the field it describes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    One = 1,
    Two = 2,
    Four = 4,
}

impl IntWidth {
    /// Smallest width whose range covers `max`.
    pub fn for_max(max: u32) -> Self {
        if max < u8::MAX as u32 {
            IntWidth::One
        } else if max < i16::MAX as u32 {
            IntWidth::Two
        } else {
            IntWidth::Four
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self> {
        Ok(match tag {
            1 => IntWidth::One,
            2 => IntWidth::Two,
            4 => IntWidth::Four,
            _ => bail!("unknown integer width tag: {}", tag),
        })
    }

    #[inline]
    pub fn size(self) -> usize {
        self as usize
    }

    pub fn read(self, reader: &mut ByteReader) -> Result<u32> {
        Ok(match self {
            IntWidth::One => reader.read_u8()? as u32,
            IntWidth::Two => reader.read_u16()? as u32,
            IntWidth::Four => reader.read_u32()?,
        })
    }

    pub fn write(self, writer: &mut ByteWriter, value: u32) -> Result<()> {
        match self {
            IntWidth::One => writer.write_u8(value as u8),
            IntWidth::Two => writer.write_u16(value as u16),
            IntWidth::Four => writer.write_u32(value),
        }
    }
}
