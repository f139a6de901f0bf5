//! # Read-Side Container Accessors
//!
//! Accessors locate child values through a container's footer without
//! decoding siblings. Arrays resolve an index by direct arithmetic over the
//! fixed entry stride; objects binary-search the sorted property-id column.
//! Both return lightweight `Copy` views borrowing the document buffer, so
//! descending into nested containers costs nothing beyond the footer probe.
//!
//! Absence is not an error at this layer: [`ObjectAccessor::find`] and
//! [`ArrayAccessor::entry`] return `Ok(None)` for a missing id or
//! out-of-range index. The typed `read_*` convenience methods turn absence
//! and type mismatches into descriptive errors.

use eyre::{ensure, eyre, Result};

use crate::cursor::ByteReader;
use crate::document::types::{IntWidth, ValueType};
use crate::encoding::varint::{read_var_i32, read_var_i64, read_var_u32};

/// A located child value: absolute position of its bytes (for containers, of
/// its footer) and its type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub position: usize,
    pub value_type: ValueType,
}

fn resolve_position(footer: usize, back_offset: u32) -> Result<usize> {
    footer.checked_sub(back_offset as usize).ok_or_else(|| {
        eyre!(
            "entry offset {} reaches before the buffer start (footer at {})",
            back_offset,
            footer
        )
    })
}

pub(crate) mod scalar {
    //! Typed scalar decoding shared by accessors and root reads.

    use super::*;

    fn cursor_at(data: &[u8], entry: Entry, expected: ValueType) -> Result<ByteReader<'_>> {
        ensure!(
            entry.value_type == expected,
            "type mismatch: stored value is {:?}, requested {:?}",
            entry.value_type,
            expected
        );
        let mut reader = ByteReader::new(data);
        reader.seek(entry.position);
        Ok(reader)
    }

    pub fn read_bool(data: &[u8], entry: Entry) -> Result<bool> {
        cursor_at(data, entry, ValueType::Boolean)?.read_bool()
    }

    pub fn read_byte(data: &[u8], entry: Entry) -> Result<u8> {
        cursor_at(data, entry, ValueType::Byte)?.read_u8()
    }

    pub fn read_short(data: &[u8], entry: Entry) -> Result<i16> {
        cursor_at(data, entry, ValueType::Short)?.read_i16()
    }

    pub fn read_int(data: &[u8], entry: Entry) -> Result<i32> {
        read_var_i32(&mut cursor_at(data, entry, ValueType::Int)?)
    }

    pub fn read_long(data: &[u8], entry: Entry) -> Result<i64> {
        read_var_i64(&mut cursor_at(data, entry, ValueType::Long)?)
    }

    pub fn read_float(data: &[u8], entry: Entry) -> Result<f32> {
        cursor_at(data, entry, ValueType::Float)?.read_f32()
    }

    pub fn read_double(data: &[u8], entry: Entry) -> Result<f64> {
        cursor_at(data, entry, ValueType::Double)?.read_f64()
    }

    pub fn read_str<'a>(data: &'a [u8], entry: Entry) -> Result<&'a str> {
        let mut reader = cursor_at(data, entry, ValueType::String)?;
        let len = read_var_u32(&mut reader)? as usize;
        let bytes = reader.read_bytes(len)?;
        std::str::from_utf8(bytes).map_err(|e| eyre!("invalid UTF-8 in string value: {}", e))
    }

    pub fn read_blob<'a>(data: &'a [u8], entry: Entry) -> Result<&'a [u8]> {
        let mut reader = cursor_at(data, entry, ValueType::Blob)?;
        let len = read_var_u32(&mut reader)? as usize;
        reader.read_bytes(len)
    }
}

/// Zero-copy view of an object container, addressed by property id.
#[derive(Debug, Clone, Copy)]
pub struct ObjectAccessor<'a> {
    data: &'a [u8],
    footer: usize,
}

struct ObjectHeader {
    offset_width: IntWidth,
    id_width: IntWidth,
    count: usize,
}

impl<'a> ObjectAccessor<'a> {
    pub(crate) fn new(data: &'a [u8], footer: usize) -> Self {
        Self { data, footer }
    }

    fn header(&self) -> Result<ObjectHeader> {
        let mut reader = ByteReader::new(self.data);
        reader.seek(self.footer);
        let offset_width = IntWidth::from_tag(reader.read_u8()?)?;
        let id_width = IntWidth::from_tag(reader.read_u8()?)?;
        let count = reader.read_u32()? as usize;
        Ok(ObjectHeader {
            offset_width,
            id_width,
            count,
        })
    }

    /// Byte position of entry slot `index` inside the footer.
    fn slot_position(&self, header: &ObjectHeader, index: usize) -> usize {
        self.footer
            + 1
            + 1
            + 4
            + index * (header.offset_width.size() + header.id_width.size() + 1)
    }

    pub fn entry_count(&self) -> Result<usize> {
        Ok(self.header()?.count)
    }

    /// Binary search the sorted id column for `property_id`.
    pub fn find(&self, property_id: u32) -> Result<Option<Entry>> {
        let header = self.header()?;
        if header.count == 0 {
            return Ok(None);
        }

        let mut low = 0isize;
        let mut high = header.count as isize - 1;

        while low <= high {
            let mid = ((low + high) / 2) as usize;

            let mut reader = ByteReader::new(self.data);
            reader.seek(self.slot_position(&header, mid));
            let back_offset = header.offset_width.read(&mut reader)?;
            let candidate = header.id_width.read(&mut reader)?;

            if candidate == property_id {
                let value_type = ValueType::from_tag(reader.read_u8()?)?;
                return Ok(Some(Entry {
                    position: resolve_position(self.footer, back_offset)?,
                    value_type,
                }));
            }
            if candidate < property_id {
                low = mid as isize + 1;
            } else {
                high = mid as isize - 1;
            }
        }
        Ok(None)
    }

    /// Entry at footer slot `index`, in sorted-id order. Used for
    /// enumeration; lookups by id go through [`Self::find`].
    pub fn entry_at(&self, index: usize) -> Result<Entry> {
        let header = self.header()?;
        ensure!(
            index < header.count,
            "entry index {} out of range for object with {} entries",
            index,
            header.count
        );
        let mut reader = ByteReader::new(self.data);
        reader.seek(self.slot_position(&header, index));
        let back_offset = header.offset_width.read(&mut reader)?;
        reader.seek(reader.position() + header.id_width.size());
        let value_type = ValueType::from_tag(reader.read_u8()?)?;
        Ok(Entry {
            position: resolve_position(self.footer, back_offset)?,
            value_type,
        })
    }

    /// Property id stored at footer slot `index`, in sorted order.
    pub fn property_id_at(&self, index: usize) -> Result<u32> {
        let header = self.header()?;
        ensure!(
            index < header.count,
            "entry index {} out of range for object with {} entries",
            index,
            header.count
        );
        let mut reader = ByteReader::new(self.data);
        reader.seek(self.slot_position(&header, index) + header.offset_width.size());
        header.id_width.read(&mut reader)
    }

    fn require(&self, property_id: u32) -> Result<Entry> {
        self.find(property_id)?
            .ok_or_else(|| eyre!("property id {} not found in object", property_id))
    }

    pub fn value_type(&self, property_id: u32) -> Result<ValueType> {
        Ok(self.require(property_id)?.value_type)
    }

    pub fn is_null(&self, property_id: u32) -> Result<bool> {
        Ok(self.require(property_id)?.value_type == ValueType::Null)
    }

    pub fn read_bool(&self, property_id: u32) -> Result<bool> {
        scalar::read_bool(self.data, self.require(property_id)?)
    }

    pub fn read_byte(&self, property_id: u32) -> Result<u8> {
        scalar::read_byte(self.data, self.require(property_id)?)
    }

    pub fn read_short(&self, property_id: u32) -> Result<i16> {
        scalar::read_short(self.data, self.require(property_id)?)
    }

    pub fn read_int(&self, property_id: u32) -> Result<i32> {
        scalar::read_int(self.data, self.require(property_id)?)
    }

    pub fn read_long(&self, property_id: u32) -> Result<i64> {
        scalar::read_long(self.data, self.require(property_id)?)
    }

    pub fn read_float(&self, property_id: u32) -> Result<f32> {
        scalar::read_float(self.data, self.require(property_id)?)
    }

    pub fn read_double(&self, property_id: u32) -> Result<f64> {
        scalar::read_double(self.data, self.require(property_id)?)
    }

    pub fn read_str(&self, property_id: u32) -> Result<&'a str> {
        scalar::read_str(self.data, self.require(property_id)?)
    }

    pub fn read_blob(&self, property_id: u32) -> Result<&'a [u8]> {
        scalar::read_blob(self.data, self.require(property_id)?)
    }

    pub fn read_object(&self, property_id: u32) -> Result<ObjectAccessor<'a>> {
        let entry = self.require(property_id)?;
        ensure!(
            entry.value_type == ValueType::Object,
            "property id {} is {:?}, not an object",
            property_id,
            entry.value_type
        );
        Ok(ObjectAccessor::new(self.data, entry.position))
    }

    pub fn read_array(&self, property_id: u32) -> Result<ArrayAccessor<'a>> {
        let entry = self.require(property_id)?;
        ensure!(
            entry.value_type == ValueType::Array,
            "property id {} is {:?}, not an array",
            property_id,
            entry.value_type
        );
        Ok(ArrayAccessor::new(self.data, entry.position))
    }
}

/// Zero-copy view of an array container, addressed by element index.
#[derive(Debug, Clone, Copy)]
pub struct ArrayAccessor<'a> {
    data: &'a [u8],
    footer: usize,
}

impl<'a> ArrayAccessor<'a> {
    pub(crate) fn new(data: &'a [u8], footer: usize) -> Self {
        Self { data, footer }
    }

    fn header(&self) -> Result<(IntWidth, usize)> {
        let mut reader = ByteReader::new(self.data);
        reader.seek(self.footer);
        let offset_width = IntWidth::from_tag(reader.read_u8()?)?;
        let count = reader.read_u32()? as usize;
        Ok((offset_width, count))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.header()?.1)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Locate element `index` by direct slot arithmetic; no search.
    pub fn entry(&self, index: usize) -> Result<Option<Entry>> {
        let (offset_width, count) = self.header()?;
        if index >= count {
            return Ok(None);
        }

        let slot = self.footer + 1 + 4 + index * (offset_width.size() + 1);
        let mut reader = ByteReader::new(self.data);
        reader.seek(slot);
        let back_offset = offset_width.read(&mut reader)?;
        let value_type = ValueType::from_tag(reader.read_u8()?)?;
        Ok(Some(Entry {
            position: resolve_position(self.footer, back_offset)?,
            value_type,
        }))
    }

    pub(crate) fn require(&self, index: usize) -> Result<Entry> {
        self.entry(index)?
            .ok_or_else(|| eyre!("index {} out of range for array", index))
    }

    pub fn value_type(&self, index: usize) -> Result<ValueType> {
        Ok(self.require(index)?.value_type)
    }

    pub fn is_null(&self, index: usize) -> Result<bool> {
        Ok(self.require(index)?.value_type == ValueType::Null)
    }

    pub fn read_bool(&self, index: usize) -> Result<bool> {
        scalar::read_bool(self.data, self.require(index)?)
    }

    pub fn read_byte(&self, index: usize) -> Result<u8> {
        scalar::read_byte(self.data, self.require(index)?)
    }

    pub fn read_short(&self, index: usize) -> Result<i16> {
        scalar::read_short(self.data, self.require(index)?)
    }

    pub fn read_int(&self, index: usize) -> Result<i32> {
        scalar::read_int(self.data, self.require(index)?)
    }

    pub fn read_long(&self, index: usize) -> Result<i64> {
        scalar::read_long(self.data, self.require(index)?)
    }

    pub fn read_float(&self, index: usize) -> Result<f32> {
        scalar::read_float(self.data, self.require(index)?)
    }

    pub fn read_double(&self, index: usize) -> Result<f64> {
        scalar::read_double(self.data, self.require(index)?)
    }

    pub fn read_str(&self, index: usize) -> Result<&'a str> {
        scalar::read_str(self.data, self.require(index)?)
    }

    pub fn read_blob(&self, index: usize) -> Result<&'a [u8]> {
        scalar::read_blob(self.data, self.require(index)?)
    }

    pub fn read_object(&self, index: usize) -> Result<ObjectAccessor<'a>> {
        let entry = self.require(index)?;
        ensure!(
            entry.value_type == ValueType::Object,
            "array element {} is {:?}, not an object",
            index,
            entry.value_type
        );
        Ok(ObjectAccessor::new(self.data, entry.position))
    }

    pub fn read_array(&self, index: usize) -> Result<ArrayAccessor<'a>> {
        let entry = self.require(index)?;
        ensure!(
            entry.value_type == ValueType::Array,
            "array element {} is {:?}, not an array",
            index,
            entry.value_type
        );
        Ok(ArrayAccessor::new(self.data, entry.position))
    }
}
