//! # Document Reader
//!
//! Trailer-first discovery and random access into a finished document
//! buffer. The last 16 bytes of every document are a fixed trailer; a reader
//! starts there, locates the root container's footer and the embedded name
//! table, and then navigates the tree through the container accessors
//! without decoding anything it is not asked for.
//!
//! ## Trailer Layout
//!
//! ```text
//! +--------------------------+---------------------------+-----------+----------------+
//! | root_back_offset (u32)   | name_table_back_offset    | root_type | property_count |
//! |                          | (u32, 0 = external schema)| (u32)     | (u32)          |
//! +--------------------------+---------------------------+-----------+----------------+
//! ```
//!
//! Both back offsets are measured backward from the trailer's own start. All
//! fields are little-endian via zerocopy wrapper types.
//!
//! Opening a buffer validates the trailer eagerly: short buffers, offsets
//! pointing outside the buffer, and unknown root types are rejected up front
//! rather than surfacing as corrupt reads later.
//!
//! ## Concurrency
//!
//! A `DocumentReader` and every accessor derived from it borrow the buffer
//! immutably; any number of independent readers may work over one finished
//! buffer. A single reader's name cache is not synchronized, so give each
//! thread its own reader.

use eyre::{bail, ensure, eyre, Result};
use smallvec::SmallVec;
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::document::accessor::{scalar, ArrayAccessor, Entry, ObjectAccessor};
use crate::document::names::{PropertyNameReader, PropertySchema};
use crate::document::types::ValueType;

pub const TRAILER_SIZE: usize = 16;

/// Fixed-size document trailer; the first thing a reader locates.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct Trailer {
    root_back_offset: U32,
    name_table_back_offset: U32,
    root_type: U32,
    property_count: U32,
}

const _: () = assert!(std::mem::size_of::<Trailer>() == TRAILER_SIZE);

impl Trailer {
    pub(crate) fn new(
        root_back_offset: u32,
        name_table_back_offset: u32,
        root_type: ValueType,
        property_count: u32,
    ) -> Self {
        Self {
            root_back_offset: U32::new(root_back_offset),
            name_table_back_offset: U32::new(name_table_back_offset),
            root_type: U32::new(root_type.tag() as u32),
            property_count: U32::new(property_count),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        ensure!(
            bytes.len() >= TRAILER_SIZE,
            "buffer too small for document trailer: {} < {}",
            bytes.len(),
            TRAILER_SIZE
        );
        Self::ref_from_bytes(&bytes[..TRAILER_SIZE])
            .map_err(|e| eyre!("failed to parse document trailer: {:?}", e))
    }

    pub fn root_back_offset(&self) -> u32 {
        self.root_back_offset.get()
    }

    pub fn name_table_back_offset(&self) -> u32 {
        self.name_table_back_offset.get()
    }

    pub fn property_count(&self) -> u32 {
        self.property_count.get()
    }

    pub fn root_type(&self) -> Result<ValueType> {
        let tag = self.root_type.get();
        ensure!(tag <= u8::MAX as u32, "root type tag {} out of range", tag);
        ValueType::from_tag(tag as u8)
    }
}

/// Random-access view of one finished document buffer.
pub struct DocumentReader<'a> {
    data: &'a [u8],
    root: Entry,
    names: PropertyNameReader<'a>,
    property_count: u32,
}

impl<'a> DocumentReader<'a> {
    /// Open a document, resolving names from its embedded table.
    pub fn open(data: &'a [u8]) -> Result<Self> {
        let (root, trailer_position, trailer) = Self::parse_trailer(data)?;

        let names = match trailer.name_table_back_offset() {
            0 => PropertyNameReader::without_table(data),
            back => {
                let back = back as usize;
                ensure!(
                    back <= trailer_position,
                    "name table offset {} reaches before the buffer start",
                    back
                );
                PropertyNameReader::embedded(
                    data,
                    trailer_position - back,
                    trailer.property_count() as usize,
                )
            }
        };

        Ok(Self {
            data,
            root,
            names,
            property_count: trailer.property_count(),
        })
    }

    /// Open a document whose name table was supplied externally; no table
    /// bytes are read from the buffer.
    pub fn open_with_schema(data: &'a [u8], schema: &'a PropertySchema) -> Result<Self> {
        let (root, _, trailer) = Self::parse_trailer(data)?;
        Ok(Self {
            data,
            root,
            names: PropertyNameReader::from_schema(data, schema),
            property_count: trailer.property_count(),
        })
    }

    fn parse_trailer(data: &'a [u8]) -> Result<(Entry, usize, &'a Trailer)> {
        ensure!(
            data.len() >= TRAILER_SIZE,
            "buffer of {} bytes is too short for a document",
            data.len()
        );
        let trailer_position = data.len() - TRAILER_SIZE;
        let trailer = Trailer::from_bytes(&data[trailer_position..])?;

        let root_type = trailer.root_type()?;
        ensure!(
            root_type != ValueType::Undefined && root_type != ValueType::Document,
            "invalid document root type {:?}",
            root_type
        );

        let back = trailer.root_back_offset() as usize;
        // a Null root owns no value bytes, so its offset may legitimately be 0
        ensure!(
            back <= trailer_position && (back > 0 || root_type == ValueType::Null),
            "root offset {} out of range for trailer at {}",
            back,
            trailer_position
        );

        Ok((
            Entry {
                position: trailer_position - back,
                value_type: root_type,
            },
            trailer_position,
            trailer,
        ))
    }

    pub fn root_type(&self) -> ValueType {
        self.root.value_type
    }

    /// Number of property names the document was written with.
    pub fn property_count(&self) -> usize {
        self.property_count as usize
    }

    pub fn root_object(&self) -> Result<ObjectAccessor<'a>> {
        ensure!(
            self.root.value_type == ValueType::Object,
            "document root is {:?}, not an object",
            self.root.value_type
        );
        Ok(ObjectAccessor::new(self.data, self.root.position))
    }

    pub fn root_array(&self) -> Result<ArrayAccessor<'a>> {
        ensure!(
            self.root.value_type == ValueType::Array,
            "document root is {:?}, not an array",
            self.root.value_type
        );
        Ok(ArrayAccessor::new(self.data, self.root.position))
    }

    pub fn root_is_null(&self) -> bool {
        self.root.value_type == ValueType::Null
    }

    pub fn root_bool(&self) -> Result<bool> {
        scalar::read_bool(self.data, self.root)
    }

    pub fn root_byte(&self) -> Result<u8> {
        scalar::read_byte(self.data, self.root)
    }

    pub fn root_short(&self) -> Result<i16> {
        scalar::read_short(self.data, self.root)
    }

    pub fn root_int(&self) -> Result<i32> {
        scalar::read_int(self.data, self.root)
    }

    pub fn root_long(&self) -> Result<i64> {
        scalar::read_long(self.data, self.root)
    }

    pub fn root_float(&self) -> Result<f32> {
        scalar::read_float(self.data, self.root)
    }

    pub fn root_double(&self) -> Result<f64> {
        scalar::read_double(self.data, self.root)
    }

    pub fn root_str(&self) -> Result<&'a str> {
        scalar::read_str(self.data, self.root)
    }

    pub fn root_blob(&self) -> Result<&'a [u8]> {
        scalar::read_blob(self.data, self.root)
    }

    /// Resolve a property name to its id, caching the association.
    pub fn property_id(&mut self, name: &str) -> Result<u32> {
        self.names.property_id(name)
    }

    /// Resolve a property id to its name, caching the association.
    pub fn property_name(&mut self, id: u32) -> Result<&'a str> {
        self.names.property_name(id)
    }

    /// Stack-tracked navigation cursor rooted at the document's root
    /// container.
    pub fn cursor(&self) -> Result<TreeCursor<'a>> {
        TreeCursor::new(self.data, self.root)
    }

    pub(crate) fn data(&self) -> &'a [u8] {
        self.data
    }

    pub(crate) fn root_entry(&self) -> Entry {
        self.root
    }

    pub(crate) fn name_reader(&self) -> PropertyNameReader<'a> {
        self.names.clone()
    }
}

/// Explicit descend/ascend navigation over a document's container tree.
///
/// The cursor keeps a stack of `(footer position, container type)` pairs;
/// `descend_*` pushes the current container and moves into a child,
/// `ascend` pops back to the parent.
pub struct TreeCursor<'a> {
    data: &'a [u8],
    stack: SmallVec<[Entry; 8]>,
    current: Entry,
}

impl<'a> TreeCursor<'a> {
    fn new(data: &'a [u8], root: Entry) -> Result<Self> {
        ensure!(
            root.value_type == ValueType::Object || root.value_type == ValueType::Array,
            "cannot navigate a document with scalar root {:?}",
            root.value_type
        );
        Ok(Self {
            data,
            stack: SmallVec::new(),
            current: root,
        })
    }

    pub fn container_type(&self) -> ValueType {
        self.current.value_type
    }

    /// Nesting depth below the root container.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn as_object(&self) -> Result<ObjectAccessor<'a>> {
        ensure!(
            self.current.value_type == ValueType::Object,
            "current container is {:?}, not an object",
            self.current.value_type
        );
        Ok(ObjectAccessor::new(self.data, self.current.position))
    }

    pub fn as_array(&self) -> Result<ArrayAccessor<'a>> {
        ensure!(
            self.current.value_type == ValueType::Array,
            "current container is {:?}, not an array",
            self.current.value_type
        );
        Ok(ArrayAccessor::new(self.data, self.current.position))
    }

    /// Move into the container stored under `property_id` in the current
    /// object.
    pub fn descend_property(&mut self, property_id: u32) -> Result<()> {
        let object = self.as_object()?;
        let entry = object
            .find(property_id)?
            .ok_or_else(|| eyre!("property id {} not found in object", property_id))?;
        self.enter(entry)
    }

    /// Move into the container at `index` in the current array.
    pub fn descend_index(&mut self, index: usize) -> Result<()> {
        let array = self.as_array()?;
        let entry = array
            .entry(index)?
            .ok_or_else(|| eyre!("index {} out of range for array", index))?;
        self.enter(entry)
    }

    fn enter(&mut self, entry: Entry) -> Result<()> {
        match entry.value_type {
            ValueType::Object | ValueType::Array => {
                self.stack.push(self.current);
                self.current = entry;
                Ok(())
            }
            other => bail!("cannot descend into {:?} value", other),
        }
    }

    /// Return to the parent container.
    pub fn ascend(&mut self) -> Result<()> {
        self.current = self
            .stack
            .pop()
            .ok_or_else(|| eyre!("cannot ascend above the document root"))?;
        Ok(())
    }
}
