//! # Document Writer
//!
//! Single-pass, depth-first document construction. A producer drives the
//! builder through start/emit/end calls; value bytes go straight through the
//! byte cursor and only each container's footer is deferred until the level
//! closes. Offsets are computed backward from every footer's start, so the
//! writer never backpatches and never needs to know the final layout in
//! advance.
//!
//! `DocumentWriter` is the reusable half: it owns the container pool and the
//! property-name table and survives across documents. `begin` borrows it
//! together with a caller-sized output buffer and returns the per-document
//! `DocumentBuilder`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut writer = DocumentWriter::new();
//! let mut buf = vec![0u8; recommended_capacity(json.len())];
//!
//! let mut doc = writer.begin(&mut buf)?;
//! doc.start_object()?;
//! doc.property_name("a")?;
//! doc.write_int(1)?;
//! doc.end_object()?;
//! let len = doc.finish()?;
//! let encoded = &buf[..len];
//! ```
//!
//! ## Failure Semantics
//!
//! Structural misuse (a value written into an object without a property
//! name, an unmatched end call, more than one root value, unclosed
//! containers at `finish`) and writes past the buffer's capacity all surface
//! as errors; the builder is not usable after one.

use eyre::{bail, ensure, Result};
use smallvec::SmallVec;
use zerocopy::IntoBytes;

use crate::cursor::ByteWriter;
use crate::document::container::Container;
use crate::document::names::{PropertyNameWriter, PropertySchema};
use crate::document::pool::ContainerPool;
use crate::document::reader::Trailer;
use crate::document::types::ValueType;
use crate::encoding::varint::{write_var_i32, write_var_i64, write_var_u32};

/// Buffer sizing heuristic: roughly 4x the source text length covers the
/// footer and name-table overhead of typical documents.
pub fn recommended_capacity(source_len: usize) -> usize {
    source_len.saturating_mul(4).max(64)
}

/// Reusable writer state: container pool plus property-name table.
pub struct DocumentWriter {
    pool: ContainerPool,
    names: PropertyNameWriter,
}

impl DocumentWriter {
    /// Writer with a self-contained name table, emitted into each document.
    pub fn new() -> Self {
        Self {
            pool: ContainerPool::default(),
            names: PropertyNameWriter::self_contained(),
        }
    }

    /// Writer with a pre-populated, closed name table; no table bytes are
    /// emitted and unknown property names are rejected.
    pub fn with_schema(schema: &PropertySchema) -> Self {
        Self {
            pool: ContainerPool::default(),
            names: PropertyNameWriter::pre_populated(schema),
        }
    }

    /// Replaces the private container pool, typically with one shared by
    /// several writers.
    pub fn with_pool(mut self, pool: ContainerPool) -> Self {
        self.pool = pool;
        self
    }

    /// Snapshot of the name table accumulated so far, usable as a
    /// pre-populated schema for readers or later writers.
    pub fn schema(&self) -> PropertySchema {
        self.names.schema()
    }

    /// Start a document over `buffer`. The buffer must be sized up front;
    /// see [`recommended_capacity`].
    pub fn begin<'w, 'b>(&'w mut self, buffer: &'b mut [u8]) -> Result<DocumentBuilder<'w, 'b>> {
        ensure!(
            buffer.len() <= u32::MAX as usize,
            "document buffers are limited to {} bytes",
            u32::MAX
        );
        self.names.reset();

        let document = self.pool.acquire(ValueType::Document, None);
        let mut stack: SmallVec<[Container; 8]> = SmallVec::new();
        stack.push(document);

        Ok(DocumentBuilder {
            writer: self,
            cursor: ByteWriter::new(buffer),
            stack,
            pending_property: None,
        })
    }
}

impl Default for DocumentWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// In-progress document borrowed from a [`DocumentWriter`].
pub struct DocumentBuilder<'w, 'b> {
    writer: &'w mut DocumentWriter,
    cursor: ByteWriter<'b>,
    stack: SmallVec<[Container; 8]>,
    pending_property: Option<u32>,
}

impl<'w, 'b> DocumentBuilder<'w, 'b> {
    /// Current nesting depth, not counting the document itself.
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    /// Names the next value written into the enclosing object.
    pub fn property_name(&mut self, name: &str) -> Result<()> {
        let current = self.current();
        ensure!(
            current.container_type() == ValueType::Object,
            "property name {:?} given outside of an object",
            name
        );
        self.pending_property = Some(self.writer.names.get_or_add(name)?);
        Ok(())
    }

    pub fn start_object(&mut self) -> Result<()> {
        self.start_container(ValueType::Object)
    }

    pub fn start_array(&mut self) -> Result<()> {
        self.start_container(ValueType::Array)
    }

    pub fn end_object(&mut self) -> Result<()> {
        self.end_container(ValueType::Object)
    }

    pub fn end_array(&mut self) -> Result<()> {
        self.end_container(ValueType::Array)
    }

    pub fn write_null(&mut self) -> Result<()> {
        self.record_scalar(ValueType::Null)
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.record_scalar(ValueType::Boolean)?;
        self.cursor.write_bool(value)
    }

    pub fn write_byte(&mut self, value: u8) -> Result<()> {
        self.record_scalar(ValueType::Byte)?;
        self.cursor.write_u8(value)
    }

    pub fn write_short(&mut self, value: i16) -> Result<()> {
        self.record_scalar(ValueType::Short)?;
        self.cursor.write_i16(value)
    }

    pub fn write_int(&mut self, value: i32) -> Result<()> {
        self.record_scalar(ValueType::Int)?;
        write_var_i32(&mut self.cursor, value)
    }

    pub fn write_long(&mut self, value: i64) -> Result<()> {
        self.record_scalar(ValueType::Long)?;
        write_var_i64(&mut self.cursor, value)
    }

    pub fn write_float(&mut self, value: f32) -> Result<()> {
        self.record_scalar(ValueType::Float)?;
        self.cursor.write_f32(value)
    }

    pub fn write_double(&mut self, value: f64) -> Result<()> {
        self.record_scalar(ValueType::Double)?;
        self.cursor.write_f64(value)
    }

    pub fn write_str(&mut self, value: &str) -> Result<()> {
        self.record_scalar(ValueType::String)?;
        write_var_u32(&mut self.cursor, value.len() as u32)?;
        self.cursor.write_bytes(value.as_bytes())
    }

    pub fn write_blob(&mut self, value: &[u8]) -> Result<()> {
        self.record_scalar(ValueType::Blob)?;
        write_var_u32(&mut self.cursor, value.len() as u32)?;
        self.cursor.write_bytes(value)
    }

    /// Closes the document: emits the name table (self-contained mode) and
    /// the trailer, and returns the encoded length.
    pub fn finish(mut self) -> Result<usize> {
        ensure!(
            self.stack.len() == 1,
            "document finished with {} unclosed container(s)",
            self.stack.len() - 1
        );

        let document = self.stack.pop().expect("stack holds the document");
        let root = document.first_entry();
        let root_entry_count = document.entry_count();
        self.writer.pool.release(document);

        ensure!(
            root_entry_count == 1,
            "document must contain exactly one root value, found {}",
            root_entry_count
        );
        let root = root.expect("entry count checked above");

        let name_table = self.writer.names.emit(&mut self.cursor)?;

        let trailer_position = self.cursor.position() as u32;
        let trailer = Trailer::new(
            trailer_position - root.position,
            name_table.map_or(0, |column_start| trailer_position - column_start),
            root.value_type,
            self.writer.names.len() as u32,
        );
        self.cursor.write_bytes(trailer.as_bytes())?;

        Ok(self.cursor.position())
    }

    fn current(&mut self) -> &mut Container {
        self.stack.last_mut().expect("container stack is never empty")
    }

    fn start_container(&mut self, container_type: ValueType) -> Result<()> {
        let parent_type = self.current().container_type();
        let parent_property = self.pending_property.take();
        if parent_type == ValueType::Object {
            ensure!(
                parent_property.is_some(),
                "{:?} started inside an object without a property name",
                container_type
            );
        }

        let container = self.writer.pool.acquire(container_type, parent_property);
        self.stack.push(container);
        Ok(())
    }

    fn end_container(&mut self, expected: ValueType) -> Result<()> {
        ensure!(
            self.stack.len() > 1,
            "no open {:?} to close",
            expected
        );

        let mut container = self.stack.pop().expect("length checked above");
        ensure!(
            container.container_type() == expected,
            "mismatched close: open container is {:?}, attempted to close {:?}",
            container.container_type(),
            expected
        );

        let footer_position = container.write_footer(&mut self.cursor)?;
        let container_type = container.container_type();
        let parent_property = container.parent_property_id();
        self.writer.pool.release(container);

        self.record_child(footer_position, container_type, parent_property)
    }

    fn record_scalar(&mut self, value_type: ValueType) -> Result<()> {
        let position = self.cursor.position() as u32;
        let property = self.pending_property.take();
        self.record_child(position, value_type, property)
    }

    fn record_child(
        &mut self,
        position: u32,
        value_type: ValueType,
        property: Option<u32>,
    ) -> Result<()> {
        let parent = self.current();
        match parent.container_type() {
            ValueType::Object => {
                let Some(property_id) = property else {
                    bail!("value written into an object without a property name");
                };
                parent.push_property(position, property_id, value_type);
            }
            ValueType::Document if parent.entry_count() > 0 => {
                bail!("document already has a root value");
            }
            _ => parent.push_element(position, value_type),
        }
        Ok(())
    }
}

impl Drop for DocumentBuilder<'_, '_> {
    fn drop(&mut self) {
        // Abandoned documents still hand their containers back.
        while let Some(container) = self.stack.pop() {
            self.writer.pool.release(container);
        }
    }
}
