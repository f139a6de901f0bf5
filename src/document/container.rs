//! # Write-Side Container
//!
//! A `Container` accumulates one nesting level's value entries while the
//! level is open. Child value bytes are written immediately through the byte
//! cursor; only the footer is deferred. When the level closes, the container
//! rewrites each entry's absolute position as a backward offset from the
//! footer's start, sorts object entries by property id, picks the minimal
//! integer widths, and emits the footer.
//!
//! Containers are reused through [`super::pool::ContainerPool`]; `reset`
//! clears the entry list while keeping its allocation.

use eyre::{bail, Result};

use crate::cursor::ByteWriter;
use crate::document::types::{IntWidth, ValueType};

/// One child's descriptor inside an open container.
///
/// `position` holds the absolute byte offset of the child's value bytes (for
/// container children, of the child's footer) until the footer is emitted;
/// it is rewritten to `footer_start - position` at that point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WriteEntry {
    pub position: u32,
    pub id_or_index: u32,
    pub value_type: ValueType,
}

#[derive(Debug)]
pub(crate) struct Container {
    container_type: ValueType,
    parent_property_id: Option<u32>,
    entries: Vec<WriteEntry>,
}

impl Container {
    pub fn new() -> Self {
        Self {
            container_type: ValueType::Undefined,
            parent_property_id: None,
            entries: Vec::new(),
        }
    }

    pub fn reset(&mut self, container_type: ValueType, parent_property_id: Option<u32>) {
        self.container_type = container_type;
        self.parent_property_id = parent_property_id;
        self.entries.clear();
    }

    #[inline]
    pub fn container_type(&self) -> ValueType {
        self.container_type
    }

    /// Property id this container occupies in its parent object, captured
    /// when the container was opened.
    #[inline]
    pub fn parent_property_id(&self) -> Option<u32> {
        self.parent_property_id
    }

    #[inline]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn first_entry(&self) -> Option<WriteEntry> {
        self.entries.first().copied()
    }

    /// Appends an array element; the id slot records the running index.
    pub fn push_element(&mut self, position: u32, value_type: ValueType) {
        let index = self.entries.len() as u32;
        self.entries.push(WriteEntry {
            position,
            id_or_index: index,
            value_type,
        });
    }

    /// Appends an object property under `property_id`.
    pub fn push_property(&mut self, position: u32, property_id: u32, value_type: ValueType) {
        self.entries.push(WriteEntry {
            position,
            id_or_index: property_id,
            value_type,
        });
    }

    /// Emits this container's footer at the cursor's current position and
    /// returns that position.
    ///
    /// Rewrites entry positions as backward offsets relative to the footer
    /// start, so all offsets are positive and no absolute positions are
    /// stored.
    pub fn write_footer(&mut self, writer: &mut ByteWriter) -> Result<u32> {
        let footer_start = writer.position() as u32;

        for entry in &mut self.entries {
            entry.position = footer_start - entry.position;
        }

        match self.container_type {
            ValueType::Array => self.write_array_footer(writer)?,
            ValueType::Object => self.write_object_footer(writer)?,
            other => bail!("container type {:?} has no footer", other),
        }

        Ok(footer_start)
    }

    fn write_array_footer(&self, writer: &mut ByteWriter) -> Result<()> {
        let offset_width = IntWidth::for_max(self.max_offset());

        writer.write_u8(offset_width as u8)?;
        writer.write_u32(self.entries.len() as u32)?;

        for entry in &self.entries {
            offset_width.write(writer, entry.position)?;
            writer.write_u8(entry.value_type.tag())?;
        }
        Ok(())
    }

    fn write_object_footer(&mut self, writer: &mut ByteWriter) -> Result<()> {
        let offset_width = IntWidth::for_max(self.max_offset());
        let id_width = IntWidth::for_max(self.max_property_id());

        writer.write_u8(offset_width as u8)?;
        writer.write_u8(id_width as u8)?;
        writer.write_u32(self.entries.len() as u32)?;

        self.sort_entries_by_id();

        for entry in &self.entries {
            offset_width.write(writer, entry.position)?;
            id_width.write(writer, entry.id_or_index)?;
            writer.write_u8(entry.value_type.tag())?;
        }
        Ok(())
    }

    fn max_offset(&self) -> u32 {
        self.entries.iter().map(|e| e.position).max().unwrap_or(0)
    }

    fn max_property_id(&self) -> u32 {
        self.entries.iter().map(|e| e.id_or_index).max().unwrap_or(0)
    }

    /// Objects are usually a handful of properties; bubble sort wins on
    /// those through cache locality. Larger objects fall back to the
    /// standard unstable sort; ids are unique, so stability is moot.
    fn sort_entries_by_id(&mut self) {
        if self.entries.len() > 10 {
            self.entries.sort_unstable_by_key(|e| e.id_or_index);
        } else {
            self.bubble_sort_by_id();
        }
    }

    fn bubble_sort_by_id(&mut self) {
        let mut n = self.entries.len();
        while n > 0 {
            let mut last_swap = 0;
            for i in 1..n {
                if self.entries[i - 1].id_or_index > self.entries[i].id_or_index {
                    self.entries.swap(i - 1, i);
                    last_swap = i;
                }
            }
            n = last_swap;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::ByteReader;

    fn ids(container: &Container) -> Vec<u32> {
        container.entries.iter().map(|e| e.id_or_index).collect()
    }

    #[test]
    fn reset_clears_entries_and_type() {
        let mut container = Container::new();
        container.reset(ValueType::Array, None);
        container.push_element(0, ValueType::Null);
        assert_eq!(container.entry_count(), 1);

        container.reset(ValueType::Object, Some(3));
        assert_eq!(container.entry_count(), 0);
        assert_eq!(container.container_type(), ValueType::Object);
        assert_eq!(container.parent_property_id(), Some(3));
    }

    #[test]
    fn array_elements_record_running_index() {
        let mut container = Container::new();
        container.reset(ValueType::Array, None);
        container.push_element(10, ValueType::Boolean);
        container.push_element(11, ValueType::Null);
        container.push_element(11, ValueType::String);
        assert_eq!(ids(&container), vec![0, 1, 2]);
    }

    #[test]
    fn bubble_sort_orders_by_property_id() {
        let mut container = Container::new();
        container.reset(ValueType::Object, None);
        for &id in &[4u32, 1, 3, 0, 2] {
            container.push_property(id * 2, id, ValueType::Null);
        }
        container.bubble_sort_by_id();
        assert_eq!(ids(&container), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn large_object_sort_orders_by_property_id() {
        let mut container = Container::new();
        container.reset(ValueType::Object, None);
        for id in (0u32..40).rev() {
            container.push_property(id, id, ValueType::Null);
        }
        container.sort_entries_by_id();
        assert_eq!(ids(&container), (0u32..40).collect::<Vec<_>>());
    }

    #[test]
    fn array_footer_layout() {
        let mut buf = [0u8; 64];
        let mut writer = ByteWriter::new(&mut buf);
        writer.seek(20);

        let mut container = Container::new();
        container.reset(ValueType::Array, None);
        container.push_element(5, ValueType::Boolean);
        container.push_element(6, ValueType::Null);

        let footer_start = container.write_footer(&mut writer).unwrap();
        assert_eq!(footer_start, 20);

        let mut reader = ByteReader::new(&buf);
        reader.seek(20);
        assert_eq!(reader.read_u8().unwrap(), IntWidth::One as u8);
        assert_eq!(reader.read_u32().unwrap(), 2);
        // offsets are backward from the footer start
        assert_eq!(reader.read_u8().unwrap(), 15);
        assert_eq!(reader.read_u8().unwrap(), ValueType::Boolean.tag());
        assert_eq!(reader.read_u8().unwrap(), 14);
        assert_eq!(reader.read_u8().unwrap(), ValueType::Null.tag());
    }

    #[test]
    fn object_footer_sorted_with_id_column() {
        let mut buf = [0u8; 64];
        let mut writer = ByteWriter::new(&mut buf);
        writer.seek(8);

        let mut container = Container::new();
        container.reset(ValueType::Object, None);
        container.push_property(2, 7, ValueType::Int);
        container.push_property(4, 3, ValueType::Null);

        container.write_footer(&mut writer).unwrap();

        let mut reader = ByteReader::new(&buf);
        reader.seek(8);
        assert_eq!(reader.read_u8().unwrap(), IntWidth::One as u8);
        assert_eq!(reader.read_u8().unwrap(), IntWidth::One as u8);
        assert_eq!(reader.read_u32().unwrap(), 2);
        // id 3 sorts before id 7
        assert_eq!(reader.read_u8().unwrap(), 4);
        assert_eq!(reader.read_u8().unwrap(), 3);
        assert_eq!(reader.read_u8().unwrap(), ValueType::Null.tag());
        assert_eq!(reader.read_u8().unwrap(), 6);
        assert_eq!(reader.read_u8().unwrap(), 7);
        assert_eq!(reader.read_u8().unwrap(), ValueType::Int.tag());
    }

    #[test]
    fn wide_offsets_select_wider_width() {
        let mut buf = vec![0u8; 70_000];
        let mut writer = ByteWriter::new(&mut buf);
        writer.seek(40_000);

        let mut container = Container::new();
        container.reset(ValueType::Array, None);
        container.push_element(2, ValueType::Blob);

        container.write_footer(&mut writer).unwrap();

        let mut reader = ByteReader::new(&buf);
        reader.seek(40_000);
        assert_eq!(reader.read_u8().unwrap(), IntWidth::Four as u8);
    }

    #[test]
    fn document_container_has_no_footer() {
        let mut buf = [0u8; 16];
        let mut writer = ByteWriter::new(&mut buf);
        let mut container = Container::new();
        container.reset(ValueType::Document, None);
        assert!(container.write_footer(&mut writer).is_err());
    }
}
