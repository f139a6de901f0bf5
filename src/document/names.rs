//! # Property Name Tables
//!
//! Object members are stored under small integer ids, not name strings. The
//! name↔id mapping is document-wide and comes in two modes:
//!
//! - **Self-contained**: the writer assigns ids in first-use order and emits
//!   the table once, after the root container. Readers resolve names lazily
//!   from the embedded table.
//! - **Pre-populated**: a [`PropertySchema`] fixes the mapping up front and
//!   no table is emitted. Many documents sharing a shape skip the per-name
//!   bytes entirely; readers are handed the same schema. Pre-populated
//!   schemas are closed sets; writing an unknown property name is an error.
//!
//! ## Embedded Table Layout
//!
//! ```text
//! +---------------------------+---------------------+------------+
//! | name bytes                | offset column       | name count |
//! | [varint len + utf8] x N   | [u32; N]            | u32        |
//! +---------------------------+---------------------+------------+
//! ```
//!
//! Offsets in the column are backward offsets from the column's start to the
//! corresponding name's first byte; the column is indexed directly by
//! property id. The document trailer records the column's position.
//!
//! Read-side resolution caches both directions per reader, so repeated
//! lookups never rescan the table.

use eyre::{bail, ensure, eyre, Result};
use hashbrown::HashMap;

use crate::cursor::{ByteReader, ByteWriter};
use crate::encoding::varint::{read_var_u32, write_var_u32};

/// Ordered property-name mapping shared across documents with one shape.
///
/// Ids are assigned by position: the first name gets id 0.
#[derive(Debug, Clone, Default)]
pub struct PropertySchema {
    names: Vec<String>,
    ids: HashMap<String, u32>,
}

impl PropertySchema {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let ids = names
            .iter()
            .enumerate()
            .map(|(id, name)| (name.clone(), id as u32))
            .collect();
        Self { names, ids }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn id(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }
}

/// Write-side name table.
#[derive(Debug)]
pub(crate) struct PropertyNameWriter {
    ids: HashMap<String, u32>,
    names: Vec<String>,
    pre_populated: bool,
}

impl PropertyNameWriter {
    pub fn self_contained() -> Self {
        Self {
            ids: HashMap::new(),
            names: Vec::new(),
            pre_populated: false,
        }
    }

    pub fn pre_populated(schema: &PropertySchema) -> Self {
        Self {
            ids: schema.ids.clone(),
            names: schema.names.clone(),
            pre_populated: true,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn get_or_add(&mut self, name: &str) -> Result<u32> {
        if let Some(&id) = self.ids.get(name) {
            return Ok(id);
        }
        ensure!(
            !self.pre_populated,
            "property name {:?} is not part of the supplied schema",
            name
        );
        let id = self.names.len() as u32;
        self.ids.insert(name.to_string(), id);
        self.names.push(name.to_string());
        Ok(id)
    }

    /// Clears accumulated names between documents; a pre-populated table is
    /// immutable and survives untouched.
    pub fn reset(&mut self) {
        if !self.pre_populated {
            self.ids.clear();
            self.names.clear();
        }
    }

    /// Emits the embedded table and returns the offset column's position,
    /// or `None` in pre-populated mode where no table is written.
    pub fn emit(&self, writer: &mut ByteWriter) -> Result<Option<u32>> {
        if self.pre_populated {
            return Ok(None);
        }

        let mut name_positions = Vec::with_capacity(self.names.len());
        for name in &self.names {
            name_positions.push(writer.position() as u32);
            write_var_u32(writer, name.len() as u32)?;
            writer.write_bytes(name.as_bytes())?;
        }

        let column_start = writer.position() as u32;
        for position in name_positions {
            writer.write_u32(column_start - position)?;
        }
        writer.write_u32(self.names.len() as u32)?;

        Ok(Some(column_start))
    }

    /// Snapshot of the accumulated mapping, reusable as a pre-populated
    /// schema for later documents.
    pub fn schema(&self) -> PropertySchema {
        PropertySchema {
            names: self.names.clone(),
            ids: self.ids.clone(),
        }
    }
}

/// Read-side name table with per-reader lazy caches.
///
/// Resolved names are `&str` slices borrowed from the document buffer (or
/// the supplied schema); nothing is copied.
#[derive(Debug, Clone)]
pub struct PropertyNameReader<'a> {
    data: &'a [u8],
    table: Option<(usize, usize)>,
    ids_by_name: HashMap<&'a str, u32>,
    names_by_id: HashMap<u32, &'a str>,
}

impl<'a> PropertyNameReader<'a> {
    /// Reader over a table embedded at `column_start` with `count` names.
    pub(crate) fn embedded(data: &'a [u8], column_start: usize, count: usize) -> Self {
        Self {
            data,
            table: Some((column_start, count)),
            ids_by_name: HashMap::new(),
            names_by_id: HashMap::new(),
        }
    }

    /// Reader for a document that carries no embedded table and was given no
    /// schema; every name lookup fails.
    pub(crate) fn without_table(data: &'a [u8]) -> Self {
        Self {
            data,
            table: None,
            ids_by_name: HashMap::new(),
            names_by_id: HashMap::new(),
        }
    }

    /// Reader resolved entirely from a caller-supplied schema; no buffer
    /// scan happens.
    pub(crate) fn from_schema(data: &'a [u8], schema: &'a PropertySchema) -> Self {
        let mut ids_by_name = HashMap::with_capacity(schema.len());
        let mut names_by_id = HashMap::with_capacity(schema.len());
        for (id, name) in schema.names.iter().enumerate() {
            ids_by_name.insert(name.as_str(), id as u32);
            names_by_id.insert(id as u32, name.as_str());
        }
        Self {
            data,
            table: None,
            ids_by_name,
            names_by_id,
        }
    }

    pub fn property_id(&mut self, name: &str) -> Result<u32> {
        if let Some(&id) = self.ids_by_name.get(name) {
            return Ok(id);
        }

        if let Some((column_start, count)) = self.table {
            for id in 0..count as u32 {
                let candidate = match self.names_by_id.get(&id) {
                    Some(&cached) => cached,
                    None => {
                        let resolved = self.read_name_at(column_start, id)?;
                        self.ids_by_name.insert(resolved, id);
                        self.names_by_id.insert(id, resolved);
                        resolved
                    }
                };
                if candidate == name {
                    return Ok(id);
                }
            }
        }

        bail!("property name {:?} not found in document", name)
    }

    pub fn property_name(&mut self, id: u32) -> Result<&'a str> {
        if let Some(&name) = self.names_by_id.get(&id) {
            return Ok(name);
        }

        let Some((column_start, count)) = self.table else {
            bail!("property id {} not found in document", id);
        };
        ensure!(
            (id as usize) < count,
            "property id {} not found in document ({} names)",
            id,
            count
        );

        let name = self.read_name_at(column_start, id)?;
        self.ids_by_name.insert(name, id);
        self.names_by_id.insert(id, name);
        Ok(name)
    }

    fn read_name_at(&self, column_start: usize, id: u32) -> Result<&'a str> {
        let mut reader = ByteReader::new(self.data);
        reader.seek(column_start + id as usize * 4);
        let back_offset = reader.read_u32()? as usize;
        let name_position = column_start
            .checked_sub(back_offset)
            .ok_or_else(|| eyre!("name offset {} out of range for property id {}", back_offset, id))?;

        reader.seek(name_position);
        let len = read_var_u32(&mut reader)? as usize;
        let bytes = reader.read_bytes(len)?;
        std::str::from_utf8(bytes).map_err(|e| eyre!("invalid UTF-8 in property name: {}", e))
    }
}
