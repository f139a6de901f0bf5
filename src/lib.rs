//! # bindoc - Self-Describing Binary Document Format
//!
//! bindoc encodes tree-shaped data (objects, arrays, scalars, strings,
//! binary blobs) into a compact binary layout built for two properties
//! ordinary JSON text cannot give:
//!
//! - **Random access**: any nested value is reachable without parsing the
//!   rest of the document. Objects are looked up by binary search over a
//!   sorted property-id table, arrays by direct index arithmetic.
//! - **Single-pass construction**: a document is written depth-first from a
//!   streaming source with no backpatching: every stored offset is
//!   backward-relative to a footer whose position is known when it is
//!   written.
//!
//! ## Quick Start
//!
//! ```ignore
//! use bindoc::{recommended_capacity, DocumentReader, DocumentWriter};
//!
//! let mut writer = DocumentWriter::new();
//! let mut buf = vec![0u8; recommended_capacity(64)];
//!
//! let mut doc = writer.begin(&mut buf)?;
//! doc.start_object()?;
//! doc.property_name("a")?;
//! doc.write_int(1)?;
//! doc.property_name("b")?;
//! doc.start_array()?;
//! doc.write_bool(true)?;
//! doc.write_null()?;
//! doc.write_str("x")?;
//! doc.end_array()?;
//! doc.end_object()?;
//! let len = doc.finish()?;
//!
//! let mut reader = DocumentReader::open(&buf[..len])?;
//! let root = reader.root_object()?;
//! let a = reader.property_id("a")?;
//! assert_eq!(root.read_int(a)?, 1);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------+
//! |  stream (value-event feed / replay)        |
//! +---------------------+----------------------+
//! |  document::writer   |  document::reader    |
//! |  container, pool,   |  accessor, trailer,  |
//! |  names              |  names, tree cursor  |
//! +---------------------+----------------------+
//! |  encoding (zig-zag, varint)                |
//! +--------------------------------------------+
//! |  cursor (bounds-checked byte r/w)          |
//! +--------------------------------------------+
//! ```
//!
//! ## Concurrency Model
//!
//! Writing is single-threaded and single-pass per document; the container
//! pool may be shared across writer threads. Finished buffers are immutable
//! and safe for unlimited concurrent readers, each holding its own reader
//! and name cache.
//!
//! ## Module Overview
//!
//! - [`cursor`]: fixed-position byte cursors, checked by default
//! - [`encoding`]: zig-zag and variable-length integer primitives
//! - [`document`]: the codec - writer, footers, accessors, name tables
//! - [`stream`]: the value-event interface for external bridges

pub mod cursor;
pub mod document;
pub mod encoding;
pub mod stream;

pub use document::{
    recommended_capacity, ArrayAccessor, ContainerPool, DocumentBuilder, DocumentReader,
    DocumentWriter, Entry, IntWidth, ObjectAccessor, PropertySchema, TreeCursor, ValueType,
    TRAILER_SIZE,
};
pub use stream::{write_events, EventWalker, ValueEvent};
