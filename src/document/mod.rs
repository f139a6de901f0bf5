//! # Binary Document Codec
//!
//! Schema-less, self-describing binary encoding for tree-shaped data with
//! two properties JSON text cannot offer: random access into nested values
//! without parsing siblings, and compact single-pass construction with no
//! offset backpatching.
//!
//! ## Document Layout
//!
//! ```text
//! +---------------------+----------------+------------------+------------------+
//! | value bytes and     | root container | property name    | trailer          |
//! | nested footers      | footer         | table (optional) | (16 bytes)       |
//! +---------------------+----------------+------------------+------------------+
//! ```
//!
//! Child value bytes are written depth-first; each container's footer
//! follows its children and stores, per entry, a backward offset to the
//! value, the property id (objects only), and a type tag. Offsets and ids
//! use the smallest of 1/2/4 bytes that covers the container's maxima, so
//! small documents stay small. Object entries are sorted by property id for
//! binary-search lookup; array entries keep write order and are addressed by
//! index arithmetic.
//!
//! ## Module Structure
//!
//! - `types`: value type tags and adaptive integer widths
//! - `container`: write-side entry accumulation and footer emission
//! - `pool`: shared pool of reusable containers
//! - `names`: property-name tables, self-contained and pre-populated
//! - `writer`: depth-first document construction
//! - `accessor`: read-side object/array views with sub-linear lookup
//! - `reader`: trailer discovery, root access, descend/ascend navigation

pub mod accessor;
pub(crate) mod container;
pub mod names;
pub mod pool;
pub mod reader;
pub mod types;
pub mod writer;

pub use accessor::{ArrayAccessor, Entry, ObjectAccessor};
pub use names::{PropertyNameReader, PropertySchema};
pub use pool::ContainerPool;
pub use reader::{DocumentReader, Trailer, TreeCursor, TRAILER_SIZE};
pub use types::{IntWidth, ValueType};
pub use writer::{recommended_capacity, DocumentBuilder, DocumentWriter};
