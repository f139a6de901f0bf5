//! # Encoding Module
//!
//! This module provides the primitive value encodings shared by the writer
//! and reader sides of the codec:
//!
//! - **Zig-zag mapping**: bijective signed-to-unsigned integer mapping that
//!   keeps small-magnitude negatives compact under varint encoding
//! - **Varint encoding**: 7-bits-per-group variable-length integers used for
//!   Int/Long values and String/Blob length prefixes

pub mod varint;

pub use varint::{
    decode_zigzag32, decode_zigzag64, encode_zigzag32, encode_zigzag64, read_var_i32,
    read_var_i64, read_var_u32, read_var_u64, var_u32_len, var_u64_len, write_var_i32,
    write_var_i64, write_var_u32, write_var_u64,
};
