//! # Value-Event Stream Interface
//!
//! The boundary between the codec and external producers/consumers (a JSON
//! token reader, another tree representation) is a pull-based sequence of
//! discrete value events. [`write_events`] feeds such a sequence into a
//! [`DocumentBuilder`]; [`EventWalker`] replays a decoded document as the
//! same sequence, depth-first, for re-serialization.
//!
//! The event vocabulary is deliberately narrower than the binary format's
//! type set: external integer values collapse to `Integer` (encoded as
//! Long) and floating point to `Float` (encoded as Double), matching what a
//! schema-less text source can express. Date/time values are not first-class
//! here; producers convert them to ISO-8601 strings before the boundary.

use eyre::{bail, Result};
use smallvec::SmallVec;

use crate::document::accessor::{scalar, ArrayAccessor, Entry, ObjectAccessor};
use crate::document::names::PropertyNameReader;
use crate::document::reader::DocumentReader;
use crate::document::types::ValueType;
use crate::document::writer::DocumentBuilder;

/// One discrete event in a depth-first walk of a value tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueEvent<'a> {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    PropertyName(&'a str),
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(&'a str),
    Blob(&'a [u8]),
}

/// Feed an event sequence into a document builder.
///
/// The sequence must describe exactly one complete root value; structural
/// errors surface from the builder.
pub fn write_events<'e, I>(builder: &mut DocumentBuilder<'_, '_>, events: I) -> Result<()>
where
    I: IntoIterator<Item = ValueEvent<'e>>,
{
    for event in events {
        match event {
            ValueEvent::StartObject => builder.start_object()?,
            ValueEvent::EndObject => builder.end_object()?,
            ValueEvent::StartArray => builder.start_array()?,
            ValueEvent::EndArray => builder.end_array()?,
            ValueEvent::PropertyName(name) => builder.property_name(name)?,
            ValueEvent::Null => builder.write_null()?,
            ValueEvent::Boolean(value) => builder.write_bool(value)?,
            ValueEvent::Integer(value) => builder.write_long(value)?,
            ValueEvent::Float(value) => builder.write_double(value)?,
            ValueEvent::String(value) => builder.write_str(value)?,
            ValueEvent::Blob(value) => builder.write_blob(value)?,
        }
    }
    Ok(())
}

enum Frame<'a> {
    Object {
        accessor: ObjectAccessor<'a>,
        index: usize,
        count: usize,
    },
    Array {
        accessor: ArrayAccessor<'a>,
        index: usize,
        count: usize,
    },
}

enum Step {
    EndObject,
    EndArray,
    Property(u32, Entry),
    Element(Entry),
}

/// Depth-first replay of a decoded document as a value-event sequence.
///
/// The walker owns its own name reader (and cache); walking never touches
/// the `DocumentReader` it was created from.
pub struct EventWalker<'a> {
    data: &'a [u8],
    root: Entry,
    names: PropertyNameReader<'a>,
    stack: SmallVec<[Frame<'a>; 8]>,
    started: bool,
    pending: Option<Entry>,
}

impl<'a> EventWalker<'a> {
    pub fn new(reader: &DocumentReader<'a>) -> Self {
        Self {
            data: reader.data(),
            root: reader.root_entry(),
            names: reader.name_reader(),
            stack: SmallVec::new(),
            started: false,
            pending: None,
        }
    }

    /// Next event, or `None` once the root value has been fully walked.
    pub fn next_event(&mut self) -> Result<Option<ValueEvent<'a>>> {
        if let Some(entry) = self.pending.take() {
            return self.enter(entry).map(Some);
        }

        if !self.started {
            self.started = true;
            let root = self.root;
            return self.enter(root).map(Some);
        }

        let Some(frame) = self.stack.last_mut() else {
            return Ok(None);
        };

        let step = match frame {
            Frame::Object {
                accessor,
                index,
                count,
            } => {
                if *index >= *count {
                    Step::EndObject
                } else {
                    let slot = *index;
                    *index += 1;
                    Step::Property(accessor.property_id_at(slot)?, accessor.entry_at(slot)?)
                }
            }
            Frame::Array {
                accessor,
                index,
                count,
            } => {
                if *index >= *count {
                    Step::EndArray
                } else {
                    let slot = *index;
                    *index += 1;
                    Step::Element(accessor.require(slot)?)
                }
            }
        };

        match step {
            Step::EndObject => {
                self.stack.pop();
                Ok(Some(ValueEvent::EndObject))
            }
            Step::EndArray => {
                self.stack.pop();
                Ok(Some(ValueEvent::EndArray))
            }
            Step::Property(id, entry) => {
                let name = self.names.property_name(id)?;
                self.pending = Some(entry);
                Ok(Some(ValueEvent::PropertyName(name)))
            }
            Step::Element(entry) => self.enter(entry).map(Some),
        }
    }

    fn enter(&mut self, entry: Entry) -> Result<ValueEvent<'a>> {
        match entry.value_type {
            ValueType::Object => {
                let accessor = ObjectAccessor::new(self.data, entry.position);
                let count = accessor.entry_count()?;
                self.stack.push(Frame::Object {
                    accessor,
                    index: 0,
                    count,
                });
                Ok(ValueEvent::StartObject)
            }
            ValueType::Array => {
                let accessor = ArrayAccessor::new(self.data, entry.position);
                let count = accessor.len()?;
                self.stack.push(Frame::Array {
                    accessor,
                    index: 0,
                    count,
                });
                Ok(ValueEvent::StartArray)
            }
            ValueType::Null => Ok(ValueEvent::Null),
            ValueType::Boolean => Ok(ValueEvent::Boolean(scalar::read_bool(self.data, entry)?)),
            ValueType::Byte => Ok(ValueEvent::Integer(
                scalar::read_byte(self.data, entry)? as i64
            )),
            ValueType::Short => Ok(ValueEvent::Integer(
                scalar::read_short(self.data, entry)? as i64
            )),
            ValueType::Int => Ok(ValueEvent::Integer(
                scalar::read_int(self.data, entry)? as i64
            )),
            ValueType::Long => Ok(ValueEvent::Integer(scalar::read_long(self.data, entry)?)),
            ValueType::Float => Ok(ValueEvent::Float(
                scalar::read_float(self.data, entry)? as f64
            )),
            ValueType::Double => Ok(ValueEvent::Float(scalar::read_double(self.data, entry)?)),
            ValueType::String => Ok(ValueEvent::String(scalar::read_str(self.data, entry)?)),
            ValueType::Blob => Ok(ValueEvent::Blob(scalar::read_blob(self.data, entry)?)),
            other => bail!("unexpected {:?} entry in document body", other),
        }
    }
}

impl<'a> Iterator for EventWalker<'a> {
    type Item = Result<ValueEvent<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::writer::DocumentWriter;

    fn encode(events: &[ValueEvent<'_>]) -> Vec<u8> {
        let mut writer = DocumentWriter::new();
        let mut buf = vec![0u8; 4096];
        let mut doc = writer.begin(&mut buf).unwrap();
        write_events(&mut doc, events.iter().copied()).unwrap();
        let len = doc.finish().unwrap();
        buf.truncate(len);
        buf
    }

    fn walk(encoded: &[u8]) -> Vec<ValueEvent<'_>> {
        let reader = DocumentReader::open(encoded).unwrap();
        EventWalker::new(&reader)
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn events_roundtrip_through_the_codec() {
        let events = [
            ValueEvent::StartObject,
            ValueEvent::PropertyName("name"),
            ValueEvent::String("doc"),
            ValueEvent::PropertyName("count"),
            ValueEvent::Integer(42),
            ValueEvent::PropertyName("tags"),
            ValueEvent::StartArray,
            ValueEvent::Boolean(true),
            ValueEvent::Null,
            ValueEvent::Float(1.5),
            ValueEvent::EndArray,
            ValueEvent::EndObject,
        ];
        let encoded = encode(&events);
        assert_eq!(walk(&encoded), events);
    }

    #[test]
    fn scalar_root_produces_single_event() {
        let events = [ValueEvent::Integer(-7)];
        let encoded = encode(&events);
        assert_eq!(walk(&encoded), events);
    }

    #[test]
    fn blob_events_roundtrip() {
        let payload = [0xDEu8, 0xAD, 0xBE, 0xEF];
        let events = [
            ValueEvent::StartArray,
            ValueEvent::Blob(&payload),
            ValueEvent::EndArray,
        ];
        let encoded = encode(&events);
        assert_eq!(walk(&encoded), events);
    }

    #[test]
    fn nested_containers_replay_in_order() {
        let events = [
            ValueEvent::StartArray,
            ValueEvent::StartObject,
            ValueEvent::PropertyName("inner"),
            ValueEvent::StartArray,
            ValueEvent::Integer(1),
            ValueEvent::Integer(2),
            ValueEvent::EndArray,
            ValueEvent::EndObject,
            ValueEvent::Null,
            ValueEvent::EndArray,
        ];
        let encoded = encode(&events);
        assert_eq!(walk(&encoded), events);
    }

    #[test]
    fn walker_is_independent_of_the_reader() {
        let events = [
            ValueEvent::StartObject,
            ValueEvent::PropertyName("a"),
            ValueEvent::Integer(1),
            ValueEvent::EndObject,
        ];
        let encoded = encode(&events);
        let reader = DocumentReader::open(&encoded).unwrap();

        let first: Vec<_> = EventWalker::new(&reader)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        let second: Vec<_> = EventWalker::new(&reader)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(first, second);
    }
}
