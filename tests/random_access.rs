//! # Random Access and Format Tests
//!
//! Covers the footer-level guarantees of the format:
//!
//! - Binary search over object footers agrees with a linear scan and never
//!   reports false positives
//! - Containers pick the smallest integer width that covers their maxima
//! - Pre-populated schemas share name tables across documents without
//!   duplicating name bytes
//! - Malformed input and type misuse fail with errors, never bad data

use bindoc::{DocumentReader, DocumentWriter, PropertySchema, TRAILER_SIZE};

/// Footer position of the root container, recovered the way a reader does.
fn root_footer_position(encoded: &[u8]) -> usize {
    let trailer_position = encoded.len() - TRAILER_SIZE;
    let back = u32::from_le_bytes(
        encoded[trailer_position..trailer_position + 4]
            .try_into()
            .unwrap(),
    ) as usize;
    trailer_position - back
}

mod lookup {
    use super::*;

    #[test]
    fn binary_search_agrees_with_linear_scan() {
        // write-order ids are shuffled relative to sorted order
        let names: Vec<String> = [3u32, 11, 7, 0, 19, 5, 14, 2, 9, 17, 1, 12]
            .iter()
            .map(|n| format!("key{:02}", n))
            .collect();

        let mut writer = DocumentWriter::new();
        let mut buf = vec![0u8; 4096];
        let mut doc = writer.begin(&mut buf).unwrap();
        doc.start_object().unwrap();
        for (value, name) in names.iter().enumerate() {
            doc.property_name(name).unwrap();
            doc.write_int(value as i32 * 10).unwrap();
        }
        doc.end_object().unwrap();
        let len = doc.finish().unwrap();

        let mut reader = DocumentReader::open(&buf[..len]).unwrap();
        let root = reader.root_object().unwrap();
        let count = root.entry_count().unwrap();
        assert_eq!(count, names.len());

        // linear scan over footer slots, the ground truth
        for slot in 0..count {
            let id = root.property_id_at(slot).unwrap();
            let via_scan = root.entry_at(slot).unwrap();
            let via_search = root.find(id).unwrap().expect("id present in footer");
            assert_eq!(via_search, via_scan, "id {}", id);
        }

        // every written name resolves to its value through binary search
        for (value, name) in names.iter().enumerate() {
            let id = reader.property_id(name).unwrap();
            assert_eq!(root.read_int(id).unwrap(), value as i32 * 10);
        }

        // absent ids report not-found, no false positives
        for absent in [names.len() as u32, 100, u32::MAX] {
            assert_eq!(root.find(absent).unwrap(), None);
        }
    }

    #[test]
    fn footer_ids_are_sorted_ascending() {
        let mut writer = DocumentWriter::new();
        let mut buf = vec![0u8; 4096];
        let mut doc = writer.begin(&mut buf).unwrap();
        doc.start_array().unwrap();
        // first object assigns ids in order z=0, m=1, a=2
        doc.start_object().unwrap();
        for name in ["z", "m", "a"] {
            doc.property_name(name).unwrap();
            doc.write_null().unwrap();
        }
        doc.end_object().unwrap();
        // second object reuses them out of id order
        doc.start_object().unwrap();
        for name in ["a", "z", "m"] {
            doc.property_name(name).unwrap();
            doc.write_null().unwrap();
        }
        doc.end_object().unwrap();
        doc.end_array().unwrap();
        let len = doc.finish().unwrap();

        let reader = DocumentReader::open(&buf[..len]).unwrap();
        let array = reader.root_array().unwrap();
        for index in 0..2 {
            let object = array.read_object(index).unwrap();
            let ids: Vec<u32> = (0..object.entry_count().unwrap())
                .map(|slot| object.property_id_at(slot).unwrap())
                .collect();
            assert_eq!(ids, vec![0, 1, 2], "object {}", index);
        }
    }

    #[test]
    fn missing_property_and_index_errors_identify_the_target() {
        let mut writer = DocumentWriter::new();
        let mut buf = vec![0u8; 1024];
        let mut doc = writer.begin(&mut buf).unwrap();
        doc.start_object().unwrap();
        doc.property_name("here").unwrap();
        doc.start_array().unwrap();
        doc.write_int(1).unwrap();
        doc.end_array().unwrap();
        doc.end_object().unwrap();
        let len = doc.finish().unwrap();

        let mut reader = DocumentReader::open(&buf[..len]).unwrap();
        let root = reader.root_object().unwrap();

        let err = root.read_int(42).unwrap_err();
        assert!(err.to_string().contains("42"), "{}", err);

        let array = root.read_array(reader.property_id("here").unwrap()).unwrap();
        let err = array.read_int(9).unwrap_err();
        assert!(err.to_string().contains('9'), "{}", err);

        assert!(reader.property_id("absent").is_err());
    }

    #[test]
    fn type_mismatch_is_an_error_not_a_coercion() {
        let mut writer = DocumentWriter::new();
        let mut buf = vec![0u8; 1024];
        let mut doc = writer.begin(&mut buf).unwrap();
        doc.start_object().unwrap();
        doc.property_name("s").unwrap();
        doc.write_str("text").unwrap();
        doc.end_object().unwrap();
        let len = doc.finish().unwrap();

        let mut reader = DocumentReader::open(&buf[..len]).unwrap();
        let root = reader.root_object().unwrap();
        let s = reader.property_id("s").unwrap();

        assert!(root.read_int(s).is_err());
        assert!(root.read_bool(s).is_err());
        assert!(root.read_object(s).is_err());
        assert_eq!(root.read_str(s).unwrap(), "text");
    }
}

mod widths {
    use super::*;

    #[test]
    fn small_object_selects_one_byte_widths() {
        let mut writer = DocumentWriter::new();
        let mut buf = vec![0u8; 4096];
        let mut doc = writer.begin(&mut buf).unwrap();
        doc.start_object().unwrap();
        for i in 0..100 {
            doc.property_name(&format!("p{}", i)).unwrap();
            doc.write_null().unwrap();
        }
        doc.end_object().unwrap();
        let len = doc.finish().unwrap();
        let encoded = &buf[..len];

        let footer = root_footer_position(encoded);
        // nulls write no value bytes, so offsets stay tiny as well
        assert_eq!(encoded[footer], 1, "offset width tag");
        assert_eq!(encoded[footer + 1], 1, "id width tag");
    }

    #[test]
    fn three_hundred_properties_select_two_byte_id_width() {
        let mut writer = DocumentWriter::new();
        let mut buf = vec![0u8; 32768];
        let mut doc = writer.begin(&mut buf).unwrap();
        doc.start_object().unwrap();
        for i in 0..300 {
            doc.property_name(&format!("p{}", i)).unwrap();
            doc.write_null().unwrap();
        }
        doc.end_object().unwrap();
        let len = doc.finish().unwrap();
        let encoded = &buf[..len];

        let footer = root_footer_position(encoded);
        assert_eq!(encoded[footer + 1], 2, "id width tag");

        // lookups still work through the wider column
        let mut reader = DocumentReader::open(encoded).unwrap();
        let root = reader.root_object().unwrap();
        let id = reader.property_id("p299").unwrap();
        assert_eq!(id, 299);
        assert!(root.is_null(id).unwrap());
    }

    #[test]
    fn large_value_span_selects_wider_offsets() {
        let mut writer = DocumentWriter::new();
        let mut buf = vec![0u8; 262144];
        let mut doc = writer.begin(&mut buf).unwrap();
        doc.start_array().unwrap();
        let chunk = "x".repeat(10_000);
        for _ in 0..5 {
            doc.write_str(&chunk).unwrap();
        }
        doc.end_array().unwrap();
        let len = doc.finish().unwrap();
        let encoded = &buf[..len];

        let footer = root_footer_position(encoded);
        assert_eq!(encoded[footer], 4, "offset width tag");

        let reader = DocumentReader::open(encoded).unwrap();
        let array = reader.root_array().unwrap();
        assert_eq!(array.read_str(0).unwrap().len(), 10_000);
        assert_eq!(array.read_str(4).unwrap().len(), 10_000);
    }
}

mod schema_reuse {
    use super::*;

    fn encode_reading(writer: &mut DocumentWriter, value: i32) -> Vec<u8> {
        let mut buf = vec![0u8; 1024];
        let mut doc = writer.begin(&mut buf).unwrap();
        doc.start_object().unwrap();
        doc.property_name("sensor").unwrap();
        doc.write_str("thermo").unwrap();
        doc.property_name("reading").unwrap();
        doc.write_int(value).unwrap();
        doc.end_object().unwrap();
        let len = doc.finish().unwrap();
        buf.truncate(len);
        buf
    }

    #[test]
    fn shared_schema_skips_name_table_bytes() {
        let schema = PropertySchema::from_names(["sensor", "reading"]);

        let mut self_contained = DocumentWriter::new();
        let mut shared = DocumentWriter::with_schema(&schema);

        let with_names = encode_reading(&mut self_contained, 20);
        let without_names = encode_reading(&mut shared, 20);

        assert!(without_names.len() < with_names.len());

        let needle = b"sensor";
        let contains = without_names
            .windows(needle.len())
            .any(|window| window == needle);
        assert!(!contains, "schema document must not embed name bytes");
    }

    #[test]
    fn documents_with_identical_content_encode_identically() {
        let schema = PropertySchema::from_names(["sensor", "reading"]);
        let mut writer = DocumentWriter::with_schema(&schema);

        let first = encode_reading(&mut writer, 21);
        let second = encode_reading(&mut writer, 21);
        assert_eq!(first, second);

        // a differing value only perturbs its value bytes, not the layout
        let third = encode_reading(&mut writer, 22);
        assert_eq!(first.len(), third.len());
    }

    #[test]
    fn schema_documents_read_back_through_the_same_schema() {
        let schema = PropertySchema::from_names(["sensor", "reading"]);
        let mut writer = DocumentWriter::with_schema(&schema);
        let encoded = encode_reading(&mut writer, 7);

        let mut reader = DocumentReader::open_with_schema(&encoded, &schema).unwrap();
        let root = reader.root_object().unwrap();
        assert_eq!(
            root.read_str(reader.property_id("sensor").unwrap()).unwrap(),
            "thermo"
        );
        assert_eq!(
            root.read_int(reader.property_id("reading").unwrap()).unwrap(),
            7
        );
        assert_eq!(reader.property_name(1).unwrap(), "reading");
    }

    #[test]
    fn schema_exported_from_a_writer_reads_its_documents() {
        let mut writer = DocumentWriter::new();
        let encoded = encode_reading(&mut writer, 3);
        let schema = writer.schema();
        assert_eq!(schema.len(), 2);

        let mut reader = DocumentReader::open_with_schema(&encoded, &schema).unwrap();
        let root = reader.root_object().unwrap();
        assert_eq!(
            root.read_int(reader.property_id("reading").unwrap()).unwrap(),
            3
        );
    }

    #[test]
    fn schema_document_without_schema_cannot_resolve_names() {
        let schema = PropertySchema::from_names(["sensor", "reading"]);
        let mut writer = DocumentWriter::with_schema(&schema);
        let encoded = encode_reading(&mut writer, 1);

        let mut reader = DocumentReader::open(&encoded).unwrap();
        // ids still work; names need the external schema
        assert!(reader.root_object().unwrap().read_int(1).is_ok());
        assert!(reader.property_id("reading").is_err());
    }
}
