//! Container level behaviour over synthetic files

mod common;

use common::{header, legacy_body, true_body, X3fBuilder};
use std::io::Cursor;
use x3f::{
    ExtendedType, Header, Payload, SectionKind, TypeFormat, Version, X3fError, X3fFile,
};

#[test]
fn test_header_roundtrip_is_byte_exact() {
    for version in [Version::V2_0, Version::V2_1, Version::new(2, 3)] {
        let original = header(version, 2640, 1760);
        let mut bytes = Vec::new();
        original.write(&mut bytes).unwrap();

        let parsed = Header::parse(&bytes).unwrap();
        assert_eq!(parsed, original);

        let mut again = Vec::new();
        parsed.write(&mut again).unwrap();
        assert_eq!(again, bytes);
    }
}

#[test]
fn test_extended_header_values() {
    let data = X3fBuilder::new(Version::V2_1).build();
    let file = X3fFile::open(Cursor::new(data)).unwrap();
    let extended = file.header().extended.as_ref().unwrap();
    assert_eq!(extended.white_balance(), "Daylight");
    let adjustments: Vec<_> = extended.adjustments().collect();
    assert_eq!(adjustments, vec![(ExtendedType::from(1), 0.5)]);
}

#[test]
fn test_property_list_pairs_in_order() {
    let data = X3fBuilder::new(Version::V2_0)
        .property_list(&[("Make", "Sigma"), ("Model", "SD1")])
        .build();
    let file = X3fFile::from_bytes(data).unwrap();
    let index = file.find_property_list().unwrap();
    let list = file.property_list(index).unwrap();

    let pairs: Vec<_> = list.iter().collect();
    assert_eq!(pairs, vec![("Make", "Sigma"), ("Model", "SD1")]);
}

#[test]
fn test_unsupported_format_leaves_file_usable() {
    let data = X3fBuilder::new(Version::V2_0)
        .image(TypeFormat::new(9, 9), 4, 4, 0, &[0; 64])
        .property_list(&[("Make", "Sigma")])
        .build();
    let file = X3fFile::from_bytes(data).unwrap();

    assert!(matches!(
        file.image(0),
        Err(X3fError::UnsupportedFormat {
            image_type: 9,
            format: 9
        })
    ));
    assert!(file.payload(0).is_none());

    assert_eq!(file.property_list(1).unwrap().get("Make"), Some("Sigma"));
    assert!(matches!(file.payload(1), Some(Payload::PropertyList(_))));
    // The failed entry is retried, not remembered
    assert!(file.image(0).is_err());
}

#[test]
fn test_finders_pick_first_match() {
    let data = X3fBuilder::new(Version::V2_0)
        .image(TypeFormat::THUMB_JPEG, 0, 0, 0, &[0xff, 0xd8, 0xff, 0xd9])
        .image(TypeFormat::THUMB_PLAIN, 1, 1, 3, &[1, 2, 3])
        .image(
            TypeFormat::RAW_TRUE,
            1,
            1,
            0,
            &true_body(512, [&[0], &[0], &[0]]),
        )
        .image(
            TypeFormat::RAW_HUFFMAN_10BIT,
            1,
            1,
            0,
            &legacy_body(&[vec![0, 1, 2]]),
        )
        .camf(5, [0; 4], &[])
        .build();
    let file = X3fFile::from_bytes(data).unwrap();

    assert_eq!(file.find_thumb_jpeg(), Some(0));
    assert_eq!(file.find_thumb_plain(), Some(1));
    assert_eq!(file.find_raw(), Some(2));
    assert_eq!(file.find_image(TypeFormat::RAW_HUFFMAN_10BIT), Some(3));
    assert_eq!(file.find_camf(), Some(4));
    assert_eq!(file.find_thumb_huffman(), None);
    assert_eq!(file.find_property_list(), None);
    assert_eq!(file.entries()[4].kind(), SectionKind::Camf);
}

#[test]
fn test_unknown_sections_are_skipped() {
    let data = X3fBuilder::new(Version::V2_0)
        .unknown_section(&[0; 16])
        .property_list(&[("ISO", "100")])
        .build();
    let file = X3fFile::from_bytes(data).unwrap();
    assert_eq!(file.entries().len(), 1);
    assert_eq!(file.property_list(0).unwrap().get("ISO"), Some("100"));
}

#[test]
fn test_section_bytes_are_undecoded() {
    let body = [0xff, 0xd8, 0x01, 0x02, 0xff, 0xd9];
    let data = X3fBuilder::new(Version::V2_0)
        .image(TypeFormat::THUMB_JPEG, 0, 0, 0, &body)
        .build();
    let file = X3fFile::from_bytes(data).unwrap();
    let section = file.section_bytes(0).unwrap();
    assert_eq!(&section[..4], b"IMA2");
    assert!(section.ends_with(&body));
    assert_eq!(file.image(0).unwrap().jpeg(), Some(&body[..]));
}

#[test]
fn test_bad_magic_is_fatal() {
    let mut data = X3fBuilder::new(Version::V2_0).build();
    data[0] = b'X';
    assert!(matches!(
        X3fFile::from_bytes(data),
        Err(X3fError::BadMagic { offset: 0, .. })
    ));
}

#[test]
fn test_truncated_file_is_fatal() {
    let data = X3fBuilder::new(Version::V2_0)
        .property_list(&[("Make", "Sigma")])
        .build();
    let truncated = data[..data.len() - 9].to_vec();
    assert!(X3fFile::from_bytes(truncated).is_err());
}

#[test]
fn test_info_listing_survives_broken_sections() {
    use common::{camf_entry, camf_text};

    let data = X3fBuilder::new(Version::V2_1)
        .property_list(&[("Make", "Sigma"), ("Model", "SD1")])
        .camf(3, [0; 4], &camf_entry(b"CMbT", "Comment", &camf_text("hi")))
        .camf(4, [0, 0, u32::MAX, u32::MAX], &[0; 8])
        .build();
    let file = X3fFile::from_bytes(data).unwrap();

    let mut out = Vec::new();
    x3f::write_info(&file, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("version: 2.1"));
    assert!(text.contains("white balance: Daylight"));
    assert!(text.contains("ExposureAdjust: 0.5"));
    assert!(text.contains("directory: 3 entries"));
    assert!(text.contains("Make = Sigma"));
    assert!(text.contains("Model = SD1"));
    assert!(text.contains("Text Comment"));
    assert!(text.contains("unreadable:"));
}
