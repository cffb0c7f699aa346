use newton_package_reader::package::report::{self, DecodeOptions};
use newton_package_reader::{
    Alignment, ClassCode, ObjectEntry, ObjectRecord, PackageError, PackageFlags, PackageFormat,
    PackageReader, PartFlags, PartKind, TaggedRef,
};
use std::fs;
use std::path::PathBuf;

const HEADER_SIZE: usize = 52;
const PART_ENTRY_SIZE: usize = 32;

struct PartFixture {
    part_type: &'static [u8; 4],
    flags: u32,
    info: Option<&'static str>,
    data: Vec<u8>,
    /// Overrides the size written into the part table.
    declared_size: Option<u32>,
}

impl PartFixture {
    fn new(part_type: &'static [u8; 4], flags: u32, data: Vec<u8>) -> Self {
        Self {
            part_type,
            flags,
            info: None,
            data,
            declared_size: None,
        }
    }
}

struct PackageFixture {
    signature: &'static [u8; 8],
    flags: u32,
    copyright: &'static str,
    name: &'static str,
    creation_date: u32,
    parts: Vec<PartFixture>,
}

fn utf16_be_with_nul(text: &str) -> Vec<u8> {
    text.encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(|unit| unit.to_be_bytes())
        .collect()
}

fn push_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_be_bytes());
}

fn push_text_ref(buf: &mut Vec<u8>, (offset, length): (u16, u16)) {
    buf.extend_from_slice(&offset.to_be_bytes());
    buf.extend_from_slice(&length.to_be_bytes());
}

/// Lays out a package the way the Newton package builder does: header, part
/// table, string table padded to four bytes, then the parts back to back.
fn build_package(fixture: &PackageFixture) -> Vec<u8> {
    let mut strings = Vec::new();
    let mut add_string = |text: &str| -> (u16, u16) {
        let offset = strings.len() as u16;
        let encoded = utf16_be_with_nul(text);
        strings.extend_from_slice(&encoded);
        (offset, encoded.len() as u16)
    };
    let copyright = add_string(fixture.copyright);
    let name = add_string(fixture.name);
    let infos: Vec<(u16, u16)> = fixture
        .parts
        .iter()
        .map(|part| part.info.map(&mut add_string).unwrap_or((0, 0)))
        .collect();
    while strings.len() % 4 != 0 {
        strings.push(0);
    }

    let directory_size = HEADER_SIZE + PART_ENTRY_SIZE * fixture.parts.len() + strings.len();
    let data_len: usize = fixture.parts.iter().map(|p| p.data.len()).sum();
    let total = directory_size + data_len;

    let mut buf = Vec::new();
    buf.extend_from_slice(fixture.signature);
    push_u32(&mut buf, 0);
    push_u32(&mut buf, fixture.flags);
    push_u32(&mut buf, 1);
    push_text_ref(&mut buf, copyright);
    push_text_ref(&mut buf, name);
    push_u32(&mut buf, total as u32);
    push_u32(&mut buf, fixture.creation_date);
    push_u32(&mut buf, 0);
    push_u32(&mut buf, 0);
    push_u32(&mut buf, directory_size as u32);
    push_u32(&mut buf, fixture.parts.len() as u32);

    let mut offset = 0u32;
    for (part, info) in fixture.parts.iter().zip(&infos) {
        let size = part.declared_size.unwrap_or(part.data.len() as u32);
        push_u32(&mut buf, offset);
        push_u32(&mut buf, size);
        push_u32(&mut buf, size);
        buf.extend_from_slice(part.part_type);
        push_u32(&mut buf, 0);
        push_u32(&mut buf, part.flags);
        push_text_ref(&mut buf, *info);
        push_u32(&mut buf, 0);
        offset += part.data.len() as u32;
    }
    buf.extend_from_slice(&strings);
    assert_eq!(buf.len(), directory_size);

    for part in &fixture.parts {
        buf.extend_from_slice(&part.data);
    }
    buf
}

fn object_header(size: u32, format: u32) -> u32 {
    (size << 8) | format
}

/// A frame with two slots, a symbol and a four-byte aligned array.
fn form_part_data() -> Vec<u8> {
    let mut data = Vec::new();
    // Frame: map pointer + integer slot
    push_u32(&mut data, object_header(16, 0x43));
    push_u32(&mut data, 0);
    push_u32(&mut data, 0x0000_0011);
    push_u32(&mut data, 0x0000_00A8);
    // Symbol 'hello'
    push_u32(&mut data, object_header(22, 0x40));
    push_u32(&mut data, 0);
    push_u32(&mut data, ClassCode::SYMBOL.0);
    push_u32(&mut data, 0xCAFE_F00D);
    data.extend_from_slice(b"hello\0");
    data.extend_from_slice(&[0, 0]);
    // Array of one character
    push_u32(&mut data, object_header(16, 0x41));
    push_u32(&mut data, 0x1);
    push_u32(&mut data, ClassCode::NIL.0);
    push_u32(&mut data, 0x0000_041A);
    data
}

fn sample_package() -> PackageFixture {
    PackageFixture {
        signature: b"package0",
        flags: PackageFlags::NO_COMPRESSION,
        copyright: "(c) 1996",
        name: "Hello:DTS",
        creation_date: 86_400 * 33_000,
        parts: vec![PartFixture {
            info: Some("form part"),
            ..PartFixture::new(
                b"form",
                PartFlags::NOS_PART | PartFlags::AUTO_LOAD,
                form_part_data(),
            )
        }],
    }
}

fn render(reader: &PackageReader, options: &DecodeOptions) -> String {
    let mut out = Vec::new();
    report::write_report(&mut out, "test.pkg", reader, options).expect("write report");
    String::from_utf8(out).expect("report is utf-8")
}

#[test]
fn decodes_directory_and_strings() {
    let bytes = build_package(&sample_package());
    let reader = PackageReader::from_bytes(bytes.clone()).expect("open package");

    let header = reader.header();
    assert_eq!(header.signature_text(), "package0");
    assert_eq!(header.format(), PackageFormat::NoRelocation);
    assert_eq!(header.flags.names(), vec!["kNoCompressionFlag"]);
    assert_eq!(header.size as usize, bytes.len());
    assert_eq!(header.creation_days(), 33_000);
    assert_eq!(header.num_parts, 1);

    // Full declared length is decoded, terminator included.
    assert_eq!(reader.text(header.copyright).expect("copyright"), "(c) 1996\0");
    assert_eq!(reader.text(header.name).expect("name"), "Hello:DTS\0");

    let parts = reader.parts();
    assert_eq!(parts.len(), 1);
    assert_eq!(&parts[0].part_type.bytes(), b"form");
    assert_eq!(parts[0].flags.kind(), PartKind::Nos);
    assert_eq!(parts[0].size, parts[0].size2);
    assert_eq!(reader.text(parts[0].info).expect("info"), "form part\0");
    // 18 + 20 + 20 bytes of text, padded to 60.
    assert_eq!(reader.data_offset(), HEADER_SIZE + PART_ENTRY_SIZE + 60);
}

#[test]
fn decodes_object_stream_with_file_offsets() {
    let reader = PackageReader::from_bytes(build_package(&sample_package())).expect("open package");
    let base = reader.data_offset() as u64;

    let entries: Vec<ObjectEntry> = reader
        .objects(0)
        .expect("part 0")
        .collect::<Result<_, _>>()
        .expect("decode objects");

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].file_offset, base);
    assert_eq!(
        entries[0].record,
        ObjectRecord::Frame {
            size: 16,
            slots: vec![TaggedRef::Pointer(4), TaggedRef::Integer(42)],
        }
    );
    assert_eq!(entries[1].file_offset, base + 16);
    assert_eq!(
        entries[1].record,
        ObjectRecord::Binary {
            size: 22,
            class: ClassCode::SYMBOL,
            symbol: Some("hello".to_string()),
        }
    );
    // 22 bytes padded to 24.
    assert_eq!(entries[2].file_offset, base + 16 + 24);
    assert_eq!(
        entries[2].record,
        ObjectRecord::Array {
            size: 16,
            class: ClassCode::NIL,
            alignment: Alignment::Four,
            first: TaggedRef::Character(0x41),
        }
    );
}

#[test]
fn object_stream_restarts_on_each_call() {
    let reader = PackageReader::from_bytes(build_package(&sample_package())).expect("open package");
    let first: Vec<_> = reader.objects(0).expect("part 0").collect();
    let second: Vec<_> = reader.objects(0).expect("part 0").collect();
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.as_ref().expect("ok"), b.as_ref().expect("ok"));
    }
}

#[test]
fn relocation_flag_is_reported_not_decoded() {
    let mut fixture = sample_package();
    fixture.signature = b"package1";
    fixture.flags = PackageFlags::RELOCATION;
    let mut bytes = build_package(&fixture);
    // Garbage part table: it must never be read.
    bytes.truncate(HEADER_SIZE);

    match PackageReader::from_bytes(bytes) {
        Err(PackageError::UnsupportedRelocation { header }) => {
            assert_eq!(header.format(), PackageFormat::MayRelocate);
            assert_eq!(header.flags.names(), vec!["kRelocationFlag"]);
        }
        other => panic!("expected UnsupportedRelocation, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn malformed_part_does_not_stop_later_parts() {
    let mut bad = Vec::new();
    push_u32(&mut bad, object_header(8, 0x43));
    push_u32(&mut bad, 0);
    push_u32(&mut bad, object_header(8, 0x55));
    push_u32(&mut bad, 0);

    let mut fixture = sample_package();
    fixture.parts.insert(0, PartFixture::new(b"bad ", PartFlags::RAW_PART, bad));
    let reader = PackageReader::from_bytes(build_package(&fixture)).expect("open package");

    let results: Vec<_> = reader.objects(0).expect("part 0").collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    let err = results[1].as_ref().expect_err("second record is malformed");
    assert!(matches!(err, PackageError::MalformedObject { .. }));
    assert!(err.is_recoverable());

    let text = render(&reader, &DecodeOptions::default());
    assert!(text.contains("error: Malformed object"), "report:\n{}", text);
    assert!(text.contains("Part 1:"), "report:\n{}", text);
    assert!(text.contains("Symbol: 'hello'"), "report:\n{}", text);
}

#[test]
fn part_past_end_of_file_is_a_bounds_error() {
    let mut fixture = sample_package();
    fixture.parts[0].declared_size = Some(4096);
    let reader = PackageReader::from_bytes(build_package(&fixture)).expect("open package");

    match reader.objects(0) {
        Err(PackageError::OutOfBounds { context, .. }) => assert_eq!(context, "part data"),
        Err(e) => panic!("expected OutOfBounds, got {}", e),
        Ok(_) => panic!("expected OutOfBounds for oversized part"),
    }
    let text = render(&reader, &DecodeOptions::default());
    assert!(text.contains("error: Out of bounds reading part data"), "report:\n{}", text);
}

#[test]
fn truncated_record_inside_part_is_a_bounds_error() {
    let mut data = form_part_data();
    data.truncate(20);
    let mut fixture = sample_package();
    fixture.parts[0].data = data;
    let reader = PackageReader::from_bytes(build_package(&fixture)).expect("open package");

    let results: Vec<_> = reader.objects(0).expect("part 0").collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(PackageError::OutOfBounds { .. })));
}

#[test]
fn report_lists_header_parts_and_objects() {
    let reader = PackageReader::from_bytes(build_package(&sample_package())).expect("open package");
    let text = render(&reader, &DecodeOptions::default());

    for expected in [
        "    Signature: 'package0' (no relocation info, all Newton OS)",
        "        Flags: 0x10000000 kNoCompressionFlag",
        "    Copyright: (c) 1996",
        "         Name: Hello:DTS",
        "(Jan 4, 1904 + 33000 days)",
        "     numParts: 0x00000001 (1)",
        "Part 0:",
        "        Flags: 0x00000011 kNOSPart kAutoLoadFlag",
        "         Type: 'form'",
        "         Info: form part",
        "Type: Frame",
        "  Pointer: 0x00000004",
        "  Integer: 0x0000002A (42)",
        "Class: 0x00055552 (Symbol)",
        "Symbol: 'hello'",
        "Type: Array (0x10 (16) bytes, 4 byte aligned)",
        "  Character: 0x0041 'A'",
    ] {
        assert!(text.contains(expected), "missing {:?} in report:\n{}", expected, text);
    }
    let first_offset = format!("[file offset {:08X}]", reader.data_offset());
    assert!(text.contains(&first_offset), "report:\n{}", text);
}

#[test]
fn report_options_limit_object_output() {
    let reader = PackageReader::from_bytes(build_package(&sample_package())).expect("open package");

    let headers_only = render(
        &reader,
        &DecodeOptions { decode_objects: false, max_objects_per_part: None },
    );
    assert!(headers_only.contains("Part 0:"));
    assert!(!headers_only.contains("[file offset"));

    let limited = render(
        &reader,
        &DecodeOptions { decode_objects: true, max_objects_per_part: Some(1) },
    );
    assert_eq!(limited.matches("[file offset").count(), 1);
    assert!(limited.contains("... (2 more objects not shown)"), "report:\n{}", limited);
}

#[test]
fn object_limit_still_reports_decode_errors() {
    let mut data = Vec::new();
    push_u32(&mut data, object_header(8, 0x43));
    push_u32(&mut data, 0);
    push_u32(&mut data, object_header(8, 0x55));
    push_u32(&mut data, 0);

    let mut fixture = sample_package();
    fixture.parts[0].data = data;
    let reader = PackageReader::from_bytes(build_package(&fixture)).expect("open package");

    let text = render(
        &reader,
        &DecodeOptions { decode_objects: true, max_objects_per_part: Some(1) },
    );
    assert_eq!(text.matches("[file offset").count(), 1, "report:\n{}", text);
    assert!(text.contains("error: Malformed object"), "report:\n{}", text);
    assert!(!text.contains("not shown"), "report:\n{}", text);
}

#[test]
fn hidden_objects_are_counted_before_a_later_error() {
    let mut data = form_part_data();
    push_u32(&mut data, object_header(8, 0x55));
    push_u32(&mut data, 0);

    let mut fixture = sample_package();
    fixture.parts[0].data = data;
    let reader = PackageReader::from_bytes(build_package(&fixture)).expect("open package");

    let text = render(
        &reader,
        &DecodeOptions { decode_objects: true, max_objects_per_part: Some(1) },
    );
    let hidden = text.find("... (2 more objects not shown)").expect("hidden count line");
    let error = text.find("error: Malformed object").expect("error line");
    assert!(hidden < error, "report:\n{}", text);
}

#[test]
fn open_reads_package_from_disk() {
    let bytes = build_package(&sample_package());
    let mut path: PathBuf = std::env::temp_dir();
    path.push(format!("newtonpkg-open-test-{}.pkg", std::process::id()));
    fs::write(&path, &bytes).expect("write temp package");

    let result = PackageReader::open(&path);
    let _ = fs::remove_file(&path);
    let reader = result.expect("open package from disk");
    assert_eq!(reader.len(), bytes.len());
    assert_eq!(reader.parts().len(), 1);
}

#[test]
fn missing_file_is_an_io_error() {
    let result = PackageReader::open("/nonexistent/newtonpkg/missing.pkg");
    assert!(matches!(result, Err(PackageError::Io(_))));
}
