use crate::bundle::{BundleError, Compression, read_header};

fn envelope(signature: &[u8], format_version: i32, flags: u32, block_info: &[u8], payload: &[u8]) -> Vec<u8> {
	let mut out = Vec::new();
	out.extend_from_slice(signature);
	out.push(0);
	out.extend_from_slice(&format_version.to_be_bytes());
	out.extend_from_slice(b"5.x.x\0");
	out.extend_from_slice(b"2017.4.17f1\0");
	out.extend_from_slice(&1234_i64.to_be_bytes());
	out.extend_from_slice(&(block_info.len() as u32).to_be_bytes());
	out.extend_from_slice(&91_u32.to_be_bytes());
	out.extend_from_slice(&flags.to_be_bytes());
	if format_version >= 7 {
		while out.len() % 16 != 0 {
			out.push(0);
		}
	}
	if flags & 0x80 != 0 {
		out.extend_from_slice(payload);
		out.extend_from_slice(block_info);
	} else {
		out.extend_from_slice(block_info);
		out.extend_from_slice(payload);
	}
	out
}

#[test]
fn parses_big_endian_envelope() {
	let bytes = envelope(b"UnityFS", 6, 0x43, b"INFO", b"payload");
	let (container, consumed) = read_header(&bytes).expect("header parses");

	assert_eq!(container.signature, "UnityFS");
	assert_eq!(container.format_version, 6);
	assert_eq!(container.unity_version, "5.x.x");
	assert_eq!(container.generator_version, "2017.4.17f1");
	assert_eq!(container.file_size, 1234);
	assert_eq!(container.compressed_block_info_size, 4);
	assert_eq!(container.uncompressed_block_info_size, 91);
	assert_eq!(container.flags, 0x43);
	assert_eq!(container.block_info, b"INFO");
	assert_eq!(container.payload, b"payload");
	assert_eq!(consumed, bytes.len() - b"payload".len());
	assert_eq!(container.block_info_compression().expect("codec"), Compression::Lz4Hc);
}

#[test]
fn rejects_other_signatures() {
	let bytes = envelope(b"UnityWeb", 6, 0x43, b"INFO", b"");
	let err = read_header(&bytes).expect_err("wrong signature fails");
	assert!(matches!(err, BundleError::BadSignature { ref found, .. } if found == "UnityWeb"));

	let err = read_header(b"PNG").expect_err("unterminated garbage fails");
	assert!(matches!(err, BundleError::BadSignature { .. }));
}

#[test]
fn truncated_fixed_field_names_the_field() {
	let bytes = envelope(b"UnityFS", 6, 0x43, b"INFO", b"");
	// cut inside the compressed block-info size
	let cut = 8 + 4 + 6 + 12 + 8 + 2;
	let err = read_header(&bytes[..cut]).expect_err("short buffer fails");
	assert!(matches!(
		err,
		BundleError::TruncatedHeader {
			field: "compressed_block_info_size",
			..
		}
	));
}

#[test]
fn block_info_longer_than_buffer_is_truncated() {
	let mut bytes = envelope(b"UnityFS", 6, 0x43, b"INFO", b"");
	bytes.truncate(bytes.len() - 2);
	let err = read_header(&bytes).expect_err("block info overrun fails");
	assert!(matches!(err, BundleError::TruncatedHeader { field: "block_info", .. }));
}

#[test]
fn block_info_at_end_splits_payload_before_it() {
	let bytes = envelope(b"UnityFS", 6, 0xC3, b"INFO", b"payload");
	let (container, consumed) = read_header(&bytes).expect("header parses");
	assert!(container.block_info_at_end());
	assert_eq!(container.block_info, b"INFO");
	assert_eq!(container.payload, b"payload");
	assert_eq!(consumed, bytes.len() - b"payloadINFO".len());
}

#[test]
fn version_seven_pads_header_to_sixteen_bytes() {
	let bytes = envelope(b"UnityFS", 7, 0x43, b"INFO", b"xy");
	let (container, consumed) = read_header(&bytes).expect("aligned header parses");
	assert_eq!(container.block_info, b"INFO");
	assert_eq!(container.payload, b"xy");
	assert_eq!((consumed - 4) % 16, 0);
}
