use crate::bundle::{BundleError, Result};

/// Block codec selected by the low six bits of a flag word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
	/// Stored without compression.
	None,
	/// LZMA stream.
	Lzma,
	/// LZ4 block.
	Lz4,
	/// LZ4 high-compression block (same wire format as LZ4).
	Lz4Hc,
	/// LZHAM stream.
	Lzham,
}

impl Compression {
	/// Flag bits holding the codec number.
	pub const MASK: u32 = 0x3F;

	/// Pick the codec from a container or block flag word.
	pub fn from_flags(flags: u32) -> Result<Self> {
		match flags & Self::MASK {
			0 => Ok(Self::None),
			1 => Ok(Self::Lzma),
			2 => Ok(Self::Lz4),
			3 => Ok(Self::Lz4Hc),
			4 => Ok(Self::Lzham),
			code => Err(BundleError::UnsupportedCompression { code, label: "unknown" }),
		}
	}

	/// Render codec as a stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Lzma => "lzma",
			Self::Lz4 => "lz4",
			Self::Lz4Hc => "lz4hc",
			Self::Lzham => "lzham",
		}
	}

	fn code(self) -> u32 {
		match self {
			Self::None => 0,
			Self::Lzma => 1,
			Self::Lz4 => 2,
			Self::Lz4Hc => 3,
			Self::Lzham => 4,
		}
	}
}

/// Decode one segment with `compression`, producing exactly `decompressed_size` bytes.
pub fn decompress(compression: Compression, compressed: &[u8], decompressed_size: u32) -> Result<Vec<u8>> {
	let compressed_size = u32::try_from(compressed.len()).map_err(|_| BundleError::CorruptBlock {
		reason: format!("segment of {} bytes is too large", compressed.len()),
	})?;

	match compression {
		Compression::None => {
			if compressed_size != decompressed_size {
				return Err(BundleError::CorruptBlock {
					reason: format!("stored segment has {compressed_size} bytes, expected {decompressed_size}"),
				});
			}
			Ok(compressed.to_vec())
		}
		Compression::Lz4 | Compression::Lz4Hc => decompress_lz4_block(compressed, compressed_size, decompressed_size),
		Compression::Lzma | Compression::Lzham => Err(BundleError::UnsupportedCompression {
			code: compression.code(),
			label: compression.as_str(),
		}),
	}
}

/// Inflate a raw LZ4 block (no frame header) of `compressed_size` bytes.
pub fn decompress_lz4_block(compressed: &[u8], compressed_size: u32, decompressed_size: u32) -> Result<Vec<u8>> {
	let input = compressed.get(..compressed_size as usize).ok_or_else(|| BundleError::CorruptBlock {
		reason: format!("declared {compressed_size} compressed bytes, only {} present", compressed.len()),
	})?;

	let mut out = vec![0_u8; decompressed_size as usize];
	let written = lz4_flex::block::decompress_into(input, &mut out).map_err(|err| BundleError::CorruptBlock { reason: err.to_string() })?;
	if written != out.len() {
		return Err(BundleError::CorruptBlock {
			reason: format!("lz4 block produced {written} bytes, expected {decompressed_size}"),
		});
	}

	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::{Compression, decompress, decompress_lz4_block};
	use crate::bundle::BundleError;

	#[test]
	fn flags_select_codec_from_low_bits() {
		assert_eq!(Compression::from_flags(0x43).expect("lz4hc"), Compression::Lz4Hc);
		assert_eq!(Compression::from_flags(0x40).expect("none"), Compression::None);
		assert!(matches!(
			Compression::from_flags(0x3F),
			Err(BundleError::UnsupportedCompression { code: 0x3F, .. })
		));
	}

	#[test]
	fn literal_only_block_inflates() {
		let mut block = vec![0x50];
		block.extend_from_slice(b"hello");
		let out = decompress_lz4_block(&block, block.len() as u32, 5).expect("literal block decodes");
		assert_eq!(out, b"hello");
	}

	#[test]
	fn compressed_block_round_trips_through_dispatch() {
		let raw: Vec<u8> = b"texture atlas ".iter().copied().cycle().take(600).collect();
		let packed = lz4_flex::block::compress(&raw);
		assert!(packed.len() < raw.len());

		let out = decompress(Compression::Lz4, &packed, raw.len() as u32).expect("round trip");
		assert_eq!(out, raw);
	}

	#[test]
	fn back_reference_before_output_start_is_corrupt() {
		// zero literals, then a match at distance 5 with nothing written yet
		let block = [0x04, 0x05, 0x00];
		let err = decompress_lz4_block(&block, 3, 8).expect_err("bad offset fails");
		assert!(matches!(err, BundleError::CorruptBlock { .. }));
	}

	#[test]
	fn truncated_and_short_streams_are_corrupt() {
		let mut block = vec![0x50];
		block.extend_from_slice(b"hel");
		assert!(matches!(decompress_lz4_block(&block, 4, 5), Err(BundleError::CorruptBlock { .. })));
		assert!(matches!(decompress_lz4_block(&block, 9, 5), Err(BundleError::CorruptBlock { .. })));

		let mut full = vec![0x50];
		full.extend_from_slice(b"hello");
		assert!(matches!(decompress_lz4_block(&full, 6, 9), Err(BundleError::CorruptBlock { .. })));
	}

	#[test]
	fn stored_and_unsupported_codecs() {
		assert_eq!(decompress(Compression::None, b"abc", 3).expect("stored copy"), b"abc");
		assert!(matches!(decompress(Compression::None, b"abc", 4), Err(BundleError::CorruptBlock { .. })));
		assert!(matches!(
			decompress(Compression::Lzma, b"abc", 3),
			Err(BundleError::UnsupportedCompression { code: 1, label: "lzma" })
		));
	}
}
