use crate::bundle::bytes::{Cursor, Endianness};
use crate::bundle::{BundleError, Compression, Result};

/// Outer envelope of an asset bundle with its two byte regions split out.
///
/// Borrowed from the input buffer; lives for one decode call.
#[derive(Debug, Clone)]
pub struct RawContainer<'a> {
	/// Leading identifier, always [`RawContainer::SIGNATURE`] once parsed.
	pub signature: String,
	/// Container format version.
	pub format_version: i32,
	/// Player version string (for example `5.x.x`).
	pub unity_version: String,
	/// Engine build that wrote the bundle (for example `2017.4.17f1`).
	pub generator_version: String,
	/// Declared total bundle size.
	pub file_size: i64,
	/// Compressed size of the block-info segment.
	pub compressed_block_info_size: u32,
	/// Decompressed size of the block-info segment.
	pub uncompressed_block_info_size: u32,
	/// Container flags; low bits select the block-info codec.
	pub flags: u32,
	/// Compressed block-info segment.
	pub block_info: &'a [u8],
	/// Data blocks holding every serialized asset.
	pub payload: &'a [u8],
}

impl RawContainer<'_> {
	/// Expected leading identifier.
	pub const SIGNATURE: &'static str = "UnityFS";
	/// Flag bit placing the block-info segment at the end of the buffer.
	pub const BLOCK_INFO_AT_END: u32 = 0x80;
	/// Format versions from this one on pad the header to 16 bytes.
	pub const ALIGNED_HEADER_VERSION: i32 = 7;

	/// Codec used for the block-info segment.
	pub fn block_info_compression(&self) -> Result<Compression> {
		Compression::from_flags(self.flags)
	}

	/// Return `true` when block info trails the data blocks.
	pub fn block_info_at_end(&self) -> bool {
		self.flags & Self::BLOCK_INFO_AT_END != 0
	}
}

/// Parse the container envelope, returning it and the offset where the payload begins.
pub fn read_header(buf: &[u8]) -> Result<(RawContainer<'_>, usize)> {
	let mut cursor = Cursor::new(buf);
	let signature = read_signature(&mut cursor, buf)?;

	let format_version = read_field(&mut cursor, "format_version", |c| c.read_i32(Endianness::Big))?;
	let unity_version = read_field(&mut cursor, "unity_version", Cursor::read_cstring)?;
	let generator_version = read_field(&mut cursor, "generator_version", Cursor::read_cstring)?;
	let file_size = read_field(&mut cursor, "file_size", |c| c.read_i64(Endianness::Big))?;
	let compressed_block_info_size = read_field(&mut cursor, "compressed_block_info_size", |c| c.read_u32(Endianness::Big))?;
	let uncompressed_block_info_size = read_field(&mut cursor, "uncompressed_block_info_size", |c| c.read_u32(Endianness::Big))?;
	let flags = read_field(&mut cursor, "flags", |c| c.read_u32(Endianness::Big))?;

	if format_version >= RawContainer::ALIGNED_HEADER_VERSION {
		read_field(&mut cursor, "header_padding", |c| c.align(16))?;
	}

	let info_len = compressed_block_info_size as usize;
	let (block_info, payload, consumed) = if flags & RawContainer::BLOCK_INFO_AT_END != 0 {
		let header_end = cursor.pos();
		let info_start = buf
			.len()
			.checked_sub(info_len)
			.filter(|start| *start >= header_end)
			.ok_or(BundleError::TruncatedHeader {
				field: "block_info",
				at: header_end,
			})?;
		(&buf[info_start..], &buf[header_end..info_start], header_end)
	} else {
		let block_info = read_field(&mut cursor, "block_info", |c| c.read_exact(info_len))?;
		let consumed = cursor.pos();
		(block_info, &buf[consumed..], consumed)
	};

	let container = RawContainer {
		signature,
		format_version,
		unity_version,
		generator_version,
		file_size,
		compressed_block_info_size,
		uncompressed_block_info_size,
		flags,
		block_info,
		payload,
	};
	Ok((container, consumed))
}

fn read_signature(cursor: &mut Cursor<'_>, buf: &[u8]) -> Result<String> {
	match cursor.read_cstring_bytes() {
		Ok(raw) if raw == RawContainer::SIGNATURE.as_bytes() => Ok(RawContainer::SIGNATURE.to_owned()),
		Ok(raw) => Err(bad_signature(raw)),
		Err(_) => Err(bad_signature(buf)),
	}
}

fn bad_signature(raw: &[u8]) -> BundleError {
	let shown = &raw[..raw.len().min(16)];
	BundleError::BadSignature {
		found: String::from_utf8_lossy(shown).into_owned(),
		expected: RawContainer::SIGNATURE,
	}
}

fn read_field<'a, T>(cursor: &mut Cursor<'a>, field: &'static str, read: impl FnOnce(&mut Cursor<'a>) -> Result<T>) -> Result<T> {
	let at = cursor.pos();
	read(cursor).map_err(|_| BundleError::TruncatedHeader { field, at })
}

#[cfg(test)]
mod tests;
