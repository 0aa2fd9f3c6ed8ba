use log::debug;

use crate::bundle::bytes::{Cursor, Endianness};
use crate::bundle::typetree::{TypeMetadata, TypeTree};
use crate::bundle::{BundleError, Result};

/// Fixed big-endian prefix of a serialized file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializedHeader {
	/// Size of the metadata section.
	pub metadata_size: u32,
	/// Declared file size.
	pub file_size: u32,
	/// Serialized format version.
	pub format: u32,
	/// Offset of the object data region from the file start.
	pub data_offset: u32,
	/// Endianness marker; only 0 (little-endian) is supported.
	pub endianness: u32,
}

impl SerializedHeader {
	/// Read the header at the start of a serialized file.
	pub fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
		let header = Self {
			metadata_size: cursor.read_u32(Endianness::Big)?,
			file_size: cursor.read_u32(Endianness::Big)?,
			format: cursor.read_u32(Endianness::Big)?,
			data_offset: cursor.read_u32(Endianness::Big)?,
			endianness: cursor.read_u32(Endianness::Big)?,
		};
		if header.endianness != 0 {
			return Err(BundleError::UnsupportedEndianness { marker: header.endianness });
		}
		Ok(header)
	}
}

/// One entry of the object table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectRecord {
	/// Object identifier within the file.
	pub path_id: i64,
	/// Start of the object bytes, relative to the header's data offset.
	pub byte_start: u32,
	/// Length of the object bytes.
	pub byte_size: u32,
	/// Type id used for the first type-tree lookup.
	pub type_id: i32,
	/// Class id used as the fallback type-tree lookup.
	pub class_id: i16,
	/// Script type slot, -1 for built-in classes.
	pub script_type_index: i16,
	/// Stripped marker byte.
	pub stripped: u8,
}

/// Parsed serialized file: header, type metadata, and object table.
#[derive(Debug, Clone)]
pub struct SerializedFile {
	/// Fixed header.
	pub header: SerializedHeader,
	/// Type metadata with one tree per class.
	pub metadata: TypeMetadata,
	/// Object table in file order.
	pub objects: Vec<ObjectRecord>,
}

impl SerializedFile {
	/// Parse header, type metadata, and object table of a serialized file.
	pub fn parse(bytes: &[u8]) -> Result<Self> {
		let mut cursor = Cursor::new(bytes);
		let header = SerializedHeader::read(&mut cursor)?;
		let metadata = TypeMetadata::read(&mut cursor)?;

		let count = cursor.read_u32(Endianness::Little)? as usize;
		let mut objects = Vec::with_capacity(count.min(cursor.remaining() / 25));
		for _ in 0..count {
			cursor.align4()?;
			objects.push(ObjectRecord {
				path_id: cursor.read_i64(Endianness::Little)?,
				byte_start: cursor.read_u32(Endianness::Little)?,
				byte_size: cursor.read_u32(Endianness::Little)?,
				type_id: cursor.read_i32(Endianness::Little)?,
				class_id: cursor.read_i16(Endianness::Little)?,
				script_type_index: cursor.read_i16(Endianness::Little)?,
				stripped: cursor.read_u8()?,
			});
		}

		debug!(
			"serialized file format {} ({}): {} type trees, {} objects",
			header.format,
			metadata.generator_version,
			metadata.trees.len(),
			objects.len()
		);

		Ok(Self { header, metadata, objects })
	}

	/// Type tree for `object`: match by type id first, then by class id.
	pub fn tree_for(&self, object: &ObjectRecord) -> Result<&TypeTree> {
		self.metadata
			.tree_by_type_id(object.type_id)
			.or_else(|| self.metadata.tree_by_class_id(object.class_id))
			.ok_or(BundleError::MissingTypeTree {
				path_id: object.path_id,
				type_id: object.type_id,
				class_id: object.class_id,
			})
	}

	/// Slice the bytes of `object` out of the whole serialized file.
	pub fn object_bytes<'d>(&self, bytes: &'d [u8], object: &ObjectRecord) -> Result<&'d [u8]> {
		let start = (self.header.data_offset as usize).saturating_add(object.byte_start as usize);
		let size = object.byte_size as usize;
		if start > bytes.len() {
			return Err(BundleError::BufferOverrun {
				at: start,
				need: size,
				rem: 0,
			});
		}
		Cursor::at(bytes, start).read_exact(size)
	}

	/// Find an object by path id.
	pub fn object(&self, path_id: i64) -> Option<&ObjectRecord> {
		self.objects.iter().find(|object| object.path_id == path_id)
	}
}
