use std::fs;
use std::path::Path;

use log::{debug, trace, warn};

use crate::bundle::compression::decompress;
use crate::bundle::decode::decode_object;
use crate::bundle::directory::{BlockDirectory, StorageNode};
use crate::bundle::header::{RawContainer, read_header};
use crate::bundle::serialized::{ObjectRecord, SerializedFile};
use crate::bundle::value::Value;
use crate::bundle::{BundleError, Compression, Result};

/// Owned summary of the container envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
	/// Leading identifier.
	pub signature: String,
	/// Container format version.
	pub format_version: i32,
	/// Player version string.
	pub unity_version: String,
	/// Engine build that wrote the bundle.
	pub generator_version: String,
	/// Declared total bundle size.
	pub file_size: i64,
	/// Compressed block-info size.
	pub compressed_block_info_size: u32,
	/// Decompressed block-info size.
	pub uncompressed_block_info_size: u32,
	/// Container flags.
	pub flags: u32,
	/// Block-info codec.
	pub block_info_compression: Compression,
}

impl ContainerInfo {
	fn from_raw(raw: &RawContainer<'_>) -> Result<Self> {
		Ok(Self {
			signature: raw.signature.clone(),
			format_version: raw.format_version,
			unity_version: raw.unity_version.clone(),
			generator_version: raw.generator_version.clone(),
			file_size: raw.file_size,
			compressed_block_info_size: raw.compressed_block_info_size,
			uncompressed_block_info_size: raw.uncompressed_block_info_size,
			flags: raw.flags,
			block_info_compression: raw.block_info_compression()?,
		})
	}
}

/// Structure of a bundle: envelope, block directory, and serialized file tables.
#[derive(Debug, Clone)]
pub struct BundleInfo {
	/// Container envelope.
	pub container: ContainerInfo,
	/// Block and node directory.
	pub directory: BlockDirectory,
	/// Node the serialized file was read from.
	pub serialized_node: StorageNode,
	/// Serialized file header, type trees, and object table.
	pub serialized: SerializedFile,
}

/// One object decoded through its type tree.
#[derive(Debug, Clone)]
pub struct DecodedObject {
	/// Object table entry.
	pub record: ObjectRecord,
	/// Root type name of the matching tree.
	pub type_name: Box<str>,
	/// Decoded value.
	pub value: Value,
}

/// Parsed bundle with its decompressed block data.
#[derive(Debug, Clone)]
pub struct AssetBundle {
	/// Parsed structure.
	pub info: BundleInfo,
	data: Vec<u8>,
}

impl AssetBundle {
	/// Read and parse a bundle file.
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let bytes = fs::read(path)?;
		Self::parse(&bytes)
	}

	/// Parse envelope, block directory, data blocks, and the serialized file.
	pub fn parse(bytes: &[u8]) -> Result<Self> {
		let (raw, _) = read_header(bytes)?;
		let container = ContainerInfo::from_raw(&raw)?;
		debug!(
			"container v{} ({}), block info {} {} -> {} bytes",
			container.format_version,
			container.generator_version,
			container.block_info_compression.as_str(),
			container.compressed_block_info_size,
			container.uncompressed_block_info_size
		);

		let block_info = decompress(container.block_info_compression, raw.block_info, container.uncompressed_block_info_size)?;
		let directory = BlockDirectory::parse(&block_info)?;
		debug!("directory: {} blocks, {} nodes", directory.blocks.len(), directory.nodes.len());

		let data = directory.read_blocks(raw.payload)?;
		let serialized_node = directory.serialized_file_node()?.clone();
		let serialized = SerializedFile::parse(directory.node_bytes(&data, &serialized_node)?)?;

		Ok(Self {
			info: BundleInfo {
				container,
				directory,
				serialized_node,
				serialized,
			},
			data,
		})
	}

	/// Drop block data, keeping the parsed structure.
	pub fn into_info(self) -> BundleInfo {
		self.info
	}

	/// Concatenated decompressed block data.
	pub fn data(&self) -> &[u8] {
		&self.data
	}

	/// Bytes of one storage node.
	pub fn node_bytes(&self, node: &StorageNode) -> Result<&[u8]> {
		self.info.directory.node_bytes(&self.data, node)
	}

	/// Bytes of the serialized file node.
	pub fn serialized_bytes(&self) -> Result<&[u8]> {
		self.node_bytes(&self.info.serialized_node)
	}

	/// Object table in file order.
	pub fn objects(&self) -> &[ObjectRecord] {
		&self.info.serialized.objects
	}

	/// Bytes of one object.
	pub fn object_bytes(&self, object: &ObjectRecord) -> Result<&[u8]> {
		self.info.serialized.object_bytes(self.serialized_bytes()?, object)
	}

	/// Decode one object through its type tree.
	pub fn decode_object(&self, object: &ObjectRecord) -> Result<DecodedObject> {
		let tree = self.info.serialized.tree_for(object)?;
		let value = decode_object(tree, self.object_bytes(object)?)?;
		trace!("object {} decoded as {}", object.path_id, tree.root_type_name());
		Ok(DecodedObject {
			record: *object,
			type_name: tree.root_type_name().into(),
			value,
		})
	}

	/// Decode every object; objects without a type tree are logged and skipped.
	pub fn decode_objects(&self) -> Result<Vec<DecodedObject>> {
		let mut out = Vec::with_capacity(self.objects().len());
		for object in self.objects() {
			match self.decode_object(object) {
				Ok(decoded) => out.push(decoded),
				Err(err @ BundleError::MissingTypeTree { .. }) => warn!("skipping object: {err}"),
				Err(err) => return Err(err),
			}
		}
		Ok(out)
	}
}

#[cfg(test)]
mod tests;
