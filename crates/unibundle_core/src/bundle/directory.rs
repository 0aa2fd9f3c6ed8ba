use log::debug;

use crate::bundle::bytes::{Cursor, Endianness};
use crate::bundle::compression::decompress;
use crate::bundle::{BundleError, Compression, Result};

/// One compressed data block of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionBlock {
	/// Size after decompression.
	pub uncompressed_size: u32,
	/// Size as stored in the payload.
	pub compressed_size: u32,
	/// Per-block flags; low bits select the codec.
	pub flags: u16,
}

impl CompressionBlock {
	/// Codec for this block.
	pub fn compression(&self) -> Result<Compression> {
		Compression::from_flags(u32::from(self.flags))
	}
}

/// One named logical file inside the decompressed block data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageNode {
	/// Byte offset into the concatenated block data.
	pub offset: i64,
	/// Byte length.
	pub size: i64,
	/// Status bits; `0x4` marks a serialized file.
	pub status: u32,
	/// Node name, for example `CAB-d441eef4839431472fb997a38d8cbd42`.
	pub name: String,
}

impl StorageNode {
	/// Status bit set on nodes that hold serialized objects.
	pub const SERIALIZED_FILE: u32 = 0x4;

	/// Return `true` when the node holds serialized objects.
	pub fn is_serialized_file(&self) -> bool {
		self.status & Self::SERIALIZED_FILE != 0
	}
}

/// Decompressed block-info segment: how the payload splits into blocks and nodes.
#[derive(Debug, Clone)]
pub struct BlockDirectory {
	/// Content hash of the uncompressed data.
	pub hash: [u8; 16],
	/// Data blocks in payload order.
	pub blocks: Vec<CompressionBlock>,
	/// Logical files in directory order.
	pub nodes: Vec<StorageNode>,
}

impl BlockDirectory {
	/// Parse a decompressed block-info segment.
	pub fn parse(bytes: &[u8]) -> Result<Self> {
		let mut cursor = Cursor::new(bytes);

		let mut hash = [0_u8; 16];
		hash.copy_from_slice(cursor.read_exact(16)?);

		let block_count = read_count(&mut cursor, "block")?;
		let mut blocks = Vec::with_capacity(block_count.min(cursor.remaining() / 10));
		for _ in 0..block_count {
			blocks.push(CompressionBlock {
				uncompressed_size: cursor.read_u32(Endianness::Big)?,
				compressed_size: cursor.read_u32(Endianness::Big)?,
				flags: cursor.read_u16(Endianness::Big)?,
			});
		}

		let node_count = read_count(&mut cursor, "node")?;
		let mut nodes = Vec::with_capacity(node_count.min(cursor.remaining() / 21));
		for _ in 0..node_count {
			nodes.push(StorageNode {
				offset: cursor.read_i64(Endianness::Big)?,
				size: cursor.read_i64(Endianness::Big)?,
				status: cursor.read_u32(Endianness::Big)?,
				name: cursor.read_cstring()?,
			});
		}

		let directory = Self { hash, blocks, nodes };
		directory.validate()?;
		Ok(directory)
	}

	/// Sum of decompressed block sizes.
	pub fn total_uncompressed(&self) -> usize {
		self.blocks.iter().map(|block| block.uncompressed_size as usize).sum()
	}

	/// Check that every node lies within the concatenated block data.
	pub fn validate(&self) -> Result<()> {
		let total = self.total_uncompressed();
		for node in &self.nodes {
			self.node_range(node, total)?;
		}
		Ok(())
	}

	/// Decompress every data block of `payload` in order and concatenate them.
	pub fn read_blocks(&self, payload: &[u8]) -> Result<Vec<u8>> {
		let mut cursor = Cursor::new(payload);
		let mut out = Vec::with_capacity(self.total_uncompressed().min(payload.len().saturating_mul(8)));
		for (idx, block) in self.blocks.iter().enumerate() {
			let compression = block.compression()?;
			let stored = cursor.read_exact(block.compressed_size as usize)?;
			debug!(
				"block {idx}: {} {} -> {} bytes",
				compression.as_str(),
				block.compressed_size,
				block.uncompressed_size
			);
			out.extend_from_slice(&decompress(compression, stored, block.uncompressed_size)?);
		}
		Ok(out)
	}

	/// Pick the node holding serialized objects: first flagged node, else the first node.
	pub fn serialized_file_node(&self) -> Result<&StorageNode> {
		self.nodes
			.iter()
			.find(|node| node.is_serialized_file())
			.or_else(|| self.nodes.first())
			.ok_or(BundleError::NoSerializedFile)
	}

	/// Slice one node out of data produced by [`BlockDirectory::read_blocks`].
	pub fn node_bytes<'d>(&self, data: &'d [u8], node: &StorageNode) -> Result<&'d [u8]> {
		let range = self.node_range(node, data.len())?;
		Ok(&data[range])
	}

	fn node_range(&self, node: &StorageNode, total: usize) -> Result<std::ops::Range<usize>> {
		let out_of_range = || BundleError::NodeOutOfRange {
			name: node.name.clone(),
			offset: node.offset,
			size: node.size,
			total,
		};
		let start = usize::try_from(node.offset).map_err(|_| out_of_range())?;
		let size = usize::try_from(node.size).map_err(|_| out_of_range())?;
		let end = start.checked_add(size).filter(|end| *end <= total).ok_or_else(out_of_range)?;
		Ok(start..end)
	}
}

fn read_count(cursor: &mut Cursor<'_>, kind: &'static str) -> Result<usize> {
	let at = cursor.pos();
	let count = cursor.read_i32(Endianness::Big)?;
	usize::try_from(count).map_err(|_| BundleError::CorruptBlock {
		reason: format!("negative {kind} count {count} at offset {at}"),
	})
}
