//! Shared test helpers for workspace crates: writers for synthetic asset bundles.

/// Meta flag requesting 4-byte alignment after a node's value.
pub const ALIGN: i32 = 0x4000;

/// Texture format code for DXT1.
pub const DXT1: i32 = 10;

/// Texture format code for DXT5.
pub const DXT5: i32 = 12;

/// RGB565 red.
pub const RED: u16 = 0xF800;
/// RGB565 green.
pub const GREEN: u16 = 0x07E0;
/// RGB565 blue.
pub const BLUE: u16 = 0x001F;
/// RGB565 white.
pub const WHITE: u16 = 0xFFFF;

/// One type-tree node row.
#[derive(Debug, Clone)]
pub struct NodeSpec {
	/// Nesting level.
	pub depth: u8,
	/// Type name.
	pub type_name: String,
	/// Field name.
	pub name: String,
	/// Array marker flag.
	pub is_array: bool,
	/// Meta flags.
	pub flags: i32,
}

impl NodeSpec {
	/// Set the alignment flag.
	pub fn aligned(mut self) -> Self {
		self.flags |= ALIGN;
		self
	}

	/// Set the array marker flag.
	pub fn array(mut self) -> Self {
		self.is_array = true;
		self
	}
}

/// Node row at `depth` with type and field name.
pub fn node(depth: u8, type_name: &str, name: &str) -> NodeSpec {
	NodeSpec {
		depth,
		type_name: type_name.to_owned(),
		name: name.to_owned(),
		is_array: false,
		flags: 0,
	}
}

/// Rows of a `string` field: the string node plus its aligned char array.
pub fn string_nodes(depth: u8, name: &str) -> Vec<NodeSpec> {
	vec![
		node(depth, "string", name),
		node(depth + 1, "Array", "Array").array().aligned(),
		node(depth + 2, "int", "size"),
		node(depth + 2, "char", "data"),
	]
}

/// Type tree of one class.
#[derive(Debug, Clone)]
pub struct ClassSpec {
	/// Class id.
	pub class_id: i32,
	/// Node rows in pre-order.
	pub nodes: Vec<NodeSpec>,
}

impl ClassSpec {
	/// Append the serialized class entry; every name goes into the local string buffer.
	pub fn write(&self, out: &mut Vec<u8>) {
		let mut strings = Vec::new();
		let mut intern = |text: &str| {
			let offset = strings.len() as i32;
			strings.extend_from_slice(text.as_bytes());
			strings.push(0);
			offset
		};

		let mut rows = Vec::with_capacity(self.nodes.len() * 24);
		for (idx, spec) in self.nodes.iter().enumerate() {
			rows.extend_from_slice(&1_i16.to_le_bytes());
			rows.push(spec.depth);
			rows.push(u8::from(spec.is_array));
			rows.extend_from_slice(&intern(&spec.type_name).to_le_bytes());
			rows.extend_from_slice(&intern(&spec.name).to_le_bytes());
			rows.extend_from_slice(&(-1_i32).to_le_bytes());
			rows.extend_from_slice(&(idx as u32).to_le_bytes());
			rows.extend_from_slice(&spec.flags.to_le_bytes());
		}

		out.extend_from_slice(&self.class_id.to_le_bytes());
		out.extend(std::iter::repeat_n(0, if self.class_id < 0 { 0x20 } else { 0x10 }));
		out.extend_from_slice(&(self.nodes.len() as u32).to_le_bytes());
		out.extend_from_slice(&(strings.len() as u32).to_le_bytes());
		out.extend_from_slice(&rows);
		out.extend_from_slice(&strings);
	}
}

/// Little-endian object body writer with 4-byte alignment relative to the object start.
#[derive(Debug, Clone, Default)]
pub struct ValueWriter {
	bytes: Vec<u8>,
}

impl ValueWriter {
	/// Empty writer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Pad with zeros to the next multiple of 4.
	pub fn align4(&mut self) -> &mut Self {
		while self.bytes.len() % 4 != 0 {
			self.bytes.push(0);
		}
		self
	}

	/// Write one byte.
	pub fn u8(&mut self, value: u8) -> &mut Self {
		self.bytes.push(value);
		self
	}

	/// Write a bool byte.
	pub fn bool(&mut self, value: bool) -> &mut Self {
		self.u8(u8::from(value))
	}

	/// Write an `i32`.
	pub fn i32(&mut self, value: i32) -> &mut Self {
		self.bytes.extend_from_slice(&value.to_le_bytes());
		self
	}

	/// Write a `u32`.
	pub fn u32(&mut self, value: u32) -> &mut Self {
		self.bytes.extend_from_slice(&value.to_le_bytes());
		self
	}

	/// Write an `i64`.
	pub fn i64(&mut self, value: i64) -> &mut Self {
		self.bytes.extend_from_slice(&value.to_le_bytes());
		self
	}

	/// Align, then write an `f32`.
	pub fn f32(&mut self, value: f32) -> &mut Self {
		self.align4();
		self.bytes.extend_from_slice(&value.to_le_bytes());
		self
	}

	/// Write a length-prefixed string followed by alignment.
	pub fn string(&mut self, value: &str) -> &mut Self {
		self.byte_array(value.as_bytes())
	}

	/// Write a length-prefixed byte array followed by alignment.
	pub fn byte_array(&mut self, value: &[u8]) -> &mut Self {
		self.u32(value.len() as u32);
		self.bytes.extend_from_slice(value);
		self.align4()
	}

	/// Write an object reference.
	pub fn pptr(&mut self, file_id: i32, path_id: i64) -> &mut Self {
		self.i32(file_id).i64(path_id)
	}

	/// Finished object bytes.
	pub fn finish(&mut self) -> Vec<u8> {
		std::mem::take(&mut self.bytes)
	}
}

/// One object table entry with its body.
#[derive(Debug, Clone)]
pub struct ObjectSpec {
	/// Path id.
	pub path_id: i64,
	/// Type id.
	pub type_id: i32,
	/// Class id.
	pub class_id: i16,
	/// Object body.
	pub data: Vec<u8>,
}

/// Writer for a little-endian serialized file.
#[derive(Debug, Clone)]
pub struct SerializedFileBuilder {
	/// Engine build string.
	pub generator_version: String,
	/// Endianness marker written to the header.
	pub endianness: u32,
	/// Type trees.
	pub classes: Vec<ClassSpec>,
	/// Objects in table order.
	pub objects: Vec<ObjectSpec>,
}

impl Default for SerializedFileBuilder {
	fn default() -> Self {
		Self {
			generator_version: "2017.4.17f1".to_owned(),
			endianness: 0,
			classes: Vec::new(),
			objects: Vec::new(),
		}
	}
}

impl SerializedFileBuilder {
	/// Add a type tree.
	pub fn class(mut self, class: ClassSpec) -> Self {
		self.classes.push(class);
		self
	}

	/// Add an object whose type id equals its class id.
	pub fn object(mut self, path_id: i64, class_id: i16, data: Vec<u8>) -> Self {
		self.objects.push(ObjectSpec {
			path_id,
			type_id: i32::from(class_id),
			class_id,
			data,
		});
		self
	}

	/// Serialize header, type metadata, object table, and object data.
	pub fn build(&self) -> Vec<u8> {
		let mut out = vec![0; 20];

		out.extend_from_slice(self.generator_version.as_bytes());
		out.push(0);
		out.extend_from_slice(&5_u32.to_le_bytes());
		out.push(1);
		out.extend_from_slice(&(self.classes.len() as i32).to_le_bytes());
		for class in &self.classes {
			class.write(&mut out);
		}

		out.extend_from_slice(&(self.objects.len() as u32).to_le_bytes());
		let mut starts = Vec::with_capacity(self.objects.len());
		let mut next = 0_u32;
		for object in &self.objects {
			pad_to(&mut out, 4);
			starts.push(next);
			out.extend_from_slice(&object.path_id.to_le_bytes());
			out.extend_from_slice(&next.to_le_bytes());
			out.extend_from_slice(&(object.data.len() as u32).to_le_bytes());
			out.extend_from_slice(&object.type_id.to_le_bytes());
			out.extend_from_slice(&object.class_id.to_le_bytes());
			out.extend_from_slice(&(-1_i16).to_le_bytes());
			out.push(0);
			next = (next + object.data.len() as u32).next_multiple_of(8);
		}
		let metadata_size = out.len() as u32 - 20;

		pad_to(&mut out, 16);
		let data_offset = out.len() as u32;
		for (object, start) in self.objects.iter().zip(starts) {
			out.resize(data_offset as usize + start as usize, 0);
			out.extend_from_slice(&object.data);
		}

		let file_size = out.len() as u32;
		out[0..4].copy_from_slice(&metadata_size.to_be_bytes());
		out[4..8].copy_from_slice(&file_size.to_be_bytes());
		out[8..12].copy_from_slice(&17_u32.to_be_bytes());
		out[12..16].copy_from_slice(&data_offset.to_be_bytes());
		out[16..20].copy_from_slice(&self.endianness.to_be_bytes());
		out
	}
}

/// Block codec used by [`BundleBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
	/// Stored.
	None,
	/// LZ4 block.
	Lz4,
	/// LZ4HC flag with an LZ4 block body.
	Lz4Hc,
}

impl Codec {
	fn code(self) -> u32 {
		match self {
			Self::None => 0,
			Self::Lz4 => 2,
			Self::Lz4Hc => 3,
		}
	}

	fn encode(self, raw: &[u8]) -> Vec<u8> {
		match self {
			Self::None => raw.to_vec(),
			Self::Lz4 | Self::Lz4Hc => lz4_flex::block::compress(raw),
		}
	}
}

/// Storage node written by [`BundleBuilder`].
#[derive(Debug, Clone)]
pub struct StorageSpec {
	/// Node name.
	pub name: String,
	/// Status bits.
	pub status: u32,
	/// Node bytes.
	pub bytes: Vec<u8>,
}

/// Writer for a complete UnityFS container.
#[derive(Debug, Clone)]
pub struct BundleBuilder {
	/// Container format version.
	pub format_version: i32,
	/// Codec of the block-info segment.
	pub block_info_codec: Codec,
	/// Codec of every data block.
	pub data_codec: Codec,
	/// Maximum uncompressed bytes per data block.
	pub block_size: usize,
	/// Place block info after the data blocks.
	pub block_info_at_end: bool,
	/// Storage nodes in directory order.
	pub nodes: Vec<StorageSpec>,
}

impl Default for BundleBuilder {
	fn default() -> Self {
		Self {
			format_version: 6,
			block_info_codec: Codec::Lz4Hc,
			data_codec: Codec::Lz4,
			block_size: 0x2_0000,
			block_info_at_end: false,
			nodes: Vec::new(),
		}
	}
}

impl BundleBuilder {
	/// Add a storage node.
	pub fn node(mut self, name: &str, status: u32, bytes: Vec<u8>) -> Self {
		self.nodes.push(StorageSpec {
			name: name.to_owned(),
			status,
			bytes,
		});
		self
	}

	/// Add a node flagged as a serialized file.
	pub fn serialized(self, name: &str, file: &SerializedFileBuilder) -> Self {
		self.node(name, 0x4, file.build())
	}

	/// Serialize the container.
	pub fn build(&self) -> Vec<u8> {
		let data: Vec<u8> = self.nodes.iter().flat_map(|node| node.bytes.iter().copied()).collect();
		let chunks: Vec<&[u8]> = if data.is_empty() {
			Vec::new()
		} else {
			data.chunks(self.block_size.max(1)).collect()
		};

		let mut info = vec![0_u8; 16];
		let mut payload = Vec::new();
		info.extend_from_slice(&(chunks.len() as i32).to_be_bytes());
		for chunk in &chunks {
			let packed = self.data_codec.encode(chunk);
			info.extend_from_slice(&(chunk.len() as u32).to_be_bytes());
			info.extend_from_slice(&(packed.len() as u32).to_be_bytes());
			info.extend_from_slice(&(self.data_codec.code() as u16 | 0x40).to_be_bytes());
			payload.extend_from_slice(&packed);
		}
		info.extend_from_slice(&(self.nodes.len() as i32).to_be_bytes());
		let mut offset = 0_i64;
		for node in &self.nodes {
			info.extend_from_slice(&offset.to_be_bytes());
			info.extend_from_slice(&(node.bytes.len() as i64).to_be_bytes());
			info.extend_from_slice(&node.status.to_be_bytes());
			info.extend_from_slice(node.name.as_bytes());
			info.push(0);
			offset += node.bytes.len() as i64;
		}
		let packed_info = self.block_info_codec.encode(&info);

		let mut flags = self.block_info_codec.code() | 0x40;
		if self.block_info_at_end {
			flags |= 0x80;
		}

		let mut out = b"UnityFS\0".to_vec();
		out.extend_from_slice(&self.format_version.to_be_bytes());
		out.extend_from_slice(b"5.x.x\0");
		out.extend_from_slice(b"2017.4.17f1\0");
		let size_at = out.len();
		out.extend_from_slice(&0_i64.to_be_bytes());
		out.extend_from_slice(&(packed_info.len() as u32).to_be_bytes());
		out.extend_from_slice(&(info.len() as u32).to_be_bytes());
		out.extend_from_slice(&flags.to_be_bytes());
		if self.format_version >= 7 {
			pad_to(&mut out, 16);
		}
		if self.block_info_at_end {
			out.extend_from_slice(&payload);
			out.extend_from_slice(&packed_info);
		} else {
			out.extend_from_slice(&packed_info);
			out.extend_from_slice(&payload);
		}

		let total = out.len() as i64;
		out[size_at..size_at + 8].copy_from_slice(&total.to_be_bytes());
		out
	}
}

fn pad_to(out: &mut Vec<u8>, align: usize) {
	while out.len() % align != 0 {
		out.push(0);
	}
}

/// Class id of 2D textures.
pub const TEXTURE2D_CLASS: i16 = 28;
/// Class id of sprites.
pub const SPRITE_CLASS: i16 = 213;

/// Texture2D type tree covering the fields a real player build emits around the pixel data.
pub fn texture2d_class() -> ClassSpec {
	let mut nodes = vec![node(0, "Texture2D", "Base")];
	nodes.extend(string_nodes(1, "m_Name"));
	nodes.extend([
		node(1, "int", "m_ForcedFallbackFormat"),
		node(1, "bool", "m_DownscaleFallback").aligned(),
		node(1, "int", "m_Width"),
		node(1, "int", "m_Height"),
		node(1, "int", "m_CompleteImageSize"),
		node(1, "int", "m_TextureFormat"),
		node(1, "int", "m_MipCount"),
		node(1, "bool", "m_IsReadable"),
		node(1, "bool", "m_StreamingMipmaps").aligned(),
		node(1, "int", "m_ImageCount"),
		node(1, "GLTextureSettings", "m_TextureSettings"),
		node(2, "int", "m_FilterMode"),
		node(2, "float", "m_MipBias"),
		node(1, "TypelessData", "image data").array().aligned(),
		node(2, "int", "size"),
		node(2, "UInt8", "data"),
		node(1, "StreamingInfo", "m_StreamData"),
		node(2, "unsigned int", "offset"),
		node(2, "unsigned int", "size"),
	]);
	nodes.extend(string_nodes(2, "path"));
	ClassSpec {
		class_id: i32::from(TEXTURE2D_CLASS),
		nodes,
	}
}

/// Object body matching [`texture2d_class`].
pub fn texture2d_object(name: &str, width: i32, height: i32, format: i32, data: &[u8]) -> Vec<u8> {
	ValueWriter::new()
		.string(name)
		.i32(-1)
		.bool(false)
		.align4()
		.i32(width)
		.i32(height)
		.i32(data.len() as i32)
		.i32(format)
		.i32(1)
		.bool(false)
		.bool(false)
		.align4()
		.i32(1)
		.i32(1)
		.f32(0.0)
		.byte_array(data)
		.u32(0)
		.u32(0)
		.string("")
		.finish()
}

/// Sprite type tree with rect, polygon flag, render key pair, atlas tags, and atlas reference.
pub fn sprite_class() -> ClassSpec {
	let mut nodes = vec![node(0, "Sprite", "Base")];
	nodes.extend(string_nodes(1, "m_Name"));
	nodes.extend([
		node(1, "Rectf", "m_Rect"),
		node(2, "float", "x"),
		node(2, "float", "y"),
		node(2, "float", "width"),
		node(2, "float", "height"),
		node(1, "Vector2f", "m_Offset"),
		node(2, "float", "x"),
		node(2, "float", "y"),
		node(1, "float", "m_PixelsToUnits"),
		node(1, "bool", "m_IsPolygon").aligned(),
		node(1, "pair", "m_RenderDataKey"),
		node(2, "GUID", "first"),
		node(3, "unsigned int", "data[0]"),
		node(3, "unsigned int", "data[1]"),
		node(3, "unsigned int", "data[2]"),
		node(3, "unsigned int", "data[3]"),
		node(2, "SInt64", "second"),
		node(1, "vector", "m_AtlasTags"),
		node(2, "Array", "Array").array().aligned(),
		node(3, "int", "size"),
	]);
	nodes.extend(string_nodes(3, "data"));
	nodes.extend([
		node(1, "PPtr<SpriteAtlas>", "m_SpriteAtlas"),
		node(2, "int", "m_FileID"),
		node(2, "SInt64", "m_PathID"),
	]);
	ClassSpec {
		class_id: i32::from(SPRITE_CLASS),
		nodes,
	}
}

/// Object body matching [`sprite_class`]; `rect` is `[x, y, width, height]`.
pub fn sprite_object(name: &str, rect: [f32; 4], is_polygon: bool) -> Vec<u8> {
	let mut writer = ValueWriter::new();
	writer.string(name);
	for v in rect {
		writer.f32(v);
	}
	writer
		.f32(0.0)
		.f32(0.0)
		.f32(100.0)
		.bool(is_polygon)
		.align4()
		.u32(0x1111)
		.u32(0x2222)
		.u32(0x3333)
		.u32(0x4444)
		.i64(21300000)
		.u32(1)
		.string("ui")
		.pptr(0, 0)
		.finish()
}

/// DXT1 block filled with one RGB565 color.
pub fn dxt1_solid_block(color: u16) -> [u8; 8] {
	let [lo, hi] = color.to_le_bytes();
	[lo, hi, lo, hi, 0, 0, 0, 0]
}

/// 8x8 DXT1 atlas data: stored quadrants red, green (first four rows), blue, white.
pub fn quadrant_atlas_data() -> Vec<u8> {
	[RED, GREEN, BLUE, WHITE].into_iter().flat_map(dxt1_solid_block).collect()
}

/// Bundle holding an 8x8 DXT1 atlas named `atlas`, sprites `blue` and `green`,
/// and one object whose class has no type tree.
pub fn atlas_bundle() -> Vec<u8> {
	let file = SerializedFileBuilder::default()
		.class(texture2d_class())
		.class(sprite_class())
		.object(1, TEXTURE2D_CLASS, texture2d_object("atlas", 8, 8, DXT1, &quadrant_atlas_data()))
		.object(2, SPRITE_CLASS, sprite_object("blue", [0.0, 0.0, 4.0, 4.0], false))
		.object(3, SPRITE_CLASS, sprite_object("green", [4.0, 4.0, 4.0, 4.0], false))
		.object(4, 1, ValueWriter::new().i32(0).finish());
	BundleBuilder::default()
		.serialized("CAB-5e5bfa8c1b34d0cd0ac1b6c8a5b4e0a1", &file)
		.build()
}
