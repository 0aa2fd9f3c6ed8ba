use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, BundleError>;

/// Errors produced while reading and decoding asset bundles.
#[derive(Debug, Error)]
pub enum BundleError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Leading identifier is not the expected container signature.
	#[error("bad signature {found:?} (expected {expected:?})")]
	BadSignature {
		/// Signature text actually found (lossy).
		found: String,
		/// Expected signature literal.
		expected: &'static str,
	},
	/// A fixed-width envelope field ran past the buffer end.
	#[error("truncated header while reading {field} at offset {at}")]
	TruncatedHeader {
		/// Envelope field being read.
		field: &'static str,
		/// Byte offset where the read was attempted.
		at: usize,
	},
	/// Compressed stream was truncated or inconsistent.
	#[error("corrupt block: {reason}")]
	CorruptBlock {
		/// Decoder-supplied description.
		reason: String,
	},
	/// Block codec is recognized but not decodable here.
	#[error("unsupported compression {code} ({label})")]
	UnsupportedCompression {
		/// Raw codec number from the flag bits.
		code: u32,
		/// Stable codec label.
		label: &'static str,
	},
	/// Type metadata is inconsistent with the buffer or its own depth encoding.
	#[error("malformed type tree: {reason}")]
	MalformedTypeTree {
		/// What went wrong.
		reason: String,
	},
	/// A read would exceed the declared record bounds.
	#[error("buffer overrun at offset {at}, need {need} bytes, remaining {rem}")]
	BufferOverrun {
		/// Byte offset where the read was attempted.
		at: usize,
		/// Requested bytes.
		need: usize,
		/// Bytes still available.
		rem: usize,
	},
	/// Serialized file declares a big-endian payload.
	#[error("unsupported serialized file endianness marker {marker}")]
	UnsupportedEndianness {
		/// Raw endianness marker.
		marker: u32,
	},
	/// A storage node lies outside the decompressed block data.
	#[error("storage node {name:?} at {offset}+{size} exceeds block data of {total} bytes")]
	NodeOutOfRange {
		/// Node name.
		name: String,
		/// Declared node offset.
		offset: i64,
		/// Declared node size.
		size: i64,
		/// Total decompressed block bytes.
		total: usize,
	},
	/// The block directory has no storage node to read objects from.
	#[error("bundle contains no serialized file node")]
	NoSerializedFile,
	/// Object table has no entry with the requested path id.
	#[error("object {path_id} not found")]
	ObjectNotFound {
		/// Requested path id.
		path_id: i64,
	},
	/// No type tree matches an object by type id or class id.
	#[error("no type tree for object {path_id} (type id {type_id}, class id {class_id})")]
	MissingTypeTree {
		/// Object path id.
		path_id: i64,
		/// Object type id.
		type_id: i32,
		/// Object class id.
		class_id: i16,
	},
	/// Decoded record lacks a required field.
	#[error("missing field {field} on {type_name}")]
	MissingField {
		/// Record type name.
		type_name: String,
		/// Missing field name.
		field: &'static str,
	},
	/// Decoded field has an unexpected value kind.
	#[error("field {field} on {type_name}: expected {expected}, got {got}")]
	FieldTypeMismatch {
		/// Record type name.
		type_name: String,
		/// Field name.
		field: &'static str,
		/// Expected logical value kind.
		expected: &'static str,
		/// Actual logical value kind.
		got: &'static str,
	},
	/// Texture pixel format is neither DXT1 nor DXT5.
	#[error("unsupported pixel format {code}")]
	UnsupportedPixelFormat {
		/// Raw texture format code.
		code: i32,
	},
	/// Sprite geometry cannot be cut from the atlas.
	#[error("unsupported sprite geometry for {name:?}: {reason}")]
	UnsupportedGeometry {
		/// Sprite name.
		name: String,
		/// Why the sprite was rejected.
		reason: &'static str,
	},
	/// Decoding finished without any 2D texture object.
	#[error("no Texture2D object found in bundle")]
	NoTextureFound,
	/// Requested sprite name is not present in the bundle.
	#[error("sprite not found: {name}")]
	SpriteNotFound {
		/// Requested sprite name.
		name: String,
	},
}
