mod bytes;
mod compression;
mod decode;
mod directory;
mod error;
mod file;
mod header;
mod pipeline;
mod records;
mod serialized;
mod sprite;
mod texture;
mod typetree;
mod value;

/// Bounded byte cursor and byte-order selector.
pub use bytes::{Cursor, Endianness};
/// Block codecs and the raw LZ4 block decoder.
pub use compression::{Compression, decompress, decompress_lz4_block};
/// Type-tree driven object decoding entry points.
pub use decode::{decode_object, decode_value};
/// Block directory and storage node types.
pub use directory::{BlockDirectory, CompressionBlock, StorageNode};
/// Error and result aliases.
pub use error::{BundleError, Result};
/// Parsed bundle and structure summary.
pub use file::{AssetBundle, BundleInfo, ContainerInfo, DecodedObject};
/// Container envelope reader.
pub use header::{RawContainer, read_header};
/// End-to-end bundle decoding.
pub use pipeline::{BundleImages, decode_bundle, images_from_objects, inspect_bundle};
/// Domain records extracted from decoded values.
pub use records::{Sprite, SpriteRect, Texture2D};
/// Serialized file header and object table.
pub use serialized::{ObjectRecord, SerializedFile, SerializedHeader};
/// Sprite atlas extraction.
pub use sprite::extract_sprites;
/// Block-compressed texture decoding.
pub use texture::{Bitmap, NamedBitmap, TextureFormat, decode_texture};
/// Type metadata and type-tree representation.
pub use typetree::{COMMON_STRINGS, TypeMetadata, TypeNode, TypeTree, read_type_trees, resolve_name};
/// Decoded runtime value types.
pub use value::{FieldValue, PPtr, StructValue, Value};
