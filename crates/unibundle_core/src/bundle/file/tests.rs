use unibundle_testkit::{
	BundleBuilder, Codec, SPRITE_CLASS, SerializedFileBuilder, TEXTURE2D_CLASS, ValueWriter, atlas_bundle, sprite_class, sprite_object,
	texture2d_class,
};

use crate::bundle::{AssetBundle, BundleError, Compression, Value};

#[test]
fn synthetic_bundle_structure() {
	let bytes = atlas_bundle();
	let bundle = AssetBundle::parse(&bytes).expect("bundle parses");
	let info = &bundle.info;

	assert_eq!(info.container.signature, "UnityFS");
	assert_eq!(info.container.format_version, 6);
	assert_eq!(info.container.file_size, bytes.len() as i64);
	assert_eq!(info.container.block_info_compression, Compression::Lz4Hc);
	assert_eq!(info.directory.nodes.len(), 1);
	assert!(info.serialized_node.is_serialized_file());
	assert_eq!(info.serialized.header.format, 17);
	assert_eq!(info.serialized.metadata.trees.len(), 2);
	assert_eq!(bundle.objects().len(), 4);
	assert_eq!(bundle.data().len(), info.directory.total_uncompressed());
}

#[test]
fn objects_decode_through_their_trees() {
	let bytes = atlas_bundle();
	let bundle = AssetBundle::parse(&bytes).expect("bundle parses");

	let texture = bundle.decode_object(&bundle.objects()[0]).expect("texture decodes");
	assert_eq!(&*texture.type_name, "Texture2D");
	let fields = texture.value.as_struct().expect("texture struct");
	assert_eq!(fields.get("m_Name").and_then(Value::as_str), Some("atlas"));
	assert_eq!(fields.get("m_Width"), Some(&Value::I32(8)));
	assert_eq!(fields.get("image data").and_then(Value::as_bytes).map(<[u8]>::len), Some(32));

	let sprite = bundle.decode_object(&bundle.objects()[2]).expect("sprite decodes");
	let fields = sprite.value.as_struct().expect("sprite struct");
	assert_eq!(fields.get("m_Name").and_then(Value::as_str), Some("green"));
	let Some(Value::Array(tags)) = fields.get("m_AtlasTags") else {
		panic!("atlas tags decode as an array");
	};
	assert_eq!(tags[0].as_str(), Some("ui"));
	assert!(matches!(fields.get("m_SpriteAtlas"), Some(Value::PPtr(_))));
}

#[test]
fn objects_without_tree_are_skipped() {
	let bytes = atlas_bundle();
	let bundle = AssetBundle::parse(&bytes).expect("bundle parses");

	assert!(matches!(
		bundle.decode_object(&bundle.objects()[3]),
		Err(BundleError::MissingTypeTree { path_id: 4, .. })
	));
	let decoded = bundle.decode_objects().expect("decode skips unknown classes");
	let ids: Vec<i64> = decoded.iter().map(|object| object.record.path_id).collect();
	assert_eq!(ids, [1, 2, 3]);
}

#[test]
fn multi_block_stored_payload_with_trailing_block_info() {
	let file = SerializedFileBuilder::default()
		.class(texture2d_class())
		.object(7, TEXTURE2D_CLASS, ValueWriter::new().string("x").finish());
	let bytes = BundleBuilder {
		format_version: 7,
		block_info_codec: Codec::None,
		data_codec: Codec::None,
		block_size: 64,
		block_info_at_end: true,
		..BundleBuilder::default()
	}
	.node("CAB-extra.resS", 0, vec![0xCD; 10])
	.serialized("CAB-main", &file)
	.build();

	let bundle = AssetBundle::parse(&bytes).expect("bundle parses");
	assert!(bundle.info.directory.blocks.len() > 1);
	assert_eq!(bundle.info.serialized_node.name, "CAB-main");
	assert_eq!(bundle.objects()[0].path_id, 7);
	assert_eq!(bundle.node_bytes(&bundle.info.directory.nodes[0]).expect("resource node"), [0xCD; 10]);
}

#[test]
fn truncated_object_surfaces_buffer_overrun() {
	let mut body = sprite_object("cut", [0.0, 0.0, 1.0, 1.0], false);
	body.truncate(20);
	let file = SerializedFileBuilder::default().class(sprite_class()).object(1, SPRITE_CLASS, body);
	let bytes = BundleBuilder::default().serialized("CAB-cut", &file).build();

	let bundle = AssetBundle::parse(&bytes).expect("bundle parses");
	assert!(matches!(bundle.decode_objects(), Err(BundleError::BufferOverrun { .. })));
}

#[test]
fn corrupt_block_info_is_reported() {
	let mut bytes = atlas_bundle();
	// declared decompressed block-info size lives at offset 42
	let declared = u32::from_be_bytes([bytes[42], bytes[43], bytes[44], bytes[45]]);
	bytes[42..46].copy_from_slice(&(declared + 1).to_be_bytes());
	assert!(matches!(AssetBundle::parse(&bytes), Err(BundleError::CorruptBlock { .. })));
}

#[test]
fn open_reads_from_disk() {
	let dir = tempfile::tempdir().expect("temp dir");
	let path = dir.path().join("atlas.bundle");
	std::fs::write(&path, atlas_bundle()).expect("write bundle");

	let bundle = AssetBundle::open(&path).expect("bundle opens");
	assert_eq!(bundle.objects().len(), 4);
	assert!(matches!(AssetBundle::open(dir.path().join("missing")), Err(BundleError::Io(_))));
}
