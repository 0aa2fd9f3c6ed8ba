use std::path::{Path, PathBuf};

use unibundle::bundle::{BundleInfo, Result, inspect_bundle};

use crate::cmd::util::{emit_json, flags_hex, hex, read_bundle};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub json: bool,
}

/// Print container, directory, and serialized file summaries.
pub fn run(args: Args) -> Result<()> {
	let Args { path, json } = args;

	let bytes = read_bundle(&path)?;
	let info = inspect_bundle(&bytes)?;

	if json {
		return emit_json(&InfoJson::new(&path, &info));
	}

	let container = &info.container;
	println!("path: {}", path.display());
	println!("signature: {}", container.signature);
	println!("format_version: {}", container.format_version);
	println!("unity_version: {}", container.unity_version);
	println!("generator_version: {}", container.generator_version);
	println!("file_size: {}", container.file_size);
	println!("flags: {}", flags_hex(container.flags));
	println!(
		"block_info: {} {} -> {} bytes",
		container.block_info_compression.as_str(),
		container.compressed_block_info_size,
		container.uncompressed_block_info_size
	);
	println!("hash: {}", hex(&info.directory.hash));

	println!("blocks: {}", info.directory.blocks.len());
	for (idx, block) in info.directory.blocks.iter().enumerate() {
		let codec = block.compression().map(|codec| codec.as_str()).unwrap_or("unknown");
		println!("  {idx}: {codec} {} -> {}", block.compressed_size, block.uncompressed_size);
	}

	println!("nodes: {}", info.directory.nodes.len());
	for node in &info.directory.nodes {
		println!("  {} offset={} size={} status={}", node.name, node.offset, node.size, flags_hex(node.status));
	}

	let serialized = &info.serialized;
	println!("serialized_node: {}", info.serialized_node.name);
	println!("serialized_format: {}", serialized.header.format);
	println!("target_platform: {}", serialized.metadata.target_platform);
	println!("type_trees: {}", serialized.metadata.trees.len());
	println!("objects: {}", serialized.objects.len());
	for object in &serialized.objects {
		println!(
			"  {} {} class={} size={}",
			object.path_id,
			info.serialized.tree_for(object).map(|tree| tree.root_type_name()).unwrap_or("<no type tree>"),
			object.class_id,
			object.byte_size
		);
	}

	Ok(())
}

#[derive(serde::Serialize)]
struct InfoJson {
	path: String,
	signature: String,
	format_version: i32,
	unity_version: String,
	generator_version: String,
	file_size: i64,
	flags: u32,
	block_info_compression: &'static str,
	blocks: Vec<BlockJson>,
	nodes: Vec<NodeJson>,
	serialized_node: String,
	serialized_format: u32,
	target_platform: u32,
	objects: Vec<ObjectJson>,
}

#[derive(serde::Serialize)]
struct BlockJson {
	compression: &'static str,
	compressed_size: u32,
	uncompressed_size: u32,
}

#[derive(serde::Serialize)]
struct NodeJson {
	name: String,
	offset: i64,
	size: i64,
	status: u32,
}

#[derive(serde::Serialize)]
struct ObjectJson {
	path_id: i64,
	type_id: i32,
	class_id: i16,
	type_name: Option<String>,
	byte_size: u32,
}

impl InfoJson {
	fn new(path: &Path, info: &BundleInfo) -> Self {
		let metadata = &info.serialized.metadata;
		Self {
			path: path.display().to_string(),
			signature: info.container.signature.clone(),
			format_version: info.container.format_version,
			unity_version: info.container.unity_version.clone(),
			generator_version: info.container.generator_version.clone(),
			file_size: info.container.file_size,
			flags: info.container.flags,
			block_info_compression: info.container.block_info_compression.as_str(),
			blocks: info
				.directory
				.blocks
				.iter()
				.map(|block| BlockJson {
					compression: block.compression().map(|codec| codec.as_str()).unwrap_or("unknown"),
					compressed_size: block.compressed_size,
					uncompressed_size: block.uncompressed_size,
				})
				.collect(),
			nodes: info
				.directory
				.nodes
				.iter()
				.map(|node| NodeJson {
					name: node.name.clone(),
					offset: node.offset,
					size: node.size,
					status: node.status,
				})
				.collect(),
			serialized_node: info.serialized_node.name.clone(),
			serialized_format: info.serialized.header.format,
			target_platform: metadata.target_platform,
			objects: info
				.serialized
				.objects
				.iter()
				.map(|object| ObjectJson {
					path_id: object.path_id,
					type_id: object.type_id,
					class_id: object.class_id,
					type_name: info.serialized.tree_for(object).ok().map(|tree| tree.root_type_name().to_owned()),
					byte_size: object.byte_size,
				})
				.collect(),
		}
	}
}
