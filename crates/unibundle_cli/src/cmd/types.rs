use std::path::PathBuf;

use unibundle::bundle::{Result, TypeTree, inspect_bundle};

use crate::cmd::util::{emit_json, read_bundle};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long = "class")]
	pub class_id: Option<i32>,
	#[arg(long)]
	pub json: bool,
}

/// List type trees, or print the node tree of one class.
pub fn run(args: Args) -> Result<()> {
	let Args { path, class_id, json } = args;

	let bytes = read_bundle(&path)?;
	let info = inspect_bundle(&bytes)?;
	let trees: Vec<&TypeTree> = info
		.serialized
		.metadata
		.trees
		.iter()
		.filter(|tree| class_id.is_none_or(|id| tree.class_id == id))
		.collect();

	if json {
		let payload: Vec<TypeJson> = trees.iter().map(|tree| TypeJson::new(tree, class_id.is_some())).collect();
		return emit_json(&payload);
	}

	if class_id.is_none() {
		println!("types: {}", trees.len());
		for tree in &trees {
			println!("  {:>6} {} ({} nodes)", tree.class_id, tree.root_type_name(), tree.nodes.len());
		}
		return Ok(());
	}

	for tree in &trees {
		println!("class {}: {}", tree.class_id, tree.root_type_name());
		print_tree(tree, TypeTree::ROOT, 1);
	}
	Ok(())
}

fn print_tree(tree: &TypeTree, idx: usize, indent: usize) {
	let node = tree.node(idx);
	let mut marks = String::new();
	if node.is_array {
		marks.push_str(" [array]");
	}
	if node.post_align() {
		marks.push_str(" [align]");
	}
	println!("{}{} {}{marks}", "  ".repeat(indent), node.type_name(), node.name());
	for child in tree.children(idx) {
		print_tree(tree, *child, indent + 1);
	}
}

#[derive(serde::Serialize)]
struct TypeJson {
	class_id: i32,
	type_name: String,
	node_count: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	root: Option<NodeJson>,
}

#[derive(serde::Serialize)]
struct NodeJson {
	type_name: String,
	name: String,
	is_array: bool,
	align: bool,
	children: Vec<NodeJson>,
}

impl TypeJson {
	fn new(tree: &TypeTree, with_nodes: bool) -> Self {
		Self {
			class_id: tree.class_id,
			type_name: tree.root_type_name().to_owned(),
			node_count: tree.nodes.len(),
			root: with_nodes.then(|| NodeJson::new(tree, TypeTree::ROOT)),
		}
	}
}

impl NodeJson {
	fn new(tree: &TypeTree, idx: usize) -> Self {
		let node = tree.node(idx);
		Self {
			type_name: node.type_name().to_owned(),
			name: node.name().to_owned(),
			is_array: node.is_array,
			align: node.post_align(),
			children: tree.children(idx).iter().map(|child| Self::new(tree, *child)).collect(),
		}
	}
}
