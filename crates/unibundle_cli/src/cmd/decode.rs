use std::path::PathBuf;

use unibundle::bundle::{AssetBundle, BundleError, DecodedObject, Result};

use crate::cmd::print::{PrintOptions, print_value, value_to_json};
use crate::cmd::util::emit_json;

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long = "path-id", allow_hyphen_values = true)]
	pub path_id: Option<i64>,
	#[arg(long)]
	pub json: bool,
}

/// Decode one object, or every object with a type tree, and print it.
pub fn run(args: Args) -> Result<()> {
	let Args { path, path_id, json } = args;

	let bundle = AssetBundle::open(&path)?;
	let objects = match path_id {
		Some(path_id) => {
			let record = bundle
				.info
				.serialized
				.object(path_id)
				.ok_or(BundleError::ObjectNotFound { path_id })?;
			vec![bundle.decode_object(record)?]
		}
		None => bundle.decode_objects()?,
	};

	if json {
		let payload: Vec<ObjectJson> = objects.iter().map(ObjectJson::new).collect();
		return emit_json(&payload);
	}

	println!("path: {}", path.display());
	println!("objects: {}", objects.len());
	for object in &objects {
		println!(
			"object {} ({}, class {}, {} bytes):",
			object.record.path_id, object.type_name, object.record.class_id, object.record.byte_size
		);
		print_value(&object.value, PrintOptions::default());
	}

	Ok(())
}

#[derive(serde::Serialize)]
struct ObjectJson {
	path_id: i64,
	class_id: i16,
	type_name: String,
	value: serde_json::Value,
}

impl ObjectJson {
	fn new(object: &DecodedObject) -> Self {
		Self {
			path_id: object.record.path_id,
			class_id: object.record.class_id,
			type_name: object.type_name.to_string(),
			value: value_to_json(&object.value),
		}
	}
}
