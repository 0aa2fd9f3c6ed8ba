#![allow(missing_docs)]

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use unibundle_testkit::{
	BundleBuilder, Codec, DXT1, DXT5, RED, SPRITE_CLASS, SerializedFileBuilder, TEXTURE2D_CLASS, atlas_bundle, quadrant_atlas_data,
	sprite_class, sprite_object, texture2d_class, texture2d_object,
};

#[test]
fn info_text_lists_objects() {
	let dir = tempfile::tempdir().expect("temp dir");
	let bundle = write(dir.path(), "atlas.bundle", &atlas_bundle());
	let output = run(&["info", &bundle]);
	assert!(output.status.success());

	let stdout = String::from_utf8_lossy(&output.stdout);
	assert!(stdout.contains("signature: UnityFS"));
	assert!(stdout.contains("objects: 4"));
	assert!(stdout.contains("  1 Texture2D class=28"));
	assert!(stdout.contains("  4 <no type tree> class=1"));
}

#[test]
fn export_dxt5_bundle_with_trailing_block_info() {
	let dir = tempfile::tempdir().expect("temp dir");
	let [lo, hi] = RED.to_le_bytes();
	let block = [255, 0, 0, 0, 0, 0, 0, 0, lo, hi, lo, hi, 0, 0, 0, 0];
	let file = SerializedFileBuilder::default()
		.class(texture2d_class())
		.class(sprite_class())
		.object(7, TEXTURE2D_CLASS, texture2d_object("tile", 4, 4, DXT5, &block))
		.object(8, SPRITE_CLASS, sprite_object("tile_full", [0.0, 0.0, 4.0, 4.0], false));
	let bytes = BundleBuilder {
		format_version: 7,
		block_info_codec: Codec::Lz4,
		data_codec: Codec::None,
		block_info_at_end: true,
		..BundleBuilder::default()
	}
	.serialized("CAB-tile", &file)
	.build();
	let bundle = write(dir.path(), "tile.bundle", &bytes);

	let out = dir.path().join("out");
	let out_arg = out.to_string_lossy().into_owned();
	let json = run_json(&["export", &bundle, "--out", &out_arg, "--json"]);
	assert_eq!(json["texture"], "tile");
	assert_eq!(json["files"].as_array().map(Vec::len), Some(2));

	let texture = image::open(out.join("tile.png")).expect("texture png").to_rgba8();
	let sprite = image::open(out.join("tile_tile_full.png")).expect("sprite png").to_rgba8();
	assert_eq!(texture.dimensions(), (4, 4));
	assert!(texture.pixels().all(|pixel| pixel.0 == [255, 0, 0, 255]));
	assert_eq!(texture.as_raw(), sprite.as_raw());
}

#[test]
fn bad_signature_exits_with_error() {
	let dir = tempfile::tempdir().expect("temp dir");
	let bundle = write(dir.path(), "junk.bundle", b"UnityWeb\0not a bundle at all");
	let output = run(&["export", &bundle]);

	assert_eq!(output.status.code(), Some(1));
	assert!(error_line(&output).starts_with("error: bad signature"));
}

#[test]
fn missing_file_exits_with_io_error() {
	let dir = tempfile::tempdir().expect("temp dir");
	let missing = dir.path().join("absent.bundle").to_string_lossy().into_owned();
	let output = run(&["info", &missing]);

	assert_eq!(output.status.code(), Some(1));
	assert!(error_line(&output).starts_with("error: io:"));
}

#[test]
fn info_json_reports_container_and_objects() {
	let dir = tempfile::tempdir().expect("temp dir");
	let bundle = write(dir.path(), "atlas.bundle", &atlas_bundle());
	let json = run_json(&["info", &bundle, "--json"]);

	assert_eq!(json["signature"], "UnityFS");
	assert_eq!(json["block_info_compression"], "lz4hc");
	assert!(json["blocks"].as_array().is_some_and(|blocks| !blocks.is_empty()));
	assert_eq!(json["nodes"][0]["status"], 4);

	let objects = json["objects"].as_array().expect("objects array");
	assert_eq!(objects.len(), 4);
	assert_eq!(objects[0]["type_name"], "Texture2D");
	assert_eq!(objects[1]["type_name"], "Sprite");
	assert!(objects[3]["type_name"].is_null());
}

#[test]
fn types_json_lists_every_class() {
	let dir = tempfile::tempdir().expect("temp dir");
	let bundle = write(dir.path(), "atlas.bundle", &atlas_bundle());
	let json = run_json(&["types", &bundle, "--json"]);

	let types = json.as_array().expect("types array");
	assert_eq!(types.len(), 2);
	assert_eq!(types[0]["class_id"], 28);
	assert_eq!(types[0]["type_name"], "Texture2D");
	assert_eq!(types[1]["type_name"], "Sprite");
	assert!(types[0].get("root").is_none());
}

#[test]
fn types_class_prints_node_tree() {
	let dir = tempfile::tempdir().expect("temp dir");
	let bundle = write(dir.path(), "atlas.bundle", &atlas_bundle());
	let output = run(&["types", &bundle, "--class", "213"]);
	assert!(output.status.success());

	let stdout = String::from_utf8_lossy(&output.stdout);
	assert!(stdout.starts_with("class 213: Sprite"));
	assert!(stdout.contains("    Rectf m_Rect\n"));
	assert!(stdout.contains("      Array Array [array] [align]\n"));
	assert!(stdout.contains("      SInt64 m_PathID\n"));
}

#[test]
fn decode_json_single_object() {
	let dir = tempfile::tempdir().expect("temp dir");
	let bundle = write(dir.path(), "atlas.bundle", &atlas_bundle());
	let json = run_json(&["decode", &bundle, "--path-id", "2", "--json"]);

	let objects = json.as_array().expect("objects array");
	assert_eq!(objects.len(), 1);
	let sprite = &objects[0];
	assert_eq!(sprite["type_name"], "Sprite");
	assert_eq!(sprite["value"]["fields"]["m_Name"], "blue");
	assert_eq!(sprite["value"]["fields"]["m_Rect"]["fields"]["width"], 4.0);
	assert_eq!(sprite["value"]["fields"]["m_IsPolygon"], false);
}

#[test]
fn decode_all_skips_objects_without_tree() {
	let dir = tempfile::tempdir().expect("temp dir");
	let bundle = write(dir.path(), "atlas.bundle", &atlas_bundle());
	let output = run(&["decode", &bundle, "--json"]);
	assert!(output.status.success());

	let json: Value = serde_json::from_slice(&output.stdout).expect("stdout should be valid json");
	let ids: Vec<i64> = json
		.as_array()
		.expect("objects array")
		.iter()
		.filter_map(|object| object["path_id"].as_i64())
		.collect();
	assert_eq!(ids, [1, 2, 3]);
	assert_eq!(json[0]["value"]["fields"]["image data"]["bytes"], 32);

	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(
		stderr.contains("skipping object: no type tree for object 4 (type id 1, class id 1)"),
		"unexpected stderr: {stderr}"
	);
}

#[test]
fn decode_unknown_path_id_fails() {
	let dir = tempfile::tempdir().expect("temp dir");
	let bundle = write(dir.path(), "atlas.bundle", &atlas_bundle());
	let output = run(&["decode", &bundle, "--path-id", "99"]);

	assert_eq!(output.status.code(), Some(1));
	assert_eq!(error_line(&output), "error: object 99 not found");
}

#[test]
fn export_writes_texture_and_sprites() {
	let dir = tempfile::tempdir().expect("temp dir");
	let bundle = write(dir.path(), "atlas.bundle", &atlas_bundle());
	let out = dir.path().join("png");
	let out_arg = out.to_string_lossy().into_owned();
	let json = run_json(&["export", &bundle, "--out", &out_arg, "--json"]);

	assert_eq!(json["texture"], "atlas");
	let names: Vec<&str> = json["files"]
		.as_array()
		.expect("files array")
		.iter()
		.filter_map(|file| file["name"].as_str())
		.collect();
	assert_eq!(names, ["atlas", "blue", "green"]);

	let blue = image::open(out.join("atlas_blue.png")).expect("blue sprite png").to_rgba8();
	assert_eq!(blue.dimensions(), (4, 4));
	assert_eq!(blue.get_pixel(0, 0).0, [0, 0, 255, 255]);

	let atlas = image::open(out.join("atlas.png")).expect("atlas png").to_rgba8();
	assert_eq!(atlas.dimensions(), (8, 8));
	assert_eq!(atlas.get_pixel(0, 0).0, [255, 0, 0, 255]);
}

#[test]
fn export_single_sprite_uses_name_override() {
	let dir = tempfile::tempdir().expect("temp dir");
	let bundle = write(dir.path(), "atlas.bundle", &atlas_bundle());
	let out_arg = dir.path().to_string_lossy().into_owned();
	let output = run(&["export", &bundle, "--out", &out_arg, "--name", "icons", "--sprite", "green"]);
	assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

	let green = image::open(dir.path().join("icons_green.png")).expect("green sprite png").to_rgba8();
	assert!(green.pixels().all(|pixel| pixel.0 == [0, 255, 0, 255]));
	assert!(!dir.path().join("icons.png").exists());
}

#[test]
fn export_missing_sprite_fails() {
	let dir = tempfile::tempdir().expect("temp dir");
	let bundle = write(dir.path(), "atlas.bundle", &atlas_bundle());
	let out_arg = dir.path().to_string_lossy().into_owned();
	let output = run(&["export", &bundle, "--out", &out_arg, "--sprite", "sword"]);

	assert_eq!(output.status.code(), Some(1));
	assert_eq!(error_line(&output), "error: sprite not found: sword");
}

#[test]
fn export_keeps_hostile_sprite_names_inside_out_dir() {
	let dir = tempfile::tempdir().expect("temp dir");
	let file = SerializedFileBuilder::default()
		.class(texture2d_class())
		.class(sprite_class())
		.object(1, TEXTURE2D_CLASS, texture2d_object("atlas", 8, 8, DXT1, &quadrant_atlas_data()))
		.object(2, SPRITE_CLASS, sprite_object("x/../../escaped", [0.0, 0.0, 4.0, 4.0], false))
		.object(3, SPRITE_CLASS, sprite_object("..", [4.0, 4.0, 4.0, 4.0], false));
	let bytes = BundleBuilder::default().serialized("CAB-hostile", &file).build();
	let bundle = write(dir.path(), "hostile.bundle", &bytes);

	let out = dir.path().join("a").join("b");
	// a matching prefix directory would let `..` resolve upwards
	std::fs::create_dir_all(out.join("hostile_x")).expect("prefix dir");
	let out_arg = out.to_string_lossy().into_owned();
	let json = run_json(&["export", &bundle, "--out", &out_arg, "--json"]);

	let paths: Vec<&str> = json["files"]
		.as_array()
		.expect("files array")
		.iter()
		.filter_map(|file| file["path"].as_str())
		.collect();
	assert_eq!(paths.len(), 3);
	for path in &paths {
		assert_eq!(Path::new(path).parent(), Some(out.as_path()), "{path} left the output dir");
	}
	assert!(out.join("hostile_x_escaped.png").is_file());
	assert!(out.join("hostile_...png").is_file());
	assert!(!dir.path().join("a").join("escaped.png").exists());
}

fn write(dir: &Path, name: &str, bytes: &[u8]) -> String {
	let path = dir.join(name);
	std::fs::write(&path, bytes).expect("bundle written");
	path.to_string_lossy().into_owned()
}

fn run(args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_unibundle")).args(args).output().expect("command executes")
}

fn run_json(args: &[&str]) -> Value {
	let output = run(args);
	assert!(
		output.status.success(),
		"command failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}

/// The `error: ...` line printed by `main`; log lines may precede it.
fn error_line(output: &Output) -> String {
	String::from_utf8_lossy(&output.stderr)
		.lines()
		.find(|line| line.starts_with("error: "))
		.unwrap_or_default()
		.to_owned()
}
