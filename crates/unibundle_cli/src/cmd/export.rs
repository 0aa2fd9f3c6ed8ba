use std::io;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use log::{info, warn};
use unibundle::bundle::{BundleError, NamedBitmap, Result, decode_bundle};

use crate::cmd::util::{emit_json, read_bundle};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// Output directory, created when missing.
	#[arg(long, default_value = ".")]
	pub out: PathBuf,
	/// Asset name used for file names; defaults to the bundle file stem.
	#[arg(long)]
	pub name: Option<String>,
	/// Export only this sprite.
	#[arg(long)]
	pub sprite: Option<String>,
	#[arg(long)]
	pub json: bool,
}

/// Decode the atlas and write the texture and sprites as PNG files.
pub fn run(args: Args) -> Result<()> {
	let Args {
		path,
		out,
		name,
		sprite,
		json,
	} = args;

	let asset = name.unwrap_or_else(|| asset_name(&path));
	let bytes = read_bundle(&path)?;
	let images = decode_bundle(&bytes)?;
	std::fs::create_dir_all(&out)?;

	let mut written = Vec::new();
	match sprite.as_deref() {
		Some(sprite_name) => {
			let bitmap = images.select(Some(sprite_name))?;
			written.extend(write_png(&out, &file_stem(&format!("{asset}_{sprite_name}")), bitmap)?);
		}
		None => {
			written.extend(write_png(&out, &file_stem(&asset), &images.texture)?);
			for bitmap in &images.sprites {
				written.extend(write_png(&out, &file_stem(&format!("{asset}_{}", bitmap.name)), bitmap)?);
			}
		}
	}

	if json {
		return emit_json(&ExportJson {
			texture: images.texture.name.clone(),
			files: written,
		});
	}

	for file in &written {
		println!("{} ({}x{})", file.path, file.width, file.height);
	}
	Ok(())
}

fn asset_name(path: &Path) -> String {
	path.file_stem()
		.map(|stem| stem.to_string_lossy().into_owned())
		.unwrap_or_else(|| "bundle".to_owned())
}

/// Flatten a name taken from bundle data into a single file name component.
///
/// Separators become `_`; empty, `.` and `..` segments are dropped.
fn file_stem(name: &str) -> String {
	let stem = name
		.split(['/', '\\', ':'])
		.filter(|segment| !matches!(*segment, "" | "." | ".."))
		.collect::<Vec<_>>()
		.join("_");
	if stem.is_empty() { "_".to_owned() } else { stem }
}

fn write_png(dir: &Path, stem: &str, image: &NamedBitmap) -> Result<Option<FileJson>> {
	let bitmap = &image.bitmap;
	if bitmap.width == 0 || bitmap.height == 0 {
		warn!("skipping empty image {:?}", image.name);
		return Ok(None);
	}

	let path = dir.join(format!("{stem}.png"));
	let buffer = RgbaImage::from_raw(bitmap.width, bitmap.height, bitmap.pixels.clone())
		.ok_or_else(|| BundleError::Io(io::Error::other(format!("pixel buffer size mismatch for {:?}", image.name))))?;
	buffer
		.save_with_format(&path, ImageFormat::Png)
		.map_err(|err| BundleError::Io(io::Error::other(err)))?;
	info!("wrote {}", path.display());

	Ok(Some(FileJson {
		name: image.name.clone(),
		path: path.display().to_string(),
		width: bitmap.width,
		height: bitmap.height,
	}))
}

#[derive(serde::Serialize)]
struct ExportJson {
	texture: String,
	files: Vec<FileJson>,
}

#[derive(serde::Serialize)]
struct FileJson {
	name: String,
	path: String,
	width: u32,
	height: u32,
}
