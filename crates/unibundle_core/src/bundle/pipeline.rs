use log::debug;

use crate::bundle::file::{AssetBundle, BundleInfo, DecodedObject};
use crate::bundle::records::{Sprite, Texture2D};
use crate::bundle::sprite::extract_sprites;
use crate::bundle::texture::{NamedBitmap, decode_texture};
use crate::bundle::value::Value;
use crate::bundle::{BundleError, Result};

/// Images recovered from one bundle.
#[derive(Debug, Clone)]
pub struct BundleImages {
	/// Primary texture, rows in stored order.
	pub texture: NamedBitmap,
	/// Sprites cut from the primary texture, in object-table order.
	pub sprites: Vec<NamedBitmap>,
}

impl BundleImages {
	/// Sprite with exactly this name.
	pub fn sprite(&self, name: &str) -> Option<&NamedBitmap> {
		self.sprites.iter().find(|sprite| sprite.name == name)
	}

	/// The named sprite when a name is given, else the primary texture.
	pub fn select(&self, sprite_name: Option<&str>) -> Result<&NamedBitmap> {
		match sprite_name {
			Some(name) => self.sprite(name).ok_or_else(|| BundleError::SpriteNotFound { name: name.to_owned() }),
			None => Ok(&self.texture),
		}
	}
}

/// Decode a bundle end to end into its primary texture and sprites.
///
/// The last Texture2D in object-table order is the primary texture.
pub fn decode_bundle(bytes: &[u8]) -> Result<BundleImages> {
	let bundle = AssetBundle::parse(bytes)?;
	images_from_objects(&bundle.decode_objects()?)
}

/// Parse bundle structure without decoding objects.
pub fn inspect_bundle(bytes: &[u8]) -> Result<BundleInfo> {
	AssetBundle::parse(bytes).map(AssetBundle::into_info)
}

/// Pick the primary texture and sprites out of decoded objects and cut the atlas.
pub fn images_from_objects(objects: &[DecodedObject]) -> Result<BundleImages> {
	let mut texture = None;
	let mut sprites = Vec::new();
	for object in objects {
		let Value::Struct(value) = &object.value else {
			continue;
		};
		match &*object.type_name {
			Texture2D::TYPE_NAME => texture = Some(Texture2D::from_struct(value)?),
			Sprite::TYPE_NAME => sprites.push(Sprite::from_struct(value)?),
			_ => {}
		}
	}

	let texture = texture.ok_or(BundleError::NoTextureFound)?;
	debug!(
		"texture {:?}: {}x{} format {}, {} sprites",
		texture.name,
		texture.width,
		texture.height,
		texture.format_code,
		sprites.len()
	);

	let bitmap = decode_texture(texture.format_code, texture.width, texture.height, &texture.image_data)?;
	let cut = extract_sprites(&bitmap, &sprites)?;
	Ok(BundleImages {
		texture: NamedBitmap {
			name: texture.name,
			bitmap,
		},
		sprites: cut,
	})
}
