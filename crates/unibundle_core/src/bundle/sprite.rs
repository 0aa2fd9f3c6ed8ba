use log::trace;

use crate::bundle::records::{Sprite, SpriteRect};
use crate::bundle::texture::{Bitmap, NamedBitmap};
use crate::bundle::{BundleError, Result};

/// Cut every sprite rectangle out of a decoded atlas.
///
/// Rects use a bottom-left origin. Output rows are written so that the sprite's
/// top row lands at destination row 0. All sprites are validated before any copy.
pub fn extract_sprites(texture: &Bitmap, sprites: &[Sprite]) -> Result<Vec<NamedBitmap>> {
	for sprite in sprites {
		check_geometry(texture, sprite)?;
	}

	Ok(sprites
		.iter()
		.map(|sprite| NamedBitmap {
			name: sprite.name.clone(),
			bitmap: copy_rect(texture, sprite.rect),
		})
		.collect())
}

fn check_geometry(texture: &Bitmap, sprite: &Sprite) -> Result<()> {
	let reject = |reason| BundleError::UnsupportedGeometry {
		name: sprite.name.clone(),
		reason,
	};

	if sprite.is_polygon {
		return Err(reject("polygon sprites are not supported"));
	}
	let SpriteRect { x, y, width, height } = sprite.rect;
	let fits_x = x.checked_add(width).is_some_and(|right| right <= texture.width);
	let fits_y = y.checked_add(height).is_some_and(|top| top <= texture.height);
	if !fits_x || !fits_y {
		return Err(reject("rect lies outside the texture"));
	}
	Ok(())
}

fn copy_rect(texture: &Bitmap, rect: SpriteRect) -> Bitmap {
	let SpriteRect { x, y, width, height } = rect;
	trace!("copy rect {x},{y} {width}x{height}");

	let mut out = Bitmap::new(width, height);
	let span = width as usize * 4;
	for row in y..y + height {
		let src_row = (texture.height - 1 - row) as usize;
		let dst_row = (height - 1 - (row - y)) as usize;
		let src = (src_row * texture.width as usize + x as usize) * 4;
		let dst = dst_row * span;
		out.pixels[dst..dst + span].copy_from_slice(&texture.pixels[src..src + span]);
	}
	out
}
