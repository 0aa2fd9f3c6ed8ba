use crate::bundle::{BundleError, Result};

/// Block-compressed pixel formats this crate can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
	/// BC1: 8-byte blocks, 1-bit alpha.
	Dxt1,
	/// BC3: 16-byte blocks, interpolated alpha.
	Dxt5,
}

impl TextureFormat {
	/// Texture format code for DXT1.
	pub const DXT1_CODE: i32 = 10;
	/// Texture format code for DXT5.
	pub const DXT5_CODE: i32 = 12;

	/// Map a texture format code to a decodable format.
	pub fn from_code(code: i32) -> Result<Self> {
		match code {
			Self::DXT1_CODE => Ok(Self::Dxt1),
			Self::DXT5_CODE => Ok(Self::Dxt5),
			_ => Err(BundleError::UnsupportedPixelFormat { code }),
		}
	}

	/// Bytes per 4x4 block.
	pub fn block_bytes(self) -> usize {
		match self {
			Self::Dxt1 => 8,
			Self::Dxt5 => 16,
		}
	}

	/// Render format as a stable label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Dxt1 => "DXT1",
			Self::Dxt5 => "DXT5",
		}
	}
}

/// Row-major RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
	/// Width in pixels.
	pub width: u32,
	/// Height in pixels.
	pub height: u32,
	/// `width * height * 4` bytes, rows in stored order.
	pub pixels: Vec<u8>,
}

impl Bitmap {
	/// Transparent black image of the given size.
	pub fn new(width: u32, height: u32) -> Self {
		Self {
			width,
			height,
			pixels: vec![0; width as usize * height as usize * 4],
		}
	}

	/// RGBA of pixel `(x, y)`, or `None` outside the image.
	pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
		if x >= self.width || y >= self.height {
			return None;
		}
		let at = (y as usize * self.width as usize + x as usize) * 4;
		let mut out = [0; 4];
		out.copy_from_slice(&self.pixels[at..at + 4]);
		Some(out)
	}

	fn put(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
		let at = (y * self.width as usize + x) * 4;
		self.pixels[at..at + 4].copy_from_slice(&rgba);
	}
}

/// Bitmap tagged with the asset or sprite name it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedBitmap {
	/// Asset or sprite name.
	pub name: String,
	/// Decoded pixels.
	pub bitmap: Bitmap,
}

/// Decode block-compressed texture data into RGBA8.
///
/// Dimensions need not be multiples of 4; blocks hanging over the edge are clipped.
pub fn decode_texture(format_code: i32, width: u32, height: u32, data: &[u8]) -> Result<Bitmap> {
	let format = TextureFormat::from_code(format_code)?;
	let blocks_x = (width as usize).div_ceil(4);
	let blocks_y = (height as usize).div_ceil(4);
	let need = blocks_x
		.checked_mul(blocks_y)
		.and_then(|blocks| blocks.checked_mul(format.block_bytes()))
		.unwrap_or(usize::MAX);
	if need > data.len() {
		return Err(BundleError::BufferOverrun {
			at: 0,
			need,
			rem: data.len(),
		});
	}

	let mut bitmap = Bitmap::new(width, height);
	let mut blocks = data.chunks_exact(format.block_bytes());
	for by in 0..blocks_y {
		for bx in 0..blocks_x {
			let Some(block) = blocks.next() else {
				return Err(BundleError::BufferOverrun {
					at: data.len(),
					need: format.block_bytes(),
					rem: 0,
				});
			};
			let texels = match format {
				TextureFormat::Dxt1 => decode_dxt1_block(block),
				TextureFormat::Dxt5 => decode_dxt5_block(block),
			};
			write_block(&mut bitmap, bx * 4, by * 4, &texels);
		}
	}

	Ok(bitmap)
}

fn write_block(bitmap: &mut Bitmap, x0: usize, y0: usize, texels: &[[u8; 4]; 16]) {
	let width = bitmap.width as usize;
	let height = bitmap.height as usize;
	for (i, rgba) in texels.iter().enumerate() {
		let (x, y) = (x0 + i % 4, y0 + i / 4);
		if x < width && y < height {
			bitmap.put(x, y, *rgba);
		}
	}
}

fn expand_565(raw: u16) -> [u8; 3] {
	let r = ((raw >> 11) & 0x1F) as u8;
	let g = ((raw >> 5) & 0x3F) as u8;
	let b = (raw & 0x1F) as u8;
	[(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

fn mix(a: [u8; 3], b: [u8; 3], wa: u16, wb: u16, div: u16) -> [u8; 4] {
	let channel = |i: usize| ((u16::from(a[i]) * wa + u16::from(b[i]) * wb) / div) as u8;
	[channel(0), channel(1), channel(2), 255]
}

fn opaque(rgb: [u8; 3]) -> [u8; 4] {
	[rgb[0], rgb[1], rgb[2], 255]
}

/// Palette of an 8-byte color block; `allow_transparent` enables 3-color mode.
fn color_palette(block: &[u8], allow_transparent: bool) -> [[u8; 4]; 4] {
	let raw0 = u16::from_le_bytes([block[0], block[1]]);
	let raw1 = u16::from_le_bytes([block[2], block[3]]);
	let c0 = expand_565(raw0);
	let c1 = expand_565(raw1);

	if raw0 > raw1 || !allow_transparent {
		[opaque(c0), opaque(c1), mix(c0, c1, 2, 1, 3), mix(c0, c1, 1, 2, 3)]
	} else {
		[opaque(c0), opaque(c1), mix(c0, c1, 1, 1, 2), [0, 0, 0, 0]]
	}
}

fn color_texels(block: &[u8], palette: &[[u8; 4]; 4]) -> [[u8; 4]; 16] {
	let indices = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);
	std::array::from_fn(|i| palette[((indices >> (2 * i)) & 0x3) as usize])
}

fn decode_dxt1_block(block: &[u8]) -> [[u8; 4]; 16] {
	color_texels(block, &color_palette(block, true))
}

fn alpha_palette(a0: u8, a1: u8) -> [u8; 8] {
	let (a0w, a1w) = (u16::from(a0), u16::from(a1));
	let mut out = [0_u8; 8];
	out[0] = a0;
	out[1] = a1;
	if a0 > a1 {
		for i in 1..7_u16 {
			out[i as usize + 1] = (((7 - i) * a0w + i * a1w) / 7) as u8;
		}
	} else {
		for i in 1..5_u16 {
			out[i as usize + 1] = (((5 - i) * a0w + i * a1w) / 5) as u8;
		}
		out[6] = 0;
		out[7] = 255;
	}
	out
}

fn decode_dxt5_block(block: &[u8]) -> [[u8; 4]; 16] {
	let alphas = alpha_palette(block[0], block[1]);
	let mut bits = [0_u8; 8];
	bits[..6].copy_from_slice(&block[2..8]);
	let bits = u64::from_le_bytes(bits);

	let color = &block[8..16];
	let mut texels = color_texels(color, &color_palette(color, false));
	for (i, texel) in texels.iter_mut().enumerate() {
		texel[3] = alphas[((bits >> (3 * i)) & 0x7) as usize];
	}
	texels
}
