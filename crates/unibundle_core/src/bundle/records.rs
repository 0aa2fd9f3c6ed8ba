use crate::bundle::value::{StructValue, Value};
use crate::bundle::{BundleError, Result};

/// Decoded 2D texture asset.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture2D {
	/// Asset name.
	pub name: String,
	/// Width in pixels.
	pub width: u32,
	/// Height in pixels.
	pub height: u32,
	/// Raw texture format code.
	pub format_code: i32,
	/// Block-compressed pixel data.
	pub image_data: Vec<u8>,
	/// External data location when pixels live outside the record.
	pub stream_path: Option<String>,
}

impl Texture2D {
	/// Class name of texture records.
	pub const TYPE_NAME: &'static str = "Texture2D";

	/// Extract texture fields from a decoded record.
	pub fn from_struct(value: &StructValue) -> Result<Self> {
		let fields = Fields(value);
		let stream_path = value
			.get("m_StreamData")
			.and_then(Value::as_struct)
			.and_then(|stream| stream.get("asset"))
			.and_then(Value::as_str)
			.filter(|path| !path.is_empty())
			.map(str::to_owned);

		Ok(Self {
			name: fields.string("m_Name")?,
			width: fields.dimension("m_Width")?,
			height: fields.dimension("m_Height")?,
			format_code: fields.int("m_TextureFormat")?,
			image_data: fields.bytes("image data")?,
			stream_path,
		})
	}
}

/// Sprite rectangle in texture pixels, origin at the bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteRect {
	/// Left edge.
	pub x: u32,
	/// Bottom edge.
	pub y: u32,
	/// Width in pixels.
	pub width: u32,
	/// Height in pixels.
	pub height: u32,
}

/// Decoded sprite record: a named region of the atlas texture.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
	/// Sprite name.
	pub name: String,
	/// Region within the atlas.
	pub rect: SpriteRect,
	/// Whether the sprite uses polygon geometry.
	pub is_polygon: bool,
}

impl Sprite {
	/// Class name of sprite records.
	pub const TYPE_NAME: &'static str = "Sprite";

	/// Extract sprite fields from a decoded record.
	pub fn from_struct(value: &StructValue) -> Result<Self> {
		let fields = Fields(value);
		let rect = fields.nested("m_Rect")?;
		let rect_fields = Fields(rect);

		Ok(Self {
			name: fields.string("m_Name")?,
			rect: SpriteRect {
				x: rect_fields.pixel_extent("x")?,
				y: rect_fields.pixel_extent("y")?,
				width: rect_fields.pixel_extent("width")?,
				height: rect_fields.pixel_extent("height")?,
			},
			is_polygon: match value.get("m_IsPolygon") {
				Some(flag) => flag.as_bool().ok_or_else(|| fields.mismatch("m_IsPolygon", "bool", flag))?,
				None => false,
			},
		})
	}
}

struct Fields<'v>(&'v StructValue);

impl<'v> Fields<'v> {
	fn get(&self, field: &'static str) -> Result<&'v Value> {
		self.0.get(field).ok_or_else(|| BundleError::MissingField {
			type_name: self.0.type_name.to_string(),
			field,
		})
	}

	fn mismatch(&self, field: &'static str, expected: &'static str, got: &Value) -> BundleError {
		BundleError::FieldTypeMismatch {
			type_name: self.0.type_name.to_string(),
			field,
			expected,
			got: got.kind(),
		}
	}

	fn string(&self, field: &'static str) -> Result<String> {
		let value = self.get(field)?;
		value.as_str().map(str::to_owned).ok_or_else(|| self.mismatch(field, "string", value))
	}

	fn int(&self, field: &'static str) -> Result<i32> {
		let value = self.get(field)?;
		value
			.as_i64()
			.and_then(|v| i32::try_from(v).ok())
			.ok_or_else(|| self.mismatch(field, "i32", value))
	}

	fn dimension(&self, field: &'static str) -> Result<u32> {
		let value = self.get(field)?;
		value
			.as_i64()
			.and_then(|v| u32::try_from(v).ok())
			.ok_or_else(|| self.mismatch(field, "non-negative integer", value))
	}

	fn bytes(&self, field: &'static str) -> Result<Vec<u8>> {
		let value = self.get(field)?;
		value.as_bytes().map(<[u8]>::to_vec).ok_or_else(|| self.mismatch(field, "bytes", value))
	}

	fn nested(&self, field: &'static str) -> Result<&'v StructValue> {
		let value = self.get(field)?;
		value.as_struct().ok_or_else(|| self.mismatch(field, "struct", value))
	}

	/// Float rect component truncated toward zero; negatives and non-finite values are rejected.
	fn pixel_extent(&self, field: &'static str) -> Result<u32> {
		let value = self.get(field)?;
		value
			.as_f64()
			.filter(|v| v.is_finite() && *v >= 0.0 && *v <= f64::from(u32::MAX))
			.map(|v| v.trunc() as u32)
			.ok_or_else(|| self.mismatch(field, "non-negative number", value))
	}
}

#[cfg(test)]
mod tests {
	use super::{Sprite, SpriteRect, Texture2D};
	use crate::bundle::BundleError;
	use crate::bundle::value::{FieldValue, StructValue, Value};

	fn record(type_name: &str, fields: Vec<(&str, Value)>) -> StructValue {
		StructValue {
			type_name: type_name.into(),
			fields: fields
				.into_iter()
				.map(|(name, value)| FieldValue { name: name.into(), value })
				.collect(),
		}
	}

	fn rect(x: f32, y: f32, width: f32, height: f32) -> Value {
		Value::Struct(record(
			"Rectf",
			vec![
				("x", Value::F32(x)),
				("y", Value::F32(y)),
				("width", Value::F32(width)),
				("height", Value::F32(height)),
			],
		))
	}

	#[test]
	fn texture_fields_are_extracted() {
		let value = record(
			"Texture2D",
			vec![
				("m_Name", Value::String("atlas".into())),
				("m_Width", Value::I32(8)),
				("m_Height", Value::I32(4)),
				("m_TextureFormat", Value::I32(10)),
				("image data", Value::Bytes(vec![1, 2])),
			],
		);
		let texture = Texture2D::from_struct(&value).expect("texture fields");
		assert_eq!(texture.name, "atlas");
		assert_eq!((texture.width, texture.height, texture.format_code), (8, 4, 10));
		assert_eq!(texture.image_data, [1, 2]);
		assert_eq!(texture.stream_path, None);
	}

	#[test]
	fn texture_missing_or_mistyped_fields_fail() {
		let value = record("Texture2D", vec![("m_Name", Value::String("atlas".into()))]);
		assert!(matches!(
			Texture2D::from_struct(&value),
			Err(BundleError::MissingField { field: "m_Width", .. })
		));

		let value = record(
			"Texture2D",
			vec![("m_Name", Value::String("atlas".into())), ("m_Width", Value::I32(-1))],
		);
		assert!(matches!(
			Texture2D::from_struct(&value),
			Err(BundleError::FieldTypeMismatch { field: "m_Width", got: "i32", .. })
		));
	}

	#[test]
	fn sprite_rect_floats_truncate() {
		let value = record(
			"Sprite",
			vec![
				("m_Name", Value::String("icon".into())),
				("m_Rect", rect(2.9, 4.0, 16.5, 8.0)),
				("m_IsPolygon", Value::Bool(false)),
			],
		);
		let sprite = Sprite::from_struct(&value).expect("sprite fields");
		assert_eq!(sprite.name, "icon");
		assert_eq!(
			sprite.rect,
			SpriteRect {
				x: 2,
				y: 4,
				width: 16,
				height: 8
			}
		);
		assert!(!sprite.is_polygon);
	}

	#[test]
	fn negative_sprite_rect_is_rejected() {
		let value = record(
			"Sprite",
			vec![("m_Name", Value::String("icon".into())), ("m_Rect", rect(-1.0, 0.0, 4.0, 4.0))],
		);
		assert!(matches!(
			Sprite::from_struct(&value),
			Err(BundleError::FieldTypeMismatch { field: "x", .. })
		));
	}
}
