/// Runtime value emitted by type-tree driven decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	/// Boolean scalar.
	Bool(bool),
	/// Signed 8-bit scalar.
	I8(i8),
	/// Unsigned 8-bit scalar.
	U8(u8),
	/// Signed 16-bit scalar.
	I16(i16),
	/// Unsigned 16-bit scalar.
	U16(u16),
	/// Signed 32-bit scalar.
	I32(i32),
	/// Unsigned 32-bit scalar.
	U32(u32),
	/// Signed 64-bit scalar.
	I64(i64),
	/// Unsigned 64-bit scalar.
	U64(u64),
	/// 32-bit float scalar.
	F32(f32),
	/// 64-bit float scalar.
	F64(f64),
	/// UTF-8 lossy decoded string.
	String(Box<str>),
	/// Byte array collapsed from `char`/`UInt8` elements.
	Bytes(Vec<u8>),
	/// Array of decoded elements.
	Array(Vec<Value>),
	/// Struct-shaped decoded value.
	Struct(StructValue),
	/// Two-element tuple.
	Pair(Box<(Value, Value)>),
	/// Reference to another object.
	PPtr(PPtr),
}

/// Object reference: file index plus path id within that file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PPtr {
	/// Index into the file's external references; 0 is the same file.
	pub file_id: i32,
	/// Target object path id.
	pub path_id: i64,
}

/// Decoded struct value with field names preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
	/// Type name from the type tree node.
	pub type_name: Box<str>,
	/// Decoded field values in declaration order.
	pub fields: Vec<FieldValue>,
}

/// Named decoded field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
	/// Field identifier.
	pub name: Box<str>,
	/// Decoded field payload.
	pub value: Value,
}

impl StructValue {
	/// First field named `name`.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.fields.iter().find(|field| &*field.name == name).map(|field| &field.value)
	}
}

impl Value {
	/// Stable label of the value kind.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Bool(_) => "bool",
			Self::I8(_) => "i8",
			Self::U8(_) => "u8",
			Self::I16(_) => "i16",
			Self::U16(_) => "u16",
			Self::I32(_) => "i32",
			Self::U32(_) => "u32",
			Self::I64(_) => "i64",
			Self::U64(_) => "u64",
			Self::F32(_) => "f32",
			Self::F64(_) => "f64",
			Self::String(_) => "string",
			Self::Bytes(_) => "bytes",
			Self::Array(_) => "array",
			Self::Struct(_) => "struct",
			Self::Pair(_) => "pair",
			Self::PPtr(_) => "pptr",
		}
	}

	/// Widen any integer scalar to `i64`; `U64` above `i64::MAX` yields `None`.
	pub fn as_i64(&self) -> Option<i64> {
		match *self {
			Self::I8(v) => Some(i64::from(v)),
			Self::U8(v) => Some(i64::from(v)),
			Self::I16(v) => Some(i64::from(v)),
			Self::U16(v) => Some(i64::from(v)),
			Self::I32(v) => Some(i64::from(v)),
			Self::U32(v) => Some(i64::from(v)),
			Self::I64(v) => Some(v),
			Self::U64(v) => i64::try_from(v).ok(),
			_ => None,
		}
	}

	/// Float or integer scalar as `f64`.
	pub fn as_f64(&self) -> Option<f64> {
		match *self {
			Self::F32(v) => Some(f64::from(v)),
			Self::F64(v) => Some(v),
			_ => self.as_i64().map(|v| v as f64),
		}
	}

	/// Boolean scalar; integer scalars count as `true` when non-zero.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(v) => Some(*v),
			_ => self.as_i64().map(|v| v != 0),
		}
	}

	/// String payload.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(v) => Some(v),
			_ => None,
		}
	}

	/// Byte payload.
	pub fn as_bytes(&self) -> Option<&[u8]> {
		match self {
			Self::Bytes(v) => Some(v),
			_ => None,
		}
	}

	/// Struct payload.
	pub fn as_struct(&self) -> Option<&StructValue> {
		match self {
			Self::Struct(v) => Some(v),
			_ => None,
		}
	}
}
