use log::trace;

use crate::bundle::bytes::{Cursor, Endianness};
use crate::bundle::typetree::TypeTree;
use crate::bundle::value::{FieldValue, PPtr, StructValue, Value};
use crate::bundle::{BundleError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Primitive {
	Bool,
	I8,
	U8,
	I16,
	U16,
	I32,
	U32,
	I64,
	U64,
	F32,
	F64,
}

const PRIMITIVES: &[(&str, Primitive)] = &[
	("bool", Primitive::Bool),
	("SInt8", Primitive::I8),
	("UInt8", Primitive::U8),
	("char", Primitive::U8),
	("SInt16", Primitive::I16),
	("short", Primitive::I16),
	("UInt16", Primitive::U16),
	("unsigned short", Primitive::U16),
	("SInt32", Primitive::I32),
	("int", Primitive::I32),
	("UInt32", Primitive::U32),
	("unsigned int", Primitive::U32),
	("unsigned", Primitive::U32),
	("SInt64", Primitive::I64),
	("long long", Primitive::I64),
	("long", Primitive::I64),
	("UInt64", Primitive::U64),
	("unsigned long long", Primitive::U64),
	("float", Primitive::F32),
	("double", Primitive::F64),
];

/// Struct types whose external data location is mirrored into an `asset` field.
const ASSET_SOURCES: &[(&str, &str)] = &[("StreamedResource", "source"), ("StreamingInfo", "path")];

const ASSET_FIELD: &str = "asset";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
	Primitive(Primitive),
	String,
	PPtr,
	Array { marker: usize },
	Pair,
	Struct,
}

fn classify(tree: &TypeTree, idx: usize) -> NodeKind {
	let node = tree.node(idx);
	let type_name = node.type_name();

	if let Some((_, primitive)) = PRIMITIVES.iter().find(|(name, _)| *name == type_name) {
		return NodeKind::Primitive(*primitive);
	}
	if type_name == "string" {
		return NodeKind::String;
	}
	if type_name.starts_with("PPtr<") {
		return NodeKind::PPtr;
	}

	let marker = if node.is_array {
		Some(idx)
	} else {
		tree.children(idx).first().copied().filter(|child| tree.node(*child).is_array)
	};
	if let Some(marker) = marker {
		return NodeKind::Array { marker };
	}

	if type_name == "pair" { NodeKind::Pair } else { NodeKind::Struct }
}

/// Decode the value described by `node_idx` at `offset`, returning it and the offset after it.
///
/// Alignment is relative to the start of `bytes`.
pub fn decode_value(tree: &TypeTree, node_idx: usize, bytes: &[u8], offset: usize) -> Result<(Value, usize)> {
	let mut cursor = Cursor::at(bytes, offset);
	let value = decode_node(tree, node_idx, &mut cursor)?;
	Ok((value, cursor.pos()))
}

/// Decode one whole object record from its root node.
pub fn decode_object(tree: &TypeTree, bytes: &[u8]) -> Result<Value> {
	let (value, end) = decode_value(tree, TypeTree::ROOT, bytes, 0)?;
	if end != bytes.len() {
		trace!("{} decoded {end} of {} bytes", tree.root_type_name(), bytes.len());
	}
	Ok(value)
}

fn decode_node(tree: &TypeTree, idx: usize, cursor: &mut Cursor<'_>) -> Result<Value> {
	let node = tree.node(idx);
	let mut align = node.post_align();

	let value = match classify(tree, idx) {
		NodeKind::Primitive(primitive) => read_primitive(cursor, primitive)?,
		NodeKind::String => {
			let len = cursor.read_u32(Endianness::Little)? as usize;
			let raw = cursor.read_exact(len)?;
			align |= tree.children(idx).first().is_some_and(|child| tree.node(*child).post_align());
			Value::String(String::from_utf8_lossy(raw).into_owned().into_boxed_str())
		}
		NodeKind::PPtr => Value::PPtr(PPtr {
			file_id: cursor.read_i32(Endianness::Little)?,
			path_id: cursor.read_i64(Endianness::Little)?,
		}),
		NodeKind::Array { marker } => {
			align |= tree.node(marker).post_align();
			decode_array(tree, marker, cursor)?
		}
		NodeKind::Pair => {
			let [first, second] = tree.children(idx) else {
				return Err(BundleError::MalformedTypeTree {
					reason: format!("pair node {idx} has {} children", tree.children(idx).len()),
				});
			};
			let first = decode_node(tree, *first, cursor)?;
			let second = decode_node(tree, *second, cursor)?;
			Value::Pair(Box::new((first, second)))
		}
		NodeKind::Struct => Value::Struct(decode_struct(tree, idx, cursor)?),
	};

	if align {
		cursor.align4()?;
	}
	Ok(value)
}

fn read_primitive(cursor: &mut Cursor<'_>, primitive: Primitive) -> Result<Value> {
	Ok(match primitive {
		Primitive::Bool => Value::Bool(cursor.read_u8()? != 0),
		Primitive::I8 => Value::I8(cursor.read_i8()?),
		Primitive::U8 => Value::U8(cursor.read_u8()?),
		Primitive::I16 => Value::I16(cursor.read_i16(Endianness::Little)?),
		Primitive::U16 => Value::U16(cursor.read_u16(Endianness::Little)?),
		Primitive::I32 => Value::I32(cursor.read_i32(Endianness::Little)?),
		Primitive::U32 => Value::U32(cursor.read_u32(Endianness::Little)?),
		Primitive::I64 => Value::I64(cursor.read_i64(Endianness::Little)?),
		Primitive::U64 => Value::U64(cursor.read_u64(Endianness::Little)?),
		Primitive::F32 => {
			cursor.align4()?;
			Value::F32(cursor.read_f32_le()?)
		}
		Primitive::F64 => Value::F64(cursor.read_f64_le()?),
	})
}

fn decode_array(tree: &TypeTree, marker: usize, cursor: &mut Cursor<'_>) -> Result<Value> {
	let Some(element) = tree.children(marker).get(1).copied() else {
		return Err(BundleError::MalformedTypeTree {
			reason: format!("array node {marker} has no element type"),
		});
	};

	let at = cursor.pos();
	let count = cursor.read_u32(Endianness::Little)? as usize;
	if count > cursor.remaining() {
		return Err(BundleError::BufferOverrun {
			at,
			need: count,
			rem: cursor.remaining(),
		});
	}

	if matches!(tree.node(element).type_name(), "char" | "UInt8") {
		return Ok(Value::Bytes(cursor.read_exact(count)?.to_vec()));
	}

	let mut items = Vec::with_capacity(count);
	for _ in 0..count {
		items.push(decode_node(tree, element, cursor)?);
	}
	Ok(Value::Array(items))
}

fn decode_struct(tree: &TypeTree, idx: usize, cursor: &mut Cursor<'_>) -> Result<StructValue> {
	let type_name = tree.node(idx).type_name();
	let children = tree.children(idx);

	let mut fields = Vec::with_capacity(children.len() + 1);
	for child in children {
		let value = decode_node(tree, *child, cursor)?;
		fields.push(FieldValue {
			name: tree.node(*child).name().into(),
			value,
		});
	}

	let mut value = StructValue {
		type_name: type_name.into(),
		fields,
	};
	if let Some((_, source)) = ASSET_SOURCES.iter().find(|(name, _)| *name == type_name)
		&& let Some(location) = value.get(source).cloned()
	{
		value.fields.push(FieldValue {
			name: ASSET_FIELD.into(),
			value: location,
		});
	}

	Ok(value)
}
