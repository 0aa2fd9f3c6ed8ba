use std::fmt::Write as _;

use unibundle::bundle::Value;

/// Output truncation and formatting limits for decoded values.
#[derive(Debug, Clone, Copy)]
pub struct PrintOptions {
	/// Maximum number of fields printed for a single struct.
	pub max_fields_per_struct: usize,
	/// Maximum number of Unicode scalar values printed for strings.
	pub max_string_len: usize,
	/// Maximum number of elements printed for arrays.
	pub max_array_items: usize,
	/// Maximum recursive print depth for nested arrays/structs.
	pub max_print_depth: u32,
}

impl Default for PrintOptions {
	fn default() -> Self {
		Self {
			max_fields_per_struct: 80,
			max_string_len: 200,
			max_array_items: 16,
			max_print_depth: 6,
		}
	}
}

/// Print one decoded value tree.
pub fn print_value(value: &Value, options: PrintOptions) {
	print!("{}", render_value(value, options));
}

/// Render one decoded value tree as indented text.
pub fn render_value(value: &Value, options: PrintOptions) -> String {
	let mut out = String::new();
	write_value(&mut out, value, 0, 0, options);
	out
}

fn write_value(out: &mut String, value: &Value, indent: usize, depth: u32, options: PrintOptions) {
	let pad = " ".repeat(indent);
	match value {
		Value::Bool(v) => line(out, &pad, v),
		Value::I8(v) => line(out, &pad, v),
		Value::U8(v) => line(out, &pad, v),
		Value::I16(v) => line(out, &pad, v),
		Value::U16(v) => line(out, &pad, v),
		Value::I32(v) => line(out, &pad, v),
		Value::U32(v) => line(out, &pad, v),
		Value::I64(v) => line(out, &pad, v),
		Value::U64(v) => line(out, &pad, v),
		Value::F32(v) => line(out, &pad, v),
		Value::F64(v) => line(out, &pad, v),
		Value::Bytes(v) => line(out, &pad, format_args!("bytes[{}]", v.len())),
		Value::String(v) => line(out, &pad, format_args!("\"{}\"", truncate(v, options.max_string_len))),
		Value::PPtr(v) => line(out, &pad, format_args!("pptr(file={}, path={})", v.file_id, v.path_id)),
		Value::Pair(pair) => {
			if depth >= options.max_print_depth {
				line(out, &pad, "( ... )");
				return;
			}
			line(out, &pad, "(");
			write_value(out, &pair.0, indent + 2, depth + 1, options);
			write_value(out, &pair.1, indent + 2, depth + 1, options);
			line(out, &pad, ")");
		}
		Value::Array(items) => {
			if depth >= options.max_print_depth {
				line(out, &pad, format_args!("[... {} items]", items.len()));
				return;
			}
			line(out, &pad, "[");
			for item in items.iter().take(options.max_array_items) {
				write_value(out, item, indent + 2, depth + 1, options);
			}
			if items.len() > options.max_array_items {
				line(out, &pad, format_args!("  ... {} more", items.len() - options.max_array_items));
			}
			line(out, &pad, "]");
		}
		Value::Struct(item) => {
			if depth >= options.max_print_depth {
				line(out, &pad, format_args!("{} {{ ... }}", item.type_name));
				return;
			}
			line(out, &pad, format_args!("{} {{", item.type_name));
			for field in item.fields.iter().take(options.max_fields_per_struct) {
				let _ = write!(out, "{pad}  {} = ", field.name);
				if matches!(field.value, Value::Struct(_) | Value::Array(_) | Value::Pair(_)) {
					out.push('\n');
					write_value(out, &field.value, indent + 4, depth + 1, options);
				} else {
					write_value(out, &field.value, 0, depth + 1, options);
				}
			}
			if item.fields.len() > options.max_fields_per_struct {
				line(out, &pad, format_args!("  ... {} more fields", item.fields.len() - options.max_fields_per_struct));
			}
			line(out, &pad, "}");
		}
	}
}

fn line(out: &mut String, pad: &str, text: impl std::fmt::Display) {
	let _ = writeln!(out, "{pad}{text}");
}

fn truncate(input: &str, max_chars: usize) -> String {
	if input.chars().count() <= max_chars {
		return input.to_owned();
	}
	let mut out: String = input.chars().take(max_chars).collect();
	out.push_str("...");
	out
}

/// Convert a decoded value tree into JSON.
pub fn value_to_json(value: &Value) -> serde_json::Value {
	use serde_json::{Map, Value as JsonValue, json};

	match value {
		Value::Bool(v) => json!(v),
		Value::I8(v) => json!(v),
		Value::U8(v) => json!(v),
		Value::I16(v) => json!(v),
		Value::U16(v) => json!(v),
		Value::I32(v) => json!(v),
		Value::U32(v) => json!(v),
		Value::I64(v) => json!(v),
		Value::U64(v) => json!(v),
		Value::F32(v) => json!(v),
		Value::F64(v) => json!(v),
		Value::String(v) => json!(v),
		Value::Bytes(v) => json!({ "bytes": v.len() }),
		Value::PPtr(v) => json!({ "file_id": v.file_id, "path_id": v.path_id }),
		Value::Pair(pair) => JsonValue::Array(vec![value_to_json(&pair.0), value_to_json(&pair.1)]),
		Value::Array(items) => JsonValue::Array(items.iter().map(value_to_json).collect()),
		Value::Struct(item) => {
			let fields: Map<String, JsonValue> = item
				.fields
				.iter()
				.map(|field| (field.name.to_string(), value_to_json(&field.value)))
				.collect();

			let mut out = Map::new();
			out.insert("type".to_owned(), json!(item.type_name.as_ref()));
			out.insert("fields".to_owned(), JsonValue::Object(fields));
			JsonValue::Object(out)
		}
	}
}

#[cfg(test)]
mod tests;
