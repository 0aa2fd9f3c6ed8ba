use unibundle::bundle::{FieldValue, PPtr, StructValue, Value};

use super::{PrintOptions, render_value, value_to_json};

fn sample() -> Value {
	Value::Struct(StructValue {
		type_name: "Sprite".into(),
		fields: vec![
			FieldValue {
				name: "m_Name".into(),
				value: Value::String("icon_sword".into()),
			},
			FieldValue {
				name: "m_IsPolygon".into(),
				value: Value::Bool(false),
			},
			FieldValue {
				name: "m_RenderDataKey".into(),
				value: Value::Pair(Box::new((Value::U32(7), Value::I64(-2)))),
			},
			FieldValue {
				name: "m_Texture".into(),
				value: Value::PPtr(PPtr { file_id: 0, path_id: 42 }),
			},
			FieldValue {
				name: "image data".into(),
				value: Value::Bytes(vec![0; 32]),
			},
		],
	})
}

#[test]
fn render_indents_nested_values() {
	let text = render_value(&sample(), PrintOptions::default());
	let expected = [
		"Sprite {",
		"  m_Name = \"icon_sword\"",
		"  m_IsPolygon = false",
		"  m_RenderDataKey = ",
		"    (",
		"      7",
		"      -2",
		"    )",
		"  m_Texture = pptr(file=0, path=42)",
		"  image data = bytes[32]",
		"}",
	];
	assert_eq!(text.lines().collect::<Vec<_>>(), expected);
}

#[test]
fn render_truncates_long_arrays_and_strings() {
	let options = PrintOptions {
		max_array_items: 2,
		max_string_len: 3,
		..PrintOptions::default()
	};
	let value = Value::Array(vec![Value::String("abcdef".into()), Value::I32(1), Value::I32(2)]);
	let text = render_value(&value, options);
	assert!(text.contains("\"abc...\""));
	assert!(text.contains("... 1 more"));
}

#[test]
fn render_stops_at_depth_limit() {
	let options = PrintOptions {
		max_print_depth: 0,
		..PrintOptions::default()
	};
	assert_eq!(render_value(&sample(), options), "Sprite { ... }\n");
}

#[test]
fn json_nests_fields_under_type() {
	let json = value_to_json(&sample());
	assert_eq!(json["type"], "Sprite");
	assert_eq!(json["fields"]["m_Name"], "icon_sword");
	assert_eq!(json["fields"]["m_RenderDataKey"][1], -2);
	assert_eq!(json["fields"]["m_Texture"]["path_id"], 42);
	assert_eq!(json["fields"]["image data"]["bytes"], 32);
}
