use log::trace;

use crate::bundle::bytes::{Cursor, Endianness};
use crate::bundle::{BundleError, Result};

/// Built-in name catalogue addressed by negative string offsets.
///
/// Entries are space-separated; a lookup reads up to the next space.
pub const COMMON_STRINGS: &str = "AABB AnimationClip AnimationCurve AnimationState Array Base BitField bitset bool char ColorRGBA Component data deque double dynamic_array FastPropertyName first float Font GameObject Generic Mono GradientNEW GUID GUIStyle int list long long map Matrix4x4f MdFour MonoBehaviour MonoScript m_ByteSize m_Curve m_EditorClassIdentifier m_EditorHideFlags m_Enabled m_ExtensionPtr m_GameObject m_Index m_IsArray m_IsStatic m_MetaFlag m_Name m_ObjectHideFlags m_PrefabInternal m_PrefabParentObject m_Script m_StaticEditorFlags m_Type m_Version Object pair PPtr<Component> PPtr<GameObject> PPtr<Material> PPtr<MonoBehaviour> PPtr<MonoScript> PPtr<Object> PPtr<Prefab> PPtr<Sprite> PPtr<TextAsset> PPtr<Texture> PPtr<Texture2D> PPtr<Transform> Prefab Quaternionf Rectf RectInt RectOffset second set short size SInt16 SInt32 SInt64 SInt8 staticvector string TextAsset TextMesh Texture Texture2D Transform TypelessData UInt16 UInt32 UInt64 UInt8 unsigned int unsigned long long unsigned short vector Vector2f Vector3f Vector4f m_ScriptingClassIdentifier Gradient ";

/// Serialized width of one [`TypeNode`].
pub const TYPE_NODE_SIZE: usize = 24;

/// One entry of a class's flat type description.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeNode {
	/// Node format version.
	pub version: i16,
	/// Nesting level; 0 is the tree root.
	pub depth: u8,
	/// Array marker flag.
	pub is_array: bool,
	/// Raw string offset of the type name.
	pub type_offset: i32,
	/// Raw string offset of the field name.
	pub name_offset: i32,
	/// Declared byte size (-1 for variable-size nodes).
	pub byte_size: i32,
	/// Field index within the class.
	pub index: u32,
	/// Meta flag bitset.
	pub flags: i32,
	/// Resolved type name.
	pub type_name: Option<Box<str>>,
	/// Resolved field name.
	pub name: Option<Box<str>>,
}

impl TypeNode {
	/// Meta flag requesting 4-byte alignment after this node's value.
	pub const ALIGN_FLAG: i32 = 0x4000;

	/// Return `true` when the value is followed by 4-byte alignment.
	pub fn post_align(&self) -> bool {
		self.flags & Self::ALIGN_FLAG != 0
	}

	/// Resolved type name, empty when absent.
	pub fn type_name(&self) -> &str {
		self.type_name.as_deref().unwrap_or("")
	}

	/// Resolved field name, empty when absent.
	pub fn name(&self) -> &str {
		self.name.as_deref().unwrap_or("")
	}

	fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
		Ok(Self {
			version: cursor.read_i16(Endianness::Little)?,
			depth: cursor.read_u8()?,
			is_array: cursor.read_u8()? != 0,
			type_offset: cursor.read_i32(Endianness::Little)?,
			name_offset: cursor.read_i32(Endianness::Little)?,
			byte_size: cursor.read_i32(Endianness::Little)?,
			index: cursor.read_u32(Endianness::Little)?,
			flags: cursor.read_i32(Endianness::Little)?,
			type_name: None,
			name: None,
		})
	}
}

/// Self-describing schema of one object class, rebuilt into a tree.
#[derive(Debug, Clone)]
pub struct TypeTree {
	/// Class id (negative for script types).
	pub class_id: i32,
	/// Nodes in serialized pre-order.
	pub nodes: Vec<TypeNode>,
	/// Class-local string buffer.
	pub string_buffer: Vec<u8>,
	children: Vec<Vec<usize>>,
}

impl TypeTree {
	/// Resolve node names and rebuild parent/child links from node depths.
	pub fn from_nodes(class_id: i32, mut nodes: Vec<TypeNode>, string_buffer: Vec<u8>) -> Result<Self> {
		for node in &mut nodes {
			node.type_name = resolve_name(node.type_offset, &string_buffer);
			node.name = resolve_name(node.name_offset, &string_buffer);
		}
		let children = build_children(&nodes)?;

		Ok(Self {
			class_id,
			nodes,
			string_buffer,
			children,
		})
	}

	/// Read one class entry of the type metadata section.
	pub fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
		let class_id = cursor.read_i32(Endianness::Little).map_err(malformed)?;
		cursor.skip(if class_id < 0 { 0x20 } else { 0x10 }).map_err(malformed)?;

		let node_count = cursor.read_u32(Endianness::Little).map_err(malformed)? as usize;
		let buffer_len = cursor.read_u32(Endianness::Little).map_err(malformed)? as usize;
		let need = node_count
			.checked_mul(TYPE_NODE_SIZE)
			.and_then(|bytes| bytes.checked_add(buffer_len))
			.filter(|need| *need <= cursor.remaining());
		if need.is_none() {
			return Err(BundleError::MalformedTypeTree {
				reason: format!(
					"class {class_id} declares {node_count} nodes and {buffer_len} string bytes, only {} bytes remain",
					cursor.remaining()
				),
			});
		}

		let mut nodes = Vec::with_capacity(node_count);
		for _ in 0..node_count {
			nodes.push(TypeNode::read(cursor)?);
		}
		let string_buffer = cursor.read_exact(buffer_len)?.to_vec();

		trace!("type tree class {class_id}: {node_count} nodes, {buffer_len} string bytes");
		Self::from_nodes(class_id, nodes, string_buffer)
	}

	/// Root node index.
	pub const ROOT: usize = 0;

	/// Look up a node by index.
	pub fn node(&self, idx: usize) -> &TypeNode {
		&self.nodes[idx]
	}

	/// Child node indexes of `idx`, in declared order.
	pub fn children(&self, idx: usize) -> &[usize] {
		self.children.get(idx).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Root node.
	pub fn root(&self) -> &TypeNode {
		&self.nodes[Self::ROOT]
	}

	/// Type name of the root node, i.e. the class name.
	pub fn root_type_name(&self) -> &str {
		self.root().type_name()
	}
}

/// Type metadata section of a serialized file.
#[derive(Debug, Clone)]
pub struct TypeMetadata {
	/// Engine build that wrote the file.
	pub generator_version: String,
	/// Target platform id.
	pub target_platform: u32,
	/// Whether full type trees are embedded.
	pub has_type_trees: bool,
	/// One tree per class present in the file.
	pub trees: Vec<TypeTree>,
}

impl TypeMetadata {
	/// Read the metadata section at the cursor. All integers are little-endian.
	pub fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
		let generator_version = cursor.read_cstring().map_err(malformed)?;
		let target_platform = cursor.read_u32(Endianness::Little).map_err(malformed)?;
		let has_type_trees = cursor.read_u8().map_err(malformed)? != 0;
		let count = cursor.read_i32(Endianness::Little).map_err(malformed)?;
		let count = usize::try_from(count).map_err(|_| BundleError::MalformedTypeTree {
			reason: format!("negative type count {count}"),
		})?;

		let mut trees = Vec::with_capacity(count.min(cursor.remaining() / 28));
		for _ in 0..count {
			trees.push(TypeTree::read(cursor)?);
		}

		Ok(Self {
			generator_version,
			target_platform,
			has_type_trees,
			trees,
		})
	}

	/// First tree whose class id equals an object's type id.
	pub fn tree_by_type_id(&self, type_id: i32) -> Option<&TypeTree> {
		self.trees.iter().find(|tree| tree.class_id == type_id)
	}

	/// First tree whose class id equals an object's class id.
	pub fn tree_by_class_id(&self, class_id: i16) -> Option<&TypeTree> {
		self.trees.iter().find(|tree| tree.class_id == i32::from(class_id))
	}
}

/// Parse the type metadata section at the start of `buf` and return its trees.
pub fn read_type_trees(buf: &[u8]) -> Result<Vec<TypeTree>> {
	let mut cursor = Cursor::new(buf);
	Ok(TypeMetadata::read(&mut cursor)?.trees)
}

/// Resolve a node string offset against the built-in catalogue or the class buffer.
pub fn resolve_name(offset: i32, local: &[u8]) -> Option<Box<str>> {
	if offset < 0 {
		let start = (offset as u32 & 0x7FFF_FFFF) as usize;
		let rest = COMMON_STRINGS.get(start..)?;
		let end = rest.find(' ')?;
		return Some(rest[..end].into());
	}

	let start = offset as usize;
	if start >= local.len() {
		return None;
	}
	let rest = &local[start..];
	let end = rest.iter().position(|byte| *byte == 0).unwrap_or(rest.len());
	Some(String::from_utf8_lossy(&rest[..end]).into_owned().into_boxed_str())
}

fn build_children(nodes: &[TypeNode]) -> Result<Vec<Vec<usize>>> {
	let Some(first) = nodes.first() else {
		return Err(BundleError::MalformedTypeTree {
			reason: "class has no nodes".to_owned(),
		});
	};
	if first.depth != 0 {
		return Err(BundleError::MalformedTypeTree {
			reason: format!("first node has depth {}", first.depth),
		});
	}

	let mut children = vec![Vec::new(); nodes.len()];
	let mut ancestors = vec![TypeTree::ROOT];
	for (idx, node) in nodes.iter().enumerate().skip(1) {
		while ancestors.last().is_some_and(|top| nodes[*top].depth >= node.depth) {
			ancestors.pop();
		}

		let parent = ancestors
			.last()
			.copied()
			.filter(|parent| u16::from(nodes[*parent].depth) + 1 == u16::from(node.depth))
			.ok_or_else(|| BundleError::MalformedTypeTree {
				reason: format!("node {idx} at depth {} has no parent at depth {}", node.depth, i32::from(node.depth) - 1),
			})?;

		children[parent].push(idx);
		ancestors.push(idx);
	}

	Ok(children)
}

fn malformed(err: BundleError) -> BundleError {
	match err {
		BundleError::BufferOverrun { at, need, rem } => BundleError::MalformedTypeTree {
			reason: format!("metadata overrun at offset {at}, need {need} bytes, remaining {rem}"),
		},
		other => other,
	}
}
