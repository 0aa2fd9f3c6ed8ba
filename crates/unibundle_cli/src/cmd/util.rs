use std::io;
use std::path::Path;

use unibundle::bundle::{BundleError, Result};

/// Serialize `value` as pretty JSON to stdout.
pub(crate) fn emit_json<T: serde::Serialize>(value: &T) -> Result<()> {
	let rendered = serde_json::to_string_pretty(value).map_err(|err| BundleError::Io(io::Error::other(err)))?;
	println!("{rendered}");
	Ok(())
}

/// Read a whole bundle file into memory.
pub(crate) fn read_bundle(path: &Path) -> Result<Vec<u8>> {
	Ok(std::fs::read(path)?)
}

/// Render bytes as lowercase hex.
pub(crate) fn hex(bytes: &[u8]) -> String {
	bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Render a compression block or container flag word.
pub(crate) fn flags_hex(flags: u32) -> String {
	format!("0x{flags:x}")
}
