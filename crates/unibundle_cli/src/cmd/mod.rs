/// Generic object decode command.
pub mod decode;
/// Texture and sprite PNG export command.
pub mod export;
/// Bundle structure information command.
pub mod info;
/// Shared decoded-value printing helpers.
pub mod print;
/// Type-tree listing command.
pub mod types;
/// Shared CLI parsing and output helpers.
pub mod util;
