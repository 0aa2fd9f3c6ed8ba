//! Public library API for extracting textures and sprites from UnityFS asset bundles.

/// Bundle parsing, type-tree decoding, texture decoding, and sprite extraction.
pub mod bundle;
