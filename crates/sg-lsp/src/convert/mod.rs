//! Conversions between `sg-analysis` types and LSP wire types.
//!
//! # Conversion Categories
//!
//! - **Position & Range** — converting between byte offsets and LSP
//!   `Position`/`Range` (§4.2 Position Mapper).
//! - **Diagnostics** — converting analyzer diagnostics to LSP `Diagnostic`
//!   (§4.7 Publisher).
//!
//! # UTF-16 Safety
//!
//! LSP uses UTF-16 code units for positions, while Rust strings use UTF-8.
//! All conversions must properly handle multi-byte characters and surrogate
//! pairs — see `position::offset_to_position`/`position_to_offset`.

pub mod diagnostic;
pub mod position;
