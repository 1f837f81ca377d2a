//! Static rule tables for platforms and export formats.
//!
//! Identifiers are parsed into closed enums once, at the boundary. Platform
//! lookups that must never fail go through [`Platform::resolve`], which maps
//! unknown ids to the permissive `custom` profile.

mod format;
mod platform;

pub use format::{ExportFormat, FormatProfile};
pub use platform::{ParameterConstraint, Platform, PlatformProfile, WeightSyntax};

/// Resolve a platform id according to the strictness setting.
///
/// Strict mode rejects unknown ids with `UnsupportedPlatform`; otherwise they
/// fall back to `custom`.
pub fn resolve_platform(id: &str, strict: bool) -> crate::Result<Platform> {
    if strict {
        id.parse()
    } else {
        Ok(Platform::resolve(id))
    }
}
