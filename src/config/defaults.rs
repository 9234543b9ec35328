//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// Root Defaults
// ============================================================================

pub fn input_dir() -> std::path::PathBuf {
    "".into()
}

// ============================================================================
// [css] / [js] Section Defaults
// ============================================================================

pub mod css {
    pub fn output_dir() -> String {
        "css".into()
    }
}

pub mod js {
    pub fn output_dir() -> String {
        "js".into()
    }
}

// ============================================================================
// [cache] Section Defaults
// ============================================================================

pub mod cache {
    use std::path::PathBuf;

    pub fn file() -> PathBuf {
        ".yeti-bundle-hashes.json".into()
    }
}
