//! CSS/JS transformers.
//!
//! The page compiler and the bundle writer only see the [`Transformer`]
//! trait, so tests can swap in counting or failing transformers.
//!
//! | Asset | Transformer        | Backend                        | Source maps |
//! |-------|--------------------|--------------------------------|-------------|
//! | css   | [`CssTransformer`] | `lightningcss`                 | yes         |
//! | js    | [`JsTransformer`]  | `oxc_parser` + `minify-html`   | no          |

mod css;
mod diagnostic;
mod js;

pub use css::CssTransformer;
pub use diagnostic::code_frame;
pub use js::JsTransformer;

use crate::bundle::AssetType;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct TransformOptions<'a> {
    /// Name reported in diagnostics and source maps.
    pub filename: &'a str,
    pub minify: bool,
    pub source_map: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOutput {
    pub code: String,
    /// Source map JSON, when requested and supported.
    pub map: Option<String>,
}

/// Failure reported by a transformer, with a 1-based position when known.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TransformError {
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// `filename:line:column: message`, followed by a code frame of `source`
    /// when the position is known.
    pub fn report(&self, filename: &str, source: &str) -> String {
        match (self.line, self.column) {
            (Some(line), Some(column)) => {
                let frame = code_frame(source, line, column);
                if frame.is_empty() {
                    format!("{filename}:{line}:{column}: {}", self.message)
                } else {
                    format!("{filename}:{line}:{column}: {}\n{frame}", self.message)
                }
            }
            _ => format!("{filename}: {}", self.message),
        }
    }
}

/// A CSS or JS transformer (minify, lower, emit source maps).
pub trait Transformer: Send + Sync {
    fn asset_type(&self) -> AssetType;

    fn transform(
        &self,
        code: &str,
        options: &TransformOptions<'_>,
    ) -> Result<TransformOutput, TransformError>;
}

// ============================================================================
// Transformer Set
// ============================================================================

/// The transformers used for one build.
#[derive(Clone)]
pub struct Transformers {
    css: Arc<dyn Transformer>,
    js: Arc<dyn Transformer>,
}

impl Default for Transformers {
    fn default() -> Self {
        Self::new(Arc::new(CssTransformer), Arc::new(JsTransformer))
    }
}

impl Transformers {
    pub fn new(css: Arc<dyn Transformer>, js: Arc<dyn Transformer>) -> Self {
        Self { css, js }
    }

    /// Transformer for `asset`; html has none.
    pub fn get(&self, asset: AssetType) -> Option<&dyn Transformer> {
        match asset {
            AssetType::Css => Some(self.css.as_ref()),
            AssetType::Js => Some(self.js.as_ref()),
            AssetType::Html => None,
        }
    }
}

impl std::fmt::Debug for Transformers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformers").finish_non_exhaustive()
    }
}
