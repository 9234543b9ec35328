//! JS transformer: syntax check with `oxc_parser`, minification with the
//! script minifier in `minify-html`.
//!
//! Code is parsed as an ES module first, so broken input fails with a
//! positioned error instead of being passed through. Minification runs the
//! code as the body of a `<script>` element and unwraps it again. Source
//! maps are not produced.

use super::diagnostic::line_column;
use super::{TransformError, TransformOptions, TransformOutput, Transformer};
use crate::bundle::AssetType;
use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;

const SCRIPT_OPEN: &str = "<script>";
const SCRIPT_CLOSE: &str = "</script>";

#[derive(Debug, Clone, Copy, Default)]
pub struct JsTransformer;

impl Transformer for JsTransformer {
    fn asset_type(&self) -> AssetType {
        AssetType::Js
    }

    fn transform(
        &self,
        code: &str,
        options: &TransformOptions<'_>,
    ) -> Result<TransformOutput, TransformError> {
        check_syntax(code)?;

        let code = if options.minify {
            minify_script(code)
        } else {
            code.to_owned()
        };
        Ok(TransformOutput { code, map: None })
    }
}

/// First parse error of `code`, positioned at its primary label.
fn check_syntax(code: &str) -> Result<(), TransformError> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, code, SourceType::mjs()).parse();

    let Some(error) = parsed.errors.first() else {
        return Ok(());
    };
    let error_out = TransformError::new(error.to_string());
    let offset = error
        .labels
        .as_ref()
        .and_then(|labels| labels.first())
        .map(|label| label.offset());

    Err(match offset {
        Some(offset) => {
            let (line, column) = line_column(code, offset);
            error_out.at(line, column)
        }
        None => error_out,
    })
}

fn minify_script(code: &str) -> String {
    let mut cfg = minify_html::Cfg::new();
    cfg.minify_js = true;
    cfg.keep_closing_tags = true;

    let wrapped = format!("{SCRIPT_OPEN}{code}{SCRIPT_CLOSE}");
    let minified = minify_html::minify(wrapped.as_bytes(), &cfg);
    let minified = String::from_utf8_lossy(&minified);

    // Fall back to the input if the minifier changed the wrapper
    minified
        .strip_prefix(SCRIPT_OPEN)
        .and_then(|rest| rest.strip_suffix(SCRIPT_CLOSE))
        .map_or_else(|| code.to_owned(), str::to_owned)
}
