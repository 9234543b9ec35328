//! CSS transformer backed by `lightningcss`.
//!
//! Nesting is always lowered so bundles work in browsers without native
//! nesting support; minification and source maps follow the options.

use super::{TransformError, TransformOptions, TransformOutput, Transformer};
use crate::bundle::AssetType;
use lightningcss::{
    error::Error as CssError,
    stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet},
    targets::{Features, Targets},
};
use parcel_sourcemap::SourceMap;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, Default)]
pub struct CssTransformer;

impl Transformer for CssTransformer {
    fn asset_type(&self) -> AssetType {
        AssetType::Css
    }

    fn transform(
        &self,
        code: &str,
        options: &TransformOptions<'_>,
    ) -> Result<TransformOutput, TransformError> {
        let targets = Targets {
            include: Features::Nesting,
            ..Targets::default()
        };

        let mut sheet = StyleSheet::parse(
            code,
            ParserOptions {
                filename: options.filename.to_owned(),
                ..ParserOptions::default()
            },
        )
        .map_err(into_transform_error)?;

        sheet
            .minify(MinifyOptions {
                targets,
                ..MinifyOptions::default()
            })
            .map_err(into_transform_error)?;

        let mut source_map = if options.source_map {
            let mut map = SourceMap::new("/");
            map.add_source(options.filename);
            map.set_source_content(0, code)
                .map_err(|e| TransformError::new(format!("source map: {e}")))?;
            Some(map)
        } else {
            None
        };

        let result = sheet
            .to_css(PrinterOptions {
                minify: options.minify,
                source_map: source_map.as_mut(),
                targets,
                ..PrinterOptions::default()
            })
            .map_err(into_transform_error)?;

        let map = match source_map.as_mut() {
            Some(map) => Some(
                map.to_json(None)
                    .map_err(|e| TransformError::new(format!("source map: {e}")))?,
            ),
            None => None,
        };

        Ok(TransformOutput {
            code: result.code,
            map,
        })
    }
}

/// Convert a lightningcss error (which may borrow the input) into an owned one.
fn into_transform_error<T: Display>(err: CssError<T>) -> TransformError {
    let error = TransformError::new(err.kind.to_string());
    match err.loc {
        // lightningcss lines are 0-based, columns 1-based
        Some(loc) => error.at(loc.line as usize + 1, loc.column as usize),
        None => error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(minify: bool, source_map: bool) -> TransformOptions<'static> {
        TransformOptions {
            filename: "main.css",
            minify,
            source_map,
        }
    }

    #[test]
    fn test_minify() {
        let output = CssTransformer
            .transform("body {\n  margin: 0;\n}\n\nh1 { color: red; }", &options(true, false))
            .unwrap();
        assert_eq!(output.code, "body{margin:0}h1{color:red}");
        assert!(output.map.is_none());
    }

    #[test]
    fn test_nesting_is_lowered() {
        let output = CssTransformer
            .transform(".card { & h2 { color: red } }", &options(true, false))
            .unwrap();
        assert_eq!(output.code, ".card h2{color:red}");
    }

    #[test]
    fn test_unminified_output_is_pretty() {
        let output = CssTransformer
            .transform("a{color:red}", &options(false, false))
            .unwrap();
        assert!(output.code.contains("color: red"));
    }

    #[test]
    fn test_source_map() {
        let output = CssTransformer
            .transform("a { color: red }", &options(true, true))
            .unwrap();
        let map = output.map.unwrap();
        assert!(map.contains("\"mappings\""));
        assert!(map.contains("main.css"));
    }

    #[test]
    fn test_parse_error_has_position() {
        let err = CssTransformer
            .transform("a { color: red }\n.b$c { color: blue }", &options(true, false))
            .unwrap_err();
        assert!(!err.message.is_empty());
        assert_eq!(err.line, Some(2));
    }
}
