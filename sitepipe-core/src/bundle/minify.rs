//! Minifier wrappers shared by the bundling step.

use anyhow::{anyhow, Result};
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use minify_js::{Session, TopLevelMode};

/// Minify a CSS bundle.
pub(crate) fn css(source: &str) -> Result<Vec<u8>> {
    let sheet = StyleSheet::parse(source, ParserOptions::default())
        .map_err(|e| anyhow!("failed to parse css: {e}"))?;
    let output = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("failed to print css: {e}"))?;
    Ok(output.code.into_bytes())
}

/// Minify a JavaScript bundle.
pub(crate) fn js(source: &str) -> Result<Vec<u8>> {
    let session = Session::new();
    let mut out = Vec::new();
    minify_js::minify(&session, TopLevelMode::Global, source.as_bytes(), &mut out)
        .map_err(|e| anyhow!("failed to minify js: {e:?}"))?;
    Ok(out)
}

/// Minify an HTML page, including inline styles and scripts.
pub(crate) fn html(source: &[u8]) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.minify_css = true;
    cfg.minify_js = true;
    minify_html::minify(source, &cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_minifies_whitespace() {
        let out = css("body {\n  color: red;\n}\n").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("color:red"), "got: {text}");
    }

    #[test]
    fn test_css_drops_invalid_declarations() {
        // CSS error recovery: a bad declaration is discarded, the rest
        // of the sheet survives.
        let out = css("body { color: }\np { margin: 0 }").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("color"), "got: {text}");
        assert!(text.contains("margin:0"), "got: {text}");
    }

    #[test]
    fn test_js_shrinks_source() {
        let source = "function add (a, b) {\n    return a + b;\n}\n";
        let out = js(source).unwrap();
        assert!(out.len() < source.len());
        assert!(String::from_utf8_lossy(&out).contains("add"));
    }

    #[test]
    fn test_html_collapses_whitespace() {
        let out = html(b"<p>\n    spaced     out\n</p>");
        assert!(out.len() < b"<p>\n    spaced     out\n</p>".len());
    }
}
