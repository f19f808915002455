//! Cleans wireframe HTML returned by the model.

const HTML_FENCE: &str = "```html";
const FENCE: &str = "```";

const SHELL_HEAD: &str = "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n    <meta charset=\"UTF-8\">\n    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n    <title>Improved UI Wireframe</title>\n</head>\n";

/// Extracts a standalone HTML document from model output.
///
/// Fenced output is unwrapped (an `html`-tagged fence wins over a bare one,
/// and the body runs to the last fence). A fragment that carries `<style>` or
/// `<body>` but no document root is wrapped in a minimal HTML5 shell. Returns
/// `None` when nothing is left.
#[must_use]
pub fn clean_wireframe_html(text: &str) -> Option<String> {
    let html = unfence(text.trim()).trim();
    if html.is_empty() {
        return None;
    }

    if is_document(html) {
        return Some(html.to_string());
    }

    if html.contains("<style>") || html.contains("<body>") {
        return Some(format!("{SHELL_HEAD}{html}\n</html>"));
    }

    Some(html.to_string())
}

fn unfence(text: &str) -> &str {
    let (open, tag_len) = match text.find(HTML_FENCE) {
        Some(idx) => (idx, HTML_FENCE.len()),
        None => match text.find(FENCE) {
            Some(idx) => (idx, FENCE.len()),
            None => return text,
        },
    };

    let start = open + tag_len;
    match text.rfind(FENCE) {
        Some(end) if end > start => &text[start..end],
        _ => &text[start..],
    }
}

fn is_document(html: &str) -> bool {
    let lower = html
        .trim_start()
        .chars()
        .take(9)
        .collect::<String>()
        .to_ascii_lowercase();
    lower.starts_with("<!doctype") || lower.starts_with("<html")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_document_passes_through() {
        let html = "<!DOCTYPE html>\n<html><body>hi</body></html>";
        assert_eq!(clean_wireframe_html(html).unwrap(), html);
    }

    #[test]
    fn test_html_fence_is_unwrapped() {
        let text = "Here you go:\n```html\n<!DOCTYPE html><html></html>\n```\nEnjoy";
        assert_eq!(clean_wireframe_html(text).unwrap(), "<!DOCTYPE html><html></html>");
    }

    #[test]
    fn test_bare_fence_is_unwrapped() {
        let text = "```\n<html><body></body></html>\n```";
        assert_eq!(clean_wireframe_html(text).unwrap(), "<html><body></body></html>");
    }

    #[test]
    fn test_fragment_is_wrapped() {
        let text = "<style>.a{}</style>\n<body><div class=\"a\"></div></body>";
        let html = clean_wireframe_html(text).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<div class=\"a\"></div>"));
        assert!(html.ends_with("</html>"));
    }

    #[test]
    fn test_plain_fragment_is_kept() {
        assert_eq!(clean_wireframe_html("<div>x</div>").unwrap(), "<div>x</div>");
    }

    #[test]
    fn test_empty_output() {
        assert_eq!(clean_wireframe_html("   "), None);
        assert_eq!(clean_wireframe_html("```html\n```"), None);
    }

    #[test]
    fn test_lowercase_doctype() {
        assert!(is_document("  <!doctype html><html></html>"));
    }
}
