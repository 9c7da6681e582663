//! Markup rendering for freeform replies

use pulldown_cmark::{html, Event, Options, Parser};

/// Renders plain or Markdown-ish text to markup that is safe to embed
pub trait MarkupFormatter: Send + Sync {
    fn render(&self, text: &str) -> String;
}

/// CommonMark to HTML; raw HTML in the input is escaped, never passed through
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownFormatter;

impl MarkupFormatter for MarkdownFormatter {
    fn render(&self, text: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);

        let events = Parser::new_ext(text, options).map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            other => other,
        });

        let mut rendered = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut rendered, events);
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(text: &str) -> String {
        MarkdownFormatter.render(text)
    }

    #[test]
    fn test_plain_text_becomes_paragraph() {
        assert_eq!(render("not json at all"), "<p>not json at all</p>\n");
    }

    #[test]
    fn test_basic_markdown() {
        let output = render("Drink **water** and _rest_.\n\n- one\n- two");
        assert!(output.contains("<strong>water</strong>"));
        assert!(output.contains("<em>rest</em>"));
        assert!(output.contains("<li>one</li>"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let output = render("<script>alert('xss')</script>");
        assert!(!output.contains("<script>"));
        assert!(output.contains("&lt;script&gt;"));

        let inline = render("hello <b onclick=\"x\">there</b>");
        assert!(!inline.contains("<b onclick"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render(""), "");
    }
}
