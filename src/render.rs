//! Markdown to sanitized inline HTML for bot messages.
//!
//! Model output is untrusted, so everything passes through `ammonia` before
//! it can reach a page. Parsing cannot fail: malformed markdown just comes
//! out as text.

use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};

/// Inline rendering: paragraph wrappers become a blank line (two breaks)
/// between paragraphs, and single newlines become breaks.
pub fn markdown_to_html(content: &str) -> String {
    let mut after_paragraph = false;
    let parser = Parser::new_ext(content, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH)
        .flat_map(move |event| match event {
            Event::Start(Tag::Paragraph) if after_paragraph => vec![Event::HardBreak, Event::HardBreak],
            Event::Start(Tag::Paragraph) => vec![],
            Event::End(TagEnd::Paragraph) => {
                after_paragraph = true;
                vec![]
            }
            Event::SoftBreak => vec![Event::HardBreak],
            item @ Event::Start(Tag::Item) => {
                after_paragraph = false;
                vec![item]
            }
            other => vec![other],
        });

    let mut html_output = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut html_output, parser);
    html_output
}

/// Render then sanitize. This is the only way bot text should become HTML.
pub fn render_message(content: &str) -> String {
    ammonia::clean(&markdown_to_html(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_becomes_strong() {
        let html = render_message("**bold** text");
        assert!(html.contains("<strong>bold</strong>"), "{html}");
        assert!(html.contains(" text"));
        assert!(!html.contains("<p>"));
    }

    #[test]
    fn test_script_is_stripped() {
        let html = render_message("<script>alert(1)</script>");
        assert!(!html.to_lowercase().contains("<script"), "{html}");
    }

    #[test]
    fn test_event_handlers_and_js_links_are_stripped() {
        let html = render_message(
            "<img src=\"x.png\" onerror=\"alert(1)\"> [click](javascript:alert(1)) <iframe src=\"https://evil\"></iframe>",
        );
        assert!(!html.contains("onerror"), "{html}");
        assert!(!html.contains("javascript:"), "{html}");
        assert!(!html.contains("<iframe"), "{html}");
    }

    #[test]
    fn test_single_newline_is_a_break() {
        let html = render_message("line one\nline two");
        assert!(html.contains("line one<br"), "{html}");
        assert!(html.contains("line two"));
    }

    #[test]
    fn test_paragraphs_stay_apart() {
        let html = render_message("a\n\nb");
        assert_eq!(html.matches("<br").count(), 2, "{html}");
        assert!(html.starts_with('a'), "{html}");
        assert!(html.ends_with('b'), "{html}");

        let html = render_message("Top pick: Pixel 8a.\n\nAlso consider OnePlus 12R.");
        assert!(!html.contains("8a.Also"), "{html}");
    }

    #[test]
    fn test_malformed_markdown_degrades_to_text() {
        let html = render_message("**unclosed [link](  `tick");
        assert!(html.contains("unclosed"));
        assert!(!html.is_empty());
    }

    #[test]
    fn test_comparison_table_renders() {
        let html = render_message("| Phone | Price |\n|---|---|\n| Pixel 8a | ₹52999 |");
        assert!(html.contains("<table>"), "{html}");
        assert!(html.contains("Pixel 8a"));
    }
}
