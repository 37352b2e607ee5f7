//! Deterministic text formatting
//!
//! Turns raw assistant text into structured blocks the renderer can style.
//! This is a pure function over strings: identical input always yields the
//! same block tree, and nothing here holds mutable state between calls.

use regex::Regex;
use std::sync::OnceLock;

const BULLET: char = '•';

static URL_REGEX: OnceLock<Regex> = OnceLock::new();
static DIGIT_REGEX: OnceLock<Regex> = OnceLock::new();

fn url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| {
        Regex::new(r"https?://[^\s]+").expect("Failed to compile URL regex")
    })
}

fn digit_regex() -> &'static Regex {
    DIGIT_REGEX.get_or_init(|| Regex::new(r"\d+").expect("Failed to compile digit regex"))
}

/// An inline run of text within a paragraph or list item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(String),
    /// A hyperlink; the URL serves as both label and target. Renderers must
    /// open it in a non-opener, no-referrer context.
    Link(String),
    /// A 3- or 4-digit run, highlighted so hotline numbers stand out.
    Emphasis(String),
}

/// One structural block of formatted content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Span>),
    List(Vec<Vec<Span>>),
}

pub type FormattedContent = Vec<Block>;

/// Format one raw response string into renderable blocks.
///
/// Lines whose trimmed form starts with `•` are grouped into lists; a list
/// closes at the first non-bullet line or at end of input. When the input
/// has no bullet markers at all, it is split on blank lines into paragraphs
/// instead. Blank lines never produce blocks.
pub fn format(text: &str) -> FormattedContent {
    let mut blocks = Vec::new();

    if text.contains(BULLET) {
        let mut items: Vec<Vec<Span>> = Vec::new();

        for line in text.lines() {
            let trimmed = line.trim();
            if let Some(rest) = trimmed.strip_prefix(BULLET) {
                items.push(annotate(rest.trim()));
            } else {
                if !items.is_empty() {
                    blocks.push(Block::List(std::mem::take(&mut items)));
                }
                if !trimmed.is_empty() {
                    blocks.push(Block::Paragraph(annotate(trimmed)));
                }
            }
        }

        if !items.is_empty() {
            blocks.push(Block::List(items));
        }
    } else {
        for chunk in text.split("\n\n") {
            let chunk = chunk.trim();
            if !chunk.is_empty() {
                blocks.push(Block::Paragraph(annotate(chunk)));
            }
        }
    }

    blocks
}

/// Apply the inline substitutions: URLs become links, then maximal digit
/// runs of exactly 3 or 4 digits are emphasized in the remaining text.
fn annotate(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut last = 0;

    for m in url_regex().find_iter(text) {
        if m.start() > last {
            annotate_digits(&text[last..m.start()], &mut spans);
        }
        spans.push(Span::Link(m.as_str().to_string()));
        last = m.end();
    }
    if last < text.len() {
        annotate_digits(&text[last..], &mut spans);
    }

    spans
}

fn annotate_digits(text: &str, out: &mut Vec<Span>) {
    let mut last = 0;

    for m in digit_regex().find_iter(text) {
        let len = m.end() - m.start();
        // Runs of 2 or fewer, or 5 or more, stay plain text
        if (3..=4).contains(&len) {
            if m.start() > last {
                out.push(Span::Text(text[last..m.start()].to_string()));
            }
            out.push(Span::Emphasis(m.as_str().to_string()));
            last = m.end();
        }
    }
    if last < text.len() {
        out.push(Span::Text(text[last..].to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Span {
        Span::Text(s.to_string())
    }

    #[test]
    fn test_bullet_grouping() {
        let blocks = format("• a\n• b\nc");
        assert_eq!(
            blocks,
            vec![
                Block::List(vec![vec![text("a")], vec![text("b")]]),
                Block::Paragraph(vec![text("c")]),
            ]
        );
    }

    #[test]
    fn test_list_closes_at_end_of_input() {
        let blocks = format("intro:\n• one\n• two");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec![text("intro:")]),
                Block::List(vec![vec![text("one")], vec![text("two")]]),
            ]
        );
    }

    #[test]
    fn test_blank_lines_dropped_in_bullet_path() {
        let blocks = format("• a\n\n• b");
        // The blank line ends the first list; the second bullet opens a new one
        assert_eq!(
            blocks,
            vec![
                Block::List(vec![vec![text("a")]]),
                Block::List(vec![vec![text("b")]]),
            ]
        );
    }

    #[test]
    fn test_no_bullet_paragraphing() {
        let blocks = format("Hello there.\n\nHow are you?");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec![text("Hello there.")]),
                Block::Paragraph(vec![text("How are you?")]),
            ]
        );
    }

    #[test]
    fn test_empty_input_yields_no_blocks() {
        assert!(format("").is_empty());
        assert!(format("\n\n\n").is_empty());
    }

    #[test]
    fn test_emphasis_on_three_and_four_digit_runs() {
        let blocks = format("Call 108 now");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                text("Call "),
                Span::Emphasis("108".to_string()),
                text(" now"),
            ])]
        );

        let blocks = format("Dial 1075 for covid help");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                text("Dial "),
                Span::Emphasis("1075".to_string()),
                text(" for covid help"),
            ])]
        );
    }

    #[test]
    fn test_short_and_long_digit_runs_left_plain() {
        assert_eq!(format("room 12"), vec![Block::Paragraph(vec![text("room 12")])]);
        assert_eq!(
            format("pin 12345"),
            vec![Block::Paragraph(vec![text("pin 12345")])]
        );
    }

    #[test]
    fn test_urls_become_links() {
        let blocks = format("See https://who.int/tips for more");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                text("See "),
                Span::Link("https://who.int/tips".to_string()),
                text(" for more"),
            ])]
        );
    }

    #[test]
    fn test_digits_inside_urls_are_not_emphasized() {
        let blocks = format("https://example.com/page/1234");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![Span::Link(
                "https://example.com/page/1234".to_string()
            )])]
        );
    }

    #[test]
    fn test_links_inside_list_items() {
        let blocks = format("• visit http://a.example\n• rest well");
        assert_eq!(
            blocks,
            vec![Block::List(vec![
                vec![text("visit "), Span::Link("http://a.example".to_string())],
                vec![text("rest well")],
            ])]
        );
    }

    #[test]
    fn test_format_is_pure() {
        let input = "• a\nCall 108\n\nhttps://who.int";
        assert_eq!(format(input), format(input));
    }
}
