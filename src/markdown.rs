//! Converts markdown bodies into the derived fields of a
//! [`crate::store::RawDocument`]: rendered HTML, a plain-text excerpt and a
//! reading time.

use pulldown_cmark::{html, Event, Options, Parser, Tag};

/// The length, in characters, after which excerpts are pruned.
pub const EXCERPT_LENGTH: usize = 140;

/// Words read per minute when estimating reading time.
pub const WORDS_PER_MINUTE: f64 = 200.0;

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Renders markdown to HTML.
pub fn to_html(markdown: &str) -> String {
    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, Parser::new_ext(markdown, options()));
    output
}

/// Extracts the readable text of a markdown document, with whitespace
/// collapsed to single spaces.
pub fn to_plain_text(markdown: &str) -> String {
    let mut text = String::with_capacity(markdown.len());
    for event in Parser::new_ext(markdown, options()) {
        match event {
            Event::Text(s) | Event::Code(s) => text.push_str(&s),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::End(
                Tag::Paragraph
                | Tag::Heading(_)
                | Tag::Item
                | Tag::CodeBlock(_)
                | Tag::BlockQuote
                | Tag::TableCell,
            ) => text.push(' '),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Prunes `text` to at most `length` characters, cutting at a word boundary
/// and appending `…` when anything was removed.
pub fn excerpt(text: &str, length: usize) -> String {
    if text.chars().count() <= length {
        return text.to_owned();
    }

    let mut pruned = String::new();
    for word in text.split_whitespace() {
        let separator = if pruned.is_empty() { 0 } else { 1 };
        if pruned.chars().count() + separator + word.chars().count() > length {
            break;
        }
        if separator == 1 {
            pruned.push(' ');
        }
        pruned.push_str(word);
    }
    if pruned.is_empty() {
        // A single word longer than the limit.
        pruned = text.chars().take(length).collect();
    }
    pruned.push('…');
    pruned
}

/// Estimates reading time as display text, e.g. `4 min read`.
pub fn reading_time_text(text: &str) -> String {
    let words = text.split_whitespace().count();
    format!("{} min read", (words as f64 / WORDS_PER_MINUTE).ceil() as u64)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_to_html() {
        assert_eq!(
            "<h1>Hello</h1>\n<p><em>world</em></p>\n",
            to_html("# Hello\n\n*world*\n")
        );
    }

    #[test]
    fn test_to_plain_text() {
        assert_eq!(
            "Hello Some code and text. one two",
            to_plain_text("# Hello\n\nSome `code`\nand *text*.\n\n- one\n- two\n")
        );
    }

    #[test]
    fn test_excerpt() {
        assert_eq!("short", excerpt("short", 10));
        assert_eq!("one two…", excerpt("one two three", 9));
        assert_eq!("abcd…", excerpt("abcdefgh", 4));
    }

    #[test]
    fn test_reading_time_text() {
        assert_eq!("0 min read", reading_time_text(""));
        assert_eq!("1 min read", reading_time_text("a few words"));
        let long = vec!["word"; 401].join(" ");
        assert_eq!("3 min read", reading_time_text(&long));
    }
}
