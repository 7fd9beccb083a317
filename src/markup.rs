//! Message text → safe display markup.
//!
//! The input is HTML-escaped first, then run through a fixed pipeline of
//! passes. Code regions are frozen as soon as they are produced: the pass
//! replaces them with an opaque placeholder and the real markup is spliced
//! back in at the very end, so no later pass can see inside them.
//!
//! ```text
//! escape → fenced code → inline code → bold → italic → headings → links → line breaks → thaw
//! ```
//!
//! Unbalanced delimiters are left alone and come out as escaped literal text.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::core::message::Message;

/// Placeholder delimiters for frozen regions. Both are private-use code
/// points; any occurrence in user input is replaced before the passes run.
const FROZEN_OPEN: char = '\u{E000}';
const FROZEN_CLOSE: char = '\u{E001}';

static FENCED_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(.*?)```").expect("fenced code pattern"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("inline code pattern"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.+?)\*").expect("italic pattern"));
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,3}) (.*)$").expect("heading pattern"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]\((.*?)\)").expect("link pattern"));
static FROZEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{E000}(\\d+)\u{E001}").expect("frozen pattern"));

/// Link targets that are allowed to become hyperlinks.
const SAFE_URL_PREFIXES: &[&str] = &["http://", "https://", "mailto:"];

/// Text on its way through the pipeline, plus the regions already frozen.
#[derive(Debug, Default)]
struct Draft {
    text: String,
    frozen: Vec<String>,
}

impl Draft {
    fn freeze(&mut self, markup: String) -> String {
        let index = self.frozen.len();
        self.frozen.push(markup);
        format!("{FROZEN_OPEN}{index}{FROZEN_CLOSE}")
    }
}

type Pass = fn(Draft) -> Draft;

const PASSES: &[Pass] = &[
    fenced_code,
    inline_code,
    bold,
    italic,
    headings,
    links,
    line_breaks,
];

/// Converts raw message text into markup that is safe to inject into a page.
pub fn format(raw: &str) -> String {
    let draft = Draft {
        text: escape_html(&neutralize_placeholders(raw)),
        frozen: Vec::new(),
    };
    let draft = PASSES.iter().fold(draft, |draft, pass| pass(draft));
    thaw(draft)
}

/// Escapes every character that could open or close markup structure.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn neutralize_placeholders(raw: &str) -> String {
    raw.replace([FROZEN_OPEN, FROZEN_CLOSE], "\u{FFFD}")
}

fn fenced_code(mut draft: Draft) -> Draft {
    let text = std::mem::take(&mut draft.text);
    draft.text = FENCED_CODE
        .replace_all(&text, |caps: &Captures| {
            draft.freeze(format!(
                "<div class=\"code-block\"><code>{}</code></div>",
                caps[1].trim()
            ))
        })
        .into_owned();
    draft
}

fn inline_code(mut draft: Draft) -> Draft {
    let text = std::mem::take(&mut draft.text);
    draft.text = INLINE_CODE
        .replace_all(&text, |caps: &Captures| {
            draft.freeze(format!("<code class=\"inline-code\">{}</code>", &caps[1]))
        })
        .into_owned();
    draft
}

fn bold(mut draft: Draft) -> Draft {
    draft.text = BOLD
        .replace_all(&draft.text, "<strong>$1</strong>")
        .into_owned();
    draft
}

fn italic(mut draft: Draft) -> Draft {
    draft.text = ITALIC.replace_all(&draft.text, "<em>$1</em>").into_owned();
    draft
}

fn headings(mut draft: Draft) -> Draft {
    draft.text = HEADING
        .replace_all(&draft.text, |caps: &Captures| {
            let level = caps[1].len();
            format!("<h{level}>{}</h{level}>", &caps[2])
        })
        .into_owned();
    draft
}

fn links(mut draft: Draft) -> Draft {
    draft.text = LINK
        .replace_all(&draft.text, |caps: &Captures| {
            let url = &caps[2];
            // A frozen code region would be spliced back into the attribute.
            let safe = !url.contains(FROZEN_OPEN)
                && SAFE_URL_PREFIXES.iter().any(|p| url.starts_with(p));
            if safe {
                format!(
                    "<a href=\"{url}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
                    &caps[1]
                )
            } else {
                caps[0].to_string()
            }
        })
        .into_owned();
    draft
}

fn line_breaks(mut draft: Draft) -> Draft {
    draft.text = draft.text.replace('\n', "<br>");
    draft
}

fn thaw(draft: Draft) -> String {
    FROZEN
        .replace_all(&draft.text, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| draft.frozen.get(i))
                .cloned()
                .unwrap_or_default()
        })
        .into_owned()
}

/// Renders a full message bubble: formatted content plus a meta line with
/// the local time and token estimate.
pub fn render_message(message: &Message) -> String {
    let sender = message.sender().as_str();
    format!(
        "<div class=\"message {sender}\" id=\"msg-{id}\">\
         <div class=\"message-content\">{content}</div>\
         <div class=\"message-meta\"><span>{time}</span><span>⚡{tokens} tokens</span></div>\
         </div>",
        id = message.id(),
        content = format(message.content()),
        time = message.timestamp().format("%H:%M:%S"),
        tokens = message.token_estimate(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Sender;
    use crate::core::store::Conversation;

    macro_rules! test_format_rules {
        ( $($name:ident: $input:expr => $expected:expr,)+ ) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!(format($input), $expected);
                }
            )+
        };
    }

    test_format_rules! {
        test_format_plain_text: "no markup here" => "no markup here",
        test_format_bold: "a **b** c" => "a <strong>b</strong> c",
        test_format_italic: "a *b* c" => "a <em>b</em> c",
        test_format_inline_code: "use `cargo`" => "use <code class=\"inline-code\">cargo</code>",
        test_format_heading_h1: "# Title" => "<h1>Title</h1>",
        test_format_heading_h2: "## Title" => "<h2>Title</h2>",
        test_format_heading_h3: "### Title" => "<h3>Title</h3>",
        test_format_four_hashes_not_heading: "#### Title" => "#### Title",
        test_format_heading_needs_line_start: "see # Title" => "see # Title",
        test_format_heading_on_second_line: "intro\n## Part" => "intro<br><h2>Part</h2>",
        test_format_newlines: "one\ntwo" => "one<br>two",
        test_format_link: "[docs](https://example.com)" =>
            "<a href=\"https://example.com\" target=\"_blank\" rel=\"noopener noreferrer\">docs</a>",
        test_format_unsafe_link_left_literal: "[x](javascript:alert(1))" => "[x](javascript:alert(1))",
        test_format_unbalanced_bold: "**open" => "**open",
        test_format_unbalanced_backtick: "a ` b" => "a ` b",
        test_format_bold_then_italic: "**a** and *b*" => "<strong>a</strong> and <em>b</em>",
        test_format_empty: "" => "",
        test_format_inline_code_in_link_target_left_literal: "[docs](https://a.com/`x`)" =>
            "[docs](https://a.com/<code class=\"inline-code\">x</code>)",
        test_format_fenced_code_in_link_target_left_literal:
            "[docs](https://a.com/```onmouseover=alert(1)```)" =>
            "[docs](https://a.com/<div class=\"code-block\"><code>onmouseover=alert(1)</code></div>)",
        test_format_inline_code_in_link_text: "[`cargo`](https://doc.rust-lang.org)" =>
            "<a href=\"https://doc.rust-lang.org\" target=\"_blank\" rel=\"noopener noreferrer\"><code class=\"inline-code\">cargo</code></a>",
    }

    #[test]
    fn test_format_escapes_script_tags() {
        let out = format("<script>alert(1)</script>");
        assert!(!out.contains("<script>"));
        assert_eq!(out, "&lt;script&gt;alert(1)&lt;/script&gt;");
    }

    #[test]
    fn test_format_escapes_quotes_and_ampersands() {
        assert_eq!(format("\"a\" & 'b'"), "&quot;a&quot; &amp; &#39;b&#39;");
    }

    #[test]
    fn test_format_fenced_code_block_trimmed() {
        let out = format("```\n|0⟩ + |1⟩ = superposition\n```");
        assert_eq!(
            out,
            "<div class=\"code-block\"><code>|0⟩ + |1⟩ = superposition</code></div>"
        );
    }

    #[test]
    fn test_format_code_is_not_reinterpreted() {
        let out = format("`**not bold**` and ```*x*\n# y```");
        assert!(!out.contains("<strong>"));
        assert!(!out.contains("<em>"));
        assert!(!out.contains("<h1>"));
        assert!(out.contains("<code class=\"inline-code\">**not bold**</code>"));
        // Newlines inside fenced code survive untouched.
        assert!(out.contains("*x*\n# y"));
    }

    #[test]
    fn test_format_escapes_inside_code() {
        let out = format("`<b>`");
        assert_eq!(out, "<code class=\"inline-code\">&lt;b&gt;</code>");
    }

    #[test]
    fn test_format_link_url_cannot_break_attribute() {
        let out = format("[x](https://a.com\" onclick=\"evil)");
        assert!(!out.contains("\" onclick"));
    }

    #[test]
    fn test_format_placeholder_chars_in_input_are_neutralized() {
        let out = format("\u{E000}0\u{E001} `code`");
        assert!(out.starts_with('\u{FFFD}'));
        assert_eq!(out.matches("<code").count(), 1);
    }

    #[test]
    fn test_render_message_bubble() {
        let mut conv = Conversation::new();
        let msg = conv.append("**hi** <b>", Sender::Assistant);
        let html = render_message(&msg);
        assert!(html.starts_with(&format!("<div class=\"message assistant\" id=\"msg-{}\">", msg.id())));
        assert!(html.contains("<strong>hi</strong> &lt;b&gt;"));
        assert!(html.contains("⚡3 tokens"));
    }
}
