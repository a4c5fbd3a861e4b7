//! Visible text from raw page HTML.
//!
//! Block-level elements become line breaks so the Facebook comment layout
//! (name, amount, age and action links in separate elements) survives as
//! separate lines for the multiline matcher.

use scraper::{ElementRef, Html, Node};

/// Elements whose content is never rendered as text.
const HIDDEN: &[&str] = &["script", "style", "noscript", "template", "svg", "head"];

/// Elements that start a new line.
const BLOCK: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol",
    "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Extract newline-structured visible text from an HTML document.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut buffer = String::with_capacity(html.len() / 4);
    collect_text(document.root_element(), &mut buffer);

    buffer
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// One step of the document walk.
enum Step<N> {
    Enter(N),
    /// Closing edge of a block element.
    LeaveBlock,
}

/// Depth-first walk with an explicit stack; page nesting depth is
/// unbounded.
fn collect_text(root: ElementRef<'_>, out: &mut String) {
    let mut stack = vec![Step::Enter(*root)];

    while let Some(step) = stack.pop() {
        let node = match step {
            Step::LeaveBlock => {
                out.push('\n');
                continue;
            }
            Step::Enter(node) => node,
        };

        match node.value() {
            // Source newlines are layout, not structure.
            Node::Text(text) => {
                out.extend(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }))
            }
            Node::Element(element) => {
                let name = element.name();
                if HIDDEN.contains(&name) {
                    continue;
                }
                if BLOCK.contains(&name) {
                    out.push('\n');
                    stack.push(Step::LeaveBlock);
                }
                stack.extend(node.children().rev().map(Step::Enter));
            }
            _ => {}
        }
    }
}
