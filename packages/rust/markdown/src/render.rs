//! Per-tag Markdown rendering and plain-text flattening.
//!
//! Rendering is a pure function of an element's subtree. Soft hyphens are
//! stripped from every string produced here; comment nodes contribute nothing.

use scraper::{ElementRef, Node};

use crate::classify::heading_level;

const SOFT_HYPHEN: char = '\u{AD}';

/// Render one element as Markdown.
pub fn render_markdown(el: ElementRef<'_>) -> String {
    let tag = el.value().name();

    let rendered = if let Some(level) = heading_level(tag) {
        format!("{} {}\n", "#".repeat(usize::from(level)), inline_text(el))
    } else {
        match tag {
            "blockquote" => format!("> {}\n", inline_text(el)),
            "p" => format!("{}\n\n", inline_text(el)),
            "ul" | "ol" => render_list(el, tag == "ol"),
            "li" => format!("- {}", inline_text(el)),
            "a" => render_link(el),
            "img" | "figure" => render_image(el),
            "code" => format!("`{}`", inline_text(el)),
            "pre" => format!("```\n{}\n```", inline_text(el)),
            "table" => render_table(el),
            // section, article, aside, components and anything else
            _ => inline_text(el),
        }
    };

    strip_soft_hyphens(&rendered)
}

/// Visible text: descendant text runs trimmed, empty runs dropped, joined by a space.
pub fn plain_text(el: ElementRef<'_>) -> String {
    let joined = el
        .text()
        .map(str::trim)
        .filter(|run| !run.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    strip_soft_hyphens(&joined)
}

/// Raw text runs concatenated, with nested links kept as `[text](href)`.
fn inline_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_inline(el, &mut out);
    out
}

fn push_inline(el: ElementRef<'_>, out: &mut String) {
    if el.value().name() == "a" {
        if let Some(href) = inline_href(el) {
            out.push_str(&format!("[{}]({href})", plain_text(el)));
            return;
        }
    }

    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    push_inline(child_el, out);
                }
            }
            _ => {}
        }
    }
}

/// Nested links keep any href except a bare `#`, including an empty one.
fn inline_href<'a>(el: ElementRef<'a>) -> Option<&'a str> {
    el.value().attr("href").filter(|href| *href != "#")
}

fn render_list(el: ElementRef<'_>, ordered: bool) -> String {
    child_elements(el, &["li"])
        .enumerate()
        .map(|(idx, li)| {
            let bullet = if ordered {
                format!("{}. ", idx + 1)
            } else {
                "- ".to_string()
            };
            bullet + &plain_text(li)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_link(el: ElementRef<'_>) -> String {
    let text = plain_text(el);
    if text.is_empty() {
        return String::new();
    }
    match inline_href(el).filter(|href| !href.is_empty()) {
        Some(href) => format!("[{text}]({href})"),
        None => text,
    }
}

fn render_image(el: ElementRef<'_>) -> String {
    let src = el.value().attr("src").unwrap_or("");
    let alt = el
        .value()
        .attr("alt")
        .filter(|alt| !alt.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| plain_text(el));

    if src.is_empty() && alt.is_empty() {
        return String::new();
    }
    format!("![{alt}]({src})")
}

fn render_table(el: ElementRef<'_>) -> String {
    table_rows(el)
        .into_iter()
        .filter_map(|tr| {
            let cells: Vec<String> = child_elements(tr, &["th", "td"]).map(plain_text).collect();
            (!cells.is_empty()).then(|| cells.join(" | "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rows directly under the table or under its thead/tbody/tfoot.
///
/// The HTML parser wraps bare `<tr>` elements in an implied `<tbody>`.
fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in child_elements(table, &["tr", "thead", "tbody", "tfoot"]) {
        if child.value().name() == "tr" {
            rows.push(child);
        } else {
            rows.extend(child_elements(child, &["tr"]));
        }
    }
    rows
}

fn child_elements<'a>(
    el: ElementRef<'a>,
    tags: &'a [&'a str],
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| tags.contains(&child.value().name()))
}

fn strip_soft_hyphens(s: &str) -> String {
    s.replace(SOFT_HYPHEN, "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn render_first(html: &str, selector: &str) -> String {
        let doc = Html::parse_document(html);
        let sel = Selector::parse(selector).unwrap();
        let el = doc.select(&sel).next().expect("element present");
        render_markdown(el)
    }

    #[test]
    fn heading_levels() {
        assert_eq!(render_first("<h1>Title</h1>", "h1"), "# Title\n");
        assert_eq!(render_first("<h4>Deep</h4>", "h4"), "#### Deep\n");
    }

    #[test]
    fn paragraph_keeps_nested_links() {
        let md = render_first(
            r#"<p>Paragraph with <a href="https://example.com">link</a></p>"#,
            "p",
        );
        assert_eq!(md, "Paragraph with [link](https://example.com)\n\n");
    }

    #[test]
    fn hash_links_flatten_to_text() {
        let md = render_first(r##"<p>Go <a href="#">nowhere</a></p>"##, "p");
        assert_eq!(md, "Go nowhere\n\n");
        assert_eq!(render_first(r##"<a href="#">top</a>"##, "a"), "top");
        assert_eq!(render_first(r#"<a href="/x"></a>"#, "a"), "");
    }

    #[test]
    fn empty_href_is_kept_inline_only() {
        let md = render_first(r#"<p>Go <a href="">x</a></p>"#, "p");
        assert_eq!(md, "Go [x]()

");
        assert_eq!(render_first(r#"<p>Go <a>x</a></p>"#, "p"), "Go x

");
        assert_eq!(render_first(r#"<a href="">x</a>"#, "a"), "x");
    }

    #[test]
    fn blockquote_and_code() {
        assert_eq!(render_first("<blockquote>Wise</blockquote>", "blockquote"), "> Wise\n");
        assert_eq!(render_first("<p><code>x = 1</code></p>", "code"), "`x = 1`");
        assert_eq!(
            render_first("<pre>line1\nline2</pre>", "pre"),
            "```\nline1\nline2\n```"
        );
    }

    #[test]
    fn lists_only_use_direct_items() {
        let html = "<ol><li>First</li><li>Second<ul><li>Nested</li></ul></li></ol>";
        let md = render_first(html, "ol");
        assert_eq!(md, "1. First\n2. Second Nested");

        let md = render_first("<ul><li>A</li><li>B</li></ul>", "ul");
        assert_eq!(md, "- A\n- B");
        assert_eq!(render_first("<ul><li>Solo</li></ul>", "li"), "- Solo");
    }

    #[test]
    fn images_and_figures() {
        assert_eq!(
            render_first(r#"<img src="/img.png" alt="Pic">"#, "img"),
            "![Pic](/img.png)"
        );
        assert_eq!(render_first(r#"<img alt="No source">"#, "img"), "![No source]()");
        assert_eq!(render_first("<img>", "img"), "");
        assert_eq!(
            render_first("<figure><img src=\"/a.png\"><figcaption>Caption</figcaption></figure>", "figure"),
            "![Caption]()"
        );
    }

    #[test]
    fn table_rows_joined_with_pipes() {
        let html = "<table><tr><th>H1</th><th>H2</th></tr><tr></tr><tr><td>A1</td><td>B1</td></tr></table>";
        assert_eq!(render_first(html, "table"), "H1 | H2\nA1 | B1");
    }

    #[test]
    fn soft_hyphens_and_comments_are_dropped() {
        let md = render_first("<p>Soft\u{AD}hyphen<!-- secret --></p>", "p");
        assert_eq!(md, "Softhyphen\n\n");

        let doc = Html::parse_document("<p>Long\u{AD}word  <b> bold </b></p>");
        let sel = Selector::parse("p").unwrap();
        let p = doc.select(&sel).next().unwrap();
        assert_eq!(plain_text(p), "Longword bold");
    }

    #[test]
    fn sections_render_flattened_text() {
        assert_eq!(render_first("<aside>Side <em>note</em></aside>", "aside"), "Side note");
    }
}
