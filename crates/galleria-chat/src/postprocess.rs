//! Assistant reply post-processing.
//!
//! Strips the retrieval collaborator's `[docN]` citation markers, then
//! renders the lightweight markup the model emits (headings, bold, links,
//! lists) to the HTML the front end displays. Pure and total: clean input
//! passes through unchanged, and the whole pipeline is idempotent because
//! rendered output no longer matches any of the patterns.

use std::sync::LazyLock;

use regex::Regex;

static CITATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[doc\d+\]").unwrap());
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").unwrap());
static UL_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[-*]\s+(.*)$").unwrap());
static OL_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+[.)]\s+(.*)$").unwrap());
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").unwrap());

/// Remove every `[docN]` citation marker.
pub fn strip_citations(text: &str) -> String {
    CITATION.replace_all(text, "").into_owned()
}

/// Render lightweight markup to display HTML.
///
/// Plain lines pass through untouched; only heading, bold, link, and list
/// syntax is rewritten.
pub fn render_markup(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut list: Option<&'static str> = None;

    for line in text.lines() {
        if let Some(caps) = HEADING.captures(line) {
            close_list(&mut out, &mut list);
            let level = caps[1].len();
            out.push(format!("<h{}>{}</h{}>", level, render_inline(&caps[2]), level));
        } else if let Some(caps) = UL_ITEM.captures(line) {
            open_list(&mut out, &mut list, "ul");
            out.push(format!("<li>{}</li>", render_inline(&caps[1])));
        } else if let Some(caps) = OL_ITEM.captures(line) {
            open_list(&mut out, &mut list, "ol");
            out.push(format!("<li>{}</li>", render_inline(&caps[1])));
        } else {
            close_list(&mut out, &mut list);
            out.push(render_inline(line));
        }
    }
    close_list(&mut out, &mut list);

    out.join("\n")
}

/// Strip citation markers, then render markup.
pub fn postprocess(raw: &str) -> String {
    render_markup(&strip_citations(raw))
}

fn render_inline(text: &str) -> String {
    let text = BOLD.replace_all(text, "<strong>$1</strong>");
    LINK.replace_all(&text, "<a href=\"$2\">$1</a>").into_owned()
}

fn open_list(out: &mut Vec<String>, list: &mut Option<&'static str>, tag: &'static str) {
    if *list != Some(tag) {
        close_list(out, list);
        out.push(format!("<{}>", tag));
        *list = Some(tag);
    }
}

fn close_list(out: &mut Vec<String>, list: &mut Option<&'static str>) {
    if let Some(tag) = list.take() {
        out.push(format!("</{}>", tag));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_every_citation_marker() {
        assert_eq!(strip_citations("Cost is 5€[doc1][doc23]."), "Cost is 5€.");
        assert_eq!(
            strip_citations("Open daily[doc4], except Sunday[doc12]."),
            "Open daily, except Sunday."
        );
    }

    #[test]
    fn test_leaves_non_citation_brackets_alone() {
        assert_eq!(strip_citations("[docs] and [doc] stay"), "[docs] and [doc] stay");
        assert_eq!(strip_citations("see [1]"), "see [1]");
    }

    #[test]
    fn test_plain_text_is_untouched() {
        let text = "Le centre est ouvert de 10h à 20h.\nBonne journée!";
        assert_eq!(postprocess(text), text);
    }

    #[test]
    fn test_renders_headings_and_bold() {
        assert_eq!(render_markup("## Horaires"), "<h2>Horaires</h2>");
        assert_eq!(
            render_markup("Ouvert **tous les jours**."),
            "Ouvert <strong>tous les jours</strong>."
        );
    }

    #[test]
    fn test_renders_links() {
        assert_eq!(
            render_markup("Plus d'infos : [Panasia](https://example.com/panasia)"),
            "Plus d'infos : <a href=\"https://example.com/panasia\">Panasia</a>"
        );
    }

    #[test]
    fn test_renders_unordered_list() {
        let input = "Options :\n- Sushi\n- Poké\nVoilà.";
        assert_eq!(
            render_markup(input),
            "Options :\n<ul>\n<li>Sushi</li>\n<li>Poké</li>\n</ul>\nVoilà."
        );
    }

    #[test]
    fn test_renders_ordered_list_with_inline_markup() {
        let input = "1. **Panasia**\n2. [Pokawa](https://example.com)";
        assert_eq!(
            render_markup(input),
            "<ol>\n<li><strong>Panasia</strong></li>\n<li><a href=\"https://example.com\">Pokawa</a></li>\n</ol>"
        );
    }

    #[test]
    fn test_list_closed_at_end_of_text() {
        assert_eq!(render_markup("- seul"), "<ul>\n<li>seul</li>\n</ul>");
    }

    #[test]
    fn test_postprocess_is_idempotent() {
        let raw = "## Restaurants[doc2]\n- **Panasia**[doc7]\n- [Pokawa](https://example.com)\nBon appétit!";
        let once = postprocess(raw);
        assert_eq!(postprocess(&once), once);
        assert!(!once.contains("[doc"));
    }

    #[test]
    fn test_full_reply() {
        let raw = "Voici le détail[doc1] :\n- Horaires : 10h à 20h[doc3]\n- Contact : **04 93 00 00 00**";
        assert_eq!(
            postprocess(raw),
            "Voici le détail :\n<ul>\n<li>Horaires : 10h à 20h</li>\n<li>Contact : <strong>04 93 00 00 00</strong></li>\n</ul>"
        );
    }
}
