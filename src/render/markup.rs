//! Text-to-markup formatter for analysis bodies.
//!
//! The service returns plain prose. [`format_analysis_text`] turns it into a
//! small HTML subset (`<p>`, `<br>`, `<strong>`, `<span style=...>`) through a
//! fixed sequence of substitution passes; [`parse_markup`] reads that subset
//! back into styled runs for presentation layers that cannot show HTML.

use regex::{Captures, Regex};
use std::sync::OnceLock;

pub const KPI_COLOR: &str = "#2563eb";
pub const POSITIVE_COLOR: &str = "#10b981";
pub const NEGATIVE_COLOR: &str = "#ef4444";

const KPI_TERMS: &[&str] = &[
    "NPL",
    "LLP",
    "RAROC",
    "PMI",
    "Ifo",
    "cost/income",
    "net interest income",
    "allowance for loan losses",
    "provision for credit losses",
];

// Stems; a whole word starting with one of these is coloured.
const POSITIVE_STEMS: &[&str] = &[
    "increase", "growth", "improv", "positive", "higher", "better",
];
const NEGATIVE_STEMS: &[&str] = &[
    "decrease",
    "declin",
    "deteriorat",
    "negative",
    "lower",
    "worse",
];

static EMPHASIS_RE: OnceLock<Option<Regex>> = OnceLock::new();
static KPI_RE: OnceLock<Option<Regex>> = OnceLock::new();
static POSITIVE_RE: OnceLock<Option<Regex>> = OnceLock::new();
static NEGATIVE_RE: OnceLock<Option<Regex>> = OnceLock::new();
static STYLE_COLOR_RE: OnceLock<Option<Regex>> = OnceLock::new();

/// A rejected pattern is logged and its pass is skipped.
fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern)
        .map_err(|e| tracing::error!(error = %e, pattern, "formatter pattern rejected"))
        .ok()
}

fn emphasis_re() -> Option<&'static Regex> {
    // `by 3%` must be wrapped once, so both forms live in one alternation.
    EMPHASIS_RE
        .get_or_init(|| compile(r"\bby (\d+(?:\.\d+)?%?)|(\d+(?:\.\d+)?%)"))
        .as_ref()
}

fn kpi_re() -> Option<&'static Regex> {
    KPI_RE.get_or_init(|| {
        let alternation = KPI_TERMS
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        compile(&format!(r"(?i)\b(?:{alternation})\b"))
    })
    .as_ref()
}

fn stem_re(stems: &[&str]) -> Option<Regex> {
    compile(&format!(r"(?i)\b(?:{})\w*", stems.join("|")))
}

fn positive_re() -> Option<&'static Regex> {
    POSITIVE_RE.get_or_init(|| stem_re(POSITIVE_STEMS)).as_ref()
}

fn negative_re() -> Option<&'static Regex> {
    NEGATIVE_RE.get_or_init(|| stem_re(NEGATIVE_STEMS)).as_ref()
}

fn style_color_re() -> Option<&'static Regex> {
    STYLE_COLOR_RE
        .get_or_init(|| compile(r"color:\s*(#[0-9a-fA-F]{6})"))
        .as_ref()
}

fn substitute(re: Option<&Regex>, text: String, replacement: impl FnMut(&Captures) -> String) -> String {
    match re {
        Some(re) => re.replace_all(&text, replacement).into_owned(),
        None => text,
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

/// Format an analysis body. Passes run in a fixed order, each over the output
/// of the previous one: paragraphs, percentage/by-phrase bolding, KPI terms,
/// positive words, negative words.
pub fn format_analysis_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut formatted = escape_html(text)
        .replace("\n\n", "</p><p>")
        .replace('\n', "<br>");
    if !formatted.starts_with("<p>") {
        formatted.insert_str(0, "<p>");
    }
    if !formatted.ends_with("</p>") {
        formatted.push_str("</p>");
    }

    let formatted = substitute(emphasis_re(), formatted, |caps: &Captures| {
        match caps.get(1) {
            Some(number) => format!("by <strong>{}</strong>", number.as_str()),
            None => format!("<strong>{}</strong>", &caps[2]),
        }
    });

    let formatted = substitute(kpi_re(), formatted, |caps: &Captures| {
        format!(
            "<span style=\"color: {KPI_COLOR}; font-weight: 600;\">{}</span>",
            &caps[0]
        )
    });

    let formatted = substitute(positive_re(), formatted, |caps: &Captures| {
        format!("<span style=\"color: {POSITIVE_COLOR};\">{}</span>", &caps[0])
    });

    substitute(negative_re(), formatted, |caps: &Captures| {
        format!("<span style=\"color: {NEGATIVE_COLOR};\">{}</span>", &caps[0])
    })
}

/// A styled piece of text inside one markup line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct RunStyle {
    bold: bool,
    color: Option<String>,
}

fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn span_style(tag: &str) -> RunStyle {
    RunStyle {
        bold: tag.contains("font-weight: 600") || tag.contains("font-weight:600"),
        color: style_color_re()
            .and_then(|re| re.captures(tag))
            .map(|c| c[1].to_string()),
    }
}

fn push_text(line: &mut Vec<Run>, stack: &[RunStyle], text: &str) {
    if text.is_empty() {
        return;
    }
    let bold = stack.iter().any(|s| s.bold);
    let color = stack.iter().rev().find_map(|s| s.color.clone());
    line.push(Run {
        text: unescape_html(text),
        bold,
        color,
    });
}

/// Split formatter output into lines of styled runs. Paragraph breaks yield an
/// empty line between paragraphs; `<br>` starts a new line.
pub fn parse_markup(markup: &str) -> Vec<Vec<Run>> {
    let mut lines: Vec<Vec<Run>> = Vec::new();
    let mut line: Vec<Run> = Vec::new();
    let mut stack: Vec<RunStyle> = Vec::new();
    let mut seen_paragraph = false;
    let mut rest = markup;

    while !rest.is_empty() {
        let Some(open) = rest.find('<') else {
            push_text(&mut line, &stack, rest);
            break;
        };
        push_text(&mut line, &stack, &rest[..open]);
        let Some(close) = rest[open..].find('>') else {
            push_text(&mut line, &stack, &rest[open..]);
            break;
        };
        let tag = &rest[open + 1..open + close];
        rest = &rest[open + close + 1..];

        match tag {
            "p" => {
                if seen_paragraph {
                    lines.push(std::mem::take(&mut line));
                    lines.push(Vec::new());
                }
                seen_paragraph = true;
            }
            "/p" => {}
            "br" | "br/" | "br /" => lines.push(std::mem::take(&mut line)),
            "strong" => stack.push(RunStyle {
                bold: true,
                color: None,
            }),
            t if t.starts_with("span") => stack.push(span_style(t)),
            "/strong" | "/span" => {
                stack.pop();
            }
            other => push_text(&mut line, &stack, &format!("<{other}>")),
        }
    }
    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pattern_compiles() {
        assert!(emphasis_re().is_some());
        assert!(kpi_re().is_some());
        assert!(positive_re().is_some());
        assert!(negative_re().is_some());
        assert!(style_color_re().is_some());
    }

    #[test]
    fn wraps_plain_text_in_a_paragraph() {
        assert_eq!(format_analysis_text("Stable quarter"), "<p>Stable quarter</p>");
        assert_eq!(format_analysis_text(""), "");
    }

    #[test]
    fn converts_line_breaks() {
        let out = format_analysis_text("one\n\ntwo\nthree");
        assert_eq!(out, "<p>one</p><p>two<br>three</p>");
    }

    #[test]
    fn percentage_is_emphasised() {
        let out = format_analysis_text("Up 5%");
        assert!(out.contains("<strong>5%</strong>"), "{out}");
    }

    #[test]
    fn kpi_by_phrase_and_sentiment_are_all_marked_once() {
        let out = format_analysis_text("NPL increased by 3%");
        assert!(out.contains(&format!(
            "<span style=\"color: {KPI_COLOR}; font-weight: 600;\">NPL</span>"
        )));
        assert!(out.contains("by <strong>3%</strong>"));
        assert!(out.contains(&format!(
            "<span style=\"color: {POSITIVE_COLOR};\">increased</span>"
        )));
        assert_eq!(out.matches("<strong>").count(), 1);
        assert_eq!(out.matches("</strong>").count(), 1);
    }

    #[test]
    fn by_phrase_without_percent_is_bold() {
        let out = format_analysis_text("LLP fell by 12.5 bps");
        assert!(out.contains("by <strong>12.5</strong> bps"), "{out}");
    }

    #[test]
    fn kpi_terms_match_whole_words_case_insensitively() {
        let out = format_analysis_text("the Provision for credit losses and NPLs");
        assert!(out.contains(">Provision for credit losses</span>"), "{out}");
        assert!(!out.contains(">NPL</span>"), "{out}");
    }

    #[test]
    fn negative_words_use_negative_color() {
        let out = format_analysis_text("Margins Declined and quality deteriorated");
        assert!(out.contains(&format!("<span style=\"color: {NEGATIVE_COLOR};\">Declined</span>")));
        assert!(out.contains(">deteriorated</span>"));
        assert!(!out.contains(POSITIVE_COLOR));
    }

    #[test]
    fn input_markup_is_escaped() {
        let out = format_analysis_text("a <b> & c");
        assert_eq!(out, "<p>a &lt;b&gt; &amp; c</p>");
    }

    #[test]
    fn parse_markup_recovers_styled_runs() {
        let lines = parse_markup(&format_analysis_text("NPL increased by 3%\n\nok"));
        assert_eq!(lines.len(), 3);
        let first = &lines[0];
        assert_eq!(first[0].text, "NPL");
        assert!(first[0].bold);
        assert_eq!(first[0].color.as_deref(), Some(KPI_COLOR));
        let strong = first.iter().find(|r| r.text == "3%").unwrap();
        assert!(strong.bold);
        assert!(lines[1].is_empty());
        assert_eq!(lines[2][0].text, "ok");
    }

    #[test]
    fn parse_markup_splits_on_br_and_unescapes() {
        let lines = parse_markup(&format_analysis_text("a &amp;\nb"));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0][0].text, "a &amp;");
        assert_eq!(lines[1][0].text, "b");
    }
}
