//! HTML to markdown conversion

use scraper::Html;

/// Converts an HTML fragment or document to markdown
///
/// Script, style, and noscript content is dropped. If the converter fails,
/// the plain text of the input is returned instead so callers always get a
/// readable string.
pub fn html_to_markdown(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "noscript"])
        .build();

    match converter.convert(html) {
        Ok(markdown) => collapse_blank_lines(&markdown),
        Err(e) => {
            tracing::debug!("Markdown conversion failed, using plain text: {}", e);
            plain_text(html)
        }
    }
}

fn plain_text(html: &str) -> String {
    Html::parse_fragment(html)
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Limits runs of blank lines to one and trims the ends
fn collapse_blank_lines(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut blank_run = 0;
    for line in markdown.trim().lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.trim_end().to_string()
}
