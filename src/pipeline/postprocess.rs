//! Post-processing: deterministic cleanup of model output.
//!
//! Two consumers:
//!
//! * [`strip_code_fences`] runs on a raw text reply before it is parsed as
//!   JSON. Models that were asked for "JSON only" still like to wrap it in
//!   ` ```json … ``` `.
//! * [`clean_markdown`] runs on every page's converted Markdown before it is
//!   joined into the document.
//!
//! Each rule is a pure `&str → String` pass.

use once_cell::sync::Lazy;
use regex::Regex;

/// Clean one page of model-produced Markdown.
///
/// Rules (applied in order):
/// 1. Strip an outer ` ```markdown ` fence
/// 2. Normalise line endings (CRLF / CR → LF)
/// 3. Trim trailing whitespace per line
/// 4. Collapse runs of blank lines to a single blank line
/// 5. Replace placeholder image links with their alt text
/// 6. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 7. Trim leading and trailing blank lines
///
/// The result has no trailing newline: pages are joined with `"\n\n"`.
pub fn clean_markdown(input: &str) -> String {
    let s = strip_code_fences(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = replace_placeholder_images(&s);
    let s = remove_invisible_chars(&s);
    s.trim_matches('\n').to_string()
}

// ── Rule 1: Outer fences ─────────────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[ \t]*(?:markdown|md|json)?[ \t]*\r?\n(.*?)\r?\n?```\s*$")
        .expect("static regex")
});

/// Remove one outer code fence (with or without a language tag).
pub fn strip_code_fences(input: &str) -> String {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed) {
        Some(caps) => caps[1].to_string(),
        None => trimmed.to_string(),
    }
}

// ── Rule 2: Line endings ─────────────────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Trailing whitespace ──────────────────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Blank lines ──────────────────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("static regex"));

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").into_owned()
}

// ── Rule 5: Placeholder images ───────────────────────────────────────────────
//
// A page image carries no addressable figure files, so any `![alt](url)`
// pointing at a relative path or a well-known placeholder host was invented.
// The alt text is kept as an italic caption.

static RE_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]*)\)").expect("static regex"));

const PLACEHOLDER_HOSTS: &[&str] = &[
    "example.com",
    "placeholder.com",
    "placehold.it",
    "dummyimage.com",
    "picsum.photos",
];

fn is_placeholder_url(url: &str) -> bool {
    let u = url.trim();
    if !(u.starts_with("http://") || u.starts_with("https://")) {
        return true;
    }
    PLACEHOLDER_HOSTS.iter().any(|h| u.contains(h))
}

fn replace_placeholder_images(input: &str) -> String {
    RE_IMAGE
        .replace_all(input, |caps: &regex::Captures<'_>| {
            if !is_placeholder_url(&caps[2]) {
                return caps[0].to_string();
            }
            match caps[1].trim() {
                "" => String::new(),
                alt => format!("*{}*", alt),
            }
        })
        .into_owned()
}

// ── Rule 6: Invisible characters ─────────────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        ['\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}'],
        "",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let input = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(input), "{\"a\": 1}");
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(strip_code_fences("```\n# Hi\n```\n"), "# Hi");
    }

    #[test]
    fn inner_code_block_is_kept() {
        let input = "Text\n```rust\nfn main() {}\n```";
        assert_eq!(strip_code_fences(input), input);
    }

    #[test]
    fn collapses_blank_runs() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn placeholder_image_becomes_caption() {
        let out = replace_placeholder_images("![Figure 2](figure2.png) and ![](image-url)");
        assert_eq!(out, "*Figure 2* and ");
    }

    #[test]
    fn real_image_link_is_kept() {
        let input = "![Fig](https://arxiv.org/figures/fig1.png)";
        assert_eq!(replace_placeholder_images(input), input);
    }

    #[test]
    fn clean_markdown_full_pipeline() {
        let input = "```markdown\n\u{FEFF}# Title\r\n\r\nSome text   \n\n\n\n## Section\n```";
        assert_eq!(clean_markdown(input), "# Title\n\nSome text\n\n## Section");
    }

    #[test]
    fn clean_markdown_of_whitespace_is_empty() {
        assert_eq!(clean_markdown("  \n\n "), "");
    }
}
