//! Instructions and response schemas for the content-generation service.
//!
//! Callers can override either instruction via
//! [`crate::config::ConversionConfig::page_prompt`] and
//! [`crate::config::ConversionConfig::summary_prompt`]; the schemas are fixed
//! because the pipeline deserialises replies into typed structs.

use serde_json::{json, Value};

/// Default instruction for converting one page.
pub const PAGE_PROMPT: &str = r#"You are a PDF to Markdown converter specialized in academic and technical documents.
You will receive both the visual content of a PDF page and its extracted text.
Your task is to:
1. Convert the content to clean markdown format
   - Use the visual layout to understand document structure
   - Use the extracted text for accurate content
   - Preserve mathematical formulas and special characters
2. Provide a one-sentence summary of the page's key content
3. Extract up to 3 of the most specific and relevant technical terms/concepts

Follow these markdown formatting rules:
- Headers: # for main title, ## for sections, ### for subsections
- Math: $ for inline, $$ for block equations, use proper LaTeX
- Lists: - for bullets, 1. for numbered
- Code blocks: ```
- Tables: standard markdown tables
- Bold: **text**
- Italic: *text*
- Preserve paragraph breaks and visual layout
- Remove unnecessary line breaks

For the summary:
- If page has substantial content: provide one clear sentence capturing main points
- If page is title/index only: indicate as such (e.g., "Title page" or "Index page")
- If page is empty/insignificant: "No significant content"

For keywords:
- Choose up to 3 most specific technical terms/concepts from the content
- Prefer precise technical terminology over general topics
- If no technical terms present, return empty list

Answer with a single JSON object with the fields "markdown", "summary" and "keywords"."#;

/// Default instruction for the whole-document summary.
pub const SUMMARY_PROMPT: &str = r#"You are an expert at synthesizing academic and technical content.
Given a collection of page summaries and keywords from a document, create:
1. A brief, clear summary of the entire document's content and purpose
2. A curated list of the most important keywords that best represent the document

Focus on identifying the main contributions, key findings, or central arguments.
Eliminate redundant keywords and select those most representative of the document's core content.

Answer with a single JSON object with the fields "summary" and "keywords"."#;

/// Schema name used for page replies.
pub const PAGE_SCHEMA_NAME: &str = "page_analysis";

/// Schema name used for summary replies.
pub const SUMMARY_SCHEMA_NAME: &str = "document_summary";

/// JSON schema of a page reply.
pub fn page_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "markdown": { "type": "string" },
            "summary": { "type": "string" },
            "keywords": {
                "type": "array",
                "items": { "type": "string" },
                "maxItems": 3
            }
        },
        "required": ["markdown", "summary", "keywords"],
        "additionalProperties": false
    })
}

/// JSON schema of a summary reply.
pub fn summary_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "summary": { "type": "string" },
            "keywords": {
                "type": "array",
                "items": { "type": "string" }
            }
        },
        "required": ["summary", "keywords"],
        "additionalProperties": false
    })
}

/// User-turn text accompanying a page image.
pub fn page_input(page_num: usize, raw_text: &str) -> String {
    format!(
        "Page {page_num}. Extracted text:\n\n\"\"\"{}\"\"\"",
        raw_text.trim()
    )
}

/// User-turn text for the summary call.
pub fn summary_input(page_summaries: &[String], keywords: &[&str]) -> String {
    format!(
        "Page summaries:\n{}\n\nKeywords: {}",
        page_summaries.join("\n"),
        keywords.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_schema_caps_keywords_at_three() {
        assert_eq!(page_schema()["properties"]["keywords"]["maxItems"], 3);
    }

    #[test]
    fn schemas_require_every_property() {
        for schema in [page_schema(), summary_schema()] {
            let props = schema["properties"].as_object().unwrap();
            let required = schema["required"].as_array().unwrap();
            assert_eq!(props.len(), required.len());
        }
    }

    #[test]
    fn summary_input_layout() {
        let s = summary_input(
            &["Page 1: Intro".to_string(), "Page 3: Results".to_string()],
            &["attention", "transformer"],
        );
        assert_eq!(
            s,
            "Page summaries:\nPage 1: Intro\nPage 3: Results\n\nKeywords: attention, transformer"
        );
    }
}
