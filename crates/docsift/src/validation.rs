//! Ad-hoc document validation against a caller-supplied rule list.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::Result;
use crate::providers::LlmProvider;
use crate::types::ValidationReport;

static FENCE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[a-zA-Z0-9_]*[ \t]*\r?\n(.*?)\r?\n?```").expect("fence regex is valid")
});
static FENCE_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^```[a-zA-Z0-9_]*[ \t]*\r?\n").expect("fence-open regex is valid")
});
static FENCE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n```\s*$").expect("fence-close regex is valid"));

/// Strip markdown code fences the model may have wrapped around its output,
/// keeping the enclosed text.
pub fn strip_code_fences(text: &str) -> String {
    let stripped = FENCE_BLOCK.replace_all(text, "$1");
    let stripped = FENCE_OPEN.replace(&stripped, "");
    FENCE_CLOSE.replace(&stripped, "").to_string()
}

fn validation_prompt(text: &str, rules: &[String]) -> String {
    let rule_list = rules
        .iter()
        .map(|r| format!("- {r}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a strict document validator. The following text is from a document:\n\n\
         ---\n{text}\n---\n\n\
         The user wants to validate it with the following rules:\n{rule_list}\n\n\
         Go through each rule and check if it is satisfied in the document.\n\
         Return a JSON like this:\n\
         {{\n\
           \"results\": [\n\
             {{\"rule\": \"...\", \"status\": \"pass\" or \"fail\", \"reason\": \"...\"}}\n\
           ],\n\
           \"overall_validity\": \"VALID\" or \"INVALID\"\n\
         }}\n\n\
         Only return raw JSON. Do not include explanations or wrap in a code block."
    )
}

/// Validate document text against the given rules with a single hosted call.
///
/// The model's JSON is fence-stripped before parsing; its verdict is then
/// replaced by the deterministic ≥60% pass threshold.
pub async fn validate_document(
    llm: &dyn LlmProvider,
    text: &str,
    rules: &[String],
) -> Result<ValidationReport> {
    let response = llm.generate(&validation_prompt(text, rules)).await?;
    let stripped = strip_code_fences(response.trim());
    ValidationReport::from_model_output(&stripped)
}
