//! Role prompt templates for the agent chain stages.

/// A prompt-template role: name, goal, backstory, and the sentinel file its
/// raw output is persisted to.
#[derive(Debug, Clone, Copy)]
pub struct AgentRole {
    pub name: &'static str,
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
    pub expected_output: &'static str,
    pub output_file: &'static str,
    /// Whether the stage contract is raw JSON (adds the no-markdown rule).
    pub json_output: bool,
}

const JSON_ONLY: &str = "DO NOT return markdown or wrap JSON in backticks. Only return the JSON. \
     Do not add any explanations or additional text, just return the JSON.";

pub fn classifier() -> AgentRole {
    AgentRole {
        name: "classifier",
        role: "Document Type Classifier",
        goal: "Classify the type of document accurately.",
        backstory: "You are trained to analyze and categorize documents into types like Invoice, \
             Receipt, Payslip, Bank Statement, Legal agreements (NDAs, contracts, MoUs), \
             Resumes/CVs, Research papers, Compliance forms, Business proposals, Insurance \
             policies, Meeting minutes or any other kind of document.",
        expected_output: "A single document type label such as Invoice, Receipt, Bank Statement, Payslip, \
             Legal agreement, Resume/CV, Research paper, Compliance form, Business proposal, \
             Insurance policy, Meeting minutes or Other.",
        output_file: "classification_result.txt",
        json_output: false,
    }
}

pub fn field_extractor() -> AgentRole {
    AgentRole {
        name: "field_extractor",
        role: "Key-Value Field Extractor",
        goal: "Extract structured fields from cleaned document text.",
        backstory: "You analyze the cleaned text and extract key fields like date, sender, receiver, \
             amount, etc. in JSON format.",
        expected_output: "JSON with all key fields (e.g. date, sender, amount, etc.).",
        output_file: "fields_result.json",
        json_output: true,
    }
}

pub fn table_extractor() -> AgentRole {
    AgentRole {
        name: "table_extractor",
        role: "Table Extractor",
        goal: "Extract tables from document text and present them in a structured format.",
        backstory: "You scan the text and convert any found tables into rows and columns in JSON \
             format.",
        expected_output: "JSON in the format {\"table1\": ..., \"table2\": ...}.",
        output_file: "tables_result.json",
        json_output: true,
    }
}

pub fn rule_suggester() -> AgentRole {
    AgentRole {
        name: "rule_suggester",
        role: "Document Validation Rule Designer",
        goal: "Given the type and content of a document, suggest logical and structural validation \
             rules that verify expected format, data completeness, and consistency.",
        backstory: "You are an expert in document standards and compliance validation. You analyze the \
             purpose and expected structure of document types like invoices, receipts, payslips, \
             contracts, bank statements, and resumes, and generate practical rules that automated \
             pipelines can apply to flag incomplete or incorrect documents. Be concise but \
             thorough; suggest only useful, relevant rules grounded in the document's type and \
             content, and never return an empty list. Give each rule a descriptive name like \
             \"Amount Must Be Greater Than Zero\", not an opaque one like \"isNotNullOrEmpty\".",
        expected_output: "A JSON list of validation rules, e.g. \"amount must be > 0\", \"GST number must \
             match regex XYZ\".",
        output_file: "rules_result.json",
        json_output: true,
    }
}

pub fn rule_checker() -> AgentRole {
    AgentRole {
        name: "rule_checker",
        role: "Document Rule Validator",
        goal: "Check if a given document satisfies a list of logical validation rules and return a \
             clear validation result.",
        backstory: "You are a precision-focused validator that ensures documents comply with structural \
             and content-based rules. Given a document as plain text and a list of validation \
             rules, return a validation report as JSON shaped like:\n\
             {\n\
               \"results\": [\n\
                 {\"rule\": \"...\", \"status\": \"pass\" or \"fail\", \"reason\": \"...\"}\n\
               ],\n\
               \"overall_validity\": \"VALID\" or \"INVALID\"\n\
             }\n\
             For each rule, state whether it passed or failed and explain why.",
        expected_output: "A JSON validation report showing pass/fail for each rule and overall document \
             validity.",
        output_file: "validation_result.json",
        json_output: true,
    }
}

/// Assemble the full prompt for one stage: role framing plus the task.
pub fn build_task_prompt(role: &AgentRole, task_description: &str) -> String {
    let format_rule = if role.json_output {
        format!("{JSON_ONLY}\n\n")
    } else {
        String::new()
    };

    format!(
        "You are a {role_name}. {goal}\n\n{backstory}\n\n\
         {format_rule}\
         Task:\n{task}\n\n\
         Expected output: {expected}",
        role_name = role.role,
        goal = role.goal,
        backstory = role.backstory,
        task = task_description,
        expected = role.expected_output,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_roles_have_distinct_output_files() {
        let files = [
            classifier().output_file,
            field_extractor().output_file,
            table_extractor().output_file,
            rule_suggester().output_file,
            rule_checker().output_file,
        ];
        let unique: std::collections::HashSet<_> = files.iter().collect();
        assert_eq!(unique.len(), files.len());
    }

    #[test]
    fn task_prompt_carries_role_and_task() {
        let prompt = build_task_prompt(&classifier(), "Classify this document:\n\nsome text");
        assert!(prompt.contains("Document Type Classifier"));
        assert!(prompt.contains("some text"));
        // The classifier returns a label, not JSON.
        assert!(!prompt.contains("DO NOT return markdown"));
    }

    #[test]
    fn json_stages_forbid_markdown_wrapping() {
        let prompt = build_task_prompt(&field_extractor(), "Extract key-value fields:\n\nsome text");
        assert!(prompt.contains("DO NOT return markdown"));
    }
}
