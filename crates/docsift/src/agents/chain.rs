//! Sequential orchestrator for the five agent stages.

use std::path::PathBuf;
use uuid::Uuid;

use crate::error::Result;
use crate::providers::LlmProvider;
use crate::types::ValidationReport;
use crate::validation::strip_code_fences;

use super::roles::{self, AgentRole};

/// Raw outputs of a full chain run plus the typed validation report.
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    pub doc_type: String,
    pub fields: String,
    pub tables: String,
    pub rules: String,
    pub validation: ValidationReport,
}

/// Runs the five stages in strict sequence over one document.
///
/// Every stage's raw output is persisted to its sentinel file under a
/// per-run directory, then re-read as plain text (fence-stripped) before
/// use; there is no typed hand-off between stages. A failed stage aborts
/// the chain.
pub struct AgentChain<'a> {
    llm: &'a dyn LlmProvider,
    run_dir: PathBuf,
}

impl<'a> AgentChain<'a> {
    /// Create a chain whose stage files live in a fresh subdirectory of
    /// `work_dir`, so concurrent runs never clobber each other's files.
    pub fn new(llm: &'a dyn LlmProvider, work_dir: &std::path::Path) -> Self {
        Self {
            llm,
            run_dir: work_dir.join(Uuid::new_v4().to_string()),
        }
    }

    /// Where this run's stage files land.
    pub fn run_dir(&self) -> &std::path::Path {
        &self.run_dir
    }

    pub async fn run(&self, text: &str) -> Result<ChainOutcome> {
        tokio::fs::create_dir_all(&self.run_dir).await?;

        let doc_type = self
            .run_stage(
                &roles::classifier(),
                &format!("Classify this document:\n\n{text}"),
            )
            .await?;

        let fields = self
            .run_stage(
                &roles::field_extractor(),
                &format!("Extract key-value fields:\n\n{text}"),
            )
            .await?;

        let tables = self
            .run_stage(
                &roles::table_extractor(),
                &format!("Extract all tables:\n\n{text}"),
            )
            .await?;

        let rules = self
            .run_stage(
                &roles::rule_suggester(),
                &format!("Suggest some logical validation rules:\n\n{text}"),
            )
            .await?;

        // The checker is the only stage fed a previous stage's output.
        let check_task = format!(
            "Here is the extracted document:\n---\n{text}\n---\n\n\
             And below are the rules that this document must satisfy; they are the \
             output of the previous task:\n{rules}\n\n\
             Validate the document against the rules. For each rule, say whether it \
             passed or failed, and explain why. Return the result in JSON format with \
             individual rule status and an overall 'VALID' or 'INVALID' summary."
        );
        let validation_raw = self.run_stage(&roles::rule_checker(), &check_task).await?;

        // The ≥60% pass threshold is applied here, in code, regardless of
        // what the model claimed.
        let validation = ValidationReport::from_model_output(&validation_raw)?;

        tracing::info!(
            "agent chain complete: type={}, {} rules checked, verdict={:?}",
            doc_type.lines().next().unwrap_or(""),
            validation.results.len(),
            validation.overall_validity
        );

        Ok(ChainOutcome {
            doc_type,
            fields,
            tables,
            rules,
            validation,
        })
    }

    /// Run one stage: prompt the model, persist the raw output to the
    /// stage's sentinel file, then re-read it as plain text.
    async fn run_stage(&self, role: &AgentRole, task_description: &str) -> Result<String> {
        tracing::debug!("running agent stage: {}", role.name);

        let prompt = roles::build_task_prompt(role, task_description);
        let output = self.llm.generate(&prompt).await?;

        let path = self.run_dir.join(role.output_file);
        tokio::fs::write(&path, &output).await?;

        let raw = tokio::fs::read_to_string(&path).await?;
        Ok(strip_code_fences(&raw).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Canned LLM: answers stages in call order.
    struct ScriptedLlm {
        outputs: Mutex<Vec<&'static str>>,
    }

    impl ScriptedLlm {
        fn new(outputs: Vec<&'static str>) -> Self {
            Self {
                outputs: Mutex::new(outputs),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            let mut outputs = self.outputs.lock();
            Ok(outputs.remove(0).to_string())
        }

        async fn generate_with_image(
            &self,
            _prompt: &str,
            _image: &[u8],
            _mime: &str,
        ) -> Result<String> {
            unreachable!("chain stages are text-only")
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-1"
        }
    }

    #[tokio::test]
    async fn chain_runs_all_five_stages_in_order() {
        let llm = ScriptedLlm::new(vec![
            "Invoice",
            "```json\n{\"amount\": \"120.00\"}\n```",
            "{\"table1\": []}",
            "[\"Amount Must Be Greater Than Zero\"]",
            r#"{"results": [
                {"rule": "Amount Must Be Greater Than Zero", "status": "pass", "reason": "120.00 > 0"}
            ], "overall_validity": "INVALID"}"#,
        ]);

        let work_dir = tempfile::tempdir().unwrap();
        let chain = AgentChain::new(&llm, work_dir.path());
        let outcome = chain.run("Invoice #42, total 120.00").await.unwrap();

        assert_eq!(outcome.doc_type, "Invoice");
        // Fences are stripped from stage output before hand-off.
        assert_eq!(outcome.fields, "{\"amount\": \"120.00\"}");
        // 1/1 rules pass; model said INVALID but the threshold decides.
        assert_eq!(
            outcome.validation.overall_validity,
            crate::types::Validity::Valid
        );
        assert_eq!(outcome.validation.model_verdict.as_deref(), Some("INVALID"));

        // Stage files were persisted under the per-run directory.
        let run_dir = chain.run_dir();
        for file in [
            "classification_result.txt",
            "fields_result.json",
            "tables_result.json",
            "rules_result.json",
            "validation_result.json",
        ] {
            assert!(run_dir.join(file).exists(), "missing stage file {file}");
        }
    }

    #[tokio::test]
    async fn failed_stage_aborts_the_chain() {
        struct FailingLlm;

        #[async_trait]
        impl LlmProvider for FailingLlm {
            async fn generate(&self, _prompt: &str) -> Result<String> {
                Err(crate::error::Error::Llm("model unavailable".to_string()))
            }

            async fn generate_with_image(
                &self,
                _prompt: &str,
                _image: &[u8],
                _mime: &str,
            ) -> Result<String> {
                unreachable!()
            }

            async fn health_check(&self) -> Result<bool> {
                Ok(false)
            }

            fn name(&self) -> &str {
                "failing"
            }

            fn model(&self) -> &str {
                "failing-1"
            }
        }

        let work_dir = tempfile::tempdir().unwrap();
        let chain = AgentChain::new(&FailingLlm, work_dir.path());
        let err = chain.run("any document").await.unwrap_err();
        assert!(matches!(err, crate::error::Error::Llm(_)));
    }
}
