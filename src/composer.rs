use std::sync::Arc;

use tracing::{info, warn};

use crate::error::GenerationError;
use crate::generator::TextGenerator;
use crate::model::EmployeeRecord;

pub const SYSTEM_PROMPT: &str = "You are an HR assistant.";
pub const NO_CANDIDATES: &str = "Sorry, I couldn't find any suitable employees for your query.";
const CLOSING: &str = "Would you like more details or to check their availability for meetings?";
const RATE_LIMIT_NOTICE: &str =
    "⚠️ Your text generation quota has been exceeded or rate-limited. Switching to template-based response.";

/// Turns a query plus its matches into the reply text.
///
/// Generative when a backend is configured, template otherwise. Generation
/// failures never escape: they degrade to the template with a notice line.
#[derive(Clone, Default)]
pub struct ResponseComposer {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl ResponseComposer {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    pub fn template_only() -> Self {
        Self::default()
    }

    pub fn is_generative(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn compose(&self, query: &str, matched: &[&EmployeeRecord]) -> String {
        let Some(generator) = &self.generator else {
            info!("composing template response");
            return template_response(matched);
        };

        info!("composing generative response");
        match generator.generate(SYSTEM_PROMPT, &build_prompt(query, matched)).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "text generation failed, falling back to template");
                format!("{}\n\n{}", fallback_notice(&e), template_response(matched))
            }
        }
    }
}

pub fn build_prompt(query: &str, matched: &[&EmployeeRecord]) -> String {
    let names: Vec<&str> = matched.iter().map(|e| e.name.as_str()).collect();
    format!(
        "User query: {}\nMatched employees: {}\nFor each, summarize why they are a good fit.",
        query,
        names.join(", ")
    )
}

fn fallback_notice(e: &GenerationError) -> String {
    match e {
        GenerationError::RateLimited => RATE_LIMIT_NOTICE.to_string(),
        other => {
            let detail = other.to_string().split_whitespace().collect::<Vec<_>>().join(" ");
            format!("⚠️ Text generation service error: {detail}. Switching to template-based response.")
        }
    }
}

/// Deterministic reply listing each match in rank order.
pub fn template_response(matched: &[&EmployeeRecord]) -> String {
    if matched.is_empty() {
        return NO_CANDIDATES.to_string();
    }

    let mut out = format!("Based on your query, I found {} candidate(s):\n\n", matched.len());
    for e in matched {
        out.push_str(&format!(
            "• **{}**\n  - Experience: {} years\n  - Skills: {}\n  - Projects: {}\n  - Availability: {}\n\n",
            e.name,
            e.experience_years,
            e.skills.join(", "),
            e.projects.join(", "),
            e.availability
        ));
    }
    out.push_str(CLOSING);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Availability;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn asha() -> EmployeeRecord {
        EmployeeRecord {
            name: "Asha".into(),
            skills: vec!["Python".into(), "SQL".into()],
            experience_years: 5,
            projects: vec!["Billing".into()],
            availability: Availability::Available,
        }
    }

    const ASHA_TEMPLATE: &str = "Based on your query, I found 1 candidate(s):\n\n• **Asha**\n  - Experience: 5 years\n  - Skills: Python, SQL\n  - Projects: Billing\n  - Availability: available\n\nWould you like more details or to check their availability for meetings?";

    /// Replays one canned result and records the prompt it was sent.
    struct StubGenerator {
        reply: Mutex<Option<Result<String, GenerationError>>>,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl StubGenerator {
        fn new(reply: Result<String, GenerationError>) -> Arc<Self> {
            Arc::new(Self { reply: Mutex::new(Some(reply)), seen: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate(&self, system: &str, prompt: &str) -> Result<String, GenerationError> {
            self.seen.lock().unwrap().push((system.to_string(), prompt.to_string()));
            self.reply.lock().unwrap().take().unwrap_or(Err(GenerationError::EmptyResponse))
        }
    }

    #[tokio::test]
    async fn template_matches_literal_contract() {
        let a = asha();
        let out = ResponseComposer::template_only().compose("python", &[&a]).await;
        assert_eq!(out, ASHA_TEMPLATE);
    }

    #[tokio::test]
    async fn empty_match_set_has_fixed_message() {
        let out = ResponseComposer::template_only().compose("anyone?", &[]).await;
        assert_eq!(out, NO_CANDIDATES);
    }

    #[tokio::test]
    async fn generative_success_is_verbatim() {
        let stub = StubGenerator::new(Ok("Asha knows Python and SQL.".into()));
        let composer = ResponseComposer::new(Some(stub.clone()));
        let a = asha();

        let out = composer.compose("who knows SQL?", &[&a]).await;
        assert_eq!(out, "Asha knows Python and SQL.");

        let seen = stub.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, SYSTEM_PROMPT);
        assert_eq!(
            seen[0].1,
            "User query: who knows SQL?\nMatched employees: Asha\nFor each, summarize why they are a good fit."
        );
    }

    #[tokio::test]
    async fn rate_limit_falls_back_to_template() {
        let composer = ResponseComposer::new(Some(StubGenerator::new(Err(GenerationError::RateLimited))));
        let a = asha();

        let out = composer.compose("python", &[&a]).await;
        assert_eq!(out, format!("{RATE_LIMIT_NOTICE}\n\n{ASHA_TEMPLATE}"));
    }

    #[tokio::test]
    async fn other_errors_fall_back_with_single_line_notice() {
        let err = GenerationError::Status { status: 500, body: "upstream\nexploded".into() };
        let composer = ResponseComposer::new(Some(StubGenerator::new(Err(err))));
        let a = asha();

        let out = composer.compose("python", &[&a]).await;
        let (notice, rest) = out.split_once("\n\n").unwrap();
        assert!(notice.starts_with("⚠️ Text generation service error:"));
        assert!(notice.contains("upstream exploded"));
        assert!(!notice.contains('\n'));
        assert_eq!(rest, ASHA_TEMPLATE);
    }

    #[tokio::test]
    async fn timeout_falls_back_on_empty_match_set() {
        let composer = ResponseComposer::new(Some(StubGenerator::new(Err(GenerationError::Timeout))));
        let out = composer.compose("nobody", &[]).await;
        assert!(out.ends_with(NO_CANDIDATES));
        assert!(out.contains("timed out"));
    }
}
