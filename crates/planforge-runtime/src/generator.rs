//! Plan Generation Service
//!
//! Validates a form submission, asks the text-generation endpoint for a
//! structured document, and persists whatever comes back: parsed JSON
//! verbatim, a best-effort extraction of a non-JSON answer, or a
//! deterministic template when the call fails outright. The user-facing
//! request never fails because the AI is down.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use planforge_core::{
    BusinessPlan, ChatMessage, CoreError, GenerationOptions, LlmProvider, PlanContent,
    PlanDocument, PlanStore, PlanSummary, RawSections, Result, User,
};

/// Summary cutoff for non-JSON responses
const RAW_SUMMARY_CHARS: usize = 500;

/// Form payload for a generation request
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanForm {
    #[serde(default)]
    pub business_name: String,

    #[serde(default)]
    pub industry: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub goals: Option<String>,

    #[serde(default)]
    pub target_market: Option<String>,
}

impl PlanForm {
    fn validate(&self) -> Result<()> {
        if self.business_name.trim().is_empty()
            || self.industry.trim().is_empty()
            || self.description.trim().is_empty()
        {
            return Err(CoreError::InvalidInput("Missing required fields".into()));
        }
        Ok(())
    }
}

/// Result of a generation request
#[derive(Clone, Debug)]
pub struct GeneratedPlan {
    pub plan_id: i64,
    pub content: PlanContent,
}

/// Generates and manages business plans for authorized users
pub struct PlanGenerator {
    provider: Option<Arc<dyn LlmProvider>>,
    plans: Arc<dyn PlanStore>,
    options: GenerationOptions,
}

impl PlanGenerator {
    pub fn new(
        provider: Option<Arc<dyn LlmProvider>>,
        plans: Arc<dyn PlanStore>,
        options: GenerationOptions,
    ) -> Self {
        Self {
            provider,
            plans,
            options,
        }
    }

    /// Generate a plan from a form submission and persist it
    pub async fn generate(&self, user: &User, form: &PlanForm) -> Result<GeneratedPlan> {
        form.validate()?;

        let content = self.generate_content(form).await;
        let title = format!("Business Plan - {}", form.business_name);

        let plan = self.plans.insert(
            user.id,
            &title,
            &form.business_name,
            &form.industry,
            content,
        )?;

        tracing::info!(user_id = user.id, plan_id = plan.id, "Generated business plan");

        Ok(GeneratedPlan {
            plan_id: plan.id,
            content: plan.content,
        })
    }

    /// One attempt against the endpoint; every failure mode lands on the
    /// deterministic fallback.
    async fn generate_content(&self, form: &PlanForm) -> PlanContent {
        let Some(provider) = &self.provider else {
            tracing::warn!("No text-generation provider configured; using fallback plan");
            return PlanContent::Structured(fallback_plan(form));
        };

        let messages = [ChatMessage::user(build_prompt(form))];

        match provider.complete(&messages, &self.options).await {
            Ok(completion) => parse_response(&completion.content),
            Err(e) => {
                tracing::error!(error = %e, "AI generation failed; using fallback plan");
                PlanContent::Structured(fallback_plan(form))
            }
        }
    }

    /// The user's plans, most recent first, without content
    pub fn list(&self, user: &User) -> Result<Vec<PlanSummary>> {
        self.plans.list_for_user(user.id)
    }

    /// A single plan with content. Absent and not-owned are the same error.
    pub fn get(&self, user: &User, id: i64) -> Result<BusinessPlan> {
        self.plans
            .find_for_user(id, user.id)?
            .ok_or(CoreError::NotFound)
    }

    /// Replace the content of an owned plan
    pub fn update(&self, user: &User, id: i64, content: PlanContent) -> Result<()> {
        if self.plans.update_content_for_user(id, user.id, content)? {
            Ok(())
        } else {
            Err(CoreError::NotFound)
        }
    }
}

/// The fixed generation prompt: form fields plus the instruction to produce
/// a direct-JSON document with the eight named sections.
fn build_prompt(form: &PlanForm) -> String {
    let mut prompt = format!(
        "You are an expert business-plan writer. Create a professional, complete \
         business plan for the following company:\n\n\
         Name: {}\nIndustry: {}\nDescription: {}\n",
        form.business_name, form.industry, form.description
    );

    if let Some(goals) = form.goals.as_deref().filter(|g| !g.is_empty()) {
        prompt.push_str(&format!("Goals: {goals}\n"));
    }
    if let Some(market) = form.target_market.as_deref().filter(|m| !m.is_empty()) {
        prompt.push_str(&format!("Target market: {market}\n"));
    }

    prompt.push_str(
        "\nGenerate a structured business plan with the following sections:\n\
         1. Executive summary\n\
         2. Company description\n\
         3. Market analysis\n\
         4. Marketing strategy\n\
         5. Operational plan\n\
         6. Financial projections (revenue, costs, profitability)\n\
         7. Organizational structure\n\
         8. Risk analysis\n\n\
         Format: JSON object with the keys: executiveSummary, companyDescription, \
         marketAnalysis, marketingStrategy, operationalPlan, financialProjections, \
         organization, riskAnalysis",
    );

    prompt
}

/// A response that parses as a JSON document is stored verbatim; anything
/// else is kept raw with a leading slice standing in for the summary.
fn parse_response(content: &str) -> PlanContent {
    match serde_json::from_str::<PlanDocument>(content) {
        Ok(document) => PlanContent::Structured(document),
        Err(_) => {
            let summary: String = content.chars().take(RAW_SUMMARY_CHARS).collect();
            PlanContent::Raw {
                raw_content: content.to_string(),
                sections: RawSections {
                    executive_summary: summary,
                    full_content: content.to_string(),
                },
            }
        }
    }
}

/// Deterministic template built purely from the submitted fields
fn fallback_plan(form: &PlanForm) -> PlanDocument {
    let mut extra = HashMap::new();
    extra.insert("generatedAt".to_string(), json!(Utc::now().to_rfc3339()));

    PlanDocument {
        executive_summary: Some(json!(format!(
            "Executive summary for {}. {}",
            form.business_name, form.description
        ))),
        company_description: Some(json!(form.description)),
        market_analysis: Some(json!(format!(
            "Market analysis for the {} industry",
            form.industry
        ))),
        marketing_strategy: Some(json!("Marketing strategy to be defined")),
        operational_plan: Some(json!("Operational plan to be defined")),
        financial_projections: Some(json!({
            "revenue": "To be estimated",
            "costs": "To be estimated",
            "profit": "To be estimated"
        })),
        organization: Some(json!("Organizational structure to be defined")),
        risk_analysis: Some(json!("Risks to be identified")),
        extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use planforge_core::{Completion, MemoryPlanStore};

    enum StubBehavior {
        Reply(&'static str),
        Fail,
    }

    struct StubProvider(StubBehavior);

    #[async_trait]
    impl LlmProvider for StubProvider {
        async fn health_check(&self) -> planforge_core::Result<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            _messages: &[ChatMessage],
            options: &GenerationOptions,
        ) -> planforge_core::Result<Completion> {
            match &self.0 {
                StubBehavior::Reply(content) => Ok(Completion {
                    content: (*content).to_string(),
                    model: options.model.clone(),
                }),
                StubBehavior::Fail => Err(CoreError::ProviderUnavailable("endpoint down".into())),
            }
        }
    }

    fn generator(provider: Option<StubProvider>) -> PlanGenerator {
        PlanGenerator::new(
            provider.map(|p| Arc::new(p) as Arc<dyn LlmProvider>),
            Arc::new(MemoryPlanStore::new()),
            GenerationOptions {
                json_response: true,
                ..Default::default()
            },
        )
    }

    fn user() -> User {
        User::new(1, "a@b.com", None, Utc::now())
    }

    fn form() -> PlanForm {
        PlanForm {
            business_name: "Acme Bakery".into(),
            industry: "food".into(),
            description: "A neighborhood bakery".into(),
            goals: None,
            target_market: None,
        }
    }

    #[tokio::test]
    async fn test_missing_required_fields_are_rejected() {
        let generator = generator(None);
        let user = user();

        for missing in ["businessName", "industry", "description"] {
            let mut form = form();
            match missing {
                "businessName" => form.business_name.clear(),
                "industry" => form.industry.clear(),
                _ => form.description.clear(),
            }

            assert!(matches!(
                generator.generate(&user, &form).await,
                Err(CoreError::InvalidInput(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_structured_response_is_persisted_verbatim() {
        let generator = generator(Some(StubProvider(StubBehavior::Reply(
            r#"{"executiveSummary": "Fresh bread daily", "customNote": "kept"}"#,
        ))));
        let user = user();

        let generated = generator.generate(&user, &form()).await.unwrap();
        match &generated.content {
            PlanContent::Structured(doc) => {
                assert_eq!(doc.executive_summary, Some(json!("Fresh bread daily")));
                assert_eq!(doc.extra.get("customNote"), Some(&json!("kept")));
            }
            PlanContent::Raw { .. } => panic!("expected structured content"),
        }

        let fetched = generator.get(&user, generated.plan_id).unwrap();
        assert_eq!(fetched.content, generated.content);
        assert_eq!(fetched.title, "Business Plan - Acme Bakery");
    }

    #[tokio::test]
    async fn test_non_json_response_is_kept_raw_with_summary() {
        let long_reply = "Here is your plan. ".repeat(40);
        let reply: &'static str = Box::leak(long_reply.into_boxed_str());

        let generator = generator(Some(StubProvider(StubBehavior::Reply(reply))));
        let generated = generator.generate(&user(), &form()).await.unwrap();

        match &generated.content {
            PlanContent::Raw {
                raw_content,
                sections,
            } => {
                assert_eq!(raw_content, reply);
                assert_eq!(sections.executive_summary.chars().count(), 500);
                assert_eq!(sections.full_content, *reply);
            }
            PlanContent::Structured(_) => panic!("expected raw content"),
        }
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back_to_template() {
        let generator = generator(Some(StubProvider(StubBehavior::Fail)));
        let generated = generator.generate(&user(), &form()).await.unwrap();

        match &generated.content {
            PlanContent::Structured(doc) => {
                let summary = doc.executive_summary.as_ref().unwrap().as_str().unwrap();
                assert!(summary.contains("Acme Bakery"));
                assert!(doc.extra.contains_key("generatedAt"));
            }
            PlanContent::Raw { .. } => panic!("expected fallback document"),
        }
    }

    #[tokio::test]
    async fn test_no_provider_falls_back_to_template() {
        let generator = generator(None);
        let generated = generator.generate(&user(), &form()).await.unwrap();
        assert!(matches!(generated.content, PlanContent::Structured(_)));
    }

    #[tokio::test]
    async fn test_cross_user_access_is_not_found() {
        let generator = generator(None);
        let owner = user();
        let other = User::new(2, "b@c.com", None, Utc::now());

        let generated = generator.generate(&owner, &form()).await.unwrap();

        assert!(matches!(
            generator.get(&other, generated.plan_id),
            Err(CoreError::NotFound)
        ));
        assert!(matches!(
            generator.update(
                &other,
                generated.plan_id,
                PlanContent::Structured(PlanDocument::default())
            ),
            Err(CoreError::NotFound)
        ));
        assert!(generator.list(&other).unwrap().is_empty());
    }

    #[test]
    fn test_prompt_embeds_fields_and_keys() {
        let mut form = form();
        form.goals = Some("open three locations".into());
        form.target_market = Some("commuters".into());

        let prompt = build_prompt(&form);
        assert!(prompt.contains("Acme Bakery"));
        assert!(prompt.contains("Goals: open three locations"));
        assert!(prompt.contains("Target market: commuters"));
        assert!(prompt.contains("executiveSummary"));
        assert!(prompt.contains("riskAnalysis"));

        // optional fields are omitted entirely when absent
        let bare = build_prompt(&PlanForm {
            goals: None,
            target_market: None,
            ..form
        });
        assert!(!bare.contains("Goals:"));
        assert!(!bare.contains("Target market:"));
    }
}
