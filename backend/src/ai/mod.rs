//! Advisor features backed by a chat-completion model.
//!
//! Every feature follows the same pipeline: build a prompt, complete it,
//! recover JSON from the reply and shape it into a typed result. None of the
//! feature methods can fail; an unusable reply degrades to canned content.

pub mod canned;
pub mod client;
pub mod fallback;
pub mod normalize;
pub mod prompts;
pub mod shaper;

use crate::config::LlmConfig;
use crate::models::{
    AdvisorProfile, BudgetReport, ChatMessage, EducationLesson, IncomeIdea, InvestmentPlan,
    OpportunityReport, StockQuote,
};
use client::CompletionClient;
use prompts::PromptRequest;
use serde_json::Value;
use tracing::{info, warn};

pub use fallback::fallback_reply;
pub use normalize::normalize;

pub struct AdvisorService {
    client: CompletionClient,
}

impl AdvisorService {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: CompletionClient::new(config),
        }
    }

    pub fn with_client(client: CompletionClient) -> Self {
        Self { client }
    }

    async fn structured(&self, request: PromptRequest) -> Option<Value> {
        let feature = request.kind.as_str();
        let result = self.client.complete(&request.render()).await;
        if !result.success {
            warn!(
                feature,
                error = result.last_error.as_deref().unwrap_or("unknown"),
                "Completion unavailable, using canned result"
            );
            return None;
        }

        let payload = normalize(&result.text);
        if payload.is_none() {
            warn!(
                feature,
                snippet = %result.text.chars().take(200).collect::<String>(),
                "Model reply held no usable JSON, using canned result"
            );
        }
        payload
    }

    pub async fn generate_income_opportunities(&self, profile: &AdvisorProfile) -> Vec<IncomeIdea> {
        let request = prompts::income_opportunities(
            &profile.skills,
            &profile.location,
            &profile.time_availability,
            &profile.financial_level,
        );
        let payload = self.structured(request).await;
        shaper::income_opportunities(payload.as_ref())
    }

    pub async fn analyze_budget(&self, monthly_income: f64, monthly_expenses: f64) -> BudgetReport {
        let payload = self
            .structured(prompts::budget_analysis(monthly_income, monthly_expenses))
            .await;
        shaper::budget_analysis(payload.as_ref())
    }

    pub async fn provide_investment_advice(
        &self,
        financial_level: &str,
        risk_tolerance: &str,
        monthly_savings: f64,
    ) -> InvestmentPlan {
        let payload = self
            .structured(prompts::investment_advice(financial_level, risk_tolerance, monthly_savings))
            .await;
        shaper::investment_advice(payload.as_ref(), financial_level)
    }

    pub async fn scan_opportunities(&self, profile: &AdvisorProfile, market: &[StockQuote]) -> OpportunityReport {
        let payload = self.structured(prompts::opportunity_scan(profile, market)).await;
        shaper::opportunity_scan(payload.as_ref())
    }

    pub async fn generate_lessons(&self, financial_level: &str) -> Vec<EducationLesson> {
        let payload = self.structured(prompts::education_lessons(financial_level)).await;
        shaper::education_lessons(payload.as_ref(), financial_level)
    }

    /// Free-text reply; falls back to a template answer when the completion is empty.
    pub async fn chat_with_advisor(
        &self,
        message: &str,
        profile: &AdvisorProfile,
        history: &[ChatMessage],
    ) -> String {
        let system = prompts::chat_system(profile);
        let prompt = prompts::chat(message, profile, history).render();
        let result = self.client.complete_with_system(&system, &prompt).await;
        let reply = result.text.trim();
        if reply.is_empty() {
            info!(
                error = result.last_error.as_deref().unwrap_or("empty reply"),
                "Chat completion empty, answering from template"
            );
            return fallback_reply(message, profile);
        }
        reply.to_string()
    }
}
