//! Prompt assembly for each advisor feature.
//!
//! Every prompt is role framing, the caller's parameters rendered as plain
//! text, and (for structured features) a JSON schema hint the model is told
//! to follow exactly. Values are never validated here; empty inputs render
//! with neutral wording instead.

use super::client::SYSTEM_INSTRUCTION;
use crate::models::{AdvisorProfile, ChatMessage, StockQuote};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    IncomeOpportunities,
    BudgetAnalysis,
    InvestmentAdvice,
    OpportunityScan,
    EducationLessons,
    Chat,
}

impl FeatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKind::IncomeOpportunities => "income_opportunities",
            FeatureKind::BudgetAnalysis => "budget_analysis",
            FeatureKind::InvestmentAdvice => "investment_advice",
            FeatureKind::OpportunityScan => "opportunity_scan",
            FeatureKind::EducationLessons => "education_lessons",
            FeatureKind::Chat => "chat",
        }
    }

    fn role(&self) -> &'static str {
        match self {
            FeatureKind::IncomeOpportunities => {
                "You are a financial advisor specializing in income generation. Suggest practical, actionable opportunities."
            }
            FeatureKind::BudgetAnalysis => {
                "You are a financial advisor specializing in budget optimization and finding spending leaks."
            }
            FeatureKind::InvestmentAdvice => {
                "You are a certified financial advisor specializing in investment strategies for all experience levels."
            }
            FeatureKind::OpportunityScan => {
                "You are a market analyst identifying financial opportunities for individuals."
            }
            FeatureKind::EducationLessons => {
                "You are a personal finance educator who writes short, practical lessons."
            }
            FeatureKind::Chat => {
                "You are a personal financial advisor. Be supportive, educational and specific to the user's situation."
            }
        }
    }
}

pub const INCOME_SCHEMA: &str = r#"{"opportunities": [{"title": string, "description": string, "category": "freelance" | "side-hustle" | "micro-business" | "gig", "estimated_income": string, "effort_level": "low" | "medium" | "high", "time_commitment": string, "skills_required": [string]}]}"#;

pub const BUDGET_SCHEMA: &str = r#"{"spending_leaks": [{"category": string, "amount": number, "description": string}], "recommendations": [string], "potential_savings": number}"#;

pub const INVESTMENT_SCHEMA: &str = r#"{"level": string, "recommendations": [{"type": string, "allocation": number, "description": string, "risk": string}], "risk_assessment": string, "portfolio_suggestion": {"strategy": string, "rebalance_frequency": string, "expected_return": string}}"#;

pub const OPPORTUNITY_SCHEMA: &str = r#"{"opportunities": [{"type": string, "title": string, "description": string, "deadline"?: string, "risk_level"?: string}], "market_trends": [string], "personalized_alerts": [string]}"#;

pub const LESSON_SCHEMA: &str = r#"{"lessons": [{"title": string, "category": string, "content": string, "duration_minutes": number, "points": number}]}"#;

/// Number of prior chat messages folded into a chat prompt.
pub const CHAT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub kind: FeatureKind,
    pub task: String,
    pub params: Vec<(String, String)>,
    pub schema_hint: Option<&'static str>,
}

impl PromptRequest {
    fn new(kind: FeatureKind, task: impl Into<String>, schema_hint: Option<&'static str>) -> Self {
        Self {
            kind,
            task: task.into(),
            params: Vec::new(),
            schema_hint,
        }
    }

    fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.push((key.to_string(), value.into()));
        self
    }

    pub fn render(&self) -> String {
        let mut prompt = format!("{}\n\n{}\n", self.kind.role(), self.task);
        for (key, value) in &self.params {
            prompt.push_str(&format!("- {}: {}\n", key, value));
        }
        if let Some(schema) = self.schema_hint {
            prompt.push_str(
                "\nRespond with ONLY valid JSON matching this shape. Do not include prose, comments or markdown fences.\n",
            );
            prompt.push_str(schema);
        }
        prompt
    }
}

fn or_neutral(value: &str, neutral: &str) -> String {
    if value.trim().is_empty() {
        neutral.to_string()
    } else {
        value.trim().to_string()
    }
}

fn skills_text(skills: &[String]) -> String {
    let listed: Vec<&str> = skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if listed.is_empty() {
        "general skills".to_string()
    } else {
        listed.join(", ")
    }
}

fn money(amount: f64) -> String {
    format!("${:.2}", amount)
}

pub fn income_opportunities(
    skills: &[String],
    location: &str,
    time_availability: &str,
    financial_level: &str,
) -> PromptRequest {
    PromptRequest::new(
        FeatureKind::IncomeOpportunities,
        "Suggest 3 personalized income opportunities for someone with:",
        Some(INCOME_SCHEMA),
    )
    .param("Skills", skills_text(skills))
    .param("Location", or_neutral(location, "any location"))
    .param("Time availability", or_neutral(time_availability, "flexible"))
    .param("Financial level", or_neutral(financial_level, "unspecified"))
}

pub fn budget_analysis(monthly_income: f64, monthly_expenses: f64) -> PromptRequest {
    PromptRequest::new(
        FeatureKind::BudgetAnalysis,
        "Analyze this monthly budget. Identify 3-5 likely spending leaks, give actionable recommendations and estimate the potential monthly savings.",
        Some(BUDGET_SCHEMA),
    )
    .param("Monthly income", money(monthly_income))
    .param("Monthly expenses", money(monthly_expenses))
    .param("Net", money(monthly_income - monthly_expenses))
}

pub fn investment_advice(financial_level: &str, risk_tolerance: &str, monthly_savings: f64) -> PromptRequest {
    PromptRequest::new(
        FeatureKind::InvestmentAdvice,
        "Recommend an investment approach with portfolio allocation percentages, a risk assessment and beginner-friendly explanations for:",
        Some(INVESTMENT_SCHEMA),
    )
    .param("Financial level", or_neutral(financial_level, "unspecified"))
    .param("Risk tolerance", or_neutral(risk_tolerance, "moderate"))
    .param("Monthly amount available to invest", money(monthly_savings))
}

pub fn opportunity_scan(profile: &AdvisorProfile, market: &[StockQuote]) -> PromptRequest {
    let snapshot = if market.is_empty() {
        "no live quotes available".to_string()
    } else {
        market
            .iter()
            .map(|q| format!("{} {} ({:+.2}%)", q.symbol, money(q.price), q.change_percent))
            .collect::<Vec<_>>()
            .join(", ")
    };

    PromptRequest::new(
        FeatureKind::OpportunityScan,
        "Identify emerging market opportunities, grants or funding the user may qualify for, skills they could monetize and investments aligned with their risk tolerance. User and market context:",
        Some(OPPORTUNITY_SCHEMA),
    )
    .param("Financial level", or_neutral(&profile.financial_level, "unspecified"))
    .param("Risk tolerance", or_neutral(&profile.risk_tolerance, "moderate"))
    .param("Monthly income", money(profile.monthly_income))
    .param("Skills", skills_text(&profile.skills))
    .param("Location", or_neutral(&profile.location, "any location"))
    .param("Market snapshot", snapshot)
}

pub fn education_lessons(financial_level: &str) -> PromptRequest {
    PromptRequest::new(
        FeatureKind::EducationLessons,
        "Write 4 short personal finance lessons suited to this learner:",
        Some(LESSON_SCHEMA),
    )
    .param("Financial level", or_neutral(financial_level, "beginner"))
}

/// System message for chat: the base advisor instruction extended with the user's profile.
pub fn chat_system(profile: &AdvisorProfile) -> String {
    format!(
        "{} You are advising a {}-level user with a monthly income of {}, monthly expenses of {} and a {} risk tolerance. Tailor every answer to that situation and keep it practical.",
        SYSTEM_INSTRUCTION,
        or_neutral(&profile.financial_level, "beginner"),
        money(profile.monthly_income),
        money(profile.monthly_expenses),
        or_neutral(&profile.risk_tolerance, "moderate"),
    )
}

/// Free-text chat prompt: profile context, the most recent history and the new message.
pub fn chat(message: &str, profile: &AdvisorProfile, history: &[ChatMessage]) -> PromptRequest {
    let start = history.len().saturating_sub(CHAT_HISTORY_LIMIT);
    let transcript = history[start..]
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n");

    let mut request = PromptRequest::new(
        FeatureKind::Chat,
        "Answer the user's latest message in plain text. User profile:",
        None,
    )
    .param("Financial level", or_neutral(&profile.financial_level, "beginner"))
    .param("Monthly income", money(profile.monthly_income))
    .param("Monthly expenses", money(profile.monthly_expenses))
    .param("Risk tolerance", or_neutral(&profile.risk_tolerance, "moderate"));

    if !transcript.is_empty() {
        request = request.param("Recent conversation", format!("\n{}", transcript));
    }
    request.param("Latest message", message.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn income_prompt_uses_neutral_wording_for_empty_inputs() {
        let prompt = income_opportunities(&[], "", "", "").render();
        assert!(prompt.contains("- Skills: general skills"));
        assert!(prompt.contains("- Location: any location"));
        assert!(prompt.contains("- Time availability: flexible"));
        assert!(prompt.contains(INCOME_SCHEMA));
    }

    #[test]
    fn structured_prompts_demand_bare_json() {
        for request in [
            income_opportunities(&["writing".to_string()], "Lagos", "weekends", "beginner"),
            budget_analysis(5000.0, 4200.0),
            investment_advice("intermediate", "high", 800.0),
            opportunity_scan(&AdvisorProfile::default(), &[]),
            education_lessons("advanced"),
        ] {
            let prompt = request.render();
            assert!(prompt.contains("Respond with ONLY valid JSON"), "{:?}", request.kind);
            assert!(prompt.ends_with(request.schema_hint.unwrap()));
        }
    }

    #[test]
    fn budget_prompt_renders_net() {
        let prompt = budget_analysis(5000.0, 4200.0).render();
        assert!(prompt.contains("- Monthly income: $5000.00"));
        assert!(prompt.contains("- Net: $800.00"));
    }

    #[test]
    fn scan_prompt_lists_quotes() {
        let quotes = vec![StockQuote {
            symbol: "SPY".to_string(),
            price: 512.3,
            change_percent: -0.42,
            volume: None,
        }];
        let prompt = opportunity_scan(&AdvisorProfile::default(), &quotes).render();
        assert!(prompt.contains("SPY $512.30 (-0.42%)"));
    }

    #[test]
    fn chat_system_carries_profile_context() {
        let profile = AdvisorProfile {
            financial_level: "intermediate".to_string(),
            monthly_income: 4200.0,
            risk_tolerance: "high".to_string(),
            ..AdvisorProfile::default()
        };
        let system = chat_system(&profile);
        assert!(system.starts_with(SYSTEM_INSTRUCTION));
        assert!(system.contains("intermediate-level"));
        assert!(system.contains("$4200.00"));
        assert!(system.contains("high risk tolerance"));
    }

    #[test]
    fn chat_prompt_keeps_only_recent_history() {
        let user = Uuid::new_v4();
        let history: Vec<ChatMessage> = (0..15)
            .map(|i| ChatMessage::new(user, "user", &format!("message {}", i)))
            .collect();
        let request = chat("How do I start?", &AdvisorProfile::default(), &history);
        let prompt = request.render();

        assert!(request.schema_hint.is_none());
        assert!(!prompt.contains("message 4\n"));
        assert!(prompt.contains("user: message 5"));
        assert!(prompt.contains("user: message 14"));
        assert!(prompt.contains("- Latest message: How do I start?"));
    }
}
