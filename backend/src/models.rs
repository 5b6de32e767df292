use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            created_at: user.created_at,
        }
    }
}

// Profile

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FinancialProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub savings_goal: f64,
    pub risk_tolerance: String,
    pub skills: Vec<String>,
    pub location: String,
    pub time_availability: String,
    pub financial_level: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FinancialProfileUpdate {
    pub monthly_income: Option<f64>,
    pub monthly_expenses: Option<f64>,
    pub savings_goal: Option<f64>,
    pub risk_tolerance: Option<String>,
    pub skills: Option<Vec<String>>,
    pub location: Option<String>,
    pub time_availability: Option<String>,
    pub financial_level: Option<String>,
}

/// The slice of a user's profile the advisor reads. Every field has a neutral default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorProfile {
    pub financial_level: String,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub risk_tolerance: String,
    pub skills: Vec<String>,
    pub location: String,
    pub time_availability: String,
}

impl Default for AdvisorProfile {
    fn default() -> Self {
        Self {
            financial_level: "beginner".to_string(),
            monthly_income: 0.0,
            monthly_expenses: 0.0,
            risk_tolerance: "moderate".to_string(),
            skills: Vec::new(),
            location: String::new(),
            time_availability: String::new(),
        }
    }
}

impl AdvisorProfile {
    pub fn monthly_savings(&self) -> f64 {
        (self.monthly_income - self.monthly_expenses).max(0.0)
    }
}

impl From<&FinancialProfile> for AdvisorProfile {
    fn from(profile: &FinancialProfile) -> Self {
        Self {
            financial_level: profile.financial_level.clone(),
            monthly_income: profile.monthly_income,
            monthly_expenses: profile.monthly_expenses,
            risk_tolerance: profile.risk_tolerance.clone(),
            skills: profile.skills.clone(),
            location: profile.location.clone(),
            time_availability: profile.time_availability.clone(),
        }
    }
}

// Advisor payloads

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeIdea {
    pub title: String,
    pub description: String,
    pub category: String,
    pub estimated_income: String,
    pub effort_level: String,
    pub time_commitment: String,
    pub skills_required: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingLeak {
    pub category: String,
    pub amount: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetReport {
    pub spending_leaks: Vec<SpendingLeak>,
    pub recommendations: Vec<String>,
    pub potential_savings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPick {
    #[serde(rename = "type")]
    pub kind: String,
    pub allocation: f64,
    pub description: String,
    pub risk: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentPlan {
    pub level: String,
    pub recommendations: Vec<AllocationPick>,
    pub risk_assessment: String,
    pub portfolio_suggestion: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanOpportunity {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    /// Model-supplied extras such as `deadline` or `risk_level`.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityReport {
    pub opportunities: Vec<ScanOpportunity>,
    pub market_trends: Vec<String>,
    pub personalized_alerts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationLesson {
    pub id: String,
    pub title: String,
    pub category: String,
    pub level: String,
    pub content: String,
    pub duration_minutes: u32,
    pub points: u32,
}

/// A persisted advisor result: identifiers and timestamps are assigned by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorRecord<T> {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub data: T,
    pub created_at: DateTime<Utc>,
}

impl<T> AdvisorRecord<T> {
    pub fn new(user_id: Uuid, data: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            data,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    IncomeOpportunity,
    BudgetAnalysis,
    InvestmentAdvice,
    OpportunityScan,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::IncomeOpportunity => "income_opportunity",
            RecordKind::BudgetAnalysis => "budget_analysis",
            RecordKind::InvestmentAdvice => "investment_advice",
            RecordKind::OpportunityScan => "opportunity_scan",
        }
    }
}

pub type IncomeOpportunity = AdvisorRecord<IncomeIdea>;
pub type BudgetAnalysis = AdvisorRecord<BudgetReport>;
pub type InvestmentAdvice = AdvisorRecord<InvestmentPlan>;
pub type OpportunityScan = AdvisorRecord<OpportunityReport>;

// Education progress

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub completed_lessons: Vec<String>,
    pub total_points: i32,
    pub achievements: Vec<String>,
    pub current_streak: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct LessonQuery {
    pub level: Option<String>,
}

// Chat

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatMessage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(user_id: Uuid, role: &str, content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            role: role.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub context: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

// Market data

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQuote {
    pub symbol: String,
    pub price: f64,
    pub change_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl StockQuote {
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: 0.0,
            change_percent: 0.0,
            volume: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoPrice {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForexRate {
    pub from: String,
    pub to: String,
    pub rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarketOverview {
    pub stocks: Vec<StockQuote>,
    pub crypto: Vec<CryptoPrice>,
    pub last_updated: DateTime<Utc>,
}

// Dashboard

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardStats {
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub monthly_savings: f64,
    pub savings_rate: f64,
    pub savings_goal: f64,
    pub goal_progress: f64,
    pub total_points: i32,
    pub completed_lessons: usize,
    pub current_streak: i32,
}

impl DashboardStats {
    pub fn compute(profile: &FinancialProfile, progress: &UserProgress) -> Self {
        let monthly_savings = profile.monthly_income - profile.monthly_expenses;
        let savings_rate = if profile.monthly_income > 0.0 {
            round_one(monthly_savings / profile.monthly_income * 100.0)
        } else {
            0.0
        };
        let goal_progress = if profile.savings_goal > 0.0 {
            round_one(monthly_savings / profile.savings_goal * 100.0)
        } else {
            0.0
        };

        Self {
            monthly_income: profile.monthly_income,
            monthly_expenses: profile.monthly_expenses,
            monthly_savings,
            savings_rate,
            savings_goal: profile.savings_goal,
            goal_progress,
            total_points: progress.total_points,
            completed_lessons: progress.completed_lessons.len(),
            current_streak: progress.current_streak,
        }
    }
}

fn round_one(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(income: f64, expenses: f64, goal: f64) -> FinancialProfile {
        FinancialProfile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            monthly_income: income,
            monthly_expenses: expenses,
            savings_goal: goal,
            risk_tolerance: "moderate".to_string(),
            skills: vec![],
            location: String::new(),
            time_availability: String::new(),
            financial_level: "beginner".to_string(),
            updated_at: Utc::now(),
        }
    }

    fn progress(points: i32, lessons: &[&str]) -> UserProgress {
        UserProgress {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            completed_lessons: lessons.iter().map(|l| l.to_string()).collect(),
            total_points: points,
            achievements: vec![],
            current_streak: lessons.len() as i32,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn dashboard_rates_round_to_one_decimal() {
        let stats = DashboardStats::compute(&profile(3000.0, 2000.0, 1500.0), &progress(200, &["1", "2"]));
        assert_eq!(stats.monthly_savings, 1000.0);
        assert_eq!(stats.savings_rate, 33.3);
        assert_eq!(stats.goal_progress, 66.7);
        assert_eq!(stats.completed_lessons, 2);
    }

    #[test]
    fn dashboard_handles_zero_income_and_goal() {
        let stats = DashboardStats::compute(&profile(0.0, 100.0, 0.0), &progress(0, &[]));
        assert_eq!(stats.monthly_savings, -100.0);
        assert_eq!(stats.savings_rate, 0.0);
        assert_eq!(stats.goal_progress, 0.0);
    }

    #[test]
    fn advisor_profile_fills_missing_fields() {
        let parsed: AdvisorProfile = serde_json::from_value(json!({"monthly_income": 4000})).unwrap();
        assert_eq!(parsed.financial_level, "beginner");
        assert_eq!(parsed.risk_tolerance, "moderate");
        assert_eq!(parsed.monthly_income, 4000.0);
        assert!(parsed.skills.is_empty());
    }

    #[test]
    fn monthly_savings_never_negative() {
        let profile = AdvisorProfile {
            monthly_income: 1000.0,
            monthly_expenses: 1500.0,
            ..AdvisorProfile::default()
        };
        assert_eq!(profile.monthly_savings(), 0.0);
    }

    #[test]
    fn advisor_record_flattens_payload() {
        let record = AdvisorRecord::new(
            Uuid::new_v4(),
            SpendingLeak {
                category: "Rent".to_string(),
                amount: 1200.0,
                description: "high rent".to_string(),
            },
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["category"], "Rent");
        assert!(value.get("data").is_none());
        assert!(value.get("created_at").is_some());
    }
}
