//! Turns a loosely-typed payload into a complete, typed advisor result.
//!
//! Top-level problems (no payload, missing or empty primary collection)
//! substitute the whole canned table. Once the top level is usable, each
//! missing field gets its own default instead.

use super::canned;
use super::prompts::FeatureKind;
use crate::models::{
    AllocationPick, BudgetReport, EducationLesson, IncomeIdea, InvestmentPlan, OpportunityReport,
    ScanOpportunity, SpendingLeak,
};
use serde_json::{Map, Value};

pub const INCOME_LIMIT: usize = 3;
pub const LESSON_LIMIT: usize = 4;

const DEFAULT_LESSON_MINUTES: u32 = 20;
const DEFAULT_LESSON_POINTS: u32 = 100;

type Object = Map<String, Value>;

/// A payload may be the bare list or an object holding it under `key`.
fn primary_list<'a>(payload: Option<&'a Value>, key: &str) -> Option<&'a Vec<Value>> {
    let list = match payload? {
        Value::Array(items) => items,
        Value::Object(map) => map.get(key)?.as_array()?,
        _ => return None,
    };
    (!list.is_empty()).then_some(list)
}

fn canned_list(kind: FeatureKind, key: &str) -> &'static [Value] {
    canned::table(kind)
        .and_then(|table| table.get(key))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn canned_object(kind: FeatureKind) -> &'static Object {
    static EMPTY: once_cell::sync::Lazy<Object> = once_cell::sync::Lazy::new(Object::new);
    canned::table(kind)
        .and_then(Value::as_object)
        .unwrap_or(&*EMPTY)
}

fn text(obj: &Object, key: &str, default: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => default.to_string(),
    }
}

fn category(obj: &Object, key: &str, default: &str) -> String {
    text(obj, key, default).to_lowercase()
}

fn string_list(obj: &Object, key: &str) -> Vec<String> {
    match obj.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// `Ok(None)` when the field is absent; `Err(())` when present but not a finite number.
fn number(obj: &Object, key: &str) -> Result<Option<f64>, ()> {
    let value = match obj.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | '%') && !c.is_whitespace())
                .collect();
            cleaned.parse::<f64>().ok()
        }
        Some(_) => None,
    };
    // "NaN" and "inf" parse as floats but cannot be stored as JSON numbers.
    value.filter(|v| v.is_finite()).map(Some).ok_or(())
}

fn number_or(obj: &Object, key: &str, default: f64) -> f64 {
    number(obj, key).ok().flatten().unwrap_or(default)
}

fn whole(value: f64) -> u32 {
    value.max(0.0).round().min(u32::MAX as f64) as u32
}

// Income opportunities

fn income_idea(obj: &Object) -> IncomeIdea {
    IncomeIdea {
        title: text(obj, "title", "Opportunity"),
        description: text(obj, "description", ""),
        category: category(obj, "category", "side-hustle"),
        estimated_income: text(obj, "estimated_income", "Varies"),
        effort_level: category(obj, "effort_level", "medium"),
        time_commitment: text(obj, "time_commitment", "Flexible"),
        skills_required: string_list(obj, "skills_required"),
    }
}

fn income_from(items: &[Value]) -> Vec<IncomeIdea> {
    items
        .iter()
        .filter_map(Value::as_object)
        .take(INCOME_LIMIT)
        .map(income_idea)
        .collect()
}

pub fn income_opportunities(payload: Option<&Value>) -> Vec<IncomeIdea> {
    let shaped = primary_list(payload, "opportunities")
        .map(|items| income_from(items))
        .unwrap_or_default();
    if shaped.is_empty() {
        income_from(canned_list(FeatureKind::IncomeOpportunities, "opportunities"))
    } else {
        shaped
    }
}

// Budget analysis

fn spending_leak(obj: &Object) -> SpendingLeak {
    SpendingLeak {
        category: text(obj, "category", "Other"),
        amount: number_or(obj, "amount", 0.0),
        description: text(obj, "description", ""),
    }
}

fn budget_from(obj: &Object, leaks: &[Value]) -> Option<BudgetReport> {
    let spending_leaks: Vec<SpendingLeak> = leaks
        .iter()
        .filter_map(Value::as_object)
        .map(spending_leak)
        .collect();
    if spending_leaks.is_empty() {
        return None;
    }
    Some(BudgetReport {
        spending_leaks,
        recommendations: string_list(obj, "recommendations"),
        potential_savings: number_or(obj, "potential_savings", 0.0),
    })
}

fn canned_budget() -> BudgetReport {
    let table = canned_object(FeatureKind::BudgetAnalysis);
    let leaks = canned_list(FeatureKind::BudgetAnalysis, "spending_leaks");
    budget_from(table, leaks).unwrap_or(BudgetReport {
        spending_leaks: Vec::new(),
        recommendations: Vec::new(),
        potential_savings: 0.0,
    })
}

pub fn budget_analysis(payload: Option<&Value>) -> BudgetReport {
    payload
        .and_then(Value::as_object)
        .and_then(|obj| {
            let leaks = primary_list(payload, "spending_leaks")?;
            budget_from(obj, leaks)
        })
        .unwrap_or_else(canned_budget)
}

// Investment advice

fn allocation_pick(obj: &Object) -> AllocationPick {
    AllocationPick {
        kind: text(obj, "type", "Diversified Fund"),
        allocation: number_or(obj, "allocation", 0.0),
        description: text(obj, "description", ""),
        risk: text(obj, "risk", "moderate"),
    }
}

fn investment_from(obj: &Object, picks: &[Value], level: &str) -> Option<InvestmentPlan> {
    let recommendations: Vec<AllocationPick> = picks
        .iter()
        .filter_map(Value::as_object)
        .map(allocation_pick)
        .collect();
    if recommendations.is_empty() {
        return None;
    }

    let canned = canned_object(FeatureKind::InvestmentAdvice);
    let portfolio_suggestion = obj
        .get("portfolio_suggestion")
        .and_then(Value::as_object)
        .filter(|m| !m.is_empty())
        .or_else(|| canned.get("portfolio_suggestion").and_then(Value::as_object))
        .cloned()
        .unwrap_or_default();

    Some(InvestmentPlan {
        level: text(obj, "level", level),
        recommendations,
        risk_assessment: text(obj, "risk_assessment", &text(canned, "risk_assessment", "")),
        portfolio_suggestion,
    })
}

fn canned_investment() -> InvestmentPlan {
    let table = canned_object(FeatureKind::InvestmentAdvice);
    let picks = canned_list(FeatureKind::InvestmentAdvice, "recommendations");
    investment_from(table, picks, "beginner").unwrap_or(InvestmentPlan {
        level: "beginner".to_string(),
        recommendations: Vec::new(),
        risk_assessment: String::new(),
        portfolio_suggestion: Map::new(),
    })
}

/// `financial_level` fills the plan's level when the model leaves it out.
pub fn investment_advice(payload: Option<&Value>, financial_level: &str) -> InvestmentPlan {
    payload
        .and_then(Value::as_object)
        .and_then(|obj| {
            let picks = primary_list(payload, "recommendations")?;
            investment_from(obj, picks, financial_level)
        })
        .unwrap_or_else(canned_investment)
}

// Opportunity scan

fn scan_opportunity(obj: &Object) -> ScanOpportunity {
    let details = obj
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "type" | "title" | "description"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    ScanOpportunity {
        kind: text(obj, "type", "Opportunity"),
        title: text(obj, "title", "Opportunity"),
        description: text(obj, "description", ""),
        details,
    }
}

fn scan_from(obj: &Object, items: &[Value]) -> Option<OpportunityReport> {
    let opportunities: Vec<ScanOpportunity> = items
        .iter()
        .filter_map(Value::as_object)
        .map(scan_opportunity)
        .collect();
    if opportunities.is_empty() {
        return None;
    }
    Some(OpportunityReport {
        opportunities,
        market_trends: string_list(obj, "market_trends"),
        personalized_alerts: string_list(obj, "personalized_alerts"),
    })
}

fn canned_scan() -> OpportunityReport {
    let table = canned_object(FeatureKind::OpportunityScan);
    let items = canned_list(FeatureKind::OpportunityScan, "opportunities");
    scan_from(table, items).unwrap_or(OpportunityReport {
        opportunities: Vec::new(),
        market_trends: Vec::new(),
        personalized_alerts: Vec::new(),
    })
}

pub fn opportunity_scan(payload: Option<&Value>) -> OpportunityReport {
    payload
        .and_then(Value::as_object)
        .and_then(|obj| {
            let items = primary_list(payload, "opportunities")?;
            scan_from(obj, items)
        })
        .unwrap_or_else(canned_scan)
}

// Education lessons

fn lesson(obj: &Object, position: usize, level: &str) -> Option<EducationLesson> {
    let duration = number(obj, "duration_minutes").ok()?;
    let points = number(obj, "points").ok()?;
    Some(EducationLesson {
        id: (position + 1).to_string(),
        title: text(obj, "title", &format!("Lesson {}", position + 1)),
        category: text(obj, "category", "General"),
        level: level.to_string(),
        content: text(obj, "content", ""),
        duration_minutes: duration.map(whole).unwrap_or(DEFAULT_LESSON_MINUTES),
        points: points.map(whole).unwrap_or(DEFAULT_LESSON_POINTS),
    })
}

fn canned_lesson(position: usize, level: &str) -> EducationLesson {
    canned_list(FeatureKind::EducationLessons, "lessons")
        .get(position)
        .and_then(Value::as_object)
        .and_then(|obj| lesson(obj, position, level))
        .unwrap_or_else(|| EducationLesson {
            id: (position + 1).to_string(),
            title: format!("Lesson {}", position + 1),
            category: "General".to_string(),
            level: level.to_string(),
            content: String::new(),
            duration_minutes: DEFAULT_LESSON_MINUTES,
            points: DEFAULT_LESSON_POINTS,
        })
}

fn lessons_from(items: &[Value], level: &str) -> Vec<EducationLesson> {
    items
        .iter()
        .take(LESSON_LIMIT)
        .enumerate()
        .map(|(position, item)| {
            item.as_object()
                .and_then(|obj| lesson(obj, position, level))
                .unwrap_or_else(|| canned_lesson(position, level))
        })
        .collect()
}

/// Ids are always "1".."n" and every lesson carries `level`, whatever the model proposed.
pub fn education_lessons(payload: Option<&Value>, level: &str) -> Vec<EducationLesson> {
    match primary_list(payload, "lessons") {
        Some(items) => lessons_from(items, level),
        None => lessons_from(canned_list(FeatureKind::EducationLessons, "lessons"), level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_payloads_yield_canned_defaults() {
        let income = income_opportunities(None);
        assert_eq!(income.len(), 3);
        assert_eq!(income[0].title, "Freelance Consulting");
        assert_eq!(income[2].skills_required, vec!["driving", "time management"]);

        let budget = budget_analysis(None);
        assert_eq!(budget.spending_leaks[0].category, "Subscriptions");
        assert_eq!(budget.recommendations.len(), 4);
        assert_eq!(budget.potential_savings, 350.0);

        let plan = investment_advice(None, "advanced");
        assert_eq!(plan.level, "beginner");
        assert_eq!(plan.recommendations[0].kind, "Index Funds");
        assert_eq!(plan.portfolio_suggestion["rebalance_frequency"], "quarterly");

        let scan = opportunity_scan(None);
        assert_eq!(scan.opportunities[0].details["deadline"], "2025-03-31");
        assert_eq!(scan.market_trends.len(), 3);

        let lessons = education_lessons(None, "beginner");
        assert_eq!(lessons.len(), 4);
        assert_eq!(lessons[3].title, "Tax Optimization Strategies");
        assert_eq!(lessons[3].points, 300);
    }

    #[test]
    fn canned_tables_survive_shaping_unchanged() {
        let table = canned::table(FeatureKind::BudgetAnalysis);
        assert_eq!(budget_analysis(table), budget_analysis(None));
        let table = canned::table(FeatureKind::IncomeOpportunities);
        assert_eq!(income_opportunities(table), income_opportunities(None));
        let table = canned::table(FeatureKind::OpportunityScan);
        assert_eq!(opportunity_scan(table), opportunity_scan(None));
    }

    #[test]
    fn wrong_shapes_fall_back_wholesale() {
        assert_eq!(income_opportunities(Some(&json!({"ideas": []}))), income_opportunities(None));
        assert_eq!(income_opportunities(Some(&json!({"opportunities": []}))), income_opportunities(None));
        assert_eq!(income_opportunities(Some(&json!("just text"))), income_opportunities(None));
        assert_eq!(budget_analysis(Some(&json!({"spending_leaks": "many"}))), budget_analysis(None));
        assert_eq!(budget_analysis(Some(&json!([{"category": "Rent"}]))), budget_analysis(None));
        assert_eq!(investment_advice(Some(&json!({"recommendations": [1, 2]})), "beginner"), investment_advice(None, "beginner"));
        assert_eq!(opportunity_scan(Some(&json!({"market_trends": ["x"]}))), opportunity_scan(None));
    }

    #[test]
    fn income_list_is_capped_in_order() {
        let items: Vec<Value> = (1..=6).map(|i| json!({"title": format!("Idea {}", i)})).collect();
        let shaped = income_opportunities(Some(&json!({ "opportunities": items })));
        let titles: Vec<&str> = shaped.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Idea 1", "Idea 2", "Idea 3"]);
    }

    #[test]
    fn income_accepts_a_bare_list_and_fills_defaults() {
        let shaped = income_opportunities(Some(&json!([{"title": "Tutoring"}])));
        assert_eq!(
            shaped,
            vec![IncomeIdea {
                title: "Tutoring".to_string(),
                description: String::new(),
                category: "side-hustle".to_string(),
                estimated_income: "Varies".to_string(),
                effort_level: "medium".to_string(),
                time_commitment: "Flexible".to_string(),
                skills_required: vec![],
            }]
        );
    }

    #[test]
    fn categorical_fields_are_lowercased() {
        let shaped = income_opportunities(Some(&json!({
            "opportunities": [{"title": "Copywriting", "category": "FREELANCE", "effort_level": "High"}]
        })));
        assert_eq!(shaped[0].category, "freelance");
        assert_eq!(shaped[0].effort_level, "high");
    }

    #[test]
    fn valid_budget_is_echoed() {
        let payload = json!({
            "spending_leaks": [{"category": "Rent", "amount": 1200, "description": "high rent"}],
            "recommendations": ["downsize"],
            "potential_savings": 300
        });
        let report = budget_analysis(Some(&payload));
        assert_eq!(
            report,
            BudgetReport {
                spending_leaks: vec![SpendingLeak {
                    category: "Rent".to_string(),
                    amount: 1200.0,
                    description: "high rent".to_string(),
                }],
                recommendations: vec!["downsize".to_string()],
                potential_savings: 300.0,
            }
        );
    }

    #[test]
    fn budget_coerces_currency_strings() {
        let payload = json!({
            "spending_leaks": [{"category": "Coffee", "amount": "$1,250.50"}],
            "potential_savings": "unknown"
        });
        let report = budget_analysis(Some(&payload));
        assert_eq!(report.spending_leaks[0].amount, 1250.5);
        assert_eq!(report.potential_savings, 0.0);
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn non_finite_amounts_are_not_numbers() {
        let payload = json!({
            "spending_leaks": [{"category": "Dining", "amount": "NaN"}],
            "potential_savings": "inf"
        });
        let report = budget_analysis(Some(&payload));
        assert_eq!(report.spending_leaks[0].amount, 0.0);
        assert_eq!(report.potential_savings, 0.0);

        let stored = serde_json::to_value(&report).unwrap();
        let reloaded: BudgetReport = serde_json::from_value(stored).unwrap();
        assert_eq!(reloaded, report);

        let plan = investment_advice(Some(&json!({"recommendations": [{"type": "ETF", "allocation": "-infinity"}]})), "beginner");
        assert!(plan.recommendations[0].allocation.is_finite());
    }

    #[test]
    fn investment_fills_level_and_suggestion_from_context_and_table() {
        let payload = json!({"recommendations": [{"type": "REITs", "allocation": "15%"}]});
        let plan = investment_advice(Some(&payload), "intermediate");
        assert_eq!(plan.level, "intermediate");
        assert_eq!(plan.recommendations[0].allocation, 15.0);
        assert_eq!(plan.recommendations[0].risk, "moderate");
        assert_eq!(plan.risk_assessment, investment_advice(None, "x").risk_assessment);
        assert_eq!(plan.portfolio_suggestion["strategy"], "60/30/10 diversified portfolio");
    }

    #[test]
    fn scan_keeps_extra_opportunity_fields() {
        let payload = json!({
            "opportunities": [{"type": "Grant", "title": "Arts fund", "deadline": "2026-12-01", "amount": 2000}],
            "market_trends": ["Green energy"]
        });
        let scan = opportunity_scan(Some(&payload));
        assert_eq!(scan.opportunities[0].details["deadline"], "2026-12-01");
        assert_eq!(scan.opportunities[0].details["amount"], 2000);
        assert!(scan.opportunities[0].details.get("title").is_none());
        assert_eq!(scan.market_trends, vec!["Green energy"]);
        assert!(scan.personalized_alerts.is_empty());
    }

    #[test]
    fn lessons_are_capped_renumbered_and_levelled() {
        let items: Vec<Value> = (1..=6)
            .map(|i| json!({"id": format!("x{}", i), "title": format!("T{}", i), "level": "expert", "points": 50}))
            .collect();
        let lessons = education_lessons(Some(&json!({ "lessons": items })), "intermediate");

        assert_eq!(lessons.len(), 4);
        let ids: Vec<&str> = lessons.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
        assert!(lessons.iter().all(|l| l.level == "intermediate"));
        assert_eq!(lessons[0].title, "T1");
        assert_eq!(lessons[0].duration_minutes, 20);
        assert_eq!(lessons[0].points, 50);
    }

    #[test]
    fn lesson_defaults_use_position() {
        let lessons = education_lessons(Some(&json!([{}, {"duration_minutes": "25"}])), "beginner");
        assert_eq!(lessons.len(), 2);
        assert_eq!(lessons[0].title, "Lesson 1");
        assert_eq!(lessons[0].category, "General");
        assert_eq!(lessons[1].title, "Lesson 2");
        assert_eq!(lessons[1].duration_minutes, 25);
    }

    #[test]
    fn non_numeric_lesson_falls_back_to_canned_lesson() {
        let payload = json!({"lessons": [
            {"title": "Good", "duration_minutes": 10, "points": 80},
            {"title": "Bad", "duration_minutes": "a while", "points": 80}
        ]});
        let lessons = education_lessons(Some(&payload), "advanced");
        assert_eq!(lessons[0].title, "Good");
        assert_eq!(lessons[1].title, "Creating Your First Budget");
        assert_eq!(lessons[1].id, "2");
        assert_eq!(lessons[1].level, "advanced");
    }

    #[test]
    fn nan_lesson_duration_falls_back_to_canned_lesson() {
        let payload = json!({"lessons": [{"title": "X", "duration_minutes": "NaN", "points": 10}]});
        let lessons = education_lessons(Some(&payload), "beginner");
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].title, "Understanding Compound Interest");
        assert_eq!(lessons[0].duration_minutes, 15);
    }
}
