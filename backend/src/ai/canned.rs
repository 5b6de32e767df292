//! Hard-coded exemplar payloads substituted when a completion is unusable.
//!
//! Each table has the same JSON shape the model is asked to produce, so the
//! shaper runs them through the exact path it uses for live output.

use super::prompts::FeatureKind;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

static INCOME: Lazy<Value> = Lazy::new(|| {
    json!({
        "opportunities": [
            {
                "title": "Freelance Consulting",
                "description": "Offer your expertise as a consultant in your field",
                "category": "freelance",
                "estimated_income": "$500-2000/month",
                "effort_level": "medium",
                "time_commitment": "10-20 hours/week",
                "skills_required": ["consulting", "communication"]
            },
            {
                "title": "Online Course Creation",
                "description": "Create and sell online courses teaching your skills",
                "category": "side-hustle",
                "estimated_income": "$300-1500/month",
                "effort_level": "high",
                "time_commitment": "15-25 hours/week initially",
                "skills_required": ["teaching", "content creation"]
            },
            {
                "title": "Gig Economy Work",
                "description": "Flexible delivery, rideshare, or task-based work",
                "category": "gig",
                "estimated_income": "$400-1200/month",
                "effort_level": "low",
                "time_commitment": "Flexible",
                "skills_required": ["driving", "time management"]
            }
        ]
    })
});

static BUDGET: Lazy<Value> = Lazy::new(|| {
    json!({
        "spending_leaks": [
            {"category": "Subscriptions", "amount": 50, "description": "Unused streaming services"},
            {"category": "Dining Out", "amount": 200, "description": "Frequent restaurant meals"},
            {"category": "Impulse Purchases", "amount": 100, "description": "Online shopping"}
        ],
        "recommendations": [
            "Cancel unused subscriptions to save $50/month",
            "Meal prep on weekends to reduce dining out by 50%",
            "Implement 24-hour rule for non-essential purchases",
            "Set up automatic savings transfer on payday"
        ],
        "potential_savings": 350
    })
});

static INVESTMENT: Lazy<Value> = Lazy::new(|| {
    json!({
        "level": "beginner",
        "recommendations": [
            {
                "type": "Index Funds",
                "allocation": 60,
                "description": "Low-cost, diversified stock market exposure",
                "risk": "moderate"
            },
            {
                "type": "Bonds",
                "allocation": 30,
                "description": "Stable income with lower volatility",
                "risk": "low"
            },
            {
                "type": "Cash/Emergency Fund",
                "allocation": 10,
                "description": "3-6 months expenses for emergencies",
                "risk": "none"
            }
        ],
        "risk_assessment": "Moderate risk profile suitable for long-term growth with some stability",
        "portfolio_suggestion": {
            "strategy": "60/30/10 diversified portfolio",
            "rebalance_frequency": "quarterly",
            "expected_return": "6-8% annually"
        }
    })
});

static OPPORTUNITY: Lazy<Value> = Lazy::new(|| {
    json!({
        "opportunities": [
            {
                "type": "Grant",
                "title": "Small Business Innovation Grant",
                "description": "$5,000 grant for tech entrepreneurs",
                "deadline": "2025-03-31"
            },
            {
                "type": "Investment",
                "title": "Emerging Tech ETF",
                "description": "High-growth technology sector opportunity",
                "risk_level": "high"
            }
        ],
        "market_trends": [
            "AI and automation skills in high demand",
            "Remote work opportunities expanding globally",
            "Sustainable investing gaining momentum"
        ],
        "personalized_alerts": [
            "Your skills in data analysis are currently in top 10% demand",
            "3 new freelance opportunities matching your profile this week"
        ]
    })
});

static LESSONS: Lazy<Value> = Lazy::new(|| {
    json!({
        "lessons": [
            {
                "title": "Understanding Compound Interest",
                "category": "Basics",
                "content": "Learn how your money can grow exponentially over time",
                "duration_minutes": 15,
                "points": 100
            },
            {
                "title": "Creating Your First Budget",
                "category": "Budgeting",
                "content": "Step-by-step guide to tracking income and expenses",
                "duration_minutes": 20,
                "points": 150
            },
            {
                "title": "Introduction to Stock Market",
                "category": "Investing",
                "content": "Understanding stocks, bonds, and market basics",
                "duration_minutes": 30,
                "points": 200
            },
            {
                "title": "Tax Optimization Strategies",
                "category": "Advanced",
                "content": "Legal ways to minimize tax burden and maximize savings",
                "duration_minutes": 45,
                "points": 300
            }
        ]
    })
});

/// The canned payload for a structured feature. Chat replies are free text and have none.
pub fn table(kind: FeatureKind) -> Option<&'static Value> {
    let table = match kind {
        FeatureKind::IncomeOpportunities => &*INCOME,
        FeatureKind::BudgetAnalysis => &*BUDGET,
        FeatureKind::InvestmentAdvice => &*INVESTMENT,
        FeatureKind::OpportunityScan => &*OPPORTUNITY,
        FeatureKind::EducationLessons => &*LESSONS,
        FeatureKind::Chat => return None,
    };
    Some(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_tables_hold_their_primary_collection() {
        let expected = [
            (FeatureKind::IncomeOpportunities, "opportunities", 3),
            (FeatureKind::BudgetAnalysis, "spending_leaks", 3),
            (FeatureKind::InvestmentAdvice, "recommendations", 3),
            (FeatureKind::OpportunityScan, "opportunities", 2),
            (FeatureKind::EducationLessons, "lessons", 4),
        ];
        for (kind, key, len) in expected {
            let items = table(kind).unwrap()[key].as_array().unwrap();
            assert_eq!(items.len(), len, "{}", kind.as_str());
        }
    }

    #[test]
    fn chat_has_no_canned_payload() {
        assert!(table(FeatureKind::Chat).is_none());
    }
}
