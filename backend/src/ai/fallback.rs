use crate::models::AdvisorProfile;

const LOW_RISK_ALLOCATION: &str = "With a low risk tolerance, consider keeping most of your savings in high-yield savings accounts and bond funds (around 70%), with a smaller share (around 30%) in broad index funds.";
const MODERATE_RISK_ALLOCATION: &str = "With a moderate risk tolerance, a balanced mix works well: roughly 60% in diversified index funds, 30% in bonds and 10% kept as an emergency cash buffer.";
const HIGH_RISK_ALLOCATION: &str = "With a high risk tolerance, you could hold around 80% in stock index funds and growth sectors, keeping 20% in bonds or cash so you are never forced to sell in a downturn.";

const BUDGET_TIPS: [&str; 4] = [
    "Track every expense for one month to see where your money actually goes.",
    "Follow the 50/30/20 rule: 50% needs, 30% wants, 20% savings and debt repayment.",
    "Automate a transfer to savings on payday so saving happens before spending.",
    "Build an emergency fund covering 3-6 months of expenses before taking on investment risk.",
];

fn allocation_for(risk_tolerance: &str) -> &'static str {
    match risk_tolerance.trim().to_lowercase().as_str() {
        "low" => LOW_RISK_ALLOCATION,
        "high" => HIGH_RISK_ALLOCATION,
        _ => MODERATE_RISK_ALLOCATION,
    }
}

/// Template reply used when the chat completion comes back empty.
///
/// Pure and deterministic: the same message and profile always produce the same text.
pub fn fallback_reply(message: &str, profile: &AdvisorProfile) -> String {
    let savings = profile.monthly_savings();
    let level = if profile.financial_level.trim().is_empty() {
        "beginner"
    } else {
        profile.financial_level.trim()
    };

    let mut reply = String::new();
    reply.push_str("I'm having trouble reaching the advisor service right now, but here is some guidance based on your profile.\n\n");
    if !message.trim().is_empty() {
        reply.push_str(&format!("You asked: \"{}\"\n\n", message.trim()));
    }
    reply.push_str("Your snapshot:\n");
    reply.push_str(&format!("- Monthly income: ${:.2}\n", profile.monthly_income));
    reply.push_str(&format!("- Monthly expenses: ${:.2}\n", profile.monthly_expenses));
    reply.push_str(&format!("- Available to save: ${:.2} per month\n", savings));
    reply.push_str(&format!("- Financial level: {}\n\n", level));

    reply.push_str("Investing:\n");
    reply.push_str(allocation_for(&profile.risk_tolerance));
    reply.push_str("\n\nBudgeting tips:\n");
    for (i, tip) in BUDGET_TIPS.iter().enumerate() {
        reply.push_str(&format!("{}. {}\n", i + 1, tip));
    }
    reply.push_str("\nAsk me again in a moment for a more personalized answer.");
    reply
}
