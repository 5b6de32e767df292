use crate::{
    auth::AuthUser,
    error::{AppError, Result},
    models::*,
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

const INCOME_HISTORY_LIMIT: i64 = 10;
const CHAT_CONTEXT_LIMIT: i64 = 10;
const CHAT_HISTORY_LIMIT: i64 = 50;
const MIN_PASSWORD_LENGTH: usize = 6;

pub async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let db_healthy = state.database.health_check().await.unwrap_or(false);

    let status = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "ok" } else { "degraded" },
        "timestamp": Utc::now(),
        "database": db_healthy,
        "version": env!("CARGO_PKG_VERSION")
    });

    Ok((status, Json(response)))
}

async fn load_profile(state: &AppState, user_id: Uuid) -> Result<FinancialProfile> {
    state
        .database
        .get_profile(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}

async fn load_progress(state: &AppState, user_id: Uuid) -> Result<UserProgress> {
    state
        .database
        .get_progress(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Progress not found".to_string()))
}

fn auth_response(state: &AppState, user: User) -> Result<AuthResponse> {
    let token = state.services.auth.generate_token(user.id, &user.email)?;

    Ok(AuthResponse {
        token,
        user: UserSummary {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
        },
    })
}

// Authentication

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse> {
    let email = payload.email.trim().to_lowercase();
    if !email.contains('@') || payload.full_name.trim().is_empty() {
        return Err(AppError::Validation("A valid email and full name are required".to_string()));
    }
    if payload.password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    if state.database.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = state.services.auth.hash_password(&payload.password)?;
    let user = state
        .database
        .create_user(&email, payload.full_name.trim(), &password_hash)
        .await?;

    info!(user_id = %user.id, "Registered new user");

    Ok((StatusCode::OK, Json(auth_response(&state, user)?)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let invalid = || AppError::Auth("Invalid credentials".to_string());

    let user = state
        .database
        .find_user_by_email(&payload.email.trim().to_lowercase())
        .await?
        .ok_or_else(invalid)?;

    if !state
        .services
        .auth
        .verify_password(&payload.password, &user.password_hash)?
    {
        return Err(invalid());
    }

    Ok(Json(auth_response(&state, user)?))
}

pub async fn me(State(state): State<AppState>, auth: AuthUser) -> Result<Json<UserResponse>> {
    let user = state
        .database
        .find_user_by_id(auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

// Profile

pub async fn get_profile(State(state): State<AppState>, auth: AuthUser) -> Result<Json<FinancialProfile>> {
    Ok(Json(load_profile(&state, auth.user_id).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(update): Json<FinancialProfileUpdate>,
) -> Result<Json<FinancialProfile>> {
    let profile = state
        .database
        .update_profile(auth.user_id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    Ok(Json(profile))
}

// Income generation

pub async fn generate_income(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<IncomeOpportunity>>> {
    let profile = load_profile(&state, auth.user_id).await?;
    let ideas = state
        .services
        .advisor
        .generate_income_opportunities(&AdvisorProfile::from(&profile))
        .await;

    let mut records = Vec::with_capacity(ideas.len());
    for idea in ideas {
        let record = AdvisorRecord::new(auth.user_id, idea);
        state
            .database
            .insert_record(RecordKind::IncomeOpportunity, &record)
            .await?;
        records.push(record);
    }

    Ok(Json(records))
}

pub async fn list_income(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<IncomeOpportunity>>> {
    let records = state
        .database
        .list_records(auth.user_id, RecordKind::IncomeOpportunity, INCOME_HISTORY_LIMIT)
        .await?;

    Ok(Json(records))
}

// Budget

pub async fn analyze_budget(State(state): State<AppState>, auth: AuthUser) -> Result<Json<BudgetAnalysis>> {
    let profile = load_profile(&state, auth.user_id).await?;
    let report = state
        .services
        .advisor
        .analyze_budget(profile.monthly_income, profile.monthly_expenses)
        .await;

    let record = AdvisorRecord::new(auth.user_id, report);
    state
        .database
        .insert_record(RecordKind::BudgetAnalysis, &record)
        .await?;

    Ok(Json(record))
}

pub async fn latest_budget(State(state): State<AppState>, auth: AuthUser) -> Result<Json<BudgetAnalysis>> {
    state
        .database
        .latest_record(auth.user_id, RecordKind::BudgetAnalysis)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No budget analysis found".to_string()))
}

// Investment

pub async fn investment_advice(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<InvestmentAdvice>> {
    let profile = AdvisorProfile::from(&load_profile(&state, auth.user_id).await?);
    let plan = state
        .services
        .advisor
        .provide_investment_advice(
            &profile.financial_level,
            &profile.risk_tolerance,
            profile.monthly_savings(),
        )
        .await;

    let record = AdvisorRecord::new(auth.user_id, plan);
    state
        .database
        .insert_record(RecordKind::InvestmentAdvice, &record)
        .await?;

    Ok(Json(record))
}

pub async fn latest_investment(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<InvestmentAdvice>> {
    state
        .database
        .latest_record(auth.user_id, RecordKind::InvestmentAdvice)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No investment advice found".to_string()))
}

// Opportunity scanner

pub async fn scan_opportunities(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<OpportunityScan>> {
    let profile = AdvisorProfile::from(&load_profile(&state, auth.user_id).await?);
    let market = state.services.market.get_market_overview().await;
    let report = state
        .services
        .advisor
        .scan_opportunities(&profile, &market)
        .await;

    let record = AdvisorRecord::new(auth.user_id, report);
    state
        .database
        .insert_record(RecordKind::OpportunityScan, &record)
        .await?;

    Ok(Json(record))
}

pub async fn latest_scan(State(state): State<AppState>, auth: AuthUser) -> Result<Json<OpportunityScan>> {
    state
        .database
        .latest_record(auth.user_id, RecordKind::OpportunityScan)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No opportunity scan found".to_string()))
}

// Education

pub async fn get_lessons(
    State(state): State<AppState>,
    Query(query): Query<LessonQuery>,
) -> Json<Vec<EducationLesson>> {
    let level = query
        .level
        .as_deref()
        .map(str::trim)
        .filter(|level| !level.is_empty())
        .unwrap_or("beginner");

    Json(state.services.advisor.generate_lessons(level).await)
}

pub async fn complete_lesson(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(lesson_id): Path<String>,
) -> Result<Json<UserProgress>> {
    let progress = state
        .database
        .complete_lesson(auth.user_id, &lesson_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Progress not found".to_string()))?;

    Ok(Json(progress))
}

pub async fn get_progress(State(state): State<AppState>, auth: AuthUser) -> Result<Json<UserProgress>> {
    Ok(Json(load_progress(&state, auth.user_id).await?))
}

// Advisor chat

pub async fn chat(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    if request.message.trim().is_empty() {
        return Err(AppError::Validation("Message cannot be empty".to_string()));
    }

    let profile = state
        .database
        .get_profile(auth.user_id)
        .await?
        .map(|p| AdvisorProfile::from(&p))
        .unwrap_or_default();
    let history = state
        .database
        .recent_chat_messages(auth.user_id, CHAT_CONTEXT_LIMIT)
        .await?;

    let response = state
        .services
        .advisor
        .chat_with_advisor(&request.message, &profile, &history)
        .await;

    state
        .database
        .insert_chat_messages(&[
            ChatMessage::new(auth.user_id, "user", &request.message),
            ChatMessage::new(auth.user_id, "assistant", &response),
        ])
        .await?;

    Ok(Json(ChatResponse { response }))
}

pub async fn chat_history(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<ChatMessage>>> {
    let messages = state
        .database
        .recent_chat_messages(auth.user_id, CHAT_HISTORY_LIMIT)
        .await?;

    Ok(Json(messages))
}

// Market data

pub async fn market_overview(State(state): State<AppState>) -> Json<MarketOverview> {
    let market = &state.services.market;

    Json(MarketOverview {
        stocks: market.get_market_overview().await,
        crypto: market.get_crypto_prices(),
        last_updated: Utc::now(),
    })
}

pub async fn stock_quote(State(state): State<AppState>, Path(symbol): Path<String>) -> Json<StockQuote> {
    Json(state.services.market.get_stock_quote(&symbol).await)
}

pub async fn forex_rate(
    State(state): State<AppState>,
    Path((from, to)): Path<(String, String)>,
) -> Json<ForexRate> {
    Json(state.services.market.get_forex_rate(&from, &to).await)
}

// Dashboard

pub async fn dashboard_stats(State(state): State<AppState>, auth: AuthUser) -> Result<Json<DashboardStats>> {
    let profile = load_profile(&state, auth.user_id).await?;
    let progress = load_progress(&state, auth.user_id).await?;

    Ok(Json(DashboardStats::compute(&profile, &progress)))
}
