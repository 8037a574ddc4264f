//! API Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use ccbank_business::{
    ExternalTransaction, IdentityService, LedgerService, LoanApplication, LoanService,
    NotificationService, Registration, WithdrawalService,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiResult;
use crate::extract::AppJson;
use crate::state::AppState;

// ============ Request Types ============

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    pub account_number: String,
    pub password: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DepositRequest {
    pub account_number: String,
    pub account_pin: String,
    pub amount: Decimal,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct WithdrawRequest {
    pub account_number: String,
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub account_id: String,
    pub transaction: ExternalTransaction,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateBalanceRequest {
    pub account_number: String,
    pub amount_to_add: Decimal,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SendEmailRequest {
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AppendNotificationRequest {
    pub user_id: String,
    pub message: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct StatementRequest {
    pub user_id: String,
    pub account_number: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateLoanRequest {
    pub user_id: String,
    #[serde(flatten)]
    pub application: LoanApplication,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RepayRequest {
    pub user_id: String,
    pub loan_id: String,
    pub repayment_amount: Decimal,
    pub currency: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NewPasswordRequest {
    pub new_password: String,
}

// ============ Health ============

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

// ============ Identity ============

pub async fn register(
    State(state): State<AppState>,
    AppJson(form): AppJson<Registration>,
) -> ApiResult<impl IntoResponse> {
    let registered = IdentityService::new(&state.ctx).register(form).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully. Please verify the OTP sent to your email.",
            "user": registered.user,
            "account": registered.account,
        })),
    ))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    AppJson(req): AppJson<VerifyOtpRequest>,
) -> ApiResult<impl IntoResponse> {
    let verified = IdentityService::new(&state.ctx)
        .verify_otp(&req.email, &req.otp)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "OTP verified, account number sent to your email successfully",
            "user": verified.user,
            "account": verified.account,
            "accounts": verified.accounts,
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = IdentityService::new(&state.ctx)
        .login(&req.account_number, &req.password)
        .await?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": session.token,
        "user": session.user,
        "account": session.account,
        "accounts": session.accounts,
    })))
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    IdentityService::new(&state.ctx).logout();
    Json(json!({ "message": "Logout successful" }))
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let users = IdentityService::new(&state.ctx).list_users().await?;
    Ok(Json(json!({
        "message": "Users retrieved successfully",
        "users": users,
    })))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    IdentityService::new(&state.ctx).delete_user(&user_id).await?;
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    AppJson(req): AppJson<PasswordResetRequest>,
) -> ApiResult<impl IntoResponse> {
    IdentityService::new(&state.ctx)
        .request_password_reset(&req.email)
        .await?;
    Ok(Json(json!({ "message": "Password reset email sent" })))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    AppJson(req): AppJson<NewPasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    IdentityService::new(&state.ctx)
        .reset_password(&token, &req.new_password)
        .await?;
    Ok(Json(json!({ "message": "Password has been reset successfully" })))
}

// ============ Ledger ============

pub async fn deposit(
    State(state): State<AppState>,
    AppJson(req): AppJson<DepositRequest>,
) -> ApiResult<impl IntoResponse> {
    let receipt = LedgerService::new(&state.ctx)
        .deposit(&req.account_number, &req.account_pin, req.amount)
        .await?;

    Ok(Json(json!({
        "message": "Deposit successful",
        "account": receipt.account,
        "transaction": receipt.transaction,
    })))
}

pub async fn withdraw(
    State(state): State<AppState>,
    AppJson(req): AppJson<WithdrawRequest>,
) -> ApiResult<impl IntoResponse> {
    let receipt = LedgerService::new(&state.ctx)
        .withdraw(&req.account_number, req.amount, &req.currency, &req.description)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Withdrawal initiated successfully",
            "withdrawal": receipt.withdrawal,
            "accountBalance": receipt.account_balance,
        })),
    ))
}

pub async fn advance_withdrawal(
    State(state): State<AppState>,
    Path(withdrawal_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let withdrawal = WithdrawalService::new(&state.ctx)
        .advance(&withdrawal_id)
        .await?;

    Ok(Json(json!({
        "message": "Stage updated successfully",
        "withdrawal": withdrawal,
    })))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    AppJson(req): AppJson<UpdateTransactionRequest>,
) -> ApiResult<impl IntoResponse> {
    let account = LedgerService::new(&state.ctx)
        .record_transaction(&req.user_id, &req.account_id, req.transaction)
        .await?;

    Ok(Json(json!({
        "message": "Transaction updated successfully",
        "account": account,
    })))
}

pub async fn recent_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let recent = LedgerService::new(&state.ctx)
        .recent_transactions(&user_id)
        .await?;
    Ok(Json(json!({ "recentTransactions": recent })))
}

pub async fn update_balance(
    State(state): State<AppState>,
    AppJson(req): AppJson<UpdateBalanceRequest>,
) -> ApiResult<impl IntoResponse> {
    let adjusted = LedgerService::new(&state.ctx)
        .adjust_balance(&req.account_number, req.amount_to_add)
        .await?;

    Ok(Json(json!({
        "message": "Account balance updated successfully",
        "account": adjusted.account,
        "totalBalance": adjusted.total_balance,
    })))
}

pub async fn balance(
    State(state): State<AppState>,
    Path(account_number): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let summary = LedgerService::new(&state.ctx).balance(&account_number).await?;
    Ok(Json(json!({
        "balance": summary.balance,
        "currency": summary.currency,
    })))
}

pub async fn generate_statement(
    State(state): State<AppState>,
    AppJson(req): AppJson<StatementRequest>,
) -> ApiResult<impl IntoResponse> {
    let statement = LedgerService::new(&state.ctx)
        .statement(&req.user_id, &req.account_number, &req.start_date, &req.end_date)
        .await?;

    Ok(Json(json!({
        "message": "Statement generated successfully",
        "statement": statement,
    })))
}

// ============ Notifications ============

pub async fn send_notification(
    State(state): State<AppState>,
    AppJson(req): AppJson<SendEmailRequest>,
) -> ApiResult<impl IntoResponse> {
    NotificationService::new(&state.ctx)
        .send_email(&req.email, &req.subject, &req.message)
        .await?;
    Ok(Json(json!({ "message": "Notification sent successfully" })))
}

pub async fn append_notification(
    State(state): State<AppState>,
    AppJson(req): AppJson<AppendNotificationRequest>,
) -> ApiResult<impl IntoResponse> {
    let notification = NotificationService::new(&state.ctx)
        .append(&req.user_id, &req.message)
        .await?;

    Ok(Json(json!({
        "message": "Notification added successfully",
        "notification": notification,
    })))
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let notifications = NotificationService::new(&state.ctx).list(&user_id).await?;
    Ok(Json(json!({ "notifications": notifications })))
}

// ============ Loans ============

pub async fn create_loan(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateLoanRequest>,
) -> ApiResult<impl IntoResponse> {
    let loan = LoanService::new(&state.ctx)
        .create_loan(&req.user_id, req.application)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Loan created successfully",
            "loan": loan,
        })),
    ))
}

pub async fn get_loan(
    State(state): State<AppState>,
    Path(loan_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let loan = LoanService::new(&state.ctx).get_loan(&loan_id).await?;
    Ok(Json(json!({ "loan": loan })))
}

pub async fn repay_loan(
    State(state): State<AppState>,
    AppJson(req): AppJson<RepayRequest>,
) -> ApiResult<impl IntoResponse> {
    let repayment = LoanService::new(&state.ctx)
        .repay(&req.user_id, &req.loan_id, req.repayment_amount, &req.currency)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Repayment successful",
            "repayment": repayment,
        })),
    ))
}

pub async fn list_repayments(
    State(state): State<AppState>,
    Path(loan_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let repayments = LoanService::new(&state.ctx).list_repayments(&loan_id).await?;
    Ok(Json(json!({ "repayments": repayments })))
}

pub async fn list_user_loans(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let loans = LoanService::new(&state.ctx).loans_for_user(&user_id).await?;
    Ok(Json(json!({ "loans": loans })))
}
