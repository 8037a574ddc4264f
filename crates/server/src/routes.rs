//! API Routes

use axum::{
    http::HeaderValue,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Routes under `/api/users`
fn user_routes() -> Router<AppState> {
    Router::new()
        // Identity
        .route("/register", post(handlers::register))
        .route("/verify-otp", post(handlers::verify_otp))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/users", get(handlers::list_users))
        .route("/:user_id", delete(handlers::delete_user))
        .route("/password-reset/request", post(handlers::request_password_reset))
        .route("/password-reset/:token", post(handlers::reset_password))
        // Ledger
        .route("/deposit", post(handlers::deposit))
        .route("/withdraw", post(handlers::withdraw))
        .route(
            "/withdraw/update-stage/:withdrawal_id",
            put(handlers::advance_withdrawal),
        )
        .route("/update-transaction", post(handlers::update_transaction))
        .route("/recent-transaction/:user_id", get(handlers::recent_transactions))
        .route("/update-balance", post(handlers::update_balance))
        .route("/balance/:account_number", get(handlers::balance))
        .route("/generate-statement", post(handlers::generate_statement))
        // Notifications
        .route("/send-notification", post(handlers::send_notification))
        .route("/send-notifications", post(handlers::append_notification))
        .route("/users/:user_id/notifications", get(handlers::list_notifications))
        // Loans
        .route("/loans/create", post(handlers::create_loan))
        .route("/loans/repay", post(handlers::repay_loan))
        .route("/loans/:loan_id", get(handlers::get_loan))
        .route("/loans/repayments/:loan_id", get(handlers::list_repayments))
        .route("/loans/user/:user_id", get(handlers::list_user_loans))
}

/// CORS layer; `*` (hoặc danh sách rỗng) cho phép mọi origin
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(allowed))
}

pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .nest("/api/users", user_routes())
        // Middleware
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
