//! Customer routes
//!
//! Every handler consults the access policy for its operation first, before
//! reading or writing any customer data.

use crate::auth::{Operation, RequestIdentityContext};
use crate::error::ApiResult;
use crate::routes::extract::ValidatedJson;
use crate::services::CustomerService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use customer_identity_shared::{
    ApiResponse, CustomerResponse, EndpointInfo, LoginRequest, RegisterRequest, TokenResponse,
};

/// Create customer routes
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(get_profile))
        .route("/admin/customers", get(list_customers))
        .route("/admin/promote/:email", put(promote_to_admin))
}

/// POST /api/v1/customers/register
async fn register(
    State(state): State<AppState>,
    context: RequestIdentityContext,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CustomerResponse>>)> {
    state
        .policy()
        .enforce(Operation::Register, context.current_identity())?;

    let customer = CustomerService::register(state.store(), &state.registration, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Customer registered successfully", customer)),
    ))
}

/// POST /api/v1/customers/login
async fn login(
    State(state): State<AppState>,
    context: RequestIdentityContext,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<ApiResponse<TokenResponse>>> {
    state
        .policy()
        .enforce(Operation::Login, context.current_identity())?;

    let token = CustomerService::login(state.store(), state.tokens(), req).await?;
    Ok(Json(ApiResponse::ok("Login successful", token)))
}

/// GET /api/v1/customers/profile
async fn get_profile(
    State(state): State<AppState>,
    context: RequestIdentityContext,
) -> ApiResult<Json<ApiResponse<CustomerResponse>>> {
    let identity = state
        .policy()
        .authenticated(Operation::GetProfile, context.current_identity())?;

    let profile = CustomerService::get_profile(state.store(), &identity.subject).await?;
    Ok(Json(ApiResponse::ok("Profile fetched successfully", profile)))
}

/// GET /api/v1/customers/admin/customers
async fn list_customers(
    State(state): State<AppState>,
    context: RequestIdentityContext,
) -> ApiResult<Json<ApiResponse<Vec<CustomerResponse>>>> {
    state
        .policy()
        .enforce(Operation::ListCustomers, context.current_identity())?;

    let customers = CustomerService::list_customers(state.store()).await?;
    Ok(Json(ApiResponse::ok(
        "All customers retrieved successfully",
        customers,
    )))
}

/// PUT /api/v1/customers/admin/promote/{email}
async fn promote_to_admin(
    State(state): State<AppState>,
    context: RequestIdentityContext,
    Path(email): Path<String>,
) -> ApiResult<Json<ApiResponse<String>>> {
    state
        .policy()
        .enforce(Operation::PromoteToAdmin, context.current_identity())?;

    CustomerService::promote_to_admin(state.store(), &email).await?;
    Ok(Json(ApiResponse::ok("User promoted to ADMIN", email)))
}

/// GET /api/v1/docs
pub async fn api_docs(
    State(state): State<AppState>,
    context: RequestIdentityContext,
) -> ApiResult<Json<ApiResponse<Vec<EndpointInfo>>>> {
    state
        .policy()
        .enforce(Operation::ApiDocs, context.current_identity())?;

    Ok(Json(ApiResponse::ok(
        "Customer API endpoints",
        state.policy().endpoints(),
    )))
}

/// GET /api/v1
pub async fn api_info(
    State(state): State<AppState>,
    context: RequestIdentityContext,
) -> ApiResult<&'static str> {
    state
        .policy()
        .enforce(Operation::ApiInfo, context.current_identity())?;

    Ok("Customer Identity API v1")
}
