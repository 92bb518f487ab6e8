//! Security Middleware Module
//!
//! Axum middleware for authentication, admin authorization, rate limiting and security headers.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderValue, Method, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::api::app_state::AppState;
use crate::error::{AppError, ErrorResponse};
use crate::security::auth::{Claims, Credentials};
use crate::security::rate_limit::RateLimitResult;
use crate::security::rbac::{ActionType, ClaimsExt, Permission, ResourceType};

fn credentials(req: &Request) -> Credentials {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    Credentials::from_authorization_header(header)
}

/// Validate the token, then re-read the user so role changes and deletions apply immediately
async fn authenticate(state: &AppState, credentials: &Credentials) -> Result<Claims, AppError> {
    let mut claims = state.authenticator.authenticate(credentials).await?;
    let user = state.auth.me(&claims).await?;

    claims.username = user.username;
    claims.role = user.role.to_string();
    Ok(claims)
}

/// Require a valid bearer token; inserts `Claims` into request extensions
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credentials = credentials(&req);
    let claims = authenticate(&state, &credentials).await?;
    debug!(user = %claims.username, "authenticated request");

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Require a valid bearer token whose current role grants the route's permission
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credentials = credentials(&req);
    let permission = permission_for(req.method(), req.uri().path());
    let claims = authenticate(&state, &credentials).await?;

    let allowed = match &permission {
        Some(permission) => state.authorizer.check_permission(&claims, permission).await,
        None => claims.is_admin(),
    };

    if !allowed {
        warn!(
            user = %claims.username,
            method = %req.method(),
            path = %req.uri().path(),
            "permission denied"
        );
        return Err(AppError::Authorization(
            "Administrator role required".to_string(),
        ));
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Map an admin route onto the permission it needs
pub fn permission_for(method: &Method, path: &str) -> Option<Permission> {
    let mut segments = path
        .split('/')
        .filter(|s| !s.is_empty())
        .skip_while(|s| *s == "api" || is_version_segment(s));

    let resource = match segments.next()? {
        "mobile-suits" => ResourceType::MobileSuit,
        "lore" => ResourceType::Lore,
        "lore-characters" => ResourceType::Character,
        "factions" => ResourceType::Faction,
        "timeline" => ResourceType::Timeline,
        "users" => ResourceType::User,
        "dashboard" | "analytics" => ResourceType::Analytics,
        "settings" => ResourceType::Settings,
        _ => return None,
    };

    let is_upload = path.trim_end_matches('/').ends_with("/image");
    let action = if is_upload {
        ActionType::Upload
    } else if *method == Method::GET || *method == Method::HEAD {
        ActionType::Read
    } else if *method == Method::POST {
        ActionType::Create
    } else if *method == Method::PUT || *method == Method::PATCH {
        ActionType::Update
    } else if *method == Method::DELETE {
        ActionType::Delete
    } else {
        return None;
    };

    Some(Permission::new(resource, action))
}

fn is_version_segment(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}

/// Sliding-window limit for credential endpoints
pub async fn auth_rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let client = state.rate_limiter.client_for(&req);

    match state.rate_limiter.check_rate_limit(&client).await {
        RateLimitResult::Allowed { remaining } => {
            let mut response = next.run(req).await;
            response
                .headers_mut()
                .insert("X-RateLimit-Remaining", HeaderValue::from(remaining));
            response
        }
        RateLimitResult::Limited {
            retry_after,
            window,
        } => {
            warn!(client = client.as_str(), window = %window, "rate limit exceeded");
            let mut response = AppError::RateLimited.into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Copy the request id into JSON error bodies
pub async fn error_request_id_middleware(req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let response = next.run(req).await;

    let Some(request_id) = request_id else {
        return response;
    };
    let (mut parts, body) = response.into_parts();
    let Some(error) = parts.extensions.remove::<ErrorResponse>() else {
        return Response::from_parts(parts, body);
    };

    match serde_json::to_vec(&error.with_request_id(&request_id)) {
        Ok(bytes) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(_) => Response::from_parts(parts, body),
    }
}

/// Security headers middleware
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "Permissions-Policy",
        HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
    );

    response
}
