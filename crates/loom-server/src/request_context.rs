use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use loom_bridge::UpstreamToken;
use secrecy::SecretString;

/// Header carrying the caller's gateway credential
pub const UPSTREAM_AUTHORIZATION: &str = "x-upstream-authorization";

/// Middleware that lifts the upstream bearer token into request extensions
///
/// A `Bearer ` prefix is stripped; an empty value is ignored.
pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get(UPSTREAM_AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token);

    if let Some(token) = token {
        request.extensions_mut().insert(UpstreamToken(SecretString::from(token)));
    }

    next.run(request).await
}

fn bearer_token(value: &str) -> Option<String> {
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then(|| token.to_owned())
}
