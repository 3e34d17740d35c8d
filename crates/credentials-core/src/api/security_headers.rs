//! Security headers middleware
//!
//! Token responses must never be cached by intermediaries.

use axum::{
    middleware::Next,
    response::Response,
    http::{Request, header, HeaderValue},
};

/// Add security headers to all responses
pub async fn security_headers_middleware(
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    
    // Responses carry bearer credentials
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store")
    );
    
    headers.insert(
        header::PRAGMA,
        HeaderValue::from_static("no-cache")
    );
    
    // Prevent clickjacking attacks
    headers.insert(
        header::X_FRAME_OPTIONS,
        HeaderValue::from_static("DENY")
    );
    
    // Prevent MIME type sniffing
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff")
    );
    
    // Tokens must not leak through the referrer
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer")
    );
    
    // Content Security Policy
    // This is a restrictive policy suitable for an API
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "default-src 'none'; \
             frame-ancestors 'none'; \
             form-action 'none'; \
             base-uri 'none'"
        )
    );
    
    response
}
