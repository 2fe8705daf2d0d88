//! HTTP Basic authentication gate.

use crate::{ApiError, AppState};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use base64::prelude::*;
use lading_error::{AuthError, AuthErrorKind};
use sha2::{Digest, Sha256};

/// Parse an HTTP Basic Authorization header into `(username, password)`.
///
/// Expected format: `Basic <base64(username:password)>`. The password may
/// itself contain colons.
///
/// # Examples
///
/// ```
/// use lading_server::parse_basic_auth_header;
///
/// let (username, password) = parse_basic_auth_header("Basic dXNlcjpwYXNz").unwrap();
/// assert_eq!(username, "user");
/// assert_eq!(password, "pass");
/// ```
pub fn parse_basic_auth_header(auth_header: &str) -> Result<(String, String), AuthError> {
    let encoded = auth_header.strip_prefix("Basic ").ok_or_else(|| {
        AuthError::new(AuthErrorKind::Malformed(
            "Authorization header must start with 'Basic '".to_string(),
        ))
    })?;

    let decoded_bytes = BASE64_STANDARD.decode(encoded.trim().as_bytes()).map_err(|e| {
        AuthError::new(AuthErrorKind::Malformed(format!("Invalid base64 encoding: {}", e)))
    })?;

    let decoded = String::from_utf8(decoded_bytes).map_err(|e| {
        AuthError::new(AuthErrorKind::Malformed(format!(
            "Invalid UTF-8 in credentials: {}",
            e
        )))
    })?;

    let (username, password) = decoded.split_once(':').ok_or_else(|| {
        AuthError::new(AuthErrorKind::Malformed(
            "Credentials must be in format 'username:password'".to_string(),
        ))
    })?;

    Ok((username.to_string(), password.to_string()))
}

/// Compare two strings in time independent of where they differ.
///
/// Both sides are hashed first so the comparison also hides their lengths.
pub fn constant_time_eq(left: &str, right: &str) -> bool {
    let left = Sha256::digest(left.as_bytes());
    let right = Sha256::digest(right.as_bytes());
    left.iter()
        .zip(right.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Expected basic-auth credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Credentials every request must present.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Check an Authorization header value against these credentials.
    ///
    /// Username and password are both compared, whatever the outcome of the
    /// first comparison.
    pub fn verify(&self, auth_header: Option<&str>) -> Result<(), AuthError> {
        let header = auth_header.ok_or_else(|| AuthError::new(AuthErrorKind::MissingCredentials))?;
        let (username, password) = parse_basic_auth_header(header)?;

        let username_ok = constant_time_eq(&username, &self.username);
        let password_ok = constant_time_eq(&password, &self.password);
        if username_ok & password_ok {
            Ok(())
        } else {
            tracing::warn!(username = %username, "Rejected basic-auth credentials");
            Err(AuthError::new(AuthErrorKind::InvalidCredentials))
        }
    }
}

/// Middleware rejecting requests without valid credentials.
pub async fn require_basic_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    state.credentials().verify(header)?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(raw: &str) -> String {
        format!("Basic {}", BASE64_STANDARD.encode(raw))
    }

    #[test]
    fn test_parse_valid_header() {
        let (user, pass) = parse_basic_auth_header(&header("admin:secret")).unwrap();
        assert_eq!(user, "admin");
        assert_eq!(pass, "secret");
    }

    #[test]
    fn test_parse_password_with_colon() {
        let (user, pass) = parse_basic_auth_header(&header("admin:se:cret")).unwrap();
        assert_eq!(user, "admin");
        assert_eq!(pass, "se:cret");
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        let err = parse_basic_auth_header("Bearer token").unwrap_err();
        assert!(matches!(err.kind, AuthErrorKind::Malformed(_)));
    }

    #[test]
    fn test_parse_rejects_bad_base64() {
        assert!(parse_basic_auth_header("Basic !!!").is_err());
    }

    #[test]
    fn test_parse_rejects_missing_colon() {
        assert!(parse_basic_auth_header(&header("adminsecret")).is_err());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("secret", "secret"));
        assert!(!constant_time_eq("secret", "secreT"));
        assert!(!constant_time_eq("secret", "secret-but-longer"));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn test_verify() {
        let credentials = Credentials::new("admin", "secret");
        assert!(credentials.verify(Some(&header("admin:secret"))).is_ok());

        let err = credentials.verify(Some(&header("admin:wrong"))).unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::InvalidCredentials);

        let err = credentials.verify(Some(&header("root:secret"))).unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::InvalidCredentials);

        let err = credentials.verify(None).unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::MissingCredentials);
    }

    #[test]
    fn test_debug_hides_password() {
        let credentials = Credentials::new("admin", "hunter2");
        assert!(!format!("{:?}", credentials).contains("hunter2"));
    }
}
