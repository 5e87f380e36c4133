//! Bearer-token extraction.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use prepai_types::InterviewError;

use crate::identity::Identity;

use super::error::ApiError;
use super::http::GatewayState;

/// `Authorization: Bearer <token>`; a bare token without the scheme is accepted too.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match raw.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        None if raw.eq_ignore_ascii_case("bearer") => "",
        _ => raw,
    };
    (!token.is_empty()).then_some(token)
}

pub(crate) fn authenticate(state: &GatewayState, token: Option<&str>) -> Result<Identity, ApiError> {
    let token = token.ok_or_else(|| {
        ApiError::from(InterviewError::Unauthorized(
            "missing bearer token".to_string(),
        ))
    })?;
    state.identity.verify(token).map_err(|error| {
        tracing::debug!(error = %error, "bearer token rejected");
        ApiError::from(InterviewError::from(error))
    })
}

/// Caller identity from a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

impl AuthenticatedUser {
    pub fn user_id(&self) -> &str {
        &self.0.user_id
    }
}

impl FromRequestParts<GatewayState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &GatewayState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(state, bearer_token(&parts.headers)).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).expect("header"));
        headers
    }

    #[test]
    fn accepts_scheme_and_bare_tokens() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer   abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
