#![allow(missing_docs)]

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use prepai_agent::{HmacIdentityProvider, IdentityError, IdentityProvider};
use prepai_types::InterviewError;

fn provider() -> HmacIdentityProvider {
    HmacIdentityProvider::new("identity-test-secret", 600).expect("provider")
}

#[test]
fn issued_token_verifies_to_subject() {
    let provider = provider();
    let token = provider.issue("  alice ").expect("issue");
    let identity = provider.verify(&token).expect("verify");
    assert_eq!(identity.user_id, "alice");
    assert!(identity.expires_at > Utc::now().timestamp());
}

#[test]
fn tampered_payload_fails_signature_check() {
    let provider = provider();
    let token = provider.issue("alice").expect("issue");
    let (_, signature) = token.split_once('.').expect("two parts");
    let forged_claims = URL_SAFE_NO_PAD.encode(br#"{"sub":"mallory","exp":4102444800}"#);
    let forged = format!("{forged_claims}.{signature}");
    assert_eq!(provider.verify(&forged), Err(IdentityError::BadSignature));
}

#[test]
fn token_from_another_secret_is_rejected() {
    let other = HmacIdentityProvider::new("a-different-secret", 600).expect("provider");
    let token = other.issue("alice").expect("issue");
    assert_eq!(provider().verify(&token), Err(IdentityError::BadSignature));
}

#[test]
fn expired_and_malformed_tokens_are_rejected() {
    let provider = provider();
    let expired = provider
        .issue_with_expiry("alice", Utc::now().timestamp() - 5)
        .expect("issue");
    assert_eq!(provider.verify(&expired), Err(IdentityError::Expired));
    assert_eq!(provider.verify("no-dot-here"), Err(IdentityError::Malformed));
    assert_eq!(provider.verify("abc.zz-not-hex"), Err(IdentityError::Malformed));
    assert_eq!(provider.issue("   "), Err(IdentityError::EmptySubject));
}

#[test]
fn identity_errors_map_to_unauthorized() {
    let err: InterviewError = IdentityError::Expired.into();
    assert_eq!(err.kind(), "unauthorized");
    assert!(HmacIdentityProvider::new("", 60).is_err());
}
