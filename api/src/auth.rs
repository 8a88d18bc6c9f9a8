//! Authentication surface: login, two-factor verification, token refresh,
//! password recovery, and profile.
//!
//! These endpoints are unauthenticated (they carry the static application
//! key instead of a bearer token) and are never retried: a duplicated
//! login can burn a one-time code.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use backdesk_types::{
    AuthTokens, ChallengeId, Credentials, DeliveryChannel, OtpChallenge, OtpCode, Profile,
};

use crate::client::ApiClient;
use crate::error::ApiError;

/// What a successful login yields: either a live session or a two-factor
/// challenge that must be verified first.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Authenticated(SessionPayload),
    ChallengeRequired(OtpChallenge),
}

/// Token material plus whatever profile fields the server attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub tokens: AuthTokens,
    pub profile: Profile,
}

/// The login payload is duck-typed: the same `data` object carries either
/// challenge fields or token fields depending on whether two-factor is
/// required for the account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginPayload {
    #[serde(default)]
    requires_otp: bool,
    #[serde(default)]
    challenge_id: Option<ChallengeId>,
    #[serde(default)]
    delivery_channel: Option<DeliveryChannel>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    user: Option<Profile>,
}

/// Fallback challenge lifetime when the server omits both `expiresAt`
/// and `expiresIn`.
const DEFAULT_CHALLENGE_SECS: i64 = 300;

impl LoginPayload {
    fn into_outcome(self, email: &str) -> Result<LoginOutcome, ApiError> {
        if self.requires_otp {
            let challenge_id = self.challenge_id.ok_or_else(|| {
                ApiError::Decode("two-factor required but no challenge id returned".to_owned())
            })?;
            let expires_at = self.expires_at.unwrap_or_else(|| {
                let secs = self.expires_in.unwrap_or(DEFAULT_CHALLENGE_SECS);
                Utc::now() + Duration::seconds(secs)
            });
            return Ok(LoginOutcome::ChallengeRequired(OtpChallenge {
                challenge_id,
                email: email.to_owned(),
                phone: self.phone,
                delivery_channel: self.delivery_channel.unwrap_or_default(),
                expires_at,
            }));
        }

        let token = self
            .token
            .ok_or_else(|| ApiError::Decode("login response carried no token".to_owned()))?;
        Ok(LoginOutcome::Authenticated(SessionPayload {
            tokens: AuthTokens {
                token,
                token_type: self.token_type,
                expires_at: self.expires_at,
                expires_in: self.expires_in,
            },
            profile: self.user.unwrap_or_default(),
        }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyPayload {
    token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    user: Option<Profile>,
}

impl ApiClient {
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome, ApiError> {
        let payload: LoginPayload = self.post_public("auth/login", credentials).await?;
        payload.into_outcome(&credentials.email)
    }

    /// Exchange a verified one-time code for session tokens.
    pub async fn verify_otp(
        &self,
        challenge: &OtpChallenge,
        code: &OtpCode,
    ) -> Result<SessionPayload, ApiError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            email: &'a str,
            otp_code: &'a str,
            challenge_id: &'a ChallengeId,
        }
        let payload: VerifyPayload = self
            .post_public(
                "auth/verify-otp",
                &Body {
                    email: &challenge.email,
                    otp_code: code.as_str(),
                    challenge_id: &challenge.challenge_id,
                },
            )
            .await?;
        Ok(SessionPayload {
            tokens: AuthTokens {
                token: payload.token,
                token_type: payload.token_type,
                expires_at: payload.expires_at,
                expires_in: payload.expires_in,
            },
            profile: payload.user.unwrap_or_default(),
        })
    }

    /// Ask for a fresh code on the same challenge. The server may return
    /// an updated expiry; when it does, callers replace the stored
    /// challenge deadline.
    pub async fn resend_otp(&self, challenge_id: &ChallengeId) -> Result<Option<DateTime<Utc>>, ApiError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            challenge_id: &'a ChallengeId,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ResendPayload {
            #[serde(default)]
            expires_at: Option<DateTime<Utc>>,
            #[serde(default)]
            expires_in: Option<i64>,
        }
        let payload: ResendPayload = self
            .post_public("auth/resend-2fa", &Body { challenge_id })
            .await?;
        Ok(payload.expires_at.or_else(|| {
            payload
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs))
        }))
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, ApiError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            refresh_token: &'a str,
        }
        self.post_public("auth/refresh", &Body { refresh_token }).await
    }

    /// Best-effort server-side logout. The local session is cleared
    /// regardless of the result, so callers usually log failures and move on.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.post_authed_ack("auth/logout", &serde_json::json!({})).await
    }

    pub async fn profile(&self) -> Result<Profile, ApiError> {
        self.get_authed("auth/profile", &[]).await
    }

    /// Request a password-reset email. The server answers the same way
    /// whether or not the address exists.
    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        self.post_public_ack("auth/forgot-password", &serde_json::json!({ "email": email }))
            .await
    }

    pub async fn reset_password(
        &self,
        token: &str,
        email: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            token: &'a str,
            email: &'a str,
            new_password: &'a str,
        }
        self.post_public_ack(
            "auth/reset-password",
            &Body {
                token,
                email,
                new_password,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::test_client;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn creds() -> Credentials {
        Credentials {
            email: "ops@example.com".to_owned(),
            password: "Str0ngPass".to_owned(),
        }
    }

    #[tokio::test]
    async fn login_with_otp_yields_a_challenge() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(header("x-api-key", "test-app-key"))
            .and(body_partial_json(serde_json::json!({
                "email": "ops@example.com",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {
                    "requiresOtp": true,
                    "challengeId": "ch-42",
                    "deliveryChannel": "email",
                    "expiresAt": "2025-03-01T10:05:00Z",
                },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None);
        match client.login(&creds()).await.unwrap() {
            LoginOutcome::ChallengeRequired(challenge) => {
                assert_eq!(challenge.challenge_id.as_str(), "ch-42");
                assert_eq!(challenge.email, "ops@example.com");
            }
            LoginOutcome::Authenticated(_) => panic!("expected challenge"),
        }
    }

    #[tokio::test]
    async fn login_without_otp_yields_tokens_and_profile() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {
                    "token": "jwt-abc",
                    "expiresIn": 3600,
                    "user": {"firstName": "Ada", "email": "ops@example.com"},
                },
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None);
        match client.login(&creds()).await.unwrap() {
            LoginOutcome::Authenticated(session) => {
                assert_eq!(session.tokens.token, "jwt-abc");
                assert_eq!(session.profile.first_name.as_deref(), Some("Ada"));
            }
            LoginOutcome::ChallengeRequired(_) => panic!("expected session"),
        }
    }

    #[tokio::test]
    async fn bad_credentials_surface_the_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "success": false,
                "message": "invalid email or password",
            })))
            .expect(1) // Never retried.
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None);
        let err = client.login(&creds()).await.unwrap_err();
        assert!(err.is_auth());
        assert_eq!(err.message(), "invalid email or password");
    }

    #[tokio::test]
    async fn verify_otp_sends_code_and_challenge_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/verify-otp"))
            .and(body_partial_json(serde_json::json!({
                "email": "ops@example.com",
                "otpCode": "123456",
                "challengeId": "ch-42",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {"token": "jwt-verified"},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let challenge = OtpChallenge {
            challenge_id: ChallengeId::from("ch-42"),
            email: "ops@example.com".to_owned(),
            phone: None,
            delivery_channel: DeliveryChannel::Email,
            expires_at: Utc::now() + Duration::seconds(300),
        };
        let code = OtpCode::new("123456").unwrap();

        let client = test_client(&server.uri(), None);
        let session = client.verify_otp(&challenge, &code).await.unwrap();
        assert_eq!(session.tokens.token, "jwt-verified");
    }

    #[tokio::test]
    async fn resend_reports_updated_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/resend-2fa"))
            .and(body_partial_json(serde_json::json!({"challengeId": "ch-42"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {"expiresIn": 300},
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None);
        let expiry = client
            .resend_otp(&ChallengeId::from("ch-42"))
            .await
            .unwrap();
        assert!(expiry.is_some());
    }

    #[tokio::test]
    async fn refresh_posts_the_current_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(body_partial_json(serde_json::json!({"refreshToken": "jwt-old"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {"token": "jwt-new", "expiresIn": 3600},
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None);
        let tokens = client.refresh("jwt-old").await.unwrap();
        assert_eq!(tokens.token, "jwt-new");
        assert_eq!(tokens.expires_in, Some(3600));
    }

    #[tokio::test]
    async fn forgot_password_acks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/forgot-password"))
            .and(body_partial_json(serde_json::json!({"email": "ops@example.com"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "message": "reset email sent",
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None);
        client.forgot_password("ops@example.com").await.unwrap();
    }
}
