//! User management endpoints: listing, creation, status toggles, roles,
//! and the audit trail.

use serde::Serialize;

use backdesk_types::{AuditLogEntry, NewUser, Page, PageRequest, Role, User, UserId, UserStatus};

use crate::client::{page_query, ApiClient};
use crate::error::ApiError;

impl ApiClient {
    pub async fn list_users(&self, page: PageRequest) -> Result<Page<User>, ApiError> {
        self.get_authed("users", &page_query(page)).await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User, ApiError> {
        self.post_authed("users", user).await
    }

    /// Set a user's active/inactive status. Callers invalidate the user
    /// list cache on success rather than patching rows locally.
    pub async fn update_user_status(
        &self,
        id: &UserId,
        status: UserStatus,
    ) -> Result<(), ApiError> {
        #[derive(Serialize)]
        struct Body {
            status: UserStatus,
        }
        self.put_authed_ack(&format!("users/{}/status", id.as_str()), &Body { status })
            .await
    }

    /// Role catalogue with per-role permission keys.
    pub async fn roles_permissions(&self) -> Result<Vec<Role>, ApiError> {
        self.get_authed("users/roles-permissions", &[]).await
    }

    /// The audit trail across all users, newest first.
    pub async fn audit_logs(&self) -> Result<Vec<AuditLogEntry>, ApiError> {
        self.get_authed("users/audit", &[]).await
    }
}

#[cfg(test)]
mod tests {
    use crate::client::test_support::test_client;
    use backdesk_types::{NewUser, UserId, UserStatus};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn status_update_sends_numeric_encoding() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/users/u-5/status"))
            .and(body_json(serde_json::json!({"status": 0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Some("tok"));
        client
            .update_user_status(&UserId::from("u-5"), UserStatus::Inactive)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn creates_user_with_role_keys() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users"))
            .and(body_json(serde_json::json!({
                "firstName": "Ada",
                "lastName": "Okafor",
                "email": "ada@example.com",
                "password": "Str0ngPass",
                "roles": ["approver"],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {
                    "id": "u-9",
                    "firstName": "Ada",
                    "lastName": "Okafor",
                    "email": "ada@example.com",
                    "status": 1,
                },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Some("tok"));
        let user = client
            .create_user(&NewUser {
                first_name: "Ada".to_owned(),
                last_name: "Okafor".to_owned(),
                email: "ada@example.com".to_owned(),
                password: "Str0ngPass".to_owned(),
                roles: vec!["approver".to_owned()],
            })
            .await
            .unwrap();
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.full_name(), "Ada Okafor");
    }

    #[tokio::test]
    async fn audit_logs_decode_as_flat_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/audit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": [{
                    "action": "user.login",
                    "isSuccessful": true,
                    "ipAddress": "203.0.113.50",
                    "createdAt": "2025-03-01T09:30:00Z",
                }],
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Some("tok"));
        let logs = client.audit_logs().await.unwrap();
        assert_eq!(logs[0].masked_ip(), "203.0.xxx.xxx");
    }
}
