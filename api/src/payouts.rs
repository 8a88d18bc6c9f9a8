//! Payout endpoints: listing, creation, the approval workflow, and the
//! bank/account helpers that feed the create form.

use serde::Serialize;

use backdesk_types::{Bank, NewPayout, Page, PageRequest, Payout, PayoutId, RejectReason, ResolvedAccount};

use crate::client::{page_query, ApiClient};
use crate::error::ApiError;

impl ApiClient {
    pub async fn list_payouts(&self, page: PageRequest) -> Result<Page<Payout>, ApiError> {
        self.get_authed("payouts", &page_query(page)).await
    }

    pub async fn get_payout(&self, id: &PayoutId) -> Result<Payout, ApiError> {
        self.get_authed(&format!("payouts/{}", id.as_str()), &[]).await
    }

    pub async fn create_payout(&self, payout: &NewPayout) -> Result<Payout, ApiError> {
        self.post_authed("payouts", payout).await
    }

    /// Approve a pending payout. Callers invalidate the payout list and
    /// detail caches on success; the server owns the resulting status.
    pub async fn approve_payout(&self, id: &PayoutId) -> Result<(), ApiError> {
        self.post_authed_ack(
            &format!("payouts/{}/approve", id.as_str()),
            &serde_json::json!({}),
        )
        .await
    }

    /// Reject a pending payout. The reason is validated client-side
    /// ([`RejectReason`]) before any request is sent.
    pub async fn reject_payout(&self, id: &PayoutId, reason: &RejectReason) -> Result<(), ApiError> {
        #[derive(Serialize)]
        struct Body<'a> {
            reason: &'a str,
        }
        self.post_authed_ack(
            &format!("payouts/{}/reject", id.as_str()),
            &Body {
                reason: reason.as_str(),
            },
        )
        .await
    }

    /// The provider's bank directory. This backend reads the bearer token
    /// from `x-api-key` on this one route.
    pub async fn provider_banks(&self) -> Result<Vec<Bank>, ApiError> {
        self.get_with_token_as_key("payouts/provider-banks").await
    }

    /// Resolve an account number against a bank to the registered account
    /// name. One-shot; the caller debounces and aborts stale requests.
    pub async fn resolve_account(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> Result<ResolvedAccount, ApiError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            account_number: &'a str,
            bank_code: &'a str,
        }
        self.post_authed(
            "payouts/resolve-account",
            &Body {
                account_number,
                bank_code,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::client::test_support::test_client;
    use backdesk_types::{PageRequest, PayoutId, RejectReason};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn lists_payouts_with_page_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/payouts"))
            .and(query_param("page", "2"))
            .and(query_param("pageSize", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {
                    "items": [{
                        "id": "po-1",
                        "amount": 250.0,
                        "currency": "NGN",
                        "beneficiaryAccountNumber": "0123456789",
                        "beneficiaryAccountName": "Acme Supplies",
                        "beneficiaryBankCode": "058",
                        "status": "pending",
                        "approvalStatus": "pending",
                        "createdAt": "2025-03-01T09:30:00Z",
                    }],
                    "page": 2,
                    "pageSize": 20,
                    "totalPages": 3,
                },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Some("tok"));
        let page = client
            .list_payouts(PageRequest::new(2, 20))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.has_next());
        assert!(page.items[0].is_actionable());
    }

    #[tokio::test]
    async fn reject_sends_trimmed_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payouts/po-7/reject"))
            .and(body_json(serde_json::json!({
                "reason": "duplicate payment detected",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Some("tok"));
        let reason = RejectReason::new("  duplicate payment detected  ").unwrap();
        client
            .reject_payout(&PayoutId::from("po-7"), &reason)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn approve_surfaces_business_rule_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payouts/po-3/approve"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "message": "payout already processed",
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Some("tok"));
        let err = client
            .approve_payout(&PayoutId::from("po-3"))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "payout already processed");
    }

    #[tokio::test]
    async fn provider_banks_send_bearer_token_as_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/payouts/provider-banks"))
            .and(header("x-api-key", "tok-bearer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": [
                    {"bankName": "GTBank", "bankCode": "058"},
                    {"bankName": "Zenith", "bankCode": "057"},
                ],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Some("tok-bearer"));
        let banks = client.provider_banks().await.unwrap();
        assert_eq!(banks.len(), 2);
    }

    #[tokio::test]
    async fn resolves_account_names() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payouts/resolve-account"))
            .and(body_json(serde_json::json!({
                "accountNumber": "0123456789",
                "bankCode": "058",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {
                    "accountNumber": "0123456789",
                    "accountName": "ACME SUPPLIES LTD",
                },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Some("tok"));
        let resolved = client.resolve_account("0123456789", "058").await.unwrap();
        assert_eq!(resolved.account_name, "ACME SUPPLIES LTD");
    }

    #[tokio::test]
    async fn resolution_failure_carries_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payouts/resolve-account"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "success": false,
                "message": "could not resolve account",
            })))
            .expect(1) // Writes are one-shot.
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Some("tok"));
        let err = client.resolve_account("0000000000", "058").await.unwrap_err();
        assert_eq!(err.message(), "could not resolve account");
    }
}
