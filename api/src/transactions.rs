//! Transaction endpoints and statement dispatch.

use backdesk_types::{Page, PageRequest, StatementRequest, Transaction, TransactionId};

use crate::client::{page_query, ApiClient};
use crate::error::ApiError;

impl ApiClient {
    pub async fn list_transactions(&self, page: PageRequest) -> Result<Page<Transaction>, ApiError> {
        self.get_authed("transactions", &page_query(page)).await
    }

    pub async fn get_transaction(&self, id: &TransactionId) -> Result<Transaction, ApiError> {
        self.get_authed(&format!("transactions/{}", id.as_str()), &[])
            .await
    }

    /// Ask the backend to generate a statement and email it. Dispatched
    /// exactly once: a retry could email duplicate statements.
    pub async fn request_statement(&self, request: &StatementRequest) -> Result<(), ApiError> {
        self.get_authed_ack("transactions/statement", &request.to_query_pairs())
            .await
    }
}
