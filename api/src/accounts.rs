//! Virtual account endpoints.

use backdesk_types::{AccountId, NewAccount, Page, PageRequest, VirtualAccount};

use crate::client::{page_query, ApiClient};
use crate::error::ApiError;

impl ApiClient {
    pub async fn list_accounts(&self, page: PageRequest) -> Result<Page<VirtualAccount>, ApiError> {
        self.get_authed("accounts", &page_query(page)).await
    }

    pub async fn get_account(&self, id: &AccountId) -> Result<VirtualAccount, ApiError> {
        self.get_authed(&format!("accounts/{}", id.as_str()), &[]).await
    }

    pub async fn create_account(&self, account: &NewAccount) -> Result<VirtualAccount, ApiError> {
        self.post_authed("accounts", account).await
    }
}
