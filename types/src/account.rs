//! Virtual accounts (read-mostly, server-owned).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::AccountId;
use crate::money::Amount;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualAccount {
    pub id: AccountId,
    pub account_number: String,
    pub account_name: String,
    #[serde(default)]
    pub bank_name: Option<String>,
    pub currency: String,
    #[serde(default)]
    pub balance: Option<Amount>,
    #[serde(default)]
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a virtual account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub account_name: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}
