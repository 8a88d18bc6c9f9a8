//! Transactions and statement export parameters.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::TransactionId;
use crate::money::Amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Credit => "Credit",
            Self::Debit => "Debit",
        }
    }

    /// Query-parameter value expected by the statement endpoint.
    #[must_use]
    pub const fn as_query_value(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: Amount,
    pub currency: String,
    #[serde(default)]
    pub narration: Option<String>,
    #[serde(default)]
    pub counterparty: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Export format for statement downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Pdf,
    Csv,
}

impl ExportFormat {
    #[must_use]
    pub const fn as_query_value(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Csv => "csv",
        }
    }
}

/// Parameters for the statement endpoint.
///
/// The backend emails the generated statement to `email`; the type filter
/// is optional (absent means all transactions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub transaction_type: Option<TransactionType>,
    pub export: ExportFormat,
    pub email: String,
}

impl StatementRequest {
    /// Query pairs in the shape the backend expects
    /// (`StartDate`/`EndDate` are capitalized by the server contract).
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("StartDate", self.start_date.format("%Y-%m-%d").to_string()),
            ("EndDate", self.end_date.format("%Y-%m-%d").to_string()),
        ];
        if let Some(kind) = self.transaction_type {
            pairs.push(("TransactionType", kind.as_query_value().to_owned()));
        }
        pairs.push(("export", self.export.as_query_value().to_owned()));
        pairs.push(("email", self.email.clone()));
        pairs
    }
}
