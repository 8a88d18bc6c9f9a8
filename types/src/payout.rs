//! Payouts and the approval workflow.
//!
//! Status is server-owned: approval and processing state only ever change
//! through API calls, never locally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::PayoutId;
use crate::money::Amount;

/// Processing status of a payout, distinct from its approval status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl PayoutStatus {
    /// Terminal states cannot be approved or rejected.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// Approval workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payout {
    pub id: PayoutId,
    pub amount: Amount,
    pub currency: String,
    pub beneficiary_account_number: String,
    pub beneficiary_account_name: String,
    pub beneficiary_bank_code: String,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub narration: Option<String>,
    pub status: PayoutStatus,
    pub approval_status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Payout {
    /// Whether approve/reject actions are offered for this payout.
    ///
    /// Final enforcement is server-side; this only gates the UI.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        self.approval_status == ApprovalStatus::Pending && !self.status.is_terminal()
    }
}

/// Request body for creating a payout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayout {
    pub amount: Amount,
    pub currency: String,
    pub beneficiary_account_number: String,
    pub beneficiary_account_name: String,
    pub beneficiary_bank_code: String,
    pub bank_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
}

/// Result of resolving `(account_number, bank_code)` to an account name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAccount {
    pub account_number: String,
    pub account_name: String,
    #[serde(default)]
    pub bank_code: Option<String>,
}

/// Minimum length of a rejection reason, enforced before any request is sent.
pub const MIN_REJECT_REASON_LEN: usize = 10;

/// A rejection reason guaranteed to be trimmed and at least
/// [`MIN_REJECT_REASON_LEN`] characters long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RejectReason(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RejectReasonError {
    #[error("please provide a reason for rejection")]
    Empty,
    #[error("reason must be at least {MIN_REJECT_REASON_LEN} characters")]
    TooShort,
}

impl RejectReason {
    pub fn new(input: &str) -> Result<Self, RejectReasonError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(RejectReasonError::Empty);
        }
        if trimmed.chars().count() < MIN_REJECT_REASON_LEN {
            return Err(RejectReasonError::TooShort);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payout(status: PayoutStatus, approval: ApprovalStatus) -> Payout {
        Payout {
            id: PayoutId::from("po-1"),
            amount: Amount::from_minor(500_000),
            currency: "NGN".to_owned(),
            beneficiary_account_number: "0123456789".to_owned(),
            beneficiary_account_name: "Jane Vendor".to_owned(),
            beneficiary_bank_code: "058".to_owned(),
            bank_name: Some("GTBank".to_owned()),
            narration: Some("invoice 42".to_owned()),
            status,
            approval_status: approval,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn actionable_only_while_pending_and_not_terminal() {
        assert!(payout(PayoutStatus::Pending, ApprovalStatus::Pending).is_actionable());
        assert!(payout(PayoutStatus::Processing, ApprovalStatus::Pending).is_actionable());

        assert!(!payout(PayoutStatus::Completed, ApprovalStatus::Pending).is_actionable());
        assert!(!payout(PayoutStatus::Failed, ApprovalStatus::Pending).is_actionable());
        assert!(!payout(PayoutStatus::Pending, ApprovalStatus::Approved).is_actionable());
        assert!(!payout(PayoutStatus::Pending, ApprovalStatus::Rejected).is_actionable());
    }

    #[test]
    fn reject_reason_enforces_trimmed_minimum() {
        assert_eq!(RejectReason::new("   "), Err(RejectReasonError::Empty));
        assert_eq!(
            RejectReason::new("too short"),
            Err(RejectReasonError::TooShort)
        );
        // Whitespace padding must not count toward the minimum.
        assert_eq!(
            RejectReason::new("   too short   "),
            Err(RejectReasonError::TooShort)
        );

        let reason = RejectReason::new("  duplicate payment detected  ").unwrap();
        assert_eq!(reason.as_str(), "duplicate payment detected");
    }

    #[test]
    fn payout_deserializes_from_api_shape() {
        let json = r#"{
            "id": "po-9",
            "amount": 1500.5,
            "currency": "NGN",
            "beneficiaryAccountNumber": "0123456789",
            "beneficiaryAccountName": "Acme Supplies",
            "beneficiaryBankCode": "058",
            "bankName": "GTBank",
            "narration": "restock",
            "status": "pending",
            "approvalStatus": "pending",
            "createdAt": "2025-03-01T09:30:00Z"
        }"#;
        let p: Payout = serde_json::from_str(json).unwrap();
        assert_eq!(p.amount, Amount::from_minor(150_050));
        assert!(p.is_actionable());
    }
}
