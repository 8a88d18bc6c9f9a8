//! Users, roles, and audit log entries.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// User status as the backend encodes it (1 active, 0 inactive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl From<u8> for UserStatus {
    fn from(value: u8) -> Self {
        if value == 1 {
            Self::Active
        } else {
            Self::Inactive
        }
    }
}

impl From<UserStatus> for u8 {
    fn from(value: UserStatus) -> Self {
        match value {
            UserStatus::Active => 1,
            UserStatus::Inactive => 0,
        }
    }
}

impl UserStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Role {
    /// Display name: explicit name, else the key in title case.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let Some(key) = &self.key else {
            return String::new();
        };
        key.split('_')
            .filter(|s| !s.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    pub status: UserStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Request body for creating a user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub roles: Vec<String>,
}

/// The signed-in user's profile, merged from login and OTP responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub status: Option<UserStatus>,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Profile {
    /// Merge fields from a later response (e.g. OTP verification) into
    /// this profile, keeping existing values where the update is silent.
    pub fn merge(&mut self, update: Profile) {
        if update.id.is_some() {
            self.id = update.id;
        }
        if update.first_name.is_some() {
            self.first_name = update.first_name;
        }
        if update.last_name.is_some() {
            self.last_name = update.last_name;
        }
        if update.email.is_some() {
            self.email = update.email;
        }
        if update.company_id.is_some() {
            self.company_id = update.company_id;
        }
        if update.company_name.is_some() {
            self.company_name = update.company_name;
        }
        if update.status.is_some() {
            self.status = update.status;
        }
        if !update.roles.is_empty() {
            self.roles = update.roles;
        }
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(f), Some(l)) => format!("{f} {l}"),
            (Some(f), None) => f.clone(),
            (None, Some(l)) => l.clone(),
            (None, None) => self.email.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    pub action: String,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub is_successful: Option<bool>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    /// IP address masked for display (`203.0.xxx.xxx`).
    #[must_use]
    pub fn masked_ip(&self) -> String {
        let Some(ip) = self.ip_address.as_deref() else {
            return "Unknown".to_owned();
        };
        let parts: Vec<&str> = ip.split('.').collect();
        if parts.len() == 4 {
            return format!("{}.{}.xxx.xxx", parts[0], parts[1]);
        }
        if ip.chars().count() > 6 {
            let head: String = ip.chars().take(6).collect();
            return format!("{head}...");
        }
        ip.to_owned()
    }
}

/// Human-readable description for a permission key, falling back to the key.
#[must_use]
pub fn permission_description(permission: &str) -> &str {
    match permission {
        "accounts.create" => "Create new virtual accounts",
        "accounts.view" => "View account information and balances",
        "audit.view" => "View system audit logs and user activity",
        "payouts.approve" => "Approve or reject payout requests",
        "payouts.create" => "Create new payout requests",
        "payouts.view" => "View payout history and details",
        "transactions.view" => "View transaction history and details",
        "users.manage" => "Create, edit, and manage user accounts",
        other => other,
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_numeric_encoding() {
        let active: UserStatus = serde_json::from_str("1").unwrap();
        assert_eq!(active, UserStatus::Active);
        let inactive: UserStatus = serde_json::from_str("0").unwrap();
        assert_eq!(inactive, UserStatus::Inactive);
        assert_eq!(serde_json::to_string(&UserStatus::Active).unwrap(), "1");
        assert_eq!(UserStatus::Active.toggled(), UserStatus::Inactive);
    }

    #[test]
    fn role_display_name_falls_back_to_key() {
        let role = Role {
            key: Some("super_admin".to_owned()),
            name: None,
            permissions: vec![],
        };
        assert_eq!(role.display_name(), "Super Admin");
    }

    #[test]
    fn profile_merge_keeps_existing_on_silent_fields() {
        let mut profile = Profile {
            id: Some(UserId::from("u-1")),
            first_name: Some("Ada".to_owned()),
            company_name: Some("Acme".to_owned()),
            ..Default::default()
        };
        profile.merge(Profile {
            last_name: Some("Okafor".to_owned()),
            ..Default::default()
        });

        assert_eq!(profile.id, Some(UserId::from("u-1")));
        assert_eq!(profile.first_name.as_deref(), Some("Ada"));
        assert_eq!(profile.last_name.as_deref(), Some("Okafor"));
        assert_eq!(profile.company_name.as_deref(), Some("Acme"));
        assert_eq!(profile.display_name(), "Ada Okafor");
    }

    #[test]
    fn masks_ip_addresses() {
        let mut entry = AuditLogEntry {
            id: None,
            user_email: None,
            action: "login".to_owned(),
            result: None,
            is_successful: Some(true),
            ip_address: Some("203.0.113.50".to_owned()),
            user_agent: None,
            created_at: Utc::now(),
        };
        assert_eq!(entry.masked_ip(), "203.0.xxx.xxx");

        entry.ip_address = Some("2001:db8::1".to_owned());
        assert_eq!(entry.masked_ip(), "2001:d...");

        entry.ip_address = None;
        assert_eq!(entry.masked_ip(), "Unknown");
    }
}
