// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Client records.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, normalize_email};

// =============================================================================
// Nested documents
// =============================================================================

/// Structured personal name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientName {
    /// Given name.
    pub first_name: String,
    /// Middle name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    /// Family name.
    pub last_name: String,
}

impl ClientName {
    /// Returns `true` if both mandatory parts are present.
    pub fn is_complete(&self) -> bool {
        !self.first_name.trim().is_empty() && !self.last_name.trim().is_empty()
    }
}

/// Postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAddress {
    /// House number.
    pub number: String,
    /// Street name.
    pub street: String,
    /// City.
    pub city: String,
    /// State or region.
    pub state: String,
    /// Postal code.
    pub zip: String,
}

impl ClientAddress {
    /// Returns `true` if every part is non-blank.
    pub fn is_complete(&self) -> bool {
        [&self.number, &self.street, &self.city, &self.state, &self.zip]
            .iter()
            .all(|part| !part.trim().is_empty())
    }
}

/// Credentials of a placeholder account kept for the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DummyAccount {
    /// Account login.
    pub username: String,
    /// Account password.
    pub password: String,
}

// =============================================================================
// ClientStatus
// =============================================================================

/// Processing status of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClientStatus {
    /// Not yet classified.
    #[default]
    #[serde(rename = "not set")]
    NotSet,
    /// Currently serviced.
    #[serde(rename = "active")]
    Active,
    /// On hold.
    #[serde(rename = "inactive")]
    Inactive,
    /// No longer serviced.
    #[serde(rename = "closed")]
    Closed,
}

impl ClientStatus {
    /// Returns the status as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::NotSet => "not set",
            ClientStatus::Active => "active",
            ClientStatus::Inactive => "inactive",
            ClientStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Client
// =============================================================================

/// A stored client record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Document id.
    pub id: String,
    /// Full name as written by the client.
    pub full_name: String,
    /// Structured name.
    pub name: ClientName,
    /// Other names the client is known by.
    #[serde(default)]
    pub alias_names: Vec<ClientName>,
    /// Primary email.
    pub email: String,
    /// Additional emails.
    #[serde(default)]
    pub alt_emails: Vec<String>,
    /// Primary address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<ClientAddress>,
    /// Previous or secondary addresses.
    #[serde(default)]
    pub alt_address: Vec<ClientAddress>,
    /// Phone number.
    pub phone: String,
    /// Placeholder accounts.
    #[serde(default)]
    pub dummy_account: Vec<DummyAccount>,
    /// Profession.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
    /// Workload description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload: Option<String>,
    /// External CRM id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sf_id: Option<String>,
    /// Processing status.
    #[serde(default)]
    pub status: ClientStatus,
    /// Date of birth.
    pub date_birth: NaiveDate,
    /// Enrollment date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_enrollment: Option<NaiveDate>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Applies a partial update and bumps `updated_at`.
    pub fn apply(&mut self, changes: ClientChanges) {
        let ClientChanges {
            full_name,
            name,
            alias_names,
            email,
            alt_emails,
            address,
            alt_address,
            phone,
            dummy_account,
            profession,
            workload,
            sf_id,
            status,
            date_birth,
            date_enrollment,
        } = changes;

        if let Some(v) = full_name {
            self.full_name = v.trim().to_string();
        }
        if let Some(v) = name {
            self.name = v;
        }
        if let Some(v) = alias_names {
            self.alias_names = v;
        }
        if let Some(v) = email {
            self.email = normalize_email(&v);
        }
        if let Some(v) = alt_emails {
            self.alt_emails = v.iter().map(|e| normalize_email(e)).collect();
        }
        if let Some(v) = address {
            self.address = Some(v);
        }
        if let Some(v) = alt_address {
            self.alt_address = v;
        }
        if let Some(v) = phone {
            self.phone = v.trim().to_string();
        }
        if let Some(v) = dummy_account {
            self.dummy_account = v;
        }
        if let Some(v) = profession {
            self.profession = Some(v);
        }
        if let Some(v) = workload {
            self.workload = Some(v);
        }
        if let Some(v) = sf_id {
            self.sf_id = Some(v);
        }
        if let Some(v) = status {
            self.status = v;
        }
        if let Some(v) = date_birth {
            self.date_birth = v;
        }
        if let Some(v) = date_enrollment {
            self.date_enrollment = Some(v);
        }
        self.updated_at = Utc::now();
    }
}

// =============================================================================
// NewClient
// =============================================================================

/// Input for creating a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClient {
    /// Full name.
    pub full_name: String,
    /// Structured name.
    pub name: ClientName,
    /// Alias names.
    #[serde(default)]
    pub alias_names: Vec<ClientName>,
    /// Primary email.
    pub email: String,
    /// Additional emails.
    #[serde(default)]
    pub alt_emails: Vec<String>,
    /// Primary address.
    #[serde(default)]
    pub address: Option<ClientAddress>,
    /// Secondary addresses.
    #[serde(default)]
    pub alt_address: Vec<ClientAddress>,
    /// Phone number.
    pub phone: String,
    /// Placeholder accounts.
    #[serde(default)]
    pub dummy_account: Vec<DummyAccount>,
    /// Profession.
    #[serde(default)]
    pub profession: Option<String>,
    /// Workload description.
    #[serde(default)]
    pub workload: Option<String>,
    /// External CRM id.
    #[serde(default)]
    pub sf_id: Option<String>,
    /// Initial status.
    #[serde(default)]
    pub status: ClientStatus,
    /// Date of birth.
    pub date_birth: NaiveDate,
    /// Enrollment date.
    #[serde(default)]
    pub date_enrollment: Option<NaiveDate>,
}

impl NewClient {
    /// Builds the stored document with a fresh id and timestamps.
    pub fn into_client(self) -> Client {
        let now = Utc::now();
        Client {
            id: new_id(),
            full_name: self.full_name.trim().to_string(),
            name: self.name,
            alias_names: self.alias_names,
            email: normalize_email(&self.email),
            alt_emails: self.alt_emails.iter().map(|e| normalize_email(e)).collect(),
            address: self.address,
            alt_address: self.alt_address,
            phone: self.phone.trim().to_string(),
            dummy_account: self.dummy_account,
            profession: self.profession,
            workload: self.workload,
            sf_id: self.sf_id,
            status: self.status,
            date_birth: self.date_birth,
            date_enrollment: self.date_enrollment,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// ClientChanges
// =============================================================================

/// Partial update of a client. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientChanges {
    /// New full name.
    pub full_name: Option<String>,
    /// New structured name.
    pub name: Option<ClientName>,
    /// Replacement alias list.
    pub alias_names: Option<Vec<ClientName>>,
    /// New primary email.
    pub email: Option<String>,
    /// Replacement email list.
    pub alt_emails: Option<Vec<String>>,
    /// New primary address.
    pub address: Option<ClientAddress>,
    /// Replacement address list.
    pub alt_address: Option<Vec<ClientAddress>>,
    /// New phone.
    pub phone: Option<String>,
    /// Replacement dummy accounts.
    pub dummy_account: Option<Vec<DummyAccount>>,
    /// New profession.
    pub profession: Option<String>,
    /// New workload.
    pub workload: Option<String>,
    /// New CRM id.
    pub sf_id: Option<String>,
    /// New status.
    pub status: Option<ClientStatus>,
    /// New birth date.
    pub date_birth: Option<NaiveDate>,
    /// New enrollment date.
    pub date_enrollment: Option<NaiveDate>,
}

impl ClientChanges {
    /// Returns `true` if nothing would change.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewClient {
        serde_json::from_value(serde_json::json!({
            "fullName": " John Q Public ",
            "name": { "firstName": "John", "middleName": "Q", "lastName": "Public" },
            "email": "John@Example.com",
            "phone": " 555-0100 ",
            "dateBirth": "1980-04-02"
        }))
        .unwrap()
    }

    #[test]
    fn test_new_client_defaults() {
        let client = sample().into_client();
        assert_eq!(client.full_name, "John Q Public");
        assert_eq!(client.email, "john@example.com");
        assert_eq!(client.phone, "555-0100");
        assert_eq!(client.status, ClientStatus::NotSet);
        assert!(client.alias_names.is_empty());
        assert_eq!(client.date_birth, NaiveDate::from_ymd_opt(1980, 4, 2).unwrap());
    }

    #[test]
    fn test_client_serializes_camel_case() {
        let json = serde_json::to_value(sample().into_client()).unwrap();
        assert_eq!(json["status"], "not set");
        assert_eq!(json["dateBirth"], "1980-04-02");
        assert_eq!(json["name"]["firstName"], "John");
        assert!(json.get("profession").is_none());
    }

    #[test]
    fn test_apply_changes() {
        let mut client = sample().into_client();
        let changes: ClientChanges = serde_json::from_value(serde_json::json!({
            "status": "active",
            "altEmails": ["A@B.C"]
        }))
        .unwrap();
        assert!(!changes.is_empty());
        client.apply(changes);
        assert_eq!(client.status, ClientStatus::Active);
        assert_eq!(client.alt_emails, vec!["a@b.c".to_string()]);
        assert_eq!(client.full_name, "John Q Public");
    }

    #[test]
    fn test_name_and_address_completeness() {
        let name = ClientName {
            first_name: "A".into(),
            middle_name: None,
            last_name: " ".into(),
        };
        assert!(!name.is_complete());

        let address = ClientAddress {
            number: "1".into(),
            street: "Main".into(),
            city: "X".into(),
            state: "Y".into(),
            zip: "00000".into(),
        };
        assert!(address.is_complete());
    }

    #[test]
    fn test_empty_changes() {
        assert!(ClientChanges::default().is_empty());
    }
}
