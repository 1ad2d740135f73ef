// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory store implementation.
//!
//! Backs all three store traits with `DashMap`s. Data is lost when the store
//! is dropped, so this backend is meant for tests and local development.
//!
//! # Example
//!
//! ```rust,ignore
//! use rcm_core::store::{MemoryStore, UserStore};
//!
//! let store = MemoryStore::new();
//! store.insert_user(user).await?;
//! assert_eq!(store.count_users().await?, 1);
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::models::{Client, TokenRecord, TokenType, User, normalize_email};

use super::{ClientStore, Page, TokenQuery, TokenStore, UserStore};

// =============================================================================
// MemoryStore
// =============================================================================

/// A thread-safe in-memory store.
///
/// Ids are UUIDv7 strings, so sorting by id yields creation order for
/// listings.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    /// Unique index: normalized email -> user id.
    emails: DashMap<String, String>,
    clients: DashMap<String, Client>,
    tokens: DashMap<String, TokenRecord>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored token records.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    fn page_of<T: Clone>(mut items: Vec<(String, T)>, page: Page) -> Vec<T> {
        items.sort_by(|a, b| a.0.cmp(&b.0));
        items
            .into_iter()
            .skip(usize::try_from(page.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit).unwrap_or(usize::MAX))
            .map(|(_, item)| item)
            .collect()
    }
}

// =============================================================================
// UserStore
// =============================================================================

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: User) -> CoreResult<User> {
        let email = normalize_email(&user.email);
        match self.emails.entry(email) {
            Entry::Occupied(entry) => Err(CoreError::duplicate("user", "email", entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(user.id.clone());
                self.users.insert(user.id.clone(), user.clone());
                debug!(user_id = %user.id, "User inserted");
                Ok(user)
            }
        }
    }

    async fn find_user(&self, id: &str) -> CoreResult<Option<User>> {
        Ok(self.users.get(id).map(|u| u.value().clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let id = match self.emails.get(&normalize_email(email)) {
            Some(id) => id.value().clone(),
            None => return Ok(None),
        };
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn list_users(&self, page: Page) -> CoreResult<Vec<User>> {
        let items = self
            .users
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        Ok(Self::page_of(items, page))
    }

    async fn count_users(&self) -> CoreResult<u64> {
        Ok(self.users.len() as u64)
    }

    async fn update_user(&self, user: User) -> CoreResult<Option<User>> {
        let previous_email = match self.users.get(&user.id) {
            Some(existing) => existing.email.clone(),
            None => return Ok(None),
        };

        let email = normalize_email(&user.email);
        if email != previous_email {
            match self.emails.entry(email) {
                Entry::Occupied(entry) if *entry.get() != user.id => {
                    return Err(CoreError::duplicate("user", "email", entry.key().clone()));
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(entry) => {
                    entry.insert(user.id.clone());
                }
            }
            self.emails.remove(&previous_email);
        }

        self.users.insert(user.id.clone(), user.clone());
        Ok(Some(user))
    }

    async fn delete_user(&self, id: &str) -> CoreResult<Option<User>> {
        let removed = self.users.remove(id).map(|(_, user)| user);
        if let Some(user) = &removed {
            self.emails.remove(&user.email);
            debug!(user_id = %id, "User deleted");
        }
        Ok(removed)
    }
}

// =============================================================================
// ClientStore
// =============================================================================

#[async_trait]
impl ClientStore for MemoryStore {
    async fn insert_client(&self, client: Client) -> CoreResult<Client> {
        self.clients.insert(client.id.clone(), client.clone());
        Ok(client)
    }

    async fn find_client(&self, id: &str) -> CoreResult<Option<Client>> {
        Ok(self.clients.get(id).map(|c| c.value().clone()))
    }

    async fn list_clients(&self, page: Page) -> CoreResult<Vec<Client>> {
        let items = self
            .clients
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        Ok(Self::page_of(items, page))
    }

    async fn count_clients(&self) -> CoreResult<u64> {
        Ok(self.clients.len() as u64)
    }

    async fn update_client(&self, client: Client) -> CoreResult<Option<Client>> {
        match self.clients.get_mut(&client.id) {
            Some(mut existing) => {
                *existing = client.clone();
                Ok(Some(client))
            }
            None => Ok(None),
        }
    }

    async fn delete_client(&self, id: &str) -> CoreResult<Option<Client>> {
        Ok(self.clients.remove(id).map(|(_, client)| client))
    }
}

// =============================================================================
// TokenStore
// =============================================================================

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert_token(&self, record: TokenRecord) -> CoreResult<()> {
        self.tokens.insert(record.id.clone(), record);
        Ok(())
    }

    async fn find_token(&self, query: &TokenQuery) -> CoreResult<Option<TokenRecord>> {
        Ok(self
            .tokens
            .iter()
            .find(|e| query.matches(e.value()))
            .map(|e| e.value().clone()))
    }

    async fn delete_token(&self, id: &str) -> CoreResult<bool> {
        Ok(self.tokens.remove(id).is_some())
    }

    async fn delete_tokens_by_user(
        &self,
        user: &str,
        token_type: Option<TokenType>,
    ) -> CoreResult<u64> {
        let before = self.tokens.len();
        self.tokens.retain(|_, record| {
            !(record.user == user && token_type.is_none_or(|t| t == record.token_type))
        });
        Ok(before.saturating_sub(self.tokens.len()) as u64)
    }

    async fn set_blacklisted(&self, id: &str, blacklisted: bool) -> CoreResult<bool> {
        match self.tokens.get_mut(id) {
            Some(mut record) => {
                record.blacklisted = blacklisted;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> CoreResult<u64> {
        let before = self.tokens.len();
        self.tokens.retain(|_, record| !record.is_expired_at(now));
        let purged = before.saturating_sub(self.tokens.len()) as u64;
        if purged > 0 {
            debug!(purged, "Expired tokens purged");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewClient, NewUser};
    use chrono::Duration;

    fn user(email: &str) -> User {
        NewUser::new("Test", email, "hash").into_user()
    }

    fn client() -> Client {
        serde_json::from_value::<NewClient>(serde_json::json!({
            "fullName": "A B",
            "name": { "firstName": "A", "lastName": "B" },
            "email": "a@b.c",
            "phone": "1",
            "dateBirth": "1990-01-01"
        }))
        .unwrap()
        .into_client()
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let store = MemoryStore::new();
        let inserted = store.insert_user(user("a@b.c")).await.unwrap();

        let found = store.find_user(&inserted.id).await.unwrap().unwrap();
        assert_eq!(found, inserted);

        let by_email = store.find_user_by_email("A@B.C").await.unwrap().unwrap();
        assert_eq!(by_email.id, inserted.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store.insert_user(user("a@b.c")).await.unwrap();

        let err = store.insert_user(user("a@b.c")).await.unwrap_err();
        assert!(matches!(err, CoreError::Duplicate { field: "email", .. }));
        assert_eq!(store.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_user_email_index() {
        let store = MemoryStore::new();
        let mut first = store.insert_user(user("a@b.c")).await.unwrap();
        store.insert_user(user("taken@b.c")).await.unwrap();

        first.email = "taken@b.c".into();
        assert!(store.update_user(first.clone()).await.is_err());

        first.email = "new@b.c".into();
        store.update_user(first.clone()).await.unwrap().unwrap();
        assert!(store.find_user_by_email("a@b.c").await.unwrap().is_none());
        assert!(store.find_user_by_email("new@b.c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let store = MemoryStore::new();
        assert!(store.update_user(user("a@b.c")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_user_frees_email() {
        let store = MemoryStore::new();
        let u = store.insert_user(user("a@b.c")).await.unwrap();

        assert!(store.delete_user(&u.id).await.unwrap().is_some());
        assert!(store.delete_user(&u.id).await.unwrap().is_none());
        store.insert_user(user("a@b.c")).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_users_paged_in_creation_order() {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(store.insert_user(user(&format!("u{i}@b.c"))).await.unwrap().id);
        }

        let page = store.list_users(Page::new(1, 2)).await.unwrap();
        let got: Vec<_> = page.into_iter().map(|u| u.id).collect();
        assert_eq!(got, ids[1..3].to_vec());

        assert_eq!(store.list_users(Page::all()).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_client_crud() {
        let store = MemoryStore::new();
        let mut c = store.insert_client(client()).await.unwrap();
        assert_eq!(store.count_clients().await.unwrap(), 1);

        c.phone = "2".into();
        let updated = store.update_client(c.clone()).await.unwrap().unwrap();
        assert_eq!(updated.phone, "2");

        assert!(store.delete_client(&c.id).await.unwrap().is_some());
        assert!(store.find_client(&c.id).await.unwrap().is_none());
        assert!(store.update_client(c).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_token_lifecycle() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let record = TokenRecord::new("tok", "u1", TokenType::Refresh, now + Duration::days(1));
        store.insert_token(record.clone()).await.unwrap();

        let query = TokenQuery::new("tok", TokenType::Refresh)
            .with_user("u1")
            .with_blacklisted(false);
        assert!(store.find_token(&query).await.unwrap().is_some());

        assert!(store.set_blacklisted(&record.id, true).await.unwrap());
        assert!(store.find_token(&query).await.unwrap().is_none());

        assert!(store.delete_token(&record.id).await.unwrap());
        assert!(!store.delete_token(&record.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_tokens_by_user() {
        let store = MemoryStore::new();
        let exp = Utc::now() + Duration::days(1);
        store.insert_token(TokenRecord::new("a", "u1", TokenType::Access, exp)).await.unwrap();
        store.insert_token(TokenRecord::new("r", "u1", TokenType::Refresh, exp)).await.unwrap();
        store.insert_token(TokenRecord::new("x", "u2", TokenType::Refresh, exp)).await.unwrap();

        assert_eq!(store.delete_tokens_by_user("u1", Some(TokenType::Refresh)).await.unwrap(), 1);
        assert_eq!(store.delete_tokens_by_user("u1", None).await.unwrap(), 1);
        assert_eq!(store.token_count(), 1);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .insert_token(TokenRecord::new("old", "u", TokenType::Access, now - Duration::seconds(1)))
            .await
            .unwrap();
        store
            .insert_token(TokenRecord::new("new", "u", TokenType::Access, now + Duration::hours(1)))
            .await
            .unwrap();

        assert_eq!(store.purge_expired(now).await.unwrap(), 1);
        assert_eq!(store.token_count(), 1);
    }
}
