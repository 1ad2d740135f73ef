// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Storage abstractions.
//!
//! The service layer talks to persistence only through [`UserStore`],
//! [`ClientStore`] and [`TokenStore`]. Two backends are provided:
//!
//! - [`MemoryStore`]: concurrent in-process maps, used for tests and the
//!   `memory` database provider
//! - `MongoStore` (feature `mongodb`): MongoDB collections

use std::fmt::{self, Debug};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CoreResult;
use crate::models::{Client, TokenRecord, TokenType, User};

mod memory;
#[cfg(feature = "mongodb")]
mod mongo;

pub use memory::MemoryStore;
#[cfg(feature = "mongodb")]
pub use mongo::{MongoSettings, MongoStore};

// =============================================================================
// Query helpers
// =============================================================================

/// Offset-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Number of documents to skip.
    pub offset: u64,
    /// Maximum number of documents to return.
    pub limit: u64,
}

impl Page {
    /// Creates a page window.
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// A window covering every document.
    pub fn all() -> Self {
        Self {
            offset: 0,
            limit: u64::MAX,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::all()
    }
}

/// Filter for token lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenQuery {
    /// Encoded token.
    pub token: String,
    /// Token purpose.
    pub token_type: TokenType,
    /// Owning user, if it must match.
    pub user: Option<String>,
    /// Blacklist flag, if it must match.
    pub blacklisted: Option<bool>,
}

impl TokenQuery {
    /// Matches a token string and type.
    pub fn new(token: impl Into<String>, token_type: TokenType) -> Self {
        Self {
            token: token.into(),
            token_type,
            user: None,
            blacklisted: None,
        }
    }

    /// Requires the given owner.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Requires the given blacklist flag.
    pub fn with_blacklisted(mut self, blacklisted: bool) -> Self {
        self.blacklisted = Some(blacklisted);
        self
    }

    /// Returns `true` if the record satisfies this query.
    pub fn matches(&self, record: &TokenRecord) -> bool {
        record.token == self.token
            && record.token_type == self.token_type
            && self.user.as_ref().is_none_or(|u| *u == record.user)
            && self.blacklisted.is_none_or(|b| b == record.blacklisted)
    }
}

// =============================================================================
// Store traits
// =============================================================================

/// Persistence for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync + Debug {
    /// Inserts a user. Fails with `Duplicate` if the email is taken.
    async fn insert_user(&self, user: User) -> CoreResult<User>;

    /// Finds a user by id.
    async fn find_user(&self, id: &str) -> CoreResult<Option<User>>;

    /// Finds a user by normalized email.
    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<User>>;

    /// Lists users in creation order.
    async fn list_users(&self, page: Page) -> CoreResult<Vec<User>>;

    /// Counts all users.
    async fn count_users(&self) -> CoreResult<u64>;

    /// Replaces a user by id. Returns `None` if it does not exist.
    async fn update_user(&self, user: User) -> CoreResult<Option<User>>;

    /// Deletes a user by id and returns the removed document.
    async fn delete_user(&self, id: &str) -> CoreResult<Option<User>>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> CoreResult<()> {
        Ok(())
    }
}

/// Persistence for client records.
#[async_trait]
pub trait ClientStore: Send + Sync + Debug {
    /// Inserts a client.
    async fn insert_client(&self, client: Client) -> CoreResult<Client>;

    /// Finds a client by id.
    async fn find_client(&self, id: &str) -> CoreResult<Option<Client>>;

    /// Lists clients in creation order.
    async fn list_clients(&self, page: Page) -> CoreResult<Vec<Client>>;

    /// Counts all clients.
    async fn count_clients(&self) -> CoreResult<u64>;

    /// Replaces a client by id. Returns `None` if it does not exist.
    async fn update_client(&self, client: Client) -> CoreResult<Option<Client>>;

    /// Deletes a client by id and returns the removed document.
    async fn delete_client(&self, id: &str) -> CoreResult<Option<Client>>;
}

/// Persistence for issued tokens.
#[async_trait]
pub trait TokenStore: Send + Sync + Debug {
    /// Stores a token record.
    async fn insert_token(&self, record: TokenRecord) -> CoreResult<()>;

    /// Finds the first record matching the query.
    async fn find_token(&self, query: &TokenQuery) -> CoreResult<Option<TokenRecord>>;

    /// Deletes a record by id. Returns `false` if it did not exist.
    async fn delete_token(&self, id: &str) -> CoreResult<bool>;

    /// Deletes every record of a user, optionally restricted to one type.
    async fn delete_tokens_by_user(
        &self,
        user: &str,
        token_type: Option<TokenType>,
    ) -> CoreResult<u64>;

    /// Sets the blacklist flag of a record. Returns `false` if it did not exist.
    async fn set_blacklisted(&self, id: &str, blacklisted: bool) -> CoreResult<bool>;

    /// Deletes every record that expired at `now`.
    async fn purge_expired(&self, now: DateTime<Utc>) -> CoreResult<u64>;
}

// =============================================================================
// Stores
// =============================================================================

/// Bundle of the three stores shared by the services.
#[derive(Clone)]
pub struct Stores {
    /// User persistence.
    pub users: Arc<dyn UserStore>,
    /// Client persistence.
    pub clients: Arc<dyn ClientStore>,
    /// Token persistence.
    pub tokens: Arc<dyn TokenStore>,
}

impl Stores {
    /// Creates a bundle backed by a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::from_shared(Arc::new(MemoryStore::new()))
    }

    /// Creates a bundle where one backend serves all three stores.
    pub fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: UserStore + ClientStore + TokenStore + 'static,
    {
        Self {
            users: store.clone(),
            clients: store.clone(),
            tokens: store,
        }
    }
}

impl Debug for Stores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stores")
            .field("users", &self.users)
            .field("clients", &self.clients)
            .field("tokens", &self.tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_token_query_matches() {
        let record = TokenRecord::new("abc", "u1", TokenType::Access, Utc::now());

        assert!(TokenQuery::new("abc", TokenType::Access).matches(&record));
        assert!(
            TokenQuery::new("abc", TokenType::Access)
                .with_user("u1")
                .with_blacklisted(false)
                .matches(&record)
        );
        assert!(!TokenQuery::new("abc", TokenType::Refresh).matches(&record));
        assert!(!TokenQuery::new("abc", TokenType::Access).with_user("u2").matches(&record));
        assert!(
            !TokenQuery::new("abc", TokenType::Access)
                .with_blacklisted(true)
                .matches(&record)
        );
    }

    #[test]
    fn test_page_all() {
        assert_eq!(Page::default(), Page::new(0, u64::MAX));
    }
}
