// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! MongoDB store implementation.
//!
//! Documents are stored in the `users`, `clients` and `tokens` collections
//! with the model id as `_id`. Timestamps are converted to BSON dates so
//! range queries (token expiry) are evaluated by the server.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, Bson, Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, Credential, IndexOptions};
use mongodb::{Collection, Database, IndexModel};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};
use crate::models::{Client, TokenRecord, TokenType, User, normalize_email};

use super::{ClientStore, Page, TokenQuery, TokenStore, UserStore};

const USERS: &str = "users";
const CLIENTS: &str = "clients";
const TOKENS: &str = "tokens";
const DATE_FIELDS: [&str; 3] = ["createdAt", "updatedAt", "expires"];
const DUPLICATE_KEY: i32 = 11000;

// =============================================================================
// MongoSettings
// =============================================================================

/// Connection settings for [`MongoStore`].
#[derive(Clone, Default)]
pub struct MongoSettings {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Database name.
    pub database: String,
    /// Optional user name.
    pub username: Option<String>,
    /// Optional password.
    pub password: Option<String>,
}

impl MongoSettings {
    /// Returns the connection URI without credentials.
    pub fn uri(&self) -> String {
        format!("mongodb://{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for MongoSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

// =============================================================================
// MongoStore
// =============================================================================

/// A store backed by MongoDB collections.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
    users: Collection<Document>,
    clients: Collection<Document>,
    tokens: Collection<Document>,
}

impl fmt::Debug for MongoStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoStore")
            .field("database", &self.db.name())
            .finish_non_exhaustive()
    }
}

impl MongoStore {
    /// Connects to the server and ensures the indexes exist.
    pub async fn connect(settings: &MongoSettings) -> CoreResult<Self> {
        let mut options = ClientOptions::parse(settings.uri()).await.map_err(storage)?;
        options.app_name = Some(crate::NAME.to_string());
        if let Some(username) = &settings.username {
            options.credential = Some(
                Credential::builder()
                    .username(username.clone())
                    .password(settings.password.clone())
                    .build(),
            );
        }

        let client = mongodb::Client::with_options(options).map_err(storage)?;
        let db = client.database(&settings.database);
        let store = Self {
            users: db.collection(USERS),
            clients: db.collection(CLIENTS),
            tokens: db.collection(TOKENS),
            db,
        };
        store.ensure_indexes().await?;

        info!(host = %settings.host, port = settings.port, database = %settings.database, "Connected to MongoDB");
        Ok(store)
    }

    async fn ensure_indexes(&self) -> CoreResult<()> {
        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users.create_index(unique_email).await.map_err(storage)?;

        let token_lookup = IndexModel::builder()
            .keys(doc! { "token": 1, "type": 1 })
            .build();
        self.tokens.create_index(token_lookup).await.map_err(storage)?;

        let token_owner = IndexModel::builder()
            .keys(doc! { "user": 1, "type": 1 })
            .build();
        self.tokens.create_index(token_owner).await.map_err(storage)?;
        Ok(())
    }

    async fn list<T: DeserializeOwned>(
        collection: &Collection<Document>,
        page: Page,
    ) -> CoreResult<Vec<T>> {
        let mut find = collection.find(doc! {}).sort(doc! { "_id": 1 });
        if page.offset > 0 {
            find = find.skip(page.offset);
        }
        if let Ok(limit) = i64::try_from(page.limit) {
            find = find.limit(limit);
        }
        let docs: Vec<Document> = find.await.map_err(storage)?.try_collect().await.map_err(storage)?;
        docs.into_iter().map(from_document).collect()
    }

    async fn replace<T: Serialize>(
        collection: &Collection<Document>,
        id: &str,
        value: &T,
        on_error: impl FnOnce(mongodb::error::Error) -> CoreError,
    ) -> CoreResult<bool> {
        let result = collection
            .replace_one(doc! { "_id": id }, to_document(value)?)
            .await
            .map_err(on_error)?;
        Ok(result.matched_count > 0)
    }

    async fn remove<T: DeserializeOwned>(
        collection: &Collection<Document>,
        id: &str,
    ) -> CoreResult<Option<T>> {
        collection
            .find_one_and_delete(doc! { "_id": id })
            .await
            .map_err(storage)?
            .map(from_document)
            .transpose()
    }
}

// =============================================================================
// Document conversion
// =============================================================================

fn storage(err: mongodb::error::Error) -> CoreError {
    CoreError::storage(err.to_string())
}

/// Maps a user write failure, reporting unique-email violations with the
/// submitted email rather than the server's message.
fn map_user_write_error(err: mongodb::error::Error, email: &str) -> CoreError {
    if let ErrorKind::Write(WriteFailure::WriteError(write)) = err.kind.as_ref() {
        if let Some(duplicate) = duplicate_email(write.code, email) {
            return duplicate;
        }
    }
    storage(err)
}

fn duplicate_email(code: i32, email: &str) -> Option<CoreError> {
    (code == DUPLICATE_KEY).then(|| CoreError::duplicate("user", "email", email))
}

fn bson_date(value: DateTime<Utc>) -> Bson {
    Bson::DateTime(bson::DateTime::from_millis(value.timestamp_millis()))
}

/// Serializes a model and moves `id` to `_id`.
fn to_document<T: Serialize>(value: &T) -> CoreResult<Document> {
    let mut document =
        bson::to_document(value).map_err(|e| CoreError::serialization(e.to_string()))?;
    if let Some(id) = document.remove("id") {
        document.insert("_id", id);
    }
    for field in DATE_FIELDS {
        let parsed = match document.get_str(field) {
            Ok(raw) => DateTime::parse_from_rfc3339(raw)
                .map_err(|e| CoreError::serialization(format!("{field}: {e}")))?,
            Err(_) => continue,
        };
        document.insert(field, bson_date(parsed.with_timezone(&Utc)));
    }
    Ok(document)
}

/// Reverses [`to_document`].
fn from_document<T: DeserializeOwned>(mut document: Document) -> CoreResult<T> {
    if let Some(id) = document.remove("_id") {
        document.insert("id", id);
    }
    for field in DATE_FIELDS {
        if let Ok(date) = document.get_datetime(field) {
            let text = date
                .try_to_rfc3339_string()
                .map_err(|e| CoreError::serialization(format!("{field}: {e}")))?;
            document.insert(field, text);
        }
    }
    bson::from_document(document).map_err(|e| CoreError::serialization(e.to_string()))
}

fn token_filter(query: &TokenQuery) -> Document {
    let mut filter = doc! {
        "token": &query.token,
        "type": query.token_type.as_str(),
    };
    if let Some(user) = &query.user {
        filter.insert("user", user);
    }
    if let Some(blacklisted) = query.blacklisted {
        filter.insert("blacklisted", blacklisted);
    }
    filter
}

// =============================================================================
// Store implementations
// =============================================================================

#[async_trait]
impl UserStore for MongoStore {
    async fn insert_user(&self, user: User) -> CoreResult<User> {
        self.users
            .insert_one(to_document(&user)?)
            .await
            .map_err(|e| map_user_write_error(e, &user.email))?;
        Ok(user)
    }

    async fn find_user(&self, id: &str) -> CoreResult<Option<User>> {
        self.users
            .find_one(doc! { "_id": id })
            .await
            .map_err(storage)?
            .map(from_document)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        self.users
            .find_one(doc! { "email": normalize_email(email) })
            .await
            .map_err(storage)?
            .map(from_document)
            .transpose()
    }

    async fn list_users(&self, page: Page) -> CoreResult<Vec<User>> {
        Self::list(&self.users, page).await
    }

    async fn count_users(&self) -> CoreResult<u64> {
        self.users.count_documents(doc! {}).await.map_err(storage)
    }

    async fn update_user(&self, user: User) -> CoreResult<Option<User>> {
        let matched = Self::replace(&self.users, &user.id, &user, |e| {
            map_user_write_error(e, &user.email)
        })
        .await?;
        Ok(matched.then_some(user))
    }

    async fn delete_user(&self, id: &str) -> CoreResult<Option<User>> {
        Self::remove(&self.users, id).await
    }

    async fn ping(&self) -> CoreResult<()> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(storage)
    }
}

#[async_trait]
impl ClientStore for MongoStore {
    async fn insert_client(&self, client: Client) -> CoreResult<Client> {
        self.clients
            .insert_one(to_document(&client)?)
            .await
            .map_err(storage)?;
        Ok(client)
    }

    async fn find_client(&self, id: &str) -> CoreResult<Option<Client>> {
        self.clients
            .find_one(doc! { "_id": id })
            .await
            .map_err(storage)?
            .map(from_document)
            .transpose()
    }

    async fn list_clients(&self, page: Page) -> CoreResult<Vec<Client>> {
        Self::list(&self.clients, page).await
    }

    async fn count_clients(&self) -> CoreResult<u64> {
        self.clients.count_documents(doc! {}).await.map_err(storage)
    }

    async fn update_client(&self, client: Client) -> CoreResult<Option<Client>> {
        let matched = Self::replace(&self.clients, &client.id, &client, storage).await?;
        Ok(matched.then_some(client))
    }

    async fn delete_client(&self, id: &str) -> CoreResult<Option<Client>> {
        Self::remove(&self.clients, id).await
    }
}

#[async_trait]
impl TokenStore for MongoStore {
    async fn insert_token(&self, record: TokenRecord) -> CoreResult<()> {
        self.tokens
            .insert_one(to_document(&record)?)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn find_token(&self, query: &TokenQuery) -> CoreResult<Option<TokenRecord>> {
        self.tokens
            .find_one(token_filter(query))
            .await
            .map_err(storage)?
            .map(from_document)
            .transpose()
    }

    async fn delete_token(&self, id: &str) -> CoreResult<bool> {
        let result = self
            .tokens
            .delete_one(doc! { "_id": id })
            .await
            .map_err(storage)?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_tokens_by_user(
        &self,
        user: &str,
        token_type: Option<TokenType>,
    ) -> CoreResult<u64> {
        let mut filter = doc! { "user": user };
        if let Some(token_type) = token_type {
            filter.insert("type", token_type.as_str());
        }
        let result = self.tokens.delete_many(filter).await.map_err(storage)?;
        Ok(result.deleted_count)
    }

    async fn set_blacklisted(&self, id: &str, blacklisted: bool) -> CoreResult<bool> {
        let result = self
            .tokens
            .update_one(doc! { "_id": id }, doc! { "$set": { "blacklisted": blacklisted } })
            .await
            .map_err(storage)?;
        Ok(result.matched_count > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> CoreResult<u64> {
        let result = self
            .tokens
            .delete_many(doc! { "expires": { "$lte": bson_date(now) } })
            .await
            .map_err(storage)?;
        debug!(purged = result.deleted_count, "Expired tokens purged");
        Ok(result.deleted_count)
    }
}
