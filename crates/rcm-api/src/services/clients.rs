// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Client records.

use std::sync::Arc;

use rcm_core::{Client, ClientChanges, ClientStore, NewClient, store::Page};

use super::{Listing, require_id};
use crate::error::{ApiError, ApiResult};

const NOT_FOUND: &str = "Client: client not found";

/// Manages client records.
#[derive(Debug, Clone)]
pub struct ClientService {
    clients: Arc<dyn ClientStore>,
}

impl ClientService {
    /// Creates a new client service.
    pub fn new(clients: Arc<dyn ClientStore>) -> Self {
        Self { clients }
    }

    /// Lists clients.
    pub async fn find_all(&self, page: Page) -> ApiResult<Listing<Client>> {
        let items = self.clients.list_clients(page).await?;
        let total = self.clients.count_clients().await?;
        Ok(Listing { items, total, page })
    }

    /// Finds a client by id.
    pub async fn find_by_id(&self, id: &str) -> ApiResult<Client> {
        require_id(id, "Client: invalid clientId")?;
        self.clients
            .find_client(id)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))
    }

    /// Creates a client.
    pub async fn create_client(&self, input: NewClient) -> ApiResult<Client> {
        let client = self.clients.insert_client(input.into_client()).await?;
        tracing::info!(client_id = %client.id, "Client created");
        Ok(client)
    }

    /// Applies a partial update.
    pub async fn update_client(&self, id: &str, changes: ClientChanges) -> ApiResult<Client> {
        let mut client = self.find_by_id(id).await?;
        client.apply(changes);

        let client = self
            .clients
            .update_client(client)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
        tracing::info!(client_id = %client.id, "Client updated");
        Ok(client)
    }

    /// Deletes a client.
    pub async fn delete_client(&self, id: &str) -> ApiResult<Client> {
        require_id(id, "Client: invalid clientId")?;
        let client = self
            .clients
            .delete_client(id)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
        tracing::info!(client_id = %client.id, "Client deleted");
        Ok(client)
    }
}

// =============================================================================
// Tests
// =============================================================================
