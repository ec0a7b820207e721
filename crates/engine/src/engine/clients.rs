use bookwell_db::models::client::{Client, UpsertClient};
use bookwell_db::repositories::ClientRepo;

use super::BookingEngine;
use crate::error::EngineResult;

impl BookingEngine {
    /// Register a client by external reference, or refresh the profile
    /// of a known one.
    pub async fn register_client(&self, input: &UpsertClient) -> EngineResult<Client> {
        let client = ClientRepo::upsert(&self.pool, input).await?;
        tracing::debug!(client_id = client.id, external_ref = %client.external_ref, "Client registered");
        Ok(client)
    }
}
