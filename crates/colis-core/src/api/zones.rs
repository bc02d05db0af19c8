//! Zone endpoints (`/zones`).

use serde::de::IgnoredAny;

use super::colis::segment;
use super::{ApiClient, ApiError, RequestConfig};
use crate::models::{Zone, ZoneRequest};

pub struct ZonesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ZonesApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, request: &ZoneRequest) -> Result<Zone, ApiError> {
        self.client
            .post("/zones", Some(request), RequestConfig::default())
            .await
    }

    pub async fn update(&self, id: &str, request: &ZoneRequest) -> Result<Zone, ApiError> {
        self.client
            .put(
                &format!("/zones/{}", segment(id)),
                Some(request),
                RequestConfig::default(),
            )
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Zone, ApiError> {
        self.client
            .get(&format!("/zones/{}", segment(id)), RequestConfig::default())
            .await
    }

    pub async fn list(&self) -> Result<Vec<Zone>, ApiError> {
        self.client.get("/zones", RequestConfig::default()).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        // Some deployments answer 200 with a body instead of 204
        let _: IgnoredAny = self
            .client
            .delete(&format!("/zones/{}", segment(id)), RequestConfig::default())
            .await?;
        Ok(())
    }
}
