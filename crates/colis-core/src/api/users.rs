//! User endpoints (`/users`).
//!
//! The backend has no role filter, so role lookups fetch every user and
//! filter locally.

use super::colis::segment;
use super::{ApiClient, ApiError, RequestConfig};
use crate::models::{User, UserRole};

pub struct UsersApi<'a> {
    client: &'a ApiClient,
}

impl<'a> UsersApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<User>, ApiError> {
        self.client.get("/users", RequestConfig::default()).await
    }

    pub async fn get(&self, id: &str) -> Result<User, ApiError> {
        self.client
            .get(&format!("/users/{}", segment(id)), RequestConfig::default())
            .await
    }

    pub async fn by_role(&self, role: UserRole) -> Result<Vec<User>, ApiError> {
        let users = self.list().await?;
        Ok(filter_by_role(users, role))
    }

    pub async fn expediteurs(&self) -> Result<Vec<User>, ApiError> {
        self.by_role(UserRole::Expediteur).await
    }

    pub async fn destinataires(&self) -> Result<Vec<User>, ApiError> {
        self.by_role(UserRole::Destinataire).await
    }

    pub async fn livreurs(&self) -> Result<Vec<User>, ApiError> {
        self.by_role(UserRole::Livreur).await
    }

    pub async fn gestionnaires(&self) -> Result<Vec<User>, ApiError> {
        self.by_role(UserRole::Gestionnaire).await
    }
}

fn filter_by_role(users: Vec<User>, role: UserRole) -> Vec<User> {
    users.into_iter().filter(|u| u.has_role(role)).collect()
}
