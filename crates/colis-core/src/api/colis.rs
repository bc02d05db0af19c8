//! Package endpoints (`/colis`).

use serde::de::IgnoredAny;
use url::form_urlencoded;

use super::{ApiClient, ApiError, RequestConfig, NO_BODY};
use crate::models::{Colis, ColisRequest, PageResponse, PaginationParams, Statut};

/// Encode query pairs as `k=v&k2=v2`
pub(crate) fn query<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Path segment with reserved characters escaped
pub(crate) fn segment(id: &str) -> String {
    url::form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

pub struct ColisApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ColisApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, request: &ColisRequest) -> Result<Colis, ApiError> {
        self.client
            .post("/colis", Some(request), RequestConfig::default())
            .await
    }

    pub async fn list(&self, params: &PaginationParams) -> Result<PageResponse<Colis>, ApiError> {
        let pairs = params.query_pairs();
        let qs = query(pairs.iter().map(|(k, v)| (*k, v.as_str())));
        self.client
            .get(&format!("/colis?{}", qs), RequestConfig::default())
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Colis, ApiError> {
        self.client
            .get(&format!("/colis/{}", segment(id)), RequestConfig::default())
            .await
    }

    pub async fn update(&self, id: &str, request: &ColisRequest) -> Result<Colis, ApiError> {
        self.client
            .put(
                &format!("/colis/{}", segment(id)),
                Some(request),
                RequestConfig::default(),
            )
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        // Some deployments answer 200 with a body instead of 204
        let _: IgnoredAny = self
            .client
            .delete(&format!("/colis/{}", segment(id)), RequestConfig::default())
            .await?;
        Ok(())
    }

    pub async fn update_status(&self, id: &str, status: Statut) -> Result<Colis, ApiError> {
        let path = format!(
            "/colis/{}/status?{}",
            segment(id),
            query([("status", status.as_str())])
        );
        self.client
            .patch(&path, NO_BODY, RequestConfig::default())
            .await
    }

    pub async fn by_status(&self, status: Statut) -> Result<Vec<Colis>, ApiError> {
        let path = format!("/colis/status?{}", query([("status", status.as_str())]));
        self.client.get(&path, RequestConfig::default()).await
    }

    pub async fn by_zone(&self, zone_id: &str) -> Result<Vec<Colis>, ApiError> {
        self.client
            .get(&format!("/colis/zone/{}", segment(zone_id)), RequestConfig::default())
            .await
    }

    pub async fn by_livreur(&self, livreur_id: &str) -> Result<Vec<Colis>, ApiError> {
        self.client
            .get(
                &format!("/colis/livreur/{}", segment(livreur_id)),
                RequestConfig::default(),
            )
            .await
    }

    /// Packages sent by a client (expéditeur)
    pub async fn by_client(&self, client_id: &str) -> Result<Vec<Colis>, ApiError> {
        self.client
            .get(
                &format!("/colis/client/{}", segment(client_id)),
                RequestConfig::default(),
            )
            .await
    }

    pub async fn search(&self, term: &str) -> Result<Vec<Colis>, ApiError> {
        let path = format!("/colis/search?{}", query([("search", term)]));
        self.client.get(&path, RequestConfig::default()).await
    }

    /// Assign a package to a courier
    pub async fn assign(&self, colis_id: &str, livreur_id: &str) -> Result<Colis, ApiError> {
        let path = format!(
            "/colis/assign?{}",
            query([("colisId", colis_id), ("livreurId", livreur_id)])
        );
        self.client.put(&path, NO_BODY, RequestConfig::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_encoding() {
        assert_eq!(query([("search", "rue des lilas & co")]), "search=rue+des+lilas+%26+co");
        assert_eq!(query([("colisId", "c1"), ("livreurId", "l2")]), "colisId=c1&livreurId=l2");
    }

    #[test]
    fn test_segment_escapes_reserved() {
        assert_eq!(segment("c-42"), "c-42");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }
}
