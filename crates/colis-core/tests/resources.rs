//! Resource wrappers build the right paths and decode typed bodies.

use std::time::Duration;

use colis_core::api::{ApiClient, ApiConfig};
use colis_core::auth::{TokenPair, TokenStore};
use colis_core::models::{PaginationParams, SortDirection, Statut, UserRole, ZoneRequest};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let config = ApiConfig {
        base_url: format!("{}/api", server.uri()),
        timeout: Duration::from_secs(5),
    };
    let client = ApiClient::new(config, TokenStore::in_memory()).unwrap();
    client.tokens().set_tokens(&TokenPair::new("access", "refresh"));
    (server, client)
}

#[tokio::test]
async fn test_list_colis_page() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/colis"))
        .and(query_param("page", "2"))
        .and(query_param("size", "5"))
        .and(query_param("sortBy", "poids"))
        .and(query_param("sortDir", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "id": "c1", "statut": "IN_TRANSIT", "poids": 2.5 }],
            "totalElements": 11,
            "totalPages": 3,
            "size": 5,
            "number": 2,
            "first": false,
            "last": true,
            "empty": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let params = PaginationParams {
        page: 2,
        size: 5,
        sort_by: "poids".to_string(),
        sort_dir: SortDirection::Desc,
    };
    let page = client.colis().list(&params).await.unwrap();
    assert_eq!(page.total_elements, 11);
    assert!(page.last);
    assert_eq!(page.content[0].statut, Some(Statut::InTransit));
}

#[tokio::test]
async fn test_update_status_and_assign() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/colis/c1/status"))
        .and(query_param("status", "DELIVERED"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "c1", "statut": "DELIVERED" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/colis/assign"))
        .and(query_param("colisId", "c1"))
        .and(query_param("livreurId", "l9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "c1" })))
        .expect(1)
        .mount(&server)
        .await;

    let colis = client
        .colis()
        .update_status("c1", Statut::Delivered)
        .await
        .unwrap();
    assert!(colis.is_delivered());

    let colis = client.colis().assign("c1", "l9").await.unwrap();
    assert_eq!(colis.id.as_deref(), Some("c1"));
}

#[tokio::test]
async fn test_search_and_delete() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/colis/search"))
        .and(query_param("search", "Rabat centre"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "c7" }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/colis/c7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/zones/z1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "deleted": true })))
        .expect(1)
        .mount(&server)
        .await;

    let found = client.colis().search("Rabat centre").await.unwrap();
    assert_eq!(found.len(), 1);

    client.colis().delete("c7").await.unwrap();
    client.zones().delete("z1").await.unwrap();
}

#[tokio::test]
async fn test_create_zone() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/zones"))
        .and(body_json(json!({ "nome": "Agdal", "codePostal": "10080" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "z1",
            "nome": "Agdal",
            "codePostal": "10080"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let zone = client
        .zones()
        .create(&ZoneRequest {
            nome: "Agdal".to_string(),
            code_postal: "10080".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(zone.id.as_deref(), Some("z1"));
}

#[tokio::test]
async fn test_users_by_role_filters_locally() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "u1", "username": "karim", "role": { "roleName": "LIVREUR" } },
            { "id": "u2", "username": "sara", "role": { "roleName": "EXPEDITEUR" } },
            { "id": "u3", "username": "nadia", "role": { "roleName": "LIVREUR" } },
            { "id": "u4", "username": "anon" }
        ])))
        .mount(&server)
        .await;

    let livreurs = client.users().livreurs().await.unwrap();
    let names: Vec<_> = livreurs.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["karim", "nadia"]);

    let expediteurs = client.users().by_role(UserRole::Expediteur).await.unwrap();
    assert_eq!(expediteurs.len(), 1);
}
