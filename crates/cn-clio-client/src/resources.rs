//! Typed wrapper over the common Clio resources.

use reqwest::Method;
use serde_json::{Value, json};

use crate::client::{ApiClient, ApiResponse};
use crate::error::ClientResult;
use crate::pagination::{MAX_PAGE_SIZE, Page};

/// Clio resources reachable through `ClioApi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Contacts,
    Matters,
    Activities,
    Documents,
    CustomFields,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Contacts,
        Resource::Matters,
        Resource::Activities,
        Resource::Documents,
        Resource::CustomFields,
    ];

    /// Path segment under the API base.
    pub fn path(self) -> &'static str {
        match self {
            Resource::Contacts => "contacts",
            Resource::Matters => "matters",
            Resource::Activities => "activities",
            Resource::Documents => "documents",
            Resource::CustomFields => "custom_fields",
        }
    }

    pub fn collection(self) -> String {
        format!("{}.json", self.path())
    }

    pub fn member(self, id: u64) -> String {
        format!("{}/{id}.json", self.path())
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Resource-level operations on top of an `ApiClient`.
pub struct ClioApi {
    client: ApiClient,
}

impl ClioApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// List a resource.
    ///
    /// With a non-zero `limit`, one page of `min(limit, 200)` items is
    /// fetched and truncated to `limit`. Without one, or with `Some(0)`,
    /// every page is walked.
    pub async fn list(
        &self,
        resource: Resource,
        filters: &[(String, String)],
        limit: Option<u32>,
    ) -> ClientResult<Vec<Value>> {
        let endpoint = resource.collection();
        match limit.filter(|&limit| limit > 0) {
            Some(limit) => {
                let mut params = filters.to_vec();
                params.push(("per_page".into(), limit.clamp(1, MAX_PAGE_SIZE).to_string()));
                let response = self.client.request(Method::GET, &endpoint, &params, None).await?;
                let mut items = Page::from_body(response.body).items;
                items.truncate(limit as usize);
                Ok(items)
            }
            None => self.client.get_all(&endpoint, filters, MAX_PAGE_SIZE).await,
        }
    }

    pub async fn fetch(&self, resource: Resource, id: u64) -> ClientResult<Value> {
        let response = self.get(&resource.member(id), &[]).await?;
        Ok(response.data().clone())
    }

    /// POST `{"data": data}` and return the created entity.
    pub async fn create(&self, resource: Resource, data: Value) -> ClientResult<Value> {
        let response = self
            .post(&resource.collection(), &json!({ "data": data }))
            .await?;
        tracing::info!(resource = %resource, status = response.status, "created resource");
        Ok(response.data().clone())
    }

    pub async fn update(&self, resource: Resource, id: u64, data: Value) -> ClientResult<Value> {
        let response = self
            .put(&resource.member(id), &json!({ "data": data }))
            .await?;
        Ok(response.data().clone())
    }

    /// True when the server answered 200 or 204.
    pub async fn delete(&self, resource: Resource, id: u64) -> ClientResult<bool> {
        let response = self.delete_endpoint(&resource.member(id)).await?;
        Ok(matches!(response.status, 200 | 204))
    }

    /// Every custom field value attached to an entity, across all pages,
    /// optionally narrowed to one field.
    pub async fn custom_field_values(
        &self,
        entity: Resource,
        id: u64,
        field_id: Option<u64>,
    ) -> ClientResult<Vec<Value>> {
        let endpoint = format!("{}/{id}/custom_field_values.json", entity.path());
        let params: Vec<(String, String)> = field_id
            .map(|f| vec![("custom_field_id".to_string(), f.to_string())])
            .unwrap_or_default();
        self.client.get_all(&endpoint, &params, MAX_PAGE_SIZE).await
    }

    /// Set one custom field value on an entity.
    pub async fn set_custom_field_value(
        &self,
        entity: Resource,
        id: u64,
        field_id: u64,
        value: Value,
    ) -> ClientResult<Value> {
        let data = json!({
            "custom_field_values": [
                { "custom_field": { "id": field_id }, "value": value }
            ]
        });
        self.update(entity, id, data).await
    }

    pub async fn get(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> ClientResult<ApiResponse> {
        self.client.request(Method::GET, endpoint, params, None).await
    }

    pub async fn post(&self, endpoint: &str, body: &Value) -> ClientResult<ApiResponse> {
        self.client
            .request(Method::POST, endpoint, &[], Some(body))
            .await
    }

    pub async fn put(&self, endpoint: &str, body: &Value) -> ClientResult<ApiResponse> {
        self.client
            .request(Method::PUT, endpoint, &[], Some(body))
            .await
    }

    pub async fn delete_endpoint(&self, endpoint: &str) -> ClientResult<ApiResponse> {
        self.client.request(Method::DELETE, endpoint, &[], None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::error::ClientError;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_for(server: &MockServer) -> ClioApi {
        let config = ClientConfig {
            backoff_base_ms: 1,
            ..ClientConfig::with_base_url(server.uri())
        };
        ClioApi::new(ApiClient::new(config).unwrap().with_auth_token("t"))
    }

    #[test]
    fn resource_endpoints() {
        assert_eq!(Resource::Contacts.collection(), "contacts.json");
        assert_eq!(Resource::Matters.member(42), "matters/42.json");
        assert_eq!(Resource::CustomFields.to_string(), "custom_fields");
    }

    #[tokio::test]
    async fn list_with_limit_fetches_one_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contacts.json"))
            .and(query_param("per_page", "2"))
            .and(query_param("type", "Person"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": 1}, {"id": 2}, {"id": 3}],
                "meta": {"paging": {"next": "https://example.test/contacts.json?page=2"}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server);
        let filters = vec![("type".to_string(), "Person".to_string())];
        let items = api.list(Resource::Contacts, &filters, Some(2)).await.unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn list_without_limit_walks_pages() {
        let server = MockServer::start().await;
        let next = format!("{}/matters.json?page=2", server.uri());
        Mock::given(method("GET"))
            .and(query_param("page", "1"))
            .and(query_param("per_page", "200"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": 1}],
                "meta": {"paging": {"next": next}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": 2}]})))
            .mount(&server)
            .await;

        let api = api_for(&server);
        let items = api.list(Resource::Matters, &[], None).await.unwrap();
        assert_eq!(items, vec![json!({"id": 1}), json!({"id": 2})]);
    }

    #[tokio::test]
    async fn zero_limit_walks_every_page() {
        let server = MockServer::start().await;
        let next = format!("{}/contacts.json?page=2", server.uri());
        Mock::given(method("GET"))
            .and(query_param("page", "1"))
            .and(query_param("per_page", "200"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": 1}],
                "meta": {"paging": {"next": next}}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": 2}]})))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server);
        let items = api.list(Resource::Contacts, &[], Some(0)).await.unwrap();
        assert_eq!(items, vec![json!({"id": 1}), json!({"id": 2})]);
    }

    #[tokio::test]
    async fn create_wraps_payload_in_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contacts.json"))
            .and(body_json(json!({"data": {"name": "Jane Doe", "type": "Person"}})))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"data": {"id": 77, "name": "Jane Doe"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server);
        let created = api
            .create(Resource::Contacts, json!({"name": "Jane Doe", "type": "Person"}))
            .await
            .unwrap();
        assert_eq!(created["id"], 77);
    }

    #[tokio::test]
    async fn fetch_and_update_member() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/matters/5.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 5}})))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/matters/5.json"))
            .and(body_json(json!({"data": {"description": "Updated"}})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {"id": 5, "description": "Updated"}})),
            )
            .mount(&server)
            .await;

        let api = api_for(&server);
        assert_eq!(api.fetch(Resource::Matters, 5).await.unwrap()["id"], 5);
        let updated = api
            .update(Resource::Matters, 5, json!({"description": "Updated"}))
            .await
            .unwrap();
        assert_eq!(updated["description"], "Updated");
    }

    #[tokio::test]
    async fn delete_reports_success_on_204() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/activities/9.json"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let api = api_for(&server);
        assert!(api.delete(Resource::Activities, 9).await.unwrap());
    }

    #[tokio::test]
    async fn fetch_missing_member_is_client_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let api = api_for(&server);
        let err = api.fetch(Resource::Documents, 1).await.unwrap_err();
        assert!(matches!(err, ClientError::Client { status: 404, .. }));
    }

    #[tokio::test]
    async fn custom_field_values_filtered_by_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contacts/3/custom_field_values.json"))
            .and(query_param("custom_field_id", "12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "text_line-1", "value": "VIP"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server);
        let values = api
            .custom_field_values(Resource::Contacts, 3, Some(12))
            .await
            .unwrap();
        assert_eq!(values[0]["value"], "VIP");
    }

    #[tokio::test]
    async fn custom_field_values_span_pages() {
        let server = MockServer::start().await;
        let next = format!("{}/matters/5/custom_field_values.json?page=2", server.uri());
        Mock::given(method("GET"))
            .and(path("/matters/5/custom_field_values.json"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": 1}],
                "meta": {"paging": {"next": next}}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/matters/5/custom_field_values.json"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": 2}]})))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server);
        let values = api
            .custom_field_values(Resource::Matters, 5, None)
            .await
            .unwrap();
        assert_eq!(values, vec![json!({"id": 1}), json!({"id": 2})]);
    }

    #[tokio::test]
    async fn set_custom_field_value_puts_entity() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/matters/8.json"))
            .and(body_json(json!({"data": {"custom_field_values": [
                {"custom_field": {"id": 12}, "value": "urgent"}
            ]}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 8}})))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server);
        let updated = api
            .set_custom_field_value(Resource::Matters, 8, 12, json!("urgent"))
            .await
            .unwrap();
        assert_eq!(updated["id"], 8);
    }
}
