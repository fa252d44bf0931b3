//! HTTP backend for the menu REST API

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::ApiResponse;
use shared::models::{Category, Dish, EntityId, Restaurant, RestaurantMenu, RestaurantUpdate};
use shared::slug::SlugAvailability;
use shared::staged::ActionKind;

use super::{MenuBackend, SlugRegistry};
use crate::config::ClientConfig;
use crate::error::PersistError;

/// HTTP client for the menu backend
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    /// Create a new HTTP backend from configuration
    pub fn new(config: &ClientConfig) -> Result<Self, PersistError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.request(method, self.url(path));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<T>, PersistError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(PersistError::from_response(status, &text));
        }
        if text.trim().is_empty() {
            return Ok(None);
        }

        let envelope: ApiResponse<T> = serde_json::from_str(&text)?;
        if !envelope.is_success() {
            return Err(PersistError::from_app_error(envelope.to_error()));
        }
        Ok(envelope.data)
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, PersistError> {
        self.send(self.request(method, path).json(body))
            .await?
            .ok_or_else(|| PersistError::InvalidResponse(format!("missing data for {path}")))
    }

    /// DELETE; the backend may answer with an empty body
    async fn send_delete<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, PersistError> {
        self.send(self.request(Method::DELETE, path)).await
    }
}

/// Server id for update/delete paths; temporary ids never go on the wire
fn server_id(id: EntityId, what: &str) -> Result<i64, PersistError> {
    id.persisted().ok_or_else(|| {
        PersistError::Validation(format!("{what} {id} has no server id yet"))
    })
}

#[async_trait]
impl SlugRegistry for HttpBackend {
    async fn check_slug_availability(
        &self,
        candidate: &str,
        user_id: &str,
    ) -> Result<SlugAvailability, PersistError> {
        let request = self
            .request(Method::GET, "api/slugs/check")
            .query(&[("slug", candidate), ("user_id", user_id)]);
        self.send(request)
            .await?
            .ok_or_else(|| PersistError::InvalidResponse("missing slug availability".to_string()))
    }
}

#[async_trait]
impl MenuBackend for HttpBackend {
    async fn load_menu(&self, restaurant_id: i64) -> Result<RestaurantMenu, PersistError> {
        let path = format!("api/restaurants/{restaurant_id}/menu");
        self.send(self.request(Method::GET, &path))
            .await?
            .ok_or_else(|| PersistError::InvalidResponse("missing menu".to_string()))
    }

    async fn persist_restaurant(
        &self,
        update: &RestaurantUpdate,
    ) -> Result<Restaurant, PersistError> {
        let path = format!("api/restaurants/{}", update.id);
        self.send_json(Method::PUT, &path, update).await
    }

    async fn persist_category(
        &self,
        action: ActionKind,
        category: &Category,
    ) -> Result<Category, PersistError> {
        match action {
            ActionKind::Create => self.send_json(Method::POST, "api/categories", category).await,
            ActionKind::Update => {
                let id = server_id(category.id, "category")?;
                self.send_json(Method::PUT, &format!("api/categories/{id}"), category)
                    .await
            }
            ActionKind::Delete => {
                let id = server_id(category.id, "category")?;
                let deleted: Option<Category> =
                    self.send_delete(&format!("api/categories/{id}")).await?;
                Ok(deleted.unwrap_or_else(|| category.clone()))
            }
        }
    }

    async fn persist_dish(&self, action: ActionKind, dish: &Dish) -> Result<Dish, PersistError> {
        match action {
            ActionKind::Create => {
                server_id(dish.category_id, "category")?;
                self.send_json(Method::POST, "api/dishes", dish).await
            }
            ActionKind::Update => {
                let id = server_id(dish.id, "dish")?;
                server_id(dish.category_id, "category")?;
                self.send_json(Method::PUT, &format!("api/dishes/{id}"), dish).await
            }
            ActionKind::Delete => {
                let id = server_id(dish.id, "dish")?;
                let deleted: Option<Dish> = self.send_delete(&format!("api/dishes/{id}")).await?;
                Ok(deleted.unwrap_or_else(|| dish.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let backend = HttpBackend::new(&ClientConfig::new("http://menu.local/")).unwrap();
        assert_eq!(backend.url("/api/dishes"), "http://menu.local/api/dishes");
        assert_eq!(backend.url("api/dishes"), "http://menu.local/api/dishes");
    }

    #[test]
    fn test_temp_ids_never_reach_the_wire() {
        let err = server_id(EntityId::temp(), "dish").unwrap_err();
        assert!(matches!(err, PersistError::Validation(_)));
        assert_eq!(server_id(EntityId::Persisted(4), "dish").unwrap(), 4);
    }
}
