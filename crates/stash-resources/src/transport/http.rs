//! HTTP transports for the public todo and meal APIs.
//!
//! All status-code knowledge lives in [`HttpBackend::send`]; the
//! transports only build paths and bodies.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use stash_core::model::{
    CreateTodoRequest, DeleteTodoResponse, Meal, MealResponse, Todo, TodosResponse,
    UpdateTodoRequest, validate_meal_id,
};
use stash_core::{Result, StashError};
use tracing::{debug, warn};

use super::{MealTransport, TodoTransport};

const USER_AGENT_VALUE: &str = concat!("stash/", env!("CARGO_PKG_VERSION"));

/// Endpoints and timeouts of the HTTP transports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Base URL of the todo API (default: https://dummyjson.com/todos)
    pub todos_url: String,
    /// Base URL of the meal API (default: https://www.themealdb.com/api/json/v1/1)
    pub meals_url: String,
    /// Per-request timeout (default: 10s)
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            todos_url: "https://dummyjson.com/todos".to_string(),
            meals_url: "https://www.themealdb.com/api/json/v1/1".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    resource: &'static str,
}

impl HttpBackend {
    fn new(base_url: &str, timeout: Duration, resource: &'static str) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| {
                StashError::transport(resource, format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            resource,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        self.send::<T, ()>(Method::GET, path, query, None).await
    }

    /// Sends one request and decodes a JSON response.
    ///
    /// 404 maps to `NotFound` keyed by the last path segment; any other
    /// non-2xx status is a `Transport` error carrying the status.
    async fn send<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "Sending request");

        let mut request = self.client.request(method, &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StashError::transport(self.resource, e.to_string()))?;
        let status = response.status();

        match status.as_u16() {
            200..=299 => response.json::<T>().await.map_err(|e| {
                StashError::validation(self.resource, "body", format!("invalid response: {}", e))
            }),
            404 => {
                let id = path.rsplit('/').next().unwrap_or_default();
                Err(StashError::not_found(self.resource, id))
            },
            code => {
                warn!(url = %url, status = code, "Request failed");
                Err(StashError::http_status(
                    self.resource,
                    code,
                    status.canonical_reason().unwrap_or("Unknown"),
                ))
            },
        }
    }
}

/// Todo API client (`/todos`, `/todos/{id}`, `/todos/random`,
/// `/todos/user/{id}`, `/todos/add`).
#[derive(Debug, Clone)]
pub struct HttpTodoTransport {
    http: HttpBackend,
}

impl HttpTodoTransport {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            http: HttpBackend::new(&config.todos_url, config.timeout, "todos")?,
        })
    }
}

#[async_trait]
impl TodoTransport for HttpTodoTransport {
    async fn list(&self, limit: u64, skip: u64) -> Result<TodosResponse> {
        let (limit, skip) = (limit.to_string(), skip.to_string());
        self.http
            .get("", &[("limit", limit.as_str()), ("skip", skip.as_str())])
            .await
    }

    async fn get(&self, id: i64) -> Result<Todo> {
        self.http.get(&format!("/{}", id), &[]).await
    }

    async fn random(&self) -> Result<Todo> {
        self.http.get("/random", &[]).await
    }

    async fn by_user(&self, user_id: i64) -> Result<TodosResponse> {
        self.http.get(&format!("/user/{}", user_id), &[]).await
    }

    async fn create(&self, request: &CreateTodoRequest) -> Result<Todo> {
        self.http
            .send(Method::POST, "/add", &[], Some(request))
            .await
    }

    async fn update(&self, id: i64, request: &UpdateTodoRequest) -> Result<Todo> {
        self.http
            .send(Method::PUT, &format!("/{}", id), &[], Some(request))
            .await
    }

    async fn delete(&self, id: i64) -> Result<DeleteTodoResponse> {
        self.http
            .send::<_, ()>(Method::DELETE, &format!("/{}", id), &[], None)
            .await
    }

    fn name(&self) -> &str {
        "http-todos"
    }
}

/// Meal API client.
///
/// The upstream has no "list everything" endpoint; the listing is the
/// search for meals starting with `a`.
#[derive(Debug, Clone)]
pub struct HttpMealTransport {
    http: HttpBackend,
}

impl HttpMealTransport {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            http: HttpBackend::new(&config.meals_url, config.timeout, "meals")?,
        })
    }
}

#[async_trait]
impl MealTransport for HttpMealTransport {
    async fn all(&self) -> Result<Vec<Meal>> {
        let response: MealResponse = self.http.get("/search.php", &[("f", "a")]).await?;
        if response.meals.is_none() {
            warn!("Meal listing returned null");
        }
        let meals = response.into_meals()?;
        debug!(count = meals.len(), "Meals fetched");
        Ok(meals)
    }

    async fn by_id(&self, id: &str) -> Result<Meal> {
        let id = validate_meal_id(id)?;
        let response: MealResponse = self.http.get("/lookup.php", &[("i", id)]).await?;
        response.into_meal(id)
    }

    fn name(&self) -> &str {
        "http-meals"
    }
}
