use std::collections::BTreeMap;

use reqwest::Method;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};
use url::Url;

use super::{
    ENV_VAR_URL, MAX_PAGES, PAGE_LIMIT, PROJECT_URL, PROJECTS_URL, SECRETS_URL, TEAMS_URL, UPDATE_ENV_VAR_URL, USER_URL,
    WEBHOOK_PATH, WEBHOOK_URL,
};
use crate::PRODUCT_NAME;
use crate::config::Config;

/// Errors from the Vercel API layer
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request itself failed (network, DNS, TLS, timeout)
    #[error("HTTP request to Vercel failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Vercel answered with a non-2xx status other than 402
    #[error("Vercel API error ({code}): {text}")]
    Status { code: u16, text: String },

    /// 2xx body that isn't JSON
    #[error("Invalid JSON from Vercel: {0}")]
    Decode(#[from] serde_json::Error),

    /// JSON that lacks something we need
    #[error("Unexpected response from Vercel: {0}")]
    UnexpectedResponse(String),

    #[error("No Vercel team configured for this client")]
    NoTeam,
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// How [`VercelClient::collect_pages`] stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pagination {
    /// A short page, or no cursor to continue from
    Finished,
    /// A page came back 402
    PaymentRequired,
    /// Gave up after [`MAX_PAGES`] full pages
    Truncated,
}

/// Client for one Vercel installation (user or team scoped).
///
/// Every request authenticates with the installation's bearer token. Team installations add
/// `teamId` to every request's query. A 402 (plan limits) is not treated as an error: the call
/// yields `None`.
#[derive(Debug, Clone)]
pub struct VercelClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: String,
    team_id: Option<String>,
    webhook_url: String,
}

impl VercelClient {
    pub fn new(config: &Config, access_token: impl Into<String>, team_id: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.vercel.timeout).build()?;

        Ok(Self {
            http,
            base_url: config.vercel.base_url.clone(),
            access_token: access_token.into(),
            team_id,
            webhook_url: config.absolute_url(WEBHOOK_PATH),
        })
    }

    pub fn team_id(&self) -> Option<&str> {
        self.team_id.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Send one authenticated request.
    ///
    /// `teamId` is added to `params` last, so it replaces a caller supplied value. Returns
    /// `None` on 402, `Some(Value::Null)` for an empty 2xx body.
    #[instrument(skip(self, params, body), fields(team_id = ?self.team_id), err)]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: Option<BTreeMap<String, String>>,
        body: Option<&Value>,
    ) -> Result<Option<Value>> {
        let mut params = params.unwrap_or_default();
        if let Some(team_id) = &self.team_id {
            params.insert("teamId".to_string(), team_id.clone());
        }

        let mut request = self.http.request(method, self.url(path)).bearer_auth(&self.access_token);
        if !params.is_empty() {
            request = request.query(&params);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::PAYMENT_REQUIRED {
            return Ok(None);
        }

        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                code: status.as_u16(),
                text,
            });
        }

        debug!(status = status.as_u16(), bytes = text.len(), "Vercel request succeeded");

        if text.trim().is_empty() {
            return Ok(Some(Value::Null));
        }
        Ok(Some(serde_json::from_str(&text)?))
    }

    pub async fn get(&self, path: &str, params: Option<BTreeMap<String, String>>) -> Result<Option<Value>> {
        self.request(Method::GET, path, params, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Option<Value>> {
        self.request(Method::POST, path, None, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Result<Option<Value>> {
        self.request(Method::PATCH, path, None, Some(body)).await
    }

    /// Walk a cursor paginated list endpoint, `PAGE_LIMIT` items at a time, for at most
    /// `MAX_PAGES` pages. Items are read from `key` of every page.
    pub async fn paginate(&self, path: &str, key: &str) -> Result<Vec<Value>> {
        let (items, _) = self.collect_pages(path, key).await?;
        Ok(items)
    }

    pub(crate) async fn collect_pages(&self, path: &str, key: &str) -> Result<(Vec<Value>, Pagination)> {
        let mut params = BTreeMap::from([("limit".to_string(), PAGE_LIMIT.to_string())]);
        let mut results = Vec::new();

        for _ in 0..MAX_PAGES {
            let Some(page) = self.get(path, Some(params.clone())).await? else {
                return Ok((results, Pagination::PaymentRequired));
            };

            match page.get(key) {
                Some(Value::Array(items)) => results.extend(items.iter().cloned()),
                _ => return Err(ApiError::UnexpectedResponse(format!("page of {path} has no '{key}' list"))),
            }

            let pagination = page.get("pagination");
            let count = pagination.and_then(|p| p.get("count")).and_then(Value::as_u64);
            if count.is_none_or(|count| count < PAGE_LIMIT as u64) {
                return Ok((results, Pagination::Finished));
            }

            match pagination.and_then(|p| p.get("next")).and_then(cursor) {
                Some(next) => {
                    params.insert("until".to_string(), next);
                }
                None => return Ok((results, Pagination::Finished)),
            }
        }

        warn!(team_id = ?self.team_id, url = path, "Did not finish pagination");
        Ok((results, Pagination::Truncated))
    }

    /// The team this client acts for. Only valid for team installations.
    pub async fn get_team(&self) -> Result<Option<Value>> {
        let team_id = self.team_id.as_deref().ok_or(ApiError::NoTeam)?;
        self.get(&TEAMS_URL.replace("{team_id}", team_id), None).await
    }

    pub async fn get_user(&self) -> Result<Option<Value>> {
        let Some(response) = self.get(USER_URL, None).await? else {
            return Ok(None);
        };
        field(response, "user", USER_URL).map(Some)
    }

    pub async fn get_projects(&self) -> Result<Vec<Value>> {
        self.paginate(PROJECTS_URL, "projects").await
    }

    pub async fn get_project(&self, vercel_project_id: &str) -> Result<Option<Value>> {
        self.get(&PROJECT_URL.replace("{project_id}", vercel_project_id), None).await
    }

    /// Register our deployment webhook receiver with Vercel
    pub async fn create_deploy_webhook(&self) -> Result<Option<Value>> {
        let body = json!({
            "name": format!("{PRODUCT_NAME} webhook"),
            "url": self.webhook_url,
            "events": ["deployment"],
        });
        self.post(WEBHOOK_URL, &body).await
    }

    pub async fn get_env_vars(&self, vercel_project_id: &str) -> Result<Option<Value>> {
        self.get(&ENV_VAR_URL.replace("{project_id}", vercel_project_id), None).await
    }

    /// Returns the new secret's `uid`
    pub async fn create_secret(&self, name: &str, value: &str) -> Result<Option<String>> {
        let body = json!({ "name": name, "value": value });
        let Some(response) = self.post(SECRETS_URL, &body).await? else {
            return Ok(None);
        };

        match field(response, "uid", SECRETS_URL)? {
            Value::String(uid) => Ok(Some(uid)),
            other => Err(ApiError::UnexpectedResponse(format!("secret uid is not a string: {other}"))),
        }
    }

    pub async fn create_env_variable(&self, vercel_project_id: &str, data: &Value) -> Result<Option<Value>> {
        self.post(&ENV_VAR_URL.replace("{project_id}", vercel_project_id), data).await
    }

    pub async fn update_env_variable(&self, vercel_project_id: &str, env_var_id: &str, data: &Value) -> Result<Option<Value>> {
        let path = UPDATE_ENV_VAR_URL
            .replace("{project_id}", vercel_project_id)
            .replace("{env_var_id}", env_var_id);
        self.patch(&path, data).await
    }
}

/// Pagination cursors come back as numbers (timestamps) or strings
fn cursor(next: &Value) -> Option<String> {
    match next {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn field(mut response: Value, name: &str, path: &str) -> Result<Value> {
    response
        .get_mut(name)
        .map(Value::take)
        .ok_or_else(|| ApiError::UnexpectedResponse(format!("response of {path} has no '{name}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn client(server: &MockServer, team_id: Option<&str>) -> VercelClient {
        let mut config = Config::default();
        config.vercel.base_url = Url::parse(&server.uri()).unwrap();
        config.url_prefix = Url::parse("https://lookout.example.com").unwrap();
        VercelClient::new(&config, "tok_123", team_id.map(str::to_string)).unwrap()
    }

    fn page(range: std::ops::Range<usize>, next: u64) -> Value {
        let projects: Vec<Value> = range.clone().map(|i| json!({ "id": format!("prj_{i}") })).collect();
        json!({
            "projects": projects,
            "pagination": { "count": range.len(), "next": next, "prev": null },
        })
    }

    #[tokio::test]
    async fn test_pagination_stops_on_short_page() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v4/projects/"))
            .and(query_param("limit", "20"))
            .and(query_param_is_missing("until"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(0..20, 1001)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v4/projects/"))
            .and(query_param("until", "1001"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(20..40, 1002)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v4/projects/"))
            .and(query_param("until", "1002"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(40..60, 1003)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v4/projects/"))
            .and(query_param("limit", "20"))
            .and(query_param("until", "1003"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(60..75, 1004)))
            .expect(1)
            .mount(&server)
            .await;

        let (projects, outcome) = client(&server, None).collect_pages(PROJECTS_URL, "projects").await.unwrap();

        assert_eq!(projects.len(), 75);
        assert_eq!(projects[0]["id"], "prj_0");
        assert_eq!(projects[74]["id"], "prj_74");
        assert_eq!(outcome, Pagination::Finished);
        server.verify().await;
    }

    #[tokio::test]
    async fn test_pagination_gives_up_after_ten_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v4/projects/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(0..20, 42)))
            .expect(10)
            .mount(&server)
            .await;

        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let client = client(&server, Some("team_1"));
        let (projects, outcome) = client.collect_pages(PROJECTS_URL, "projects").await.unwrap();

        assert_eq!(projects.len(), 200);
        assert_eq!(outcome, Pagination::Truncated);
        let output = logs.contents();
        assert!(output.contains("Did not finish pagination"), "logs: {output}");
        assert!(output.contains("WARN"));
        assert!(output.contains("team_1"));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_get_projects_returns_partial_results_on_402() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v4/projects/"))
            .and(query_param_is_missing("until"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(0..20, 7)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v4/projects/"))
            .and(query_param("until", "7"))
            .respond_with(ResponseTemplate::new(402))
            .mount(&server)
            .await;

        let client = client(&server, None);
        let (projects, outcome) = client.collect_pages(PROJECTS_URL, "projects").await.unwrap();
        assert_eq!(projects.len(), 20);
        assert_eq!(outcome, Pagination::PaymentRequired);

        assert_eq!(client.get_projects().await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_payment_required_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/projects/prj_1"))
            .respond_with(ResponseTemplate::new(402).set_body_string("upgrade your plan"))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server, None).get_project("prj_1").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_server_error_propagates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/projects/prj_1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client(&server, None).get_project("prj_1").await.unwrap_err();
        match err {
            ApiError::Status { code, text } => {
                assert_eq!(code, 500);
                assert_eq!(text, "boom");
            }
            other => panic!("expected a status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v6/projects/prj_1/env"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server, None).get_env_vars("prj_1").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_team_id_sent_with_every_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v6/projects/prj_1/env"))
            .and(header("authorization", "Bearer tok_123"))
            .and(query_param("teamId", "team_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "envs": [] })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v4/projects/"))
            .and(query_param("teamId", "team_1"))
            .and(query_param("limit", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(0..3, 1)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/custom"))
            .and(query_param("teamId", "team_1"))
            .and(query_param("foo", "bar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server, Some("team_1"));
        assert_eq!(client.get_env_vars("prj_1").await.unwrap(), Some(json!({ "envs": [] })));
        assert_eq!(client.get_projects().await.unwrap().len(), 3);

        let params = BTreeMap::from([
            ("teamId".to_string(), "someone_else".to_string()),
            ("foo".to_string(), "bar".to_string()),
        ]);
        let response = client.get("/custom", Some(params)).await.unwrap();
        assert_eq!(response, Some(json!({ "ok": true })));

        server.verify().await;
    }

    #[tokio::test]
    async fn test_no_team_id_without_team() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/www/user"))
            .and(query_param_is_missing("teamId"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": { "uid": "usr_1" } })))
            .expect(1)
            .mount(&server)
            .await;

        let user = client(&server, None).get_user().await.unwrap();
        assert_eq!(user, Some(json!({ "uid": "usr_1" })));
    }

    #[tokio::test]
    async fn test_get_team_requires_team_id() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/teams/team_1"))
            .and(query_param("teamId", "team_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "team_1", "slug": "acme" })))
            .expect(1)
            .mount(&server)
            .await;

        let team = client(&server, Some("team_1")).get_team().await.unwrap();
        assert_eq!(team.unwrap()["slug"], "acme");

        let err = client(&server, None).get_team().await.unwrap_err();
        assert!(matches!(err, ApiError::NoTeam));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_create_deploy_webhook() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/integrations/webhooks"))
            .and(body_json(json!({
                "name": "Lookout webhook",
                "url": "https://lookout.example.com/extensions/vercel/webhook/",
                "events": ["deployment"],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "hook_1" })))
            .expect(1)
            .mount(&server)
            .await;

        let hook = client(&server, None).create_deploy_webhook().await.unwrap().unwrap();
        assert_eq!(hook["id"], "hook_1");
    }

    #[tokio::test]
    async fn test_create_secret_returns_uid() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/now/secrets"))
            .and(body_json(json!({ "name": "lookout-dsn", "value": "https://key@lookout/1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "uid": "sec_1", "name": "lookout-dsn" })))
            .mount(&server)
            .await;

        let uid = client(&server, None)
            .create_secret("lookout-dsn", "https://key@lookout/1")
            .await
            .unwrap();
        assert_eq!(uid.as_deref(), Some("sec_1"));
    }

    #[tokio::test]
    async fn test_env_variable_create_and_update() {
        let server = MockServer::start().await;
        let data = json!({ "key": "LOOKOUT_DSN", "value": "sec_1", "target": ["production"], "type": "secret" });

        Mock::given(method("POST"))
            .and(path("/v6/projects/prj_1/env"))
            .and(body_json(data.clone()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "env_1" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/v6/projects/prj_1/env/env_1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server, None);
        let created = client.create_env_variable("prj_1", &data).await.unwrap().unwrap();
        assert_eq!(created["id"], "env_1");

        let updated = client.update_env_variable("prj_1", "env_1", &data).await.unwrap();
        assert_eq!(updated, Some(Value::Null));
        server.verify().await;
    }

    #[test]
    fn test_cursor() {
        assert_eq!(cursor(&json!(1612345678901u64)), Some("1612345678901".to_string()));
        assert_eq!(cursor(&json!("abc")), Some("abc".to_string()));
        assert_eq!(cursor(&json!("")), None);
        assert_eq!(cursor(&Value::Null), None);
    }
}
