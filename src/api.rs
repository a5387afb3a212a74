use chrono::NaiveDate;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::model::{
    ApiMessage, AuthResponse, Client, ClientForm, CompleteVisitPayload, DashboardSummary,
    LoginRequest, Quote, QuotePayload, QuoteStats, QuoteStatus, RegisterRequest, User, Visit,
    VisitPayload, VisitStatus,
};
use crate::session::{Session, SessionStore};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Raised on any 401; the stored session is already gone by the time
    /// this surfaces.
    #[error("session expired or not signed in, run `tecnigestion login`")]
    SessionExpired,
    /// Server-reported failure, carrying the message from the response
    /// body when one was available.
    #[error("{0}")]
    Api(String),
    #[error("unexpected response from the server: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("could not persist the session: {0}")]
    Storage(#[from] std::io::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Gateway to the TecniGestión REST API. Every operation goes through
/// `send`, which attaches the bearer token when a session is stored and
/// evicts it on any authorization failure.
pub struct ApiClient {
    http: HttpClient,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(base_url: String, session: SessionStore) -> Self {
        ApiClient {
            http: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(session) = self.session.load() {
            req = req.bearer_auth(session.token);
        }
        req
    }

    fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> ApiResult<T> {
        let response = req.send()?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.session.clear();
            return Err(ApiError::SessionExpired);
        }

        let body = response.text()?;
        if !status.is_success() {
            return Err(ApiError::Api(extract_detail(&body)));
        }
        Ok(serde_json::from_str(&body)?)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send(self.request(Method::GET, path))
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        self.send(self.request(Method::POST, path).json(body))
    }

    fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        self.send(self.request(Method::PUT, path).json(body))
    }

    fn patch<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send(self.request(Method::PATCH, path))
    }

    fn patch_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        self.send(self.request(Method::PATCH, path).json(body))
    }

    fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send(self.request(Method::DELETE, path))
    }

    // ==========================================
    // Auth
    // ==========================================

    pub fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let auth: AuthResponse = self.post("/auth/login", &LoginRequest { email, password })?;
        self.persist(&auth)?;
        Ok(auth)
    }

    pub fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        let auth: AuthResponse = self.post("/auth/registro", request)?;
        self.persist(&auth)?;
        Ok(auth)
    }

    pub fn profile(&self) -> ApiResult<User> {
        self.get("/auth/perfil")
    }

    fn persist(&self, auth: &AuthResponse) -> ApiResult<()> {
        self.session.save(&Session {
            token: auth.access_token.clone(),
            user: auth.user.clone(),
        })?;
        Ok(())
    }

    // ==========================================
    // Clients
    // ==========================================

    pub fn list_clients(&self) -> ApiResult<Vec<Client>> {
        self.get("/clientes")
    }

    pub fn get_client(&self, id: i64) -> ApiResult<Client> {
        self.get(&format!("/clientes/{id}"))
    }

    pub fn create_client(&self, form: &ClientForm) -> ApiResult<Client> {
        self.post("/clientes", form)
    }

    pub fn update_client(&self, id: i64, form: &ClientForm) -> ApiResult<Client> {
        self.put(&format!("/clientes/{id}"), form)
    }

    pub fn delete_client(&self, id: i64) -> ApiResult<ApiMessage> {
        self.delete(&format!("/clientes/{id}"))
    }

    // ==========================================
    // Visits
    // ==========================================

    pub fn list_visits(
        &self,
        date: Option<NaiveDate>,
        status: Option<VisitStatus>,
    ) -> ApiResult<Vec<Visit>> {
        self.get(&visits_path(date, status))
    }

    pub fn visits_today(&self) -> ApiResult<Vec<Visit>> {
        self.get("/visitas/hoy")
    }

    pub fn get_visit(&self, id: i64) -> ApiResult<Visit> {
        self.get(&format!("/visitas/{id}"))
    }

    pub fn create_visit(&self, payload: &VisitPayload) -> ApiResult<Visit> {
        self.post("/visitas", payload)
    }

    pub fn update_visit(&self, id: i64, payload: &VisitPayload) -> ApiResult<Visit> {
        self.put(&format!("/visitas/{id}"), payload)
    }

    pub fn set_visit_status(&self, id: i64, status: VisitStatus) -> ApiResult<ApiMessage> {
        self.patch(&format!("/visitas/{id}/estado?estado={}", status.as_str()))
    }

    pub fn complete_visit(&self, id: i64, payload: &CompleteVisitPayload) -> ApiResult<ApiMessage> {
        self.patch_json(&format!("/visitas/{id}/completar"), payload)
    }

    pub fn delete_visit(&self, id: i64) -> ApiResult<ApiMessage> {
        self.delete(&format!("/visitas/{id}"))
    }

    // ==========================================
    // Quotes
    // ==========================================

    pub fn list_quotes(&self, status: Option<QuoteStatus>) -> ApiResult<Vec<Quote>> {
        match status {
            Some(s) => self.get(&format!("/presupuestos?estado={}", s.as_str())),
            None => self.get("/presupuestos"),
        }
    }

    pub fn quotes_for_client(&self, client_id: i64) -> ApiResult<Vec<Quote>> {
        self.get(&format!("/presupuestos/cliente/{client_id}"))
    }

    pub fn get_quote(&self, id: i64) -> ApiResult<Quote> {
        self.get(&format!("/presupuestos/{id}"))
    }

    pub fn create_quote(&self, payload: &QuotePayload) -> ApiResult<Quote> {
        self.post("/presupuestos", payload)
    }

    pub fn set_quote_status(&self, id: i64, status: QuoteStatus) -> ApiResult<ApiMessage> {
        self.patch(&format!("/presupuestos/{id}/estado?estado={}", status.as_str()))
    }

    pub fn delete_quote(&self, id: i64) -> ApiResult<ApiMessage> {
        self.delete(&format!("/presupuestos/{id}"))
    }

    pub fn quote_stats(&self) -> ApiResult<QuoteStats> {
        self.get("/estadisticas/presupuestos")
    }

    // ==========================================
    // Dashboard
    // ==========================================

    pub fn dashboard(&self) -> ApiResult<DashboardSummary> {
        self.get("/dashboard")
    }
}

fn visits_path(date: Option<NaiveDate>, status: Option<VisitStatus>) -> String {
    let mut params = Vec::new();
    if let Some(date) = date {
        params.push(format!("fecha={}", date.format("%Y-%m-%d")));
    }
    if let Some(status) = status {
        params.push(format!("estado={}", status.as_str()));
    }
    if params.is_empty() {
        "/visitas".to_string()
    } else {
        format!("/visitas?{}", params.join("&"))
    }
}

/// Pulls the human-readable message out of an error body, falling back
/// to a generic one when the body is not the expected JSON shape.
fn extract_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("detail")?.as_str().map(str::to_owned))
        .unwrap_or_else(|| "the request failed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_detail_extraction() {
        assert_eq!(
            extract_detail(r#"{"detail": "Cliente no encontrado"}"#),
            "Cliente no encontrado"
        );
        assert_eq!(extract_detail("not json at all"), "the request failed");
        assert_eq!(extract_detail(r#"{"other": 1}"#), "the request failed");
        assert_eq!(extract_detail(r#"{"detail": 42}"#), "the request failed");
    }

    #[test]
    fn visit_list_paths() {
        assert_eq!(visits_path(None, None), "/visitas");
        assert_eq!(
            visits_path(NaiveDate::from_ymd_opt(2025, 3, 14), None),
            "/visitas?fecha=2025-03-14"
        );
        assert_eq!(
            visits_path(None, Some(VisitStatus::InProgress)),
            "/visitas?estado=en_curso"
        );
        assert_eq!(
            visits_path(
                NaiveDate::from_ymd_opt(2025, 3, 14),
                Some(VisitStatus::Pending)
            ),
            "/visitas?fecha=2025-03-14&estado=pendiente"
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let store = SessionStore::at(std::env::temp_dir().join(format!(
            "tecnigestion-api-{}",
            std::process::id()
        )));
        let api = ApiClient::new("http://localhost:8000/api/".to_string(), store);
        assert_eq!(api.base_url, "http://localhost:8000/api");
    }
}
