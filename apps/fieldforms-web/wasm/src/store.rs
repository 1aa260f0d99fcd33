//! Document store over the hosted REST API
//!
//! - `GET  /auth/v1/user` resolves the access token to the signed-in user
//! - `POST /rest/v1/documents` inserts and returns the stored row
//! - `GET  /rest/v1/documents?id=eq.<id>` reads one row
//! - `GET  /rest/v1/documents?select=...&order=created_at.desc` lists rows
//!
//! Row-level security on the server limits reads to the caller's rows.

use form_records::{
    AppConfig, DocumentId, DocumentRecord, DocumentStore, DocumentSummary, Identity, NewDocument,
    StoreError,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

const DOCUMENTS_PATH: &str = "/rest/v1/documents";
const USER_PATH: &str = "/auth/v1/user";
const SUMMARY_COLUMNS: &str = "id,type,customer_name,created_at";

pub struct RestStore {
    base_url: String,
    anon_key: String,
    token_storage_key: String,
}

/// Insert body: the document plus its owner
#[derive(Serialize)]
struct InsertRow<'a> {
    user_id: &'a str,
    #[serde(flatten)]
    document: &'a NewDocument,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "msg", alias = "error_description")]
    message: Option<String>,
}

fn js_error(e: JsValue) -> StoreError {
    StoreError::Request(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

impl RestStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            base_url: config.store_base().to_string(),
            anon_key: config.anon_key.clone(),
            token_storage_key: config.access_token_storage_key.clone(),
        }
    }

    /// Access token of the signed-in user, if any
    pub fn access_token(&self) -> Option<String> {
        let storage = web_sys::window()?.local_storage().ok()??;
        storage
            .get_item(&self.token_storage_key)
            .ok()?
            .filter(|token| !token.is_empty())
    }

    /// Send a request; returns status and body text
    async fn send(
        &self,
        method: &str,
        path_and_query: &str,
        body: Option<String>,
        prefer: Option<&str>,
    ) -> Result<(u16, String), StoreError> {
        let window = web_sys::window().ok_or(StoreError::Unavailable)?;

        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);
        if let Some(body) = &body {
            opts.set_body(&JsValue::from_str(body));
        }

        let url = format!("{}{}", self.base_url, path_and_query);
        let request = Request::new_with_str_and_init(&url, &opts).map_err(js_error)?;
        let headers = request.headers();
        headers.set("apikey", &self.anon_key).map_err(js_error)?;
        let bearer = self.access_token().unwrap_or_else(|| self.anon_key.clone());
        headers
            .set("Authorization", &format!("Bearer {}", bearer))
            .map_err(js_error)?;
        if body.is_some() {
            headers.set("Content-Type", "application/json").map_err(js_error)?;
        }
        if let Some(prefer) = prefer {
            headers.set("Prefer", prefer).map_err(js_error)?;
        }

        debug!(%method, path = %path_and_query, "Store request");
        let response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_error)?;
        let response: Response = response.dyn_into().map_err(js_error)?;
        let status = response.status();
        let text = JsFuture::from(response.text().map_err(js_error)?)
            .await
            .map_err(js_error)?
            .as_string()
            .unwrap_or_default();
        Ok((status, text))
    }

    fn rejected(status: u16, body: &str) -> StoreError {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| body.to_string());
        StoreError::Rejected { status, message }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path_and_query: &str) -> Result<T, StoreError> {
        let (status, text) = self.send("GET", path_and_query, None, None).await?;
        if !(200..300).contains(&status) {
            return Err(Self::rejected(status, &text));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

impl DocumentStore for RestStore {
    async fn current_identity(&self) -> Result<Option<Identity>, StoreError> {
        if self.access_token().is_none() {
            return Ok(None);
        }
        let (status, text) = self.send("GET", USER_PATH, None, None).await?;
        match status {
            200..=299 => Ok(Some(serde_json::from_str(&text)?)),
            401 | 403 => Ok(None),
            _ => Err(Self::rejected(status, &text)),
        }
    }

    async fn create(&self, owner: &Identity, document: NewDocument) -> Result<DocumentRecord, StoreError> {
        let body = serde_json::to_string(&InsertRow {
            user_id: &owner.user_id,
            document: &document,
        })?;
        let (status, text) = self
            .send("POST", DOCUMENTS_PATH, Some(body), Some("return=representation"))
            .await?;
        if !(200..300).contains(&status) {
            return Err(Self::rejected(status, &text));
        }
        let mut rows: Vec<DocumentRecord> = serde_json::from_str(&text)?;
        rows.pop()
            .ok_or_else(|| StoreError::Decode("insert returned no row".to_string()))
    }

    async fn get(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, StoreError> {
        let path = format!(
            "{}?select=*&id=eq.{}",
            DOCUMENTS_PATH,
            String::from(js_sys::encode_uri_component(id.as_str()))
        );
        let mut rows: Vec<DocumentRecord> = self.get_json(&path).await?;
        Ok(if rows.is_empty() { None } else { Some(rows.swap_remove(0)) })
    }

    async fn list_recent(&self) -> Result<Vec<DocumentSummary>, StoreError> {
        let path = format!("{}?select={}&order=created_at.desc", DOCUMENTS_PATH, SUMMARY_COLUMNS);
        self.get_json(&path).await
    }
}
