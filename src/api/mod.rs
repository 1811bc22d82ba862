use crate::models::{
    AccountInfo, CreateItemDto, CreateNoteDto, Folder, ItemNote, Note, UpdateItemDto,
    UpdateNoteDto,
};
use crate::storage::{TOKEN_KEY, USER_KEY};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    Network,
    Http,
    Parse,
    NotFound,
}

#[derive(Clone, Debug)]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: "Unauthorized".to_string(),
        }
    }

    fn not_found(ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::NotFound,
            message: format!("{ctx}: no matching row"),
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub base_url: String,
    pub anon_key: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let mut base_url = "http://localhost:54321".to_string();
        let mut anon_key = String::new();

        // Runtime config is injected as `window.ENV = { SUPABASE_URL, SUPABASE_ANON_KEY }`
        // by the hosting page (set-env script), so the same bundle serves all envs.
        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    if let Ok(v) = js_sys::Reflect::get(&env, &"SUPABASE_URL".into()) {
                        if let Some(s) = v.as_string() {
                            base_url = s;
                        }
                    }
                    if let Ok(v) = js_sys::Reflect::get(&env, &"SUPABASE_ANON_KEY".into()) {
                        if let Some(s) = v.as_string() {
                            anon_key = s;
                        }
                    }
                }
            }
        }

        Self { base_url, anon_key }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize, Clone, Debug)]
struct PasswordGrantRequest {
    email: String,
    password: String,
}

#[derive(Deserialize, Clone, Debug)]
pub(crate) struct SignInResponse {
    pub access_token: String,
    pub user: AccountInfo,
}

#[derive(Serialize, Clone, Debug)]
struct SearchRpcRequest {
    search_term: String,
    user_id_param: String,
}

/// Full-entity payload of the `search_global_full_entities` stored procedure.
#[derive(Deserialize, Clone, Debug, Default)]
pub(crate) struct GlobalSearchResponse {
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub items: Vec<ItemNote>,
}

/// Typed CRUD gateway over the hosted backend (PostgREST tables + auth +
/// the search RPC). Stateless apart from credentials; cheap to clone.
#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    anon_key: String,
    token: Option<String>,
    user_id: Option<String>,
}

impl ApiClient {
    #[allow(dead_code)]
    pub fn new(base_url: String, anon_key: String) -> Self {
        Self {
            base_url,
            anon_key,
            token: None,
            user_id: None,
        }
    }

    pub fn load_from_storage() -> Self {
        let env = EnvConfig::new();
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());

        let token = storage
            .as_ref()
            .and_then(|s| s.get_item(TOKEN_KEY).ok().flatten());
        let user_id = crate::storage::load_user_from_storage().map(|u| u.id);

        Self {
            base_url: env.base_url,
            anon_key: env.anon_key,
            token,
            user_id,
        }
    }

    pub fn save_to_storage(&self) {
        if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
            if let Some(token) = &self.token {
                let _ = storage.set_item(TOKEN_KEY, token);
            }
        }
    }

    pub fn clear_storage() {
        if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
            let _ = storage.remove_item(TOKEN_KEY);
            let _ = storage.remove_item(USER_KEY);
        }
    }

    pub fn set_session(&mut self, token: String, user_id: String) {
        self.token = Some(token);
        self.user_id = Some(user_id);
    }

    pub fn user_id(&self) -> Option<String> {
        self.user_id.clone()
    }

    pub fn logout(&mut self) {
        self.token = None;
        self.user_id = None;
        Self::clear_storage();
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn with_headers(&self, mut req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req = req.header("apikey", self.anon_key.clone());
        // Fall back to the anon key so unauthenticated requests still pass
        // the gateway (RLS rejects them with 401 where it matters).
        let bearer = self.token.clone().unwrap_or_else(|| self.anon_key.clone());
        req.header("Authorization", format!("Bearer {bearer}"))
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
        ctx: &str,
    ) -> ApiResult<T> {
        let res = req.send().await.map_err(ApiError::network)?;
        let status = res.status();

        if status.is_success() {
            res.json().await.map_err(ApiError::parse)
        } else if status.as_u16() == 401 {
            Err(ApiError::unauthorized())
        } else if status.as_u16() == 404 {
            Err(ApiError::not_found(ctx))
        } else {
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, ctx))
        }
    }

    async fn send_no_body(&self, req: reqwest::RequestBuilder, ctx: &str) -> ApiResult<()> {
        let res = req.send().await.map_err(ApiError::network)?;
        let status = res.status();

        if status.is_success() {
            Ok(())
        } else if status.as_u16() == 401 {
            Err(ApiError::unauthorized())
        } else if status.as_u16() == 404 {
            Err(ApiError::not_found(ctx))
        } else {
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, ctx))
        }
    }

    fn rest_url(&self, table_and_query: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table_and_query)
    }

    async fn get_rows<T: serde::de::DeserializeOwned>(
        &self,
        table_and_query: &str,
        ctx: &str,
    ) -> ApiResult<Vec<T>> {
        let client = reqwest::Client::new();
        let req = self.with_headers(client.get(self.rest_url(table_and_query)));
        self.send(req, ctx).await
    }

    /// POST with `return=representation`; PostgREST answers with an array of
    /// the inserted rows.
    async fn insert_row<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        body: &impl Serialize,
        ctx: &str,
    ) -> ApiResult<T> {
        let client = reqwest::Client::new();
        let req = self
            .with_headers(client.post(self.rest_url(table)))
            .header("Prefer", "return=representation")
            .json(body);

        let mut rows: Vec<T> = self.send(req, ctx).await?;
        if rows.is_empty() {
            return Err(ApiError::parse(format!("{ctx}: empty insert response")));
        }
        Ok(rows.remove(0))
    }

    /// PATCH by filter; an empty representation means no row matched.
    async fn update_rows<T: serde::de::DeserializeOwned>(
        &self,
        table_and_query: &str,
        body: &impl Serialize,
        ctx: &str,
    ) -> ApiResult<T> {
        let client = reqwest::Client::new();
        let req = self
            .with_headers(client.patch(self.rest_url(table_and_query)))
            .header("Prefer", "return=representation")
            .json(body);

        let mut rows: Vec<T> = self.send(req, ctx).await?;
        if rows.is_empty() {
            return Err(ApiError::not_found(ctx));
        }
        Ok(rows.remove(0))
    }

    async fn delete_rows(&self, table_and_query: &str, ctx: &str) -> ApiResult<()> {
        let client = reqwest::Client::new();
        let req = self.with_headers(client.delete(self.rest_url(table_and_query)));
        self.send_no_body(req, ctx).await
    }

    // ---- auth ----

    pub async fn sign_in(&self, email: &str, password: &str) -> ApiResult<SignInResponse> {
        let client = reqwest::Client::new();
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        let req = self.with_headers(client.post(url)).json(&PasswordGrantRequest {
            email: email.to_string(),
            password: password.to_string(),
        });
        self.send(req, "Sign in failed").await
    }

    // ---- folder ----

    pub async fn list_folders(&self) -> ApiResult<Vec<Folder>> {
        self.get_rows("folder?select=*&order=created_at.desc", "Load folders failed")
            .await
    }

    pub async fn create_folder(&self, name: &str) -> ApiResult<Folder> {
        self.insert_row(
            "folder",
            &serde_json::json!({ "name": name }),
            "Create folder failed",
        )
        .await
    }

    pub async fn update_folder(&self, id: i64, name: &str) -> ApiResult<Folder> {
        self.update_rows(
            &format!("folder?id=eq.{id}"),
            &serde_json::json!({ "name": name }),
            "Rename folder failed",
        )
        .await
    }

    /// Note rows cascade server-side via the folder FK policy.
    pub async fn delete_folder(&self, id: i64) -> ApiResult<()> {
        self.delete_rows(&format!("folder?id=eq.{id}"), "Delete folder failed")
            .await
    }

    // ---- note ----

    pub async fn list_notes(&self) -> ApiResult<Vec<Note>> {
        self.get_rows("note?select=*&order=created_at.desc", "Load notes failed")
            .await
    }

    pub async fn notes_by_folder(&self, folder_id: i64) -> ApiResult<Vec<Note>> {
        self.get_rows(
            &format!("note?select=*&folder_id=eq.{folder_id}&order=created_at.desc"),
            "Load folder notes failed",
        )
        .await
    }

    pub async fn create_note(&self, dto: &CreateNoteDto) -> ApiResult<Note> {
        self.insert_row("note", dto, "Create note failed").await
    }

    pub async fn get_note(&self, id: i64) -> ApiResult<Note> {
        let rows: Vec<Note> = self
            .get_rows(&format!("note?select=*&id=eq.{id}"), "Load note failed")
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ApiError::not_found("Load note failed"))
    }

    pub async fn update_note(&self, id: i64, dto: &UpdateNoteDto) -> ApiResult<Note> {
        self.update_rows(&format!("note?id=eq.{id}"), dto, "Update note failed")
            .await
    }

    pub async fn delete_note(&self, id: i64) -> ApiResult<()> {
        self.delete_rows(&format!("note?id=eq.{id}"), "Delete note failed")
            .await
    }

    pub async fn recently_read_notes(&self, limit: usize) -> ApiResult<Vec<Note>> {
        self.get_rows(
            &format!("note?select=*&order=read_at.desc.nullslast&limit={limit}"),
            "Load recent notes failed",
        )
        .await
    }

    /// Bump `read_at` while re-sending the current `updated_at` so viewing a
    /// note never shows up as an edit.
    pub async fn touch_read_at(&self, note: &Note, now_iso: &str) -> ApiResult<Note> {
        let dto = UpdateNoteDto {
            read_at: Some(now_iso.to_string()),
            updated_at: note.updated_at.clone(),
            ..Default::default()
        };
        self.update_note(note.id, &dto).await
    }

    // ---- item_note ----

    pub async fn items_by_note(&self, note_id: i64) -> ApiResult<Vec<ItemNote>> {
        self.get_rows(
            &format!("item_note?select=*&note_id=eq.{note_id}&order=order.asc"),
            "Load note items failed",
        )
        .await
    }

    pub async fn recent_items(&self, limit: usize) -> ApiResult<Vec<ItemNote>> {
        self.get_rows(
            &format!("item_note?select=*&order=updated_at.desc.nullslast&limit={limit}"),
            "Load recent items failed",
        )
        .await
    }

    pub async fn create_item(&self, dto: &CreateItemDto) -> ApiResult<ItemNote> {
        self.insert_row("item_note", dto, "Create card failed").await
    }

    pub async fn update_item(&self, id: &str, dto: &UpdateItemDto) -> ApiResult<ItemNote> {
        self.update_rows(
            &format!("item_note?id=eq.{}", urlencoding::encode(id)),
            dto,
            "Update card failed",
        )
        .await
    }

    pub async fn delete_item(&self, id: &str) -> ApiResult<()> {
        self.delete_rows(
            &format!("item_note?id=eq.{}", urlencoding::encode(id)),
            "Delete card failed",
        )
        .await
    }

    // ---- search ----

    pub async fn search_global(&self, term: &str) -> ApiResult<GlobalSearchResponse> {
        let Some(user_id) = self.user_id() else {
            return Err(ApiError::unauthorized());
        };

        let client = reqwest::Client::new();
        let url = format!("{}/rest/v1/rpc/search_global_full_entities", self.base_url);
        let req = self.with_headers(client.post(url)).json(&SearchRpcRequest {
            search_term: term.to_string(),
            user_id_param: user_id,
        });

        let data: serde_json::Value = self.send(req, "Search failed").await?;
        Self::parse_search_response(data)
    }

    /// The RPC has been observed returning either the bare result object or
    /// a single-element array wrapping it; both are valid.
    pub(crate) fn parse_search_response(data: serde_json::Value) -> ApiResult<GlobalSearchResponse> {
        let obj = match data {
            serde_json::Value::Array(mut arr) => {
                if arr.is_empty() {
                    return Ok(GlobalSearchResponse::default());
                }
                arr.remove(0)
            }
            serde_json::Value::Null => return Ok(GlobalSearchResponse::default()),
            other => other,
        };

        serde_json::from_value(obj).map_err(ApiError::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> serde_json::Value {
        serde_json::json!({
            "folders": [
                {"id": 1, "name": "Recipes", "created_at": "2024-01-01T00:00:00Z"}
            ],
            "notes": [
                {"id": 4, "folder_id": 1, "name": "Cakes", "user_id": "u1",
                 "created_at": "2024-01-02T00:00:00Z"}
            ],
            "items": [
                {"id": "aa", "note_id": 4, "title": "Base", "type": "paragraph",
                 "text_type": "paragraph", "content": "Flour and eggs", "order": 0}
            ]
        })
    }

    #[test]
    fn search_response_accepts_bare_object() {
        let parsed = ApiClient::parse_search_response(sample_payload()).expect("should parse");
        assert_eq!(parsed.folders.len(), 1);
        assert_eq!(parsed.notes.len(), 1);
        assert_eq!(parsed.items.len(), 1);
    }

    #[test]
    fn search_response_unwraps_single_element_array() {
        let wrapped = serde_json::Value::Array(vec![sample_payload()]);
        let parsed = ApiClient::parse_search_response(wrapped).expect("should parse");
        assert_eq!(parsed.notes[0].name, "Cakes");
    }

    #[test]
    fn search_response_empty_array_and_null_are_empty_results() {
        let parsed =
            ApiClient::parse_search_response(serde_json::Value::Array(vec![])).expect("parses");
        assert!(parsed.folders.is_empty() && parsed.notes.is_empty() && parsed.items.is_empty());

        let parsed = ApiClient::parse_search_response(serde_json::Value::Null).expect("parses");
        assert!(parsed.folders.is_empty());
    }

    #[test]
    fn search_response_tolerates_missing_sections() {
        let parsed = ApiClient::parse_search_response(serde_json::json!({"folders": []}))
            .expect("should parse");
        assert!(parsed.notes.is_empty());
        assert!(parsed.items.is_empty());
    }

    #[test]
    fn api_client_session_state() {
        let mut c = ApiClient::new("http://localhost:54321".to_string(), "anon".to_string());
        assert!(!c.is_authenticated());
        assert!(c.user_id().is_none());

        c.set_session("jwt".to_string(), "user-1".to_string());
        assert!(c.is_authenticated());
        assert_eq!(c.user_id().as_deref(), Some("user-1"));
    }
}
