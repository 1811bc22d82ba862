use crate::api::{ApiClient, ApiError, ApiErrorKind};
use crate::models::{AccountInfo, Folder, Note};
use crate::storage::{load_settings, load_user_from_storage, save_settings, AppSettings};
use leptos::prelude::*;

#[derive(Clone)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,
    pub current_user: RwSignal<Option<AccountInfo>>,

    /// Folder list cache (also the search fallback corpus).
    pub folders: RwSignal<Vec<Folder>>,
    pub folders_loading: RwSignal<bool>,
    pub folders_error: RwSignal<Option<String>>,

    /// All notes for the signed-in user, grouped client-side by folder.
    pub notes: RwSignal<Vec<Note>>,
    pub notes_loading: RwSignal<bool>,
    pub notes_error: RwSignal<Option<String>>,

    /// Load guard (ignore stale folder/note list responses).
    pub lists_request_id: RwSignal<u64>,

    /// Editor selection, shared between tree navigator and editor page.
    pub selected_folder: RwSignal<Option<Folder>>,
    pub selected_note: RwSignal<Option<Note>>,

    /// Bumped after note create/rename/delete so the tree reloads.
    pub tree_refresh_tick: RwSignal<u64>,

    /// Theme/layout preferences (persisted locally).
    pub settings: RwSignal<AppSettings>,
}

impl AppState {
    pub fn new() -> Self {
        let stored_client = ApiClient::load_from_storage();
        let stored_user = load_user_from_storage();

        Self {
            api_client: RwSignal::new(stored_client),
            current_user: RwSignal::new(stored_user),
            folders: RwSignal::new(vec![]),
            folders_loading: RwSignal::new(false),
            folders_error: RwSignal::new(None),
            notes: RwSignal::new(vec![]),
            notes_loading: RwSignal::new(false),
            notes_error: RwSignal::new(None),
            lists_request_id: RwSignal::new(0),
            selected_folder: RwSignal::new(None),
            selected_note: RwSignal::new(None),
            tree_refresh_tick: RwSignal::new(0),
            settings: RwSignal::new(load_settings()),
        }
    }

    pub fn notify_tree_changed(&self) {
        self.tree_refresh_tick
            .set(self.tree_refresh_tick.get_untracked().wrapping_add(1));
    }

    pub fn update_settings(&self, f: impl FnOnce(&mut AppSettings)) {
        let mut s = self.settings.get_untracked();
        f(&mut s);
        save_settings(&s);
        self.settings.set(s);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);

/// Session-expiry handling shared by every page: clear credentials and
/// bounce to the login route.
pub(crate) fn force_login(app: &AppContext) {
    let mut c = app.0.api_client.get_untracked();
    c.logout();
    app.0.api_client.set(c);
    app.0.current_user.set(None);
    let _ = window().location().set_href("/login");
}

/// Route an `ApiError` the way the pages do: 401 ends the session, anything
/// else lands in the given error signal (and the console, for diagnostics).
pub(crate) fn report_api_error(app: &AppContext, error_slot: RwSignal<Option<String>>, e: &ApiError) {
    web_sys::console::warn_1(&format!("api error: {e}").into());

    if e.kind == ApiErrorKind::Unauthorized {
        force_login(app);
    } else {
        error_slot.set(Some(e.to_string()));
    }
}
