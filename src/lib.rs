mod api;
mod app;
mod components;
mod editor;
mod models;
mod pages;
mod search;
mod state;
mod storage;
mod sync;
mod util;

use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test ends up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(app::App);
}

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use crate::api::ApiClient;
    use crate::models::AccountInfo;
    use crate::storage::{load_user_from_storage, save_user_to_storage};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn api_client_storage_roundtrip_session() {
        ApiClient::clear_storage();

        let mut c = ApiClient::load_from_storage();
        assert!(!c.is_authenticated());

        // Login flow persists the token and the account separately.
        c.set_session("t1".to_string(), "user-1".to_string());
        c.save_to_storage();
        let user: AccountInfo = serde_json::from_value(serde_json::json!({
            "id": "user-1"
        }))
        .expect("should build account");
        save_user_to_storage(&user);

        let c2 = ApiClient::load_from_storage();
        assert!(c2.is_authenticated());
        assert_eq!(c2.user_id().as_deref(), Some("user-1"));

        ApiClient::clear_storage();
        let c3 = ApiClient::load_from_storage();
        assert!(!c3.is_authenticated());
    }

    #[wasm_bindgen_test]
    fn user_storage_roundtrip() {
        let user: AccountInfo = serde_json::from_value(serde_json::json!({
            "id": "user-1",
            "email": "u@example.com"
        }))
        .expect("should build account");
        save_user_to_storage(&user);
        let loaded = load_user_from_storage().expect("should load user from localStorage");
        assert_eq!(loaded.id, "user-1");
    }
}
