use crate::models::AccountInfo;
use serde::{Deserialize, Serialize};

pub(crate) const TOKEN_KEY: &str = "cardnote_token";
pub(crate) const USER_KEY: &str = "cardnote_user";
pub(crate) const SETTINGS_KEY: &str = "cardnote_settings";

/// Theme/layout preferences. Local-only; never synced to the backend.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct AppSettings {
    pub dark_mode: bool,
    /// Dashboard card grid columns (1..=4).
    pub grid_columns: u8,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            grid_columns: 3,
        }
    }
}

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(key: &str) -> Option<T> {
    let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten())?;
    let json = storage.get_item(key).ok().flatten()?;
    serde_json::from_str(&json).ok()
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
            let _ = storage.set_item(key, &json);
        }
    }
}

pub(crate) fn save_user_to_storage(user: &AccountInfo) {
    save_json_to_storage(USER_KEY, user);
}

pub(crate) fn load_user_from_storage() -> Option<AccountInfo> {
    load_json_from_storage(USER_KEY)
}

pub(crate) fn load_settings() -> AppSettings {
    load_json_from_storage::<AppSettings>(SETTINGS_KEY).unwrap_or_default()
}

pub(crate) fn save_settings(settings: &AppSettings) {
    save_json_to_storage(SETTINGS_KEY, settings);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_roundtrip_json() {
        let s = AppSettings {
            dark_mode: true,
            grid_columns: 2,
        };
        let json = serde_json::to_string(&s).expect("should serialize");
        let back: AppSettings = serde_json::from_str(&json).expect("should parse");
        assert_eq!(back, s);
    }

    #[test]
    fn settings_default_is_light_three_columns() {
        let s = AppSettings::default();
        assert!(!s.dark_mode);
        assert_eq!(s.grid_columns, 3);
    }
}
