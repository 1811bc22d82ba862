use crate::api::ApiErrorKind;
use crate::models::{Folder, ItemNote, Note};
use crate::state::AppContext;
use crate::sync::QUIET_MS;
use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::JsCast;

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SearchResults {
    pub folders: Vec<Folder>,
    pub notes: Vec<Note>,
    pub items: Vec<ItemNote>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.notes.is_empty() && self.items.is_empty()
    }
}

/// Lowercase + strip Latin diacritics, so "CAFÉ" and "cafe" compare equal.
/// The fold table carries exactly the letters with a canonical
/// combining-mark decomposition; letters like "ł" or "ø" are distinct base
/// letters, not accented ones, and pass through lowercased. Matches
/// NFD-normalize-then-strip-marks output for the Latin-1 and Latin
/// Extended-A ranges.
pub(crate) fn normalize_text(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(fold_diacritic)
        .collect()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'à'..='å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'ď' => 'd',
        'è'..='ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'ĥ' => 'h',
        'ì'..='ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' => 'i',
        'ĵ' => 'j',
        'ķ' => 'k',
        'ĺ' | 'ļ' | 'ľ' => 'l',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'ò'..='ö' | 'ō' | 'ŏ' | 'ő' => 'o',
        'ŕ' | 'ŗ' | 'ř' => 'r',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'ţ' | 'ť' => 't',
        'ù'..='ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ŵ' => 'w',
        'ý' | 'ÿ' | 'ŷ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}

fn contains_normalized(haystack: &str, needle_norm: &str) -> bool {
    normalize_text(haystack).contains(needle_norm)
}

fn item_matches(item: &ItemNote, needle_norm: &str) -> bool {
    if contains_normalized(&item.title, needle_norm) {
        return true;
    }
    if let Some(content) = &item.content {
        if contains_normalized(content, needle_norm) {
            return true;
        }
    }
    if let Some(entries) = &item.items {
        if entries
            .iter()
            .any(|e| contains_normalized(&e.text, needle_norm))
        {
            return true;
        }
    }
    false
}

/// Accent-insensitive scan over already-fetched entities. Used when the
/// search RPC is unavailable so results degrade instead of disappearing.
pub(crate) fn local_scan(
    query: &str,
    folders: &[Folder],
    notes: &[Note],
    items: &[ItemNote],
) -> SearchResults {
    let needle = normalize_text(query.trim());
    if needle.is_empty() {
        return SearchResults {
            folders: folders.to_vec(),
            ..Default::default()
        };
    }

    let matched_items: Vec<ItemNote> = items
        .iter()
        .filter(|i| item_matches(i, &needle))
        .cloned()
        .collect();

    // A note counts as a hit when its name matches or one of its blocks does.
    let notes: Vec<Note> = notes
        .iter()
        .filter(|n| {
            contains_normalized(&n.name, &needle)
                || matched_items.iter().any(|i| i.note_id == n.id)
        })
        .cloned()
        .collect();

    SearchResults {
        folders: folders
            .iter()
            .filter(|f| contains_normalized(&f.name, &needle))
            .cloned()
            .collect(),
        notes,
        items: matched_items,
    }
}

/// Dashboard search driver: remote RPC first, local fallback on failure,
/// stale responses dropped via a request counter.
#[derive(Clone)]
pub(crate) struct SearchController {
    app_state: AppContext,
    pub results: RwSignal<SearchResults>,
    pub searching: RwSignal<bool>,
    request_id: RwSignal<u64>,
    timer: RwSignal<Option<i32>>,
}

impl SearchController {
    pub fn new(app_state: AppContext) -> Self {
        Self {
            app_state,
            results: RwSignal::new(SearchResults::default()),
            searching: RwSignal::new(false),
            request_id: RwSignal::new(0),
            timer: RwSignal::new(None),
        }
    }

    /// Debounced entry point for the search box: a keystroke burst resets
    /// the quiet interval and collapses into a single `run`. An empty
    /// query clears immediately since it never goes over the network.
    pub fn schedule(&self, raw: String) {
        let Some(win) = web_sys::window() else {
            return;
        };
        if let Some(tid) = self.timer.get_untracked() {
            win.clear_timeout_with_handle(tid);
        }

        if raw.trim().is_empty() {
            self.timer.set(None);
            self.run(raw);
            return;
        }

        let s2 = self.clone();
        let cb = wasm_bindgen::closure::Closure::once_into_js(move || {
            s2.timer.set(None);
            s2.run(raw);
        });
        let tid = win
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                QUIET_MS,
            )
            .unwrap_or(0);
        self.timer.set(Some(tid));
    }

    pub fn run(&self, raw: String) {
        let rid = self.request_id.get_untracked() + 1;
        self.request_id.set(rid);

        let trimmed = raw.trim().to_string();
        if trimmed.is_empty() {
            // Empty query shows the full folder list, no network round trip.
            self.results.set(SearchResults {
                folders: self.app_state.0.folders.get_untracked(),
                ..Default::default()
            });
            self.searching.set(false);
            return;
        }

        self.searching.set(true);
        let api = self.app_state.0.api_client.get_untracked();
        let this = self.clone();
        spawn_local(async move {
            let outcome = match api.search_global(&trimmed).await {
                Ok(resp) => SearchResults {
                    folders: resp.folders,
                    notes: resp.notes,
                    items: resp.items,
                },
                Err(e) => {
                    if e.kind == ApiErrorKind::Unauthorized {
                        crate::state::force_login(&this.app_state);
                        return;
                    }
                    // RPC missing or unreachable; scan what we have.
                    let items = api.recent_items(200).await.unwrap_or_default();
                    local_scan(
                        &trimmed,
                        &this.app_state.0.folders.get_untracked(),
                        &this.app_state.0.notes.get_untracked(),
                        &items,
                    )
                }
            };

            // A newer query superseded this one while it was in flight.
            if this.request_id.get_untracked() != rid {
                return;
            }
            this.results.set(outcome);
            this.searching.set(false);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CardType, ChecklistItem, TextType};

    fn folder(id: i64, name: &str) -> Folder {
        Folder {
            id,
            name: name.to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: None,
        }
    }

    fn note(id: i64, name: &str) -> Note {
        Note {
            id,
            folder_id: 1,
            name: name.to_string(),
            user_id: String::new(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: None,
            read_at: None,
        }
    }

    fn paragraph(id: &str, title: &str, content: &str) -> ItemNote {
        ItemNote {
            id: id.to_string(),
            note_id: 1,
            title: title.to_string(),
            card_type: CardType::Paragraph,
            text_type: Some(TextType::Paragraph),
            content: Some(content.to_string()),
            items: None,
            order: 0,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn normalization_folds_case_and_accents() {
        assert_eq!(normalize_text("CAFÉ"), "cafe");
        assert_eq!(normalize_text("Über Straße"), "uber straße");
        assert_eq!(normalize_text("Żółć"), "zołc");
        assert_eq!(normalize_text("plain"), "plain");
        // Distinct base letters are not accent variants and stay put.
        assert_eq!(normalize_text("Łódź"), "łodz");
        assert_eq!(normalize_text("SØRENSEN"), "sørensen");
    }

    #[test]
    fn accented_query_matches_plain_text_and_vice_versa() {
        let folders = vec![folder(1, "Cafe ideas"), folder(2, "Travel")];
        let out = local_scan("CAFÉ", &folders, &[], &[]);
        assert_eq!(out.folders.len(), 1);
        assert_eq!(out.folders[0].id, 1);

        let notes = vec![note(1, "Café reviews")];
        let out = local_scan("cafe", &[], &notes, &[]);
        assert_eq!(out.notes.len(), 1);
    }

    #[test]
    fn empty_query_returns_all_folders_only() {
        let folders = vec![folder(1, "A"), folder(2, "B")];
        let notes = vec![note(1, "A note")];
        let out = local_scan("   ", &folders, &notes, &[]);
        assert_eq!(out.folders.len(), 2);
        assert!(out.notes.is_empty());
        assert!(out.items.is_empty());
    }

    #[test]
    fn blocks_match_on_title_content_and_checklist_text() {
        let by_title = paragraph("a", "Groceries", "");
        let by_content = paragraph("b", "", "buy groceries tomorrow");
        let mut by_checklist = paragraph("c", "", "");
        by_checklist.card_type = CardType::Checklist;
        by_checklist.content = None;
        by_checklist.items = Some(vec![ChecklistItem {
            id: "x".to_string(),
            text: "groceries run".to_string(),
            checked: false,
        }]);
        let unrelated = paragraph("d", "Work", "meeting notes");

        let items = vec![by_title, by_content, by_checklist, unrelated];
        let out = local_scan("groceries", &[], &[], &items);
        let ids: Vec<&str> = out.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn note_with_matching_block_content_is_included() {
        // The note's own name does not match; one of its blocks does.
        let notes = vec![note(1, "Travel journal")];
        let items = vec![paragraph("a", "Day 3", "Best CAFÉ in town")];

        let out = local_scan("cafe", &[], &notes, &items);
        assert_eq!(out.notes.len(), 1);
        assert_eq!(out.notes[0].id, 1);
        assert_eq!(out.items.len(), 1);
    }

    #[test]
    fn no_match_yields_empty_results() {
        let out = local_scan("zzz", &[folder(1, "A")], &[note(1, "B")], &[]);
        assert!(out.is_empty());
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::state::AppState;
    use wasm_bindgen_test::wasm_bindgen_test;

    async fn sleep(ms: i32) {
        let promise = js_sys::Promise::new(&mut |resolve, _| {
            web_sys::window()
                .unwrap()
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
                .unwrap();
        });
        wasm_bindgen_futures::JsFuture::from(promise)
            .await
            .unwrap();
    }

    #[wasm_bindgen_test]
    async fn keystroke_burst_collapses_into_one_run() {
        let app_state = AppState::new();
        let mut api = app_state.api_client.get_untracked();
        api.set_session("token".to_string(), "user-1".to_string());
        app_state.api_client.set(api);

        let search = SearchController::new(AppContext(app_state));
        search.schedule("ca".to_string());
        search.schedule("caf".to_string());
        search.schedule("cafe".to_string());

        // Inside the quiet interval nothing has run yet.
        sleep(100).await;
        assert_eq!(search.request_id.get_untracked(), 0);

        // The whole burst becomes one run.
        sleep(600).await;
        assert_eq!(search.request_id.get_untracked(), 1);
    }
}
