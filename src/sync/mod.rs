pub(crate) mod plan;
pub(crate) mod timers;

use crate::models::{ItemNote, Note, UpdateNoteDto};
use crate::state::{report_api_error, AppContext};
use crate::util::{is_tmp_id, new_tmp_id, now_iso};
use leptos::prelude::*;
use leptos::task::spawn_local;
use plan::{stale_orders, SyncAction, SyncRegistry, SyncState, TitleAction, TitleTimeline};
use std::sync::{Arc, Mutex};
use timers::TimerBook;
use wasm_bindgen::JsCast;

/// Quiet interval before a pending edit or query is persisted.
pub(crate) const QUIET_MS: i32 = 500;

/// Autosave engine for one note-editor instance.
///
/// Responsibilities:
/// - per-block debounce timelines (one timer per block id, plus one for the
///   note title) that never interfere with each other
/// - create/update/delete sequencing against the gateway
/// - tmp-id reconciliation after creates (list + registry + timers)
/// - order recompute when blocks are added/removed
///
/// Non-responsibilities:
/// - editor UI state (which card is focused, menus, etc.)
#[derive(Clone)]
pub(crate) struct CardSyncController {
    app_state: AppContext,

    /// Ownership anchor for all block mutations; nothing is persisted
    /// while this is unset.
    note_id: RwSignal<Option<i64>>,
    /// Suppresses autosave while a note's own data is being loaded in.
    loading: RwSignal<bool>,

    pub cards: RwSignal<Vec<ItemNote>>,
    pub error: RwSignal<Option<String>>,

    /// Per-block debounce timers (block id -> timeout handle).
    timers: Arc<Mutex<TimerBook>>,
    registry: Arc<Mutex<SyncRegistry>>,

    /// Note-title timeline, independent of the block timelines.
    pub title_value: RwSignal<String>,
    title_original: RwSignal<String>,
    title_timer: RwSignal<Option<i32>>,
    title_line: Arc<Mutex<TitleTimeline>>,
}

impl CardSyncController {
    pub fn new(app_state: AppContext) -> Self {
        Self {
            app_state,
            note_id: RwSignal::new(None),
            loading: RwSignal::new(false),
            cards: RwSignal::new(vec![]),
            error: RwSignal::new(None),
            timers: Arc::new(Mutex::new(TimerBook::new())),
            registry: Arc::new(Mutex::new(SyncRegistry::new())),
            title_value: RwSignal::new(String::new()),
            title_original: RwSignal::new(String::new()),
            title_timer: RwSignal::new(None),
            title_line: Arc::new(Mutex::new(TitleTimeline::new())),
        }
    }

    pub fn note_id(&self) -> Option<i64> {
        self.note_id.get_untracked()
    }

    fn can_persist(&self) -> bool {
        self.note_id.get_untracked().is_some() && !self.loading.get_untracked()
    }

    // ---- note loading ----

    /// Load a note's blocks into the editor. The loading flag stays up until
    /// the fetched data has landed so the load itself never re-triggers
    /// saves of the data just loaded.
    pub fn load_note(&self, note: Note) {
        self.dispose_timers();
        self.registry.lock().map(|mut r| r.clear()).ok();

        self.loading.set(true);
        self.note_id.set(Some(note.id));
        self.title_value.set(note.name.clone());
        self.title_original.set(note.name.clone());
        self.error.set(None);
        self.cards.set(vec![]);

        let api = self.app_state.0.api_client.get_untracked();
        let s2 = self.clone();
        spawn_local(async move {
            match api.items_by_note(note.id).await {
                Ok(items) => {
                    if s2.note_id.get_untracked() != Some(note.id) {
                        // User navigated away while loading.
                        return;
                    }
                    if let Ok(mut reg) = s2.registry.lock() {
                        for item in &items {
                            reg.register(&item.id, SyncState::Synced);
                        }
                    }
                    s2.cards.set(items);
                }
                Err(e) => {
                    report_api_error(&s2.app_state, s2.error, &e);
                }
            }
            s2.loading.set(false);

            // View tracking, detached from the load result. `updated_at` is
            // re-sent so opening a note never counts as an edit.
            if let Err(e) = api.touch_read_at(&note, &now_iso()).await {
                report_api_error(&s2.app_state, s2.error, &e);
            }
        });
    }

    /// Reset to the empty state (no note context).
    pub fn clear(&self) {
        self.dispose_timers();
        self.registry.lock().map(|mut r| r.clear()).ok();
        self.note_id.set(None);
        self.cards.set(vec![]);
        self.title_value.set(String::new());
        self.title_original.set(String::new());
        self.error.set(None);
    }

    /// Editor teardown: cancel every pending timeline without flushing.
    /// Edits inside the quiet interval are dropped (accepted loss).
    pub fn dispose(&self) {
        self.dispose_timers();
        self.registry.lock().map(|mut r| r.clear()).ok();
    }

    fn dispose_timers(&self) {
        let Some(win) = web_sys::window() else {
            return;
        };

        if let Ok(mut book) = self.timers.lock() {
            for tid in book.drain() {
                win.clear_timeout_with_handle(tid);
            }
        }

        if let Some(tid) = self.title_timer.get_untracked() {
            win.clear_timeout_with_handle(tid);
        }
        self.title_timer.set(None);
    }

    // ---- block mutations ----

    /// Add a new card. It renders immediately under a tmp id; the create
    /// call runs in the background and reconciliation swaps the id in.
    pub fn add_card(&self, card_type: crate::models::CardType) {
        let note_id = self.note_id.get_untracked().unwrap_or_default();
        let order = self.cards.get_untracked().len() as i32;
        let block = ItemNote::new_local(new_tmp_id(), note_id, card_type, order);
        let id = block.id.clone();

        self.cards.update(|xs| xs.push(block.clone()));
        if let Ok(mut reg) = self.registry.lock() {
            reg.register(&id, SyncState::LocalOnly);
        }

        if self.can_persist() {
            self.create_block(block);
        }
    }

    pub fn update_card_title(&self, id: &str, title: String) {
        self.cards.update(|xs| {
            if let Some(c) = xs.iter_mut().find(|c| c.id == id) {
                c.title = title;
            }
        });
        self.after_edit(id);
    }

    pub fn update_card_content(&self, id: &str, content: String) {
        self.cards.update(|xs| {
            if let Some(c) = xs.iter_mut().find(|c| c.id == id) {
                c.content = Some(content);
            }
        });
        self.after_edit(id);
    }

    pub fn update_card_items(&self, id: &str, items: Vec<crate::models::ChecklistItem>) {
        self.cards.update(|xs| {
            if let Some(c) = xs.iter_mut().find(|c| c.id == id) {
                c.items = Some(items);
            }
        });
        self.after_edit(id);
    }

    /// Remove a card. Local removal is optimistic and never rolled back;
    /// the remote delete is deferred if the card's create is still in
    /// flight, so no orphaned row is left behind.
    pub fn remove_card(&self, id: &str) {
        self.cancel_timer(id);
        self.cards.update(|xs| xs.retain(|c| c.id != id));

        let action = self
            .registry
            .lock()
            .map(|mut r| r.on_remove(id))
            .unwrap_or(SyncAction::Nothing);

        match action {
            SyncAction::Delete => {
                if self.can_persist() && !is_tmp_id(id) {
                    let api = self.app_state.0.api_client.get_untracked();
                    let s2 = self.clone();
                    let id = id.to_string();
                    spawn_local(async move {
                        if let Err(e) = api.delete_item(&id).await {
                            report_api_error(&s2.app_state, s2.error, &e);
                        }
                    });
                }
            }
            // DeferDelete fires after the create settles; DropLocal has no
            // remote counterpart.
            _ => {}
        }

        self.reindex_orders();
    }

    /// Recompute `order` from array positions and schedule every shifted
    /// block through the normal debounce path.
    fn reindex_orders(&self) {
        let changes = stale_orders(&self.cards.get_untracked());
        if changes.is_empty() {
            return;
        }

        self.cards.update(|xs| {
            for (id, order) in &changes {
                if let Some(c) = xs.iter_mut().find(|c| &c.id == id) {
                    c.order = *order;
                }
            }
        });

        for (id, _) in changes {
            self.after_edit(&id);
        }
    }

    fn after_edit(&self, id: &str) {
        if !self.can_persist() {
            return;
        }

        let action = self
            .registry
            .lock()
            .map(|mut r| r.on_edit(id))
            .unwrap_or(SyncAction::Nothing);

        match action {
            SyncAction::Schedule => self.schedule(id.to_string()),
            SyncAction::Create => {
                // Earlier create failed; this edit is the retry trigger.
                if let Some(block) = self
                    .cards
                    .get_untracked()
                    .into_iter()
                    .find(|c| c.id == id)
                {
                    self.create_block(block);
                }
            }
            // Defer: an in-flight call picks the edit up when it settles.
            _ => {}
        }
    }

    // ---- debounce timelines ----

    fn cancel_timer(&self, id: &str) {
        let Some(win) = web_sys::window() else {
            return;
        };
        if let Ok(mut book) = self.timers.lock() {
            if let Some(tid) = book.disarm(id) {
                win.clear_timeout_with_handle(tid);
            }
        }
    }

    /// Arm (or reset) the debounce timeline for one block. Only this
    /// block's timer is touched; other timelines keep their deadlines.
    fn schedule(&self, id: String) {
        let Some(win) = web_sys::window() else {
            return;
        };

        if let Ok(mut book) = self.timers.lock() {
            if let Some(tid) = book.disarm(&id) {
                win.clear_timeout_with_handle(tid);
            }
        }

        let s2 = self.clone();
        let id2 = id.clone();
        let cb = wasm_bindgen::closure::Closure::once_into_js(move || {
            s2.flush_card(&id2);
        });

        let tid = win
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                QUIET_MS,
            )
            .unwrap_or(0);

        if let Ok(mut book) = self.timers.lock() {
            book.arm(&id, tid);
        }
    }

    fn flush_card(&self, id: &str) {
        if let Ok(mut book) = self.timers.lock() {
            book.disarm(id);
        }

        let action = self
            .registry
            .lock()
            .map(|mut r| r.on_flush_due(id))
            .unwrap_or(SyncAction::Nothing);

        if action == SyncAction::Update {
            self.push_update(id.to_string());
        }
    }

    /// Issue the update call carrying the block's current payload (latest
    /// edit wins). At most one call per block is in flight; a follow-up is
    /// sent when the registry reports deferred edits.
    fn push_update(&self, id: String) {
        let cards = self.cards.get_untracked();
        let Some(index) = cards.iter().position(|c| c.id == id) else {
            return;
        };
        let dto = cards[index].update_dto(index as i32);

        let api = self.app_state.0.api_client.get_untracked();
        let s2 = self.clone();
        spawn_local(async move {
            if let Err(e) = api.update_item(&id, &dto).await {
                // Remote copy stays stale; no automatic retry.
                report_api_error(&s2.app_state, s2.error, &e);
            }

            let follow_up = s2
                .registry
                .lock()
                .map(|mut r| r.on_update_settled(&id))
                .unwrap_or(SyncAction::Nothing);

            if follow_up == SyncAction::Update {
                s2.push_update(id);
            }
        });
    }

    // ---- creation & reconciliation ----

    fn create_block(&self, block: ItemNote) {
        let Some(note_id) = self.note_id.get_untracked() else {
            return;
        };

        let tmp_id = block.id.clone();
        let order = self
            .cards
            .get_untracked()
            .iter()
            .position(|c| c.id == tmp_id)
            .unwrap_or_default() as i32;
        let dto = block.create_dto(note_id, order);

        if let Ok(mut reg) = self.registry.lock() {
            reg.on_create_started(&tmp_id);
        }

        let api = self.app_state.0.api_client.get_untracked();
        let s2 = self.clone();
        spawn_local(async move {
            match api.create_item(&dto).await {
                Ok(created) => {
                    let new_id = created.id.clone();

                    // Swap the tmp id everywhere it is referenced: the
                    // ordered list, the timer registry, the sync registry.
                    s2.cards.update(|xs| {
                        if let Some(c) = xs.iter_mut().find(|c| c.id == tmp_id) {
                            c.id = new_id.clone();
                            c.created_at = created.created_at.clone();
                        }
                    });
                    s2.cancel_timer(&tmp_id);

                    let settled = s2
                        .registry
                        .lock()
                        .map(|mut r| r.on_create_ok(&tmp_id, &new_id))
                        .unwrap_or(plan::CreateSettled {
                            delete_now: false,
                            flush_edit: false,
                        });

                    if settled.delete_now {
                        // The user removed the card mid-create; delete the
                        // row the server just handed back.
                        if let Err(e) = api.delete_item(&new_id).await {
                            report_api_error(&s2.app_state, s2.error, &e);
                        }
                        return;
                    }

                    if settled.flush_edit {
                        // Edits queued against the tmp id; send them now
                        // under the reconciled id.
                        let act = s2
                            .registry
                            .lock()
                            .map(|mut r| r.on_flush_due(&new_id))
                            .unwrap_or(SyncAction::Nothing);
                        if act == SyncAction::Update {
                            s2.push_update(new_id);
                        }
                    }
                }
                Err(e) => {
                    let act = s2
                        .registry
                        .lock()
                        .map(|mut r| r.on_create_err(&tmp_id))
                        .unwrap_or(SyncAction::Nothing);

                    // The block stays local-only under its tmp id; the next
                    // edit re-attempts the create.
                    if act != SyncAction::DropLocal {
                        report_api_error(&s2.app_state, s2.error, &e);
                    }
                }
            }
        });
    }

    // ---- note title ----

    /// Title input handler: independent debounce timeline with no-op
    /// suppression against the last persisted value.
    pub fn on_title_input(&self, value: String) {
        self.title_value.set(value);

        if !self.can_persist() {
            return;
        }

        let Some(win) = web_sys::window() else {
            return;
        };
        if let Some(tid) = self.title_timer.get_untracked() {
            win.clear_timeout_with_handle(tid);
        }

        let s2 = self.clone();
        let cb = wasm_bindgen::closure::Closure::once_into_js(move || {
            s2.save_title();
        });
        let tid = win
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                QUIET_MS,
            )
            .unwrap_or(0);
        self.title_timer.set(Some(tid));
    }

    fn save_title(&self) {
        self.title_timer.set(None);

        let due = self
            .title_line
            .lock()
            .map(|mut t| t.on_flush_due())
            .unwrap_or(false);
        if !due {
            // A save is in flight; it replays this flush when it settles.
            return;
        }

        let has_note = self.note_id.get_untracked().is_some();
        let decision = plan::title_decision(
            &self.title_value.get_untracked(),
            &self.title_original.get_untracked(),
            has_note,
        );

        match decision {
            TitleAction::Skip => {}
            TitleAction::Revert => {
                self.title_value.set(self.title_original.get_untracked());
            }
            TitleAction::Save(trimmed) => {
                let Some(note_id) = self.note_id.get_untracked() else {
                    return;
                };

                self.title_line
                    .lock()
                    .map(|mut t| t.on_save_started())
                    .ok();
                let api = self.app_state.0.api_client.get_untracked();
                let s2 = self.clone();
                spawn_local(async move {
                    let dto = UpdateNoteDto {
                        name: Some(trimmed.clone()),
                        ..Default::default()
                    };
                    match api.update_note(note_id, &dto).await {
                        Ok(updated) => {
                            s2.title_original.set(trimmed);
                            s2.app_state.0.notes.update(|xs| {
                                if let Some(n) = xs.iter_mut().find(|n| n.id == note_id) {
                                    *n = updated.clone();
                                }
                            });
                            if s2.app_state.0.selected_note.get_untracked().map(|n| n.id)
                                == Some(note_id)
                            {
                                s2.app_state.0.selected_note.set(Some(updated));
                            }
                            s2.app_state.0.notify_tree_changed();
                        }
                        Err(e) => {
                            report_api_error(&s2.app_state, s2.error, &e);
                        }
                    }

                    // A flush that fired mid-save carries a newer value.
                    let follow_up = s2
                        .title_line
                        .lock()
                        .map(|mut t| t.on_save_settled())
                        .unwrap_or(false);
                    if follow_up {
                        s2.save_title();
                    }
                });
            }
        }
    }
}
