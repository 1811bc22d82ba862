//! Pure decision logic for the block autosave engine.
//!
//! The controller in `sync::mod` owns timers and network calls; everything
//! that decides *what* to do next for a block lives here so it can be
//! tested natively, without a browser event loop.

use crate::models::ItemNote;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SyncState {
    /// Exists only in memory under a tmp id; no remote counterpart yet.
    LocalOnly,
    /// Create call in flight.
    Creating,
    Synced,
    /// Update call in flight.
    Updating,
}

#[derive(Clone, Copy, Debug, Default)]
struct BlockSync {
    state: Option<SyncState>,
    /// An edit arrived that the current in-flight call will not carry.
    dirty: bool,
    /// The user removed the block while its create was still in flight.
    delete_requested: bool,
}

/// What the controller should do in response to an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SyncAction {
    /// Issue the create call for this (tmp-id) block.
    Create,
    /// Arm or reset the block's debounce timeline.
    Schedule,
    /// Edit captured; a pending or in-flight call will pick it up.
    Defer,
    /// Issue an update call now, carrying the block's current payload.
    Update,
    /// Issue a remote delete now.
    Delete,
    /// Hold the delete until the in-flight create settles.
    DeferDelete,
    /// Nothing remote to do (block never reached the server).
    DropLocal,
    Nothing,
}

/// Outcome of a successful create, after the tmp id has been re-keyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CreateSettled {
    /// A remove was queued during the create; delete the new id right away.
    pub delete_now: bool,
    /// Edits queued against the tmp id; flush them under the new id.
    pub flush_edit: bool,
}

/// Per-block sync bookkeeping keyed by block id.
///
/// Keys follow the block's identity through reconciliation: the tmp-id entry
/// is moved, never duplicated, so no reference to the old id survives.
#[derive(Default)]
pub(crate) struct SyncRegistry {
    blocks: HashMap<String, BlockSync>,
}

impl SyncRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: &str, state: SyncState) {
        self.blocks.insert(
            id.to_string(),
            BlockSync {
                state: Some(state),
                ..Default::default()
            },
        );
    }

    pub fn contains(&self, id: &str) -> bool {
        self.blocks.contains_key(id)
    }

    pub fn state(&self, id: &str) -> Option<SyncState> {
        self.blocks.get(id).and_then(|b| b.state)
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    pub fn on_create_started(&mut self, id: &str) {
        if let Some(b) = self.blocks.get_mut(id) {
            b.state = Some(SyncState::Creating);
        }
    }

    /// Reconciliation: move the entry from the tmp id to the server id.
    pub fn on_create_ok(&mut self, tmp_id: &str, new_id: &str) -> CreateSettled {
        let Some(mut b) = self.blocks.remove(tmp_id) else {
            return CreateSettled {
                delete_now: false,
                flush_edit: false,
            };
        };

        let settled = CreateSettled {
            delete_now: b.delete_requested,
            flush_edit: b.dirty && !b.delete_requested,
        };

        if b.delete_requested {
            // The block is already gone locally; nothing left to track.
            return settled;
        }

        b.state = Some(SyncState::Synced);
        b.dirty = false;
        self.blocks.insert(new_id.to_string(), b);
        settled
    }

    /// Create failed: the block stays local-only under its tmp id. If a
    /// remove was queued there is no remote row to delete either.
    pub fn on_create_err(&mut self, id: &str) -> SyncAction {
        let Some(b) = self.blocks.get_mut(id) else {
            return SyncAction::Nothing;
        };

        if b.delete_requested {
            self.blocks.remove(id);
            return SyncAction::DropLocal;
        }

        b.state = Some(SyncState::LocalOnly);
        SyncAction::Nothing
    }

    /// A field edit. The controller mutates the block list first, then asks
    /// what to do about persistence.
    pub fn on_edit(&mut self, id: &str) -> SyncAction {
        let Some(b) = self.blocks.get_mut(id) else {
            return SyncAction::Nothing;
        };

        match b.state {
            // Create failed earlier; the edit is the retry trigger.
            Some(SyncState::LocalOnly) => SyncAction::Create,
            Some(SyncState::Creating) | Some(SyncState::Updating) => {
                b.dirty = true;
                SyncAction::Defer
            }
            Some(SyncState::Synced) => SyncAction::Schedule,
            None => SyncAction::Nothing,
        }
    }

    /// The debounce timeline fired for this block.
    pub fn on_flush_due(&mut self, id: &str) -> SyncAction {
        let Some(b) = self.blocks.get_mut(id) else {
            return SyncAction::Nothing;
        };

        match b.state {
            Some(SyncState::Synced) => {
                b.state = Some(SyncState::Updating);
                SyncAction::Update
            }
            Some(SyncState::Creating) | Some(SyncState::Updating) => {
                b.dirty = true;
                SyncAction::Defer
            }
            _ => SyncAction::Nothing,
        }
    }

    /// An update call settled (either way; failures keep the stale remote
    /// copy and are not retried).
    pub fn on_update_settled(&mut self, id: &str) -> SyncAction {
        let Some(b) = self.blocks.get_mut(id) else {
            return SyncAction::Nothing;
        };

        b.state = Some(SyncState::Synced);
        if b.dirty {
            b.dirty = false;
            b.state = Some(SyncState::Updating);
            return SyncAction::Update;
        }
        SyncAction::Nothing
    }

    /// The user removed the block. Local removal is optimistic and has
    /// already happened; decide what the remote side needs.
    pub fn on_remove(&mut self, id: &str) -> SyncAction {
        let Some(b) = self.blocks.get_mut(id) else {
            return SyncAction::Nothing;
        };

        match b.state {
            Some(SyncState::Creating) => {
                // Deleting now would race the create and orphan the row the
                // server is about to hand back. Settle the create first.
                b.delete_requested = true;
                SyncAction::DeferDelete
            }
            Some(SyncState::LocalOnly) => {
                self.blocks.remove(id);
                SyncAction::DropLocal
            }
            Some(SyncState::Synced) | Some(SyncState::Updating) => {
                self.blocks.remove(id);
                SyncAction::Delete
            }
            None => SyncAction::Nothing,
        }
    }
}

/// Blocks whose persisted `order` no longer matches their array position.
/// Returned as `(id, new_order)`; each one goes through the normal debounce
/// path, since there is no bulk-reorder call.
pub(crate) fn stale_orders(cards: &[ItemNote]) -> Vec<(String, i32)> {
    cards
        .iter()
        .enumerate()
        .filter(|(i, c)| c.order != *i as i32)
        .map(|(i, c)| (c.id.clone(), i as i32))
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TitleAction {
    /// Unchanged or no note context; never issues a call.
    Skip,
    /// Empty after trimming; restore the last known-good value locally.
    Revert,
    Save(String),
}

/// Gate for the note-title timeline: non-empty trimmed value, different
/// from the last persisted value, valid note context.
pub(crate) fn title_decision(current: &str, last_persisted: &str, has_note: bool) -> TitleAction {
    if !has_note {
        return TitleAction::Skip;
    }

    let trimmed = current.trim();
    if trimmed.is_empty() {
        return TitleAction::Revert;
    }

    if trimmed == last_persisted {
        return TitleAction::Skip;
    }

    TitleAction::Save(trimmed.to_string())
}

/// In-flight bookkeeping for the title timeline, mirroring the per-block
/// `dirty` bit: a flush that fires while a save is outstanding is queued
/// and replayed when the save settles, so the newest title always lands.
#[derive(Default)]
pub(crate) struct TitleTimeline {
    saving: bool,
    /// A flush fired that the in-flight save will not carry.
    dirty: bool,
}

impl TitleTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// The debounce timer fired. Returns whether the save may run now.
    pub fn on_flush_due(&mut self) -> bool {
        if self.saving {
            self.dirty = true;
            return false;
        }
        true
    }

    pub fn on_save_started(&mut self) {
        self.saving = true;
    }

    /// The save settled (either way). Returns whether a queued flush must
    /// be replayed.
    pub fn on_save_settled(&mut self) -> bool {
        self.saving = false;
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CardType;

    fn card(id: &str, order: i32) -> ItemNote {
        let mut c = ItemNote::new_local(id.to_string(), 1, CardType::Paragraph, order);
        c.order = order;
        c
    }

    #[test]
    fn create_ok_rekeys_and_leaves_no_tmp_reference() {
        let mut reg = SyncRegistry::new();
        reg.register("tmp-a", SyncState::LocalOnly);
        reg.on_create_started("tmp-a");

        let settled = reg.on_create_ok("tmp-a", "real-a");
        assert!(!settled.delete_now);
        assert!(!settled.flush_edit);

        assert!(!reg.contains("tmp-a"));
        assert_eq!(reg.state("real-a"), Some(SyncState::Synced));
    }

    #[test]
    fn edit_while_creating_is_deferred_then_flushed_under_new_id() {
        let mut reg = SyncRegistry::new();
        reg.register("tmp-a", SyncState::LocalOnly);
        reg.on_create_started("tmp-a");

        // Updates against a never-persisted id would fail; the edit must wait.
        assert_eq!(reg.on_edit("tmp-a"), SyncAction::Defer);

        let settled = reg.on_create_ok("tmp-a", "real-a");
        assert!(settled.flush_edit);
        assert_eq!(reg.state("real-a"), Some(SyncState::Synced));
    }

    #[test]
    fn remove_during_create_defers_the_delete() {
        let mut reg = SyncRegistry::new();
        reg.register("tmp-a", SyncState::LocalOnly);
        reg.on_create_started("tmp-a");

        assert_eq!(reg.on_remove("tmp-a"), SyncAction::DeferDelete);

        // Create resolves; the queued delete fires against the real id and
        // nothing is tracked afterwards.
        let settled = reg.on_create_ok("tmp-a", "real-a");
        assert!(settled.delete_now);
        assert!(!settled.flush_edit);
        assert!(!reg.contains("real-a"));
        assert!(!reg.contains("tmp-a"));
    }

    #[test]
    fn remove_after_failed_create_has_nothing_remote() {
        let mut reg = SyncRegistry::new();
        reg.register("tmp-a", SyncState::LocalOnly);
        reg.on_create_started("tmp-a");
        reg.on_remove("tmp-a");

        assert_eq!(reg.on_create_err("tmp-a"), SyncAction::DropLocal);
        assert!(!reg.contains("tmp-a"));
    }

    #[test]
    fn failed_create_retries_on_next_edit() {
        let mut reg = SyncRegistry::new();
        reg.register("tmp-a", SyncState::LocalOnly);
        reg.on_create_started("tmp-a");
        reg.on_create_err("tmp-a");

        assert_eq!(reg.state("tmp-a"), Some(SyncState::LocalOnly));
        assert_eq!(reg.on_edit("tmp-a"), SyncAction::Create);
    }

    #[test]
    fn synced_edit_schedules_and_flush_updates() {
        let mut reg = SyncRegistry::new();
        reg.register("a", SyncState::Synced);

        assert_eq!(reg.on_edit("a"), SyncAction::Schedule);
        assert_eq!(reg.on_flush_due("a"), SyncAction::Update);
        assert_eq!(reg.state("a"), Some(SyncState::Updating));
    }

    #[test]
    fn edit_during_inflight_update_sends_exactly_one_follow_up() {
        let mut reg = SyncRegistry::new();
        reg.register("a", SyncState::Synced);
        reg.on_flush_due("a");

        // Two edits land while the call is in flight; latest-payload-wins
        // means they collapse into one follow-up.
        assert_eq!(reg.on_edit("a"), SyncAction::Defer);
        assert_eq!(reg.on_edit("a"), SyncAction::Defer);

        assert_eq!(reg.on_update_settled("a"), SyncAction::Update);
        // The follow-up settles clean.
        assert_eq!(reg.on_update_settled("a"), SyncAction::Nothing);
        assert_eq!(reg.state("a"), Some(SyncState::Synced));
    }

    #[test]
    fn remove_synced_block_deletes_remotely() {
        let mut reg = SyncRegistry::new();
        reg.register("a", SyncState::Synced);
        assert_eq!(reg.on_remove("a"), SyncAction::Delete);
        assert!(!reg.contains("a"));
    }

    #[test]
    fn events_for_unknown_blocks_are_ignored() {
        let mut reg = SyncRegistry::new();
        assert_eq!(reg.on_edit("ghost"), SyncAction::Nothing);
        assert_eq!(reg.on_flush_due("ghost"), SyncAction::Nothing);
        assert_eq!(reg.on_remove("ghost"), SyncAction::Nothing);
        assert_eq!(reg.on_update_settled("ghost"), SyncAction::Nothing);
    }

    #[test]
    fn stale_orders_after_removal_shift_later_blocks_down() {
        // Blocks at positions > k get order decremented by exactly 1.
        let cards = vec![card("a", 0), card("c", 2), card("d", 3)];
        let changes = stale_orders(&cards);
        assert_eq!(
            changes,
            vec![("c".to_string(), 1), ("d".to_string(), 2)]
        );
    }

    #[test]
    fn stale_orders_is_empty_when_contiguous() {
        let cards = vec![card("a", 0), card("b", 1)];
        assert!(stale_orders(&cards).is_empty());
    }

    #[test]
    fn two_blocks_edited_back_to_back_flush_independently() {
        let mut reg = SyncRegistry::new();
        reg.register("a", SyncState::Synced);
        reg.register("b", SyncState::Synced);

        assert_eq!(reg.on_edit("a"), SyncAction::Schedule);
        assert_eq!(reg.on_edit("b"), SyncAction::Schedule);

        // Each deadline fires on its own; one update call per block, and
        // flushing one leaves the other's pending state untouched.
        assert_eq!(reg.on_flush_due("a"), SyncAction::Update);
        assert_eq!(reg.state("b"), Some(SyncState::Synced));
        assert_eq!(reg.on_flush_due("b"), SyncAction::Update);

        assert_eq!(reg.on_update_settled("a"), SyncAction::Nothing);
        assert_eq!(reg.on_update_settled("b"), SyncAction::Nothing);
    }

    #[test]
    fn title_gate() {
        assert_eq!(title_decision("  ", "Old", true), TitleAction::Revert);
        assert_eq!(title_decision("Old", "Old", true), TitleAction::Skip);
        assert_eq!(title_decision("Old", "Old", false), TitleAction::Skip);
        assert_eq!(
            title_decision("  New  ", "Old", true),
            TitleAction::Save("New".to_string())
        );
    }

    #[test]
    fn title_flush_during_inflight_save_is_replayed_after_it_settles() {
        let mut line = TitleTimeline::new();
        assert!(line.on_flush_due());
        line.on_save_started();

        // The timer fires again while the first save is still out; that
        // edit must not be dropped.
        assert!(!line.on_flush_due());

        assert!(line.on_save_settled());

        // The replayed flush runs and settles clean.
        assert!(line.on_flush_due());
        line.on_save_started();
        assert!(!line.on_save_settled());
    }
}
