use serde::{Deserialize, Serialize};

/// Backend auth user object.
///
/// Supabase returns this under `user`; we only rely on `id` and keep the
/// rest flexible to avoid breaking when backend fields evolve.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct AccountInfo {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Folder {
    pub id: i64,
    pub name: String,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Note {
    pub id: i64,
    pub folder_id: i64,
    pub name: String,
    #[serde(default)]
    pub user_id: String,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Bumped on open without touching `updated_at` (view tracking must not
    /// count as a content modification).
    #[serde(default)]
    pub read_at: Option<String>,
}

#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub(crate) enum CardType {
    Text,
    Checklist,
    Paragraph,
    Link,
    Highlight,
}

impl CardType {
    /// Text-flavored cards carry `content` + `text_type`; checklists carry
    /// an embedded item array instead.
    pub fn is_text_type(&self) -> bool {
        matches!(self, Self::Text | Self::Paragraph | Self::Link | Self::Highlight)
    }
}

#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub(crate) enum TextType {
    Paragraph,
    Link,
    Highlight,
}

/// Embedded checklist entry. Stored as a JSON array on the parent block,
/// never as its own row.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct ChecklistItem {
    pub id: String,
    pub text: String,
    pub checked: bool,
}

/// One content block inside a note.
///
/// `id` is a UUID string. Locally-added blocks start with a `tmp-` prefixed
/// id until the create call resolves and reconciliation swaps it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct ItemNote {
    pub id: String,
    pub note_id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub card_type: CardType,
    #[serde(default)]
    pub text_type: Option<TextType>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<ChecklistItem>>,
    pub order: i32,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Create payload for `item_note`. The id is omitted so the server assigns
/// one; reconciliation then replaces the local `tmp-` id with it.
#[derive(Serialize, Clone, Debug)]
pub(crate) struct CreateItemDto {
    pub note_id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub card_type: CardType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_type: Option<TextType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ChecklistItem>>,
    pub order: i32,
}

#[derive(Serialize, Clone, Debug, Default)]
pub(crate) struct UpdateItemDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub card_type: Option<CardType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_type: Option<TextType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ChecklistItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct CreateNoteDto {
    pub name: String,
    pub folder_id: i64,
}

#[derive(Serialize, Clone, Debug, Default)]
pub(crate) struct UpdateNoteDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<String>,
    /// Re-sent alongside `read_at` so a view touch keeps the previous value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl ItemNote {
    /// Fresh local block for the add-card menu. Text-flavored cards get
    /// empty content; checklists start with one unchecked entry.
    pub fn new_local(id: String, note_id: i64, card_type: CardType, order: i32) -> Self {
        let text_type = match card_type {
            CardType::Paragraph => Some(TextType::Paragraph),
            CardType::Link => Some(TextType::Link),
            CardType::Highlight => Some(TextType::Highlight),
            CardType::Text | CardType::Checklist => None,
        };

        let (content, items) = if card_type == CardType::Checklist {
            (
                None,
                Some(vec![ChecklistItem {
                    id: crate::util::new_uuid(),
                    text: String::new(),
                    checked: false,
                }]),
            )
        } else {
            (Some(String::new()), None)
        };

        Self {
            id,
            note_id,
            title: "New card".to_string(),
            card_type,
            text_type,
            content,
            items,
            order,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn update_dto(&self, order: i32) -> UpdateItemDto {
        UpdateItemDto {
            title: Some(self.title.clone()),
            card_type: Some(self.card_type),
            text_type: self.text_type,
            content: self.content.clone(),
            items: self.items.clone(),
            order: Some(order),
        }
    }

    pub fn create_dto(&self, note_id: i64, order: i32) -> CreateItemDto {
        CreateItemDto {
            note_id,
            title: self.title.clone(),
            card_type: self.card_type,
            text_type: self.text_type,
            content: self.content.clone(),
            items: self.items.clone(),
            order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_note_row_deserializes() {
        // Row shape as PostgREST returns it for `item_note`.
        let json = r#"{
            "id": "3b2a6c1d-5e4f-4a1b-9c8d-7e6f5a4b3c2d",
            "note_id": 12,
            "title": "Groceries",
            "type": "checklist",
            "items": [{"id": "a", "text": "Milk", "checked": false}],
            "order": 0,
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-02T10:00:00Z"
        }"#;
        let item: ItemNote = serde_json::from_str(json).expect("row should parse");
        assert_eq!(item.card_type, CardType::Checklist);
        assert_eq!(item.items.as_ref().map(|xs| xs.len()), Some(1));
        assert!(item.content.is_none());
        assert!(item.text_type.is_none());
    }

    #[test]
    fn create_dto_omits_id_and_empty_fields() {
        let block = ItemNote::new_local("tmp-x".to_string(), 7, CardType::Paragraph, 0);
        let v = serde_json::to_value(block.create_dto(7, 0)).expect("should serialize");

        assert!(v.get("id").is_none());
        assert_eq!(v["note_id"], 7);
        assert_eq!(v["type"], "paragraph");
        assert_eq!(v["text_type"], "paragraph");
        assert_eq!(v["content"], "");
        assert!(v.get("items").is_none());
        assert_eq!(v["order"], 0);
    }

    #[test]
    fn read_at_touch_preserves_updated_at() {
        let dto = UpdateNoteDto {
            read_at: Some("2024-06-01T00:00:00Z".to_string()),
            updated_at: Some("2024-05-20T12:00:00Z".to_string()),
            ..Default::default()
        };
        let v = serde_json::to_value(dto).expect("should serialize");
        assert_eq!(v["read_at"], "2024-06-01T00:00:00Z");
        assert_eq!(v["updated_at"], "2024-05-20T12:00:00Z");
        assert!(v.get("name").is_none());
    }

    #[test]
    fn note_row_tolerates_missing_optionals() {
        let json = r#"{"id": 3, "folder_id": 1, "name": "Ideas", "created_at": "2024-01-01T00:00:00Z"}"#;
        let note: Note = serde_json::from_str(json).expect("row should parse");
        assert!(note.updated_at.is_none());
        assert!(note.read_at.is_none());
        assert!(note.user_id.is_empty());
    }

    #[test]
    fn card_type_display_matches_wire_names() {
        assert_eq!(CardType::Highlight.to_string(), "highlight");
        assert_eq!(TextType::Link.to_string(), "link");
        assert!(CardType::Link.is_text_type());
        assert!(!CardType::Checklist.is_text_type());
    }
}
