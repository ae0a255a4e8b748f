use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Reference to the post a comment belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostRef {
    pub id: i64,
}

/// Comment record as stored, mirrored and served over HTTP
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<PostRef>,
}

impl Comment {
    /// Create an unsaved comment (no id yet)
    pub fn new(text: impl Into<String>, creation_date: NaiveDate) -> Self {
        Self {
            id: None,
            text: Some(text.into()),
            creation_date: Some(creation_date),
            post: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Drop the identifier, e.g. before handing a copy to the store for creation
    pub fn without_id(mut self) -> Self {
        self.id = None;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_creation_date(mut self, creation_date: NaiveDate) -> Self {
        self.creation_date = Some(creation_date);
        self
    }

    pub fn with_post(mut self, post_id: i64) -> Self {
        self.post = Some(PostRef { id: post_id });
        self
    }

    /// Whether the record has been assigned an identifier by the store
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn epoch() -> NaiveDate {
        NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
    }

    #[test]
    fn test_comment_creation() {
        let comment = Comment::new("AAAAAAAAAA", epoch());

        assert_eq!(comment.id, None);
        assert_eq!(comment.text.as_deref(), Some("AAAAAAAAAA"));
        assert_eq!(comment.creation_date, Some(epoch()));
        assert!(!comment.is_persisted());
    }

    #[test]
    fn test_builder_produces_new_values() {
        let original = Comment::new("AAAAAAAAAA", epoch());
        let updated = original.clone().with_id(7).with_text("BBBBBBBBBB").with_post(3);

        assert_eq!(original.text.as_deref(), Some("AAAAAAAAAA"));
        assert_eq!(updated.id, Some(7));
        assert_eq!(updated.text.as_deref(), Some("BBBBBBBBBB"));
        assert_eq!(updated.post, Some(PostRef { id: 3 }));
        assert_eq!(updated.clone().without_id().id, None);
    }

    #[test]
    fn test_json_representation() {
        let comment = Comment::new("AAAAAAAAAA", epoch()).with_id(1);
        let value = serde_json::to_value(&comment).unwrap();

        assert_eq!(value, json!({
            "id": 1,
            "text": "AAAAAAAAAA",
            "creationDate": "1970-01-01"
        }));
    }

    #[test]
    fn test_json_accepts_missing_and_null_fields() {
        let comment: Comment = serde_json::from_value(json!({
            "id": null,
            "text": "hello",
            "post": { "id": 4 }
        }))
        .unwrap();

        assert_eq!(comment.id, None);
        assert_eq!(comment.creation_date, None);
        assert_eq!(comment.post, Some(PostRef { id: 4 }));
    }
}
