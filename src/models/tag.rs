use serde::{Deserialize, Serialize};
use crate::error::{LedgerError, LedgerResult};

/// Color used for tag types without an entry in the palette
pub const DEFAULT_TAG_COLOR: &str = "#6b7280";

/// Fixed palette keyed by tag type
const TAG_PALETTE: &[(&str, &str)] = &[
    ("tipo", "#3b82f6"),
    ("chat", "#10b981"),
    ("pessoa", "#f59e0b"),
    ("urgencia", "#ef4444"),
    ("previsto", "#8b5cf6"),
    ("demandante", "#ec4899"),
];

/// Display color for a tag type (case-insensitive)
pub fn color_for_type(tag_type: &str) -> &'static str {
    let key = tag_type.to_lowercase();
    TAG_PALETTE
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_TAG_COLOR)
}

/// Tag stored on a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Option<i64>,
    pub task_id: i64,
    #[serde(rename = "type")]
    pub tag_type: String,
    pub value: String,
    pub color: String,
}

/// Tag as supplied by the caller, before it belongs to a task.
/// It carries no color: the stored color always comes from the palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTag {
    #[serde(rename = "type")]
    pub tag_type: String,
    pub value: String,
}

impl NewTag {
    pub fn new(tag_type: &str, value: &str) -> Self {
        Self {
            tag_type: tag_type.to_string(),
            value: value.to_string(),
        }
    }

    /// Palette color for this tag's type
    pub fn color(&self) -> &'static str {
        color_for_type(&self.tag_type)
    }

    /// Parse `type:value` (value may itself contain colons)
    pub fn parse(spec: &str) -> LedgerResult<Self> {
        let (tag_type, value) = spec.split_once(':').ok_or_else(|| {
            LedgerError::validation(format!("Invalid tag '{}'. Expected type:value.", spec))
        })?;
        let tag = Self::new(tag_type.trim(), value.trim());
        tag.validate()?;
        Ok(tag)
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.tag_type.trim().is_empty() {
            return Err(LedgerError::validation("Tag type cannot be empty"));
        }
        if self.value.trim().is_empty() {
            return Err(LedgerError::validation("Tag value cannot be empty"));
        }
        Ok(())
    }
}

impl From<&Tag> for NewTag {
    fn from(tag: &Tag) -> Self {
        Self {
            tag_type: tag.tag_type.clone(),
            value: tag.value.clone(),
        }
    }
}
