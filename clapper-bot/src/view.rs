//! Structured reply types
//!
//! Every interaction produces a [`Reply`]. Rich messages are reduced to a
//! minimal [`View`] (title, description, fields, image, footer); buttons
//! carry affordance tokens and never hand-built identifiers.

use serde::Serialize;

/// Minimal rich message
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct View {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Interactive affordance; `token` is produced by [`crate::affordance`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Button {
    pub label: String,
    pub token: String,
    pub enabled: bool,
}

/// Response to one interaction
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<View>,
    pub buttons: Vec<Button>,
    /// Visible only to the actor
    pub ephemeral: bool,
    /// Replace the message the component belongs to instead of posting a new one
    pub update: bool,
}

impl View {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(Field {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn image(mut self, url: Option<String>) -> Self {
        self.image = url;
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

impl Button {
    pub fn new(label: impl Into<String>, token: String, enabled: bool) -> Self {
        Self {
            label: label.into(),
            token,
            enabled,
        }
    }
}

impl Reply {
    /// Public text reply
    pub fn message(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Text reply only the actor sees
    pub fn private(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ephemeral: true,
            ..Self::default()
        }
    }

    pub fn with_view(view: View) -> Self {
        Self {
            view: Some(view),
            ..Self::default()
        }
    }

    pub fn buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn updating(mut self) -> Self {
        self.update = true;
        self
    }
}

/// `7.5/10`
pub fn score_label(score: f64) -> String {
    format!("{:.1}/10", score)
}

pub fn plural(count: i64) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `...`
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_short_text() {
        assert_eq!(truncate("Heat", 10), "Heat");
        assert_eq!(truncate("", 3), "");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("Amélie Poulain", 4), "Amél...");
        assert_eq!(truncate("abcdef", 6), "abcdef");
    }

    #[test]
    fn test_score_label_and_plural() {
        assert_eq!(score_label(7.25), "7.2/10");
        assert_eq!(score_label(10.0), "10.0/10");
        assert_eq!(plural(1), "");
        assert_eq!(plural(0), "s");
    }

    #[test]
    fn test_reply_serializes_without_empty_parts() {
        let reply = Reply::private("hi");
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["content"], "hi");
        assert_eq!(json["ephemeral"], true);
        assert!(json.get("view").is_none());
    }
}
