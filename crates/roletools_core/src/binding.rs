//! Persisted bindings between chat UI elements and roles.

use crate::{ChannelId, MessageId, RoleId};
use serde::{Deserialize, Serialize};

/// Reacting to `message_id` with `emoji` grants `role_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReactionBinding {
    /// Channel holding the message.
    pub channel_id: ChannelId,
    /// Message carrying the reaction.
    pub message_id: MessageId,
    /// Emoji in its display form (unicode, or `<:name:id>` for custom emoji).
    pub emoji: String,
    /// Role toggled by the reaction.
    pub role_id: RoleId,
}

impl ReactionBinding {
    /// Whether this binding covers the reaction.
    pub fn matches(&self, message_id: MessageId, emoji: &str) -> bool {
        self.message_id == message_id && self.emoji == emoji
    }
}

/// Kind of message component.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    /// One button per role.
    #[display("button")]
    Button,
    /// A select menu offering several roles.
    #[display("select")]
    Select,
}

/// A named button or select menu bound to roles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentBinding {
    /// Unique name within the guild, used as custom id prefix.
    pub name: String,
    /// Button or select menu.
    pub kind: ComponentKind,
    /// Roles offered. Buttons carry exactly one.
    pub role_ids: Vec<RoleId>,
    /// Label shown on the component.
    pub label: Option<String>,
}

impl ComponentBinding {
    /// Button toggling a single role.
    pub fn button(name: impl Into<String>, role_id: RoleId) -> Self {
        Self {
            name: name.into(),
            kind: ComponentKind::Button,
            role_ids: vec![role_id],
            label: None,
        }
    }

    /// Select menu offering several roles.
    pub fn select(name: impl Into<String>, role_ids: Vec<RoleId>) -> Self {
        Self {
            name: name.into(),
            kind: ComponentKind::Select,
            role_ids,
            label: None,
        }
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Custom ids this binding answers to.
    pub fn custom_ids(&self) -> Vec<String> {
        match self.kind {
            ComponentKind::Button => self
                .role_ids
                .iter()
                .map(|role| ComponentId::Button { name: self.name.clone(), role_id: *role }.encode())
                .collect(),
            ComponentKind::Select => {
                vec![ComponentId::Select { name: self.name.clone() }.encode()]
            }
        }
    }
}

/// Decoded component custom id.
///
/// Buttons encode as `"{name}-{role_id}"`, select menus as `"{name}-select"`.
///
/// ```
/// use roletools_core::{ComponentId, RoleId};
///
/// let id = ComponentId::parse("colours-1234").unwrap();
/// assert_eq!(id, ComponentId::Button { name: "colours".into(), role_id: RoleId(1234) });
/// assert_eq!(id.encode(), "colours-1234");
/// assert_eq!(ComponentId::parse("colours"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComponentId {
    /// A role button.
    Button {
        /// Binding name
        name: String,
        /// Role toggled by the button
        role_id: RoleId,
    },
    /// A role select menu.
    Select {
        /// Binding name
        name: String,
    },
}

impl ComponentId {
    const SELECT_SUFFIX: &'static str = "select";

    /// Parse a custom id. Names may themselves contain dashes.
    pub fn parse(custom_id: &str) -> Option<Self> {
        let (name, tail) = custom_id.rsplit_once('-')?;
        if name.is_empty() {
            return None;
        }
        if tail == Self::SELECT_SUFFIX {
            return Some(Self::Select { name: name.to_string() });
        }
        let role_id = tail.parse::<u64>().ok()?;
        Some(Self::Button {
            name: name.to_string(),
            role_id: RoleId(role_id),
        })
    }

    /// Encode back into a custom id.
    pub fn encode(&self) -> String {
        match self {
            Self::Button { name, role_id } => format!("{name}-{role_id}"),
            Self::Select { name } => format!("{name}-{}", Self::SELECT_SUFFIX),
        }
    }

    /// Binding name.
    pub fn name(&self) -> &str {
        match self {
            Self::Button { name, .. } | Self::Select { name } => name,
        }
    }
}
