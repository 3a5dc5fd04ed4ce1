/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric). Negative for groups and channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChatId(pub i64);

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Whether a registered chat is a group (group/supergroup/channel) or a private chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecipientKind {
    Group,
    Direct,
}

impl RecipientKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecipientKind::Group => "group",
            RecipientKind::Direct => "direct",
        }
    }

    /// Parse the stored kind. Telegram chat type names are accepted as well.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "group" | "supergroup" | "channel" => Some(RecipientKind::Group),
            "direct" | "private" => Some(RecipientKind::Direct),
            _ => None,
        }
    }
}

/// One addressable broadcast destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recipient {
    pub id: ChatId,
    pub kind: RecipientKind,
    pub display_name: String,
}

impl Recipient {
    pub fn new(id: ChatId, kind: RecipientKind, display_name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            display_name: display_name.into(),
        }
    }
}
