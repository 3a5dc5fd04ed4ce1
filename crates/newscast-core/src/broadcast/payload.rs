use crate::{errors::Error, Result};

/// Media attached to a content broadcast.
///
/// `Other` carries a kind the transport has no send operation for; delivering it
/// yields a failure outcome rather than an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
    Other(String),
}

impl MediaKind {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "photo" => MediaKind::Photo,
            "video" => MediaKind::Video,
            other => MediaKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::Other(s) => s,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Media {
    pub kind: MediaKind,
    /// Opaque transport handle (Telegram `file_id`).
    pub reference: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentPayload {
    pub text: String,
    pub media: Option<Media>,
}

impl ContentPayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            media: None,
        }
    }

    pub fn with_media(text: impl Into<String>, kind: MediaKind, reference: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            media: Some(Media {
                kind,
                reference: reference.into(),
            }),
        }
    }
}

/// A poll to be re-posted verbatim in every recipient chat.
///
/// Fields are private so the option-count invariant holds for every value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollPayload {
    question: String,
    options: Vec<String>,
    anonymous: bool,
    multiple_answers: bool,
    explanation: Option<String>,
    open_period_seconds: Option<u32>,
}

impl PollPayload {
    pub const MIN_OPTIONS: usize = 2;

    pub fn new(question: impl Into<String>, options: Vec<String>) -> Result<Self> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(Error::InvalidPayload("poll question is empty".to_string()));
        }
        if options.len() < Self::MIN_OPTIONS {
            return Err(Error::InvalidPayload(format!(
                "poll needs at least {} options, got {}",
                Self::MIN_OPTIONS,
                options.len()
            )));
        }
        Ok(Self {
            question,
            options,
            anonymous: true,
            multiple_answers: false,
            explanation: None,
            open_period_seconds: None,
        })
    }

    pub fn anonymous(mut self, anonymous: bool) -> Self {
        self.anonymous = anonymous;
        self
    }

    pub fn multiple_answers(mut self, multiple_answers: bool) -> Self {
        self.multiple_answers = multiple_answers;
        self
    }

    pub fn explanation(mut self, explanation: Option<String>) -> Self {
        self.explanation = explanation.filter(|s| !s.is_empty());
        self
    }

    pub fn open_period_seconds(mut self, secs: Option<u32>) -> Self {
        self.open_period_seconds = secs.filter(|s| *s > 0);
        self
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    pub fn allows_multiple_answers(&self) -> bool {
        self.multiple_answers
    }

    pub fn explanation_text(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    pub fn open_period(&self) -> Option<u32> {
        self.open_period_seconds
    }
}

/// The immutable content of one broadcast. Identical for every recipient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Content(ContentPayload),
    Poll(PollPayload),
}

impl Payload {
    pub fn kind_label(&self) -> &'static str {
        match self {
            Payload::Content(_) => "news",
            Payload::Poll(_) => "poll",
        }
    }
}

impl From<ContentPayload> for Payload {
    fn from(p: ContentPayload) -> Self {
        Payload::Content(p)
    }
}

impl From<PollPayload> for Payload {
    fn from(p: PollPayload) -> Self {
        Payload::Poll(p)
    }
}
