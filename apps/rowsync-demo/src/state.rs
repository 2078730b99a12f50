//! Transcript state owned by the producer side of the demo.
//!
//! The state is mutated on the producer task and rendered into snapshots of
//! themed rows: one header per day, the messages of that day, and a typing
//! indicator at the very end.

use rowsync_core::{Anchor, Appearance, Entry, OrderKey, ScrollRequest, Snapshot, Themed, VisibleEdge};
use tracing::{debug, trace};

const TYPING_SECTION: u32 = u32::MAX;

/// Stable identity of a transcript row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowId {
    DayHeader(u32),
    Message(String),
    Typing,
}

/// What a transcript row displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowContent {
    DayHeader {
        label: String,
    },
    Message {
        sender: String,
        body: String,
        edited: bool,
    },
    Typing {
        names: Vec<String>,
    },
}

pub type TranscriptRow = Entry<RowId, OrderKey, Themed<RowContent>>;
pub type TranscriptSnapshot = Snapshot<RowId, OrderKey, Themed<RowContent>>;

#[derive(Debug, Clone)]
struct Message {
    event_id: String,
    day: u32,
    sender: String,
    body: String,
    edited: bool,
}

/// Chat transcript of a single room.
#[derive(Debug, Clone)]
pub struct TranscriptState {
    own_user: String,
    messages: Vec<Message>,
    typing: Vec<String>,
    appearance: Appearance,
    next_event: u64,
}

impl TranscriptState {
    pub fn new(own_user: impl Into<String>) -> Self {
        Self {
            own_user: own_user.into(),
            messages: Vec::new(),
            typing: Vec::new(),
            appearance: Appearance::default(),
            next_event: 0,
        }
    }

    pub fn appearance(&self) -> Appearance {
        self.appearance
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Append a message and return its event id. Days never go backwards.
    pub fn push_message(&mut self, day: u32, sender: &str, body: &str) -> String {
        let day = self.messages.last().map_or(day, |last| last.day.max(day));
        self.next_event += 1;
        let event_id = format!("$evt{}", self.next_event);
        trace!(%event_id, day, sender, "appending message");
        self.messages.push(Message {
            event_id: event_id.clone(),
            day,
            sender: sender.to_owned(),
            body: body.to_owned(),
            edited: false,
        });
        event_id
    }

    /// Replace a message body. Returns `false` for unknown events.
    pub fn edit_message(&mut self, event_id: &str, body: &str) -> bool {
        let Some(message) = self.messages.iter_mut().find(|m| m.event_id == event_id) else {
            return false;
        };
        message.body = body.to_owned();
        message.edited = true;
        true
    }

    /// Drop a message. An emptied day loses its header too.
    pub fn redact_message(&mut self, event_id: &str) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| m.event_id != event_id);
        before != self.messages.len()
    }

    pub fn set_typing(&mut self, names: Vec<String>) {
        self.typing = names;
    }

    pub fn set_appearance(&mut self, appearance: Appearance) {
        debug!(appearance = appearance.0, "transcript appearance changed");
        self.appearance = appearance;
    }

    /// Render the transcript as an ordered snapshot.
    pub fn snapshot(&self, scroll: ScrollRequest<RowId>) -> TranscriptSnapshot {
        let mut rows: Vec<TranscriptRow> = Vec::with_capacity(self.messages.len() + 4);
        let mut current_day = None;
        let mut index_in_day = 0u32;

        for message in &self.messages {
            if current_day != Some(message.day) {
                current_day = Some(message.day);
                index_in_day = 0;
                rows.push(
                    Entry::new(
                        RowId::DayHeader(message.day),
                        OrderKey::new(message.day, index_in_day),
                        RowContent::DayHeader {
                            label: format!("Day {}", message.day),
                        },
                    )
                    .themed(self.appearance),
                );
            }
            index_in_day += 1;
            rows.push(
                Entry::new(
                    RowId::Message(message.event_id.clone()),
                    OrderKey::new(message.day, index_in_day),
                    RowContent::Message {
                        sender: message.sender.clone(),
                        body: message.body.clone(),
                        edited: message.edited,
                    },
                )
                .themed(self.appearance),
            );
        }

        if !self.typing.is_empty() {
            rows.push(
                Entry::new(
                    RowId::Typing,
                    OrderKey::new(TYPING_SECTION, 0),
                    RowContent::Typing {
                        names: self.typing.clone(),
                    },
                )
                .themed(self.appearance),
            );
        }

        Snapshot::new(rows).with_scroll(scroll)
    }

    /// Scripted activity for step `step` of the demo run.
    ///
    /// Returns the scroll request that should accompany the next snapshot.
    pub fn run_script_step(&mut self, step: usize, theme_switch_at: Option<usize>) -> ScrollRequest<RowId> {
        if theme_switch_at == Some(step) {
            self.set_appearance(Appearance(self.appearance.0 + 1));
            return ScrollRequest::PreserveVisible(VisibleEdge::Trailing);
        }

        let day = (step / 5) as u32;
        match step % 5 {
            0 => {
                let event_id = self.push_message(day, "bob", &format!("morning #{step}"));
                ScrollRequest::Reveal {
                    stable_id: RowId::Message(event_id),
                    anchor: Anchor::End,
                }
            }
            1 => {
                self.set_typing(vec!["carol".to_owned()]);
                ScrollRequest::PreserveVisible(VisibleEdge::Trailing)
            }
            2 => {
                self.set_typing(Vec::new());
                let own_user = self.own_user.clone();
                let event_id = self.push_message(day, &own_user, &format!("reply #{step}"));
                ScrollRequest::Reveal {
                    stable_id: RowId::Message(event_id),
                    anchor: Anchor::End,
                }
            }
            3 => {
                if let Some(event_id) = self.messages.first().map(|m| m.event_id.clone()) {
                    self.edit_message(&event_id, &format!("edited at step {step}"));
                }
                ScrollRequest::None
            }
            _ => {
                if self.messages.len() > 3
                    && let Some(event_id) = self.messages.get(1).map(|m| m.event_id.clone())
                {
                    self.redact_message(&event_id);
                }
                ScrollRequest::PreserveVisible(VisibleEdge::Trailing)
            }
        }
    }
}

/// Single-line rendering used by the demo's console view.
pub fn describe_row(row: &Themed<RowContent>) -> String {
    match &row.value {
        RowContent::DayHeader { label } => format!("── {label} ──"),
        RowContent::Message {
            sender,
            body,
            edited,
        } => {
            let marker = if *edited { " (edited)" } else { "" };
            format!("{sender}: {body}{marker}")
        }
        RowContent::Typing { names } => format!("{} typing…", names.join(", ")),
    }
}
