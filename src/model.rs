use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

pub type ListId = String;
pub type CardId = String;

/// A named participant, identified by initials within a single list.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub initials: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    High,
    Medium,
    Low,
    #[default]
    #[serde(rename = "")]
    None,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Card {
    pub id: CardId,
    pub text: String,
    pub description: String,
    pub labels: Vec<String>,
    pub members: Vec<Member>,
    /// ISO date `YYYY-MM-DD`, or empty for no due date.
    pub due: String,
    pub priority: Priority,
    pub color: String,
    /// Self-describing data URL holding the attachment payload.
    pub attachment: Option<String>,
    pub attachment_type: String,
    pub attachment_name: String,
}

impl Default for Card {
    fn default() -> Self {
        Card {
            id: String::new(),
            text: String::new(),
            description: String::new(),
            labels: Vec::new(),
            members: Vec::new(),
            due: String::new(),
            priority: Priority::None,
            color: String::new(),
            attachment: None,
            attachment_type: String::new(),
            attachment_name: String::new(),
        }
    }
}

impl Card {
    pub fn new(text: impl Into<String>) -> Self {
        Card {
            id: generate_id(),
            text: text.into(),
            ..Card::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct List {
    pub id: ListId,
    pub title: String,
    /// Background override; empty means the default color.
    pub color: String,
    pub members: Vec<Member>,
    pub cards: Vec<Card>,
}

impl Default for List {
    fn default() -> Self {
        List {
            id: String::new(),
            title: String::new(),
            color: String::new(),
            members: Vec::new(),
            cards: Vec::new(),
        }
    }
}

impl List {
    pub fn new(title: impl Into<String>) -> Self {
        List {
            id: generate_id(),
            title: title.into(),
            ..List::default()
        }
    }

    pub fn find_card(&self, card_id: &str) -> Option<usize> {
        self.cards.iter().position(|c| c.id == card_id)
    }

    /// Adds a member unless one with the same initials already exists.
    /// The duplicate check is case-insensitive; initials are stored as given.
    pub fn add_member(&mut self, member: Member) -> bool {
        if self
            .members
            .iter()
            .any(|m| m.initials.eq_ignore_ascii_case(&member.initials))
        {
            return false;
        }
        self.members.push(member);
        true
    }
}

/// Partial update for a list; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ListPatch {
    pub title: Option<String>,
    pub color: Option<String>,
    pub members: Option<Vec<Member>>,
}

#[derive(thiserror::Error, Debug)]
pub enum BoardError {
    #[error("list not found: {0}")]
    ListNotFound(String),
    #[error("card not found: {0}")]
    CardNotFound(String),
    #[error("title is required")]
    EmptyTitle,
}

/// The whole board: an ordered sequence of lists. Display order is storage
/// order, so it serializes as a bare JSON array.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct Board {
    pub lists: Vec<List>,
}

impl Board {
    pub fn starter() -> Self {
        let mut guide = List::new("Getting Started");
        guide.members.push(Member {
            name: "Anshu Kumar".into(),
            initials: "AK".into(),
        });
        let mut welcome = Card::new("New to tacks? Start here");
        welcome.description = "Welcome".into();
        welcome.labels.push("#80d8ff".into());
        welcome.members = guide.members.clone();
        welcome.priority = Priority::Medium;
        guide.cards.push(welcome);

        let mut today = List::new("Today");
        today.color = "#7a5b0a".into();
        let mut week = List::new("This Week");
        week.color = "#125a44".into();
        let mut later = List::new("Later");
        later.color = "#0f0f0f".into();

        Board {
            lists: vec![guide, today, week, later],
        }
    }

    pub fn find_list(&self, list_id: &str) -> Option<usize> {
        self.lists.iter().position(|l| l.id == list_id)
    }

    pub fn list(&self, list_id: &str) -> Option<&List> {
        self.lists.iter().find(|l| l.id == list_id)
    }

    pub fn card(&self, list_id: &str, card_id: &str) -> Option<&Card> {
        self.list(list_id)?.cards.iter().find(|c| c.id == card_id)
    }

    /// Appends a new empty list. A no-op when the title is empty; the caller
    /// is responsible for prompting/validation.
    pub fn add_list(&mut self, title: &str) -> bool {
        if title.is_empty() {
            return false;
        }
        self.lists.push(List::new(title));
        true
    }

    /// Merges `patch` into the identified list. A no-op when the list is
    /// missing.
    pub fn update_list(&mut self, list_id: &str, patch: ListPatch) -> bool {
        let Some(list) = self.lists.iter_mut().find(|l| l.id == list_id) else {
            return false;
        };
        if let Some(title) = patch.title {
            list.title = title;
        }
        if let Some(color) = patch.color {
            list.color = color;
        }
        if let Some(members) = patch.members {
            list.members = members;
        }
        true
    }

    /// Removes the list and all of its cards. Irreversible; the caller must
    /// confirm intent.
    pub fn delete_list(&mut self, list_id: &str) -> bool {
        let before = self.lists.len();
        self.lists.retain(|l| l.id != list_id);
        self.lists.len() != before
    }

    /// Removes the list at `from` and reinserts it at `to` in one pass.
    /// Both indices are positions in the current order; out-of-range input
    /// is a no-op rather than a panic.
    pub fn move_list(&mut self, from: usize, to: usize) -> bool {
        if from == to || from >= self.lists.len() || to >= self.lists.len() {
            return false;
        }
        let list = self.lists.remove(from);
        self.lists.insert(to, list);
        true
    }

    /// Replaces the card in place when a card with the same ID already
    /// exists in the target list, otherwise appends it. Afterwards, every
    /// member referenced by the card that is absent (by initials) from the
    /// list's member set is added to the list.
    pub fn save_card(&mut self, card: Card, list_id: &str) -> bool {
        let Some(list) = self.lists.iter_mut().find(|l| l.id == list_id) else {
            return false;
        };
        let members = card.members.clone();
        match list.find_card(&card.id) {
            Some(idx) => list.cards[idx] = card,
            None => list.cards.push(card),
        }
        for member in members {
            list.add_member(member);
        }
        true
    }

    pub fn delete_card(&mut self, card_id: &str, list_id: &str) -> bool {
        let Some(list) = self.lists.iter_mut().find(|l| l.id == list_id) else {
            return false;
        };
        let before = list.cards.len();
        list.cards.retain(|c| c.id != card_id);
        list.cards.len() != before
    }

    /// Atomically relocates a card: removed from `from_list_id` first, then
    /// inserted at `to_index` in `to_list_id`. For a same-list move the index
    /// is therefore interpreted against the sequence after removal. The
    /// index is clamped to the destination length; missing lists or a
    /// missing card make this a no-op.
    pub fn move_card(
        &mut self,
        card_id: &str,
        from_list_id: &str,
        to_list_id: &str,
        to_index: usize,
    ) -> bool {
        let Some(from_idx) = self.find_list(from_list_id) else {
            return false;
        };
        let Some(to_idx) = self.find_list(to_list_id) else {
            return false;
        };
        let Some(card_idx) = self.lists[from_idx].find_card(card_id) else {
            return false;
        };
        let card = self.lists[from_idx].cards.remove(card_idx);
        let dest = &mut self.lists[to_idx].cards;
        dest.insert(to_index.min(dest.len()), card);
        true
    }
}

pub fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect()
}
