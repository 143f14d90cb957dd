//! Pure filtering over the board: text search, label selection and
//! due-date windows. Never mutates the store; callers re-run it after every
//! mutation to derive the displayed subset.

use crate::model::{Board, Card};
use chrono::{Days, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DueFilter {
    #[default]
    All,
    Overdue,
    Today,
    Week,
}

impl DueFilter {
    pub fn label(&self) -> &'static str {
        match self {
            DueFilter::All => "all",
            DueFilter::Overdue => "overdue",
            DueFilter::Today => "today",
            DueFilter::Week => "week",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "all" => Some(DueFilter::All),
            "overdue" => Some(DueFilter::Overdue),
            "today" => Some(DueFilter::Today),
            "week" => Some(DueFilter::Week),
            _ => None,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            DueFilter::All => DueFilter::Overdue,
            DueFilter::Overdue => DueFilter::Today,
            DueFilter::Today => DueFilter::Week,
            DueFilter::Week => DueFilter::All,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub query: String,
    pub labels: Vec<String>,
    pub due: DueFilter,
}

impl FilterCriteria {
    pub fn is_active(&self) -> bool {
        !self.query.is_empty() || !self.labels.is_empty() || self.due != DueFilter::All
    }

    pub fn clear(&mut self) {
        *self = FilterCriteria::default();
    }
}

/// Derives the filtered view of `board`. With no active criteria the board
/// is returned unchanged, empty lists included; with any active criterion
/// each list keeps only its matching cards and lists left with none are
/// dropped entirely. `today` is the local calendar day the due windows are
/// anchored to.
pub fn filter_board(board: &Board, criteria: &FilterCriteria, today: NaiveDate) -> Board {
    if !criteria.is_active() {
        return board.clone();
    }
    let lists = board
        .lists
        .iter()
        .map(|list| {
            let mut filtered = list.clone();
            filtered.cards.retain(|card| card_matches(card, criteria, today));
            filtered
        })
        .filter(|list| !list.cards.is_empty())
        .collect();
    Board { lists }
}

/// Every distinct label on the board, in first-seen order.
pub fn all_labels(board: &Board) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for list in &board.lists {
        for card in &list.cards {
            for label in &card.labels {
                if !labels.contains(label) {
                    labels.push(label.clone());
                }
            }
        }
    }
    labels
}

fn card_matches(card: &Card, criteria: &FilterCriteria, today: NaiveDate) -> bool {
    search_matches(card, &criteria.query)
        && label_matches(card, &criteria.labels)
        && due_matches(&card.due, criteria.due, today)
}

fn search_matches(card: &Card, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    card.text.to_lowercase().contains(&needle)
        || card.description.to_lowercase().contains(&needle)
        || card.members.iter().any(|m| {
            m.name.to_lowercase().contains(&needle) || m.initials.to_lowercase().contains(&needle)
        })
}

fn label_matches(card: &Card, selected: &[String]) -> bool {
    selected.is_empty() || card.labels.iter().any(|l| selected.contains(l))
}

/// Empty due dates always pass; a non-empty date that does not parse as
/// `YYYY-MM-DD` fails every window except `All`.
fn due_matches(due: &str, filter: DueFilter, today: NaiveDate) -> bool {
    if filter == DueFilter::All || due.is_empty() {
        return true;
    }
    let Ok(date) = NaiveDate::parse_from_str(due, "%Y-%m-%d") else {
        return false;
    };
    match filter {
        DueFilter::All => true,
        DueFilter::Overdue => date < today,
        DueFilter::Today => date == today,
        DueFilter::Week => {
            date >= today && today.checked_add_days(Days::new(7)).is_some_and(|end| date <= end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Card, List, Member};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 23).unwrap()
    }

    fn card(text: &str, due: &str) -> Card {
        Card {
            due: due.into(),
            ..Card::new(text)
        }
    }

    fn single_list_board(cards: Vec<Card>) -> Board {
        let mut list = List::new("Today");
        list.cards = cards;
        Board { lists: vec![list] }
    }

    fn texts(board: &Board) -> Vec<&str> {
        board
            .lists
            .iter()
            .flat_map(|l| l.cards.iter().map(|c| c.text.as_str()))
            .collect()
    }

    #[test]
    fn due_windows_partition_the_scenario_board() {
        let board = single_list_board(vec![
            card("A", "2026-08-22"),
            card("B", "2026-08-23"),
            card("C", ""),
        ]);

        let overdue = FilterCriteria {
            due: DueFilter::Overdue,
            ..FilterCriteria::default()
        };
        // C has no due date and passes any due window by definition, so the
        // overdue view keeps A and C; only A is actually dated.
        let view = filter_board(&board, &overdue, today());
        assert_eq!(texts(&view), vec!["A", "C"]);

        let today_only = FilterCriteria {
            due: DueFilter::Today,
            ..FilterCriteria::default()
        };
        let view = filter_board(&board, &today_only, today());
        assert_eq!(texts(&view), vec!["B", "C"]);

        let all = FilterCriteria::default();
        let view = filter_board(&board, &all, today());
        assert_eq!(texts(&view), vec!["A", "B", "C"]);
    }

    #[test]
    fn due_matches_is_exact_on_dated_cards() {
        let today = today();
        assert!(due_matches("2026-08-22", DueFilter::Overdue, today));
        assert!(!due_matches("2026-08-23", DueFilter::Overdue, today));
        assert!(due_matches("2026-08-23", DueFilter::Today, today));
        assert!(!due_matches("2026-08-24", DueFilter::Today, today));
        // Week is inclusive on both ends: today through today + 7.
        assert!(due_matches("2026-08-23", DueFilter::Week, today));
        assert!(due_matches("2026-08-30", DueFilter::Week, today));
        assert!(!due_matches("2026-08-31", DueFilter::Week, today));
        assert!(!due_matches("2026-08-22", DueFilter::Week, today));
    }

    #[test]
    fn unparseable_due_fails_any_active_window() {
        let today = today();
        assert!(due_matches("not-a-date", DueFilter::All, today));
        assert!(!due_matches("not-a-date", DueFilter::Overdue, today));
        assert!(!due_matches("08/23/2026", DueFilter::Today, today));
    }

    #[test]
    fn no_active_filter_returns_the_board_unchanged() {
        let mut board = single_list_board(vec![card("A", "")]);
        board.lists.push(List::new("Empty"));
        let view = filter_board(&board, &FilterCriteria::default(), today());
        assert_eq!(view, board);
        // Empty lists survive only the unfiltered view.
        assert_eq!(view.lists.len(), 2);
    }

    #[test]
    fn active_filter_drops_lists_with_no_matching_cards() {
        let mut board = single_list_board(vec![card("alpha", "")]);
        let mut other = List::new("Other");
        other.cards.push(card("beta", ""));
        board.lists.push(other);

        let criteria = FilterCriteria {
            query: "beta".into(),
            ..FilterCriteria::default()
        };
        let view = filter_board(&board, &criteria, today());
        assert_eq!(view.lists.len(), 1);
        assert_eq!(texts(&view), vec!["beta"]);
    }

    #[test]
    fn search_covers_title_description_and_members() {
        let mut c = card("Write report", "");
        c.description = "quarterly numbers".into();
        c.members.push(Member {
            name: "Anshu Kumar".into(),
            initials: "AK".into(),
        });
        let board = single_list_board(vec![c, card("Unrelated", "")]);

        for query in ["REPORT", "quarterly", "anshu", "ak"] {
            let criteria = FilterCriteria {
                query: query.into(),
                ..FilterCriteria::default()
            };
            let view = filter_board(&board, &criteria, today());
            assert_eq!(texts(&view), vec!["Write report"], "query {query:?}");
        }
    }

    #[test]
    fn label_filter_keeps_cards_sharing_any_selected_label() {
        let mut a = card("a", "");
        a.labels = vec!["#f00".into(), "#0f0".into()];
        let mut b = card("b", "");
        b.labels = vec!["#00f".into()];
        let board = single_list_board(vec![a, b, card("c", "")]);

        let criteria = FilterCriteria {
            labels: vec!["#0f0".into(), "#fff".into()],
            ..FilterCriteria::default()
        };
        let view = filter_board(&board, &criteria, today());
        assert_eq!(texts(&view), vec!["a"]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let mut a = card("due soon", "2026-08-25");
        a.labels = vec!["#f00".into()];
        let board = single_list_board(vec![a, card("later", "2026-10-01")]);
        let criteria = FilterCriteria {
            query: "due".into(),
            labels: vec!["#f00".into()],
            due: DueFilter::Week,
        };
        let once = filter_board(&board, &criteria, today());
        let twice = filter_board(&once, &criteria, today());
        assert_eq!(once, twice);
    }

    #[test]
    fn all_labels_preserves_first_seen_order_without_duplicates() {
        let mut a = card("a", "");
        a.labels = vec!["#f00".into(), "#0f0".into()];
        let mut b = card("b", "");
        b.labels = vec!["#0f0".into(), "#00f".into()];
        let board = single_list_board(vec![a, b]);
        assert_eq!(all_labels(&board), vec!["#f00", "#0f0", "#00f"]);
    }
}
