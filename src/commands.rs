use crate::attachment;
use crate::filter::{self, DueFilter, FilterCriteria};
use crate::model::{Board, BoardError, Card, Member, Priority};
use crate::storage::{self, BoardScope};
use crate::store::BoardStore;
use crate::ui;
use anyhow::{anyhow, bail, Result};
use chrono::{Local, NaiveDate};
use std::io::{self, Write};
use std::path::Path;

pub fn init() -> Result<()> {
    let location = storage::init_project_board()?;
    println!("Initialized board at {}", location.path.display());
    Ok(())
}

pub fn list(
    list: Option<String>,
    query: Option<String>,
    labels: Vec<String>,
    due: Option<String>,
) -> Result<()> {
    let store = BoardStore::open_current()?;
    let criteria = FilterCriteria {
        query: query.unwrap_or_default(),
        labels,
        due: match due.as_deref() {
            Some(raw) => DueFilter::parse(raw)
                .ok_or_else(|| anyhow!("invalid due filter (use all, overdue, today or week): {raw}"))?,
            None => DueFilter::All,
        },
    };
    let today = Local::now().date_naive();
    let view = filter::filter_board(store.board(), &criteria, today);

    println!(
        "Board at {} ({})",
        store.location().path.display(),
        match store.location().scope {
            BoardScope::Project => "project",
            BoardScope::Global => "global",
        }
    );
    for l in &view.lists {
        if let Some(ref wanted) = list {
            if &l.id != wanted && !l.title.eq_ignore_ascii_case(wanted) {
                continue;
            }
        }
        println!("{} [{}]", l.title, l.id);
        if l.cards.is_empty() {
            println!("  (empty)");
        }
        for card in &l.cards {
            print_card(card);
        }
        println!();
    }
    Ok(())
}

pub fn add_list(title: String, color: Option<String>) -> Result<()> {
    if title.is_empty() {
        bail!(BoardError::EmptyTitle);
    }
    let mut store = BoardStore::open_current()?;
    store.add_list(&title)?;
    if let Some(color) = color {
        let id = store
            .board()
            .lists
            .last()
            .map(|l| l.id.clone())
            .ok_or_else(|| anyhow!("list was not created"))?;
        store.update_list(
            &id,
            crate::model::ListPatch {
                color: Some(color),
                ..Default::default()
            },
        )?;
    }
    println!("Added list {title}");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn add(
    text: String,
    description: Option<String>,
    labels: Vec<String>,
    members: Vec<String>,
    due: Option<String>,
    priority: Option<String>,
    color: Option<String>,
    list: Option<String>,
) -> Result<()> {
    let mut store = BoardStore::open_current()?;
    let list_id = match list {
        Some(ref wanted) => resolve_list(store.board(), wanted)?,
        None => store
            .board()
            .lists
            .first()
            .map(|l| l.id.clone())
            .ok_or_else(|| anyhow!("board has no lists; run add-list first"))?,
    };
    let mut card = Card::new(text);
    card.description = description.unwrap_or_default();
    card.labels = labels;
    card.members = parse_members(&members)?;
    card.due = validate_due(due)?.unwrap_or_default();
    card.priority = parse_priority(priority.as_deref())?;
    card.color = color.unwrap_or_default();
    let id = card.id.clone();
    store.save_card(card, &list_id)?;
    println!("Added card {id}");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn edit(
    card_id: String,
    text: Option<String>,
    description: Option<String>,
    labels: Vec<String>,
    clear_labels: bool,
    members: Vec<String>,
    due: Option<String>,
    clear_due: bool,
    priority: Option<String>,
    color: Option<String>,
) -> Result<()> {
    let mut store = BoardStore::open_current()?;
    let (list_id, mut card) = find_card(store.board(), &card_id)?;
    if let Some(t) = text {
        card.text = t;
    }
    if let Some(d) = description {
        card.description = d;
    }
    if clear_labels {
        card.labels.clear();
    }
    if !labels.is_empty() {
        card.labels = labels;
    }
    if !members.is_empty() {
        card.members = parse_members(&members)?;
    }
    if clear_due {
        card.due.clear();
    }
    if let Some(d) = validate_due(due)? {
        card.due = d;
    }
    if priority.is_some() {
        card.priority = parse_priority(priority.as_deref())?;
    }
    if let Some(c) = color {
        card.color = c;
    }
    store.save_card(card, &list_id)?;
    println!("Updated card {card_id}");
    Ok(())
}

pub fn move_card(card_id: String, list: String, index: Option<usize>) -> Result<()> {
    let mut store = BoardStore::open_current()?;
    let (from_list_id, _) = find_card(store.board(), &card_id)?;
    let to_list_id = resolve_list(store.board(), &list)?;
    let to_index = index.unwrap_or_else(|| {
        store
            .board()
            .list(&to_list_id)
            .map(|l| l.cards.len())
            .unwrap_or(0)
    });
    store.move_card(&card_id, &from_list_id, &to_list_id, to_index)?;
    println!("Moved card {card_id} to {to_list_id} at {to_index}");
    Ok(())
}

pub fn move_list(from: usize, to: usize) -> Result<()> {
    let mut store = BoardStore::open_current()?;
    let count = store.board().lists.len();
    if from >= count || to >= count {
        bail!("list index out of range (board has {count} lists)");
    }
    store.move_list(from, to)?;
    println!("Moved list {from} -> {to}");
    Ok(())
}

pub fn delete(card_id: String) -> Result<()> {
    let mut store = BoardStore::open_current()?;
    let (list_id, _) = find_card(store.board(), &card_id)?;
    store.delete_card(&card_id, &list_id)?;
    println!("Deleted card {card_id}");
    Ok(())
}

pub fn delete_list(list: String) -> Result<()> {
    let mut store = BoardStore::open_current()?;
    let list_id = resolve_list(store.board(), &list)?;
    store.delete_list(&list_id)?;
    println!("Deleted list {list_id}");
    Ok(())
}

pub fn attach(card_id: String, path: &Path) -> Result<()> {
    let mut store = BoardStore::open_current()?;
    let (list_id, mut card) = find_card(store.board(), &card_id)?;
    let attachment = attachment::attach_file(path)?;
    card.attachment = Some(attachment.data_url);
    card.attachment_type = attachment.mime;
    card.attachment_name = attachment.name.clone();
    store.save_card(card, &list_id)?;
    println!("Attached {} to card {card_id}", attachment.name);
    Ok(())
}

pub fn clear(yes: bool) -> Result<()> {
    let mut store = BoardStore::open_current()?;
    if !yes {
        print!(
            "Delete the board at {} and start over? [y/N] ",
            store.location().path.display()
        );
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            println!("Aborted");
            return Ok(());
        }
    }
    store.clear()?;
    println!("Board cleared");
    Ok(())
}

pub fn tui() -> Result<()> {
    let store = BoardStore::open_current()?;
    ui::run(store)
}

/// Resolves a list reference (exact id, or case-insensitive title) to its id.
fn resolve_list(board: &Board, wanted: &str) -> Result<String> {
    board
        .lists
        .iter()
        .find(|l| l.id == wanted || l.title.eq_ignore_ascii_case(wanted))
        .map(|l| l.id.clone())
        .ok_or_else(|| BoardError::ListNotFound(wanted.to_string()).into())
}

/// Finds the card anywhere on the board, returning its list id and a copy.
fn find_card(board: &Board, card_id: &str) -> Result<(String, Card)> {
    for list in &board.lists {
        if let Some(idx) = list.find_card(card_id) {
            return Ok((list.id.clone(), list.cards[idx].clone()));
        }
    }
    Err(BoardError::CardNotFound(card_id.to_string()).into())
}

/// Parses `NAME/INITIALS`; bare input is used as both name and initials.
fn parse_members(raw: &[String]) -> Result<Vec<Member>> {
    raw.iter()
        .map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                bail!("member must not be empty");
            }
            Ok(match entry.split_once('/') {
                Some((name, initials)) => Member {
                    name: name.trim().to_string(),
                    initials: initials.trim().to_string(),
                },
                None => Member {
                    name: entry.to_string(),
                    initials: entry.to_string(),
                },
            })
        })
        .collect()
}

fn parse_priority(raw: Option<&str>) -> Result<Priority> {
    match raw.map(|r| r.to_ascii_lowercase()) {
        None => Ok(Priority::None),
        Some(p) => match p.as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            "none" | "" => Ok(Priority::None),
            other => bail!("invalid priority (use high, medium, low or none): {other}"),
        },
    }
}

fn validate_due(due: Option<String>) -> Result<Option<String>> {
    match due {
        None => Ok(None),
        Some(raw) => {
            let raw = raw.trim().to_string();
            if raw.is_empty() {
                return Ok(Some(raw));
            }
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map_err(|_| anyhow!("invalid due date (use YYYY-MM-DD): {raw}"))?;
            Ok(Some(raw))
        }
    }
}

fn print_card(card: &Card) {
    let priority = match card.priority {
        Priority::High => " !high",
        Priority::Medium => " !medium",
        Priority::Low => " !low",
        Priority::None => "",
    };
    println!("  - {}: {}{}", card.id, card.text, priority);
    if !card.description.is_empty() {
        println!("    {}", card.description);
    }
    if !card.labels.is_empty() {
        println!("    labels: {}", card.labels.join(", "));
    }
    if !card.members.is_empty() {
        let initials: Vec<&str> = card.members.iter().map(|m| m.initials.as_str()).collect();
        println!("    members: {}", initials.join(", "));
    }
    if !card.due.is_empty() {
        println!("    due: {}", card.due);
    }
    if card.attachment.is_some() {
        println!("    attachment: {} ({})", card.attachment_name, card.attachment_type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_parse_from_name_slash_initials() {
        let members = parse_members(&["Anshu Kumar/AK".into(), "BB".into()]).unwrap();
        assert_eq!(members[0].name, "Anshu Kumar");
        assert_eq!(members[0].initials, "AK");
        assert_eq!(members[1].name, "BB");
        assert_eq!(members[1].initials, "BB");
        assert!(parse_members(&["  ".into()]).is_err());
    }

    #[test]
    fn priority_parsing_is_case_insensitive() {
        assert_eq!(parse_priority(Some("HIGH")).unwrap(), Priority::High);
        assert_eq!(parse_priority(Some("none")).unwrap(), Priority::None);
        assert_eq!(parse_priority(None).unwrap(), Priority::None);
        assert!(parse_priority(Some("urgent")).is_err());
    }

    #[test]
    fn due_dates_must_be_iso() {
        assert_eq!(
            validate_due(Some("2026-08-23".into())).unwrap(),
            Some("2026-08-23".into())
        );
        assert_eq!(validate_due(Some("  ".into())).unwrap(), Some("".into()));
        assert!(validate_due(Some("08/23/2026".into())).is_err());
    }

    #[test]
    fn resolve_list_accepts_id_or_title() {
        let board = Board::starter();
        let id = board.lists[0].id.clone();
        assert_eq!(resolve_list(&board, &id).unwrap(), id);
        assert_eq!(resolve_list(&board, "getting started").unwrap(), id);
        assert!(resolve_list(&board, "nope").is_err());
    }
}
