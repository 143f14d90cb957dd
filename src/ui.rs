use crate::attachment;
use crate::drag::{Channel, DragPayload, DragTracker, DropAction, ZoneItem};
use crate::filter::{self, DueFilter, FilterCriteria};
use crate::model::{Board, Card, List as BoardList, ListPatch, Member, Priority};
use crate::storage::BoardScope;
use crate::store::BoardStore;
use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::path::Path;
use std::time::{Duration, Instant};

/// Rendered rows per card, borders included.
const CARD_HEIGHT: u16 = 4;

pub fn run(store: BoardStore) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(store);
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    store: BoardStore,
    selected_list: usize,
    selected_card: usize,
    scroll_offsets: Vec<usize>,
    last_save: Instant,
    status: String,
    mode: Mode,
    criteria: FilterCriteria,
    list_drag: DragTracker,
    card_drag: DragTracker,
    geometry: BoardGeometry,
}

enum Mode {
    Normal,
    CardForm {
        list_id: String,
        card_id: Option<String>,
        form: CardForm,
    },
    ConfirmDeleteCard {
        card_id: String,
        list_id: String,
    },
    ConfirmDeleteList {
        list_id: String,
    },
    ConfirmClear,
    Search(FieldValue),
    NewList(FieldValue),
    RenameList {
        list_id: String,
        input: FieldValue,
    },
    AttachInput {
        card_id: String,
        list_id: String,
        input: FieldValue,
    },
}

/// Screen positions recorded during the last draw, for mouse hit-testing.
#[derive(Default, Clone)]
struct BoardGeometry {
    board_area: Rect,
    lists: Vec<ListGeometry>,
}

#[derive(Clone)]
struct ListGeometry {
    list_id: String,
    rect: Rect,
    header: Rect,
    /// Scroll offset at draw time: `cards` holds only the rendered tail,
    /// so indices derived from it are shifted by this amount.
    offset: usize,
    cards: Vec<(String, Rect)>,
}

struct CardForm {
    text: FieldValue,
    description: FieldValue,
    labels: FieldValue,
    members: FieldValue,
    due: FieldValue,
    priority: FieldValue,
    color: FieldValue,
    field: FormField,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum FormField {
    Text,
    Description,
    Labels,
    Members,
    Due,
    Priority,
    Color,
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_char(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_char(self.cursor, &self.value);
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_char(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

impl App {
    fn new(store: BoardStore) -> Self {
        let status = format!("Loaded board from {}", store.location().path.display());
        let list_count = store.board().lists.len();
        App {
            store,
            selected_list: 0,
            selected_card: 0,
            scroll_offsets: vec![0; list_count],
            last_save: Instant::now(),
            status,
            mode: Mode::Normal,
            criteria: FilterCriteria::default(),
            list_drag: DragTracker::new(Channel::ListReorder),
            card_drag: DragTracker::new(Channel::CardMove),
            geometry: BoardGeometry::default(),
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                match event::read()? {
                    Event::Key(key) => {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if self.handle_key(key)? {
                            break;
                        }
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse)?,
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// The board as currently displayed: filtered when any criterion is
    /// active, the stored board otherwise.
    fn visible_board(&self) -> Board {
        filter::filter_board(self.store.board(), &self.criteria, Local::now().date_naive())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::CardForm { .. } => self.handle_form_key(key),
            Mode::ConfirmDeleteCard { .. }
            | Mode::ConfirmDeleteList { .. }
            | Mode::ConfirmClear => self.handle_confirm_key(key),
            Mode::Search(_)
            | Mode::NewList(_)
            | Mode::RenameList { .. }
            | Mode::AttachInput { .. } => self.handle_prompt_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Esc => {
                if self.drag_in_flight() {
                    self.list_drag.cancel();
                    self.card_drag.cancel();
                    self.status = "Drag canceled".into();
                } else if self.criteria.is_active() {
                    self.criteria.clear();
                    self.status = "Filters cleared".into();
                    self.ensure_bounds();
                }
            }
            KeyCode::Left | KeyCode::Char('h') => self.prev_list(),
            KeyCode::Right | KeyCode::Char('l') => self.next_list(),
            KeyCode::Up | KeyCode::Char('k') => self.prev_card(),
            KeyCode::Down | KeyCode::Char('j') => self.next_card(),
            KeyCode::Char('n') => {
                if let Some(list_id) = self.selected_list_id() {
                    self.mode = Mode::CardForm {
                        list_id,
                        card_id: None,
                        form: CardForm::new(),
                    };
                    self.status =
                        "New card (Tab/Shift-Tab move, Enter save, Esc cancel)".into();
                } else {
                    self.status = "No list selected".into();
                }
            }
            KeyCode::Char('e') => {
                if let Some((list_id, card)) = self.selected_card_ref() {
                    let card_id = card.id.clone();
                    let form = CardForm::from_card(card);
                    self.mode = Mode::CardForm {
                        list_id,
                        card_id: Some(card_id.clone()),
                        form,
                    };
                    self.status = format!("Editing {card_id}");
                } else {
                    self.status = "No card selected to edit".into();
                }
            }
            KeyCode::Char('d') => {
                if let Some((list_id, card)) = self.selected_card_ref() {
                    let card_id = card.id.clone();
                    self.status =
                        format!("Delete {card_id}? (y to confirm, n/Esc to cancel)");
                    self.mode = Mode::ConfirmDeleteCard { card_id, list_id };
                } else {
                    self.status = "No card selected to delete".into();
                }
            }
            KeyCode::Char('N') => {
                self.mode = Mode::NewList(FieldValue::new(""));
                self.status = "New list title (Enter save, Esc cancel)".into();
            }
            KeyCode::Char('R') => {
                if let Some(list_id) = self.selected_list_id() {
                    let title = self
                        .visible_board()
                        .list(&list_id)
                        .map(|l| l.title.clone())
                        .unwrap_or_default();
                    self.mode = Mode::RenameList {
                        list_id,
                        input: FieldValue::new(&title),
                    };
                    self.status = "Rename list (Enter save, Esc cancel)".into();
                } else {
                    self.status = "No list selected".into();
                }
            }
            KeyCode::Char('D') => {
                if let Some(list_id) = self.selected_list_id() {
                    self.status =
                        "Delete list and all its cards? (y to confirm, n/Esc to cancel)".into();
                    self.mode = Mode::ConfirmDeleteList { list_id };
                } else {
                    self.status = "No list selected".into();
                }
            }
            KeyCode::Char('a') => {
                if let Some((list_id, card)) = self.selected_card_ref() {
                    self.mode = Mode::AttachInput {
                        card_id: card.id.clone(),
                        list_id,
                        input: FieldValue::new(""),
                    };
                    self.status = "Path of file to attach (Enter save, Esc cancel)".into();
                } else {
                    self.status = "No card selected".into();
                }
            }
            KeyCode::Char('/') => {
                if self.drag_in_flight() {
                    self.status = "Finish the drag before filtering".into();
                } else {
                    self.mode = Mode::Search(FieldValue::new(&self.criteria.query));
                    self.status = "Search (Enter apply, Esc cancel)".into();
                }
            }
            KeyCode::Char('f') => {
                if self.drag_in_flight() {
                    self.status = "Finish the drag before filtering".into();
                } else {
                    self.criteria.due = self.criteria.due.next();
                    self.status = format!("Due filter: {}", self.criteria.due.label());
                    self.ensure_bounds();
                }
            }
            KeyCode::Char('g') => {
                if self.drag_in_flight() {
                    self.status = "Finish the drag before filtering".into();
                } else {
                    self.cycle_label_filter();
                    self.ensure_bounds();
                }
            }
            KeyCode::Char('c') => {
                self.criteria.clear();
                self.status = "Filters cleared".into();
                self.ensure_bounds();
            }
            KeyCode::Char('x') => {
                self.status = "Delete the stored board? (y to confirm, n/Esc to cancel)".into();
                self.mode = Mode::ConfirmClear;
            }
            KeyCode::Char('m') | KeyCode::Char('>') => self.move_selected_card_across(1)?,
            KeyCode::Char('b') | KeyCode::Char('<') => self.move_selected_card_across(-1)?,
            KeyCode::Char('J') => self.move_selected_card_within(1)?,
            KeyCode::Char('K') => self.move_selected_card_within(-1)?,
            KeyCode::Char('H') => self.move_selected_list(-1)?,
            KeyCode::Char('L') => self.move_selected_list(1)?,
            _ => {}
        }
        Ok(false)
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mut close_form = false;
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        if let Mode::CardForm {
            list_id,
            card_id,
            form,
        } = &mut mode
        {
            match key.code {
                KeyCode::Esc => {
                    close_form = true;
                    self.status = "Canceled".into();
                }
                KeyCode::Tab => form.next_field(),
                KeyCode::BackTab => form.prev_field(),
                KeyCode::Left => form.active_field_mut().move_left(),
                KeyCode::Right => form.active_field_mut().move_right(),
                KeyCode::Backspace => form.active_field_mut().backspace(),
                KeyCode::Enter => {
                    match self.submit_card_form(list_id, card_id.as_deref(), form) {
                        Ok(()) => close_form = true,
                        Err(err) => self.status = format!("Could not save: {err}"),
                    }
                }
                KeyCode::Char(c) => {
                    if !key
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                    {
                        form.active_field_mut().insert_char(c);
                    }
                }
                _ => {}
            }
        }
        self.mode = if close_form { Mode::Normal } else { mode };
        Ok(false)
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<bool> {
        let confirmed = matches!(key.code, KeyCode::Char('y') | KeyCode::Enter);
        let declined = matches!(key.code, KeyCode::Char('n') | KeyCode::Esc);
        if !confirmed && !declined {
            return Ok(false);
        }
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        if declined {
            self.status = "Canceled".into();
            return Ok(false);
        }
        match mode {
            Mode::ConfirmDeleteCard { card_id, list_id } => {
                if self.store.delete_card(&card_id, &list_id)? {
                    self.mark_saved(format!("Deleted {card_id}"));
                } else {
                    self.status = format!("Card {card_id} is already gone");
                }
            }
            Mode::ConfirmDeleteList { list_id } => {
                if self.store.delete_list(&list_id)? {
                    self.mark_saved("Deleted list".into());
                } else {
                    self.status = "List is already gone".into();
                }
            }
            Mode::ConfirmClear => {
                self.store.clear()?;
                self.criteria.clear();
                self.mark_saved("Board cleared".into());
            }
            _ => {}
        }
        self.ensure_bounds();
        Ok(false)
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mut close = false;
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let input = match &mut mode {
            Mode::Search(input) => input,
            Mode::NewList(input) => input,
            Mode::RenameList { input, .. } => input,
            Mode::AttachInput { input, .. } => input,
            _ => {
                self.mode = mode;
                return Ok(false);
            }
        };
        match key.code {
            KeyCode::Esc => {
                close = true;
                self.status = "Canceled".into();
            }
            KeyCode::Left => input.move_left(),
            KeyCode::Right => input.move_right(),
            KeyCode::Backspace => input.backspace(),
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    input.insert_char(c);
                }
            }
            KeyCode::Enter => {
                close = true;
                let value = input.value.trim().to_string();
                match &mode {
                    Mode::Search(_) => {
                        self.criteria.query = value;
                        self.status = if self.criteria.query.is_empty() {
                            "Search cleared".into()
                        } else {
                            format!("Searching for \"{}\"", self.criteria.query)
                        };
                    }
                    Mode::NewList(_) => {
                        if self.store.add_list(&value)? {
                            self.mark_saved(format!("Added list {value}"));
                        } else {
                            self.status = "Title is required".into();
                        }
                    }
                    Mode::RenameList { list_id, .. } => {
                        if value.is_empty() {
                            self.status = "Title is required".into();
                        } else if self.store.update_list(
                            list_id,
                            ListPatch {
                                title: Some(value),
                                ..ListPatch::default()
                            },
                        )? {
                            self.mark_saved("Renamed list".into());
                        }
                    }
                    Mode::AttachInput {
                        card_id, list_id, ..
                    } => match self.attach_to_card(card_id, list_id, Path::new(&value)) {
                        Ok(name) => self.mark_saved(format!("Attached {name}")),
                        Err(err) => self.status = format!("Attach failed: {err}"),
                    },
                    _ => {}
                }
                self.ensure_bounds();
            }
            _ => {}
        }
        self.mode = if close { Mode::Normal } else { mode };
        Ok(false)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        if !matches!(self.mode, Mode::Normal) {
            return Ok(());
        }
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.mouse_down(mouse.column, mouse.row)
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.mouse_drag(mouse.column, mouse.row);
                Ok(())
            }
            MouseEventKind::Up(MouseButton::Left) => self.mouse_up(),
            _ => Ok(()),
        }
    }

    /// Press selects what is under the pointer and opens a drag session.
    /// Cards are hit-tested before list headers, so pressing a card never
    /// starts a list drag.
    fn mouse_down(&mut self, x: u16, y: u16) -> Result<()> {
        let geometry = self.geometry.clone();
        for (list_idx, lg) in geometry.lists.iter().enumerate() {
            for (card_idx, (card_id, rect)) in lg.cards.iter().enumerate() {
                if rect_contains(*rect, x, y) {
                    self.selected_list = list_idx;
                    self.selected_card = card_idx;
                    if self.criteria.is_active() {
                        self.status = "Clear filters to drag cards".into();
                    } else {
                        self.card_drag
                            .start(DragPayload::card_move(card_id, &lg.list_id));
                    }
                    return Ok(());
                }
            }
        }
        for (list_idx, lg) in geometry.lists.iter().enumerate() {
            if rect_contains(lg.header, x, y) {
                self.selected_list = list_idx;
                self.selected_card = 0;
                if self.criteria.is_active() {
                    self.status = "Clear filters to drag lists".into();
                } else {
                    self.list_drag.start(DragPayload::list_reorder(list_idx));
                }
                return Ok(());
            }
        }
        Ok(())
    }

    /// Translates the current pointer position into a drag-over step on
    /// whichever session is live, feeding the tracker the hovered
    /// container's sibling geometry.
    fn mouse_drag(&mut self, x: u16, y: u16) {
        if self.card_drag.is_dragging() {
            let dragged = self.card_drag.dragged_card_id();
            let hovered = self
                .geometry
                .lists
                .iter()
                .find(|lg| rect_contains(lg.rect, x, y))
                .cloned();
            match hovered {
                Some(lg) => {
                    let items: Vec<ZoneItem> = lg
                        .cards
                        .iter()
                        .map(|(id, rect)| {
                            let center = rect.y as f32 + rect.height as f32 / 2.0;
                            if Some(id) == dragged.as_ref() {
                                ZoneItem::lifted(center)
                            } else {
                                ZoneItem::new(center)
                            }
                        })
                        .collect();
                    self.card_drag
                        .drag_over(&lg.list_id, &items, CARD_HEIGHT as f32, y as f32);
                }
                None => self.card_drag.clear_placeholder(),
            }
        } else if self.list_drag.is_dragging() {
            if rect_contains(self.geometry.board_area, x, y) {
                let dragged = self.list_drag.dragged_list_index();
                let items: Vec<ZoneItem> = self
                    .geometry
                    .lists
                    .iter()
                    .enumerate()
                    .map(|(idx, lg)| {
                        let center = lg.rect.x as f32 + lg.rect.width as f32 / 2.0;
                        if Some(idx) == dragged {
                            ZoneItem::lifted(center)
                        } else {
                            ZoneItem::new(center)
                        }
                    })
                    .collect();
                let width = self
                    .geometry
                    .lists
                    .first()
                    .map(|lg| lg.rect.width as f32)
                    .unwrap_or(20.0);
                self.list_drag.drag_over("board", &items, width, x as f32);
            } else {
                self.list_drag.clear_placeholder();
            }
        }
    }

    fn mouse_up(&mut self) -> Result<()> {
        if let Some(action) = self.card_drag.drop() {
            match action {
                DropAction::MoveCard {
                    card_id,
                    from_list_id,
                    to_list_id,
                    to_index,
                } => {
                    // The dropped index counts rendered cards only; the
                    // target list's scroll offset maps it onto the full
                    // card sequence.
                    let to_index = to_index + self.list_offset(&to_list_id);
                    if self
                        .store
                        .move_card(&card_id, &from_list_id, &to_list_id, to_index)?
                    {
                        self.mark_saved(format!("Moved {card_id}"));
                    }
                }
                DropAction::MoveList { .. } => {}
            }
        }
        if let Some(action) = self.list_drag.drop() {
            match action {
                DropAction::MoveList { from, to } => {
                    if self.store.move_list(from, to)? {
                        self.selected_list = to;
                        self.mark_saved("Moved list".into());
                    }
                }
                DropAction::MoveCard { .. } => {}
            }
        }
        self.ensure_bounds();
        Ok(())
    }

    fn cycle_label_filter(&mut self) {
        let labels = filter::all_labels(self.store.board());
        if labels.is_empty() {
            self.status = "No labels on the board".into();
            return;
        }
        let current = self.criteria.labels.first().cloned();
        let next = match current {
            None => labels.first().cloned(),
            Some(ref label) => labels
                .iter()
                .position(|l| l == label)
                .and_then(|idx| labels.get(idx + 1).cloned()),
        };
        match next {
            Some(label) => {
                self.status = format!("Label filter: {label}");
                self.criteria.labels = vec![label];
            }
            None => {
                self.criteria.labels.clear();
                self.status = "Label filter cleared".into();
            }
        }
    }

    fn move_selected_card_across(&mut self, delta: isize) -> Result<()> {
        if self.criteria.is_active() {
            self.status = "Clear filters to move cards".into();
            return Ok(());
        }
        let Some((from_list_id, card)) = self.selected_card_ref() else {
            self.status = "No card selected to move".into();
            return Ok(());
        };
        let card_id = card.id.clone();
        let current = self.selected_list as isize;
        let max = (self.store.board().lists.len() as isize).saturating_sub(1);
        let target = (current + delta).clamp(0, max) as usize;
        if target == self.selected_list {
            return Ok(());
        }
        let to = self.store.board().lists[target].clone();
        if self
            .store
            .move_card(&card_id, &from_list_id, &to.id, to.cards.len())?
        {
            self.selected_list = target;
            self.selected_card = self
                .store
                .board()
                .lists[target]
                .cards
                .len()
                .saturating_sub(1);
            self.mark_saved(format!("Moved to {}", to.title));
        }
        Ok(())
    }

    fn move_selected_card_within(&mut self, delta: isize) -> Result<()> {
        if self.criteria.is_active() {
            self.status = "Clear filters to move cards".into();
            return Ok(());
        }
        let Some((list_id, card)) = self.selected_card_ref() else {
            self.status = "No card selected to move".into();
            return Ok(());
        };
        let card_id = card.id.clone();
        let idx = self.selected_card as isize;
        let len = self
            .store
            .board()
            .list(&list_id)
            .map(|l| l.cards.len() as isize)
            .unwrap_or(0);
        let target = idx + delta;
        if target < 0 || target >= len {
            return Ok(());
        }
        // The card is removed before reinsertion, so the raw target index is
        // already the post-removal position.
        if self
            .store
            .move_card(&card_id, &list_id, &list_id, target as usize)?
        {
            self.selected_card = target as usize;
            self.mark_saved("Reordered".into());
        }
        Ok(())
    }

    fn move_selected_list(&mut self, delta: isize) -> Result<()> {
        if self.criteria.is_active() {
            self.status = "Clear filters to move lists".into();
            return Ok(());
        }
        let from = self.selected_list as isize;
        let max = (self.store.board().lists.len() as isize).saturating_sub(1);
        let to = (from + delta).clamp(0, max);
        if to == from {
            return Ok(());
        }
        if self.store.move_list(from as usize, to as usize)? {
            self.selected_list = to as usize;
            self.mark_saved("Moved list".into());
        }
        Ok(())
    }

    fn submit_card_form(
        &mut self,
        list_id: &str,
        card_id: Option<&str>,
        form: &CardForm,
    ) -> Result<()> {
        let text = form.text.value.trim();
        if text.is_empty() {
            return Err(anyhow!("title is required"));
        }
        let due = form.due.value.trim();
        if !due.is_empty() {
            NaiveDate::parse_from_str(due, "%Y-%m-%d")
                .map_err(|_| anyhow!("invalid due date (use YYYY-MM-DD)"))?;
        }
        let priority = parse_priority_input(form.priority.value.trim())?;

        let mut card = match card_id {
            Some(id) => self
                .store
                .board()
                .card(list_id, id)
                .cloned()
                .ok_or_else(|| anyhow!("card {id} no longer exists"))?,
            None => Card::new(""),
        };
        card.text = text.to_string();
        card.description = form.description.value.trim().to_string();
        card.labels = split_tokens(&form.labels.value);
        card.members = parse_members_input(&form.members.value);
        card.due = due.to_string();
        card.priority = priority;
        card.color = form.color.value.trim().to_string();

        let saved_id = card.id.clone();
        if self.store.save_card(card, list_id)? {
            self.mark_saved(format!("Saved {saved_id}"));
        }
        self.ensure_bounds();
        Ok(())
    }

    fn attach_to_card(&mut self, card_id: &str, list_id: &str, path: &Path) -> Result<String> {
        let mut card = self
            .store
            .board()
            .card(list_id, card_id)
            .cloned()
            .ok_or_else(|| anyhow!("card {card_id} no longer exists"))?;
        let attached = attachment::attach_file(path)?;
        card.attachment = Some(attached.data_url);
        card.attachment_type = attached.mime;
        card.attachment_name = attached.name.clone();
        self.store.save_card(card, list_id)?;
        Ok(attached.name)
    }

    fn drag_in_flight(&self) -> bool {
        self.list_drag.is_dragging() || self.card_drag.is_dragging()
    }

    fn list_offset(&self, list_id: &str) -> usize {
        self.geometry
            .lists
            .iter()
            .find(|lg| lg.list_id == list_id)
            .map(|lg| lg.offset)
            .unwrap_or(0)
    }

    fn mark_saved(&mut self, message: String) {
        self.last_save = Instant::now();
        self.status = message;
    }

    fn prev_list(&mut self) {
        if self.selected_list > 0 {
            self.selected_list -= 1;
            self.selected_card = 0;
        }
    }

    fn next_list(&mut self) {
        if self.selected_list + 1 < self.visible_board().lists.len() {
            self.selected_list += 1;
            self.selected_card = 0;
        }
    }

    fn prev_card(&mut self) {
        if self.selected_card > 0 {
            self.selected_card -= 1;
        }
    }

    fn next_card(&mut self) {
        if let Some(list) = self.visible_board().lists.get(self.selected_list) {
            if self.selected_card + 1 < list.cards.len() {
                self.selected_card += 1;
            }
        }
    }

    fn selected_list_id(&self) -> Option<String> {
        self.visible_board()
            .lists
            .get(self.selected_list)
            .map(|l| l.id.clone())
    }

    fn selected_card_ref(&self) -> Option<(String, Card)> {
        let view = self.visible_board();
        let list = view.lists.get(self.selected_list)?;
        let card = list.cards.get(self.selected_card)?;
        Some((list.id.clone(), card.clone()))
    }

    fn ensure_bounds(&mut self) {
        let view = self.visible_board();
        if view.lists.is_empty() {
            self.selected_list = 0;
            self.selected_card = 0;
            return;
        }
        self.selected_list = self.selected_list.min(view.lists.len() - 1);
        let card_count = view.lists[self.selected_list].cards.len();
        self.selected_card = self.selected_card.min(card_count.saturating_sub(1));
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        self.draw_board(f, layout[1]);
        self.draw_footer(f, layout[2]);

        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        match &mode {
            Mode::CardForm { card_id, form, .. } => {
                let title = if card_id.is_some() { "Edit Card" } else { "New Card" };
                self.draw_form(f, title, form);
            }
            Mode::ConfirmDeleteCard { card_id, list_id } => {
                let text = self
                    .store
                    .board()
                    .card(list_id, card_id)
                    .map(|c| c.text.clone())
                    .unwrap_or_else(|| card_id.clone());
                self.draw_confirm(f, "Confirm Delete", &format!("Delete \"{text}\"?"));
            }
            Mode::ConfirmDeleteList { list_id } => {
                let title = self
                    .store
                    .board()
                    .list(list_id)
                    .map(|l| l.title.clone())
                    .unwrap_or_else(|| list_id.clone());
                self.draw_confirm(
                    f,
                    "Confirm Delete",
                    &format!("Delete list \"{title}\" and all its cards?"),
                );
            }
            Mode::ConfirmClear => {
                self.draw_confirm(f, "Confirm Clear", "Delete the stored board and start over?");
            }
            Mode::Search(input) => self.draw_prompt(f, "Search", input),
            Mode::NewList(input) => self.draw_prompt(f, "New List", input),
            Mode::RenameList { input, .. } => self.draw_prompt(f, "Rename List", input),
            Mode::AttachInput { input, .. } => self.draw_prompt(f, "Attach File", input),
            Mode::Normal => {}
        }
        self.mode = mode;
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let scope = match self.store.location().scope {
            BoardScope::Project => "project",
            BoardScope::Global => "global",
        };
        let mut spans = vec![
            Span::styled(
                "tacks",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(scope, Style::default().fg(Color::Green)),
            Span::raw("  •  "),
            Span::styled(
                format!("{}", self.store.location().path.display()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("saved {}", format_elapsed(self.last_save)),
                Style::default().fg(Color::Gray),
            ),
        ];
        if self.criteria.is_active() {
            spans.push(Span::raw("  •  "));
            spans.push(Span::styled(
                filter_summary(&self.criteria),
                Style::default().fg(Color::LightYellow),
            ));
        }

        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_board(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let view = self.visible_board();
        self.geometry = BoardGeometry {
            board_area: area,
            lists: Vec::new(),
        };
        if view.lists.is_empty() {
            let message = if self.criteria.is_active() {
                "No cards match the active filters (c to clear)"
            } else {
                "No lists yet (N to add one)"
            };
            let msg = Paragraph::new(message)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("tacks"));
            f.render_widget(Clear, area);
            f.render_widget(msg, area);
            return;
        }

        if self.scroll_offsets.len() < view.lists.len() {
            self.scroll_offsets.resize(view.lists.len(), 0);
        }

        // Lay lists out left to right, with one extra slot when a list drag
        // has its placeholder on the board.
        let gap = self
            .list_drag
            .placeholder()
            .filter(|ph| ph.zone == "board")
            .map(|ph| ph.index.min(view.lists.len()));
        let slot_count = view.lists.len() + usize::from(gap.is_some());
        let constraints: Vec<Constraint> = (0..slot_count)
            .map(|_| Constraint::Ratio(1, slot_count as u32))
            .collect();
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        let dragged_list = self.list_drag.dragged_list_index();
        let mut chunk_iter = 0..slot_count;
        for (idx, list) in view.lists.iter().enumerate() {
            if gap == Some(idx) {
                if let Some(slot) = chunk_iter.next() {
                    self.draw_gap(f, chunks[slot]);
                }
            }
            let Some(slot) = chunk_iter.next() else {
                break;
            };
            let lifted = dragged_list == Some(idx);
            let geom = self.draw_list(f, chunks[slot], list, idx, lifted);
            self.geometry.lists.push(geom);
        }
        if gap == Some(view.lists.len()) {
            if let Some(slot) = chunk_iter.next() {
                self.draw_gap(f, chunks[slot]);
            }
        }
    }

    fn draw_list(
        &mut self,
        f: &mut ratatui::Frame<'_>,
        area: Rect,
        list: &BoardList,
        list_idx: usize,
        lifted: bool,
    ) -> ListGeometry {
        let accent = list_accent(list, list_idx);
        let selected = list_idx == self.selected_list;
        let title = format!("{} ({})", list.title, list.cards.len());
        let mut title_style = Style::default().fg(accent).add_modifier(Modifier::BOLD);
        if selected {
            title_style = title_style.add_modifier(Modifier::UNDERLINED);
        }
        let mut block_style = Style::default().bg(Color::Rgb(16, 18, 24));
        if lifted {
            block_style = block_style.add_modifier(Modifier::DIM);
        }
        let block = Block::default()
            .title(Span::styled(title, title_style))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent))
            .style(block_style);
        f.render_widget(block, area);

        let header = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height: 1,
        };
        let cards_area = Rect {
            x: area.x + 1,
            y: area.y + 1,
            width: area.width.saturating_sub(2),
            height: area.height.saturating_sub(2),
        };

        let viewport = (cards_area.height / CARD_HEIGHT) as usize;
        let selected_card = if selected { Some(self.selected_card) } else { None };
        let mut offset = *self.scroll_offsets.get(list_idx).unwrap_or(&0);
        if let Some(sel) = selected_card {
            offset = adjust_offset(sel, offset, viewport, 0, list.cards.len());
            self.scroll_offsets[list_idx] = offset;
        } else {
            offset = offset.min(list.cards.len().saturating_sub(1));
        }

        let dragged_card = self.card_drag.dragged_card_id();
        // The tracker's index counts the rendered cards, so shift it by the
        // scroll offset before comparing against absolute card indices.
        let gap = self
            .card_drag
            .placeholder()
            .filter(|ph| ph.zone == list.id)
            .map(|ph| (offset + ph.index).min(list.cards.len()));

        let mut geom = ListGeometry {
            list_id: list.id.clone(),
            rect: area,
            header,
            offset,
            cards: Vec::new(),
        };
        let mut y = cards_area.y;
        let bottom = cards_area.y + cards_area.height;
        for (card_idx, card) in list.cards.iter().enumerate().skip(offset) {
            if gap == Some(card_idx) {
                if y + CARD_HEIGHT > bottom {
                    break;
                }
                self.draw_gap(f, Rect::new(cards_area.x, y, cards_area.width, CARD_HEIGHT));
                y += CARD_HEIGHT;
            }
            if y + CARD_HEIGHT > bottom {
                break;
            }
            let rect = Rect::new(cards_area.x, y, cards_area.width, CARD_HEIGHT);
            let is_selected = selected && card_idx == self.selected_card;
            let is_lifted = Some(&card.id) == dragged_card.as_ref();
            draw_card(f, rect, card, is_selected, is_lifted);
            geom.cards.push((card.id.clone(), rect));
            y += CARD_HEIGHT;
        }
        if gap == Some(list.cards.len()) && y + CARD_HEIGHT <= bottom {
            self.draw_gap(f, Rect::new(cards_area.x, y, cards_area.width, CARD_HEIGHT));
        }
        geom
    }

    /// The pending drop position, rendered as a highlighted empty slot.
    fn draw_gap(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::LightYellow))
            .style(Style::default().bg(Color::Rgb(40, 38, 20)));
        f.render_widget(block, area);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[1]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, bottom[0]);

        let detail = Paragraph::new(self.detail_line())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title("Selected"),
            );
        f.render_widget(detail, bottom[1]);
    }

    fn detail_line(&self) -> Line<'static> {
        let Some((_, card)) = self.selected_card_ref() else {
            return Line::from("No card selected");
        };
        let mut spans = vec![Span::styled(
            card.text.clone(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )];
        if !card.due.is_empty() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                card.due.clone(),
                Style::default().fg(due_color(&card.due)),
            ));
        }
        if card.priority != Priority::None {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                priority_label(card.priority).to_string(),
                Style::default().fg(priority_color(card.priority)),
            ));
        }
        if !card.members.is_empty() {
            let initials: Vec<&str> = card.members.iter().map(|m| m.initials.as_str()).collect();
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                initials.join(","),
                Style::default().fg(Color::LightMagenta),
            ));
        }
        if card.attachment.is_some() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                format!("[{}]", card.attachment_name),
                Style::default().fg(Color::LightBlue),
            ));
        }
        if !card.description.is_empty() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                card.description.clone(),
                Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
            ));
        }
        Line::from(spans)
    }

    fn draw_form(&self, f: &mut ratatui::Frame<'_>, title: &str, form: &CardForm) {
        let area = centered_rect(70, 70, f.size());
        let mut fields = Vec::new();
        fields.extend(field_lines("Title", &form.text, form.field == FormField::Text));
        fields.extend(field_lines(
            "Description",
            &form.description,
            form.field == FormField::Description,
        ));
        fields.extend(field_lines(
            "Labels",
            &form.labels,
            form.field == FormField::Labels,
        ));
        fields.extend(field_lines(
            "Members (Name/XY, comma separated)",
            &form.members,
            form.field == FormField::Members,
        ));
        fields.extend(field_lines(
            "Due (YYYY-MM-DD)",
            &form.due,
            form.field == FormField::Due,
        ));
        fields.extend(field_lines(
            "Priority (high/medium/low)",
            &form.priority,
            form.field == FormField::Priority,
        ));
        fields.extend(field_lines(
            "Color (#rrggbb)",
            &form.color,
            form.field == FormField::Color,
        ));
        fields.push(Line::from(Span::styled(
            "Enter to save • Esc to cancel • Tab/Shift-Tab to move",
            Style::default().fg(Color::Gray),
        )));
        let dialog = Paragraph::new(fields)
            .block(
                Block::default()
                    .title(Span::styled(
                        title.to_string(),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: true });

        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_confirm(&self, f: &mut ratatui::Frame<'_>, title: &str, question: &str) {
        let area = centered_rect(50, 30, f.size());
        let body = vec![
            Line::from(Span::styled(
                question.to_string(),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press y to confirm, n or Esc to cancel"),
        ];
        let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
            Block::default()
                .title(Span::styled(
                    title.to_string(),
                    Style::default()
                        .fg(Color::LightRed)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightRed)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_prompt(&self, f: &mut ratatui::Frame<'_>, title: &str, input: &FieldValue) {
        let area = centered_rect(60, 20, f.size());
        let body = vec![
            Line::from(Span::styled(
                input.with_caret(),
                Style::default().fg(Color::Cyan),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Enter to apply • Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];
        let dialog = Paragraph::new(body).block(
            Block::default()
                .title(Span::styled(
                    title.to_string(),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

impl CardForm {
    fn new() -> Self {
        CardForm {
            text: FieldValue::new(""),
            description: FieldValue::new(""),
            labels: FieldValue::new(""),
            members: FieldValue::new(""),
            due: FieldValue::new(""),
            priority: FieldValue::new(""),
            color: FieldValue::new(""),
            field: FormField::Text,
        }
    }

    fn from_card(card: Card) -> Self {
        let members = card
            .members
            .iter()
            .map(|m| format!("{}/{}", m.name, m.initials))
            .collect::<Vec<_>>()
            .join(", ");
        CardForm {
            text: FieldValue::new(&card.text),
            description: FieldValue::new(&card.description),
            labels: FieldValue::new(&card.labels.join(" ")),
            members: FieldValue::new(&members),
            due: FieldValue::new(&card.due),
            priority: FieldValue::new(priority_label(card.priority)),
            color: FieldValue::new(&card.color),
            field: FormField::Text,
        }
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            FormField::Text => FormField::Description,
            FormField::Description => FormField::Labels,
            FormField::Labels => FormField::Members,
            FormField::Members => FormField::Due,
            FormField::Due => FormField::Priority,
            FormField::Priority => FormField::Color,
            FormField::Color => FormField::Text,
        };
    }

    fn prev_field(&mut self) {
        self.field = match self.field {
            FormField::Text => FormField::Color,
            FormField::Description => FormField::Text,
            FormField::Labels => FormField::Description,
            FormField::Members => FormField::Labels,
            FormField::Due => FormField::Members,
            FormField::Priority => FormField::Due,
            FormField::Color => FormField::Priority,
        };
    }

    fn active_field_mut(&mut self) -> &mut FieldValue {
        match self.field {
            FormField::Text => &mut self.text,
            FormField::Description => &mut self.description,
            FormField::Labels => &mut self.labels,
            FormField::Members => &mut self.members,
            FormField::Due => &mut self.due,
            FormField::Priority => &mut self.priority,
            FormField::Color => &mut self.color,
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn draw_card(f: &mut ratatui::Frame<'_>, area: Rect, card: &Card, selected: bool, lifted: bool) {
    let mut border = Style::default().fg(Color::DarkGray);
    let mut base = Style::default().bg(Color::Rgb(22, 24, 30)).fg(Color::Gray);
    if let Some(color) = parse_hex_color(&card.color) {
        border = border.fg(color);
    }
    if selected {
        base = Style::default()
            .bg(Color::Rgb(252, 214, 112))
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD);
        border = border.fg(Color::Yellow);
    }
    if lifted {
        base = base.add_modifier(Modifier::DIM);
        border = border.add_modifier(Modifier::DIM);
    }

    let inner_width = area.width.saturating_sub(2) as usize;
    let mut meta = Vec::new();
    if !card.due.is_empty() {
        meta.push(Span::styled(
            card.due.clone(),
            Style::default().fg(due_color(&card.due)),
        ));
    }
    if card.priority != Priority::None {
        meta.push(Span::styled(
            priority_label(card.priority).to_string(),
            Style::default().fg(priority_color(card.priority)),
        ));
    }
    if !card.labels.is_empty() {
        meta.push(Span::styled(
            "●".repeat(card.labels.len().min(5)),
            Style::default().fg(Color::LightGreen),
        ));
    }
    if !card.members.is_empty() {
        let initials: Vec<&str> = card.members.iter().map(|m| m.initials.as_str()).collect();
        meta.push(Span::styled(
            initials.join(","),
            Style::default().fg(Color::LightMagenta),
        ));
    }
    if card.attachment.is_some() {
        meta.push(Span::styled("[+]", Style::default().fg(Color::LightBlue)));
    }
    let mut meta_spans = Vec::new();
    for (i, span) in meta.into_iter().enumerate() {
        if i > 0 {
            meta_spans.push(Span::raw(" "));
        }
        meta_spans.push(span);
    }

    let lines = vec![
        Line::from(Span::styled(
            truncate_text(&card.text, inner_width),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(meta_spans),
    ];
    let widget = Paragraph::new(lines).style(base).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border),
    );
    f.render_widget(widget, area);
}

fn footer_help_line() -> Line<'static> {
    Line::from(vec![
        Span::styled("←↑↓→/hjkl", Style::default().fg(Color::LightCyan)),
        Span::raw(" select  "),
        Span::styled("drag", Style::default().fg(Color::LightGreen)),
        Span::raw(" reorder  "),
        Span::styled("n/e/d", Style::default().fg(Color::LightMagenta)),
        Span::raw(" card  "),
        Span::styled("N/R/D", Style::default().fg(Color::LightMagenta)),
        Span::raw(" list  "),
        Span::styled("J/K H/L m/b", Style::default().fg(Color::LightGreen)),
        Span::raw(" move  "),
        Span::styled("a", Style::default().fg(Color::LightBlue)),
        Span::raw(" attach  "),
        Span::styled("/ f g c", Style::default().fg(Color::LightYellow)),
        Span::raw(" filter  "),
        Span::styled("x", Style::default().fg(Color::LightRed)),
        Span::raw(" clear  "),
        Span::styled("q", Style::default().fg(Color::LightRed)),
        Span::raw(" quit"),
    ])
}

fn filter_summary(criteria: &FilterCriteria) -> String {
    let mut parts = Vec::new();
    if !criteria.query.is_empty() {
        parts.push(format!("\"{}\"", criteria.query));
    }
    for label in &criteria.labels {
        parts.push(label.clone());
    }
    if criteria.due != DueFilter::All {
        parts.push(format!("due:{}", criteria.due.label()));
    }
    format!("filter {}", parts.join(" "))
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn rect_contains(rect: Rect, x: u16, y: u16) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn adjust_offset(
    selected: usize,
    current_offset: usize,
    viewport: usize,
    scrolloff: usize,
    len: usize,
) -> usize {
    if viewport == 0 || len == 0 {
        return 0;
    }
    let max_offset = len.saturating_sub(viewport);
    let margin = scrolloff.min(viewport.saturating_sub(1));
    let mut offset = current_offset.min(max_offset);
    if selected < offset.saturating_add(margin) {
        offset = selected.saturating_sub(margin);
    } else {
        let upper = offset
            .saturating_add(viewport.saturating_sub(1))
            .saturating_sub(margin);
        if selected > upper {
            offset = selected.saturating_add(margin + 1).saturating_sub(viewport);
        }
    }
    offset.min(max_offset)
}

fn list_accent(list: &BoardList, idx: usize) -> Color {
    parse_hex_color(&list.color).unwrap_or_else(|| color_for_index(idx))
}

fn color_for_index(idx: usize) -> Color {
    let palette = [
        Color::Cyan,
        Color::LightGreen,
        Color::LightMagenta,
        Color::LightBlue,
        Color::LightYellow,
        Color::LightRed,
    ];
    palette[idx % palette.len()]
}

fn parse_hex_color(value: &str) -> Option<Color> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

fn due_color(due: &str) -> Color {
    match NaiveDate::parse_from_str(due, "%Y-%m-%d") {
        Ok(date) if date < Local::now().date_naive() => Color::LightRed,
        Ok(_) => Color::LightYellow,
        Err(_) => Color::Gray,
    }
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "high",
        Priority::Medium => "medium",
        Priority::Low => "low",
        Priority::None => "",
    }
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::LightRed,
        Priority::Medium => Color::LightYellow,
        Priority::Low => Color::LightGreen,
        Priority::None => Color::Gray,
    }
}

fn parse_priority_input(value: &str) -> Result<Priority> {
    match value.to_ascii_lowercase().as_str() {
        "" | "none" => Ok(Priority::None),
        "high" => Ok(Priority::High),
        "medium" => Ok(Priority::Medium),
        "low" => Ok(Priority::Low),
        other => Err(anyhow!("invalid priority: {other}")),
    }
}

fn split_tokens(input: &str) -> Vec<String> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().to_string())
        .collect()
}

fn parse_members_input(input: &str) -> Vec<Member> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| match entry.split_once('/') {
            Some((name, initials)) => Member {
                name: name.trim().to_string(),
                initials: initials.trim().to_string(),
            },
            None => Member {
                name: entry.to_string(),
                initials: entry.to_string(),
            },
        })
        .collect()
}

fn truncate_text(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        if out.chars().count() >= max.saturating_sub(3) {
            out.push_str("...");
            break;
        }
        out.push(ch);
    }
    if out.chars().count() > max {
        out.truncate(max);
    }
    out
}

fn field_lines(label: &str, field: &FieldValue, active: bool) -> Vec<Line<'static>> {
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD | Modifier::DIM);
    let value_style = Style::default().fg(if active { Color::Cyan } else { Color::White });
    let text = if active {
        field.with_caret()
    } else {
        field.value.clone()
    };
    vec![Line::from(vec![
        Span::styled(format!("{}: ", label), label_style),
        Span::styled(text, value_style),
    ])]
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

fn prev_char(cursor: usize, text: &str) -> usize {
    if cursor == 0 {
        return 0;
    }
    let mut prev = 0;
    for (idx, _) in text.char_indices() {
        if idx >= cursor {
            break;
        }
        prev = idx;
    }
    prev
}

fn next_char(cursor: usize, text: &str) -> usize {
    for (idx, ch) in text.char_indices() {
        if idx > cursor {
            return idx;
        }
        if idx == cursor {
            return cursor + ch.len_utf8();
        }
    }
    text.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{self, BoardLocation};

    fn app_with_board(board: Board, dir: &Path) -> App {
        let location = BoardLocation {
            path: dir.join("board.json"),
            scope: BoardScope::Project,
        };
        storage::save_board(&location, &board).unwrap();
        App::new(BoardStore::open(location).unwrap())
    }

    #[test]
    fn scrolled_list_drop_lands_at_the_absolute_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = BoardList::new("Source");
        for text in ["c0", "c1", "c2", "c3", "c4"] {
            source.cards.push(Card::new(text));
        }
        let mut other = BoardList::new("Other");
        other.cards.push(Card::new("d0"));
        let mut app = app_with_board(
            Board {
                lists: vec![source, other],
            },
            dir.path(),
        );

        let source_id = app.store.board().lists[0].id.clone();
        let other_id = app.store.board().lists[1].id.clone();
        let dragged_id = app.store.board().lists[1].cards[0].id.clone();
        // Source is scrolled past its first two cards, so only c2..c4 have
        // rendered rects.
        let visible: Vec<(String, Rect)> = app.store.board().lists[0].cards[2..]
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let rect = Rect::new(1, 1 + i as u16 * CARD_HEIGHT, 20, CARD_HEIGHT);
                (c.id.clone(), rect)
            })
            .collect();
        app.scroll_offsets = vec![2, 0];
        app.geometry = BoardGeometry {
            board_area: Rect::new(0, 0, 60, 30),
            lists: vec![
                ListGeometry {
                    list_id: source_id,
                    rect: Rect::new(0, 0, 24, 30),
                    header: Rect::new(0, 0, 24, 1),
                    offset: 2,
                    cards: visible,
                },
                ListGeometry {
                    list_id: other_id,
                    rect: Rect::new(24, 0, 24, 30),
                    header: Rect::new(24, 0, 24, 1),
                    offset: 0,
                    cards: vec![(dragged_id, Rect::new(25, 1, 20, CARD_HEIGHT))],
                },
            ],
        };

        app.mouse_down(26, 2).unwrap();
        assert!(app.card_drag.is_dragging());
        // Drop just above the first rendered card, which is the third card
        // overall.
        app.mouse_drag(2, 1);
        app.mouse_up().unwrap();

        let texts: Vec<&str> = app.store.board().lists[0]
            .cards
            .iter()
            .map(|c| c.text.as_str())
            .collect();
        assert_eq!(texts, vec!["c0", "c1", "d0", "c2", "c3", "c4"]);
        assert!(app.store.board().lists[1].cards.is_empty());
    }

    #[test]
    fn filter_keys_are_ignored_while_a_drag_is_in_flight() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with_board(Board::starter(), dir.path());
        let list_id = app.store.board().lists[0].id.clone();
        let card_id = app.store.board().lists[0].cards[0].id.clone();
        assert!(app
            .card_drag
            .start(DragPayload::card_move(&card_id, &list_id)));

        app.handle_normal_key(KeyEvent::new(KeyCode::Char('f'), KeyModifiers::NONE))
            .unwrap();
        assert_eq!(app.criteria.due, DueFilter::All);
        app.handle_normal_key(KeyEvent::new(KeyCode::Char('g'), KeyModifiers::NONE))
            .unwrap();
        assert!(app.criteria.labels.is_empty());
        app.handle_normal_key(KeyEvent::new(KeyCode::Char('/'), KeyModifiers::NONE))
            .unwrap();
        assert!(matches!(app.mode, Mode::Normal));
        assert!(!app.criteria.is_active());
        assert!(app.card_drag.is_dragging());
    }

    #[test]
    fn hex_colors_parse_and_reject_garbage() {
        assert_eq!(parse_hex_color("#7a5b0a"), Some(Color::Rgb(0x7a, 0x5b, 0x0a)));
        assert_eq!(parse_hex_color(""), None);
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("7a5b0a"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
    }

    #[test]
    fn member_input_splits_on_commas() {
        let members = parse_members_input("Anshu Kumar/AK, BB");
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].name, "Anshu Kumar");
        assert_eq!(members[0].initials, "AK");
        assert_eq!(members[1].initials, "BB");
        assert!(parse_members_input("  ").is_empty());
    }

    #[test]
    fn field_editing_moves_by_char_boundary() {
        let mut field = FieldValue::new("ab");
        field.move_left();
        field.insert_char('x');
        assert_eq!(field.value, "axb");
        field.backspace();
        assert_eq!(field.value, "ab");
        field.move_right();
        field.insert_char('c');
        assert_eq!(field.value, "abc");
    }

    #[test]
    fn rect_hit_testing_uses_half_open_bounds() {
        let rect = Rect::new(2, 3, 4, 2);
        assert!(rect_contains(rect, 2, 3));
        assert!(rect_contains(rect, 5, 4));
        assert!(!rect_contains(rect, 6, 3));
        assert!(!rect_contains(rect, 2, 5));
    }
}
