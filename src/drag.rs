//! Drag-and-drop reorder tracking.
//!
//! A drag session turns a continuous pointer gesture into a single target
//! index. Sibling geometry is injected as [`ZoneItem`]s (visual order, one
//! per rendered element, lifted source included), so the anchor search works
//! the same over any rendering surface and stays unit-testable. The
//! placeholder's position among a container's children is the single source
//! of truth for the drop index, read once at drop time.

use log::debug;
use serde::{Deserialize, Serialize};

/// Marker channel distinguishing the two gesture kinds. A list-reorder
/// payload is never interpreted by a card tracker and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    ListReorder,
    CardMove,
}

/// Structured payload of the card-move channel.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct CardRef {
    card_id: String,
    from_list_id: String,
}

/// Wire-format drag payload: the list channel carries the origin index as a
/// string-encoded integer, the card channel a small JSON record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragPayload {
    channel: Channel,
    data: String,
}

impl DragPayload {
    pub fn list_reorder(from_index: usize) -> Self {
        DragPayload {
            channel: Channel::ListReorder,
            data: from_index.to_string(),
        }
    }

    pub fn card_move(card_id: &str, from_list_id: &str) -> Self {
        let data = serde_json::to_string(&CardRef {
            card_id: card_id.to_string(),
            from_list_id: from_list_id.to_string(),
        })
        // An unserializable payload yields empty data, which the drop path
        // treats as a protocol failure and silently aborts.
        .unwrap_or_default();
        DragPayload {
            channel: Channel::CardMove,
            data,
        }
    }

    fn list_index(&self) -> Option<usize> {
        self.data.parse().ok()
    }

    fn card_ref(&self) -> Option<CardRef> {
        serde_json::from_str(&self.data).ok()
    }
}

/// Geometry snapshot of one sibling in a drop container, in visual order.
/// The lifted (currently dragged) element keeps its slot but is excluded
/// from anchor candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneItem {
    /// Center coordinate along the container axis (x for lists, y for cards).
    pub center: f32,
    pub lifted: bool,
}

impl ZoneItem {
    pub fn new(center: f32) -> Self {
        ZoneItem {
            center,
            lifted: false,
        }
    }

    pub fn lifted(center: f32) -> Self {
        ZoneItem {
            center,
            lifted: true,
        }
    }
}

/// The transient marker for the pending drop position: which container it
/// currently sits in, its index among that container's children, and the
/// footprint inherited from the dragged element.
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    pub zone: String,
    pub index: usize,
    pub length: f32,
}

/// Committed outcome of a drop, ready for the board store.
#[derive(Debug, Clone, PartialEq)]
pub enum DropAction {
    MoveList {
        from: usize,
        to: usize,
    },
    MoveCard {
        card_id: String,
        from_list_id: String,
        to_list_id: String,
        to_index: usize,
    },
}

#[derive(Debug)]
enum DragState {
    Idle,
    Dragging {
        payload: DragPayload,
        placeholder: Option<Placeholder>,
    },
}

/// Per-gesture state machine: Idle -> Dragging -> (dropped | cancelled) ->
/// Idle. One instance tracks list reorders, an independent one card moves.
/// Protocol failures never surface as errors; they abort the session.
#[derive(Debug)]
pub struct DragTracker {
    expected: Channel,
    state: DragState,
}

impl DragTracker {
    pub fn new(expected: Channel) -> Self {
        DragTracker {
            expected,
            state: DragState::Idle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn payload(&self) -> Option<&DragPayload> {
        match &self.state {
            DragState::Dragging { payload, .. } => Some(payload),
            DragState::Idle => None,
        }
    }

    /// Origin index of an in-flight list reorder, for lifting the source.
    pub fn dragged_list_index(&self) -> Option<usize> {
        self.payload()
            .filter(|p| p.channel == Channel::ListReorder)?
            .list_index()
    }

    /// ID of the card being dragged, for lifting the source.
    pub fn dragged_card_id(&self) -> Option<String> {
        let card = self
            .payload()
            .filter(|p| p.channel == Channel::CardMove)?
            .card_ref()?;
        Some(card.card_id)
    }

    pub fn placeholder(&self) -> Option<&Placeholder> {
        match &self.state {
            DragState::Dragging { placeholder, .. } => placeholder.as_ref(),
            DragState::Idle => None,
        }
    }

    /// Begins a session. Payloads of the wrong channel are refused, so a
    /// card gesture can never start a list drag.
    pub fn start(&mut self, payload: DragPayload) -> bool {
        if payload.channel != self.expected || self.is_dragging() {
            return false;
        }
        debug!("drag start: {:?}", payload.channel);
        self.state = DragState::Dragging {
            payload,
            placeholder: None,
        };
        true
    }

    /// Continuous drag-over step. `items` are the container's currently
    /// rendered children in visual order; `pointer` is the gesture
    /// coordinate along the container axis. Finds the insertion anchor (the
    /// first non-lifted sibling whose center the pointer has not yet
    /// passed), lazily creates the session's one placeholder sized from
    /// `dragged_len`, and repositions it. Idempotent: repeated calls with
    /// the same geometry leave exactly one placeholder in the same slot.
    pub fn drag_over(&mut self, zone: &str, items: &[ZoneItem], dragged_len: f32, pointer: f32) {
        let DragState::Dragging {
            payload,
            placeholder,
        } = &mut self.state
        else {
            return;
        };
        if payload.channel != self.expected {
            return;
        }
        let index = insertion_anchor(items, pointer).unwrap_or(items.len());
        let length = placeholder.as_ref().map(|p| p.length).unwrap_or(dragged_len);
        *placeholder = Some(Placeholder {
            zone: zone.to_string(),
            index,
            length,
        });
    }

    /// Removes the placeholder without ending the session, mirroring the
    /// pointer wandering off any valid container mid-drag.
    pub fn clear_placeholder(&mut self) {
        if let DragState::Dragging { placeholder, .. } = &mut self.state {
            *placeholder = None;
        }
    }

    /// Ends the session and derives the committing move from the
    /// placeholder's final position. Returns `None` (session already reset)
    /// when there is no placeholder or the payload fails to parse.
    ///
    /// List moves correct the raw index for the source list's own slot:
    /// removing it first shifts later indices down by one. Card moves pass
    /// the raw index through; the store's `move_card` already interprets it
    /// against the post-removal sequence.
    pub fn drop(&mut self) -> Option<DropAction> {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        let DragState::Dragging {
            payload,
            placeholder,
        } = state
        else {
            return None;
        };
        let ph = placeholder?;
        match payload.channel {
            Channel::ListReorder => {
                let from = payload.list_index()?;
                let raw = ph.index;
                let to = if from < raw { raw - 1 } else { raw };
                if from == to {
                    return None;
                }
                debug!("drop list: {from} -> {to} (raw {raw})");
                Some(DropAction::MoveList { from, to })
            }
            Channel::CardMove => {
                let card = payload.card_ref()?;
                debug!(
                    "drop card {}: {} -> {} @ {}",
                    card.card_id, card.from_list_id, ph.zone, ph.index
                );
                Some(DropAction::MoveCard {
                    card_id: card.card_id,
                    from_list_id: card.from_list_id,
                    to_list_id: ph.zone,
                    to_index: ph.index,
                })
            }
        }
    }

    /// Aborts the session: placeholder and lifted marker go away, nothing
    /// is committed.
    pub fn cancel(&mut self) {
        if self.is_dragging() {
            debug!("drag cancelled");
        }
        self.state = DragState::Idle;
    }
}

/// Finds the insertion anchor: among non-lifted siblings, the one whose
/// center lies past the pointer by the smallest margin (offset = pointer -
/// center; candidates have offset < 0; the least negative wins). `None`
/// means the pointer is past every sibling and the drop goes to the end.
fn insertion_anchor(items: &[ZoneItem], pointer: f32) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, item) in items.iter().enumerate() {
        if item.lifted {
            continue;
        }
        let offset = pointer - item.center;
        if offset < 0.0 && best.map_or(true, |(_, b)| offset > b) {
            best = Some((idx, offset));
        }
    }
    best.map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(centers: &[f32]) -> Vec<ZoneItem> {
        centers.iter().map(|&c| ZoneItem::new(c)).collect()
    }

    #[test]
    fn anchor_is_first_center_not_yet_passed() {
        let siblings = items(&[50.0, 150.0, 250.0]);
        assert_eq!(insertion_anchor(&siblings, 120.0), Some(1));
    }

    #[test]
    fn anchor_is_none_past_all_siblings() {
        let siblings = items(&[50.0, 150.0, 250.0]);
        assert_eq!(insertion_anchor(&siblings, 260.0), None);
    }

    #[test]
    fn anchor_before_everything_is_the_first_sibling() {
        let siblings = items(&[50.0, 150.0, 250.0]);
        assert_eq!(insertion_anchor(&siblings, 10.0), Some(0));
    }

    #[test]
    fn anchor_skips_the_lifted_element() {
        let siblings = vec![
            ZoneItem::lifted(50.0),
            ZoneItem::new(150.0),
            ZoneItem::new(250.0),
        ];
        // The lifted element's own center does not count as a candidate.
        assert_eq!(insertion_anchor(&siblings, 10.0), Some(1));
    }

    #[test]
    fn anchor_of_empty_container_is_end() {
        assert_eq!(insertion_anchor(&[], 100.0), None);
    }

    #[test]
    fn tracker_refuses_wrong_channel() {
        let mut lists = DragTracker::new(Channel::ListReorder);
        assert!(!lists.start(DragPayload::card_move("c1", "l1")));
        assert!(!lists.is_dragging());

        let mut cards = DragTracker::new(Channel::CardMove);
        assert!(!cards.start(DragPayload::list_reorder(0)));
        assert!(!cards.is_dragging());
    }

    #[test]
    fn drag_over_is_idempotent_and_keeps_one_placeholder() {
        let mut tracker = DragTracker::new(Channel::CardMove);
        assert!(tracker.start(DragPayload::card_move("c1", "l1")));

        let siblings = items(&[10.0, 30.0, 50.0]);
        tracker.drag_over("l2", &siblings, 4.0, 25.0);
        let first = tracker.placeholder().cloned().unwrap();
        assert_eq!(first.index, 1);
        assert_eq!(first.zone, "l2");
        assert_eq!(first.length, 4.0);

        // Same pointer, repeated events: same single placeholder.
        tracker.drag_over("l2", &siblings, 4.0, 25.0);
        tracker.drag_over("l2", &siblings, 4.0, 25.0);
        assert_eq!(tracker.placeholder(), Some(&first));

        // Footprint is captured once per session, not per event.
        tracker.drag_over("l2", &siblings, 9.0, 45.0);
        let moved = tracker.placeholder().unwrap();
        assert_eq!(moved.index, 2);
        assert_eq!(moved.length, 4.0);
    }

    #[test]
    fn drag_over_while_idle_is_ignored() {
        let mut tracker = DragTracker::new(Channel::CardMove);
        tracker.drag_over("l1", &items(&[10.0]), 4.0, 5.0);
        assert!(tracker.placeholder().is_none());
    }

    #[test]
    fn list_drop_corrects_for_the_removed_source() {
        // Board [A, B, C]; drag A past B: placeholder lands at raw child
        // index 2 (A still occupies slot 0), corrected to 1.
        let mut tracker = DragTracker::new(Channel::ListReorder);
        assert!(tracker.start(DragPayload::list_reorder(0)));
        let siblings = vec![
            ZoneItem::lifted(50.0),
            ZoneItem::new(150.0),
            ZoneItem::new(250.0),
        ];
        tracker.drag_over("board", &siblings, 30.0, 200.0);
        assert_eq!(tracker.placeholder().unwrap().index, 2);
        assert_eq!(
            tracker.drop(),
            Some(DropAction::MoveList { from: 0, to: 1 })
        );
        assert!(!tracker.is_dragging());
    }

    #[test]
    fn list_drop_without_net_movement_commits_nothing() {
        // Dropping right back where the list came from: raw index 1,
        // corrected to 0 == from.
        let mut tracker = DragTracker::new(Channel::ListReorder);
        assert!(tracker.start(DragPayload::list_reorder(0)));
        let siblings = vec![ZoneItem::lifted(50.0), ZoneItem::new(150.0)];
        tracker.drag_over("board", &siblings, 30.0, 100.0);
        assert_eq!(tracker.placeholder().unwrap().index, 1);
        assert_eq!(tracker.drop(), None);
        assert!(!tracker.is_dragging());
    }

    #[test]
    fn list_drop_before_the_source_needs_no_correction() {
        let mut tracker = DragTracker::new(Channel::ListReorder);
        assert!(tracker.start(DragPayload::list_reorder(2)));
        let siblings = vec![
            ZoneItem::new(50.0),
            ZoneItem::new(150.0),
            ZoneItem::lifted(250.0),
        ];
        tracker.drag_over("board", &siblings, 30.0, 20.0);
        assert_eq!(
            tracker.drop(),
            Some(DropAction::MoveList { from: 2, to: 0 })
        );
    }

    #[test]
    fn card_drop_passes_the_raw_placeholder_index_through() {
        let mut tracker = DragTracker::new(Channel::CardMove);
        assert!(tracker.start(DragPayload::card_move("c1", "l1")));
        let siblings = items(&[10.0, 30.0]);
        tracker.drag_over("l2", &siblings, 4.0, 100.0);
        assert_eq!(
            tracker.drop(),
            Some(DropAction::MoveCard {
                card_id: "c1".into(),
                from_list_id: "l1".into(),
                to_list_id: "l2".into(),
                to_index: 2,
            })
        );
    }

    #[test]
    fn drop_without_placeholder_aborts_silently() {
        let mut tracker = DragTracker::new(Channel::CardMove);
        assert!(tracker.start(DragPayload::card_move("c1", "l1")));
        assert_eq!(tracker.drop(), None);
        assert!(!tracker.is_dragging());
    }

    #[test]
    fn drop_with_malformed_payload_aborts_silently() {
        let mut tracker = DragTracker::new(Channel::ListReorder);
        assert!(tracker.start(DragPayload {
            channel: Channel::ListReorder,
            data: "not-a-number".into(),
        }));
        tracker.drag_over("board", &items(&[50.0]), 30.0, 10.0);
        assert_eq!(tracker.drop(), None);
        assert!(!tracker.is_dragging());
    }

    #[test]
    fn cancel_discards_placeholder_and_session() {
        let mut tracker = DragTracker::new(Channel::CardMove);
        assert!(tracker.start(DragPayload::card_move("c1", "l1")));
        tracker.drag_over("l1", &items(&[10.0]), 4.0, 5.0);
        assert!(tracker.placeholder().is_some());
        tracker.cancel();
        assert!(!tracker.is_dragging());
        assert!(tracker.placeholder().is_none());
        assert_eq!(tracker.drop(), None);
    }

    #[test]
    fn clear_placeholder_keeps_the_session_alive() {
        let mut tracker = DragTracker::new(Channel::CardMove);
        assert!(tracker.start(DragPayload::card_move("c1", "l1")));
        tracker.drag_over("l1", &items(&[10.0]), 4.0, 5.0);
        tracker.clear_placeholder();
        assert!(tracker.is_dragging());
        // No placeholder at release time means no mutation.
        assert_eq!(tracker.drop(), None);
    }

    #[test]
    fn same_list_reorder_keeps_the_known_raw_index_semantics() {
        // L=[c1,c2,c3], dragging c1 to just before c3: the lifted card
        // still occupies child slot 0, so the raw index is 2 and is handed
        // to the store as-is.
        let mut tracker = DragTracker::new(Channel::CardMove);
        assert!(tracker.start(DragPayload::card_move("c1", "l1")));
        let siblings = vec![
            ZoneItem::lifted(10.0),
            ZoneItem::new(30.0),
            ZoneItem::new(50.0),
        ];
        tracker.drag_over("l1", &siblings, 4.0, 45.0);
        match tracker.drop() {
            Some(DropAction::MoveCard { to_index, .. }) => assert_eq!(to_index, 2),
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn dragged_source_accessors_expose_the_lifted_element() {
        let mut lists = DragTracker::new(Channel::ListReorder);
        lists.start(DragPayload::list_reorder(3));
        assert_eq!(lists.dragged_list_index(), Some(3));
        assert_eq!(lists.dragged_card_id(), None);

        let mut cards = DragTracker::new(Channel::CardMove);
        cards.start(DragPayload::card_move("c9", "l2"));
        assert_eq!(cards.dragged_card_id(), Some("c9".into()));
        assert_eq!(cards.dragged_list_index(), None);
    }
}
