//! The board store: sole owner of the canonical board state. Every
//! mutation goes through here, and every mutation that changes the board
//! re-serializes it to persistent storage before returning. Lookup misses
//! are silent no-ops (the model reports "unchanged" and nothing is
//! written); only storage I/O can fail.

use crate::model::{Board, Card, ListPatch};
use crate::storage::{self, BoardLocation};
use anyhow::Result;
use log::{debug, info};
use std::env;

pub struct BoardStore {
    board: Board,
    location: BoardLocation,
}

impl BoardStore {
    /// Loads the board at `location` (or the starter board when absent).
    pub fn open(location: BoardLocation) -> Result<Self> {
        let board = storage::load_board(&location)?;
        info!(
            "opened board at {} ({} lists)",
            location.path.display(),
            board.lists.len()
        );
        Ok(BoardStore { board, location })
    }

    /// Opens the board for the current directory: nearest project board, or
    /// the global one.
    pub fn open_current() -> Result<Self> {
        let cwd = env::current_dir()?;
        let location = storage::locate_board(&cwd)?;
        Self::open(location)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn location(&self) -> &BoardLocation {
        &self.location
    }

    pub fn add_list(&mut self, title: &str) -> Result<bool> {
        let changed = self.board.add_list(title);
        self.flush_if(changed)
    }

    pub fn update_list(&mut self, list_id: &str, patch: ListPatch) -> Result<bool> {
        let changed = self.board.update_list(list_id, patch);
        self.flush_if(changed)
    }

    pub fn delete_list(&mut self, list_id: &str) -> Result<bool> {
        let changed = self.board.delete_list(list_id);
        self.flush_if(changed)
    }

    pub fn move_list(&mut self, from: usize, to: usize) -> Result<bool> {
        let changed = self.board.move_list(from, to);
        if changed {
            debug!("moved list {from} -> {to}");
        }
        self.flush_if(changed)
    }

    pub fn save_card(&mut self, card: Card, list_id: &str) -> Result<bool> {
        let changed = self.board.save_card(card, list_id);
        self.flush_if(changed)
    }

    pub fn delete_card(&mut self, card_id: &str, list_id: &str) -> Result<bool> {
        let changed = self.board.delete_card(card_id, list_id);
        self.flush_if(changed)
    }

    pub fn move_card(
        &mut self,
        card_id: &str,
        from_list_id: &str,
        to_list_id: &str,
        to_index: usize,
    ) -> Result<bool> {
        let changed = self
            .board
            .move_card(card_id, from_list_id, to_list_id, to_index);
        if changed {
            debug!("moved card {card_id}: {from_list_id} -> {to_list_id} @ {to_index}");
        }
        self.flush_if(changed)
    }

    /// Deletes the persisted board and resets the in-memory state to the
    /// starter board.
    pub fn clear(&mut self) -> Result<()> {
        storage::clear_board(&self.location)?;
        self.board = storage::load_board(&self.location)?;
        info!("cleared board at {}", self.location.path.display());
        Ok(())
    }

    fn flush_if(&mut self, changed: bool) -> Result<bool> {
        if changed {
            storage::save_board(&self.location, &self.board)?;
        }
        Ok(changed)
    }
}
