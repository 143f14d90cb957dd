use crate::model::Board;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use log::warn;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Fixed namespace key for the persisted board; the on-disk file is
/// `<key>.json` and the value is the JSON-serialized board.
pub const STORAGE_KEY: &str = "tacks_board_v1";

const PROJECT_DIR: &str = ".tacks";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardScope {
    Project,
    Global,
}

#[derive(Debug, Clone)]
pub struct BoardLocation {
    pub path: PathBuf,
    pub scope: BoardScope,
}

fn board_file_name() -> String {
    format!("{STORAGE_KEY}.json")
}

pub fn init_project_board() -> Result<BoardLocation> {
    let cwd = env::current_dir()?;
    let dir = cwd.join(PROJECT_DIR);
    fs::create_dir_all(&dir).context("failed to create .tacks directory")?;
    let location = BoardLocation {
        path: dir.join(board_file_name()),
        scope: BoardScope::Project,
    };
    if !location.path.exists() {
        save_board(&location, &Board::starter())?;
    }
    Ok(location)
}

pub fn locate_board(start: &Path) -> Result<BoardLocation> {
    if let Some(project_path) = find_project_board(start) {
        return Ok(BoardLocation {
            path: project_path,
            scope: BoardScope::Project,
        });
    }
    Ok(BoardLocation {
        path: global_board_path()?,
        scope: BoardScope::Global,
    })
}

/// Loads the board from its location. A missing file writes and returns the
/// starter board; a corrupt file falls back to the starter board without
/// overwriting what is on disk (the next mutation will).
pub fn load_board(location: &BoardLocation) -> Result<Board> {
    if !location.path.exists() {
        let board = Board::starter();
        save_board(location, &board)?;
        return Ok(board);
    }
    let data = fs::read_to_string(&location.path)
        .with_context(|| format!("reading {:?}", location.path))?;
    match serde_json::from_str(&data) {
        Ok(board) => Ok(board),
        Err(err) => {
            warn!(
                "board file {} is corrupt ({err}); falling back to the starter board",
                location.path.display()
            );
            Ok(Board::starter())
        }
    }
}

pub fn save_board(location: &BoardLocation, board: &Board) -> Result<()> {
    if let Some(parent) = location.path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_json::to_string(board).context("serializing board")?;
    fs::write(&location.path, serialized)
        .with_context(|| format!("writing {:?}", location.path))?;
    Ok(())
}

/// Deletes the persisted board; the next load reconstructs the starter
/// board.
pub fn clear_board(location: &BoardLocation) -> Result<()> {
    if location.path.exists() {
        fs::remove_file(&location.path)
            .with_context(|| format!("removing {:?}", location.path))?;
    }
    Ok(())
}

fn find_project_board(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(PROJECT_DIR).join(board_file_name());
        if candidate.exists() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

fn global_board_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "tacks").context("locating data directory")?;
    Ok(dirs.data_dir().join(board_file_name()))
}

/// Directory for log files, next to the global board.
pub fn log_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "tacks").context("locating data directory")?;
    Ok(dirs.data_dir().join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Card;

    fn location_in(dir: &Path) -> BoardLocation {
        BoardLocation {
            path: dir.join(board_file_name()),
            scope: BoardScope::Project,
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let location = location_in(dir.path());
        let mut board = Board::starter();
        board.lists[1].cards.push(Card::new("buy milk"));

        save_board(&location, &board).unwrap();
        let loaded = load_board(&location).unwrap();
        assert_eq!(loaded, board);
    }

    #[test]
    fn missing_file_writes_and_returns_the_starter_board() {
        let dir = tempfile::tempdir().unwrap();
        let location = location_in(dir.path());
        assert!(!location.path.exists());

        let board = load_board(&location).unwrap();
        assert_eq!(board, Board::starter());
        assert!(location.path.exists());
    }

    #[test]
    fn corrupt_file_falls_back_without_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let location = location_in(dir.path());
        fs::write(&location.path, "{not json").unwrap();

        let board = load_board(&location).unwrap();
        assert_eq!(board, Board::starter());
        // The broken file stays on disk until the next save.
        assert_eq!(fs::read_to_string(&location.path).unwrap(), "{not json");
    }

    #[test]
    fn clear_deletes_the_file_and_load_recreates_the_starter() {
        let dir = tempfile::tempdir().unwrap();
        let location = location_in(dir.path());
        save_board(&location, &Board::default()).unwrap();

        clear_board(&location).unwrap();
        assert!(!location.path.exists());
        clear_board(&location).unwrap();

        let board = load_board(&location).unwrap();
        assert_eq!(board, Board::starter());
    }

    #[test]
    fn project_board_is_found_from_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join(PROJECT_DIR);
        fs::create_dir_all(&project).unwrap();
        let board_path = project.join(board_file_name());
        save_board(
            &BoardLocation {
                path: board_path.clone(),
                scope: BoardScope::Project,
            },
            &Board::starter(),
        )
        .unwrap();

        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_project_board(&nested), Some(board_path));
        let elsewhere = tempfile::tempdir().unwrap();
        assert_eq!(find_project_board(elsewhere.path()), None);
    }

    #[test]
    fn board_file_carries_the_storage_key_name() {
        assert_eq!(board_file_name(), "tacks_board_v1.json");
    }
}
