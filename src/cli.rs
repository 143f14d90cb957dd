use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tacks", version, about = "Terminal kanban board with drag-and-drop")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a project board in the current directory
    Init,
    /// Print the board, optionally filtered
    List {
        /// Show only this list (by id or title)
        #[arg(long)]
        list: Option<String>,
        /// Text search over card titles, descriptions and members
        #[arg(long, short = 'q')]
        query: Option<String>,
        /// Keep cards carrying this label color (repeatable)
        #[arg(long = "label", short = 'l')]
        labels: Vec<String>,
        /// Due window: all, overdue, today or week
        #[arg(long)]
        due: Option<String>,
    },
    /// Add a new list to the board
    AddList {
        /// List title
        title: String,
        /// Header color (hex, e.g. #7a5b0a)
        #[arg(long)]
        color: Option<String>,
    },
    /// Add a new card
    Add {
        /// Card title
        text: String,
        /// Longer description
        #[arg(long)]
        description: Option<String>,
        /// Label colors (repeatable)
        #[arg(long = "label", short = 'l')]
        labels: Vec<String>,
        /// Members as NAME/INITIALS or bare initials (repeatable)
        #[arg(long = "member", short = 'm')]
        members: Vec<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Priority: high, medium or low
        #[arg(long)]
        priority: Option<String>,
        /// Card color (hex)
        #[arg(long)]
        color: Option<String>,
        /// Destination list (by id or title, defaults to the first list)
        #[arg(long)]
        list: Option<String>,
    },
    /// Edit an existing card
    Edit {
        /// Card id
        card_id: String,
        /// New title
        #[arg(long)]
        text: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// Replace labels (repeatable)
        #[arg(long = "label", short = 'l')]
        labels: Vec<String>,
        /// Clear all labels
        #[arg(long)]
        clear_labels: bool,
        /// Replace members (repeatable, NAME/INITIALS)
        #[arg(long = "member", short = 'm')]
        members: Vec<String>,
        /// New due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Clear the due date
        #[arg(long)]
        clear_due: bool,
        /// New priority: high, medium, low or none
        #[arg(long)]
        priority: Option<String>,
        /// New card color (hex)
        #[arg(long)]
        color: Option<String>,
    },
    /// Move a card to another list (or position)
    Move {
        /// Card id
        card_id: String,
        /// Destination list (by id or title)
        list: String,
        /// Position in the destination list (defaults to the end)
        #[arg(long)]
        index: Option<usize>,
    },
    /// Reorder the board's lists
    MoveList {
        /// Current position (0-based)
        from: usize,
        /// New position (0-based)
        to: usize,
    },
    /// Delete a card
    Delete {
        /// Card id
        card_id: String,
    },
    /// Delete a list and all of its cards
    DeleteList {
        /// List id or title
        list: String,
    },
    /// Attach a file to a card (1 MiB max, stored inline)
    Attach {
        /// Card id
        card_id: String,
        /// Path to the file
        path: std::path::PathBuf,
    },
    /// Delete the stored board and start over
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Launch the interactive TUI
    Tui,
}
