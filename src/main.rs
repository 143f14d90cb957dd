mod attachment;
mod cli;
mod commands;
mod drag;
mod filter;
mod logging;
mod model;
mod storage;
mod store;
mod ui;

use anyhow::Result;
use clap::Parser;
use log::warn;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    match storage::log_dir().and_then(|dir| logging::init(&dir)) {
        Ok(()) => {}
        Err(err) => eprintln!("warning: logging disabled ({err})"),
    }
    let command = args.command.unwrap_or(cli::Command::Tui);
    let result = match command {
        cli::Command::Init => commands::init(),
        cli::Command::List {
            list,
            query,
            labels,
            due,
        } => commands::list(list, query, labels, due),
        cli::Command::AddList { title, color } => commands::add_list(title, color),
        cli::Command::Add {
            text,
            description,
            labels,
            members,
            due,
            priority,
            color,
            list,
        } => commands::add(text, description, labels, members, due, priority, color, list),
        cli::Command::Edit {
            card_id,
            text,
            description,
            labels,
            clear_labels,
            members,
            due,
            clear_due,
            priority,
            color,
        } => commands::edit(
            card_id,
            text,
            description,
            labels,
            clear_labels,
            members,
            due,
            clear_due,
            priority,
            color,
        ),
        cli::Command::Move {
            card_id,
            list,
            index,
        } => commands::move_card(card_id, list, index),
        cli::Command::MoveList { from, to } => commands::move_list(from, to),
        cli::Command::Delete { card_id } => commands::delete(card_id),
        cli::Command::DeleteList { list } => commands::delete_list(list),
        cli::Command::Attach { card_id, path } => commands::attach(card_id, &path),
        cli::Command::Clear { yes } => commands::clear(yes),
        cli::Command::Tui => commands::tui(),
    };
    if let Err(ref err) = result {
        warn!("command failed: {err:#}");
    }
    result
}
