//! Live-reload notifications
//!
//! Tasks with `reload: true` announce the CSS files they wrote. The server
//! that pushes them to browsers lives outside this crate; it plugs in through
//! [`Reloader`].

use crate::runner::Verbosity;
use crate::ui;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::mpsc::Sender;

/// Files written by one task run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadEvent {
    pub task: String,
    pub files: Vec<PathBuf>,
}

/// Receiver of live-reload notifications
///
/// `verbosity` is the running context's, so receivers that print can stay
/// quiet when asked to.
pub trait Reloader {
    fn reload(&self, event: &ReloadEvent, verbosity: Verbosity);
}

/// Prints reloaded files
#[derive(Debug, Default)]
pub struct LogReloader;

impl LogReloader {
    /// Lines printed for an event; none below normal verbosity
    fn lines(event: &ReloadEvent, verbosity: Verbosity) -> Vec<String> {
        if verbosity < Verbosity::Normal {
            return Vec::new();
        }
        event
            .files
            .iter()
            .map(|file| {
                format!(
                    "[{}] {} {}",
                    ui::timestamp().dimmed(),
                    "Reload".green(),
                    ui::path(file)
                )
            })
            .collect()
    }
}

impl Reloader for LogReloader {
    fn reload(&self, event: &ReloadEvent, verbosity: Verbosity) {
        for line in Self::lines(event, verbosity) {
            eprintln!("{}", line);
        }
    }
}

/// Forwards events over a channel, e.g. to an embedding dev server
pub struct ChannelReloader {
    sender: Sender<ReloadEvent>,
}

impl ChannelReloader {
    pub fn new(sender: Sender<ReloadEvent>) -> Self {
        ChannelReloader { sender }
    }
}

impl Reloader for ChannelReloader {
    fn reload(&self, event: &ReloadEvent, _verbosity: Verbosity) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.sender.send(event.clone());
    }
}
