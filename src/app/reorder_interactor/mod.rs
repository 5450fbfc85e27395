// Reorder interactor - Lets the user confirm or rebuild the merge order

use std::path::PathBuf;

use crate::domain::model::*;
use crate::ports::PromptPort;

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    /// Show the default order and ask whether it is correct
    Presenting,
    /// Pick one file per position
    Reordering,
    /// Show the picked order and ask for confirmation
    Previewing(Vec<usize>),
    Finished(Option<FileOrder>),
}

/// Parsed reply to a yes/no question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Yes,
    No,
    Quit,
}

fn is_quit(reply: &str) -> bool {
    matches!(reply, "q" | "quit" | "exit")
}

fn is_undo(reply: &str) -> bool {
    matches!(reply, "b" | "back" | "u" | "undo")
}

/// Interactor for the interactive file-ordering protocol
#[derive(Debug, Default, Clone)]
pub struct ReorderInteractor;

impl ReorderInteractor {
    /// Create new reorder interactor
    pub fn new() -> Self {
        Self
    }

    /// Confirm `files` as the merge order or let the user rebuild it.
    ///
    /// Returns `None` when the user cancels, otherwise a full permutation of
    /// `files`. `auto_confirm` accepts the given order without prompting.
    pub fn execute(
        &self,
        files: Vec<PathBuf>,
        auto_confirm: bool,
        prompt: &mut dyn PromptPort,
    ) -> Option<FileOrder> {
        prompt.show(&format!("Files will be merged in this order ({}):", files.len()));
        Self::show_list(&files, prompt);
        if auto_confirm {
            prompt.show("Auto-confirm enabled, skipping prompts");
            return Some(FileOrder::from_collected(files));
        }

        let mut state = State::Presenting;
        loop {
            state = match state {
                State::Presenting => self.present(&files, prompt),
                State::Reordering => self.reorder(&files, prompt),
                State::Previewing(picks) => self.preview(&files, picks, prompt),
                State::Finished(order) => {
                    if order.is_none() {
                        prompt.show("Cancelled");
                    }
                    return order;
                }
            };
        }
    }

    fn show_list(files: &[PathBuf], prompt: &mut dyn PromptPort) {
        for (index, file) in files.iter().enumerate() {
            prompt.show(&format!("  [{}] {}", index + 1, display_name(file)));
        }
    }

    fn ask_yes_no(question: &str, prompt: &mut dyn PromptPort) -> Answer {
        loop {
            let Some(reply) = prompt.ask(question) else {
                return Answer::Quit;
            };
            match reply.trim().to_lowercase().as_str() {
                "y" | "yes" => return Answer::Yes,
                "n" | "no" => return Answer::No,
                other if is_quit(other) => return Answer::Quit,
                _ => prompt.show("Please answer y, n or q"),
            }
        }
    }

    fn present(&self, files: &[PathBuf], prompt: &mut dyn PromptPort) -> State {
        match Self::ask_yes_no("Is this order correct? [y/n]: ", prompt) {
            Answer::Yes => State::Finished(Some(FileOrder::from_collected(files.to_vec()))),
            Answer::No => State::Reordering,
            Answer::Quit => State::Finished(None),
        }
    }

    fn reorder(&self, files: &[PathBuf], prompt: &mut dyn PromptPort) -> State {
        let count = files.len();
        prompt.show("");
        prompt.show("========== Custom order ==========");
        Self::show_list(files, prompt);
        prompt.show("Enter a number for each position, b to undo, q to cancel");

        let mut picks: Vec<usize> = Vec::with_capacity(count);
        while picks.len() < count {
            let position = picks.len() + 1;
            let Some(reply) = prompt.ask(&format!("Position {}/{}: ", position, count)) else {
                return State::Finished(None);
            };
            let reply = reply.trim().to_lowercase();

            if is_quit(&reply) {
                return State::Finished(None);
            }
            if is_undo(&reply) {
                if picks.pop().is_some() {
                    prompt.show(&format!("Undone, back to position {}", picks.len() + 1));
                } else {
                    prompt.show("Already at the first position, nothing to undo");
                }
                continue;
            }

            let Ok(choice) = reply.parse::<usize>() else {
                prompt.show(&format!(
                    "Invalid input, enter a number between 1 and {}, b to undo or q to cancel",
                    count
                ));
                continue;
            };
            if choice == 0 || choice > count {
                prompt.show(&format!("Out of range, enter a number between 1 and {}", count));
                continue;
            }
            let index = choice - 1;
            if picks.contains(&index) {
                prompt.show(&format!("{} is already placed, pick another file", choice));
                continue;
            }

            picks.push(index);
            prompt.show(&format!("  position {} -> {}", position, display_name(&files[index])));
        }
        State::Previewing(picks)
    }

    fn preview(&self, files: &[PathBuf], picks: Vec<usize>, prompt: &mut dyn PromptPort) -> State {
        prompt.show("");
        prompt.show("========== Final order ==========");
        for (position, &index) in picks.iter().enumerate() {
            prompt.show(&format!("  [{}] {}", position + 1, display_name(&files[index])));
        }

        match Self::ask_yes_no("Confirm this order? [y/n/q]: ", prompt) {
            Answer::Yes => State::Finished(FileOrder::from_picks(files, &picks)),
            Answer::No => State::Reordering,
            Answer::Quit => State::Finished(None),
        }
    }
}
