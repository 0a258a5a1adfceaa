use console::style;

use crate::model::Status;

/// Styling helpers for terminal output
pub fn bright_yellow(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

pub fn bright_green(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().green()
}

pub fn bright_red(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().red()
}

pub fn cyan(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).cyan()
}

pub fn dim(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).dim()
}

pub fn bright(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright()
}

pub fn magenta_bold(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).magenta().bold()
}

/// Status label coloured the way the dashboard colours it.
pub fn status_styled(status: Option<Status>) -> console::StyledObject<String> {
    match status {
        Some(Status::Success) => bright_green(Status::Success),
        Some(Status::Failed) => bright_red(Status::Failed),
        Some(Status::Running) => cyan(Status::Running),
        Some(Status::Pending) => bright_yellow(Status::Pending),
        Some(other @ (Status::Canceled | Status::Skipped)) => dim(other),
        None => dim("n/a"),
    }
}
