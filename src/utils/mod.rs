pub mod dates;
pub mod tui;
