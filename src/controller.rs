use std::path::PathBuf;

use tracing::trace;

use crate::domain::{Message, ViewerError};
use crate::model::Model;

/// A parsed command line: either a model update or a read-only request.
#[derive(Debug)]
pub enum Command {
    Update(Message),
    Stats(String),
    Export(Option<PathBuf>),
    Show,
    Help,
}

#[derive(Default)]
pub struct Controller;

impl Controller {
    pub fn new() -> Self {
        Controller
    }

    /// Maps one line of input to a command. Blank lines map to `None`.
    pub fn handle_line(&self, line: &str, model: &Model) -> Result<Option<Command>, ViewerError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, arg) = match line.split_once(char::is_whitespace) {
            Some((verb, arg)) => (verb, arg.trim()),
            None => (line, ""),
        };

        let command = match verb {
            "search" | "/" => Command::Update(Message::Search(arg.to_string())),
            "clear" => Command::Update(Message::ClearSearch),
            "sort" => Command::Update(Message::Sort(resolve_column(model, arg)?)),
            "next" | "n" => Command::Update(Message::NextPage),
            "prev" | "p" => Command::Update(Message::PreviousPage),
            "page" => Command::Update(Message::GoToPage(parse_count(verb, arg)?)),
            "size" => Command::Update(Message::SetPageSize(parse_count(verb, arg)?)),
            "stats" if !arg.is_empty() => Command::Stats(arg.to_string()),
            "export" if arg.is_empty() => Command::Export(None),
            "export" => Command::Export(Some(PathBuf::from(arg))),
            "show" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Update(Message::Quit),
            _ => return Err(ViewerError::InvalidCommand(line.to_string())),
        };
        trace!("Mapped: {line:?} => {command:?}");
        Ok(Some(command))
    }
}

/// Column by header name, or by 1-based position.
pub fn resolve_column(model: &Model, arg: &str) -> Result<usize, ViewerError> {
    if let Some(idx) = model.column_index(arg) {
        return Ok(idx);
    }
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 && n <= model.dataset().ncolumns() => Ok(n - 1),
        _ => Err(ViewerError::InvalidCommand(format!("unknown column {arg:?}"))),
    }
}

fn parse_count(verb: &str, arg: &str) -> Result<usize, ViewerError> {
    arg.parse()
        .map_err(|_| ViewerError::InvalidCommand(format!("{verb} needs a number, got {arg:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ViewerConfig;
    use crate::source::FileSource;

    fn model() -> Model {
        let mut model = Model::init(&ViewerConfig::default());
        model
            .load(FileSource::new("t.csv", "name,2024\nA,1\n"))
            .unwrap();
        model
    }

    #[test]
    fn maps_view_commands() {
        let c = Controller::new();
        let m = model();
        assert!(matches!(
            c.handle_line("search foo bar", &m).unwrap(),
            Some(Command::Update(Message::Search(q))) if q == "foo bar"
        ));
        assert!(matches!(
            c.handle_line("size 25", &m).unwrap(),
            Some(Command::Update(Message::SetPageSize(25)))
        ));
        assert!(matches!(
            c.handle_line("export out.csv", &m).unwrap(),
            Some(Command::Export(Some(_)))
        ));
        assert!(c.handle_line("   ", &m).unwrap().is_none());
    }

    #[test]
    fn sort_accepts_names_before_positions() {
        let c = Controller::new();
        let m = model();
        assert!(matches!(
            c.handle_line("sort name", &m).unwrap(),
            Some(Command::Update(Message::Sort(0)))
        ));
        // "2024" is a header, not a position.
        assert!(matches!(
            c.handle_line("sort 2024", &m).unwrap(),
            Some(Command::Update(Message::Sort(1)))
        ));
        assert!(matches!(
            c.handle_line("sort 2", &m).unwrap(),
            Some(Command::Update(Message::Sort(1)))
        ));
        assert!(c.handle_line("sort 3", &m).is_err());
    }

    #[test]
    fn rejects_unknown_commands_and_bad_numbers() {
        let c = Controller::new();
        let m = model();
        assert!(matches!(
            c.handle_line("dance", &m),
            Err(ViewerError::InvalidCommand(_))
        ));
        assert!(c.handle_line("page two", &m).is_err());
        assert!(c.handle_line("stats", &m).is_err());
    }
}
