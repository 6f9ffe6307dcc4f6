use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info, instrument};
use tracing_error::{ErrorLayer, SpanTrace};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use csvview::controller::{Command, Controller, resolve_column};
use csvview::domain::{HELP_TEXT, Message, ViewerConfig, ViewerError};
use csvview::model::{Model, Status};
use csvview::source::FileSource;
use csvview::ui::TableUI;

/// View, search, sort and summarise delimited text files.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// File to open. `~` and environment variables are expanded.
    file: String,

    /// Only keep rows where some cell contains this text (case-insensitive)
    #[arg(short, long)]
    search: Option<String>,

    /// Sort by this column (header name or 1-based position)
    #[arg(long, value_name = "COLUMN")]
    sort: Option<String>,

    /// Sort descending instead of ascending
    #[arg(long, requires = "sort")]
    desc: bool,

    /// Page to show
    #[arg(short, long, default_value_t = 1)]
    page: usize,

    /// Rows per page
    #[arg(long, default_value_t = 100)]
    page_size: usize,

    /// Print statistics for a column of the filtered rows (repeatable)
    #[arg(long, value_name = "COLUMN")]
    stats: Vec<String>,

    /// Write the filtered rows; defaults to <name>_filtered.<ext>
    #[arg(long, value_name = "PATH")]
    export: Option<Option<PathBuf>>,

    /// Field delimiter, detected from the file extension if not given
    #[arg(short, long)]
    delimiter: Option<char>,

    /// Widest a column is drawn
    #[arg(long, default_value_t = 40)]
    max_column_width: usize,

    /// Read commands from stdin after loading
    #[arg(short, long)]
    interactive: bool,

    /// More log output on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Err((e, span_trace)) => {
            eprintln!("Error: {e}");
            eprintln!("{span_trace}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(ErrorLayer::default())
        .init();
}

/// Runs the viewer inside a span and captures the span trace of a failure
/// before the span closes.
#[instrument(skip_all, fields(file = %args.file))]
fn run(args: Args) -> Result<(), (ViewerError, SpanTrace)> {
    view_file(args).map_err(|e| (e, SpanTrace::capture()))
}

fn view_file(args: Args) -> Result<(), ViewerError> {
    let mut config = ViewerConfig::default()
        .with_page_size(args.page_size)
        .with_max_column_width(args.max_column_width);
    if let Some(d) = args.delimiter {
        config = config.with_delimiter(delimiter_byte(d)?);
    }

    let path = shellexpand::full(&args.file)
        .map_err(|e| ViewerError::InvalidCommand(e.to_string()))?;
    let mut source = FileSource::from_path(Path::new(&*path))?;
    if let Some(d) = config.delimiter {
        source = source.with_delimiter(d);
    }

    let mut model = Model::init(&config);
    model.set_page_size(args.page_size)?;
    let ui = TableUI::new(config.max_column_width);
    let mut stdout = io::stdout().lock();

    model.request_load(source);
    if args.interactive {
        ui.draw(model.get_uidata(), &mut stdout)?;
        stdout.flush()?;
    }
    while model.complete_pending_load()? {}

    if let Some(query) = &args.search {
        model.update(Message::Search(query.clone()))?;
    }
    if let Some(column) = &args.sort {
        let idx = resolve_column(&model, column)?;
        model.update(Message::Sort(idx))?;
        if args.desc {
            model.update(Message::Sort(idx))?;
        }
    }
    model.update(Message::GoToPage(args.page))?;

    if args.interactive {
        return interactive(&mut model, &ui, &mut stdout);
    }

    ui.draw(model.get_uidata(), &mut stdout)?;
    for column in &args.stats {
        show_stats(&model, &ui, column, &mut stdout)?;
    }
    if let Some(target) = args.export {
        write_export(&model, target, &mut stdout)?;
    }
    Ok(())
}

fn interactive(model: &mut Model, ui: &TableUI, out: &mut impl Write) -> Result<(), ViewerError> {
    let controller = Controller::new();
    writeln!(out, "Type `help` for commands.")?;
    ui.draw(model.get_uidata(), out)?;

    let mut lines = io::stdin().lock().lines();
    while model.status != Status::QUITTING {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let result = controller
            .handle_line(&line, model)
            .and_then(|command| execute(command, model, ui, out));
        if let Err(e) = result {
            report(&e, out)?;
        }
    }
    Ok(())
}

#[instrument(skip(model, ui, out))]
fn execute(
    command: Option<Command>,
    model: &mut Model,
    ui: &TableUI,
    out: &mut impl Write,
) -> Result<(), ViewerError> {
    match command {
        None => {}
        Some(Command::Update(message)) => {
            model.update(message)?;
            if model.status != Status::QUITTING {
                ui.draw(model.get_uidata(), out)?;
            }
        }
        Some(Command::Stats(column)) => show_stats(model, ui, &column, out)?,
        Some(Command::Export(target)) => write_export(model, target, out)?,
        Some(Command::Show) => ui.draw(model.get_uidata(), out)?,
        Some(Command::Help) => writeln!(out, "{HELP_TEXT}")?,
    }
    Ok(())
}

fn show_stats(
    model: &Model,
    ui: &TableUI,
    column: &str,
    out: &mut impl Write,
) -> Result<(), ViewerError> {
    let idx = resolve_column(model, column)?;
    let name = model
        .dataset()
        .column(idx)
        .map(|c| c.name.clone())
        .unwrap_or_default();
    ui.draw_stats(&model.statistics(&name), out)?;
    Ok(())
}

fn write_export(
    model: &Model,
    target: Option<PathBuf>,
    out: &mut impl Write,
) -> Result<(), ViewerError> {
    let blob = model.export()?;
    let path = target.unwrap_or_else(|| PathBuf::from(&blob.file_name));
    fs::write(&path, &blob.text)?;
    info!("Wrote {} bytes to {}", blob.text.len(), path.display());
    writeln!(out, "Exported {} rows to {}", model.view().len(), path.display())?;
    Ok(())
}

fn report(e: &ViewerError, out: &mut impl Write) -> io::Result<()> {
    debug!("{e}\n{}", SpanTrace::capture());
    writeln!(out, "Error: {e}")
}

fn delimiter_byte(c: char) -> Result<u8, ViewerError> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(ViewerError::InvalidCommand(format!(
            "delimiter must be a single ASCII character, got {c:?}"
        )))
    }
}
