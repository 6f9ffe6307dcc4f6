use std::io::{self, Write};

use crate::model::UIData;
use crate::stats::StatisticsReport;

pub const COLUMN_WIDTH_MARGIN: usize = 1;
pub const COLUMN_SEPARATOR: &str = " │ ";
const MIN_COLUMN_WIDTH: usize = 3;

/// Plain text renderer for the terminal.
pub struct TableUI {
    max_column_width: usize,
}

impl TableUI {
    pub fn new(max_column_width: usize) -> Self {
        TableUI {
            max_column_width: max_column_width.max(MIN_COLUMN_WIDTH),
        }
    }

    pub fn draw(&self, data: &UIData, out: &mut impl Write) -> io::Result<()> {
        writeln!(
            out,
            "{}  {}, {}",
            data.name,
            data.row_count_label(),
            data.column_count_label()
        )?;

        if data.rows.is_empty() {
            writeln!(out, "No data to display")?;
        } else {
            self.draw_table(data, out)?;
        }

        writeln!(out, "{}  {}", data.page.label(), data.summary())?;
        if !data.status_message.is_empty() {
            writeln!(out, "{}", data.status_message)?;
        }
        Ok(())
    }

    fn draw_table(&self, data: &UIData, out: &mut impl Write) -> io::Result<()> {
        let index_width = data.index.iter().map(|s| s.len()).max().unwrap_or(0);
        let headers: Vec<String> = data
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| format!("{} {}", h, data.sort_indicator(i)))
            .collect();
        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| self.column_width(h, data.rows.iter().map(|r| r[i].as_str())))
            .collect();

        let header_line: Vec<String> = headers
            .iter()
            .zip(&widths)
            .map(|(h, &w)| pad(&visible_name(h, w), w))
            .collect();
        writeln!(
            out,
            "{}{}{}",
            " ".repeat(index_width),
            COLUMN_SEPARATOR,
            header_line.join(COLUMN_SEPARATOR)
        )?;

        for (idx, row) in data.index.iter().zip(&data.rows) {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(c, &w)| pad(&visible_name(&single_line(c), w), w))
                .collect();
            writeln!(
                out,
                "{:>width$}{}{}",
                idx,
                COLUMN_SEPARATOR,
                cells.join(COLUMN_SEPARATOR),
                width = index_width
            )?;
        }
        Ok(())
    }

    fn column_width<'a>(&self, header: &str, cells: impl Iterator<Item = &'a str>) -> usize {
        let widest = cells
            .map(|c| single_line(c).chars().count())
            .chain(std::iter::once(header.chars().count()))
            .max()
            .unwrap_or(0);
        std::cmp::min(widest + COLUMN_WIDTH_MARGIN, self.max_column_width)
    }

    pub fn draw_stats(&self, report: &StatisticsReport, out: &mut impl Write) -> io::Result<()> {
        write!(out, "{report}")
    }
}

fn single_line(cell: &str) -> String {
    cell.replace("\r\n", " ↵ ").replace('\n', " ↵ ")
}

/// Cuts `name` to `width` characters, marking the cut with `...`.
fn visible_name(name: &str, width: usize) -> String {
    if width < MIN_COLUMN_WIDTH {
        return String::new();
    }
    if name.chars().count() > width {
        let mut reduced: String = name.chars().take(width - 3).collect();
        reduced.push_str("...");
        reduced
    } else {
        name.to_string()
    }
}

fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    format!("{}{}", s, " ".repeat(width.saturating_sub(len)))
}
