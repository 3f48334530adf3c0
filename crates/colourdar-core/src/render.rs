use std::io::{self, IsTerminal, Write};

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use unicode_width::UnicodeWidthStr;

use crate::cells::{DayCell, WeekShade, annotate};
use crate::config::Config;
use crate::grid::Month;
use crate::labels::Locale;
use crate::request::CalendarView;

/// Visible width of one month block: seven two-char cells plus separators.
const BLOCK_WIDTH: usize = 7 * 3 - 1;
const BLOCK_GAP: &str = "   ";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    columns: usize,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        let columns = cfg.get_parsed::<usize>("columns")?.unwrap_or(3);
        if columns == 0 {
            return Err(anyhow!("invalid columns setting: must be at least 1"));
        }

        Ok(Self {
            color: color && io::stdout().is_terminal(),
            columns,
        })
    }

    #[cfg(test)]
    fn plain(columns: usize) -> Self {
        Self {
            color: false,
            columns: columns.max(1),
        }
    }

    #[tracing::instrument(skip(self, view, out))]
    pub fn render_text<W: Write>(
        &self,
        view: &CalendarView,
        today: NaiveDate,
        target: Option<NaiveDate>,
        mut out: W,
    ) -> anyhow::Result<()> {
        let blocks: Vec<Vec<String>> = view
            .months
            .iter()
            .map(|month| self.month_block(month, view.locale, today, target))
            .collect();

        for (row_idx, row) in blocks.chunks(self.columns).enumerate() {
            if row_idx > 0 {
                writeln!(out)?;
            }

            let height = row.iter().map(Vec::len).max().unwrap_or(0);
            for line_idx in 0..height {
                let mut line = String::new();
                for (col, block) in row.iter().enumerate() {
                    if col > 0 {
                        line.push_str(BLOCK_GAP);
                    }
                    let cell = block.get(line_idx).map(String::as_str).unwrap_or("");
                    line.push_str(cell);
                    let padding = BLOCK_WIDTH.saturating_sub(visible_width(cell));
                    line.push_str(&" ".repeat(padding));
                }
                writeln!(out, "{}", line.trim_end())?;
            }
        }

        Ok(())
    }

    pub fn render_json<W: Write>(&self, view: &CalendarView, mut out: W) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut out, view).context("failed to serialize calendar")?;
        writeln!(out)?;
        Ok(())
    }

    fn month_block(
        &self,
        month: &Month,
        locale: Locale,
        today: NaiveDate,
        target: Option<NaiveDate>,
    ) -> Vec<String> {
        let mut lines = Vec::with_capacity(2 + month.days.len() / 7);
        lines.push(center(&format!("{} {}", month.name, month.year), BLOCK_WIDTH));
        lines.push(
            locale
                .weekday_initials()
                .iter()
                .map(|initial| format!("{initial:>2}"))
                .collect::<Vec<_>>()
                .join(" "),
        );

        let cells = annotate(month, today, target);
        for week in cells.chunks(7) {
            lines.push(
                week.iter()
                    .map(|cell| self.day_cell(cell))
                    .collect::<Vec<_>>()
                    .join(" "),
            );
        }

        lines
    }

    fn day_cell(&self, cell: &DayCell) -> String {
        let text = format!("{:>2}", cell.label());

        if !cell.in_month {
            return if self.color {
                self.paint(&text, "2")
            } else {
                "  ".to_string()
            };
        }

        if cell.is_today {
            self.paint(&text, "1;97;44")
        } else if cell.is_target {
            self.paint(&text, "1;97;42")
        } else {
            match cell.shade {
                WeekShade::Even => self.paint(&text, "32"),
                WeekShade::Odd => self.paint(&text, "34"),
            }
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn center(text: &str, width: usize) -> String {
    let visible = UnicodeWidthStr::width(text);
    let left = width.saturating_sub(visible) / 2;
    format!("{}{}", " ".repeat(left), text)
}

fn visible_width(s: &str) -> usize {
    UnicodeWidthStr::width(strip_ansi(s).as_str())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
