use std::io::{self, IsTerminal, Write};

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::CalendarConfig;
use crate::event::Event;
use crate::grid::{GRID_COLUMNS, GRID_ROWS, MonthGrid};
use crate::layout::MonthLayout;
use crate::overflow::Disclosure;
use crate::segment::Segment;
use crate::view::{DayAgenda, ViewMode, WeekColumn, title_for_view};

const CELL_WIDTH: usize = 14;
const WEEKDAY_LABELS: [&str; GRID_COLUMNS] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    visible_limit: usize,
    tz: Tz,
}

impl Renderer {
    /// Color follows the config and is only enabled when stdout is a terminal.
    pub fn new(cfg: &CalendarConfig, tz: Tz) -> Self {
        Self {
            color: cfg.policies.color && io::stdout().is_terminal(),
            visible_limit: cfg.policies.visible_limit,
            tz,
        }
    }

    /// Renderer that never emits escape codes, for writing into buffers.
    pub fn plain(visible_limit: usize, tz: Tz) -> Self {
        Self {
            color: false,
            visible_limit,
            tz,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    #[tracing::instrument(skip_all)]
    pub fn print_month(&self, layout: &MonthLayout<'_>, focus: NaiveDate) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_month(&mut out, layout, focus)
    }

    #[tracing::instrument(skip_all)]
    pub fn print_week(&self, columns: &[WeekColumn<'_>], focus: NaiveDate) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_week(&mut out, columns, focus)
    }

    #[tracing::instrument(skip_all)]
    pub fn print_day(&self, agenda: &DayAgenda<'_>) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_day(&mut out, agenda)
    }

    #[tracing::instrument(skip_all)]
    pub fn print_disclosure(&self, disclosure: &Disclosure) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_disclosure(&mut out, disclosure)
    }

    pub fn write_month<W: Write>(
        &self,
        mut out: W,
        layout: &MonthLayout<'_>,
        focus: NaiveDate,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", title_for_view(ViewMode::Month, focus))?;

        let header = WEEKDAY_LABELS
            .iter()
            .map(|label| pad(label, CELL_WIDTH))
            .collect::<String>();
        writeln!(out, "{}", header.trim_end())?;

        for row in 0..GRID_ROWS {
            let cells = layout.row_cells(row);

            let mut line = String::new();
            for cell in cells {
                let label = format!("{:>2}", cell.date.day());
                let label = if cell.is_today {
                    self.paint(&format!("[{label}]"), "7")
                } else if !cell.is_current_month {
                    self.paint(&format!(" {label} "), "2")
                } else {
                    format!(" {label} ")
                };
                line.push_str(&pad_painted(&label, CELL_WIDTH));
            }
            writeln!(out, "{}", line.trim_end())?;

            for segment in layout.row_segments(row) {
                let event = segment_event(layout, segment);
                let title = event.map_or(segment.event_id.as_str(), |event| event.title.as_str());
                let bar = segment_bar(segment, &layout.grid, title);
                let bar = match event {
                    Some(event) => self.paint_tagged(&bar, event),
                    None => bar,
                };
                writeln!(out, "{}{bar}", " ".repeat(segment.start_column * CELL_WIDTH))?;
            }

            for slot in 0..self.visible_limit {
                if cells.iter().all(|cell| cell.visible.len() <= slot) {
                    break;
                }
                let line = cells
                    .iter()
                    .map(|cell| match cell.visible.get(slot) {
                        Some(event) => pad_painted(&self.event_chip(event), CELL_WIDTH),
                        None => " ".repeat(CELL_WIDTH),
                    })
                    .collect::<String>();
                writeln!(out, "{}", line.trim_end())?;
            }

            if cells.iter().any(|cell| cell.can_disclose()) {
                let line = cells
                    .iter()
                    .map(|cell| {
                        if cell.can_disclose() {
                            pad_painted(
                                &self.paint(&format!(" +{} more", cell.overflow_count), "33"),
                                CELL_WIDTH,
                            )
                        } else {
                            " ".repeat(CELL_WIDTH)
                        }
                    })
                    .collect::<String>();
                writeln!(out, "{}", line.trim_end())?;
            }
        }

        Ok(())
    }

    pub fn write_week<W: Write>(
        &self,
        mut out: W,
        columns: &[WeekColumn<'_>],
        focus: NaiveDate,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", title_for_view(ViewMode::Week, focus))?;

        for column in columns {
            let heading = column.date.format("%a %Y-%m-%d").to_string();
            let heading = if column.is_today {
                self.paint(&heading, "7")
            } else {
                heading
            };
            writeln!(out, "{heading}")?;

            if column.events.is_empty() {
                writeln!(out, "  -")?;
            }
            for event in &column.events {
                writeln!(out, "  {}  {}", event.time_range_label(self.tz), event.title)?;
            }
        }

        Ok(())
    }

    pub fn write_day<W: Write>(&self, mut out: W, agenda: &DayAgenda<'_>) -> anyhow::Result<()> {
        writeln!(out, "{}", title_for_view(ViewMode::Day, agenda.date))?;

        if !agenda.all_day.is_empty() {
            writeln!(out, "All day")?;
            for event in &agenda.all_day {
                writeln!(out, "  {}  {}", event.time_range_label(self.tz), event.title)?;
            }
        }

        let headers = vec![
            "Time".to_string(),
            "Title".to_string(),
            "Facility".to_string(),
        ];
        let rows = agenda
            .timed
            .iter()
            .map(|event| {
                vec![
                    self.paint(&event.time_range_label(self.tz), "36"),
                    event.title.clone(),
                    event.facility.clone().unwrap_or_default(),
                ]
            })
            .collect::<Vec<_>>();
        write_table(&mut out, headers, rows)?;

        if agenda.outside_hours > 0 {
            writeln!(out, "({} outside configured hours)", agenda.outside_hours)?;
        }

        Ok(())
    }

    pub fn write_disclosure<W: Write>(
        &self,
        mut out: W,
        disclosure: &Disclosure,
    ) -> anyhow::Result<()> {
        writeln!(out, "Events on {}", disclosure.date.format("%A, %Y-%m-%d"))?;

        let headers = vec![
            "ID".to_string(),
            "Time".to_string(),
            "Title".to_string(),
            "Facility".to_string(),
        ];
        let rows = disclosure
            .entries
            .iter()
            .map(|entry| {
                vec![
                    self.paint(&entry.id, "33"),
                    entry.time_range.clone(),
                    entry.title.clone(),
                    entry.facility.clone().unwrap_or_default(),
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)
    }

    /// `HH:MM title`, already fitted to a cell and tinted by the event's color tag.
    fn event_chip(&self, event: &Event) -> String {
        let start = event.start.with_timezone(&self.tz);
        let chip = fit(
            &format!("{} {}", start.format("%H:%M"), event.title),
            CELL_WIDTH.saturating_sub(1),
        );
        self.paint_tagged(&chip, event)
    }

    fn paint_tagged(&self, text: &str, event: &Event) -> String {
        match event.color_tag.as_deref().and_then(ansi_for_tag) {
            Some(code) => self.paint(text, code),
            None => text.to_string(),
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

/// Foreground code for a color tag; unknown tags render untinted.
fn ansi_for_tag(tag: &str) -> Option<&'static str> {
    match tag.trim().to_ascii_lowercase().as_str() {
        "red" => Some("31"),
        "green" => Some("32"),
        "yellow" | "orange" => Some("33"),
        "blue" => Some("34"),
        "magenta" | "purple" | "pink" => Some("35"),
        "cyan" | "teal" => Some("36"),
        "white" => Some("37"),
        "gray" | "grey" => Some("90"),
        _ => None,
    }
}

fn segment_event<'a>(layout: &MonthLayout<'a>, segment: &Segment) -> Option<&'a Event> {
    segment
        .span_dates
        .first()
        .and_then(|first| layout.cell(*first))
        .and_then(|cell| cell.all_events.iter().copied().find(|event| event.id == segment.event_id))
}

/// Draws a segment as `[== title ==]` across its columns; `<` and `>` mark an event that
/// continues on the neighbouring row. Indentation to the start column is left to the caller.
fn segment_bar(segment: &Segment, grid: &MonthGrid, title: &str) -> String {
    let open = if segment.continues_left(grid) { '<' } else { '[' };
    let close = if segment.continues_right(grid) { '>' } else { ']' };
    let inner_width = (segment.width() * CELL_WIDTH).saturating_sub(2);

    let label = fit(&format!(" {title} "), inner_width);
    let fill = inner_width.saturating_sub(UnicodeWidthStr::width(label.as_str()));
    let left = fill / 2;
    let right = fill - left;

    format!(
        "{open}{}{label}{}{close}",
        "=".repeat(left),
        "=".repeat(right),
    )
}

/// Truncates `text` to at most `width` display columns.
fn fit(text: &str, width: usize) -> String {
    if UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    if width > 0 {
        out.push('…');
    }
    out
}

fn pad(text: &str, width: usize) -> String {
    let text = fit(text, width.saturating_sub(1));
    let padding = width.saturating_sub(UnicodeWidthStr::width(text.as_str()));
    format!("{text}{}", " ".repeat(padding))
}

fn pad_painted(text: &str, width: usize) -> String {
    let visible = UnicodeWidthStr::width(strip_ansi(text).as_str());
    format!("{text}{}", " ".repeat(width.saturating_sub(visible)))
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
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

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::layout::layout_month;
    use crate::overflow::disclose;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).expect("valid date")
    }

    fn sample_events() -> Vec<Event> {
        let at = |d: u32, h: u32| Utc.with_ymd_and_hms(2025, 6, d, h, 0, 0).single().expect("instant");
        let mut events = vec![Event::new("trip", "Offsite", at(28, 10), at(30, 14))];
        for i in 0..4 {
            events.push(Event::new(format!("s{i}"), format!("Visit {i}"), at(15, 8 + i), at(15, 9 + i)));
        }
        events
    }

    #[test]
    fn month_rendering_shows_bars_and_overflow() {
        let events = sample_events();
        let layout = layout_month(date(15), &events, date(1), 3, chrono_tz::UTC);
        let renderer = Renderer::plain(3, chrono_tz::UTC);

        let mut buf = Vec::new();
        renderer.write_month(&mut buf, &layout, date(15)).expect("render month");
        let text = String::from_utf8(buf).expect("utf8");

        assert!(text.starts_with("Month View June 2025"));
        assert!(text.contains("+1 more"));
        assert!(text.contains("08:00 Visit 0"));
        assert!(!text.contains("Visit 3"));
        assert_eq!(text.matches("Offsite").count(), 2);
        assert!(text.contains('>'));
        assert!(text.contains('<'));
    }

    #[test]
    fn disclosure_rendering_lists_every_entry() {
        let events = sample_events();
        let day_events = events.iter().filter(|e| e.id.starts_with('s')).collect::<Vec<_>>();
        let disclosure = disclose(date(15), &day_events, chrono_tz::UTC);

        let mut buf = Vec::new();
        Renderer::plain(3, chrono_tz::UTC)
            .write_disclosure(&mut buf, &disclosure)
            .expect("render disclosure");
        let text = String::from_utf8(buf).expect("utf8");

        assert!(text.starts_with("Events on Sunday, 2025-06-15"));
        for i in 0..4 {
            assert!(text.contains(&format!("Visit {i}")));
        }
    }

    #[test]
    fn fit_truncates_wide_text() {
        assert_eq!(fit("short", 10), "short");
        let cut = fit("a very long event title", 8);
        assert!(UnicodeWidthStr::width(cut.as_str()) <= 8);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn color_tags_tint_chips_and_bars_only_when_enabled() {
        let at = |d: u32, h: u32| Utc.with_ymd_and_hms(2025, 6, d, h, 0, 0).single().expect("instant");
        let events = vec![
            Event::new("trip", "Offsite", at(28, 10), at(30, 14)).with_color_tag("teal"),
            Event::new("visit", "Visit", at(10, 8), at(10, 9)).with_color_tag("Red"),
            Event::new("plain", "Plain", at(11, 8), at(11, 9)).with_color_tag("chartreuse"),
        ];
        let layout = layout_month(date(15), &events, date(1), 3, chrono_tz::UTC);

        let mut buf = Vec::new();
        Renderer::plain(3, chrono_tz::UTC)
            .with_color(true)
            .write_month(&mut buf, &layout, date(15))
            .expect("render month");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("\x1b[31m08:00 Visit\x1b[0m"));
        assert_eq!(text.matches("\x1b[36m").count(), 2);
        assert!(text.contains("08:00 Plain"));
        assert!(!text.contains("\x1b[31m08:00 Plain"));

        let mut buf = Vec::new();
        Renderer::plain(3, chrono_tz::UTC)
            .write_month(&mut buf, &layout, date(15))
            .expect("render month");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(!text.contains('\x1b'));
    }
}
