//! Text output of collection statistics.

use chrono::NaiveDate;
use itertools::Itertools;

use crate::{Ink, InkStats, MissingField, Status};

const MILLILITERS_PER_LITER: f64 = 1000.0;

/// Volume in milliliters, or in liters for a liter and up.
pub fn format_volume(ml: f64) -> String {
    if ml < MILLILITERS_PER_LITER {
        format!("{ml:.0} мл")
    } else {
        format!("{:.2} л", ml / MILLILITERS_PER_LITER)
    }
}

/// Rows of (label, count, percentage, volume) for the whole collection.
pub fn total_result_table(stats: &InkStats) -> Vec<[String; 4]> {
    let total = stats.total();
    let row = |label: &str, n: usize, volume: String| {
        let pc = if total == 0 {
            0.0
        } else {
            100.0 * n as f64 / total as f64
        };
        [label.to_owned(), n.to_string(), format!("{pc:.1}%"), volume]
    };

    vec![
        ["Всего:".into(), total.to_string(), String::new(), String::new()],
        row(
            "В наличии:",
            stats.available.len(),
            format!("≈{}", format_volume(stats.avail_ml)),
        ),
        row("Отсутствуют:", stats.unavailable.len(), String::new()),
        row("Не нужны:", stats.unwanted.len(), String::new()),
    ]
}

/// Human-readable summary of an ink.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InkDescription {
    pub name: String,
    /// Sorted display names of the tags, comma-separated.
    pub tags: String,
    pub description: String,
    /// What is in the collection, e.g. `30 мл и картриджи`.
    pub availability: String,
}

impl InkDescription {
    pub fn new(stats: &InkStats, ink: &Ink) -> Self {
        let tags = ink
            .display_tags()
            .map(|t| stats.tag_display_name(t))
            .sorted()
            .join(", ");

        let mut avails = Vec::new();
        if ink.volume_ml > 0.0 {
            avails.push(format_volume(ink.volume_ml));
        }
        if ink.cartridges {
            avails.push("картриджи".to_owned());
        }

        InkDescription {
            name: ink.name.clone(),
            tags,
            description: ink.description.join("\n"),
            availability: avails.join(" и "),
        }
    }
}

pub fn status_str(status: Status) -> &'static str {
    match status {
        Status::Unplanned => "не нужны",
        Status::Planned => "планируется покупка",
        Status::Done => "испытаны",
    }
}

pub fn missing_data_str(ink: &Ink) -> String {
    ink.missing
        .iter()
        .map(|m| match m {
            MissingField::Tags => "метки",
            MissingField::Description => "описание",
            MissingField::Color => "цвет",
            MissingField::MainColor => "основной цвет",
        })
        .join(", ")
}

pub fn color_hex(color: u32) -> String {
    format!("#{color:06x}")
}

/// Rows of (date, how long ago, comment) for the usage log of an ink.
pub fn usage_rows(ink: &Ink, today: NaiveDate) -> Vec<[String; 3]> {
    ink.usage
        .iter()
        .map(|e| {
            let days = (today - e.date).num_days();
            let ago = if days <= 1 {
                "сегодня".to_owned()
            } else {
                format!("{days} дн. назад")
            };
            [e.date.to_string(), ago, e.comment.clone()]
        })
        .collect()
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Align {
    Left,
    Right,
}

/// Lay out rows in aligned columns.
///
/// Rows shorter than `headers` are padded with empty cells, extra cells
/// are dropped.
pub fn format_table<S: AsRef<str>>(
    headers: &[(&str, Align)],
    print_header: bool,
    rows: &[Vec<S>],
) -> String {
    let cell = |row: &[S], i: usize| -> String {
        row.get(i).map_or_else(String::new, |s| s.as_ref().to_owned())
    };

    let mut widths: Vec<usize> = headers
        .iter()
        .map(|(h, _)| if print_header { h.chars().count() } else { 0 })
        .collect();
    for row in rows {
        for (i, w) in widths.iter_mut().enumerate() {
            *w = (*w).max(cell(row, i).chars().count());
        }
    }

    let line = |cells: Vec<String>| -> String {
        let mut ret = String::new();
        for (i, c) in cells.iter().enumerate() {
            if i > 0 {
                ret.push_str("  ");
            }
            let width = widths[i];
            ret.push_str(&match headers[i].1 {
                Align::Left => format!("{c:<width$}"),
                Align::Right => format!("{c:>width$}"),
            });
        }
        ret.trim_end().to_owned()
    };

    let mut ret = String::new();
    if print_header {
        ret.push_str(&line(headers.iter().map(|(h, _)| h.to_string()).collect()));
        ret.push('\n');
    }
    for row in rows {
        ret.push_str(&line((0..headers.len()).map(|i| cell(row, i)).collect()));
        ret.push('\n');
    }
    ret
}
