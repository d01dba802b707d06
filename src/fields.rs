//! Extract structured facts from free text lines of ink descriptions.
//!
//! None of these fail, text that doesn't match is just not data.

use chrono::NaiveDate;
use lazy_regex::regex;

/// `цвет: #RRGGBB`, returns the 24-bit color value.
pub fn color(text: &str) -> Option<u32> {
    let caps = regex!(r"(?i)^цвет:\s*#([0-9a-f]{6})$").captures(text.trim())?;
    u32::from_str_radix(&caps[1], 16).ok()
}

/// `основной цвет: name`, returns the raw name.
pub fn main_color_name(text: &str) -> Option<&str> {
    let caps =
        regex!(r"(?i)^основной\s+цвет:\s*(.*)$").captures(text.trim())?;
    Some(caps.get(1)?.as_str().trim())
}

/// `флакон N мл`, returns the volume in milliliters.
pub fn volume_ml(text: &str) -> Option<f64> {
    let caps = regex!(r"(?i)^флакон\s([\d.]+)\s?.*?$").captures(text.trim())?;
    caps[1].parse().ok()
}

/// Any mention of cartridges.
pub fn cartridge(text: &str) -> bool {
    text.to_lowercase().contains("картридж")
}

/// A refill log line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UsageEntry {
    pub date: NaiveDate,
    pub comment: String,
}

/// `DATE: comment` where date is `YYYY.MM.DD` or `DD.MM.YYYY`, with either
/// `.` or `-` as the separator.
pub fn usage_entry(text: &str) -> Option<UsageEntry> {
    let (date, comment) = match text.split_once(':') {
        Some((date, comment)) => (date, comment),
        None => (text, ""),
    };

    Some(UsageEntry {
        date: date_value(date.trim())?,
        comment: comment.trim().to_owned(),
    })
}

fn date_value(s: &str) -> Option<NaiveDate> {
    let (y, m, d) = if let Some(caps) =
        regex!(r"^(\d{4})[.-](\d{2})[.-](\d{2})$").captures(s)
    {
        (caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
    } else if let Some(caps) =
        regex!(r"^(\d{2})[.-](\d{2})[.-](\d{4})$").captures(s)
    {
        (caps[3].parse().ok()?, caps[2].parse().ok()?, caps[1].parse().ok()?)
    } else {
        return None;
    };

    NaiveDate::from_ymd_opt(y, m, d)
}
