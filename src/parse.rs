//! Parsing primitives

use lazy_regex::regex;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, space1},
    combinator::{eof, opt},
    multi::many1_count,
    sequence::terminated,
    IResult, Parser,
};

/// Pieces of an outline headline line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HeadlineParts<'a> {
    /// Number of leading stars.
    pub level: usize,
    /// `TODO` or `DONE` if present.
    pub keyword: Option<&'a str>,
    pub title: &'a str,
    pub tags: Vec<&'a str>,
}

/// Match headlines like `** TODO Some title   :tag1:tag2:`.
pub fn headline(s: &str) -> Option<HeadlineParts<'_>> {
    fn stars(s: &str) -> IResult<&str, usize> {
        terminated(many1_count(char('*')), space1).parse(s)
    }

    fn keyword(s: &str) -> IResult<&str, &str> {
        terminated(alt((tag("TODO"), tag("DONE"))), alt((space1, eof)))
            .parse(s)
    }

    let Ok((rest, (level, keyword))) = (stars, opt(keyword)).parse(s) else {
        return None;
    };

    let rest = rest.trim();
    let (title, tags) = split_tags(rest);

    Some(HeadlineParts {
        level,
        keyword,
        title,
        tags,
    })
}

/// Split a trailing `:tag1:tag2:` group off a headline title.
fn split_tags(s: &str) -> (&str, Vec<&str>) {
    let (title, last) = match s.rfind(char::is_whitespace) {
        Some(i) => (s[..i].trim_end(), &s[i..]),
        None => ("", s),
    };
    let last = last.trim();

    if !regex!(r"^:([^\s:]+:)+$").is_match(last) {
        return (s, Vec::new());
    }

    let tags = last.split(':').filter(|t| !t.is_empty()).collect();
    (title, tags)
}

/// Match comment lines, return the comment text.
///
/// A comment is a `#` followed by a space or the end of the line.
pub fn comment(s: &str) -> Option<&str> {
    if s == "#" {
        Some("")
    } else {
        s.strip_prefix("# ").map(str::trim)
    }
}

/// Match `#+NAME: value` file directive lines.
pub fn file_directive(s: &str) -> Option<(&str, &str)> {
    let caps = regex!(r"^#\+([A-Za-z_]+):\s*(.*)$").captures(s)?;
    let name = caps.get(1)?.as_str();
    let value = caps.get(2)?.as_str().trim();
    Some((name, value))
}

/// Split `@NAME value` directive text into name and value.
///
/// Returns `None` for plain comments and for a lone `@`.
pub fn directive(s: &str) -> Option<(&str, &str)> {
    let s = s.trim();
    let (name, value) = match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim()),
        None => (s, ""),
    };

    let name = name.strip_prefix('@')?;
    if name.is_empty() {
        return None;
    }
    Some((name, value))
}
