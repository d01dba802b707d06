use std::collections::BTreeSet;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::{
    directive::{TagNames, TagStatDecl},
    Ink, InkId, Status,
};

/// Counters for one row of a statistics table.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StatValue {
    pub available: usize,
    pub unavailable: usize,
    /// Planned, but not bought yet.
    pub wanted: usize,
    pub unwanted: usize,
    /// Every ink counted in this row.
    pub inks: Vec<InkId>,
    /// Position among fixed bands for band-ordered tables.
    band: usize,
}

impl StatValue {
    pub fn add_ink(&mut self, id: InkId, ink: &Ink) {
        if ink.is_available() {
            self.available += 1;
        } else {
            self.unavailable += 1;
        }

        match ink.status {
            Status::Planned => self.wanted += 1,
            Status::Unplanned => self.unwanted += 1,
            Status::Done => {}
        }

        self.inks.push(id);
    }

    /// Counters formatted for display, `-` for zero.
    pub fn counter_strs(&self) -> [String; 4] {
        fn to_str(n: usize) -> String {
            if n == 0 {
                "-".into()
            } else {
                n.to_string()
            }
        }

        [
            to_str(self.available),
            to_str(self.unavailable),
            to_str(self.wanted),
            to_str(self.unwanted),
        ]
    }
}

/// What decides which rows of a table an ink goes into.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TableKind {
    /// One row per matching tag.
    Tags(BTreeSet<String>),
    /// One row per resolved main color.
    MainColor,
    /// Rows for time since last use, filled by the aggregator.
    Recency,
    /// Rows for number of refills, filled by the aggregator.
    UsageCount,
    /// Inks not covered by tag tables and inks with missing data.
    Other,
}

/// How table rows are ordered for display.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RowOrder {
    /// Most available first, then by display name.
    Available,
    /// Fixed band order.
    Band,
    /// Order in which rows were created.
    Insertion,
}

#[derive(Clone, Debug)]
pub struct TagStatTable {
    pub title: String,
    pub column_title: String,
    pub kind: TableKind,
    pub stats: IndexMap<String, StatValue>,
}

impl TagStatTable {
    pub fn new(
        title: impl Into<String>,
        column_title: impl Into<String>,
        kind: TableKind,
    ) -> Self {
        TagStatTable {
            title: title.into(),
            column_title: column_title.into(),
            kind,
            stats: IndexMap::new(),
        }
    }

    /// Table for a `@TAGSTAT` directive.
    pub fn from_decl(decl: &TagStatDecl) -> Self {
        TagStatTable::new(
            &decl.title,
            &decl.column_title,
            TableKind::Tags(decl.tags.clone()),
        )
    }

    /// Create empty rows up front to fix their display order.
    pub fn with_rows(mut self, keys: &[&str]) -> Self {
        for key in keys {
            self.row(key);
        }
        self
    }

    pub(crate) fn drop_empty_rows(&mut self) {
        self.stats.retain(|_, v| !v.inks.is_empty());
    }

    /// Tags this table matches on, empty for the special tables.
    pub fn tags(&self) -> Option<&BTreeSet<String>> {
        match &self.kind {
            TableKind::Tags(tags) => Some(tags),
            _ => None,
        }
    }

    pub fn row_order(&self) -> RowOrder {
        match self.kind {
            TableKind::Tags(_) | TableKind::MainColor => RowOrder::Available,
            TableKind::Recency | TableKind::UsageCount => RowOrder::Band,
            TableKind::Other => RowOrder::Insertion,
        }
    }

    /// Count the ink if it matches the table, return whether it matched.
    ///
    /// An ink with several matching tags is counted once under each of
    /// them, a tag repeated on the headline still counts once. Recency, usage and catch-all tables never match here, the
    /// aggregator feeds them with [`TagStatTable::add_ink`].
    pub fn gather_statistics(&mut self, id: InkId, ink: &Ink) -> bool {
        let keys: Vec<String> = match &self.kind {
            TableKind::Tags(tags) => ink
                .tags
                .iter()
                .filter(|t| tags.contains(*t))
                .unique()
                .cloned()
                .collect(),
            TableKind::MainColor => ink.main_color.iter().cloned().collect(),
            TableKind::Recency | TableKind::UsageCount | TableKind::Other => {
                Vec::new()
            }
        };

        for key in &keys {
            self.add_ink(key, id, ink);
        }
        !keys.is_empty()
    }

    /// Count the ink in the named row, creating the row if needed.
    pub fn add_ink(&mut self, key: &str, id: InkId, ink: &Ink) {
        self.row(key).add_ink(id, ink);
    }

    pub(crate) fn add_ink_in_band(
        &mut self,
        key: &str,
        band: usize,
        id: InkId,
        ink: &Ink,
    ) {
        let row = self.row(key);
        row.band = band;
        row.add_ink(id, ink);
    }

    fn row(&mut self, key: &str) -> &mut StatValue {
        self.stats.entry(key.to_owned()).or_default()
    }

    /// Rows in display order.
    pub fn rows<'a>(
        &'a self,
        names: &TagNames,
    ) -> Vec<(&'a str, &'a StatValue)> {
        let mut rows: Vec<(&str, &StatValue)> =
            self.stats.iter().map(|(k, v)| (k.as_str(), v)).collect();

        match self.row_order() {
            RowOrder::Available => rows.sort_by_cached_key(|(key, v)| {
                (
                    std::cmp::Reverse(v.available),
                    names.display(key).to_lowercase(),
                )
            }),
            RowOrder::Band => rows.sort_by_key(|(_, v)| v.band),
            RowOrder::Insertion => {}
        }

        rows
    }
}
