//! Configuration directives embedded in toplevel document comments.
//!
//! ```text
//! # @TAGSTAT По цветам:Цвет:black blue blue_black
//! # @TAGNAMES black=чёрные:blue=синие:blue_black=сине-чёрные
//! ```
//!
//! Malformed directives are dropped without complaint, the database is a
//! hand-edited text file and partial configuration is better than none.

use std::collections::BTreeSet;

use derive_more::Deref;
use indexmap::IndexMap;

use crate::{parse, Document, Node};

/// Declaration of a tag statistics table from a `@TAGSTAT` directive.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TagStatDecl {
    pub title: String,
    pub column_title: String,
    pub tags: BTreeSet<String>,
}

impl TagStatDecl {
    /// Parse `title:column title:tag1 tag2 ...`.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.splitn(3, ':').map(str::trim);
        let (Some(title), Some(column_title), Some(tags)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return None;
        };

        if title.is_empty() || column_title.is_empty() {
            return None;
        }

        let tags: BTreeSet<String> =
            tags.split_whitespace().map(str::to_owned).collect();
        if tags.is_empty() {
            return None;
        }

        Some(TagStatDecl {
            title: title.to_owned(),
            column_title: column_title.to_owned(),
            tags,
        })
    }
}

/// Tag to human-readable name translations.
///
/// Derefs to the tag → name map.
#[derive(Clone, Debug, Default, Deref)]
pub struct TagNames {
    #[deref]
    names: IndexMap<String, String>,
    /// Lowercased name → tag.
    inverse: IndexMap<String, String>,
}

impl TagNames {
    pub fn insert(&mut self, tag: impl Into<String>, name: impl Into<String>) {
        let (tag, name) = (tag.into(), name.into());
        self.inverse.insert(name.to_lowercase(), tag.clone());
        self.names.insert(tag, name);
    }

    /// Human-readable name for a tag, the tag itself if it has none.
    pub fn display<'a>(&'a self, tag: &'a str) -> &'a str {
        self.names.get(tag).map_or(tag, String::as_str)
    }

    /// Find the tag whose display name is `name`, ignoring case.
    pub fn tag_for_name(&self, name: &str) -> Option<&str> {
        self.inverse.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Add translations from `tag=name:tag2=name2` text.
    fn extend_from_directive(&mut self, value: &str) {
        for pair in value.split(':') {
            let Some((tag, name)) = pair.split_once('=') else {
                log::debug!("TAGNAMES: no '=' in {pair:?}, skipping");
                continue;
            };
            let (tag, name) = (tag.trim(), name.trim());
            if tag.is_empty() || name.is_empty() {
                log::debug!("TAGNAMES: empty field in {pair:?}, skipping");
                continue;
            }
            self.insert(tag, name);
        }
    }
}

/// Statistics configuration gathered from the document before the
/// statistics pass.
#[derive(Clone, Debug, Default)]
pub struct StatsConfig {
    pub tag_stats: Vec<TagStatDecl>,
    pub tag_names: TagNames,
    /// Tags listed in `#+TAGS:` lines.
    pub file_tags: BTreeSet<String>,
}

impl StatsConfig {
    /// Read directives from the toplevel comments of a document.
    ///
    /// Comments nested under headlines are never directives.
    pub fn from_document(doc: &Document) -> Self {
        let mut ret = StatsConfig::default();

        for node in &doc.children {
            let Node::Comment(text) = node else { continue };
            let Some((name, value)) = parse::directive(text) else {
                continue;
            };
            ret.apply(name, value);
        }

        ret.file_tags = doc
            .file_directives("TAGS")
            .flat_map(str::split_whitespace)
            .map(str::to_owned)
            .collect();

        ret
    }

    /// Apply a single `@NAME value` directive. Names are case-sensitive.
    pub fn apply(&mut self, name: &str, value: &str) {
        match name {
            "TAGSTAT" => match TagStatDecl::parse(value) {
                Some(decl) => self.tag_stats.push(decl),
                None => log::debug!("TAGSTAT: malformed {value:?}, skipping"),
            },
            "TAGNAMES" => self.tag_names.extend_from_directive(value),
            _ => log::debug!("Unknown directive @{name}, ignoring"),
        }
    }
}
