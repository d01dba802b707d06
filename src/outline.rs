use std::{fmt, io::Read, path::Path};

use anyhow::{Context, Result};

use crate::parse;

/// Planning status of a headline.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Status {
    /// No status keyword, the ink is not wanted.
    #[default]
    Unplanned,
    /// `TODO`, the ink is planned to be bought or tested.
    Planned,
    /// `DONE`, the ink was bought and tested.
    Done,
}

impl Status {
    fn from_keyword(keyword: Option<&str>) -> Self {
        match keyword {
            Some("TODO") => Status::Planned,
            Some("DONE") => Status::Done,
            _ => Status::Unplanned,
        }
    }

    fn keyword(self) -> Option<&'static str> {
        match self {
            Status::Unplanned => None,
            Status::Planned => Some("TODO"),
            Status::Done => Some("DONE"),
        }
    }
}

/// An outline headline with nested contents.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Headline {
    pub level: usize,
    pub status: Status,
    /// Title text without the status keyword and tags.
    pub text: String,
    pub tags: Vec<String>,
    pub children: Vec<Node>,
}

impl Headline {
    pub fn new(level: usize, text: impl Into<String>) -> Self {
        Headline {
            level,
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_tags<S: Into<String>>(
        mut self,
        tags: impl IntoIterator<Item = S>,
    ) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Free text lines directly under the headline.
    pub fn text_lines(&self) -> impl Iterator<Item = &str> {
        self.children.iter().filter_map(|c| match c {
            Node::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Child headlines whose title is exactly one of `names`.
    pub fn sub_headlines<'a>(
        &'a self,
        names: &'a [&'a str],
    ) -> impl Iterator<Item = &'a Headline> + 'a {
        self.children.iter().filter_map(move |c| match c {
            Node::Headline(h) if names.contains(&h.text.as_str()) => Some(h),
            _ => None,
        })
    }
}

/// A single element of the document tree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Node {
    Headline(Headline),
    /// `# text` comment line, holds the text after the marker.
    Comment(String),
    /// `#+NAME: value` line.
    FileDirective { name: String, value: String },
    /// Any other non-blank line, trimmed.
    Text(String),
}

impl From<Headline> for Node {
    fn from(h: Headline) -> Self {
        Node::Headline(h)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(s.to_owned())
    }
}

/// Parsed ink database file.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Document {
    pub children: Vec<Node>,
}

impl Document {
    /// Read a document from a file, `-` reads standard input.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = if path.to_str() == Some("-") {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("failed to read standard input")?;
            input
        } else {
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {path:?}"))?
        };

        let doc: Document = text.parse()?;
        log::info!(
            "Loaded {path:?}, {} toplevel elements",
            doc.children.len()
        );
        Ok(doc)
    }

    /// Values of every `#+NAME:` line at the top level with the given name.
    pub fn file_directives<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.children.iter().filter_map(move |c| match c {
            Node::FileDirective { name: n, value } if n == name => {
                Some(value.as_str())
            }
            _ => None,
        })
    }
}

impl std::str::FromStr for Document {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut doc = Document::default();
        // Headlines that are still open for nested content.
        let mut stack: Vec<Headline> = Vec::new();

        fn close(stack: &mut Vec<Headline>, doc: &mut Document) {
            let Some(h) = stack.pop() else { return };
            match stack.last_mut() {
                Some(parent) => parent.children.push(Node::Headline(h)),
                None => doc.children.push(Node::Headline(h)),
            }
        }

        for line in s.lines() {
            if let Some(parts) = parse::headline(line) {
                while stack.last().is_some_and(|h| h.level >= parts.level) {
                    close(&mut stack, &mut doc);
                }
                stack.push(
                    Headline::new(parts.level, parts.title)
                        .with_status(Status::from_keyword(parts.keyword))
                        .with_tags(parts.tags),
                );
                continue;
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let node = if let Some((name, value)) = parse::file_directive(line)
            {
                Node::FileDirective {
                    name: name.to_owned(),
                    value: value.to_owned(),
                }
            } else if let Some(text) = parse::comment(line) {
                Node::Comment(text.to_owned())
            } else {
                Node::Text(line.to_owned())
            };

            match stack.last_mut() {
                Some(h) => h.children.push(node),
                None => doc.children.push(node),
            }
        }

        while !stack.is_empty() {
            close(&mut stack, &mut doc);
        }

        Ok(doc)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn print(f: &mut fmt::Formatter<'_>, nodes: &[Node]) -> fmt::Result {
            for node in nodes {
                match node {
                    Node::Headline(h) => {
                        write!(f, "{} ", "*".repeat(h.level.max(1)))?;
                        if let Some(kw) = h.status.keyword() {
                            write!(f, "{kw} ")?;
                        }
                        write!(f, "{}", h.text)?;
                        if !h.tags.is_empty() {
                            write!(f, " :{}:", h.tags.join(":"))?;
                        }
                        writeln!(f)?;
                        print(f, &h.children)?;
                    }
                    Node::Comment(text) => writeln!(f, "# {text}")?,
                    Node::FileDirective { name, value } => {
                        writeln!(f, "#+{name}: {value}")?
                    }
                    Node::Text(text) => writeln!(f, "{text}")?,
                }
            }
            Ok(())
        }

        print(f, &self.children)
    }
}
