//! Statistics and random picks for an ink collection kept in an outline
//! file.

mod chooser;
pub use chooser::RandomInkChooser;

pub mod directive;
pub use directive::{StatsConfig, TagNames};

pub mod fields;

mod outline;
pub use outline::{Document, Headline, Node, Status};

pub mod parse;

pub mod report;

pub mod settings;
pub use settings::Settings;

mod stats;
pub use stats::{
    Ink, InkId, InkStats, MissingField, INCOMPLETE_DATA, INK_TAG, OTHER_TAGS,
};

pub mod tag_stat;
pub use tag_stat::{StatValue, TableKind, TagStatTable};
