use std::collections::BTreeSet;

use anyhow::{bail, Result};
use chrono::NaiveDate;

use crate::{
    directive::{StatsConfig, TagNames},
    fields::{self, UsageEntry},
    tag_stat::{TableKind, TagStatTable},
    Document, Headline, Node, Status,
};

/// Tag that marks a headline as an ink description.
pub const INK_TAG: &str = "ink";

const PARAMS_HEADLINES: &[&str] = &["параметры"];
const AVAIL_HEADLINES: &[&str] = &["наличие", "в наличии"];
const USAGE_HEADLINES: &[&str] = &["использование", "заправки"];

pub const OTHER_TAGS: &str = "прочие метки";
pub const INCOMPLETE_DATA: &str = "неполные данные";

/// Index of an ink in [`InkStats::inks`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct InkId(pub usize);

/// Kinds of data an ink description can lack.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum MissingField {
    Tags,
    Description,
    Color,
    MainColor,
}

/// An ink headline with the data extracted from its contents.
#[derive(Clone, Debug, Default)]
pub struct Ink {
    pub name: String,
    pub tags: Vec<String>,
    pub status: Status,
    /// Free text lines directly under the headline.
    pub description: Vec<String>,
    /// 24-bit RGB sample.
    pub color: Option<u32>,
    /// Tag of the main color group.
    pub main_color: Option<String>,
    pub volume_ml: f64,
    pub cartridges: bool,
    pub usage: Vec<UsageEntry>,
    /// Days since the most recent usage log entry.
    pub days_since_last_use: Option<i64>,
    pub missing: BTreeSet<MissingField>,
}

impl Ink {
    /// Read an ink from a document node.
    ///
    /// It is an error to call this on anything that isn't a headline tagged
    /// as an ink.
    pub fn from_node(
        node: &Node,
        names: &TagNames,
        today: NaiveDate,
    ) -> Result<Ink> {
        let Node::Headline(h) = node else {
            bail!("Ink::from_node: node is not a headline");
        };
        if !h.has_tag(INK_TAG) {
            bail!("Ink::from_node: {:?} is not tagged {INK_TAG:?}", h.text);
        }
        Ok(Ink::read(h, names, today))
    }

    fn read(h: &Headline, names: &TagNames, today: NaiveDate) -> Ink {
        let mut ink = Ink {
            name: h.text.clone(),
            tags: h.tags.clone(),
            status: h.status,
            description: h.text_lines().map(str::to_owned).collect(),
            ..Default::default()
        };

        // Later lines override earlier ones.
        let mut main_color_name = None;
        for params in h.sub_headlines(PARAMS_HEADLINES) {
            for line in params.text_lines() {
                if let Some(color) = fields::color(line) {
                    ink.color = Some(color);
                }
                if let Some(name) = fields::main_color_name(line) {
                    main_color_name = Some(name.to_lowercase());
                }
            }
        }
        if let Some(name) = main_color_name {
            ink.main_color = resolve_main_color(names, &name);
            if ink.main_color.is_none() {
                log::debug!("{:?}: unknown main color {name:?}", ink.name);
            }
        }

        for avail in h.sub_headlines(AVAIL_HEADLINES) {
            for line in avail.text_lines() {
                if let Some(ml) = fields::volume_ml(line) {
                    ink.volume_ml += ml;
                } else if fields::cartridge(line) {
                    ink.cartridges = true;
                }
            }
        }

        for usage in h.sub_headlines(USAGE_HEADLINES) {
            ink.usage
                .extend(usage.text_lines().filter_map(fields::usage_entry));
        }
        ink.days_since_last_use = ink
            .usage
            .iter()
            .map(|e| (today - e.date).num_days())
            .min();

        if !ink.tags.iter().any(|t| t != INK_TAG) {
            ink.missing.insert(MissingField::Tags);
        }
        if ink.description.is_empty() {
            ink.missing.insert(MissingField::Description);
        }
        if ink.color.is_none() {
            ink.missing.insert(MissingField::Color);
        }
        if ink.main_color.is_none() {
            ink.missing.insert(MissingField::MainColor);
        }

        ink
    }

    /// Has a bottle or cartridges in the collection, regardless of status.
    pub fn is_available(&self) -> bool {
        self.volume_ml > 0.0 || self.cartridges
    }

    /// Tags other than the ink marker.
    pub fn display_tags(&self) -> impl Iterator<Item = &str> {
        self.tags
            .iter()
            .map(String::as_str)
            .filter(|t| *t != INK_TAG)
    }
}

/// Find the tag a free-text color name refers to.
fn resolve_main_color(names: &TagNames, name: &str) -> Option<String> {
    if let Some(tag) = names.tag_for_name(name) {
        return Some(tag.to_owned());
    }
    names.contains_key(name).then(|| name.to_owned())
}

/// Collection statistics gathered from a single pass over the document.
#[derive(Clone, Debug, Default)]
pub struct InkStats {
    pub inks: Vec<Ink>,
    /// Total volume of available bottles.
    pub avail_ml: f64,
    pub available: Vec<InkId>,
    pub unavailable: Vec<InkId>,
    /// Inks without a status, these may also be in either availability
    /// list.
    pub unwanted: Vec<InkId>,
    pub tables: Vec<TagStatTable>,
    pub tag_names: TagNames,
    /// Tags from `#+TAGS:` lines.
    pub file_tags: BTreeSet<String>,
    pub missing_data: Vec<InkId>,
    /// Inks that matched no `@TAGSTAT` table.
    pub unmatched: Vec<InkId>,
}

/// Tables the aggregator fills by its own rules.
struct SpecialTables {
    main_color: TagStatTable,
    recency: TagStatTable,
    usage: TagStatTable,
    other: TagStatTable,
}

impl InkStats {
    /// Read configuration directives from the document and gather
    /// statistics.
    pub fn from_document(doc: &Document, today: NaiveDate) -> Self {
        InkStats::new(doc, StatsConfig::from_document(doc), today)
    }

    pub fn new(doc: &Document, config: StatsConfig, today: NaiveDate) -> Self {
        let mut stats = InkStats {
            tables: config.tag_stats.iter().map(TagStatTable::from_decl).collect(),
            tag_names: config.tag_names,
            file_tags: config.file_tags,
            ..Default::default()
        };

        let mut special = SpecialTables {
            main_color: TagStatTable::new(
                "По основному цвету",
                "Цвет",
                TableKind::MainColor,
            ),
            recency: TagStatTable::new(
                "По времени использования",
                "Последняя заправка",
                TableKind::Recency,
            ),
            usage: TagStatTable::new(
                "По количеству заправок",
                "Заправок",
                TableKind::UsageCount,
            ),
            other: TagStatTable::new("Прочее", "Чернила", TableKind::Other)
                .with_rows(&[OTHER_TAGS, INCOMPLETE_DATA]),
        };

        stats.scan(&doc.children, &mut special, today);
        special.other.drop_empty_rows();

        stats.tables.extend([
            special.main_color,
            special.recency,
            special.usage,
            special.other,
        ]);

        log::info!(
            "{} inks, {} available ({:.0} ml), {} unwanted, {} with missing data",
            stats.inks.len(),
            stats.available.len(),
            stats.avail_ml,
            stats.unwanted.len(),
            stats.missing_data.len()
        );

        stats
    }

    fn scan(
        &mut self,
        nodes: &[Node],
        special: &mut SpecialTables,
        today: NaiveDate,
    ) {
        for node in nodes {
            match node {
                Node::Headline(h) if h.has_tag(INK_TAG) => {
                    // Ink contents are not searched for more inks.
                    let ink = Ink::read(h, &self.tag_names, today);
                    self.add_ink(ink, special);
                }
                Node::Headline(h) => self.scan(&h.children, special, today),
                _ => {}
            }
        }
    }

    fn add_ink(&mut self, ink: Ink, special: &mut SpecialTables) {
        let id = InkId(self.inks.len());

        self.avail_ml += ink.volume_ml;

        if ink.is_available() {
            self.available.push(id);
        } else {
            self.unavailable.push(id);
        }
        // Unwanted is independent of availability.
        if ink.status == Status::Unplanned {
            self.unwanted.push(id);
        }

        let (band, label) = recency_band(ink.days_since_last_use);
        special.recency.add_ink_in_band(&label, band, id, &ink);

        if let Some((band, label)) = usage_band(ink.usage.len()) {
            special.usage.add_ink_in_band(label, band, id, &ink);
        }

        special.main_color.gather_statistics(id, &ink);

        let mut matched = false;
        for table in self.tables.iter_mut() {
            matched |= table.gather_statistics(id, &ink);
        }

        if !matched {
            special.other.add_ink(OTHER_TAGS, id, &ink);
            self.unmatched.push(id);
        }
        if !ink.missing.is_empty() {
            special.other.add_ink(INCOMPLETE_DATA, id, &ink);
            self.missing_data.push(id);
        }

        self.inks.push(ink);
    }

    pub fn ink(&self, id: InkId) -> &Ink {
        &self.inks[id.0]
    }

    pub fn total(&self) -> usize {
        self.available.len() + self.unavailable.len()
    }

    pub fn tag_display_name<'a>(&'a self, tag: &'a str) -> &'a str {
        self.tag_names.display(tag)
    }

    /// Tags worth offering for filtering.
    ///
    /// These are the tags of the `@TAGSTAT` tables, or the `#+TAGS:` list
    /// if there are no such tables.
    pub fn known_tags(&self) -> BTreeSet<&str> {
        let ret: BTreeSet<&str> = self
            .tables
            .iter()
            .filter_map(TagStatTable::tags)
            .flatten()
            .map(String::as_str)
            .collect();

        if ret.is_empty() {
            self.file_tags.iter().map(String::as_str).collect()
        } else {
            ret
        }
    }
}

/// Row for time since last use, bands sort in chronological order.
fn recency_band(days: Option<i64>) -> (usize, String) {
    match days {
        None => (11, "никогда".into()),
        Some(d) if d < 7 => {
            // Future dates count as today.
            let d = d.max(0);
            (d as usize, format!("{d} дн. назад"))
        }
        Some(d) if d < 31 => (7, "больше недели".into()),
        Some(d) if d < 182 => (8, "больше месяца".into()),
        Some(d) if d < 365 => (9, "больше полугода".into()),
        Some(_) => (10, "больше года".into()),
    }
}

/// Row for number of refills, no row for inks never used.
fn usage_band(count: usize) -> Option<(usize, &'static str)> {
    match count {
        0 => None,
        1 => Some((0, "1 раз")),
        2..=5 => Some((1, "2-5 раз")),
        6..=10 => Some((2, "6-10 раз")),
        _ => Some((3, "больше 10 раз")),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    pub(crate) const SAMPLE: &str = "\
# @TAGSTAT По цветам:Цвет:blue red black
# @TAGNAMES blue=синие:red=красные:black=чёрные
* Коллекция
** DONE Pelikan 4001 Royal Blue :ink:blue:
Классика.
*** параметры
цвет: #1f3a93
основной цвет: Синие
*** в наличии
флакон 30 мл
флакон abc мл
*** заправки
2024-06-13: Lamy Safari
01.06.2024: Pilot 78G
2024/06/14: неверная дата
** Diamine Oxblood :ink:red:blue:
Не понравились.
*** наличие
картриджи
** TODO Iroshizuku Take-sumi :ink:black:
** Noodler's X-Feather :ink:
*** в наличии
флакон 1000 мл
*** использование
2023-01-01: old
** Sailor Yama-dori :ink:teal:
Бирюзовые.
*** параметры
основной цвет: бирюзовые
* Прочее
** Not an ink
*** в наличии
флакон 500 мл
";

    fn stats() -> InkStats {
        let doc: Document = SAMPLE.parse().unwrap();
        InkStats::from_document(&doc, today())
    }

    fn find<'a>(stats: &'a InkStats, name: &str) -> (InkId, &'a Ink) {
        let i = stats.inks.iter().position(|i| i.name == name).unwrap();
        (InkId(i), &stats.inks[i])
    }

    fn table<'a>(stats: &'a InkStats, title: &str) -> &'a TagStatTable {
        stats.tables.iter().find(|t| t.title == title).unwrap()
    }

    #[test]
    fn test_ink_fields() {
        let stats = stats();
        assert_eq!(stats.inks.len(), 5);

        let (_, pelikan) = find(&stats, "Pelikan 4001 Royal Blue");
        assert_eq!(pelikan.status, Status::Done);
        assert_eq!(pelikan.color, Some(0x1f3a93));
        assert_eq!(pelikan.main_color.as_deref(), Some("blue"));
        assert_eq!(pelikan.volume_ml, 30.0);
        assert!(!pelikan.cartridges);
        assert_eq!(pelikan.usage.len(), 2);
        assert_eq!(pelikan.days_since_last_use, Some(2));
        assert!(pelikan.missing.is_empty());

        let (_, oxblood) = find(&stats, "Diamine Oxblood");
        assert!(oxblood.cartridges);
        assert!(oxblood.is_available());
        assert_eq!(oxblood.days_since_last_use, None);
        assert_eq!(
            oxblood.missing,
            BTreeSet::from([MissingField::Color, MissingField::MainColor])
        );

        let (_, noodlers) = find(&stats, "Noodler's X-Feather");
        assert!(noodlers.missing.contains(&MissingField::Tags));
        assert!(noodlers.missing.contains(&MissingField::Description));

        // Unknown color names don't resolve.
        let (_, sailor) = find(&stats, "Sailor Yama-dori");
        assert_eq!(sailor.main_color, None);
    }

    #[test]
    fn test_totals() {
        let stats = stats();
        assert_eq!(stats.avail_ml, 1030.0);
        assert_eq!(stats.available.len(), 3);
        assert_eq!(stats.unavailable.len(), 2);
        assert_eq!(stats.total(), 5);
        // Oxblood, Noodler's and Sailor have no status.
        assert_eq!(stats.unwanted.len(), 3);
    }

    #[test]
    fn test_unwanted_and_available_overlap() {
        let stats = stats();
        let (id, _) = find(&stats, "Diamine Oxblood");
        assert!(stats.available.contains(&id));
        assert!(stats.unwanted.contains(&id));
        let (id, _) = find(&stats, "Sailor Yama-dori");
        assert!(stats.unavailable.contains(&id));
        assert!(stats.unwanted.contains(&id));
    }

    #[test]
    fn test_tag_tables() {
        let stats = stats();
        let colors = table(&stats, "По цветам");
        assert_eq!(colors.stats["blue"].available, 2);
        assert_eq!(colors.stats["blue"].unwanted, 1);
        assert_eq!(colors.stats["red"].available, 1);
        assert_eq!(colors.stats["black"].unavailable, 1);
        assert_eq!(colors.stats["black"].wanted, 1);

        let main = table(&stats, "По основному цвету");
        assert_eq!(main.stats.len(), 1);
        assert_eq!(main.stats["blue"].inks.len(), 1);
    }

    #[test]
    fn test_special_tables() {
        let stats = stats();

        let recency = table(&stats, "По времени использования");
        let rows: Vec<(&str, usize)> = recency
            .rows(&stats.tag_names)
            .into_iter()
            .map(|(k, v)| (k, v.inks.len()))
            .collect();
        assert_eq!(
            rows,
            vec![("2 дн. назад", 1), ("больше года", 1), ("никогда", 3)]
        );

        let usage = table(&stats, "По количеству заправок");
        assert_eq!(usage.stats["1 раз"].inks.len(), 1);
        assert_eq!(usage.stats["2-5 раз"].inks.len(), 1);
        assert_eq!(usage.stats.len(), 2);

        let other = table(&stats, "Прочее");
        let keys: Vec<&str> = other
            .rows(&stats.tag_names)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![OTHER_TAGS, INCOMPLETE_DATA]);
        // Noodler's and Sailor aren't in any TAGSTAT table.
        assert_eq!(other.stats[OTHER_TAGS].inks.len(), 2);
        assert_eq!(stats.unmatched.len(), 2);
        assert_eq!(other.stats[INCOMPLETE_DATA].inks.len(), 4);
        assert_eq!(stats.missing_data.len(), 4);
    }

    #[test]
    fn test_table_order() {
        let stats = stats();
        let titles: Vec<&str> =
            stats.tables.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "По цветам",
                "По основному цвету",
                "По времени использования",
                "По количеству заправок",
                "Прочее"
            ]
        );
    }

    #[test]
    fn test_volume_parsing() {
        let doc: Document = "\
* A :ink:x:
** в наличии
флакон abc мл
"
        .parse()
        .unwrap();
        let stats = InkStats::from_document(&doc, today());
        assert_eq!(stats.inks[0].volume_ml, 0.0);
        assert!(!stats.inks[0].is_available());
        assert_eq!(stats.available.len(), 0);
    }

    #[test]
    fn test_nested_ink_is_not_separate() {
        let doc: Document = "\
* Коллекция
** Outer :ink:a:
*** Inner :ink:b:
**** в наличии
флакон 10 мл
"
        .parse()
        .unwrap();
        let stats = InkStats::from_document(&doc, today());
        assert_eq!(stats.inks.len(), 1);
        assert_eq!(stats.inks[0].name, "Outer");
        // Inner's bottle isn't under an availability heading of Outer.
        assert_eq!(stats.avail_ml, 0.0);
    }

    #[test]
    fn test_last_parameter_line_wins() {
        let doc: Document = "\
# @TAGNAMES blue=синие:red=красные
* A :ink:blue:
** параметры
цвет: #000001
основной цвет: синие
цвет: #0000ff
основной цвет: красные
"
        .parse()
        .unwrap();
        let stats = InkStats::from_document(&doc, today());
        assert_eq!(stats.inks[0].color, Some(0x0000ff));
        assert_eq!(stats.inks[0].main_color.as_deref(), Some("red"));
    }

    #[test]
    fn test_volume_adds_up_across_headings() {
        let doc: Document = "\
* A :ink:x:
** наличие
флакон 30 мл
** в наличии
флакон 50 мл
флакон 20 мл
* B :ink:x:
** в наличии
флакон 5 мл
"
        .parse()
        .unwrap();
        let stats = InkStats::from_document(&doc, today());
        assert_eq!(stats.inks[0].volume_ml, 100.0);
        assert_eq!(stats.inks[1].volume_ml, 5.0);
        assert_eq!(stats.avail_ml, 105.0);
    }

    #[test]
    fn test_repeated_tag_counted_once() {
        let doc: Document = "\
# @TAGSTAT T:C:a
* X :ink:a:a:
** в наличии
флакон 10 мл
"
        .parse()
        .unwrap();
        let stats = InkStats::from_document(&doc, today());
        let row = &table(&stats, "T").stats["a"];
        assert_eq!(row.available, 1);
        assert_eq!(row.inks, vec![InkId(0)]);
    }

    #[test]
    fn test_missing_tags_flag() {
        let names = TagNames::default();
        let lone = Node::Headline(Headline::new(1, "A").with_tags(["ink"]));
        let ink = Ink::from_node(&lone, &names, today()).unwrap();
        assert!(ink.missing.contains(&MissingField::Tags));

        let tagged = Node::Headline(
            Headline::new(1, "A")
                .with_tags(["ink", "blue"])
                .with_child("Описание"),
        );
        let ink = Ink::from_node(&tagged, &names, today()).unwrap();
        assert!(!ink.missing.contains(&MissingField::Tags));
        assert!(!ink.missing.contains(&MissingField::Description));
    }

    #[test]
    fn test_from_node_contract() {
        let names = TagNames::default();
        assert!(Ink::from_node(&Node::from("text"), &names, today()).is_err());
        let plain = Node::Headline(Headline::new(1, "A").with_tags(["blue"]));
        assert!(Ink::from_node(&plain, &names, today()).is_err());
    }

    #[test]
    fn test_main_color_by_tag_name() {
        let mut names = TagNames::default();
        names.insert("blue", "синие");
        assert_eq!(resolve_main_color(&names, "синие").as_deref(), Some("blue"));
        assert_eq!(resolve_main_color(&names, "blue").as_deref(), Some("blue"));
        assert_eq!(resolve_main_color(&names, "green"), None);
    }

    #[test]
    fn test_known_tags() {
        let stats = stats();
        assert_eq!(
            stats.known_tags().into_iter().collect::<Vec<_>>(),
            vec!["black", "blue", "red"]
        );

        let doc: Document = "#+TAGS: b a\n* X :ink:a:\n".parse().unwrap();
        let stats = InkStats::from_document(&doc, today());
        assert_eq!(
            stats.known_tags().into_iter().collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn test_bands() {
        assert_eq!(recency_band(Some(0)), (0, "0 дн. назад".into()));
        assert_eq!(recency_band(Some(-3)), (0, "0 дн. назад".into()));
        assert_eq!(recency_band(Some(6)), (6, "6 дн. назад".into()));
        assert_eq!(recency_band(Some(7)).1, "больше недели");
        assert_eq!(recency_band(Some(31)).1, "больше месяца");
        assert_eq!(recency_band(Some(182)).1, "больше полугода");
        assert_eq!(recency_band(Some(365)).1, "больше года");
        assert_eq!(usage_band(5), Some((1, "2-5 раз")));
        assert_eq!(usage_band(6), Some((2, "6-10 раз")));
        assert_eq!(usage_band(11), Some((3, "больше 10 раз")));
    }
}
