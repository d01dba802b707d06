use std::{collections::BTreeSet, path::PathBuf};

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use itertools::Itertools;

use inktools::{
    report::{self, Align, InkDescription},
    Document, Ink, InkStats, RandomInkChooser, Settings,
};

const DEFAULT_DATABASE: &str = "inks.org";
const NOTHING_FOUND: &str = "ничего подходящего не нашлось";

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Ink database file, use '-' for stdin. Defaults to the last database
    /// opened.
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Settings file, defaults to ~/.config/inktools/settings.json.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show collection totals and per-table statistics.
    Stats {
        /// List the inks under each table row.
        #[arg(long)]
        inks: bool,
    },

    /// Pick a random available ink.
    Random {
        /// Tags the ink must have one of, prefix a tag with '!' to exclude
        /// inks that have it instead.
        tags: Vec<String>,

        /// Number of picks, consecutive picks are never the same ink.
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,

        /// Seed for a repeatable sequence of picks.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show everything known about inks whose name contains the text.
    Show { name: String },

    /// List inks with incomplete descriptions.
    Missing,

    /// List tags available for filtering along with their display names.
    Tags,

    /// List recently opened databases.
    Recent,
}

use Commands::*;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut session = Session::new(&cli)?;

    match cli.command {
        Stats { inks } => print_stats(&session.load()?, inks),
        Random { tags, count, seed } => {
            random(&session.load()?, session.today, &tags, count, seed)
        }
        Show { name } => {
            let stats = session.load()?;
            let name = name.to_lowercase();
            let found = stats
                .inks
                .iter()
                .filter(|i| i.name.to_lowercase().contains(&name))
                .sorted_by_cached_key(|i| i.name.to_lowercase())
                .collect::<Vec<_>>();
            if found.is_empty() {
                println!("{NOTHING_FOUND}");
            }
            for (i, ink) in found.into_iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print_ink(&stats, ink, session.today, true);
            }
        }
        Missing => {
            let stats = session.load()?;
            for &id in &stats.missing_data {
                let ink = stats.ink(id);
                println!("{}: {}", ink.name, report::missing_data_str(ink));
            }
        }
        Tags => {
            let stats = session.load()?;
            for tag in stats.known_tags() {
                println!("{tag:24} {}", stats.tag_display_name(tag));
            }
        }
        Recent => {
            for file in &session.settings.recent_files {
                println!("{}", file.display());
            }
        }
    }

    Ok(())
}

/// Settings and database location for one run of the program.
struct Session {
    settings: Settings,
    settings_path: Option<PathBuf>,
    database: PathBuf,
    today: NaiveDate,
}

impl Session {
    fn new(cli: &Cli) -> Result<Self> {
        let settings_path =
            cli.settings.clone().or_else(Settings::default_path);
        let settings = match &settings_path {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        let database = cli
            .database
            .clone()
            .or_else(|| settings.database_file_name.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));

        Ok(Session {
            settings,
            settings_path,
            database,
            today: chrono::Local::now().date_naive(),
        })
    }

    /// Read the database and gather statistics, remember the database in
    /// settings.
    fn load(&mut self) -> Result<InkStats> {
        let doc = Document::load(&self.database)?;
        let stats = InkStats::from_document(&doc, self.today);

        if self.database.to_str() != Some("-") {
            let database = std::fs::canonicalize(&self.database)
                .unwrap_or_else(|_| self.database.clone());
            self.settings.add_recent_file(&database);
            self.settings.database_file_name = Some(database);

            if let Some(path) = &self.settings_path {
                if let Err(e) = self.settings.save(path) {
                    log::warn!("Couldn't save settings: {e:#}");
                }
            }
        }

        Ok(stats)
    }
}

fn print_stats(stats: &InkStats, list_inks: bool) {
    let totals: Vec<Vec<String>> = report::total_result_table(stats)
        .into_iter()
        .map(Vec::from)
        .collect();
    print!(
        "{}",
        report::format_table(
            &[
                ("", Align::Left),
                ("", Align::Right),
                ("", Align::Right),
                ("", Align::Left),
            ],
            false,
            &totals,
        )
    );

    for table in &stats.tables {
        if table.stats.is_empty() {
            continue;
        }

        println!("\n{}", table.title);

        let mut rows: Vec<Vec<String>> = Vec::new();
        for (key, value) in table.rows(&stats.tag_names) {
            let mut row = vec![stats.tag_display_name(key).to_owned()];
            row.extend(value.counter_strs());
            rows.push(row);

            if list_inks {
                for ink in value
                    .inks
                    .iter()
                    .map(|&id| stats.ink(id))
                    .sorted_by_cached_key(|i| i.name.to_lowercase())
                {
                    rows.push(vec![format!("  {}", ink.name)]);
                }
            }
        }

        print!(
            "{}",
            report::format_table(
                &[
                    (table.column_title.as_str(), Align::Left),
                    ("в наличии", Align::Right),
                    ("отсутствуют", Align::Right),
                    ("планируются", Align::Right),
                    ("не нужны", Align::Right),
                ],
                true,
                &rows,
            )
        );
    }
}

fn random(
    stats: &InkStats,
    today: NaiveDate,
    tags: &[String],
    count: usize,
    seed: Option<u64>,
) {
    if stats.available.is_empty() {
        println!("Нет чернил - не из чего выбирать");
        return;
    }

    let mut exclude = BTreeSet::new();
    let mut include = BTreeSet::new();
    for tag in tags {
        let tag = tag.to_lowercase();
        match tag.strip_prefix('!') {
            Some(tag) => exclude.insert(tag.to_owned()),
            None => include.insert(tag.clone()),
        };
    }

    let mut chooser = match seed {
        Some(seed) => RandomInkChooser::seeded(stats, seed),
        None => RandomInkChooser::new(stats),
    };
    chooser.filter_inks(&exclude, &include);

    for i in 0..count {
        let Some(ink) = chooser.choice() else {
            println!("{NOTHING_FOUND}");
            return;
        };
        if i > 0 {
            println!();
        }
        print_ink(stats, ink, today, false);
    }
}

fn print_ink(stats: &InkStats, ink: &Ink, today: NaiveDate, full: bool) {
    let desc = InkDescription::new(stats, ink);

    if desc.tags.is_empty() {
        println!("{}", desc.name);
    } else {
        println!("{} ({})", desc.name, desc.tags);
    }
    if !desc.description.is_empty() {
        println!("{}", desc.description);
    }
    if !desc.availability.is_empty() {
        println!("В наличии: {}", desc.availability);
    }

    if !full {
        return;
    }

    println!("Статус: {}", report::status_str(ink.status));
    if let Some(color) = ink.color {
        println!("Цвет: {}", report::color_hex(color));
    }
    if let Some(main_color) = &ink.main_color {
        println!("Основной цвет: {}", stats.tag_display_name(main_color));
    }
    if !ink.missing.is_empty() {
        println!("Отсутствуют данные: {}", report::missing_data_str(ink));
    }

    println!("Заправок: {}", ink.usage.len());
    let usage: Vec<Vec<String>> = report::usage_rows(ink, today)
        .into_iter()
        .map(Vec::from)
        .collect();
    print!(
        "{}",
        report::format_table(
            &[("", Align::Left), ("", Align::Right), ("", Align::Left)],
            false,
            &usage,
        )
    );
}
