use std::collections::BTreeSet;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{Ink, InkId, InkStats};

/// Random picks among available inks that never repeat the previous pick.
pub struct RandomInkChooser<'a, R = StdRng> {
    stats: &'a InkStats,
    rng: R,
    candidates: Vec<InkId>,
    last: Option<InkId>,
}

impl<'a> RandomInkChooser<'a, StdRng> {
    pub fn new(stats: &'a InkStats) -> Self {
        RandomInkChooser::with_rng(stats, StdRng::from_entropy())
    }

    /// Chooser with a repeatable sequence of picks.
    pub fn seeded(stats: &'a InkStats, seed: u64) -> Self {
        RandomInkChooser::with_rng(stats, StdRng::seed_from_u64(seed))
    }
}

impl<'a, R: Rng> RandomInkChooser<'a, R> {
    pub fn with_rng(stats: &'a InkStats, rng: R) -> Self {
        RandomInkChooser {
            stats,
            rng,
            candidates: Vec::new(),
            last: None,
        }
    }

    /// Rebuild the candidate list from the available inks.
    ///
    /// Empty `exclude` excludes nothing, empty `include` includes
    /// everything. Tags are compared in lowercase.
    pub fn filter_inks(
        &mut self,
        exclude: &BTreeSet<String>,
        include: &BTreeSet<String>,
    ) {
        let lower = |set: &BTreeSet<String>| -> BTreeSet<String> {
            set.iter().map(|t| t.to_lowercase()).collect()
        };
        let (exclude, include) = (lower(exclude), lower(include));

        let stats = self.stats;
        self.candidates = stats
            .available
            .iter()
            .copied()
            .filter(|&id| {
                let ink = stats.ink(id);
                if !ink.is_available() {
                    return false;
                }

                let tags: BTreeSet<String> =
                    ink.tags.iter().map(|t| t.to_lowercase()).collect();

                (exclude.is_empty() || tags.is_disjoint(&exclude))
                    && (include.is_empty() || !tags.is_disjoint(&include))
            })
            .collect();

        log::debug!(
            "filter_inks: {} of {} available inks pass",
            self.candidates.len(),
            stats.available.len()
        );
    }

    pub fn candidates(&self) -> &[InkId] {
        &self.candidates
    }

    /// Pick a random candidate different from the previous pick.
    ///
    /// The previous pick can only come up again if it's the only
    /// candidate.
    pub fn choice(&mut self) -> Option<&'a Ink> {
        let n = self.candidates.len();
        let idx = match n {
            0 => return None,
            1 => 0,
            _ => {
                let i = self.rng.gen_range(0..n);
                if Some(self.candidates[i]) == self.last {
                    // Shift to one of the other n - 1 candidates, each
                    // equally likely.
                    (i + self.rng.gen_range(1..n)) % n
                } else {
                    i
                }
            }
        };

        let (stats, id) = (self.stats, self.candidates[idx]);
        self.last = Some(id);
        Some(stats.ink(id))
    }
}
