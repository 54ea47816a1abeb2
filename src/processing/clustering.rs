//! Single-pass grouping of listings into cross-platform product clusters.
//!
//! The default [`ClusteringMode::SeedAnchored`] sweep opens a group for the
//! first unassigned listing and pulls in every later unassigned listing from
//! another platform that passes blocking and one of the similarity tiers.
//! Membership is decided against the seed only, so two members of a group
//! need not be similar to each other, and reordering the input can change
//! the groups that come out.

use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::listing::{Listing, MatchedListing};
use crate::processing::blocking::{BlockingKey, KeyExtractor, TitleKeyExtractor};
use crate::processing::embedding::{EmbeddingError, EmbeddingProvider};
use crate::processing::similarity::{MatchKind, SimilarityScorer};
use crate::{DEFAULT_SEMANTIC_THRESHOLD, DEFAULT_TEXT_THRESHOLD};

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("{name} must be within [{min}, {max}], got {value}")]
    InvalidThreshold {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("unknown clustering mode: {0}")]
    UnknownMode(String),
    #[error("embedding provider unavailable: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("embedding batch does not fit the listings: {0}")]
    EmbeddingShape(String),
}

pub type MatchResult<T> = Result<T, MatchError>;

/// How accepted pairs turn into groups.
///
/// Names are matched case-insensitively and `-` is accepted for `_`, both in
/// configuration files and through [`str::parse`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum ClusteringMode {
    /// Greedy sweep where each group is judged against its seed only.
    #[default]
    SeedAnchored,
    /// Every cross-platform pair is scored and accepted pairs are joined
    /// transitively.
    Transitive,
}

impl FromStr for ClusteringMode {
    type Err = MatchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "seed_anchored" => Ok(ClusteringMode::SeedAnchored),
            "transitive" => Ok(ClusteringMode::Transitive),
            _ => Err(MatchError::UnknownMode(value.to_string())),
        }
    }
}

impl TryFrom<String> for ClusteringMode {
    type Error = MatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Run-scoped matching configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchConfig {
    text_threshold: f64,
    semantic_threshold: f32,
    mode: ClusteringMode,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            text_threshold: DEFAULT_TEXT_THRESHOLD,
            semantic_threshold: DEFAULT_SEMANTIC_THRESHOLD,
            mode: ClusteringMode::default(),
        }
    }
}

impl MatchConfig {
    /// Validates both thresholds. Values outside their range are rejected,
    /// never clamped.
    pub fn new(text_threshold: f64, semantic_threshold: f32) -> MatchResult<Self> {
        if !(0.0..=100.0).contains(&text_threshold) {
            return Err(MatchError::InvalidThreshold {
                name: "text_threshold",
                value: text_threshold,
                min: 0.0,
                max: 100.0,
            });
        }
        if !(0.0..=1.0).contains(&semantic_threshold) {
            return Err(MatchError::InvalidThreshold {
                name: "semantic_threshold",
                value: f64::from(semantic_threshold),
                min: 0.0,
                max: 1.0,
            });
        }

        Ok(Self {
            text_threshold,
            semantic_threshold,
            mode: ClusteringMode::default(),
        })
    }

    pub fn with_mode(mut self, mode: ClusteringMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn text_threshold(&self) -> f64 {
        self.text_threshold
    }

    pub fn semantic_threshold(&self) -> f32 {
        self.semantic_threshold
    }

    pub fn mode(&self) -> ClusteringMode {
        self.mode
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClusterStats {
    pub listings: usize,
    pub groups: usize,
    pub matched: usize,
    pub lexical_matches: usize,
    pub semantic_matches: usize,
    pub blocked_pairs: usize,
    pub same_platform_skips: usize,
}

impl ClusterStats {
    fn record(&mut self, kind: MatchKind) {
        match kind {
            MatchKind::Lexical => self.lexical_matches += 1,
            MatchKind::Semantic => self.semantic_matches += 1,
        }
    }
}

/// Annotated listings in input order plus counters for the run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClusterOutcome {
    pub listings: Vec<MatchedListing>,
    pub stats: ClusterStats,
}

/// Everything a pairwise decision needs, computed once per run.
struct Batch<'a> {
    listings: &'a [Listing],
    keys: Vec<BlockingKey>,
    embeddings: &'a [Vec<f32>],
}

pub struct ClusteringEngine<K = TitleKeyExtractor> {
    config: MatchConfig,
    scorer: SimilarityScorer,
    extractor: K,
}

impl ClusteringEngine<TitleKeyExtractor> {
    pub fn new(config: MatchConfig) -> Self {
        Self::with_extractor(config, TitleKeyExtractor)
    }
}

impl<K: KeyExtractor> ClusteringEngine<K> {
    pub fn with_extractor(config: MatchConfig, extractor: K) -> Self {
        Self {
            scorer: SimilarityScorer::new(config.text_threshold, config.semantic_threshold),
            config,
            extractor,
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Embed every title in one batch call and cluster the batch.
    ///
    /// An empty batch returns immediately without touching the provider.
    /// Provider failures abort the run.
    pub fn run<P>(&self, listings: Vec<Listing>, provider: &mut P) -> MatchResult<ClusterOutcome>
    where
        P: EmbeddingProvider + ?Sized,
    {
        if listings.is_empty() {
            return Ok(ClusterOutcome::default());
        }

        let titles = listings
            .iter()
            .map(|listing| listing.title.clone())
            .collect::<Vec<_>>();
        let embeddings = provider.embed_batch(&titles)?;

        self.cluster(listings, &embeddings)
    }

    /// Cluster a batch with precomputed, index-aligned embeddings.
    pub fn cluster(
        &self,
        listings: Vec<Listing>,
        embeddings: &[Vec<f32>],
    ) -> MatchResult<ClusterOutcome> {
        check_embedding_shape(listings.len(), embeddings)?;

        let batch = Batch {
            keys: listings
                .iter()
                .map(|listing| self.extractor.extract(&listing.title))
                .collect(),
            listings: &listings,
            embeddings,
        };

        let mut stats = ClusterStats {
            listings: listings.len(),
            ..Default::default()
        };
        let (group_ids, matched) = match self.config.mode {
            ClusteringMode::SeedAnchored => self.sweep_seed_anchored(&batch, &mut stats),
            ClusteringMode::Transitive => self.join_transitive(&batch, &mut stats),
        };
        stats.matched = matched.iter().filter(|&&m| m).count();

        log::debug!(
            "Clustered {} listings into {} groups: matched={}, lexical={}, semantic={}, blocked={}, same_platform={}",
            stats.listings,
            stats.groups,
            stats.matched,
            stats.lexical_matches,
            stats.semantic_matches,
            stats.blocked_pairs,
            stats.same_platform_skips
        );

        let listings = listings
            .into_iter()
            .zip(group_ids)
            .zip(matched)
            .map(|((listing, group_id), matched)| MatchedListing {
                listing,
                group_id,
                matched,
            })
            .collect();

        Ok(ClusterOutcome { listings, stats })
    }

    /// Same-platform check, blocking, then the two similarity tiers.
    fn decide(&self, batch: &Batch, i: usize, j: usize, stats: &mut ClusterStats) -> bool {
        let (a, b) = (&batch.listings[i], &batch.listings[j]);
        if a.platform == b.platform {
            stats.same_platform_skips += 1;
            return false;
        }
        if !batch.keys[i].same_model(&batch.keys[j]) {
            stats.blocked_pairs += 1;
            return false;
        }

        match self
            .scorer
            .confirm(&a.title, &b.title, &batch.embeddings[i], &batch.embeddings[j])
        {
            Some(kind) => {
                stats.record(kind);
                true
            }
            None => false,
        }
    }

    fn sweep_seed_anchored(
        &self,
        batch: &Batch,
        stats: &mut ClusterStats,
    ) -> (Vec<usize>, Vec<bool>) {
        let n = batch.listings.len();
        let mut group_ids: Vec<Option<usize>> = vec![None; n];
        let mut matched = vec![false; n];
        let mut next_group = 0;

        for i in 0..n {
            if group_ids[i].is_some() {
                continue;
            }

            let group = next_group;
            next_group += 1;
            group_ids[i] = Some(group);

            for j in (i + 1)..n {
                if group_ids[j].is_some() {
                    continue;
                }
                if self.decide(batch, i, j, stats) {
                    group_ids[j] = Some(group);
                    matched[i] = true;
                    matched[j] = true;
                }
            }
        }

        stats.groups = next_group;
        // Every index was visited by the outer loop, so all ids are set.
        let group_ids = group_ids
            .into_iter()
            .map(|id| id.unwrap_or_default())
            .collect();
        (group_ids, matched)
    }

    fn join_transitive(&self, batch: &Batch, stats: &mut ClusterStats) -> (Vec<usize>, Vec<bool>) {
        let n = batch.listings.len();
        let mut sets = DisjointSets::new(n);
        let mut matched = vec![false; n];

        for i in 0..n {
            for j in (i + 1)..n {
                if self.decide(batch, i, j, stats) {
                    sets.union(i, j);
                    matched[i] = true;
                    matched[j] = true;
                }
            }
        }

        let mut root_groups: Vec<Option<usize>> = vec![None; n];
        let mut next_group = 0;
        let mut group_ids = Vec::with_capacity(n);
        for i in 0..n {
            let root = sets.find(i);
            let group = *root_groups[root].get_or_insert_with(|| {
                next_group += 1;
                next_group - 1
            });
            group_ids.push(group);
        }

        stats.groups = next_group;
        (group_ids, matched)
    }
}

fn check_embedding_shape(listings: usize, embeddings: &[Vec<f32>]) -> MatchResult<()> {
    if embeddings.len() != listings {
        return Err(MatchError::EmbeddingShape(format!(
            "expected {listings} vectors, got {}",
            embeddings.len()
        )));
    }

    if let Some(first) = embeddings.first()
        && let Some((index, vector)) = embeddings
            .iter()
            .enumerate()
            .find(|(_, vector)| vector.len() != first.len())
    {
        return Err(MatchError::EmbeddingShape(format!(
            "vector {index} has {} dimensions, expected {}",
            vector.len(),
            first.len()
        )));
    }

    Ok(())
}

/// Union-find with path halving.
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut node: usize) -> usize {
        while self.parent[node] != node {
            self.parent[node] = self.parent[self.parent[node]];
            node = self.parent[node];
        }
        node
    }

    fn union(&mut self, a: usize, b: usize) {
        let (root_a, root_b) = (self.find(a), self.find(b));
        if root_a != root_b {
            // Keep the earliest index as root.
            let (keep, merge) = if root_a < root_b {
                (root_a, root_b)
            } else {
                (root_b, root_a)
            };
            self.parent[merge] = keep;
        }
    }
}
