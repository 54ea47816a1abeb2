use crate::domain::group::summarize_groups;
use crate::domain::listing::Listing;
use crate::models::config::ServerConfig;
use crate::processing::MatchRequest;
use crate::processing::clustering::{ClusteringEngine, MatchConfig};
use crate::processing::embedding::{EmbeddingProvider, EmbeddingResult, FastEmbedProvider};
use crate::repository::{ListingReader, MatchWriter, RepositoryError};

/// Keep listings whose title contains every whitespace-separated query
/// word, ignoring case. An empty query keeps everything.
pub fn filter_by_query(listings: Vec<Listing>, query: &str) -> Vec<Listing> {
    let query = query.to_lowercase();
    let query_tokens = query.split_whitespace().collect::<Vec<_>>();
    if query_tokens.is_empty() {
        return listings;
    }

    listings
        .into_iter()
        .filter(|listing| {
            let title = listing.title.to_lowercase();
            let title_tokens = title.split_whitespace().collect::<Vec<_>>();
            query_tokens.iter().all(|token| title_tokens.contains(token))
        })
        .collect()
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct MatchStats {
    pub platforms_loaded: usize,
    pub platforms_missing: usize,
    pub listings_loaded: usize,
    pub listings_filtered_out: usize,
    pub groups: usize,
    pub matched: usize,
    pub lexical_matches: usize,
    pub semantic_matches: usize,
    pub blocked_pairs: usize,
    pub same_platform_skips: usize,
}

/// Options for a single matching job.
#[derive(Clone, Copy, Debug)]
pub struct MatchJob<'a> {
    pub platforms: &'a [String],
    pub config: MatchConfig,
    pub filter_by_query: bool,
}

/// Load, cluster and export the listings for one request.
///
/// Requests whose category or query could escape the data directories are
/// rejected. The provider is only built once there is something to embed.
/// Failures are logged where they happen.
pub fn run_match<R, P, F>(
    request: &MatchRequest,
    job: MatchJob,
    repo: &R,
    make_provider: F,
) -> Result<MatchStats, ()>
where
    R: ListingReader + MatchWriter,
    P: EmbeddingProvider,
    F: FnOnce() -> EmbeddingResult<P>,
{
    if let Err(error) = request.validate() {
        log::error!("Rejecting match request: {error}");
        return Err(());
    }

    let MatchRequest { category, query } = request;
    let mut stats = MatchStats::default();

    if job.platforms.is_empty() {
        log::warn!("No platforms configured for category {category}");
        return Ok(stats);
    }

    let mut listings = Vec::new();
    for platform in job.platforms {
        match repo.list_listings(platform, category, query) {
            Ok(platform_listings) => {
                log::info!(
                    "Loaded {} listings from {platform} for {category}/{query}",
                    platform_listings.len()
                );
                stats.platforms_loaded += 1;
                listings.extend(platform_listings);
            }
            Err(RepositoryError::NotFound(path)) => {
                log::warn!("File not found: {}", path.display());
                stats.platforms_missing += 1;
            }
            Err(error) => {
                log::error!("Failed to load listings from {platform}: {error}");
                return Err(());
            }
        }
    }
    stats.listings_loaded = listings.len();

    if job.filter_by_query {
        listings = filter_by_query(listings, query);
        stats.listings_filtered_out = stats.listings_loaded - listings.len();
    }

    if listings.is_empty() {
        log::warn!("No products found for {category}/{query}");
        return Ok(stats);
    }

    let mut provider = match make_provider() {
        Ok(provider) => provider,
        Err(error) => {
            log::error!("Failed to initialize embedder for {category}/{query}: {error}");
            return Err(());
        }
    };

    let engine = ClusteringEngine::new(job.config);
    let outcome = match engine.run(listings, &mut provider) {
        Ok(outcome) => outcome,
        Err(error) => {
            log::error!("Failed to cluster listings for {category}/{query}: {error}");
            return Err(());
        }
    };

    stats.groups = outcome.stats.groups;
    stats.matched = outcome.stats.matched;
    stats.lexical_matches = outcome.stats.lexical_matches;
    stats.semantic_matches = outcome.stats.semantic_matches;
    stats.blocked_pairs = outcome.stats.blocked_pairs;
    stats.same_platform_skips = outcome.stats.same_platform_skips;

    if let Err(error) = repo.save_matched(category, query, &outcome.listings) {
        log::error!("Failed to save matched listings for {category}/{query}: {error}");
        return Err(());
    }

    let groups = summarize_groups(&outcome.listings);
    if let Err(error) = repo.save_groups(category, query, &groups) {
        log::error!("Failed to save product groups for {category}/{query}: {error}");
        return Err(());
    }

    log::info!(
        "Total matched products: {} / {}",
        stats.matched,
        outcome.listings.len()
    );

    Ok(stats)
}

/// Handle a matching request received by the worker.
pub async fn process_match_message<R>(request: MatchRequest, config: &ServerConfig, repo: R)
where
    R: ListingReader + MatchWriter,
{
    log::info!("Received Match: {request:?}");

    let match_config = match config.match_config() {
        Ok(match_config) => match_config,
        Err(error) => {
            log::error!("Invalid matching configuration: {error}");
            return;
        }
    };

    let job = MatchJob {
        platforms: config.platforms(&request.category),
        config: match_config,
        filter_by_query: config.filter_by_query,
    };

    match run_match(&request, job, &repo, || {
        FastEmbedProvider::from_name(&config.embedding_model)
    }) {
        Ok(stats) => {
            log::info!(
                "Finished Match for {}/{}: platforms_loaded={}, platforms_missing={}, listings_loaded={}, listings_filtered_out={}, groups={}, matched={}, lexical_matches={}, semantic_matches={}, blocked_pairs={}, same_platform_skips={}",
                request.category,
                request.query,
                stats.platforms_loaded,
                stats.platforms_missing,
                stats.listings_loaded,
                stats.listings_filtered_out,
                stats.groups,
                stats.matched,
                stats.lexical_matches,
                stats.semantic_matches,
                stats.blocked_pairs,
                stats.same_platform_skips
            );
        }
        Err(()) => {
            log::error!("Match failed for {}/{}", request.category, request.query);
        }
    }
}
