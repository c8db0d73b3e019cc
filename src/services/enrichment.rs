use std::sync::Arc;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{EnrichedRecommendationItem, MovieDetails, RecommendationItem},
    services::providers::MovieProvider,
};

pub const MOVIE_CACHE_TTL: u64 = 86400; // 24 hours

/// Attaches movie database metadata to recommendations
#[derive(Clone)]
pub struct MovieEnricher {
    provider: Arc<dyn MovieProvider>,
    cache: Cache,
    image_base_url: String,
}

impl MovieEnricher {
    pub fn new(provider: Arc<dyn MovieProvider>, cache: Cache, image_base_url: String) -> Self {
        Self {
            provider,
            cache,
            image_base_url,
        }
    }

    /// Metadata for one title, from cache or from the provider's best match
    ///
    /// `Ok(None)` means the provider had no match; that outcome is not cached.
    pub async fn lookup(&self, title: &str, year: &str) -> AppResult<Option<MovieDetails>> {
        cached!(
            self.cache,
            CacheKey::movie(title, year),
            MOVIE_CACHE_TTL,
            async move {
                let results = self.provider.search_movie(title, year).await?;

                let Some(best) = results.into_iter().next() else {
                    tracing::debug!(title = %title, year = %year, "No movie match");
                    return Ok::<_, AppError>(None);
                };

                let details = MovieDetails::from_tmdb(best, &self.image_base_url);
                tracing::debug!(
                    title = %title,
                    year = %year,
                    movie_id = details.id,
                    provider = self.provider.name(),
                    "Movie matched"
                );
                Ok(Some(details))
            }
        )
    }

    /// Looks up every item concurrently, keeping the input order
    ///
    /// A failed lookup leaves that item's `details` empty and does not affect
    /// the others.
    pub async fn enrich_all(&self, items: Vec<RecommendationItem>) -> Vec<EnrichedRecommendationItem> {
        let mut tasks = Vec::with_capacity(items.len());

        for item in &items {
            let enricher = self.clone();
            let title = item.title.clone();
            let year = item.year.clone();
            let task = tokio::spawn(async move { enricher.lookup(&title, &year).await });
            tasks.push(task);
        }

        let mut enriched = Vec::with_capacity(items.len());
        let mut failures = 0;

        for (item, task) in items.into_iter().zip(tasks) {
            let details = match task.await {
                Ok(Ok(details)) => details,
                Ok(Err(e)) => {
                    tracing::warn!(title = %item.title, error = %e, "Movie lookup failed");
                    failures += 1;
                    None
                }
                Err(e) => {
                    tracing::error!(title = %item.title, error = %e, "Movie lookup task failed");
                    failures += 1;
                    None
                }
            };
            enriched.push(EnrichedRecommendationItem { item, details });
        }

        if failures > 0 {
            tracing::warn!(
                success_count = enriched.len() - failures,
                error_count = failures,
                "Partial enrichment failure"
            );
        }

        enriched
    }
}
