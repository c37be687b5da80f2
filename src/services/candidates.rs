use async_trait::async_trait;
use std::sync::Arc;

use crate::core::pipeline::{CandidateSource, CollaboratorError};
use crate::models::{Candidate, ExtractedConstraints};

/// Candidate source backed by a listing batch held in memory
///
/// With hard filters on, listings are dropped when they are outside the stated
/// location, above the budget or below the room count; a listing missing the
/// filtered attribute is dropped too. With hard filters off every listing is
/// returned and left to fuzzy scoring.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCandidateSource {
    listings: Arc<Vec<Candidate>>,
    hard_filters: bool,
    fetch_limit: Option<usize>,
}

impl InMemoryCandidateSource {
    pub fn new(listings: Vec<Candidate>) -> Self {
        Self {
            listings: Arc::new(listings),
            hard_filters: false,
            fetch_limit: None,
        }
    }

    pub fn with_hard_filters(mut self, enabled: bool) -> Self {
        self.hard_filters = enabled;
        self
    }

    /// Cap the number of listings returned, cheapest first
    pub fn with_fetch_limit(mut self, limit: Option<usize>) -> Self {
        self.fetch_limit = limit;
        self
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    fn passes(&self, listing: &Candidate, constraints: &ExtractedConstraints) -> bool {
        if !self.hard_filters {
            return true;
        }
        matches_location(listing, constraints.location.as_deref())
            && matches_budget(listing, constraints.budget)
            && matches_rooms(listing, constraints.min_rooms)
    }
}

#[async_trait]
impl CandidateSource for InMemoryCandidateSource {
    async fn fetch_candidates(
        &self,
        constraints: &ExtractedConstraints,
    ) -> Result<Vec<Candidate>, CollaboratorError> {
        if let Some(listing) = self.listings.iter().find(|l| l.id.trim().is_empty()) {
            return Err(CollaboratorError::InvalidInput(format!(
                "listing without id at location {:?}",
                listing.location
            )));
        }

        let mut candidates: Vec<Candidate> = self
            .listings
            .iter()
            .filter(|listing| self.passes(listing, constraints))
            .cloned()
            .collect();

        if let Some(limit) = self.fetch_limit {
            candidates.sort_by(|a, b| {
                a.price
                    .unwrap_or(f64::INFINITY)
                    .total_cmp(&b.price.unwrap_or(f64::INFINITY))
            });
            candidates.truncate(limit);
        }

        tracing::debug!(
            "In-memory source returned {} of {} listings",
            candidates.len(),
            self.listings.len()
        );
        Ok(candidates)
    }
}

fn matches_location(listing: &Candidate, location: Option<&str>) -> bool {
    match location.map(str::trim).filter(|l| !l.is_empty()) {
        Some(wanted) => listing
            .location
            .to_lowercase()
            .contains(&wanted.to_lowercase()),
        None => true,
    }
}

fn matches_budget(listing: &Candidate, budget: Option<f64>) -> bool {
    match (budget, listing.price) {
        (Some(budget), Some(price)) => price <= budget,
        (Some(_), None) => false,
        (None, _) => true,
    }
}

fn matches_rooms(listing: &Candidate, min_rooms: Option<u32>) -> bool {
    match (min_rooms, listing.rooms) {
        (Some(min), Some(rooms)) => rooms >= min,
        (Some(_), None) => false,
        (None, _) => true,
    }
}
