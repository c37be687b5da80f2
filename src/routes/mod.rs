// Route exports
pub mod interactions;
pub mod listings;

use actix_web::web;
use std::sync::Arc;

use crate::config::{RankingSettings, Settings};
use crate::core::membership::ConfigurationError;
use crate::core::pipeline::{Classifier, RankingPipeline};
use crate::services::{HistoryStore, KeywordClassifier};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RankingPipeline>,
    pub classifier: Arc<dyn Classifier>,
    pub history: Arc<HistoryStore>,
    pub ranking: RankingSettings,
}

impl AppState {
    /// Build the state from validated settings with the keyword classifier
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigurationError> {
        let pipeline = settings.build_pipeline()?;
        let history = HistoryStore::new(
            settings.history.capacity,
            settings.history.ttl_secs,
            settings.history.favorite_locations,
        )
        .with_user_limit(settings.history.max_users, settings.history.idle_secs);

        Ok(Self {
            pipeline: Arc::new(pipeline),
            classifier: Arc::new(KeywordClassifier::new()),
            history: Arc::new(history),
            ranking: settings.ranking.clone(),
        })
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(listings::configure)
            .configure(interactions::configure),
    );
}
