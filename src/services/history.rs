use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::core::pipeline::HistoricalBonus;
use crate::models::Candidate;

/// Bonus for a listing in one of the user's favourite locations
pub const LOCATION_BONUS: f64 = 0.1;
/// Bonus for a listing priced inside the user's usual range
pub const PRICE_RANGE_BONUS: f64 = 0.1;

/// A user's click on a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: String,
    pub user_id: String,
    pub listing_id: String,
    pub location: String,
    pub price: Option<f64>,
    pub score: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

impl Interaction {
    pub fn new(
        user_id: impl Into<String>,
        listing_id: impl Into<String>,
        location: impl Into<String>,
        price: Option<f64>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            listing_id: listing_id.into(),
            location: location.into(),
            price,
            score: None,
            recorded_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteLocation {
    pub location: String,
    pub clicks: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

impl PriceRange {
    pub fn contains(&self, price: f64) -> bool {
        self.min <= price && price <= self.max
    }
}

/// Read-only view of what a user tends to click, rebuilt by the learning task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceSnapshot {
    pub version: u64,
    pub favorite_locations: Vec<FavoriteLocation>,
    pub usual_price_range: Option<PriceRange>,
    pub interactions: usize,
    pub generated_at: DateTime<Utc>,
}

impl PreferenceSnapshot {
    /// Summarize one user's interactions; `None` when there are none
    pub fn from_interactions<'a>(
        interactions: impl IntoIterator<Item = &'a Interaction>,
        version: u64,
        favorite_count: usize,
    ) -> Option<Self> {
        let mut clicks: HashMap<&str, usize> = HashMap::new();
        let mut prices = Vec::new();
        let mut total = 0;

        for interaction in interactions {
            total += 1;
            let location = interaction.location.trim();
            if !location.is_empty() {
                *clicks.entry(location).or_default() += 1;
            }
            if let Some(price) = interaction.price.filter(|p| p.is_finite()) {
                prices.push(price);
            }
        }

        if total == 0 {
            return None;
        }

        let mut favorite_locations: Vec<FavoriteLocation> = clicks
            .into_iter()
            .map(|(location, clicks)| FavoriteLocation {
                location: location.to_string(),
                clicks,
            })
            .collect();
        favorite_locations.sort_by(|a, b| b.clicks.cmp(&a.clicks).then_with(|| a.location.cmp(&b.location)));
        favorite_locations.truncate(favorite_count);

        let usual_price_range = (!prices.is_empty()).then(|| PriceRange {
            min: prices.iter().copied().fold(f64::INFINITY, f64::min),
            max: prices.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            average: prices.iter().sum::<f64>() / prices.len() as f64,
        });

        Some(Self {
            version,
            favorite_locations,
            usual_price_range,
            interactions: total,
            generated_at: Utc::now(),
        })
    }

    pub fn is_favorite(&self, location: &str) -> bool {
        let location = location.trim().to_lowercase();
        // "Godoy Cruz, Mendoza" also matches a favourite "Godoy Cruz"
        let neighbourhood = location.split(',').next().unwrap_or(location.as_str()).trim();
        self.favorite_locations.iter().any(|f| {
            let favorite = f.location.to_lowercase();
            favorite == location || favorite == neighbourhood
        })
    }
}

impl HistoricalBonus for PreferenceSnapshot {
    fn bonus(&self, candidate: &Candidate) -> f64 {
        let mut bonus = 0.0;
        if self.is_favorite(&candidate.location) {
            bonus += LOCATION_BONUS;
        }
        if let (Some(range), Some(price)) = (self.usual_price_range, candidate.price) {
            if range.contains(price) {
                bonus += PRICE_RANGE_BONUS;
            }
        }
        bonus
    }
}

/// Users kept in the interaction log unless configured otherwise
pub const DEFAULT_MAX_USERS: u64 = 10_000;
/// Seconds without a new interaction before a user's log is dropped
pub const DEFAULT_USER_IDLE_SECS: u64 = 7 * 24 * 60 * 60;

type UserLog = Arc<Mutex<VecDeque<Interaction>>>;

/// Interaction log plus the snapshots learned from it
///
/// Writers append to the log; the learning task periodically rebuilds
/// snapshots and publishes them into a TTL cache. Ranking only ever reads
/// published snapshots. The log keeps at most `max_users` users, least
/// recently active evicted first, and forgets users idle past `idle_secs`.
pub struct HistoryStore {
    log: moka::future::Cache<String, UserLog>,
    snapshots: moka::future::Cache<String, Arc<PreferenceSnapshot>>,
    version: AtomicU64,
    capacity: usize,
    favorite_count: usize,
    snapshot_ttl: Duration,
}

impl HistoryStore {
    /// Create a store keeping at most `capacity` interactions per user
    pub fn new(capacity: usize, ttl_secs: u64, favorite_count: usize) -> Self {
        let snapshot_ttl = Duration::from_secs(ttl_secs);

        Self {
            log: user_log(DEFAULT_MAX_USERS, DEFAULT_USER_IDLE_SECS),
            snapshots: snapshot_cache(DEFAULT_MAX_USERS, snapshot_ttl),
            version: AtomicU64::new(0),
            capacity: capacity.max(1),
            favorite_count,
            snapshot_ttl,
        }
    }

    /// Bound the number of users kept and how long an idle user is remembered
    pub fn with_user_limit(mut self, max_users: u64, idle_secs: u64) -> Self {
        self.log = user_log(max_users, idle_secs);
        self.snapshots = snapshot_cache(max_users, self.snapshot_ttl);
        self
    }

    /// Append an interaction, dropping the user's oldest when over capacity
    pub async fn record(&self, interaction: Interaction) {
        let entries = self
            .log
            .get_with(interaction.user_id.clone(), async {
                Arc::new(Mutex::new(VecDeque::new()))
            })
            .await;

        let mut entries = entries.lock().await;
        entries.push_back(interaction);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// Latest published snapshot for a user
    pub async fn snapshot(&self, user_id: &str) -> Option<Arc<PreferenceSnapshot>> {
        let snapshot = self.snapshots.get(user_id).await;
        if snapshot.is_none() {
            tracing::trace!("No preference snapshot for {}", user_id);
        }
        snapshot
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub async fn interaction_count(&self, user_id: &str) -> usize {
        match self.log.get(user_id).await {
            Some(entries) => {
                let entries = entries.lock().await;
                entries.len()
            }
            None => 0,
        }
    }

    /// Number of users currently held in the log
    pub async fn user_count(&self) -> u64 {
        self.log.run_pending_tasks().await;
        self.log.entry_count()
    }

    /// Rebuild every user's snapshot under a new version and publish it
    ///
    /// Returns the number of snapshots published.
    pub async fn refresh(&self) -> usize {
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;

        let users: Vec<(Arc<String>, UserLog)> = self.log.iter().collect();
        let mut published = 0;
        for (user, entries) in users {
            let entries = entries.lock().await;
            let rebuilt =
                PreferenceSnapshot::from_interactions(entries.iter(), version, self.favorite_count);
            drop(entries);
            if let Some(snapshot) = rebuilt {
                self.snapshots.insert(user.as_ref().clone(), Arc::new(snapshot)).await;
                published += 1;
            }
        }

        tracing::debug!("Published {} preference snapshots at version {}", published, version);
        published
    }

    /// Spawn the periodic learning task
    pub fn spawn_learning_task(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.refresh().await;
            }
        })
    }
}

fn user_log(max_users: u64, idle_secs: u64) -> moka::future::Cache<String, UserLog> {
    moka::future::CacheBuilder::new(max_users.max(1))
        .eviction_policy(moka::policy::EvictionPolicy::lru())
        .time_to_idle(Duration::from_secs(idle_secs))
        .build()
}

fn snapshot_cache(
    max_users: u64,
    ttl: Duration,
) -> moka::future::Cache<String, Arc<PreferenceSnapshot>> {
    moka::future::CacheBuilder::new(max_users.max(1))
        .time_to_live(ttl)
        .build()
}
