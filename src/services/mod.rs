// Service exports
pub mod candidates;
pub mod classifier;
pub mod history;

pub use candidates::InMemoryCandidateSource;
pub use classifier::KeywordClassifier;
pub use history::{HistoryStore, Interaction, PreferenceSnapshot};
