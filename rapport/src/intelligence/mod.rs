pub mod addresses;
pub mod health;
pub mod ledger;
pub mod sentiment;
pub mod suggestion;

pub use addresses::{extract_contact_addresses, ContactAddress};
pub use health::{calculate_health, calculate_health_score, HealthBreakdown, HealthInput};
pub use ledger::InteractionSummary;
pub use sentiment::SentimentEstimator;
pub use suggestion::generate_suggestion;
