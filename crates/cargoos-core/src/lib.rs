pub mod app_config;
pub mod config;
pub mod error;
pub mod export;
pub mod query;
pub mod record;
pub mod rfq;
pub mod rules;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, ExportError, QueryError, RfqError};
pub use export::{export_records, ExportFormat};
pub use query::{SearchMode, SearchQuery};
pub use record::{RawCandidate, SupplierRecord};
pub use rfq::{generate_rfq, render_rfq, RfqDocument, RfqLang, RfqRequest};
pub use rules::{load_scoring_rules, ScoringRules, TrustWeights, WeightedPhrase};
