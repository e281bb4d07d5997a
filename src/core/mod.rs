// Core algorithm exports
pub mod aggregator;
pub mod catalog;
pub mod distance;
pub mod filters;
pub mod format;
pub mod locator;
pub mod matcher;
pub mod normalizer;
pub mod recommender;
pub mod scoring;

pub use aggregator::{aggregate, AggregationLimits};
pub use catalog::Catalog;
pub use distance::{haversine_distance, calculate_bounding_box, is_within_bounding_box};
pub use locator::{LocatedStores, LocatorSettings, StoreLocator};
pub use matcher::{Matcher, RankedMatches};
pub use normalizer::{NormalizationMode, Normalized, Normalizer, SynonymTable};
pub use recommender::Recommender;
pub use scoring::completeness_score;
