// Service exports
pub mod cache;
pub mod catalog;
pub mod geocoder;
pub mod postgres;
pub mod store_directory;

pub use cache::{CacheManager, CacheKey, CacheError};
pub use catalog::{CatalogError, FileCatalog, IngredientDatabase};
pub use geocoder::{geocode_with_retry, CachedGeocoder, GeocodeError, Geocoder, HttpGeocoder};
pub use postgres::PostgresCatalog;
pub use store_directory::{DirectoryError, DirectorySnapshot, FileStoreSource, HttpStoreSource, StoreDirectory, StoreSource};
