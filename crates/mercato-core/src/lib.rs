pub mod app_config;
pub mod config;
pub mod criteria;
pub mod geo;
pub mod page;
pub mod product;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use criteria::{
    FieldError, ProductFilter, RawSearchParams, RawTopParams, SearchCriteria, SortKey, TopMetric,
    TopQuery, ValidationErrors,
};
pub use geo::{haversine_km, GeoFilter};
pub use page::Page;
pub use product::{Category, Condition, Product, ProductImage, ProductStatus};
