pub mod aggregate;
pub mod chart;
pub mod config;
pub mod context;
pub mod load;
pub mod page;
pub mod tables;
pub mod views;

pub use config::DashboardConfig;
pub use context::AppContext;
pub use views::{compute_country_views, CountryViews};
