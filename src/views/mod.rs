pub mod continent;
pub mod country;
pub mod geo;

pub use country::{compute_country_views, CountryViews};

use anyhow::{Context, Result};

use crate::chart::Figure;
use crate::context::AppContext;

/// Figures built once from the full dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticViews {
    pub map: Figure,
    pub pie: Figure,
    pub sunburst: Figure,
}

pub fn build_static_views(ctx: &AppContext) -> Result<StaticViews> {
    let config = &ctx.config;
    let map = geo::map_chart(
        &ctx.aggregated,
        &config.columns.time_series.confirmed,
        config.map_size_max,
    )
    .context("building map")?;
    Ok(StaticViews {
        map,
        pie: continent::pie_chart(&ctx.snapshot),
        sunburst: continent::sunburst_chart(&ctx.snapshot, config.color_ramp),
    })
}
