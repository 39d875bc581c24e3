// src/page/mod.rs
//! The page document: one selector, five chart regions, and the callback
//! contract wiring the selector to the two country regions.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, warn};

use crate::chart::Figure;
use crate::context::AppContext;
use crate::views::{build_static_views, compute_country_views, CountryViews, StaticViews};

pub const DROPDOWN_ID: &str = "country-dropdown";
pub const MAP_REGION: &str = "map-graph";
pub const PIE_REGION: &str = "pie-graph";
pub const SUNBURST_REGION: &str = "sunburst-graph";
pub const METRICS_REGION: &str = "country-graph";
pub const TREND_REGION: &str = "country-line-graph";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropdownOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dropdown {
    pub id: &'static str,
    pub label: &'static str,
    pub placeholder: &'static str,
    pub options: Vec<DropdownOption>,
    pub value: String,
}

impl Dropdown {
    /// Every snapshot country, sorted. Falls back to the first option when
    /// `default` is not one of them.
    pub fn countries(countries: Vec<String>, default: &str) -> Self {
        let value = if countries.is_empty() || countries.iter().any(|c| c == default) {
            default.to_string()
        } else {
            warn!(default, fallback = %countries[0], "default country not in snapshot");
            countries[0].clone()
        };
        Self {
            id: DROPDOWN_ID,
            label: "Choose a Country to view its data",
            placeholder: "Select a Country",
            options: countries
                .into_iter()
                .map(|c| DropdownOption {
                    label: c.clone(),
                    value: c,
                })
                .collect(),
            value,
        }
    }
}

/// A `component.property` endpoint of the callback contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Binding {
    pub component: &'static str,
    pub property: &'static str,
}

type Handler = fn(&AppContext, &str) -> Result<CountryViews>;

/// Selector value in, two figures out, routed by position.
#[derive(Debug, Clone, Serialize)]
pub struct Callback {
    pub input: Binding,
    pub outputs: [Binding; 2],
    #[serde(skip)]
    handler: Handler,
}

impl Default for Callback {
    fn default() -> Self {
        Self {
            input: Binding {
                component: DROPDOWN_ID,
                property: "value",
            },
            outputs: [
                Binding {
                    component: METRICS_REGION,
                    property: "figure",
                },
                Binding {
                    component: TREND_REGION,
                    property: "figure",
                },
            ],
            handler: compute_country_views,
        }
    }
}

/// A figure addressed to one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionUpdate {
    pub region: &'static str,
    pub figure: Figure,
}

impl Callback {
    pub fn invoke(&self, ctx: &AppContext, value: &str) -> Result<[RegionUpdate; 2]> {
        debug!(input = self.input.component, value, "callback fired");
        let (metrics, trend) = (self.handler)(ctx, value)
            .with_context(|| format!("computing views for {:?}", value))?
            .into_pair();
        Ok([
            RegionUpdate {
                region: self.outputs[0].component,
                figure: metrics,
            },
            RegionUpdate {
                region: self.outputs[1].component,
                figure: trend,
            },
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    pub id: &'static str,
    /// Empty until the region's figure is known.
    pub figure: Option<Figure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub description: &'static str,
    pub control: Dropdown,
    pub regions: Vec<Region>,
    pub callback: Callback,
}

impl Page {
    /// Page with the static regions filled and the country regions empty.
    pub fn new(ctx: &AppContext, views: StaticViews) -> Self {
        let control = Dropdown::countries(
            ctx.snapshot.distinct_countries(),
            &ctx.config.default_country,
        );
        let region = |id, figure| Region { id, figure };
        Self {
            title: "Covid-19 Dashboard",
            subtitle: "COVID-19 Spread Time-Series Map",
            description: "An animated visualization of COVID-19 cases spreading over time.",
            control,
            regions: vec![
                region(MAP_REGION, Some(views.map)),
                region(PIE_REGION, Some(views.pie)),
                region(SUNBURST_REGION, Some(views.sunburst)),
                region(METRICS_REGION, None),
                region(TREND_REGION, None),
            ],
            callback: Callback::default(),
        }
    }

    /// Fully rendered initial page: static figures plus the country views
    /// for the dropdown's starting value.
    pub fn initial(ctx: &AppContext) -> Result<Self> {
        let views = build_static_views(ctx)?;
        let mut page = Self::new(ctx, views);
        let value = page.control.value.clone();
        let updates = page.dispatch(ctx, &value)?;
        page.apply(updates);
        Ok(page)
    }

    /// Run the callback for a new selector value without touching the page.
    pub fn dispatch(&self, ctx: &AppContext, value: &str) -> Result<[RegionUpdate; 2]> {
        self.callback.invoke(ctx, value)
    }

    /// Install callback outputs into their regions and move the selector.
    pub fn select(&mut self, ctx: &AppContext, value: &str) -> Result<()> {
        let updates = self.dispatch(ctx, value)?;
        self.control.value = value.to_string();
        self.apply(updates);
        Ok(())
    }

    pub fn apply(&mut self, updates: [RegionUpdate; 2]) {
        for update in updates {
            match self.regions.iter_mut().find(|r| r.id == update.region) {
                Some(r) => r.figure = Some(update.figure),
                None => warn!(region = update.region, "update for unknown region dropped"),
            }
        }
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }
}
