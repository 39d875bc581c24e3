//! Continent-level views of the snapshot table: pie share and sunburst.

use std::collections::HashMap;
use tracing::debug;

use crate::chart::{
    palette::ColorRamp, ColorAxis, Figure, Layout, Legend, PieTrace, SunburstMarker,
    SunburstTrace, Title, Trace,
};
use crate::tables::{SnapshotMetric, SnapshotTable};

pub const PIE_TITLE: &str = "COVID-19 Cases % by Continent";
pub const SUNBURST_TITLE: &str = "COVID-19 Cases Distribution by Continent and Country";

/// Total cases summed per continent, continents in order of first appearance.
/// Rows without a continent are skipped; empty case counts add nothing.
pub fn cases_by_continent(snapshot: &SnapshotTable) -> Vec<(String, f64)> {
    let mut order: Vec<(String, f64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for row in 0..snapshot.num_rows() {
        let Some(continent) = snapshot.continent(row) else {
            continue;
        };
        let cases = snapshot.metric(row, SnapshotMetric::TotalCases).unwrap_or(0.0);
        match index.get(continent) {
            Some(&i) => order[i].1 += cases,
            None => {
                index.insert(continent, order.len());
                order.push((continent.to_string(), cases));
            }
        }
    }
    order
}

pub fn pie_chart(snapshot: &SnapshotTable) -> Figure {
    let (labels, values) = cases_by_continent(snapshot).into_iter().unzip();
    Figure {
        data: vec![Trace::Pie(PieTrace { labels, values })],
        layout: Layout::titled(PIE_TITLE),
        frames: Vec::new(),
    }
}

/// Continent → Country hierarchy sized and coloured by total cases.
///
/// A continent's colour is the case-weighted mean of its countries' colours.
pub fn sunburst_chart(snapshot: &SnapshotTable, ramp: ColorRamp) -> Figure {
    let mut trace = SunburstTrace {
        ids: Vec::new(),
        labels: Vec::new(),
        parents: Vec::new(),
        values: Vec::new(),
        branchvalues: "total",
        marker: SunburstMarker {
            colors: Vec::new(),
            coloraxis: "coloraxis",
        },
    };

    // (continent, country, Σ cases, Σ cases²); duplicate rows fold into one leaf
    let mut leaves: Vec<(&str, &str, f64, f64)> = Vec::new();
    let mut leaf_idx: HashMap<(&str, &str), usize> = HashMap::new();
    let mut skipped = 0usize;
    for row in 0..snapshot.num_rows() {
        let (Some(continent), Some(country)) = (snapshot.continent(row), snapshot.country(row))
        else {
            skipped += 1;
            continue;
        };
        let cases = snapshot.metric(row, SnapshotMetric::TotalCases).unwrap_or(0.0);
        match leaf_idx.get(&(continent, country)) {
            Some(&i) => {
                leaves[i].2 += cases;
                leaves[i].3 += cases * cases;
            }
            None => {
                leaf_idx.insert((continent, country), leaves.len());
                leaves.push((continent, country, cases, cases * cases));
            }
        }
    }
    if skipped > 0 {
        debug!(skipped, "snapshot rows without continent left out of sunburst");
    }

    // (continent, Σ cases, Σ cases²) for the parent nodes
    let mut parents: Vec<(String, f64, f64)> = Vec::new();
    for (continent, country, total, squares) in leaves {
        trace.ids.push(format!("{}/{}", continent, country));
        trace.labels.push(country.to_string());
        trace.parents.push(continent.to_string());
        trace.values.push(total);
        trace.marker.colors.push(weighted_mean(total, squares));

        match parents.iter_mut().find(|(c, _, _)| c == continent) {
            Some(p) => {
                p.1 += total;
                p.2 += squares;
            }
            None => parents.push((continent.to_string(), total, squares)),
        }
    }

    for (continent, total, squares) in parents {
        let color = weighted_mean(total, squares);
        trace.ids.push(continent.clone());
        trace.labels.push(continent);
        trace.parents.push(String::new());
        trace.values.push(total);
        trace.marker.colors.push(color);
    }

    Figure {
        data: vec![Trace::Sunburst(trace)],
        layout: Layout {
            coloraxis: Some(ColorAxis {
                colorscale: ramp.stops(),
                colorbar: Legend {
                    title: Title::new("TotalCases"),
                },
            }),
            ..Layout::titled(SUNBURST_TITLE)
        },
        frames: Vec::new(),
    }
}

/// Mean of the case counts weighted by themselves: Σv² / Σv.
fn weighted_mean(total: f64, squares: f64) -> f64 {
    if total > 0.0 {
        squares / total
    } else {
        0.0
    }
}
