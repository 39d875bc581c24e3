//! Animated world map of confirmed cases, one frame per date.

use anyhow::Result;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;

use crate::aggregate::AggregatedTimeSeries;
use crate::chart::{
    palette::qualitative, Figure, Frame, GeoMarker, GeoTrace, Layout, Legend, Title, Trace,
};
use crate::load::date_parser::format_date32;

pub const MAP_TITLE: &str = "COVID-19 Spread Over Time";

/// Scatter-geo figure over `agg`, marker area proportional to `size_column`.
///
/// Frames follow the (date-sorted) aggregated rows. Every frame carries one
/// trace per region, in order of first appearance, so trace positions line up
/// across frames.
#[tracing::instrument(level = "info", skip(agg))]
pub fn map_chart(agg: &AggregatedTimeSeries, size_column: &str, size_max: f64) -> Result<Figure> {
    let sizes = agg.values(size_column)?;

    let mut regions: Vec<&str> = Vec::new();
    let mut region_idx: HashMap<&str, usize> = HashMap::new();
    let mut max_size = 0.0f64;
    for row in 0..agg.num_rows() {
        let region = agg.region(row);
        if !region_idx.contains_key(region) {
            region_idx.insert(region, regions.len());
            regions.push(region);
        }
        max_size = max_size.max(sizes.value(row));
    }

    // area sizing: the largest value maps to a `size_max`-pixel marker
    let sizeref = if max_size > 0.0 {
        2.0 * max_size / (size_max * size_max)
    } else {
        1.0
    };
    let empty_trace = |i: usize, region: &str| GeoTrace {
        name: region.to_string(),
        mode: "markers",
        lat: Vec::new(),
        lon: Vec::new(),
        hovertext: Vec::new(),
        marker: GeoMarker {
            color: qualitative(i).to_string(),
            size: Vec::new(),
            sizemode: "area",
            sizeref,
            sizemin: 0.0,
        },
        legendgroup: region.to_string(),
        showlegend: true,
    };

    let mut frames: Vec<Frame> = Vec::new();
    let mut current: Option<(i32, Vec<GeoTrace>)> = None;
    for row in 0..agg.num_rows() {
        let date = agg.date(row);
        if current.as_ref().map(|(d, _)| *d) != Some(date) {
            if let Some((d, traces)) = current.take() {
                frames.push(into_frame(d, traces));
            }
            let traces = regions
                .iter()
                .enumerate()
                .map(|(i, r)| empty_trace(i, *r))
                .collect();
            current = Some((date, traces));
        }
        if let Some((_, traces)) = current.as_mut() {
            let t = &mut traces[region_idx[agg.region(row)]];
            t.lat.push(agg.lat(row));
            t.lon.push(agg.long(row));
            t.hovertext.push(agg.country(row).to_string());
            t.marker.size.push(sizes.value(row).max(0.0));
        }
    }
    if let Some((d, traces)) = current.take() {
        frames.push(into_frame(d, traces));
    }
    debug!(frames = frames.len(), regions = regions.len(), sizeref, "built map frames");

    let data = match frames.first() {
        Some(f) => f.data.clone(),
        None => regions
            .iter()
            .enumerate()
            .map(|(i, r)| Trace::Scattergeo(empty_trace(i, *r)))
            .collect(),
    };
    let names: Vec<&str> = frames.iter().map(|f| f.name.as_str()).collect();

    let layout = Layout {
        legend: Some(Legend {
            title: Title::new("WHO Region"),
        }),
        geo: Some(json!({
            "projection": {"type": "natural earth"},
            "showcountries": true,
        })),
        sliders: vec![date_slider(&names)],
        updatemenus: vec![play_buttons()],
        ..Layout::titled(MAP_TITLE)
    };

    Ok(Figure {
        data,
        layout,
        frames,
    })
}

fn into_frame(date: i32, traces: Vec<GeoTrace>) -> Frame {
    Frame {
        name: format_date32(date),
        data: traces.into_iter().map(Trace::Scattergeo).collect(),
    }
}

fn animate_args(frame: Value, duration: u32) -> Value {
    json!([frame, {
        "mode": "immediate",
        "fromcurrent": true,
        "frame": {"duration": duration, "redraw": true},
        "transition": {"duration": 0},
    }])
}

fn date_slider(names: &[&str]) -> Value {
    let steps: Vec<Value> = names
        .iter()
        .map(|name| {
            json!({
                "label": name,
                "method": "animate",
                "args": animate_args(json!([name]), 0),
            })
        })
        .collect();
    json!({
        "active": 0,
        "currentvalue": {"prefix": "Date="},
        "steps": steps,
    })
}

fn play_buttons() -> Value {
    json!({
        "type": "buttons",
        "showactive": false,
        "buttons": [
            {"label": "▶", "method": "animate", "args": animate_args(Value::Null, 500)},
            {"label": "◼", "method": "animate", "args": animate_args(json!([null]), 0)},
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::tables::time_series::tests::time_series;

    fn geo(t: &Trace) -> &GeoTrace {
        match t {
            Trace::Scattergeo(g) => g,
            other => panic!("expected scattergeo, got {:?}", other),
        }
    }

    #[test]
    fn one_frame_per_date_in_order() -> Result<()> {
        let agg = aggregate(&time_series(&[
            ("2020-01-23", "Egypt", 26.0, 30.0, "EMR", 2.0, 0.0, 0.0),
            ("2020-01-22", "Egypt", 26.0, 30.0, "EMR", 1.0, 0.0, 0.0),
            ("2020-01-22", "Peru", -9.0, -75.0, "AMR", 100.0, 0.0, 0.0),
            ("2020-02-01", "Peru", -9.0, -75.0, "AMR", 400.0, 0.0, 0.0),
        ]))?;
        let fig = map_chart(&agg, "Confirmed", 50.0)?;

        let names: Vec<&str> = fig.frames.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["2020-01-22", "2020-01-23", "2020-02-01"]);
        for frame in &fig.frames {
            // every region present in every frame
            let regions: Vec<&str> = frame.data.iter().filter_map(Trace::name).collect();
            assert_eq!(regions, vec!["EMR", "AMR"]);
        }
        let last = &fig.frames[2];
        assert!(geo(&last.data[0]).lat.is_empty());
        assert_eq!(geo(&last.data[1]).hovertext, vec!["Peru"]);
        assert_eq!(fig.data, fig.frames[0].data);
        assert_eq!(fig.title(), Some(MAP_TITLE));
        Ok(())
    }

    #[test]
    fn marker_sizes_capped_by_size_max() -> Result<()> {
        let agg = aggregate(&time_series(&[
            ("2020-01-22", "A", 0.0, 0.0, "R", 50.0, 0.0, 0.0),
            ("2020-01-22", "B", 1.0, 1.0, "R", 200.0, 0.0, 0.0),
        ]))?;
        let fig = map_chart(&agg, "Confirmed", 50.0)?;
        let marker = &geo(&fig.data[0]).marker;
        assert_eq!(marker.sizemode, "area");
        // diameter in px for the largest value: sqrt(2 * value / sizeref) == size_max
        let largest = marker.size.iter().cloned().fold(0.0, f64::max);
        let diameter = (largest / marker.sizeref).sqrt() * std::f64::consts::SQRT_2;
        assert!((diameter - 50.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn slider_steps_match_frames() -> Result<()> {
        let agg = aggregate(&time_series(&[
            ("2020-01-22", "A", 0.0, 0.0, "R", 1.0, 0.0, 0.0),
            ("2020-01-23", "A", 0.0, 0.0, "R", 2.0, 0.0, 0.0),
        ]))?;
        let fig = map_chart(&agg, "Confirmed", 50.0)?;
        let steps = fig.layout.sliders[0]["steps"].as_array().unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1]["label"], "2020-01-23");
        assert_eq!(fig.layout.geo.as_ref().unwrap()["projection"]["type"], "natural earth");
        Ok(())
    }

    #[test]
    fn unknown_size_column_is_an_error() -> Result<()> {
        let agg = aggregate(&time_series(&[(
            "2020-01-22", "A", 0.0, 0.0, "R", 1.0, 0.0, 0.0,
        )]))?;
        assert!(map_chart(&agg, "Hospitalised", 50.0).is_err());
        Ok(())
    }
}
