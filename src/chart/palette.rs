use serde::{Deserialize, Serialize};

/// Plotly's default qualitative sequence, used for categorical colours.
pub const QUALITATIVE: [&str; 10] = [
    "#636efa", "#EF553B", "#00cc96", "#ab63fa", "#FFA15A", "#19d3f3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

/// Colour for the `idx`-th category, cycling through [`QUALITATIVE`].
pub fn qualitative(idx: usize) -> &'static str {
    QUALITATIVE[idx % QUALITATIVE.len()]
}

/// Single-hue sequential ramps (ColorBrewer), light to dark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorRamp {
    #[default]
    Reds,
    Blues,
    Greens,
}

const REDS: [&str; 9] = [
    "rgb(255,245,240)",
    "rgb(254,224,210)",
    "rgb(252,187,161)",
    "rgb(252,146,114)",
    "rgb(251,106,74)",
    "rgb(239,59,44)",
    "rgb(203,24,29)",
    "rgb(165,15,21)",
    "rgb(103,0,13)",
];

const BLUES: [&str; 9] = [
    "rgb(247,251,255)",
    "rgb(222,235,247)",
    "rgb(198,219,239)",
    "rgb(158,202,225)",
    "rgb(107,174,214)",
    "rgb(66,146,198)",
    "rgb(33,113,181)",
    "rgb(8,81,156)",
    "rgb(8,48,107)",
];

const GREENS: [&str; 9] = [
    "rgb(247,252,245)",
    "rgb(229,245,224)",
    "rgb(199,233,192)",
    "rgb(161,217,155)",
    "rgb(116,196,118)",
    "rgb(65,171,93)",
    "rgb(35,139,69)",
    "rgb(0,109,44)",
    "rgb(0,68,27)",
];

impl ColorRamp {
    fn colors(&self) -> &'static [&'static str; 9] {
        match self {
            ColorRamp::Reds => &REDS,
            ColorRamp::Blues => &BLUES,
            ColorRamp::Greens => &GREENS,
        }
    }

    /// Evenly spaced `(position, colour)` stops from 0.0 to 1.0.
    pub fn stops(&self) -> Vec<(f64, String)> {
        let colors = self.colors();
        let last = (colors.len() - 1) as f64;
        colors
            .iter()
            .enumerate()
            .map(|(i, c)| (i as f64 / last, c.to_string()))
            .collect()
    }
}
