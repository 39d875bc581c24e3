pub mod figure;
pub mod palette;

pub use figure::{
    Axis, BarMarker, BarTrace, ColorAxis, Figure, Frame, GeoMarker, GeoTrace, Layout, Legend,
    LineStyle, PieTrace, ScatterTrace, SunburstMarker, SunburstTrace, Title, Trace,
};
pub use palette::ColorRamp;
