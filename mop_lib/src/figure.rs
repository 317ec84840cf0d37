//! Figure description in the shape Plotly expects, so the UI layer can pass the
//! serialized JSON straight to `Plotly.newPlot`.

use serde::{Deserialize, Serialize};

use crate::region::{GeoCenter, GeoScope, Margin, Projection};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapFigure {
    pub data: Vec<Layer>,
    pub layout: Layout,
}

impl MapFigure {
    pub fn to_json(&self) -> serde_json::Value {
        // Only plain strings, numbers and bools in here, serialization cannot fail
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn choropleth(&self) -> Option<&ChoroplethLayer> {
        self.data.iter().find_map(|layer| match layer {
            Layer::Choropleth(layer) => Some(layer),
            _ => None,
        })
    }

    pub fn scattergeo(&self) -> Option<&ScatterGeoLayer> {
        self.data.iter().find_map(|layer| match layer {
            Layer::Scattergeo(layer) => Some(layer),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Layer {
    Choropleth(ChoroplethLayer),
    Scattergeo(ScatterGeoLayer),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoroplethLayer {
    pub locations: Vec<String>,
    pub z: Vec<u8>,
    pub colorscale: Vec<(f64, String)>,
    pub showscale: bool,
    pub marker: ChoroplethMarker,
    pub hovertemplate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoroplethMarker {
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterGeoLayer {
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub text: Vec<String>,
    pub mode: String,
    pub marker: PointMarker,
    pub hovertemplate: String,
    pub showlegend: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointMarker {
    pub size: f64,
    pub color: String,
    pub symbol: String,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub color: String,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub geo: GeoLayout,
    pub paper_bgcolor: String,
    pub plot_bgcolor: String,
    pub margin: Margin,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLayout {
    pub bgcolor: String,
    pub showland: bool,
    pub landcolor: String,
    pub showocean: bool,
    pub oceancolor: String,
    pub showcountries: bool,
    pub countrycolor: String,
    pub showlakes: bool,
    pub lakecolor: String,
    pub showframe: bool,
    pub framecolor: String,
    pub coastlinecolor: String,
    pub projection: ProjectionLayout,
    pub scope: GeoScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<GeoCenter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lataxis: Option<AxisRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lonaxis: Option<AxisRange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionLayout {
    #[serde(rename = "type")]
    pub kind: Projection,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub range: [f64; 2],
}
