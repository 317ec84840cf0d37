use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    World,
    Americas,
    Europe,
    Asia,
    Africa,
    Oceania,
}

impl Region {
    pub const ALL: [Region; 6] = [
        Region::World,
        Region::Americas,
        Region::Europe,
        Region::Asia,
        Region::Africa,
        Region::Oceania,
    ];
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The zoom buttons were originally labelled in Spanish, keep accepting those
        match s.trim().to_lowercase().as_str() {
            "world" | "mundo" => Ok(Region::World),
            "americas" | "america" | "américa" => Ok(Region::Americas),
            "europe" | "europa" => Ok(Region::Europe),
            "asia" => Ok(Region::Asia),
            "africa" | "áfrica" => Ok(Region::Africa),
            "oceania" | "oceanía" => Ok(Region::Oceania),
            _ => Err(format!("Unknown region: {}", s)),
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Region::World => "World",
            Region::Americas => "Americas",
            Region::Europe => "Europe",
            Region::Asia => "Asia",
            Region::Africa => "Africa",
            Region::Oceania => "Oceania",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Projection {
    #[serde(rename = "equirectangular")]
    Equirectangular,
    #[serde(rename = "natural earth")]
    NaturalEarth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeoScope {
    #[serde(rename = "world")]
    World,
    #[serde(rename = "europe")]
    Europe,
    #[serde(rename = "asia")]
    Asia,
    #[serde(rename = "africa")]
    Africa,
    #[serde(rename = "north america")]
    NorthAmerica,
    #[serde(rename = "south america")]
    SouthAmerica,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCenter {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionViewport {
    pub projection: Projection,
    pub scope: GeoScope,
    pub center: Option<GeoCenter>,
    pub lat_range: Option<[f64; 2]>,
    pub lon_range: Option<[f64; 2]>,
}

impl RegionViewport {
    fn scoped(projection: Projection, scope: GeoScope) -> Self {
        Self {
            projection,
            scope,
            center: None,
            lat_range: None,
            lon_range: None,
        }
    }

    fn framed(center: GeoCenter, lat_range: [f64; 2], lon_range: [f64; 2]) -> Self {
        Self {
            projection: Projection::NaturalEarth,
            scope: GeoScope::World,
            center: Some(center),
            lat_range: Some(lat_range),
            lon_range: Some(lon_range),
        }
    }

    pub fn world() -> Self {
        Self::scoped(Projection::NaturalEarth, GeoScope::World)
    }

    pub fn preset(region: Region) -> Self {
        match region {
            Region::World => Self::world(),
            // No single scope covers both americas, so frame them like Oceania
            Region::Americas => Self::framed(GeoCenter { lat: 10., lon: -80. }, [-60., 75.], [-170., -30.]),
            Region::Europe => Self::scoped(Projection::Equirectangular, GeoScope::Europe),
            Region::Asia => Self::scoped(Projection::Equirectangular, GeoScope::Asia),
            Region::Africa => Self::scoped(Projection::Equirectangular, GeoScope::Africa),
            Region::Oceania => Self::framed(GeoCenter { lat: -25., lon: 140. }, [-50., 5.], [110., 180.]),
        }
    }
}

/// Static dark theme of the map. Colors are CSS hex strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapTheme {
    pub background: String,
    pub land: String,
    pub ocean: String,
    pub country_border: String,
    pub lake: String,
    pub frame: String,
    pub coastline: String,
    pub show_lakes: bool,
    pub show_frame: bool,

    pub highlight: String,
    pub highlight_border: String,
    pub highlight_border_width: f64,

    pub marker: String,
    pub marker_size: f64,
    pub marker_outline: String,
    pub marker_outline_width: f64,
}

impl Default for MapTheme {
    fn default() -> Self {
        Self {
            background: "#0B0F19".into(),
            land: "#454B52".into(),
            ocean: "#0B0F19".into(),
            country_border: "#6D6D72".into(),
            lake: "#0B0F19".into(),
            frame: "#454B52".into(),
            coastline: "#454B52".into(),
            show_lakes: false,
            show_frame: false,
            highlight: "#1F6FEB".into(),
            highlight_border: "#0d1b2a".into(),
            highlight_border_width: 0.5,
            marker: "#5ed0ea".into(),
            marker_size: 5.,
            marker_outline: "#ffffff".into(),
            marker_outline_width: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub l: u32,
    pub r: u32,
    pub t: u32,
    pub b: u32,
}

/// Built once at startup and handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub theme: MapTheme,
    pub margin: Margin,
    pub height: u32,
    regions: BTreeMap<Region, RegionViewport>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            theme: MapTheme::default(),
            margin: Margin { l: 0, r: 0, t: 0, b: 0 },
            height: 490,
            regions: Region::ALL.iter()
                .map(|region| (*region, RegionViewport::preset(*region)))
                .collect(),
        }
    }
}

impl MapConfig {
    pub fn with_viewport(mut self, region: Region, viewport: RegionViewport) -> Self {
        self.regions.insert(region, viewport);
        self
    }

    pub fn with_theme(mut self, theme: MapTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn viewport(&self, region: Region) -> Option<&RegionViewport> {
        self.regions.get(&region)
    }
}

#[test]
fn region_names_round_trip_through_display() {
    for region in Region::ALL {
        assert_eq!(region.to_string().parse::<Region>(), Ok(region));
    }
    assert_eq!("Oceanía".parse::<Region>(), Ok(Region::Oceania));
    assert_eq!("mundo".parse::<Region>(), Ok(Region::World));
    assert!("Antarctica".parse::<Region>().is_err());
}

#[test]
fn oceania_preset_is_framed() {
    let viewport = MapConfig::default().viewport(Region::Oceania).cloned().unwrap();
    assert_eq!(viewport.projection, Projection::NaturalEarth);
    assert_eq!(viewport.scope, GeoScope::World);
    assert_eq!(viewport.center, Some(GeoCenter { lat: -25., lon: 140. }));
    assert_eq!(viewport.lat_range, Some([-50., 5.]));
    assert_eq!(viewport.lon_range, Some([110., 180.]));
}

#[test]
fn scoped_presets_have_no_center() {
    let config = MapConfig::default();
    for region in [Region::Europe, Region::Asia, Region::Africa] {
        let viewport = config.viewport(region).unwrap();
        assert_eq!(viewport.projection, Projection::Equirectangular);
        assert!(viewport.center.is_none());
        assert!(viewport.lat_range.is_none());
    }
    assert_eq!(config.viewport(Region::World), Some(&RegionViewport::world()));
}
