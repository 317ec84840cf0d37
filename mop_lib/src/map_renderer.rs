use crate::{
    figure::{
        AxisRange, ChoroplethLayer, ChoroplethMarker, GeoLayout, Layer, Layout, Line, MapFigure, PointMarker,
        ProjectionLayout, ScatterGeoLayer,
    },
    region::{MapConfig, Region, RegionViewport},
    trip::Trip,
};

/// Turns a trip table into a map figure. Stateless apart from the config it was built with.
#[derive(Debug, Clone, Default)]
pub struct MapRenderer {
    config: MapConfig,
}

impl MapRenderer {
    pub fn new(config: MapConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn render_region(&self, trips: &[Trip], region: Region) -> MapFigure {
        match self.config.viewport(region) {
            Some(viewport) => self.render(trips, viewport),
            None => self.render(trips, &RegionViewport::world()),
        }
    }

    pub fn render(&self, trips: &[Trip], viewport: &RegionViewport) -> MapFigure {
        let mut data = Vec::new();

        if let Some(countries) = self.country_layer(trips) {
            data.push(Layer::Choropleth(countries));
        }

        if let Some(points) = self.point_layer(trips) {
            data.push(Layer::Scattergeo(points));
        }

        MapFigure {
            data,
            layout: self.layout(viewport),
        }
    }

    fn country_layer(&self, trips: &[Trip]) -> Option<ChoroplethLayer> {
        let theme = &self.config.theme;

        let mut locations: Vec<String> = Vec::new();
        for iso in trips.iter().filter_map(|trip| trip.iso_alpha3.as_ref()) {
            if !locations.contains(iso) {
                locations.push(iso.clone());
            }
        }

        if locations.is_empty() {
            return None;
        }

        Some(ChoroplethLayer {
            z: vec![1; locations.len()],
            locations,
            colorscale: vec![(0., theme.highlight.clone()), (1., theme.highlight.clone())],
            showscale: false,
            marker: ChoroplethMarker {
                line: Line {
                    color: theme.highlight_border.clone(),
                    width: theme.highlight_border_width,
                },
            },
            hovertemplate: "%{location}<extra></extra>".into(),
        })
    }

    fn point_layer(&self, trips: &[Trip]) -> Option<ScatterGeoLayer> {
        if trips.is_empty() {
            return None;
        }

        let theme = &self.config.theme;

        Some(ScatterGeoLayer {
            lat: trips.iter().map(|trip| trip.latitude).collect(),
            lon: trips.iter().map(|trip| trip.longitude).collect(),
            text: trips.iter().map(Trip::label).collect(),
            mode: "markers".into(),
            marker: PointMarker {
                size: theme.marker_size,
                color: theme.marker.clone(),
                symbol: "circle".into(),
                line: Line {
                    color: theme.marker_outline.clone(),
                    width: theme.marker_outline_width,
                },
            },
            hovertemplate: "<b>%{text}</b><extra></extra>".into(),
            showlegend: false,
        })
    }

    fn layout(&self, viewport: &RegionViewport) -> Layout {
        let theme = &self.config.theme;

        Layout {
            geo: GeoLayout {
                bgcolor: theme.background.clone(),
                showland: true,
                landcolor: theme.land.clone(),
                showocean: true,
                oceancolor: theme.ocean.clone(),
                showcountries: true,
                countrycolor: theme.country_border.clone(),
                showlakes: theme.show_lakes,
                lakecolor: theme.lake.clone(),
                showframe: theme.show_frame,
                framecolor: theme.frame.clone(),
                coastlinecolor: theme.coastline.clone(),
                projection: ProjectionLayout { kind: viewport.projection },
                scope: viewport.scope,
                center: viewport.center,
                lataxis: viewport.lat_range.map(|range| AxisRange { range }),
                lonaxis: viewport.lon_range.map(|range| AxisRange { range }),
            },
            paper_bgcolor: theme.background.clone(),
            plot_bgcolor: theme.background.clone(),
            margin: self.config.margin,
            height: self.config.height,
        }
    }
}

#[cfg(test)]
fn trip(id: &str, city: &str, country: &str, iso: Option<&str>) -> Trip {
    Trip {
        id: id.into(),
        country: country.into(),
        iso_alpha3: iso.map(String::from),
        city: city.into(),
        latitude: 10.,
        longitude: 20.,
        date: "2024-01-01".into(),
        continent: "Europe".into(),
    }
}

#[test]
fn country_layer_holds_distinct_codes() {
    let trips = vec![
        trip("1", "Paris", "France", Some("FRA")),
        trip("2", "Lyon", "France", Some("FRA")),
        trip("3", "Madrid", "Spain", Some("ESP")),
    ];
    let figure = MapRenderer::default().render_region(&trips, Region::World);

    let countries = figure.choropleth().unwrap();
    assert_eq!(countries.locations, vec!["FRA".to_string(), "ESP".to_string()]);
    assert_eq!(countries.z, vec![1, 1]);
    assert!(!countries.showscale);
    assert_eq!(countries.colorscale[0].1, countries.colorscale[1].1);
    assert_eq!(countries.hovertemplate, "%{location}<extra></extra>");
}

#[test]
fn point_layer_labels_rows_in_order() {
    let trips = vec![
        trip("1", "Paris", "France", Some("FRA")),
        trip("2", "Kyoto", "Japan", None),
        trip("3", "Lima", "Peru", None),
    ];
    let figure = MapRenderer::default().render_region(&trips, Region::World);

    let points = figure.scattergeo().unwrap();
    assert_eq!(points.lat.len(), 3);
    assert_eq!(points.text, vec!["Paris, France", "Kyoto, Japan", "Lima, Peru"]);
    assert!(!points.showlegend);
    assert_eq!(points.mode, "markers");
    assert_eq!(points.marker.size, 5.);
    assert_eq!(points.marker.color, "#5ed0ea");
    assert_eq!(points.hovertemplate, "<b>%{text}</b><extra></extra>");
}

#[test]
fn rows_without_iso_are_points_only() {
    let trips = vec![trip("1", "Kyoto", "Japan", None)];
    let figure = MapRenderer::default().render_region(&trips, Region::Asia);

    assert_eq!(figure.data.len(), 1);
    assert!(figure.choropleth().is_none());
    assert!(figure.scattergeo().is_some());
}

#[test]
fn empty_table_renders_bare_styled_map() {
    let renderer = MapRenderer::default();
    let figure = renderer.render_region(&[], Region::World);

    assert!(figure.data.is_empty());
    assert_eq!(figure.layout.height, 490);
    assert_eq!(figure.layout.paper_bgcolor, "#0B0F19");
    assert_eq!(figure.layout.geo.landcolor, "#454B52");
    assert!(figure.layout.geo.showland);
    assert!(!figure.layout.geo.showlakes);
}

#[test]
fn oceania_viewport_ignores_table_contents() {
    let renderer = MapRenderer::default();
    let trips = vec![trip("1", "Paris", "France", Some("FRA"))];
    let empty: Vec<Trip> = Vec::new();

    for table in [&trips, &empty] {
        let geo = renderer.render_region(table, Region::Oceania).layout.geo;
        assert_eq!(geo.center.map(|c| (c.lat, c.lon)), Some((-25., 140.)));
        assert_eq!(geo.lataxis.map(|a| a.range), Some([-50., 5.]));
        assert_eq!(geo.lonaxis.map(|a| a.range), Some([110., 180.]));
    }
}

#[test]
fn render_is_deterministic() {
    let renderer = MapRenderer::default();
    let trips = vec![trip("1", "Paris", "France", Some("FRA")), trip("2", "Kyoto", "Japan", Some("JPN"))];
    assert_eq!(renderer.render_region(&trips, Region::Europe), renderer.render_region(&trips, Region::Europe));
}

#[test]
fn figure_json_matches_plotly_shape() {
    let trips = vec![trip("1", "Paris", "France", Some("FRA"))];
    let json = MapRenderer::default().render_region(&trips, Region::Oceania).to_json();

    assert_eq!(json["data"][0]["type"], "choropleth");
    assert_eq!(json["data"][1]["type"], "scattergeo");
    assert_eq!(json["data"][1]["text"][0], "Paris, France");
    assert_eq!(json["layout"]["geo"]["projection"]["type"], "natural earth");
    assert_eq!(json["layout"]["geo"]["scope"], "world");
    assert_eq!(json["layout"]["geo"]["lonaxis"]["range"][1], 180.);
    assert_eq!(json["layout"]["margin"]["l"], 0);

    let europe = MapRenderer::default().render_region(&trips, Region::Europe).to_json();
    assert!(europe["layout"]["geo"].get("center").is_none());
    assert_eq!(europe["layout"]["geo"]["projection"]["type"], "equirectangular");
}

#[test]
fn alternate_presets_are_honored() {
    use crate::region::{GeoCenter, GeoScope, Projection};

    let viewport = RegionViewport {
        projection: Projection::Equirectangular,
        scope: GeoScope::SouthAmerica,
        center: Some(GeoCenter { lat: -15., lon: -60. }),
        lat_range: None,
        lon_range: None,
    };
    let renderer = MapRenderer::new(MapConfig::default().with_viewport(Region::Americas, viewport));
    let geo = renderer.render_region(&[], Region::Americas).layout.geo;

    assert_eq!(geo.scope, GeoScope::SouthAmerica);
    assert_eq!(geo.center, Some(GeoCenter { lat: -15., lon: -60. }));
}
