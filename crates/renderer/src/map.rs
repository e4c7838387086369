//! Leaflet map documents with wind markers and overlay layers.

use chrono::{DateTime, Utc};
use grid_sampler::ForecastSample;
use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::overlay::{OverlayLayer, Threshold};

/// Stylesheet and script tags for Leaflet, for the page `<head>`.
pub const LEAFLET_HEAD: &str = r#"<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css"/>
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>"#;

const MAP_SCRIPT: &str = r#"<div id="__MAP_ID__" class="mapa" style="height: __HEIGHT__;"></div>
<script>
(function () {
  var data = __MAP_DATA__;
  var map = L.map('__MAP_ID__').setView(data.center, data.zoom);
  L.tileLayer('https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png', {
    attribution: '&copy; OpenStreetMap contributors &copy; CARTO',
    subdomains: 'abcd',
    maxZoom: 19
  }).addTo(map);
  var layers = {};
  data.overlays.forEach(function (o) {
    layers[o.label] = L.imageOverlay(o.url, o.bounds, {opacity: o.opacity}).addTo(map);
  });
  var wind = L.layerGroup();
  data.markers.forEach(function (m) {
    L.circleMarker([m.lat, m.lon], {
      radius: 7, color: m.color, fill: true, fillColor: m.color, fillOpacity: 0.8
    }).bindPopup(m.popup, {maxWidth: 200}).addTo(wind);
  });
  wind.addTo(map);
  layers[data.wind_label] = wind;
  L.control.layers(null, layers, {collapsed: false}).addTo(map);
})();
</script>"#;

/// Wind speed bands for marker colors, in the samples' unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindColorScale {
    /// Above this: orange.
    pub moderate: f64,
    /// Above this: red.
    pub strong: f64,
}

impl Default for WindColorScale {
    fn default() -> Self {
        Self {
            moderate: 20.0,
            strong: 30.0,
        }
    }
}

impl WindColorScale {
    pub fn color(&self, speed: f64) -> &'static str {
        if speed > self.strong {
            "red"
        } else if speed > self.moderate {
            "orange"
        } else {
            "green"
        }
    }
}

/// Initial map view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapView {
    /// `[lat, lon]`
    pub center: [f64; 2],
    pub zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: [-44.0, -63.0],
            zoom: 5,
        }
    }
}

/// A circle marker with its popup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindMarker {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub color: &'static str,
    /// Escaped HTML.
    pub popup: String,
}

impl WindMarker {
    pub fn from_sample(sample: &ForecastSample, scale: &WindColorScale) -> Self {
        let popup = format!(
            "<b>{}</b><br>Velocidad: {:.1} {}<br>Dirección: {:.0}°",
            html_escape::encode_text(&sample.location),
            sample.wind_speed,
            sample.unit.symbol(),
            sample.wind_direction
        );
        Self {
            name: sample.location.clone(),
            lat: sample.latitude,
            lon: sample.longitude,
            color: scale.color(sample.wind_speed),
            popup,
        }
    }
}

#[derive(Serialize)]
struct OverlayData {
    label: String,
    url: String,
    bounds: [[f64; 2]; 2],
    opacity: f64,
}

#[derive(Serialize)]
struct MapData<'a> {
    center: [f64; 2],
    zoom: u8,
    wind_label: &'a str,
    markers: &'a [WindMarker],
    overlays: Vec<OverlayData>,
}

/// Everything needed to render one forecast map.
#[derive(Debug, Clone)]
pub struct MapDocument {
    pub title: String,
    pub view: MapView,
    pub markers: Vec<WindMarker>,
    pub overlays: Vec<OverlayLayer>,
    pub overlay_opacity: f64,
    pub wind_scale: WindColorScale,
    pub unit_symbol: String,
    pub updated_at: DateTime<Utc>,
}

impl MapDocument {
    pub fn new(title: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            view: MapView::default(),
            markers: Vec::new(),
            overlays: Vec::new(),
            overlay_opacity: 0.5,
            wind_scale: WindColorScale::default(),
            unit_symbol: "kt".to_string(),
            updated_at,
        }
    }

    pub fn with_view(mut self, view: MapView) -> Self {
        self.view = view;
        self
    }

    pub fn with_wind_scale(mut self, scale: WindColorScale) -> Self {
        self.wind_scale = scale;
        self
    }

    pub fn with_overlay_opacity(mut self, opacity: f64) -> Self {
        self.overlay_opacity = opacity;
        self
    }

    /// Add one marker per sample.
    pub fn with_samples<'a, I>(mut self, samples: I) -> Self
    where
        I: IntoIterator<Item = &'a ForecastSample>,
    {
        for sample in samples {
            self.unit_symbol = sample.unit.symbol().to_string();
            self.markers
                .push(WindMarker::from_sample(sample, &self.wind_scale));
        }
        self
    }

    pub fn with_overlays(mut self, overlays: Vec<OverlayLayer>) -> Self {
        self.overlays = overlays;
        self
    }

    /// Map container plus script, for embedding in a page that already
    /// loads Leaflet.
    pub fn render_fragment(&self, element_id: &str, height: &str) -> Result<String, RenderError> {
        let overlays = self
            .overlays
            .iter()
            .map(|layer| OverlayData {
                label: layer.label().to_string(),
                url: layer.data_uri(),
                bounds: [
                    [layer.bounds.min_y, layer.bounds.min_x],
                    [layer.bounds.max_y, layer.bounds.max_x],
                ],
                opacity: self.overlay_opacity,
            })
            .collect();
        let data = MapData {
            center: self.view.center,
            zoom: self.view.zoom,
            wind_label: "Viento",
            markers: &self.markers,
            overlays,
        };
        // "</" inside a script block would end it early
        let json = serde_json::to_string(&data)?.replace("</", "<\\/");
        let id: String = element_id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();

        Ok(MAP_SCRIPT
            .replace("__MAP_DATA__", &json)
            .replace("__MAP_ID__", &id)
            .replace("__HEIGHT__", &html_escape::encode_double_quoted_attribute(height)))
    }

    /// Wind and wave legend as HTML.
    pub fn legend_html(&self) -> String {
        let swatch = |color: &str, text: &str| {
            format!(
                r#"<span class="muestra" style="background:{}"></span> {}"#,
                html_escape::encode_double_quoted_attribute(color),
                html_escape::encode_text(text)
            )
        };
        let unit = self.unit_symbol.as_str();
        let scale = &self.wind_scale;
        let wind = [
            swatch("green", &format!("≤ {} {}", scale.moderate, unit)),
            swatch("orange", &format!("{}–{} {}", scale.moderate, scale.strong, unit)),
            swatch("red", &format!("> {} {}", scale.strong, unit)),
        ]
        .join(" | ");

        let thresholds: Vec<&Threshold> = self.overlays.iter().map(|o| &o.threshold).collect();
        let mut html = format!(r#"<div class="leyenda"><b>Viento:</b> {}"#, wind);
        if !thresholds.is_empty() {
            let waves = thresholds
                .iter()
                .map(|t| swatch(&t.color.to_css_hex(), &t.label))
                .collect::<Vec<_>>()
                .join(" | ");
            html.push_str(&format!("<br><b>Olas:</b> {}", waves));
        }
        html.push_str(&format!(
            "<br><i>Actualizado: {} UTC</i></div>",
            self.updated_at.format("%Y-%m-%d %H:%M")
        ));
        html
    }

    /// A complete HTML page showing only the map and its legend.
    pub fn render_standalone(&self) -> Result<String, RenderError> {
        let fragment = self.render_fragment("mapa", "100%")?;
        Ok(format!(
            r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
{head}
<style>
html, body {{ height: 100%; margin: 0; font-family: sans-serif; }}
.leyenda {{ position: absolute; bottom: 20px; left: 10px; z-index: 1000; background: white; padding: 8px 12px; border-radius: 6px; box-shadow: 0 1px 4px rgba(0,0,0,0.3); font-size: 13px; }}
.muestra {{ display: inline-block; width: 12px; height: 12px; border-radius: 50%; vertical-align: middle; }}
</style>
</head>
<body>
{fragment}
{legend}
</body>
</html>
"#,
            title = html_escape::encode_text(&self.title),
            head = LEAFLET_HEAD,
            fragment = fragment,
            legend = self.legend_html(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use grid_sampler::SpeedUnit;

    fn sample(name: &str, speed: f64) -> ForecastSample {
        ForecastSample {
            location: name.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap(),
            wind_speed: speed,
            wind_direction: 225.0,
            latitude: -38.03,
            longitude: -57.5,
            unit: SpeedUnit::Knots,
        }
    }

    #[test]
    fn test_wind_colors() {
        let scale = WindColorScale::default();
        assert_eq!(scale.color(12.0), "green");
        assert_eq!(scale.color(20.0), "green");
        assert_eq!(scale.color(20.1), "orange");
        assert_eq!(scale.color(30.0), "orange");
        assert_eq!(scale.color(30.5), "red");
    }

    #[test]
    fn test_marker_popup() {
        let marker = WindMarker::from_sample(&sample("Mar del Plata", 13.745), &WindColorScale::default());
        assert_eq!(
            marker.popup,
            "<b>Mar del Plata</b><br>Velocidad: 13.7 kt<br>Dirección: 225°"
        );
        assert_eq!(marker.color, "green");
    }

    #[test]
    fn test_popup_escapes_name() {
        let marker = WindMarker::from_sample(&sample("<script>", 5.0), &WindColorScale::default());
        assert!(marker.popup.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_fragment_cannot_close_script() {
        let updated = Utc.with_ymd_and_hms(2024, 3, 15, 6, 30, 0).unwrap();
        let doc = MapDocument::new("Mapa", updated).with_samples([&sample("</script>", 5.0)]);
        let html = doc.render_fragment("mapa", "600px").unwrap();
        assert_eq!(html.matches("</script>").count(), 1);
        assert!(html.contains("L.map('mapa')"));
    }

    #[test]
    fn test_legend_mentions_update_time() {
        let updated = Utc.with_ymd_and_hms(2024, 3, 15, 6, 30, 0).unwrap();
        let legend = MapDocument::new("Mapa", updated).legend_html();
        assert!(legend.contains("Actualizado: 2024-03-15 06:30 UTC"));
        assert!(!legend.contains("Olas"));
    }
}
