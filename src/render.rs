//! Safety-map rendering
//!
//! Projects scored segments onto an interactive Leaflet map: one
//! colored line per consecutive segment pair, distinct start/end
//! markers labeled with the original location text, and a static
//! legend. The artifact is a standalone HTML file; its markup is an
//! implementation detail, not a compatibility surface.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::SafeRouteConfig;
use crate::error::{RenderFailure, SafeRouteError};
use crate::models::ScoredSegment;

/// File name of the rendered artifact inside the output directory
const MAP_FILE_NAME: &str = "safety_route.html";

/// Renders scored routes to an HTML map artifact
pub struct MapRenderer {
    output_dir: PathBuf,
}

impl MapRenderer {
    /// Create a renderer writing into the configured output directory
    #[must_use]
    pub fn new(config: &SafeRouteConfig) -> Self {
        Self {
            output_dir: PathBuf::from(&config.render.output_dir),
        }
    }

    /// Create a renderer writing into an explicit directory
    #[must_use]
    pub fn with_output_dir<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Render the segments and persist the artifact.
    ///
    /// Returns the artifact path, or a typed [`RenderFailure`] when
    /// there is nothing to draw or the file cannot be written. Segment
    /// pairs with non-finite coordinates are skipped with a logged
    /// index rather than aborting the whole map.
    pub fn render(
        &self,
        segments: &[ScoredSegment],
        start_label: &str,
        end_label: &str,
    ) -> Result<PathBuf, SafeRouteError> {
        if segments.is_empty() {
            return Err(SafeRouteError::Render {
                reason: RenderFailure::NoSegments,
            });
        }

        let html = build_html(segments, start_label, end_label);

        fs::create_dir_all(&self.output_dir).map_err(|source| SafeRouteError::Render {
            reason: RenderFailure::OutputDir {
                path: self.output_dir.display().to_string(),
                source,
            },
        })?;

        let path = self.output_dir.join(MAP_FILE_NAME);
        fs::write(&path, html).map_err(|source| SafeRouteError::Render {
            reason: RenderFailure::Write {
                path: path.display().to_string(),
                source,
            },
        })?;

        info!("Safety map saved to {}", path.display());
        Ok(path)
    }
}

fn build_html(segments: &[ScoredSegment], start_label: &str, end_label: &str) -> String {
    let start = segments[0].segment.coordinate;
    let end = segments[segments.len() - 1].segment.coordinate;
    let center_lat = (start.latitude + end.latitude) / 2.0;
    let center_lon = (start.longitude + end.longitude) / 2.0;

    let mut lines = String::new();
    for (index, pair) in segments.windows(2).enumerate() {
        let a = pair[0].segment.coordinate;
        let b = pair[1].segment.coordinate;
        if !(a.latitude.is_finite()
            && a.longitude.is_finite()
            && b.latitude.is_finite()
            && b.longitude.is_finite())
        {
            warn!("Skipping segment pair {index}: non-finite coordinates");
            continue;
        }

        let risk = pair[0].risk_level;
        let _ = writeln!(
            lines,
            "    L.polyline([[{}, {}], [{}, {}]], {{color: '{}', weight: 4, opacity: 0.8}})\n      .bindPopup('Risk Level: {}').addTo(map);",
            a.latitude,
            a.longitude,
            b.latitude,
            b.longitude,
            risk.color(),
            risk,
        );
    }

    let generated = Utc::now().format("%Y-%m-%d %H:%M UTC");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Safety Route Map</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
  <style>
    html, body, #map {{ height: 100%; margin: 0; }}
    .legend {{
      position: fixed; bottom: 50px; right: 50px;
      border: 2px solid grey; z-index: 9999;
      background-color: white; padding: 10px; font-size: 14px;
    }}
    .footer {{
      position: fixed; bottom: 8px; left: 8px;
      z-index: 9999; background-color: white;
      padding: 2px 6px; font-size: 11px; color: #555;
    }}
  </style>
</head>
<body>
  <div id="map"></div>
  <div class="legend">
    <p><strong>Risk Levels</strong></p>
    <p>
      <span style="color:#00ff00;">&#9632;</span> Low Risk<br>
      <span style="color:#ffff00;">&#9632;</span> Medium Risk<br>
      <span style="color:#ff0000;">&#9632;</span> High Risk
    </p>
  </div>
  <div class="footer">Generated {generated}</div>
  <script>
    var map = L.map('map').setView([{center_lat}, {center_lon}], 10);
    L.tileLayer('https://tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
      attribution: '&copy; OpenStreetMap contributors'
    }}).addTo(map);

{lines}
    var startIcon = new L.Icon({{
      iconUrl: 'https://raw.githubusercontent.com/pointhi/leaflet-color-markers/master/img/marker-icon-green.png',
      iconSize: [25, 41], iconAnchor: [12, 41]
    }});
    var endIcon = new L.Icon({{
      iconUrl: 'https://raw.githubusercontent.com/pointhi/leaflet-color-markers/master/img/marker-icon-red.png',
      iconSize: [25, 41], iconAnchor: [12, 41]
    }});
    L.marker([{start_lat}, {start_lon}], {{icon: startIcon}}).bindPopup('Start: {start_label}').addTo(map);
    L.marker([{end_lat}, {end_lon}], {{icon: endIcon}}).bindPopup('End: {end_label}').addTo(map);
  </script>
</body>
</html>
"#,
        start_lat = start.latitude,
        start_lon = start.longitude,
        end_lat = end.latitude,
        end_lon = end.longitude,
        start_label = escape_label(start_label),
        end_label = escape_label(end_label),
    )
}

/// Escape a location label for embedding in a single-quoted JS string
fn escape_label(label: &str) -> String {
    label
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\n', " ")
}
