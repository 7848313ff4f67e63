//! Interactive map widget for blocks listing coordinates.

use super::html::{escape_html, script_json, script_str};
use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Default zoom of the map view.
const DEFAULT_ZOOM: u8 = 10;

/// A named point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

fn location_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(.+?)\s*\(?\s*(-?\d+(?:\.\d+)?)\s*,\s*(-?\d+(?:\.\d+)?)\s*\)?\s*$").unwrap()
    })
}

/// Parse `NAME (LAT, LNG)` or `NAME: LAT, LNG` lines. Lines that do not
/// match, or whose coordinates are out of range, are skipped.
pub fn extract_locations(block_id: &str, text: &str) -> Result<Vec<Location>> {
    let locations: Vec<Location> = text
        .lines()
        .map(|l| l.trim().trim_start_matches(['-', '*', '•']).trim())
        .filter_map(|line| {
            let caps = location_pattern().captures(line)?;
            let name = caps[1].trim().trim_end_matches(':').trim().to_string();
            let lat: f64 = caps[2].parse().ok()?;
            let lng: f64 = caps[3].parse().ok()?;
            let valid = !name.is_empty()
                && (-90.0..=90.0).contains(&lat)
                && (-180.0..=180.0).contains(&lng);
            valid.then_some(Location { name, lat, lng })
        })
        .collect();

    if locations.is_empty() {
        return Err(Error::malformed(block_id, "no coordinates"));
    }
    Ok(locations)
}

/// Mean latitude and longitude.
pub fn center(locations: &[Location]) -> (f64, f64) {
    if locations.is_empty() {
        return (0.0, 0.0);
    }
    let n = locations.len() as f64;
    let lat = locations.iter().map(|l| l.lat).sum::<f64>() / n;
    let lng = locations.iter().map(|l| l.lng).sum::<f64>() / n;
    (lat, lng)
}

/// Map container, marker data and the initialization script.
pub fn render_map(block_id: &str, locations: &[Location]) -> Result<String> {
    let id = escape_html(block_id);
    let (lat, lng) = center(locations);
    let markers = script_json(&locations)?;
    let data_id = script_str(&format!("map-data-{block_id}"));
    let map_id = script_str(&format!("map-{block_id}"));

    Ok(format!(
        r#"<div class="map-container" id="map-{id}"></div>
<script type="application/json" id="map-data-{id}">{markers}</script>
<script>
(function() {{
  var points = JSON.parse(document.getElementById({data_id}).textContent);
  var map = L.map({map_id}).setView([{lat}, {lng}], {DEFAULT_ZOOM});
  L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
    attribution: '&copy; OpenStreetMap contributors'
  }}).addTo(map);
  points.forEach(function(p) {{
    var label = document.createElement('span');
    label.textContent = p.name;
    L.marker([p.lat, p.lng]).addTo(map).bindPopup(label);
  }});
}})();
</script>"#
    ))
}
