use std::io::Write;

use anyhow::Result;
use locus_core::{
    MapRenderer, View,
    view::{MapView, Marker},
};

/// Prints each view as plain text. The map becomes an OpenStreetMap link.
pub struct TerminalRenderer<W: Write> {
    out: W,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn render_map(&mut self, map: &MapView) -> Result<()> {
        for marker in &map.markers {
            writeln!(self.out, "📍 {}", marker.title)?;
            writeln!(self.out, "   {}", marker.description)?;
            writeln!(self.out, "   {}", osm_url(map, marker))?;
        }
        if map.follows_user_location {
            writeln!(self.out, "   (map follows your position)")?;
        }
        Ok(())
    }
}

impl<W: Write> MapRenderer for TerminalRenderer<W> {
    fn render(&mut self, view: &View) -> Result<()> {
        match view {
            View::Loading(loading) => writeln!(self.out, "⏳ {}", loading.message)?,
            View::Error(error) => {
                writeln!(self.out, "✖ {}", error.message)?;
                writeln!(self.out, "  [{}]", error.retry_label)?;
            }
            View::Map(map) => self.render_map(map)?,
        }
        self.out.flush()?;
        Ok(())
    }
}

fn osm_url(map: &MapView, marker: &Marker) -> String {
    let center = map.region.center;
    format!(
        "https://www.openstreetmap.org/?mlat={}&mlon={}#map={}/{}/{}",
        marker.coordinate.latitude,
        marker.coordinate.longitude,
        map.region.zoom_level(),
        center.latitude,
        center.longitude,
    )
}
