//! Pure mapping from [`ScreenState`] to what gets drawn.

use crate::{model::Coordinates, screen::ScreenState};

pub const LOADING_MESSAGE: &str = "Obtendo sua localização...";
pub const RETRY_LABEL: &str = "Tentar novamente";
pub const MARKER_TITLE: &str = "Você está aqui!";
pub const MARKER_COLOR: &str = "#ff0000";

/// Latitude/longitude span of the initial map region, in degrees.
pub const DEFAULT_SPAN_DEG: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct LoadingView {
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorView {
    pub message: String,
    pub retry_label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub center: Coordinates,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl Region {
    /// Slippy-map zoom level showing roughly this region's longitude span.
    pub fn zoom_level(&self) -> u8 {
        let span = self.longitude_delta.max(self.latitude_delta);
        if !span.is_finite() || span <= 0.0 {
            return 19;
        }
        (360.0 / span).log2().round().clamp(0.0, 19.0) as u8
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub coordinate: Coordinates,
    pub title: &'static str,
    pub description: String,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub region: Region,
    pub markers: Vec<Marker>,
    pub shows_user_location: bool,
    pub shows_my_location_button: bool,
    pub follows_user_location: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Loading(LoadingView),
    Error(ErrorView),
    Map(MapView),
}

impl View {
    pub fn from_state(state: &ScreenState) -> Self {
        match state {
            ScreenState::Loading => View::Loading(LoadingView { message: LOADING_MESSAGE }),
            ScreenState::Error(message) => {
                View::Error(ErrorView { message: message.clone(), retry_label: RETRY_LABEL })
            }
            ScreenState::Ready(sample) => {
                let center = sample.coordinates;
                View::Map(MapView {
                    region: Region {
                        center,
                        latitude_delta: DEFAULT_SPAN_DEG,
                        longitude_delta: DEFAULT_SPAN_DEG,
                    },
                    markers: vec![Marker {
                        coordinate: center,
                        title: MARKER_TITLE,
                        description: marker_description(&center),
                        color: MARKER_COLOR,
                    }],
                    shows_user_location: true,
                    shows_my_location_button: true,
                    follows_user_location: true,
                })
            }
        }
    }
}

pub fn marker_description(coordinates: &Coordinates) -> String {
    format!(
        "Lat: {}, Lng: {}",
        to_fixed(coordinates.latitude, 4),
        to_fixed(coordinates.longitude, 4)
    )
}

/// Fixed-point text of the exact binary value, ties rounded away from zero.
///
/// `format!("{:.N}")` breaks exact ties to even, which would show 1.40625 as 1.4062.
fn to_fixed(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    // Every finite f64 has a terminating expansion within 1074 fractional digits.
    let exact = format!("{:.1074}", value.abs());
    let (int_part, frac) = exact.split_once('.').unwrap_or((exact.as_str(), ""));

    let mut kept: Vec<u8> = int_part.bytes().chain(frac.bytes().take(digits)).collect();
    if frac.as_bytes().get(digits).is_some_and(|next| *next >= b'5') {
        let mut carry = true;
        for digit in kept.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            kept.insert(0, b'1');
        }
    }

    let split = kept.len() - digits;
    let mut out = String::with_capacity(kept.len() + 2);
    if value < 0.0 {
        out.push('-');
    }
    out.extend(kept[..split].iter().map(|&d| d as char));
    if digits > 0 {
        out.push('.');
        out.extend(kept[split..].iter().map(|&d| d as char));
    }
    out
}

/// Draws views. Gestures, tiles and live user tracking are the renderer's business.
pub trait MapRenderer {
    fn render(&mut self, view: &View) -> anyhow::Result<()>;
}
