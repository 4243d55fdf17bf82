//! Wind-speed classification
//!
//! Utility for consumers that want to show wind strength as a Beaufort
//! number next to the forecast. Not used by the update loop itself.

/// Beaufort category upper bounds in km/h; the last entry caps the scale.
const BEAUFORT_KMH_BOUNDS: [f64; 13] = [
    1.0, 5.0, 11.0, 19.0, 28.0, 38.0, 49.0, 61.0, 74.0, 88.0, 102.0, 117.0, 1000.0,
];

/// Classify a wind speed in m/s on the 0-12 Beaufort scale.
///
/// The index of the first bound strictly greater than the converted km/h
/// speed names the category; speeds beyond the table saturate at 12.
#[must_use]
pub fn ms_to_beaufort(ms: f64) -> u8 {
    let kmh = ms * 60.0 * 60.0 / 1000.0;
    BEAUFORT_KMH_BOUNDS
        .iter()
        .position(|bound| *bound > kmh)
        .map_or(12, |index| index as u8)
}
