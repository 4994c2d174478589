use crate::types::LuminosityReading;

/// Mean of the plane's bytes read as unsigned values.
///
/// Runs on the camera's calling thread for every frame, so it stays a single
/// integer pass. An empty plane has no mean and yields NaN.
pub fn average_luminosity(plane: &[u8]) -> LuminosityReading {
    if plane.is_empty() {
        return LuminosityReading(f64::NAN);
    }
    let sum: u64 = plane.iter().map(|&b| u64::from(b)).sum();
    LuminosityReading(sum as f64 / plane.len() as f64)
}
