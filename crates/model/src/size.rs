//! Byte-count formatting for listings.

const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

/// Format a byte count using decimal file-size units.
///
/// Counts below 1000 are shown in bytes; larger counts use the biggest unit
/// that keeps the value at or above 1, with one decimal place.
pub fn format_size(bytes: u64) -> String {
    match bytes {
        1 => return "1 byte".to_string(),
        0..=999 => return format!("{bytes} bytes"),
        _ => {}
    }

    let mut value = bytes as f64 / 1000.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if value < 1000.0 {
            break;
        }
        value /= 1000.0;
        unit = next;
    }

    format!("{value:.1} {unit}")
}
