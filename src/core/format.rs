//! Human-readable size formatting

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a stored folder size for display
///
/// Uses binary units (1 KB = 1024 bytes), rounded to one decimal place with a
/// trailing `.0` dropped. The failure sentinel (any negative value) becomes
/// `"Error"`.
pub fn format_size(bytes: i64) -> String {
    if bytes < 0 {
        return "Error".to_string();
    }
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{} {}", rounded as u64, UNITS[unit])
    } else {
        format!("{:.1} {}", rounded, UNITS[unit])
    }
}
