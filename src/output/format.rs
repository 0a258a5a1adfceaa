const BYTE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Formats seconds as `"{m}m {s}s"`; missing or zero durations read `"N/A"`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_duration(seconds: Option<f64>) -> String {
    match seconds {
        Some(seconds) if seconds > 0.0 => {
            let whole = seconds.floor() as u64;
            format!("{}m {}s", whole / 60, whole % 60)
        }
        _ => "N/A".to_string(),
    }
}

/// Human-readable byte size with at most two decimals, e.g. `"1.5 KB"`.
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    while unit + 1 < BYTE_UNITS.len() && bytes >= 1024_u64.pow(unit as u32 + 1) {
        unit += 1;
    }

    let value = bytes as f64 / 1024_u64.pow(unit as u32) as f64;
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", BYTE_UNITS[unit])
}
