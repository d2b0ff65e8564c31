use crate::timer::sanitize_minutes;

/// Render worked minutes as a running clock, e.g. "1h 05m 09s".
pub fn format_clock(minutes: f64) -> String {
    // Tiny bias so that 29.999999 minutes of float noise still reads as 30m.
    let seconds = (sanitize_minutes(minutes) * 60.0 + 1e-6).floor() as u64;
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours}h {mins:02}m {secs:02}s")
}

/// Summary line for a finished day, e.g. "8.0 hrs logged".
pub fn format_hours_logged(minutes: f64) -> String {
    format!("{:.1} hrs logged", sanitize_minutes(minutes) / 60.0)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
