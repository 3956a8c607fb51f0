// Duration parsing and display

use anyhow::Result;

/// Parse a duration expression and return seconds
/// Supports unit sequences in any combination: 30s, 10m, 2h, 1h30m, 1d
pub fn parse_duration(expr: &str) -> Result<i64> {
    let expr = expr.trim();
    if expr.is_empty() {
        anyhow::bail!("Duration cannot be empty");
    }

    let mut total_secs = 0i64;
    let mut digits = String::new();

    for ch in expr.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }

        let unit_secs = match ch {
            'd' => 86400,
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => anyhow::bail!("Invalid duration format: {}", expr),
        };
        let amount: i64 = digits.parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration format: {}", expr))?;
        total_secs = amount
            .checked_mul(unit_secs)
            .and_then(|secs| total_secs.checked_add(secs))
            .ok_or_else(|| anyhow::anyhow!("Invalid duration format: {} (too large)", expr))?;
        digits.clear();
    }

    if !digits.is_empty() {
        anyhow::bail!("Invalid duration format: {} (missing unit)", expr);
    }

    Ok(total_secs)
}

/// Compact day-summary form: "1h 5m", or "5m" under an hour.
/// Seconds are truncated.
pub fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Stopwatch form for live timers: "1:05:09", or "5:09" under an hour
pub fn format_stopwatch(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
