//! Display helpers for recipe quantities and cooking times.

/// Kitchen fractions recognised when formatting decimal amounts
const FRACTIONS: &[(f64, &str)] = &[
    (1.0 / 8.0, "1/8"),
    (1.0 / 4.0, "1/4"),
    (1.0 / 3.0, "1/3"),
    (3.0 / 8.0, "3/8"),
    (1.0 / 2.0, "1/2"),
    (5.0 / 8.0, "5/8"),
    (2.0 / 3.0, "2/3"),
    (3.0 / 4.0, "3/4"),
    (7.0 / 8.0, "7/8"),
];

const FRACTION_TOLERANCE: f64 = 0.01;

/// Render an amount like `"1.5 cups"` as `"1 1/2 cups"`
///
/// Amounts that already contain a fraction, or that do not start with a
/// number, are returned trimmed but otherwise untouched.
pub fn format_amount(amount: &str) -> String {
    let amount = amount.trim();
    if amount.contains('/') {
        return amount.to_string();
    }

    let split = amount
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(amount.len());
    let (number, unit) = amount.split_at(split);
    let unit = unit.trim();

    let value = match number.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => return amount.to_string(),
    };

    with_unit(format_number(value), unit)
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        return format!("{}", value as i64);
    }

    let whole = value.trunc();
    let fraction = value - whole;

    if let Some((_, display)) = FRACTIONS
        .iter()
        .find(|(f, _)| (fraction - f).abs() < FRACTION_TOLERANCE)
    {
        return if whole > 0.0 {
            format!("{} {}", whole as i64, display)
        } else {
            display.to_string()
        };
    }

    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        return "0".to_string();
    }

    let text = format!("{:.2}", rounded);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn with_unit(number: String, unit: &str) -> String {
    if unit.is_empty() {
        number
    } else {
        format!("{} {}", number, unit)
    }
}

/// Render an ISO-8601 duration such as `PT1H30M` as `1 hour 30 minutes`
///
/// Values that are not ISO durations (`"45 min"`) pass through unchanged.
pub fn format_duration(duration: &str) -> String {
    let duration = duration.trim();
    let Some(rest) = duration.strip_prefix('P') else {
        return duration.to_string();
    };
    let Some((_, time)) = rest.split_once('T') else {
        return duration.to_string();
    };

    let mut hours = 0u64;
    let mut minutes = 0u64;
    let mut digits = String::new();

    for c in time.chars() {
        match c {
            '0'..='9' => digits.push(c),
            'H' | 'M' | 'S' => {
                let value = digits.parse::<u64>().unwrap_or(0);
                digits.clear();
                match c {
                    'H' => hours = value,
                    'M' => minutes = value,
                    _ => {}
                }
            }
            _ => return duration.to_string(),
        }
    }

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{} {}", hours, if hours == 1 { "hour" } else { "hours" }));
    }
    if minutes > 0 {
        parts.push(format!("{} {}", minutes, if minutes == 1 { "minute" } else { "minutes" }));
    }

    if parts.is_empty() {
        duration.to_string()
    } else {
        parts.join(" ")
    }
}
