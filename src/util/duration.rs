use std::time::Duration;

const MAX_NANOS: u128 = i64::MAX as u128;
const MAX_FRACTION_DIGITS: u32 = 18;

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(1_000_000_000),
        "m" => Some(60 * 1_000_000_000),
        "h" => Some(60 * 60 * 1_000_000_000),
        _ => None,
    }
}

/// Parses a duration such as "300ms", "60s", "1h30m" or "1.5h".
///
/// A sequence of decimal numbers, each with an optional fraction and a
/// mandatory unit suffix. Negative durations are rejected.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let mut rest = input.strip_prefix('+').unwrap_or(input);

    if rest.starts_with('-') {
        return Err("negative durations are not allowed".to_string());
    }
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_part, after_int) = rest.split_at(int_len);

        let (frac_part, after_number) = match after_int.strip_prefix('.') {
            Some(after_dot) => {
                let frac_len = after_dot
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(after_dot.len());
                after_dot.split_at(frac_len)
            }
            None => ("", after_int),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(format!("expected a number at {:?}", rest));
        }

        let unit_len = after_number
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after_number.len());
        let (unit, next) = after_number.split_at(unit_len);

        if unit.is_empty() {
            return Err(format!("missing unit in {:?}", input));
        }
        let scale = unit_nanos(unit).ok_or_else(|| format!("unknown unit {:?}", unit))?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| format!("number out of range in {:?}", input))?
        };

        let mut fraction: u128 = 0;
        let mut divisor: u128 = 1;
        for digit in frac_part.chars().take(MAX_FRACTION_DIGITS as usize) {
            fraction = fraction * 10 + u128::from(digit.to_digit(10).unwrap_or(0));
            divisor *= 10;
        }

        total = whole
            .checked_mul(scale)
            .and_then(|nanos| nanos.checked_add(fraction * scale / divisor))
            .and_then(|nanos| total.checked_add(nanos))
            .filter(|nanos| *nanos <= MAX_NANOS)
            .ok_or_else(|| format!("duration {:?} is out of range", input))?;

        rest = next;
    }

    Ok(Duration::from_nanos(total as u64))
}
