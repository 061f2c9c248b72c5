/// Left-pads the decimal form of `n` with zeros up to `width` (2 when
/// `width` is 0). Longer values are never truncated.
pub fn pad(width: usize, n: i64) -> String {
    let width = if width == 0 { 2 } else { width };
    format!("{:0>width$}", n.to_string())
}

/// Renders minutes as `HH:mm`. Hours keep growing past 99 instead of
/// wrapping.
pub fn format_minutes(total: i64) -> String {
    let hours = total.div_euclid(60);
    let minutes = total.rem_euclid(60);
    format!("{}:{}", pad(2, hours), pad(2, minutes))
}

#[cfg(test)]
mod tests {
    use super::{format_minutes, pad};

    #[test]
    fn pad_fills_but_never_truncates() {
        assert_eq!(pad(2, 5), "05");
        assert_eq!(pad(4, 991), "0991");
        assert_eq!(pad(2, 123), "123");
        assert_eq!(pad(1, 7), "7");
    }

    #[test]
    fn zero_width_pads_to_two() {
        assert_eq!(pad(0, 7), "07");
        assert_eq!(pad(0, 123), "123");
    }

    #[test]
    fn minutes_render_as_hours_and_minutes() {
        assert_eq!(format_minutes(0), "00:00");
        assert_eq!(format_minutes(59), "00:59");
        assert_eq!(format_minutes(125), "02:05");
        assert_eq!(format_minutes(6000), "100:00");
    }

    #[test]
    fn negative_totals_floor_the_hours() {
        assert_eq!(format_minutes(-30), "-1:30");
    }
}
