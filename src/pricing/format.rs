/// Render a price with two decimals and `,` thousands grouping ("3,750.00").
pub fn format_price(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut out = String::with_capacity(fixed.len() + fixed.len() / 3 + 1);
    if value < 0.0 {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push('.');
    out.push_str(frac_part);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping() {
        assert_eq!(format_price(0.0), "0.00");
        assert_eq!(format_price(12.5), "12.50");
        assert_eq!(format_price(999.999), "1,000.00");
        assert_eq!(format_price(3750.0), "3,750.00");
        assert_eq!(format_price(1234567.891), "1,234,567.89");
        assert_eq!(format_price(100000.0), "100,000.00");
    }

    #[test]
    fn test_negative() {
        assert_eq!(format_price(-50.0), "-50.00");
        assert_eq!(format_price(-1234.5), "-1,234.50");
    }
}
