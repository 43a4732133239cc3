/// 以千位分隔符格式化整数，例如 `80332` 格式化为 `"80,332"`。
pub fn format_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// 把年份限制在选择器的上下界之内。
pub fn clamp_year(year: i32, bounds: (i32, i32)) -> i32 {
    year.clamp(bounds.0, bounds.1.max(bounds.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(80332), "80,332");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_clamp_year() {
        assert_eq!(clamp_year(1900, (1906, 2014)), 1906);
        assert_eq!(clamp_year(2020, (1906, 2014)), 2014);
        assert_eq!(clamp_year(2000, (1906, 2014)), 2000);
    }
}
