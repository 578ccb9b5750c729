//! Currency formatting for user-facing text (pt-BR conventions).

/// Format an amount as Brazilian reais: `R$ 1.234,56`, negatives as `-R$ 50,00`.
pub fn format_brl(amount: f64) -> String {
    if !amount.is_finite() {
        return "R$ 0,00".to_string();
    }
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!(
        "{sign}R$ {},{:02}",
        group_thousands(cents / 100),
        cents % 100
    )
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_brl_basic() {
        assert_eq!(format_brl(350.0), "R$ 350,00");
        assert_eq!(format_brl(50.5), "R$ 50,50");
        assert_eq!(format_brl(0.0), "R$ 0,00");
        assert_eq!(format_brl(0.07), "R$ 0,07");
    }

    #[test]
    fn test_format_brl_thousands_and_negative() {
        assert_eq!(format_brl(1234.56), "R$ 1.234,56");
        assert_eq!(format_brl(1_000_000.0), "R$ 1.000.000,00");
        assert_eq!(format_brl(-50.0), "-R$ 50,00");
        assert_eq!(format_brl(f64::NAN), "R$ 0,00");
    }
}
