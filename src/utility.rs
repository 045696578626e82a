/// Prices are stored in XCG cents.
pub fn format_currency(cents: i64) -> String {
    format!("XCG {:.2}", cents as f64 / 100.0)
}

pub fn grade_label(grade: Option<&str>) -> String {
    fn label<'a>(g: &'a str) -> &'a str {
        match g {
            "A" => "Excellent",
            "B" => "Good",
            "C" => "Fair",
            "D" => "Poor",
            other => other,
        }
    }
    match grade {
        Some(g) => format!("{} - {}", g, label(g)),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_cents_as_xcg() {
        assert_eq!(format_currency(10000), "XCG 100.00");
        assert_eq!(format_currency(1550), "XCG 15.50");
        assert_eq!(format_currency(0), "XCG 0.00");
    }

    #[test]
    fn grade_labels() {
        assert_eq!(grade_label(Some("A")), "A - Excellent");
        assert_eq!(grade_label(Some("Z")), "Z - Z");
        assert_eq!(grade_label(None), "N/A");
    }
}
