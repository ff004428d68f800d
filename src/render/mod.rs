pub mod chart;
pub mod export;
pub mod html;

pub use html::{render_dashboard, FontFace, PageMode, RenderContext};

pub const FONT_FAMILY: &str = "Pretendard";
pub const FONT_ASSET: &str = "fonts/Pretendard.ttf";

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `-` stands in for a metric that could not be computed.
pub fn format_metric(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}", precision, v),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_format_metric() {
        assert_eq!(format_metric(Some(0.12345), 3), "0.123");
        assert_eq!(format_metric(Some(500.0), 2), "500.00");
        assert_eq!(format_metric(None, 3), "-");
        assert_eq!(format_metric(Some(f64::NAN), 3), "-");
    }
}
