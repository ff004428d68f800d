use chrono::{NaiveDate, NaiveDateTime};

/// Lenient date parsing; `None` drops the row.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    // 只有年月時取當月一日
    for fmt in ["%Y-%m-%d", "%Y%m%d"] {
        let padded = if fmt.contains('-') {
            format!("{}-01", raw)
        } else {
            format!("{}01", raw)
        };
        if let Ok(date) = NaiveDate::parse_from_str(&padded, fmt) {
            return Some(date);
        }
    }
    None
}
