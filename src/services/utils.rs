use chrono::{DateTime, Utc};

/// 相册日期的显示格式
pub const DISPLAY_DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

/// 写库前对用户输入做 HTML 实体编码
pub fn encode_entities(input: &str) -> String {
    html_escape::encode_quoted_attribute(input).into_owned()
}

/// 读库后还原 HTML 实体
pub fn decode_entities(input: &str) -> String {
    html_escape::decode_html_entities(input).into_owned()
}

/// 将 Unix 时间戳格式化为显示用日期（UTC），超出范围时原样返回数字
pub fn format_timestamp(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.format(DISPLAY_DATE_FORMAT).to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}
