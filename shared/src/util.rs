/// Current UTC time as an RFC 3339 / ISO-8601 string.
///
/// Mutation payloads on the remote protocol carry this format.
pub fn now_iso8601() -> String {
    chrono::Utc::now()
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Current UTC date as `YYYY-MM-DD` (used in export filenames)
pub fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}
