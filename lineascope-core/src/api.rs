//! Default API base resolution: an explicit override wins, then a known
//! host, then localhost. Pure; no I/O.

pub const DEFAULT_API_PORT: u16 = 8000;

pub fn resolve_api_base(override_url: Option<&str>, host: Option<&str>) -> String {
    if let Some(api) = override_url
        && !api.is_empty()
    {
        return api.trim_end_matches('/').to_string();
    }
    match host {
        Some(h) if !h.is_empty() => format!("http://{}:{}", h, DEFAULT_API_PORT),
        _ => format!("http://localhost:{}", DEFAULT_API_PORT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_when_present() {
        assert_eq!(
            resolve_api_base(Some("http://api.internal:9000/"), Some("myhost")),
            "http://api.internal:9000"
        );
    }

    #[test]
    fn empty_override_falls_through_to_host() {
        assert_eq!(
            resolve_api_base(Some(""), Some("myhost")),
            "http://myhost:8000"
        );
    }

    #[test]
    fn no_override_and_no_host_means_localhost() {
        assert_eq!(resolve_api_base(None, None), "http://localhost:8000");
        assert_eq!(resolve_api_base(None, Some("")), "http://localhost:8000");
    }
}
