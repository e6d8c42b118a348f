use dom::Document;

/// Coarse host environment derived from the user-agent string.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Environment {
    pub is_mobile: bool,
    pub is_windows: bool,
    pub is_mac_os: bool,
    pub is_linux: bool,
}

const MOBILE_MARKERS: [&str; 5] = ["mobile", "android", "iphone", "ipad", "phone"];

impl Environment {
    pub fn from_user_agent(user_agent: &str) -> Self {
        let agent = user_agent.to_ascii_lowercase();
        Self {
            is_mobile: MOBILE_MARKERS.iter().any(|marker| agent.contains(marker)),
            is_windows: agent.contains("win"),
            is_mac_os: agent.contains("mac"),
            is_linux: agent.contains("linux"),
        }
    }

    pub fn detect(document: &Document) -> Self {
        Self::from_user_agent(&document.user_agent())
    }
}
