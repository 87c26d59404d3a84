//! Coarse device labels derived from a free-text client identifier.

pub const UNKNOWN_DEVICE: &str = "Unknown Device";
pub const DEFAULT_DEVICE: &str = "Desktop";

/// Checked in order, first match wins. Generic tokens come before specific
/// platforms, so "mobile" pre-empts "android" and "tablet" pre-empts it too.
const DEVICE_RULES: &[(&[&str], &str)] = &[
    (&["mobile"], "Mobile"),
    (&["tablet"], "Tablet"),
    (&["android"], "Android"),
    (&["iphone", "ipod"], "iPhone"),
    (&["ipad"], "iPad"),
    (&["windows"], "Windows PC"),
    (&["mac"], "Mac"),
    (&["linux"], "Linux"),
];

pub fn classify_device(identifier: &str) -> &'static str {
    if identifier.is_empty() {
        return UNKNOWN_DEVICE;
    }

    let identifier = identifier.to_lowercase();
    DEVICE_RULES
        .iter()
        .find(|(tokens, _)| tokens.iter().any(|token| identifier.contains(token)))
        .map(|(_, label)| *label)
        .unwrap_or(DEFAULT_DEVICE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_identifier_is_unknown() {
        assert_eq!(classify_device(""), "Unknown Device");
    }

    #[test]
    fn iphone() {
        assert_eq!(classify_device("Mozilla/5.0 (iPhone...)"), "iPhone");
        assert_eq!(classify_device("Mozilla/5.0 (iPod touch)"), "iPhone");
    }

    #[test]
    fn tablet_pre_empts_android() {
        assert_eq!(classify_device("SomeAndroidTablet"), "Tablet");
    }

    #[test]
    fn mobile_pre_empts_everything() {
        let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148";
        assert_eq!(classify_device(ua), "Mobile");
        assert_eq!(classify_device("Android Mobile Tablet"), "Mobile");
    }

    #[test]
    fn platforms() {
        assert_eq!(classify_device("Linux; Android 14"), "Android");
        assert_eq!(classify_device("Mozilla/5.0 (iPad; CPU OS 16_0)"), "iPad");
        assert_eq!(classify_device("Mozilla/5.0 (Windows NT 10.0; Win64; x64)"), "Windows PC");
        assert_eq!(classify_device("Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0)"), "Mac");
        assert_eq!(classify_device("Mozilla/5.0 (X11; Linux x86_64)"), "Linux");
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify_device("WINDOWS"), "Windows PC");
        assert_eq!(classify_device("ipad"), "iPad");
    }

    #[test]
    fn unrecognised_falls_back_to_desktop() {
        assert_eq!(classify_device("curl/8.4.0"), "Desktop");
    }
}
