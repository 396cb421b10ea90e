// src/utils/locale.rs
use once_cell::sync::Lazy;

static SYSTEM_LOCALE: Lazy<Option<String>> = Lazy::new(|| sys_locale::get_locale().and_then(|l| normalize_locale(&l)));

/// The locale reported by the operating system, normalized to BCP-47 style dashes.
pub fn get_system_locale() -> Option<String> {
    SYSTEM_LOCALE.clone()
}

/// Trims and converts `zh_CN` into `zh-CN`; empty input is treated as absent.
pub fn normalize_locale(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.replace('_', "-"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_underscores() {
        assert_eq!(normalize_locale("zh_CN"), Some("zh-CN".to_string()));
        assert_eq!(normalize_locale(" en-US "), Some("en-US".to_string()));
        assert_eq!(normalize_locale("   "), None);
    }
}
