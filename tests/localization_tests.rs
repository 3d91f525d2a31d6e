//! # Localization Tests
//!
//! Message retrieval, language fallback and argument formatting.

use marketplace::localization::LocalizationManager;
use std::collections::HashMap;

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() -> LocalizationManager {
        LocalizationManager::new().expect("Failed to create localization manager")
    }

    #[test]
    fn test_get_message_existing_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("button-my-ads", "en", None);
        assert!(message.contains("My ads"));

        let message = manager.get_message_in_language("button-my-ads", "ru", None);
        assert!(message.contains("Мои объявления"));
    }

    #[test]
    fn test_get_message_nonexistent_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("nonexistent-key", "en", None);
        assert!(message.starts_with("Missing translation:"));
    }

    #[test]
    fn test_get_message_unsupported_language() {
        let manager = setup_localization();

        assert!(!manager.is_language_supported("de"));
        let message = manager.get_message_in_language("button-help", "de", None);
        // Falls back to Russian
        assert_eq!(message, manager.get_message_in_language("button-help", "ru", None));
        assert_eq!(message, manager.get_message("button-help", None));
    }

    #[test]
    fn test_get_message_with_args() {
        let manager = setup_localization();

        let mut args = HashMap::new();
        args.insert("count", "7");

        let message = manager.get_message_in_language("list-more", "en", Some(&args));
        assert!(message.contains("7"));
        assert!(message.contains("more"));
    }

    #[test]
    fn test_get_message_missing_args() {
        let manager = setup_localization();

        // Missing arguments are reported by fluent but still yield text
        let message = manager.get_message_in_language("ad-price", "ru", None);
        assert!(!message.is_empty());
        assert!(message.contains("₽"));
    }

    #[test]
    fn test_every_english_message_exists_in_russian() {
        let manager = setup_localization();

        for key in [
            "welcome-title",
            "welcome-features",
            "welcome-categories-title",
            "welcome-open",
            "button-open-shop",
            "button-my-ads",
            "button-favorites",
            "button-help",
            "button-support",
            "text-hint",
            "my-ads-title",
            "my-ads-empty",
            "my-ads-footer",
            "favorites-title",
            "favorites-empty",
            "favorites-footer",
            "help-title",
            "help-usage",
            "help-contact",
            "help-rules",
        ] {
            let ru = manager.get_message_in_language(key, "ru", None);
            let en = manager.get_message_in_language(key, "en", None);
            assert!(!ru.starts_with("Missing"), "ru is missing {key}");
            assert!(!en.starts_with("Missing"), "en is missing {key}");
            assert_ne!(ru, en, "{key} is not translated");
        }
    }

    #[test]
    fn test_language_detection() {
        use marketplace::localization::detect_language;

        assert_eq!(detect_language(Some("en")), "en");
        assert_eq!(detect_language(Some("en-GB")), "en");
        assert_eq!(detect_language(Some("ru")), "ru");
        assert_eq!(detect_language(Some("uk")), "ru");
        assert_eq!(detect_language(None), "ru");
    }

    #[test]
    fn test_convenience_functions() {
        marketplace::localization::init_localization().expect("Failed to initialize localization");

        let message = marketplace::localization::t_lang("button-favorites", Some("en"));
        assert!(message.contains("Favorites"));

        let args = vec![("support", "@marketplace_support")];
        let message_with_args =
            marketplace::localization::t_args_lang("help-support", &args, Some("ru"));
        assert!(message_with_args.contains("@marketplace_support"));
    }
}
