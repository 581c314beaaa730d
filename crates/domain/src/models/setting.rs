//! Catalog-wide settings.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Settings key under which the catalog theme is stored.
pub const THEME_KEY: &str = "theme";

/// Theme used when none has been stored.
pub const DEFAULT_THEME: &str = "dark";

/// Theme setting as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeSetting {
    pub theme: String,
}

impl Default for ThemeSetting {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
        }
    }
}

/// Request to change the catalog theme.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateThemeRequest {
    #[validate(
        length(min = 1, max = 32, message = "theme must be 1-32 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub theme: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_theme() {
        assert_eq!(ThemeSetting::default().theme, "dark");
    }

    #[test]
    fn test_update_theme_validation() {
        assert!(UpdateThemeRequest {
            theme: "light".to_string()
        }
        .validate()
        .is_ok());
        assert!(UpdateThemeRequest {
            theme: String::new()
        }
        .validate()
        .is_err());
        assert!(UpdateThemeRequest {
            theme: "x".repeat(33)
        }
        .validate()
        .is_err());
    }
}
