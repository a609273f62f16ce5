use serde::{Deserialize, Serialize};

/// Configuration for the blog module (`modules.blog` in the app config)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlogConfig {
    /// Limit used when a caller omits one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    /// Create an empty profile row the first time a standard user writes.
    #[serde(default = "default_provision_profiles")]
    pub provision_profiles: bool,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            provision_profiles: default_provision_profiles(),
        }
    }
}

fn default_page_size() -> u64 {
    10
}

fn default_max_page_size() -> u64 {
    100
}

fn default_provision_profiles() -> bool {
    true
}
