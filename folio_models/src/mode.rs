use serde::{Deserialize, Serialize};

/// The environment the service is deployed in.
///
/// Read once from configuration at startup and handed to every component that
/// behaves differently outside of production. A missing value defaults to
/// [`RuntimeMode::Production`], an unknown one is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeMode {
    #[default]
    Production,
    Development,
    Test,
}

impl RuntimeMode {
    pub fn is_production(self) -> bool {
        self == Self::Production
    }

    pub fn is_development(self) -> bool {
        self == Self::Development
    }

    /// Maximum number of contact submissions per client and window, unless
    /// configured explicitly.
    pub fn default_contact_rate_limit(self) -> u32 {
        match self {
            Self::Production => 5,
            Self::Development | Self::Test => 50,
        }
    }
}

impl std::fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Production => "production",
            Self::Development => "development",
            Self::Test => "test",
        })
    }
}
