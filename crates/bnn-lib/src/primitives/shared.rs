/// Macro to generate `FromStr` and an allowed-values listing for `ValueEnum` types
///
/// Matching is case-insensitive against the canonical names only, so
/// configuration files, environment variables and command-line flags accept
/// exactly the same value set.
#[macro_export]
macro_rules! impl_fromstr_for_value_enum {
    ($enum_type:ty, $error_reason:expr) => {
        impl FromStr for $enum_type {
            type Err = $crate::primitives::ConfigError;

            fn from_str(s: &str) -> Result<Self, $crate::primitives::ConfigError> {
                let trimmed = s.trim();
                for variant in Self::value_variants() {
                    if let Some(possible_value) = variant.to_possible_value() {
                        if possible_value.get_name().eq_ignore_ascii_case(trimmed) {
                            return Ok(*variant);
                        }
                    }
                }

                Err($crate::primitives::ConfigError::ParseError {
                    value: s.to_string(),
                    reason: format!(
                        "{} (expected one of: {})",
                        $error_reason,
                        Self::allowed_values().join(", ")
                    ),
                })
            }
        }

        impl $enum_type {
            /// Canonical spellings accepted for this value set
            pub fn allowed_values() -> Vec<String> {
                Self::value_variants()
                    .iter()
                    .filter_map(|variant| variant.to_possible_value())
                    .map(|value| value.get_name().to_string())
                    .collect()
            }

            /// Canonical spelling of this variant
            pub fn as_str(&self) -> String {
                self.to_possible_value()
                    .map(|value| value.get_name().to_string())
                    .unwrap_or_default()
            }
        }

        impl std::fmt::Display for $enum_type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        // serde goes through the same parser (`try_from`/`into` container attributes)
        impl TryFrom<String> for $enum_type {
            type Error = $crate::primitives::ConfigError;

            fn try_from(value: String) -> Result<Self, $crate::primitives::ConfigError> {
                value.parse()
            }
        }

        impl From<$enum_type> for String {
            fn from(value: $enum_type) -> Self {
                value.as_str()
            }
        }
    };
}

// Re-export for internal use
pub(crate) use impl_fromstr_for_value_enum;
