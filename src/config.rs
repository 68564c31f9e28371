//! Provider configuration resolution.
//!
//! Merges the host-supplied configuration with environment variable
//! fallbacks and defaults into a [`ResolvedConfiguration`].
//!
//! Precedence, lowest to highest: built-in default, environment variable,
//! explicit configuration value. Values the host has not computed yet are
//! never defaulted: if any field is unknown, resolution stops before the
//! environment is consulted.

use std::fmt;

use secrecy::SecretString;
use serde_json::Value;
use tracing::debug;

use crate::env::EnvLookup;
use crate::schema::{Attribute, Diagnostic, Schema};
use crate::value::ConfigValue;

/// Environment variable supplying `server_url`.
pub const SERVER_URL_ENV: &str = "NETBOX_SERVER_URL";
/// Environment variable supplying `api_token`.
pub const API_TOKEN_ENV: &str = "NETBOX_API_TOKEN";
/// Environment variable that disables URL stripping when set to `false`.
pub const STRIP_TRAILING_SLASHES_ENV: &str = "NETBOX_STRIP_TRAILING_SLASHES_FROM_URL";

/// A provider configuration attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    /// `server_url`
    ServerUrl,
    /// `api_token`
    ApiToken,
    /// `strip_trailing_slashes_from_url`
    StripTrailingSlashesFromUrl,
}

impl ConfigField {
    /// Attribute name in the provider schema.
    pub fn attribute(self) -> &'static str {
        match self {
            Self::ServerUrl => "server_url",
            Self::ApiToken => "api_token",
            Self::StripTrailingSlashesFromUrl => "strip_trailing_slashes_from_url",
        }
    }

    /// Environment variable that can supply this attribute.
    pub fn env_var(self) -> &'static str {
        match self {
            Self::ServerUrl => SERVER_URL_ENV,
            Self::ApiToken => API_TOKEN_ENV,
            Self::StripTrailingSlashesFromUrl => STRIP_TRAILING_SLASHES_ENV,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::ServerUrl => "NetBox Server URL",
            Self::ApiToken => "NetBox API Token",
            Self::StripTrailingSlashesFromUrl => "NetBox trailing slash stripping setting",
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute())
    }
}

/// Why a field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The value is not known yet.
    Unknown,
    /// Neither the configuration nor the environment supplied a non-empty value.
    Missing,
}

/// A field-scoped configuration failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationFailure {
    /// The offending attribute.
    pub field: ConfigField,
    /// What went wrong with it.
    pub kind: FailureKind,
}

impl ValidationFailure {
    fn unknown(field: ConfigField) -> Self {
        Self {
            field,
            kind: FailureKind::Unknown,
        }
    }

    fn missing(field: ConfigField) -> Self {
        Self {
            field,
            kind: FailureKind::Missing,
        }
    }

    /// Render this failure as an error diagnostic scoped to its attribute.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let label = self.field.label();
        let (summary, detail) = match self.kind {
            FailureKind::Unknown => (
                format!("Unknown {}", label),
                format!(
                    "The provider cannot create the NetBox API client as there is an unknown \
                     configuration value for the {}. Either target apply the source of the value \
                     first, set the value statically in the configuration, or use the {} \
                     environment variable.",
                    label,
                    self.field.env_var()
                ),
            ),
            FailureKind::Missing => (
                format!("Missing {}", label),
                format!(
                    "The provider cannot create the NetBox API client as there is a missing \
                     configuration value for the {}. Set the {} value in the configuration or \
                     use the {} environment variable. If either is already set, ensure the \
                     value is not empty.",
                    label,
                    self.field.attribute(),
                    self.field.env_var()
                ),
            ),
        };
        Diagnostic::error(summary)
            .with_detail(detail)
            .with_attribute(self.field.attribute())
    }
}

impl From<ValidationFailure> for Diagnostic {
    fn from(failure: ValidationFailure) -> Self {
        failure.to_diagnostic()
    }
}

/// Provider configuration as supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigurationInput {
    /// Location of the NetBox server, including scheme.
    pub server_url: ConfigValue<String>,
    /// NetBox API token.
    pub api_token: ConfigValue<String>,
    /// Whether trailing `/` characters are removed from `server_url`.
    pub strip_trailing_slashes_from_url: ConfigValue<bool>,
}

impl ConfigurationInput {
    /// Decode the host's JSON configuration object.
    ///
    /// All type errors are reported together.
    pub fn from_json(config: &Value) -> Result<Self, Vec<Diagnostic>> {
        let mut diagnostics = Vec::new();

        let server_url = ConfigValue::decode(config, ConfigField::ServerUrl.attribute())
            .unwrap_or_else(|d| {
                diagnostics.push(d);
                ConfigValue::Null
            });
        let api_token = ConfigValue::decode(config, ConfigField::ApiToken.attribute())
            .unwrap_or_else(|d| {
                diagnostics.push(d);
                ConfigValue::Null
            });
        let strip_trailing_slashes_from_url =
            ConfigValue::decode(config, ConfigField::StripTrailingSlashesFromUrl.attribute())
                .unwrap_or_else(|d| {
                    diagnostics.push(d);
                    ConfigValue::Null
                });

        if diagnostics.is_empty() {
            Ok(Self {
                server_url,
                api_token,
                strip_trailing_slashes_from_url,
            })
        } else {
            Err(diagnostics)
        }
    }
}

/// Fully resolved provider configuration.
///
/// The API token is held as a [`SecretString`]; `Debug` output redacts it.
#[derive(Debug)]
pub struct ResolvedConfiguration {
    /// Server URL, without trailing slashes when stripping is enabled.
    pub server_url: String,
    /// NetBox API token.
    pub api_token: SecretString,
    /// Whether trailing slashes were subject to stripping.
    pub strip_trailing_slashes_from_url: bool,
}

/// Outcome of a successful resolution.
#[derive(Debug)]
pub struct Resolution {
    /// The resolved configuration.
    pub config: ResolvedConfiguration,
    /// Non-fatal warnings raised during resolution.
    pub advisories: Vec<Diagnostic>,
}

/// Resolve the provider configuration against the environment.
///
/// Returns every failure of the cycle at once. Unknown failures are
/// returned before any environment lookup takes place.
pub fn resolve<E>(
    input: &ConfigurationInput,
    env: &E,
) -> Result<Resolution, Vec<ValidationFailure>>
where
    E: EnvLookup + ?Sized,
{
    let unknown: Vec<_> = [
        (ConfigField::ServerUrl, input.server_url.is_unknown()),
        (ConfigField::ApiToken, input.api_token.is_unknown()),
        (
            ConfigField::StripTrailingSlashesFromUrl,
            input.strip_trailing_slashes_from_url.is_unknown(),
        ),
    ]
    .into_iter()
    .filter(|(_, is_unknown)| *is_unknown)
    .map(|(field, _)| ValidationFailure::unknown(field))
    .collect();

    if !unknown.is_empty() {
        debug!(count = unknown.len(), "configuration has unknown values");
        return Err(unknown);
    }

    let mut failures = Vec::new();

    let server_url = resolve_string(&input.server_url, env, ConfigField::ServerUrl);
    if server_url.is_empty() {
        failures.push(ValidationFailure::missing(ConfigField::ServerUrl));
    }

    let api_token = resolve_string(&input.api_token, env, ConfigField::ApiToken);
    if api_token.is_empty() {
        failures.push(ValidationFailure::missing(ConfigField::ApiToken));
    }

    let mut strip = env.get(STRIP_TRAILING_SLASHES_ENV).as_deref() != Some("false");
    if let Some(explicit) = input.strip_trailing_slashes_from_url.known() {
        strip = *explicit;
    }

    if !failures.is_empty() {
        return Err(failures);
    }

    let mut advisories = Vec::new();
    let server_url = if strip {
        let (stripped, trimmed) = strip_trailing_slashes(&server_url);
        if trimmed {
            debug!(server_url = %stripped, "stripped trailing slashes from server_url");
            advisories.push(stripped_slashes_advisory());
        }
        stripped.to_owned()
    } else {
        server_url
    };

    Ok(Resolution {
        config: ResolvedConfiguration {
            server_url,
            api_token: SecretString::from(api_token),
            strip_trailing_slashes_from_url: strip,
        },
        advisories,
    })
}

/// Remove every trailing `/` from `url`, reporting whether any was removed.
pub fn strip_trailing_slashes(url: &str) -> (&str, bool) {
    let stripped = url.trim_end_matches('/');
    (stripped, stripped.len() != url.len())
}

fn resolve_string<E>(value: &ConfigValue<String>, env: &E, field: ConfigField) -> String
where
    E: EnvLookup + ?Sized,
{
    let from_env = env.get(field.env_var()).unwrap_or_default();
    match value.known() {
        Some(explicit) => explicit.clone(),
        None => from_env,
    }
}

fn stripped_slashes_advisory() -> Diagnostic {
    Diagnostic::warning("Stripped trailing slashes from the `server_url` parameter")
        .with_detail(
            "Trailing slashes in the `server_url` parameter lead to problems in most setups, so \
             all trailing slashes were stripped. Use the `strip_trailing_slashes_from_url` \
             parameter to disable this feature or remove all trailing slashes in the \
             `server_url` to disable this warning.",
        )
        .with_attribute(ConfigField::StripTrailingSlashesFromUrl.attribute())
}

/// Schema of the provider configuration block.
pub fn provider_config_schema() -> Schema {
    Schema::v0()
        .with_description("Manage objects in a NetBox instance through its REST API.")
        .with_attribute(
            ConfigField::ServerUrl.attribute(),
            Attribute::required_string().with_description(format!(
                "Location of NetBox server including scheme (http or https) and optional port. \
                 Can be set via the `{}` environment variable.",
                SERVER_URL_ENV
            )),
        )
        .with_attribute(
            ConfigField::ApiToken.attribute(),
            Attribute::optional_string()
                .sensitive()
                .with_description(format!(
                    "NetBox API authentication token. Can be set via the `{}` environment \
                     variable.",
                    API_TOKEN_ENV
                )),
        )
        .with_attribute(
            ConfigField::StripTrailingSlashesFromUrl.attribute(),
            Attribute::optional_bool()
                .with_default(Value::Bool(true))
                .with_description(format!(
                    "If true, strip trailing slashes from the `server_url` parameter and print a \
                     warning when doing so. Note that using trailing slashes in the `server_url` \
                     parameter will usually lead to errors. Can be set via the `{}` environment \
                     variable. Defaults to `true`.",
                    STRIP_TRAILING_SLASHES_ENV
                )),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::unknown;
    use secrecy::ExposeSecret;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEnv {
        vars: HashMap<String, String>,
        lookups: AtomicUsize,
    }

    impl CountingEnv {
        fn empty() -> Self {
            Self {
                vars: HashMap::new(),
                lookups: AtomicUsize::new(0),
            }
        }
    }

    impl EnvLookup for CountingEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.vars.get(key).cloned()
        }
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn input(url: &str, token: &str) -> ConfigurationInput {
        ConfigurationInput {
            server_url: url.to_string().into(),
            api_token: token.to_string().into(),
            strip_trailing_slashes_from_url: ConfigValue::Null,
        }
    }

    #[test]
    fn test_unknown_values_short_circuit_without_env_lookup() {
        let input = ConfigurationInput {
            server_url: ConfigValue::Unknown,
            api_token: ConfigValue::Unknown,
            strip_trailing_slashes_from_url: ConfigValue::Null,
        };
        let env = CountingEnv::empty();

        let failures = resolve(&input, &env).unwrap_err();
        assert_eq!(
            failures,
            vec![
                ValidationFailure::unknown(ConfigField::ServerUrl),
                ValidationFailure::unknown(ConfigField::ApiToken),
            ]
        );
        assert_eq!(env.lookups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_all_unknown_values_are_accumulated() {
        let input = ConfigurationInput {
            server_url: ConfigValue::Unknown,
            api_token: ConfigValue::Unknown,
            strip_trailing_slashes_from_url: ConfigValue::Unknown,
        };
        let env = CountingEnv::empty();

        let failures = resolve(&input, &env).unwrap_err();
        assert_eq!(
            failures,
            vec![
                ValidationFailure::unknown(ConfigField::ServerUrl),
                ValidationFailure::unknown(ConfigField::ApiToken),
                ValidationFailure::unknown(ConfigField::StripTrailingSlashesFromUrl),
            ]
        );
        assert_eq!(env.lookups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unknown_strip_flag_is_reported() {
        let input = ConfigurationInput {
            strip_trailing_slashes_from_url: ConfigValue::Unknown,
            ..input("https://nb.example.com", "token")
        };
        let failures = resolve(&input, &env(&[])).unwrap_err();
        assert_eq!(
            failures,
            vec![ValidationFailure::unknown(
                ConfigField::StripTrailingSlashesFromUrl
            )]
        );
    }

    #[test]
    fn test_unknown_wins_over_missing() {
        let input = ConfigurationInput {
            server_url: ConfigValue::Unknown,
            ..Default::default()
        };
        let failures = resolve(&input, &env(&[])).unwrap_err();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, FailureKind::Unknown);
    }

    #[test]
    fn test_strips_trailing_slashes_with_one_advisory() {
        let resolution = resolve(&input("https://nb.example.com///", "token"), &env(&[])).unwrap();
        assert_eq!(resolution.config.server_url, "https://nb.example.com");
        assert!(resolution.config.strip_trailing_slashes_from_url);
        assert_eq!(resolution.advisories.len(), 1);
        assert!(!resolution.advisories[0].is_error());
        assert_eq!(
            resolution.advisories[0].attribute.as_deref(),
            Some("strip_trailing_slashes_from_url")
        );
    }

    #[test]
    fn test_clean_url_has_no_advisory() {
        let resolution = resolve(&input("https://nb.example.com", "token"), &env(&[])).unwrap();
        assert_eq!(resolution.config.server_url, "https://nb.example.com");
        assert!(resolution.advisories.is_empty());
    }

    #[test]
    fn test_env_false_preserves_trailing_slash() {
        let resolution = resolve(
            &input("https://nb.example.com/", "token"),
            &env(&[(STRIP_TRAILING_SLASHES_ENV, "false")]),
        )
        .unwrap();
        assert_eq!(resolution.config.server_url, "https://nb.example.com/");
        assert!(!resolution.config.strip_trailing_slashes_from_url);
        assert!(resolution.advisories.is_empty());
    }

    #[test]
    fn test_env_other_than_false_keeps_default() {
        for value in ["False", "0", "no", ""] {
            let resolution = resolve(
                &input("https://nb.example.com/", "token"),
                &env(&[(STRIP_TRAILING_SLASHES_ENV, value)]),
            )
            .unwrap();
            assert_eq!(resolution.config.server_url, "https://nb.example.com");
        }
    }

    #[test]
    fn test_explicit_strip_flag_overrides_env() {
        let input = ConfigurationInput {
            strip_trailing_slashes_from_url: true.into(),
            ..input("https://nb.example.com/", "token")
        };
        let resolution =
            resolve(&input, &env(&[(STRIP_TRAILING_SLASHES_ENV, "false")])).unwrap();
        assert_eq!(resolution.config.server_url, "https://nb.example.com");
        assert_eq!(resolution.advisories.len(), 1);
    }

    #[test]
    fn test_explicit_false_disables_stripping() {
        let input = ConfigurationInput {
            strip_trailing_slashes_from_url: false.into(),
            ..input("https://nb.example.com//", "token")
        };
        let resolution = resolve(&input, &env(&[])).unwrap();
        assert_eq!(resolution.config.server_url, "https://nb.example.com//");
    }

    #[test]
    fn test_env_fallbacks_and_explicit_override() {
        let vars = env(&[
            (SERVER_URL_ENV, "https://env.example.com"),
            (API_TOKEN_ENV, "env-token"),
        ]);

        let resolution = resolve(&ConfigurationInput::default(), &vars).unwrap();
        assert_eq!(resolution.config.server_url, "https://env.example.com");
        assert_eq!(resolution.config.api_token.expose_secret(), "env-token");

        let resolution = resolve(&input("https://cfg.example.com", "cfg-token"), &vars).unwrap();
        assert_eq!(resolution.config.server_url, "https://cfg.example.com");
        assert_eq!(resolution.config.api_token.expose_secret(), "cfg-token");
    }

    #[test]
    fn test_missing_values_are_accumulated() {
        let failures = resolve(&ConfigurationInput::default(), &env(&[])).unwrap_err();
        assert_eq!(
            failures,
            vec![
                ValidationFailure::missing(ConfigField::ServerUrl),
                ValidationFailure::missing(ConfigField::ApiToken),
            ]
        );
    }

    #[test]
    fn test_missing_api_token() {
        let input = ConfigurationInput {
            server_url: "https://nb.example.com".to_string().into(),
            ..Default::default()
        };
        let failures = resolve(&input, &env(&[(API_TOKEN_ENV, "")])).unwrap_err();
        assert_eq!(
            failures,
            vec![ValidationFailure::missing(ConfigField::ApiToken)]
        );
    }

    #[test]
    fn test_explicit_empty_overrides_env() {
        let vars = env(&[(API_TOKEN_ENV, "env-token")]);
        let failures = resolve(&input("https://nb.example.com", ""), &vars).unwrap_err();
        assert_eq!(
            failures,
            vec![ValidationFailure::missing(ConfigField::ApiToken)]
        );
    }

    #[test]
    fn test_all_slashes_url_resolves_to_empty() {
        let resolution = resolve(&input("///", "token"), &env(&[])).unwrap();
        assert_eq!(resolution.config.server_url, "");
        assert_eq!(resolution.advisories.len(), 1);
    }

    #[test]
    fn test_stripping_is_idempotent() {
        let (once, trimmed) = strip_trailing_slashes("https://nb.example.com/api//");
        assert!(trimmed);
        assert_eq!(once, "https://nb.example.com/api");

        let (twice, trimmed) = strip_trailing_slashes(once);
        assert!(!trimmed);
        assert_eq!(twice, once);

        let resolution = resolve(&input(once, "token"), &env(&[])).unwrap();
        assert!(resolution.advisories.is_empty());
    }

    #[test]
    fn test_resolved_debug_redacts_token() {
        let resolution = resolve(&input("https://nb.example.com", "s3cr3t"), &env(&[])).unwrap();
        let debug = format!("{:?}", resolution.config);
        assert!(!debug.contains("s3cr3t"));
    }

    #[test]
    fn test_failure_diagnostics() {
        let diag = ValidationFailure::unknown(ConfigField::ServerUrl).to_diagnostic();
        assert!(diag.is_error());
        assert_eq!(diag.summary, "Unknown NetBox Server URL");
        assert_eq!(diag.attribute.as_deref(), Some("server_url"));
        assert!(diag.detail.as_deref().unwrap().contains(SERVER_URL_ENV));

        let diag: Diagnostic = ValidationFailure::missing(ConfigField::ApiToken).into();
        assert_eq!(diag.summary, "Missing NetBox API Token");
        assert!(diag.detail.as_deref().unwrap().contains(API_TOKEN_ENV));
    }

    #[test]
    fn test_from_json() {
        let config = json!({
            "server_url": "https://nb.example.com",
            "api_token": unknown(),
        });
        let input = ConfigurationInput::from_json(&config).unwrap();
        assert_eq!(input.server_url.known().map(String::as_str), Some("https://nb.example.com"));
        assert!(input.api_token.is_unknown());
        assert!(input.strip_trailing_slashes_from_url.is_null());
    }

    #[test]
    fn test_from_json_reports_all_type_errors() {
        let config = json!({"server_url": 8080, "strip_trailing_slashes_from_url": "yes"});
        let diagnostics = ConfigurationInput::from_json(&config).unwrap_err();
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(Diagnostic::is_error));
    }

    #[test]
    fn test_provider_config_schema() {
        let schema = provider_config_schema();
        assert!(schema.attributes["server_url"].flags.required);
        assert!(schema.attributes["api_token"].flags.optional);
        assert!(schema.attributes["api_token"].flags.sensitive);
        assert_eq!(
            schema.attributes["strip_trailing_slashes_from_url"].default,
            Some(Value::Bool(true))
        );
    }
}
