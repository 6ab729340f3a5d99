use acgate_types::{GateError, SESSION_HEADER};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which upstream call shape the credential exchanger uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityVariant {
    /// The identity provider's `InitiateAuth` API with `USER_PASSWORD_AUTH`.
    #[default]
    Native,
    /// An OAuth2 token endpoint accepting `grant_type=password`.
    #[serde(alias = "oauth")]
    Oauth2,
}

/// Which token from the provider result is handed back to the caller.
///
/// The other token is used as a fallback when the preferred one is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenField {
    /// Carries the `client_id` claim checked by JWT authorizers.
    #[default]
    Access,
    Id,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Identity-provider settings for the credential exchanger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub variant: IdentityVariant,
    /// App client identifier registered with the provider.
    #[serde(default)]
    pub client_id: Option<String>,
    /// Shared secret for confidential clients. Never serialized.
    #[serde(skip_serializing, default)]
    pub client_secret: Option<SecretString>,
    /// Provider region, used to derive the native endpoint.
    #[serde(default = "default_region")]
    pub region: String,
    /// Hosted domain serving `/oauth2/token` (OAuth2 variant).
    #[serde(default)]
    pub domain: Option<String>,
    /// Full URL override for the outbound identity call (either variant).
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub token_field: TokenField,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            variant: IdentityVariant::default(),
            client_id: None,
            client_secret: None,
            region: default_region(),
            domain: None,
            endpoint: None,
            token_field: TokenField::default(),
        }
    }
}

impl IdentityConfig {
    /// The configured client id.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Config`] if it is missing or blank.
    pub fn client_id(&self) -> Result<&str, GateError> {
        self.client_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| GateError::Config("missing identity.client_id".into()))
    }

    /// The client secret, if one is configured and non-empty.
    #[must_use]
    pub fn client_secret(&self) -> Option<&SecretString> {
        self.client_secret
            .as_ref()
            .filter(|s| !s.expose_secret().is_empty())
    }

    /// URL of the native `InitiateAuth` endpoint.
    #[must_use]
    pub fn native_endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("https://cognito-idp.{}.amazonaws.com/", self.region))
    }

    /// URL of the OAuth2 token endpoint, `https://{domain}/oauth2/token`.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Config`] if neither `endpoint` nor `domain` is set.
    pub fn oauth2_token_url(&self) -> Result<String, GateError> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.clone());
        }
        let domain = self
            .domain
            .as_deref()
            .map(|d| d.trim().trim_end_matches('/'))
            .filter(|d| !d.is_empty())
            .ok_or_else(|| GateError::Config("missing identity.domain".into()))?;
        if domain.starts_with("http://") || domain.starts_with("https://") {
            Ok(format!("{domain}/oauth2/token"))
        } else {
            Ok(format!("https://{domain}/oauth2/token"))
        }
    }

    /// Check that every setting the selected variant needs is present.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Config`] naming the first missing setting.
    pub fn validate(&self) -> Result<(), GateError> {
        self.client_id()?;
        if self.variant == IdentityVariant::Oauth2 {
            if self.client_secret().is_none() {
                return Err(GateError::Config(
                    "missing identity.client_secret (required by the oauth2 variant)".into(),
                ));
            }
            self.oauth2_token_url()?;
        }
        Ok(())
    }
}

fn default_runtime_url() -> String {
    "http://localhost:9001/invocations".to_string()
}
fn default_session_header() -> String {
    SESSION_HEADER.to_string()
}

/// Agent-runtime invocation target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_runtime_url")]
    pub url: String,
    /// Session-continuity header name forwarded to the runtime.
    #[serde(default = "default_session_header")]
    pub session_header: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            url: default_runtime_url(),
            session_header: default_session_header(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    10
}
fn default_read_timeout() -> u64 {
    300
}
fn default_auth_timeout() -> u64 {
    30
}

/// Outbound HTTP client timeouts, in seconds. Zero disables a timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Maximum idle time between upstream body chunks on the invoke path.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Whole-request timeout for identity-provider calls.
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            auth_timeout_secs: default_auth_timeout(),
        }
    }
}

fn non_zero(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl HttpConfig {
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        non_zero(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn read_timeout(&self) -> Option<Duration> {
        non_zero(self.read_timeout_secs)
    }

    #[must_use]
    pub fn auth_timeout(&self) -> Option<Duration> {
        non_zero(self.auth_timeout_secs)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Logging configuration. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_port() -> u16 {
    8019
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listen port (defaults to 8019).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Listen address (defaults to `127.0.0.1`).
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            identity: IdentityConfig::default(),
            runtime: RuntimeConfig::default(),
            http: HttpConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Environment variables understood for compatibility with existing
/// deployments, and the config key each one sets.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("COGNITO_CLIENT_ID", "identity.client_id"),
    ("COGNITO_CLIENT_SECRET", "identity.client_secret"),
    ("COGNITO_REGION", "identity.region"),
    ("AGENTCORE_URL", "runtime.url"),
];

impl Config {
    /// Parses configuration from a YAML string, merged with defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the YAML is invalid or extraction fails.
    #[allow(clippy::result_large_err)]
    pub fn from_yaml(yaml: &str) -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Format as _, Serialized, Yaml},
        };
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::string(yaml))
            .extract()
    }

    /// Loads configuration from defaults, an optional YAML file, and the
    /// environment, in increasing order of precedence.
    ///
    /// Environment sources, lowest first: `AWS_REGION`, the legacy
    /// `COGNITO_*` / `AGENTCORE_URL` variables, then `ACGATE_*` with `__`
    /// separating nested keys (e.g. `ACGATE_IDENTITY__CLIENT_ID`).
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the file is missing or cannot be
    /// parsed, or if a value has the wrong type.
    #[allow(clippy::result_large_err)]
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Env, Format as _, Serialized, Yaml},
        };
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            if !path.exists() {
                return Err(figment::Error::from(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Yaml::file(path));
        }
        let legacy_keys: Vec<&str> = LEGACY_ENV.iter().map(|(env, _)| *env).collect();
        figment
            .merge(
                Env::raw()
                    .only(&["AWS_REGION"])
                    .map(|_| "identity.region".into()),
            )
            .merge(Env::raw().only(&legacy_keys).map(|key| {
                LEGACY_ENV
                    .iter()
                    .find(|(env, _)| key == *env)
                    .map_or_else(|| key.into(), |(_, path)| (*path).into())
            }))
            .merge(Env::prefixed("ACGATE_").split("__"))
            .extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret as _;

    const SAMPLE_YAML: &str = r#"
port: 9000
host: "0.0.0.0"
identity:
  variant: oauth2
  client_id: "app-client"
  client_secret: "s3cret"
  domain: "auth.example.com"
  token_field: id
runtime:
  url: "https://runtime.example.com/invocations"
http:
  read_timeout_secs: 0
log:
  format: json
"#;

    #[test]
    fn test_default_config() {
        let c = Config::default();
        assert_eq!(c.port, 8019);
        assert_eq!(c.host, "127.0.0.1");
        assert_eq!(c.identity.variant, IdentityVariant::Native);
        assert_eq!(c.identity.region, "us-east-1");
        assert_eq!(c.identity.token_field, TokenField::Access);
        assert_eq!(c.runtime.url, "http://localhost:9001/invocations");
        assert_eq!(c.runtime.session_header, SESSION_HEADER);
        assert_eq!(c.http.connect_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(c.log.format, LogFormat::Text);
    }

    #[test]
    fn test_from_yaml_sections() {
        let c = Config::from_yaml(SAMPLE_YAML).unwrap();
        assert_eq!(c.port, 9000);
        assert_eq!(c.host, "0.0.0.0");
        assert_eq!(c.identity.variant, IdentityVariant::Oauth2);
        assert_eq!(c.identity.client_id.as_deref(), Some("app-client"));
        assert_eq!(
            c.identity.client_secret().map(|s| s.expose_secret().to_string()),
            Some("s3cret".to_string())
        );
        assert_eq!(c.identity.token_field, TokenField::Id);
        assert_eq!(c.runtime.url, "https://runtime.example.com/invocations");
        assert_eq!(c.http.read_timeout(), None);
        assert_eq!(c.log.format, LogFormat::Json);
    }

    #[test]
    fn test_from_yaml_defaults_applied() {
        let c = Config::from_yaml("port: 1234").unwrap();
        assert_eq!(c.port, 1234);
        assert_eq!(c.host, "127.0.0.1");
        assert_eq!(c.http.auth_timeout_secs, 30);
    }

    #[test]
    fn test_secret_not_serialized() {
        let c = Config::from_yaml(SAMPLE_YAML).unwrap();
        let json = serde_json::to_string(&c).unwrap();
        assert!(!json.contains("s3cret"));
    }

    #[test]
    fn test_secret_redacted_in_debug() {
        let c = Config::from_yaml(SAMPLE_YAML).unwrap();
        assert!(!format!("{c:?}").contains("s3cret"));
    }

    #[test]
    fn test_validate_missing_client_id() {
        let err = IdentityConfig::default().validate().unwrap_err();
        assert!(matches!(err, GateError::Config(msg) if msg.contains("client_id")));
    }

    #[test]
    fn test_validate_blank_client_id() {
        let cfg = IdentityConfig {
            client_id: Some("   ".into()),
            ..IdentityConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_native_without_secret_ok() {
        let cfg = IdentityConfig {
            client_id: Some("abc".into()),
            ..IdentityConfig::default()
        };
        assert!(cfg.validate().is_ok());
        assert!(cfg.client_secret().is_none());
    }

    #[test]
    fn test_validate_oauth2_requires_secret_and_domain() {
        let mut cfg = IdentityConfig {
            variant: IdentityVariant::Oauth2,
            client_id: Some("abc".into()),
            ..IdentityConfig::default()
        };
        assert!(cfg.validate().is_err());
        cfg.client_secret = Some(SecretString::from("x".to_string()));
        assert!(cfg.validate().is_err());
        cfg.domain = Some("auth.example.com".into());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_empty_secret_treated_as_absent() {
        let cfg = IdentityConfig {
            client_secret: Some(SecretString::from(String::new())),
            ..IdentityConfig::default()
        };
        assert!(cfg.client_secret().is_none());
    }

    #[test]
    fn test_native_endpoint_from_region() {
        let cfg = IdentityConfig {
            region: "eu-west-1".into(),
            ..IdentityConfig::default()
        };
        assert_eq!(
            cfg.native_endpoint(),
            "https://cognito-idp.eu-west-1.amazonaws.com/"
        );
    }

    #[test]
    fn test_endpoint_override() {
        let cfg = IdentityConfig {
            endpoint: Some("http://127.0.0.1:4000/".into()),
            domain: Some("ignored.example.com".into()),
            ..IdentityConfig::default()
        };
        assert_eq!(cfg.native_endpoint(), "http://127.0.0.1:4000/");
        assert_eq!(cfg.oauth2_token_url().unwrap(), "http://127.0.0.1:4000/");
    }

    #[test]
    fn test_oauth2_token_url_from_domain() {
        let mut cfg = IdentityConfig {
            domain: Some("auth.example.com/".into()),
            ..IdentityConfig::default()
        };
        assert_eq!(
            cfg.oauth2_token_url().unwrap(),
            "https://auth.example.com/oauth2/token"
        );
        cfg.domain = Some("http://localhost:4000".into());
        assert_eq!(
            cfg.oauth2_token_url().unwrap(),
            "http://localhost:4000/oauth2/token"
        );
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write as _;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"port: 7100\nruntime:\n  url: http://rt:9001/invocations\n")
            .unwrap();
        figment::Jail::expect_with(|_| {
            let c = Config::load(Some(file.path()))?;
            assert_eq!(c.port, 7100);
            assert_eq!(c.runtime.url, "http://rt:9001/invocations");
            Ok(())
        });
    }

    #[test]
    fn test_load_missing_file_is_error() {
        figment::Jail::expect_with(|_| {
            assert!(Config::load(Some(std::path::Path::new("/nonexistent/acgate.yaml"))).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_load_legacy_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("COGNITO_CLIENT_ID", "legacy-client");
            jail.set_env("COGNITO_CLIENT_SECRET", "legacy-secret");
            jail.set_env("AWS_REGION", "ap-south-1");
            jail.set_env("AGENTCORE_URL", "http://agent:9001/invocations");
            let c = Config::load(None)?;
            assert_eq!(c.identity.client_id.as_deref(), Some("legacy-client"));
            assert!(c.identity.client_secret().is_some());
            assert_eq!(c.identity.region, "ap-south-1");
            assert_eq!(c.runtime.url, "http://agent:9001/invocations");
            Ok(())
        });
    }

    #[test]
    fn test_cognito_region_beats_aws_region() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("AWS_REGION", "ap-south-1");
            jail.set_env("COGNITO_REGION", "eu-central-1");
            let c = Config::load(None)?;
            assert_eq!(c.identity.region, "eu-central-1");
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_env_wins() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("COGNITO_CLIENT_ID", "legacy-client");
            jail.set_env("ACGATE_IDENTITY__CLIENT_ID", "new-client");
            jail.set_env("ACGATE_PORT", "9100");
            let c = Config::load(None)?;
            assert_eq!(c.identity.client_id.as_deref(), Some("new-client"));
            assert_eq!(c.port, 9100);
            Ok(())
        });
    }
}
