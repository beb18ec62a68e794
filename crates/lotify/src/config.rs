//! Configuration management
//!
//! 設定は以下の優先順位で読み込まれます:
//! 1. 環境変数
//! 2. lotify.toml 設定ファイル
//! 3. デフォルト値
//!
//! 設定ファイル内では `${VAR_NAME}` 形式で環境変数を展開できます。

use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

use crate::error::{NotifyError, Result};

/// Default authorization server origin
pub const DEFAULT_BOT_ORIGIN: &str = "https://notify-bot.line.me";

/// Default API server origin
pub const DEFAULT_API_ORIGIN: &str = "https://notify-api.line.me";

/// Default config file looked up by [`ClientConfig::load`]
pub const DEFAULT_CONFIG_FILE: &str = "lotify.toml";

/// OAuth and endpoint configuration for [`crate::NotifyClient`]
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// OAuth client id issued by LINE Notify
    pub client_id: String,

    /// OAuth client secret
    #[serde(skip_serializing)]
    pub client_secret: String,

    /// Redirect URI registered for the service
    pub redirect_uri: String,

    /// Authorization server origin
    #[serde(default = "default_bot_origin")]
    pub bot_origin: String,

    /// API server origin
    #[serde(default = "default_api_origin")]
    pub api_origin: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Skip TLS certificate verification. Off unless explicitly enabled.
    #[serde(default)]
    pub allow_insecure_tls: bool,
}

// client_secret を含むため Debug は手書き
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("bot_origin", &self.bot_origin)
            .field("api_origin", &self.api_origin)
            .field("timeout_secs", &self.timeout_secs)
            .field("allow_insecure_tls", &self.allow_insecure_tls)
            .finish()
    }
}

fn default_bot_origin() -> String {
    DEFAULT_BOT_ORIGIN.to_string()
}

fn default_api_origin() -> String {
    DEFAULT_API_ORIGIN.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn normalize_origin(origin: &str) -> String {
    origin.trim_end_matches('/').to_string()
}

impl ClientConfig {
    /// Create a config with the default LINE Notify origins
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            bot_origin: default_bot_origin(),
            api_origin: default_api_origin(),
            timeout_secs: default_timeout_secs(),
            allow_insecure_tls: false,
        }
    }

    pub fn with_bot_origin(mut self, origin: impl AsRef<str>) -> Self {
        self.bot_origin = normalize_origin(origin.as_ref());
        self
    }

    pub fn with_api_origin(mut self, origin: impl AsRef<str>) -> Self {
        self.api_origin = normalize_origin(origin.as_ref());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Disable certificate verification. Only for test servers with self-signed certs.
    pub fn with_allow_insecure_tls(mut self, allow: bool) -> Self {
        self.allow_insecure_tls = allow;
        self
    }

    /// Check required fields and origin URLs
    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            return Err(NotifyError::Config("client_id is empty".to_string()));
        }
        if self.client_secret.is_empty() {
            return Err(NotifyError::Config("client_secret is empty".to_string()));
        }
        if self.redirect_uri.is_empty() {
            return Err(NotifyError::Config("redirect_uri is empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(NotifyError::Config("timeout_secs must be greater than 0".to_string()));
        }

        for (name, origin) in [("bot_origin", &self.bot_origin), ("api_origin", &self.api_origin)] {
            let url = Url::parse(origin)
                .map_err(|e| NotifyError::Config(format!("Invalid {}: {} ({})", name, origin, e)))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(NotifyError::Config(format!(
                    "{} must be an http or https URL: {}",
                    name, origin
                )));
            }
        }

        Ok(())
    }

    /// 設定ファイルから環境変数を展開する
    ///
    /// `${VAR_NAME}` 形式の文字列を環境変数の値に置換します。
    /// 環境変数が存在しない場合は空文字列になります。
    fn expand_env_vars<F>(value: &str, lookup: &F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // '{' を消費

                let mut var_name = String::new();
                while let Some(c) = chars.next() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Some(env_value) = lookup(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (environment in production)
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| NotifyError::Config(format!("{} not set", key)))
        };

        let mut config = Self::new(
            required("LINE_NOTIFY_CLIENT_ID")?,
            required("LINE_NOTIFY_CLIENT_SECRET")?,
            required("LINE_NOTIFY_REDIRECT_URI")?,
        );
        config.apply_overrides(&lookup)?;
        config.validate()?;

        Ok(config)
    }

    /// 環境変数で設定を上書きする
    fn apply_overrides<F>(&mut self, lookup: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(id) = lookup("LINE_NOTIFY_CLIENT_ID") {
            self.client_id = id;
        }
        if let Some(secret) = lookup("LINE_NOTIFY_CLIENT_SECRET") {
            self.client_secret = secret;
        }
        if let Some(uri) = lookup("LINE_NOTIFY_REDIRECT_URI") {
            self.redirect_uri = uri;
        }
        if let Some(origin) = lookup("LINE_NOTIFY_BOT_ORIGIN") {
            self.bot_origin = normalize_origin(&origin);
        }
        if let Some(origin) = lookup("LINE_NOTIFY_API_ORIGIN") {
            self.api_origin = normalize_origin(&origin);
        }
        if let Some(secs) = lookup("LINE_NOTIFY_TIMEOUT_SECS") {
            self.timeout_secs = secs.trim().parse().map_err(|_| {
                NotifyError::Config(format!("LINE_NOTIFY_TIMEOUT_SECS is not a number: {}", secs))
            })?;
        }
        if let Some(allow) = lookup("LINE_NOTIFY_ALLOW_INSECURE_TLS") {
            self.allow_insecure_tls = parse_bool("LINE_NOTIFY_ALLOW_INSECURE_TLS", &allow)?;
        }

        Ok(())
    }

    /// TOML 設定ファイルから設定を読み込む
    ///
    /// # 引数
    /// * `path` - TOML ファイルのパス
    ///
    /// # 環境変数展開
    /// 設定ファイル内の `${VAR_NAME}` は環境変数の値に置換されます。
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_toml_file_with(path, &|key: &str| std::env::var(key).ok())
    }

    /// `${VAR}` 展開と上書きに使う値を `lookup` から取得する
    fn from_toml_file_with<P, F>(path: P, lookup: &F) -> Result<Self>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let toml_content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| NotifyError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::from_toml_str(&Self::expand_env_vars(&toml_content, lookup))?;

        // 既存の環境変数で上書き（環境変数が優先）
        config.apply_overrides(lookup)?;
        config.validate()?;

        Ok(config)
    }

    /// Parse the `[line_notify]` table without env expansion or overrides
    fn from_toml_str(content: &str) -> Result<Self> {
        let file: TomlConfig = toml::from_str(content)
            .map_err(|e| NotifyError::Config(format!("Failed to parse TOML: {}", e)))?;

        let mut config = file.line_notify;
        config.bot_origin = normalize_origin(&config.bot_origin);
        config.api_origin = normalize_origin(&config.api_origin);
        Ok(config)
    }

    /// デフォルトパスから設定を読み込む
    ///
    /// `./lotify.toml` があればそれを使い、なければ環境変数のみから読み込みます。
    pub fn load() -> Result<Self> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }

        Self::from_env()
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(NotifyError::Config(format!("{} is not a boolean: {}", key, value))),
    }
}

/// TOML ファイル用のトップレベル構造
#[derive(Debug, Deserialize)]
struct TomlConfig {
    line_notify: ClientConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_new_uses_default_origins() {
        let config = ClientConfig::new("id", "secret", "https://example.com/callback");
        assert_eq!(config.bot_origin, DEFAULT_BOT_ORIGIN);
        assert_eq!(config.api_origin, DEFAULT_API_ORIGIN);
        assert_eq!(config.timeout_secs, 30);
        assert!(!config.allow_insecure_tls);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_origin_strips_trailing_slash() {
        let config = ClientConfig::new("id", "secret", "https://example.com/callback")
            .with_bot_origin("http://127.0.0.1:8080/")
            .with_api_origin("http://127.0.0.1:9090//");
        assert_eq!(config.bot_origin, "http://127.0.0.1:8080");
        assert_eq!(config.api_origin, "http://127.0.0.1:9090");
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        let config = ClientConfig::new("", "secret", "https://example.com/callback");
        assert!(matches!(config.validate(), Err(NotifyError::Config(_))));

        let config = ClientConfig::new("id", "", "https://example.com/callback");
        assert!(matches!(config.validate(), Err(NotifyError::Config(_))));

        let config = ClientConfig::new("id", "secret", "");
        assert!(matches!(config.validate(), Err(NotifyError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_origin() {
        let config = ClientConfig::new("id", "secret", "https://example.com/callback")
            .with_api_origin("ftp://notify-api.line.me");
        assert!(config.validate().is_err());

        let config = ClientConfig::new("id", "secret", "https://example.com/callback")
            .with_bot_origin("not a url");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = ClientConfig::new("id", "super-secret", "https://example.com/callback");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_from_lookup() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("LINE_NOTIFY_CLIENT_ID", "id"),
            ("LINE_NOTIFY_CLIENT_SECRET", "secret"),
            ("LINE_NOTIFY_REDIRECT_URI", "https://example.com/callback"),
            ("LINE_NOTIFY_API_ORIGIN", "http://localhost:3000/"),
            ("LINE_NOTIFY_TIMEOUT_SECS", "5"),
            ("LINE_NOTIFY_ALLOW_INSECURE_TLS", "true"),
        ]))
        .unwrap();

        assert_eq!(config.client_id, "id");
        assert_eq!(config.bot_origin, DEFAULT_BOT_ORIGIN);
        assert_eq!(config.api_origin, "http://localhost:3000");
        assert_eq!(config.timeout_secs, 5);
        assert!(config.allow_insecure_tls);
    }

    #[test]
    fn test_from_lookup_missing_required() {
        let result = ClientConfig::from_lookup(lookup_from(&[("LINE_NOTIFY_CLIENT_ID", "id")]));
        match result {
            Err(NotifyError::Config(msg)) => assert!(msg.contains("LINE_NOTIFY_CLIENT_SECRET")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_from_toml_str() {
        let config = ClientConfig::from_toml_str(
            r#"
            [line_notify]
            client_id = "id"
            client_secret = "secret"
            redirect_uri = "https://example.com/callback"
            api_origin = "http://localhost:3000/"
            "#,
        )
        .unwrap();

        assert_eq!(config.client_secret, "secret");
        assert_eq!(config.bot_origin, DEFAULT_BOT_ORIGIN);
        assert_eq!(config.api_origin, "http://localhost:3000");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_from_toml_str_missing_table() {
        assert!(ClientConfig::from_toml_str("[other]\nkey = 1\n").is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = ClientConfig::new("id", "secret", "https://example.com/callback")
            .with_timeout_secs(0);
        match config.validate() {
            Err(NotifyError::Config(msg)) => assert!(msg.contains("timeout_secs")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_from_lookup_rejects_zero_timeout() {
        let result = ClientConfig::from_lookup(lookup_from(&[
            ("LINE_NOTIFY_CLIENT_ID", "id"),
            ("LINE_NOTIFY_CLIENT_SECRET", "secret"),
            ("LINE_NOTIFY_REDIRECT_URI", "https://example.com/callback"),
            ("LINE_NOTIFY_TIMEOUT_SECS", "0"),
        ]));
        assert!(matches!(result, Err(NotifyError::Config(_))));
    }

    #[test]
    fn test_from_lookup_rejects_malformed_timeout() {
        let result = ClientConfig::from_lookup(lookup_from(&[
            ("LINE_NOTIFY_CLIENT_ID", "id"),
            ("LINE_NOTIFY_CLIENT_SECRET", "secret"),
            ("LINE_NOTIFY_REDIRECT_URI", "https://example.com/callback"),
            ("LINE_NOTIFY_TIMEOUT_SECS", "abc"),
        ]));
        match result {
            Err(NotifyError::Config(msg)) => assert!(msg.contains("LINE_NOTIFY_TIMEOUT_SECS")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_from_lookup_rejects_malformed_bool() {
        let result = ClientConfig::from_lookup(lookup_from(&[
            ("LINE_NOTIFY_CLIENT_ID", "id"),
            ("LINE_NOTIFY_CLIENT_SECRET", "secret"),
            ("LINE_NOTIFY_REDIRECT_URI", "https://example.com/callback"),
            ("LINE_NOTIFY_ALLOW_INSECURE_TLS", "maybe"),
        ]));
        match result {
            Err(NotifyError::Config(msg)) => assert!(msg.contains("LINE_NOTIFY_ALLOW_INSECURE_TLS")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("K", "TRUE").unwrap());
        assert!(parse_bool("K", " on ").unwrap());
        assert!(!parse_bool("K", "0").unwrap());
        assert!(!parse_bool("K", "off").unwrap());
        assert!(parse_bool("K", "").is_err());
    }

    #[test]
    fn test_expand_env_vars() {
        let lookup = lookup_from(&[("SECRET", "s3cr3t")]);
        assert_eq!(ClientConfig::expand_env_vars("a${SECRET}b", &lookup), "as3cr3tb");
        assert_eq!(ClientConfig::expand_env_vars("a${MISSING}b", &lookup), "ab");
        assert_eq!(ClientConfig::expand_env_vars("plain $text", &lookup), "plain $text");
    }

    fn write_toml(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_from_toml_file_with() {
        let file = write_toml(
            r#"[line_notify]
client_id = "file-id"
client_secret = "file-${SECRET_PART}"
redirect_uri = "https://example.com/callback"
timeout_secs = 10
"#,
        );

        let lookup = lookup_from(&[("SECRET_PART", "secret")]);
        let config = ClientConfig::from_toml_file_with(file.path(), &lookup).unwrap();
        assert_eq!(config.client_id, "file-id");
        assert_eq!(config.client_secret, "file-secret");
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_from_toml_file_with_overrides() {
        let file = write_toml(
            r#"[line_notify]
client_id = "file-id"
client_secret = "file-secret"
redirect_uri = "https://example.com/callback"
"#,
        );

        let lookup = lookup_from(&[
            ("LINE_NOTIFY_CLIENT_ID", "env-id"),
            ("LINE_NOTIFY_TIMEOUT_SECS", "7"),
        ]);
        let config = ClientConfig::from_toml_file_with(file.path(), &lookup).unwrap();
        assert_eq!(config.client_id, "env-id");
        assert_eq!(config.client_secret, "file-secret");
        assert_eq!(config.timeout_secs, 7);
    }

    #[test]
    fn test_from_toml_file_with_zero_timeout() {
        let file = write_toml(
            r#"[line_notify]
client_id = "file-id"
client_secret = "file-secret"
redirect_uri = "https://example.com/callback"
timeout_secs = 0
"#,
        );

        let result = ClientConfig::from_toml_file_with(file.path(), &lookup_from(&[]));
        assert!(matches!(result, Err(NotifyError::Config(_))));
    }

    #[test]
    fn test_from_toml_file_not_found() {
        let result = ClientConfig::from_toml_file("/nonexistent/lotify.toml");
        assert!(matches!(result, Err(NotifyError::Config(_))));
    }
}
