use std::env;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DATABASE: &str = "client_desk";
const DEFAULT_UPLOADS_DIR: &str = "uploads";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Outbound mail settings. Only present when SMTP credentials are configured.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
    /// Fixed recipient of every expiry notice.
    pub recipient: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub mongo_uri: String,
    pub database_name: String,
    pub uploads_dir: PathBuf,
    /// Prefix recorded in a stored file's `path`, e.g. `client-desk/uploads`.
    pub upload_path_prefix: String,
    pub max_upload_bytes: usize,
    pub cors_origin: Option<String>,
    pub bcrypt_cost: u32,
    pub mail: Option<MailConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let root_name = env::current_dir()
            .ok()
            .and_then(|dir| dir.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_default();
        Self::from_lookup(|key| env::var(key).ok(), &root_name)
    }

    /// Builds the config from an arbitrary key lookup. `root_name` is the name
    /// of the directory the server runs from.
    pub fn from_lookup<F>(lookup: F, root_name: &str) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mongo_uri = lookup("MONGO_URI").ok_or(ConfigError::Missing("MONGO_URI"))?;

        let mail = match (lookup("SMTP_USER"), lookup("SMTP_PASSWORD")) {
            (Some(username), Some(password)) => Some(MailConfig {
                smtp_host: lookup("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                smtp_port: parse_or(&lookup, "SMTP_PORT", DEFAULT_SMTP_PORT)?,
                from_address: lookup("MAIL_FROM").unwrap_or_else(|| username.clone()),
                recipient: lookup("EXPIRY_NOTIFY_TO").unwrap_or_else(|| username.clone()),
                username,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            mongo_uri,
            database_name: lookup("DATABASE_NAME").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            uploads_dir: PathBuf::from(
                lookup("UPLOADS_DIR").unwrap_or_else(|| DEFAULT_UPLOADS_DIR.to_string()),
            ),
            upload_path_prefix: format!("{}/uploads", root_name),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            cors_origin: lookup("CORS_ORIGIN"),
            bcrypt_cost: parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            mail,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned(), "agency-api")
    }

    #[test]
    fn defaults_apply_when_only_mongo_uri_is_set() {
        let config = load(&[("MONGO_URI", "mongodb://localhost:27017")]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.database_name, "client_desk");
        assert_eq!(config.uploads_dir, PathBuf::from("uploads"));
        assert_eq!(config.upload_path_prefix, "agency-api/uploads");
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert!(config.mail.is_none());
        assert!(config.cors_origin.is_none());
    }

    #[test]
    fn missing_mongo_uri_is_an_error() {
        let err = load(&[("PORT", "8080")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("MONGO_URI")));
    }

    #[test]
    fn invalid_port_is_reported() {
        let err = load(&[("MONGO_URI", "mongodb://db"), ("PORT", "eighty")]).unwrap_err();
        assert_eq!(err.to_string(), "PORT has an invalid value: \"eighty\"");
    }

    #[test]
    fn mail_recipient_falls_back_to_smtp_user() {
        let config = load(&[
            ("MONGO_URI", "mongodb://db"),
            ("SMTP_USER", "ops@agency.test"),
            ("SMTP_PASSWORD", "app-password"),
        ])
        .unwrap();
        let mail = config.mail.unwrap();
        assert_eq!(mail.smtp_host, "smtp.gmail.com");
        assert_eq!(mail.smtp_port, 587);
        assert_eq!(mail.from_address, "ops@agency.test");
        assert_eq!(mail.recipient, "ops@agency.test");
    }

    #[test]
    fn explicit_recipient_wins() {
        let config = load(&[
            ("MONGO_URI", "mongodb://db"),
            ("SMTP_USER", "ops@agency.test"),
            ("SMTP_PASSWORD", "app-password"),
            ("EXPIRY_NOTIFY_TO", "renewals@agency.test"),
        ])
        .unwrap();
        assert_eq!(config.mail.unwrap().recipient, "renewals@agency.test");
    }
}
