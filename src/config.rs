use std::{
    collections::HashMap,
    fs::{self, File},
    io::prelude::*,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

/// Top-level configuration for the application, loaded from a TOML file.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MirageConfig {
    /// Socket address to bind to, e.g. "0.0.0.0:25565".
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Host of the real server whose status is relayed.
    #[serde(default = "default_upstream_host")]
    pub upstream_host: String,

    #[serde(default = "default_upstream_port")]
    pub upstream_port: u16,

    /// Protocol version advertised in the upstream handshake.
    #[serde(default = "default_protocol_version")]
    pub protocol_version: u32,

    /// File holding the JSON chat component sent on login.
    #[serde(default = "default_message_path")]
    pub message_path: PathBuf,

    /// Chat component used when `message_path` cannot be read.
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,

    /// Server list description shown when the upstream cannot be reached.
    #[serde(default = "default_unavailable_motd")]
    pub unavailable_motd: String,

    /// Maximum concurrent downstream connections.
    #[serde(default = "default_max_conn")]
    pub max_conn: u32,

    /// Packets buffered between a connection's reader and handler.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Seconds a client may stay silent before it is dropped.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,

    /// Seconds allowed for the whole upstream status round trip.
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout: u64,

    #[serde(flatten)]
    pub other_fields: HashMap<String, toml::Value>,
}

fn default_bind() -> String {
    "0.0.0.0:25565".to_string()
}

fn default_upstream_host() -> String {
    "mc.hypixel.net".to_string()
}

fn default_upstream_port() -> u16 {
    25565
}

fn default_protocol_version() -> u32 {
    754
}

fn default_message_path() -> PathBuf {
    PathBuf::from("message.json")
}

fn default_fallback_message() -> String {
    r#"{"text":"Disconnected"}"#.to_string()
}

fn default_unavailable_motd() -> String {
    "Server unavailable".to_string()
}

fn default_max_conn() -> u32 {
    65535
}

fn default_queue_capacity() -> usize {
    8
}

fn default_idle_timeout() -> u64 {
    10
}

fn default_upstream_timeout() -> u64 {
    3
}

impl Default for MirageConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            upstream_host: default_upstream_host(),
            upstream_port: default_upstream_port(),
            protocol_version: default_protocol_version(),
            message_path: default_message_path(),
            fallback_message: default_fallback_message(),
            unavailable_motd: default_unavailable_motd(),
            max_conn: default_max_conn(),
            queue_capacity: default_queue_capacity(),
            idle_timeout: default_idle_timeout(),
            upstream_timeout: default_upstream_timeout(),
            other_fields: HashMap::new(),
        }
    }
}

impl MirageConfig {
    pub fn load(path: &Path) -> Result<Self, MirageConfigLoadError> {
        let raw = fs::read_to_string(path).map_err(MirageConfigLoadError::Io)?;
        let config: Self = toml::from_str(&raw).map_err(MirageConfigLoadError::Parse)?;

        for field in &config.other_fields {
            log::warn!(
                "Unknown configuration '{}' with value {:?}",
                field.0,
                field.1
            );
        }

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let config_str = toml::to_string(&self)?;
        let mut file = File::create(path)?;
        file.write_all(config_str.as_bytes())?;
        Ok(())
    }

    /// Apply `MIRAGE_BIND` and `MIRAGE_UPSTREAM` (`host` or `host:port`).
    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Ok(bind) = dotenvy::var("MIRAGE_BIND") {
            self.bind = bind;
        }
        if let Ok(upstream) = dotenvy::var("MIRAGE_UPSTREAM") {
            self.set_upstream(&upstream)?;
        }
        Ok(())
    }

    fn set_upstream(&mut self, spec: &str) -> anyhow::Result<()> {
        let spec = spec.trim();
        match spec.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse()
                    .map_err(|err| anyhow::anyhow!("invalid upstream port in '{spec}': {err}"))?;
                self.upstream_host = host.to_string();
                self.upstream_port = port;
            }
            None => self.upstream_host = spec.to_string(),
        }
        if self.upstream_host.is_empty() {
            anyhow::bail!("upstream host is empty");
        }
        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MirageConfigLoadError {
    #[error("Could not open config")]
    Io(#[from] std::io::Error),
    #[error("Could not parse")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: MirageConfig = toml::from_str("").unwrap();
        assert_eq!(config.bind, "0.0.0.0:25565");
        assert_eq!(config.upstream_host, "mc.hypixel.net");
        assert_eq!(config.upstream_port, 25565);
        assert_eq!(config.protocol_version, 754);
        assert_eq!(config.queue_capacity, 8);
        assert!(config.other_fields.is_empty());
    }

    #[test]
    fn unknown_keys_are_collected() {
        let config: MirageConfig = toml::from_str("bind = \"127.0.0.1:1\"\nfoo = 3\n").unwrap();
        assert_eq!(config.bind, "127.0.0.1:1");
        assert!(config.other_fields.contains_key("foo"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let mut config = MirageConfig::default();
        config.upstream_host = "play.example.org".to_string();
        config.save(&path).unwrap();

        let loaded = MirageConfig::load(&path).unwrap();
        assert_eq!(loaded.upstream_host, "play.example.org");
        assert_eq!(loaded.idle_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = MirageConfig::load(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(MirageConfigLoadError::Io(_))));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "bind = [").unwrap();
        assert!(matches!(
            MirageConfig::load(&path),
            Err(MirageConfigLoadError::Parse(_))
        ));
    }

    #[test]
    fn upstream_spec_parsing() {
        let mut config = MirageConfig::default();
        config.set_upstream("127.0.0.1:25570").unwrap();
        assert_eq!(config.upstream_host, "127.0.0.1");
        assert_eq!(config.upstream_port, 25570);

        config.set_upstream("hub.example.net").unwrap();
        assert_eq!(config.upstream_host, "hub.example.net");
        assert_eq!(config.upstream_port, 25570);

        assert!(config.set_upstream("host:notaport").is_err());
        assert!(config.set_upstream(":25565").is_err());
    }
}
