use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::error::Error;

/// How to reach the car, and how loudly to log while doing so.
///
/// The serial parameters themselves are fixed and not part of this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The port identifier, resolved to a device path for the running platform.
    /// A number on Linux and Windows, the paired device name on macOS.
    pub port: Option<String>,

    /// An explicit device path.
    /// Takes precedence over `port`.
    pub device: Option<String>,

    /// Level for logging to stdout.
    /// One of "trace", "debug", "info", "warn", "error".
    pub log_level: String,

    /// If set, also log to daily rotated files in this directory.
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: None,
            device: None,
            log_level: "info".into(),
            log_dir: None,
        }
    }
}

impl Config {
    fn ron() -> ron::Options {
        ron::Options::default()
            .with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
            .with_default_extension(ron::extensions::Extensions::UNWRAP_NEWTYPES)
    }

    /// Deserialize a .ron file's contents.
    pub fn deserialize(input: &str) -> Result<Self, Error> {
        Self::ron()
            .from_str::<Config>(input)
            .map_err(|e| Error::BadConfig(format!("Not a valid config: {e}")))
    }

    /// An example configuration with some fields filled in.
    pub fn example() -> Self {
        Self {
            port: Some("0".into()),
            device: None,
            log_level: "debug".into(),
            log_dir: Some(PathBuf::from("logs")),
        }
    }

    /// Serialize the configuration in a "pretty" (i.e. non-compact) fashion.
    pub fn serialize_pretty(&self) -> Result<String, Error> {
        Self::ron()
            .to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| Error::BadConfig(e.to_string()))
    }

    /// Setup a new configuration from a RON file.
    /// Not validated, since the command line may fill in the blanks.
    pub fn new_from_path<P: AsRef<Path>>(p: P) -> Result<Self, Error> {
        let p = p.as_ref();
        let s = std::fs::read_to_string(p)
            .map_err(|e| Error::BadConfig(format!("Could not read {p:?}: {e}")))?;

        Self::deserialize(&s)
    }

    /// The stdout log level.
    pub fn level(&self) -> Result<Level, Error> {
        self.log_level
            .parse()
            .map_err(|_| Error::BadConfig(format!("`{}` is not a log level", self.log_level)))
    }

    fn check_target(&self) -> Result<(), Error> {
        let non_empty = |s: &Option<String>| s.as_deref().is_some_and(|s| !s.trim().is_empty());

        if non_empty(&self.port) || non_empty(&self.device) {
            Ok(())
        } else {
            Err(Error::BadConfig(
                "Neither a port nor a device is given, so there is nothing to connect to.".into(),
            ))
        }
    }

    /// Check the config makes sense.
    pub fn validate(&self) -> Result<(), Error> {
        self.check_target()?;
        self.level()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn example_round_trips() {
        let c = Config::example();
        let serialized = c.serialize_pretty().unwrap();

        assert_eq!(Config::deserialize(&serialized).unwrap(), c);
    }

    #[test]
    fn deserialize() {
        let input = r#"
(
    port: "3",
    log_level: "trace",
)
"#;
        let config = Config::deserialize(input).unwrap();

        assert_eq!(config.port.as_deref(), Some("3"));
        assert_eq!(config.device, None);
        assert_eq!(config.level().unwrap(), Level::TRACE);
        config.validate().unwrap();
    }

    #[test]
    fn device_alone_is_enough() {
        let config = Config::deserialize(r#"(device: "/dev/ttyUSB0")"#).unwrap();

        config.validate().unwrap();
    }

    #[test]
    fn bad_config_no_target() {
        let c = Config {
            port: Some("  ".into()),
            ..Default::default()
        };

        let err = c.validate().unwrap_err().try_into_bad_config().unwrap();

        assert!(err.contains("nothing to connect to"));
    }

    #[test]
    fn bad_config_level() {
        let c = Config {
            port: Some("1".into()),
            log_level: "loud".into(),
            ..Default::default()
        };

        let err = c.validate().unwrap_err().try_into_bad_config().unwrap();

        assert!(err.contains("loud"));
    }

    #[test]
    fn not_ron() {
        let err = Config::deserialize("port = 3").unwrap_err();

        assert!(matches!(err, Error::BadConfig(_)));
    }
}
