use std::{
    fmt::Display,
    fs, io,
    path::Path,
    str::FromStr,
    time::Duration,
};

use elvis_irq::{IrqChannel, Trigger, WaitConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default)]
    pub irq: Irq,
    #[serde(default)]
    pub demo: Demo,
    pub button: Option<Button>,
    pub timer: Option<Timer>,
    pub di: Option<Di>,
    pub ai: Option<Ai>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Irq {
    /// Upper bound of one blocking wait, in milliseconds.
    pub wait_slice_ms: u64,
}

impl Default for Irq {
    fn default() -> Self {
        Self { wait_slice_ms: 100 }
    }
}

impl Irq {
    pub fn wait_config(&self) -> WaitConfig {
        WaitConfig {
            slice: Duration::from_millis(self.wait_slice_ms.max(1)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Demo {
    pub duration_secs: u64,
    pub print_step_secs: u64,
    /// Period of the simulated input that drives the IRQ line.
    pub stimulus_ms: u64,
}

impl Default for Demo {
    fn default() -> Self {
        Self {
            duration_secs: 60,
            print_step_secs: 3,
            stimulus_ms: 700,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub irq: u8,
    pub count: u32,
    pub trigger: Trigger,
}

impl Default for Button {
    fn default() -> Self {
        Self {
            irq: 3,
            count: 1,
            trigger: Trigger::Rising,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    pub timeout_us: u32,
}

impl Default for Timer {
    fn default() -> Self {
        Self {
            timeout_us: 5_000_000,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Di {
    pub channel: IrqChannel,
    pub irq: u8,
    pub count: u32,
    pub trigger: Trigger,
}

impl Default for Di {
    fn default() -> Self {
        Self {
            channel: IrqChannel::DioA0,
            irq: 2,
            count: 2,
            trigger: Trigger::Rising,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Ai {
    pub channel: IrqChannel,
    pub irq: u8,
    /// Raw fixed-point threshold word.
    pub threshold: u32,
    pub hysteresis: u32,
    pub trigger: Trigger,
}

impl Default for Ai {
    fn default() -> Self {
        Self {
            channel: IrqChannel::AiA0,
            irq: 1,
            threshold: 0x4000,
            hysteresis: 0x0014,
            trigger: Trigger::Rising,
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            irq: Default::default(),
            demo: Default::default(),
            button: Some(Button::default()),
            timer: Some(Timer::default()),
            di: Some(Di::default()),
            ai: Some(Ai::default()),
        }
    }
}

impl ProjectConfig {
    /// Reads `path`, first writing the default configuration there if the
    /// file does not exist yet.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            fs::write(path, Self::default().to_string())?;
        }
        let content = fs::read_to_string(path)?;
        Ok(content.parse()?)
    }

    pub fn button(&self) -> Button {
        self.button.clone().unwrap_or_default()
    }

    pub fn timer(&self) -> Timer {
        self.timer.clone().unwrap_or_default()
    }

    pub fn di(&self) -> Di {
        self.di.clone().unwrap_or_default()
    }

    pub fn ai(&self) -> Ai {
        self.ai.clone().unwrap_or_default()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config io: {0}")]
    Io(#[from] io::Error),
    #[error("config parse: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Display for ProjectConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = toml::to_string(self).map_err(|_| std::fmt::Error)?;
        write!(f, "{text}")
    }
}

impl FromStr for ProjectConfig {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_round_trips_through_toml() {
        let config = ProjectConfig::default();
        let parsed: ProjectConfig = config.to_string().parse().unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: ProjectConfig = "log_level = \"Debug\"\n".parse().unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.irq.wait_slice_ms, 100);
        assert_eq!(config.demo, Demo::default());
        assert_eq!(config.button, None);
        assert_eq!(config.button(), Button::default());
    }

    #[test]
    fn test_tables() {
        let config: ProjectConfig = r#"
log_level = "Warn"

[irq]
wait_slice_ms = 20

[di]
channel = "DioA3"
irq = 6
count = 1
trigger = "both"
"#
        .parse()
        .unwrap();

        assert_eq!(config.irq.wait_config().slice, Duration::from_millis(20));
        let di = config.di();
        assert_eq!(di.channel, IrqChannel::DioA3);
        assert_eq!(di.irq, 6);
        assert_eq!(di.trigger, Trigger::Both);
        assert_eq!(config.timer().timeout_us, 5_000_000);
    }

    #[test]
    fn test_bad_trigger_is_rejected() {
        let result: Result<ProjectConfig, _> = r#"
log_level = "Info"

[button]
irq = 3
count = 1
trigger = "sideways"
"#
        .parse();
        assert!(result.is_err());
    }
}
