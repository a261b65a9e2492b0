//! Configuration system for the brew simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the simulator. It provides:
//! 1. **Defaults:** Baseline machine constants (RAM size, peripheral addresses).
//! 2. **Structures:** Hierarchical config for general, memory, and peripheral settings.
//! 3. **Enums:** Execution environment and machine model selection.
//!
//! Configuration is supplied as JSON (`Config::from_json`, `Config::from_file`), or use
//! `Config::default()` for a user-level run on the generic model.

use std::path::Path;

use serde::Deserialize;

use crate::common::error::SimError;

/// Default configuration constants for the simulator.
///
/// These values define the baseline machine when not explicitly overridden
/// in a JSON configuration file.
mod defaults {
    /// Physical base address of RAM.
    ///
    /// The guest argv block lives at address 0, so RAM always starts there.
    pub const RAM_BASE: u32 = 0;

    /// Total size of RAM (16 MiB).
    pub const RAM_SIZE: usize = 16 * 1024 * 1024;

    /// Base address of the console register block (peripheral model).
    pub const CONSOLE_BASE: u32 = 0x4000_0000;

    /// Base address of the first GPIO port (peripheral model).
    pub const GPIO_BASE: u32 = 0x4000_1000;

    /// Distance between consecutive GPIO ports.
    pub const GPIO_STRIDE: u32 = 0x10;
}

/// Environment the guest program runs in.
///
/// Selects how the machine model answers exceptions: a user-level environment
/// emulates the operating system itself, the other two hand exceptions to
/// scheduler-mode code in the guest image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Environment {
    /// User-level program; syscalls are bridged to the host.
    #[default]
    User,
    /// Bare-metal operating environment; exceptions enter scheduler mode.
    Operating,
    /// Virtual environment; behaves like `Operating`.
    Virtual,
}

impl Environment {
    /// Returns `true` for the user-level environment.
    pub const fn is_user(self) -> bool {
        matches!(self, Self::User)
    }
}

/// Machine model variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum ModelKind {
    /// Identity translation, universal CSRs only.
    #[default]
    Generic,
    /// Base/limit protection windows for task mode.
    Protected,
    /// Generic model with memory-mapped console and GPIO devices.
    Peripheral,
}

impl ModelKind {
    /// Returns the lowercase model name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Protected => "protected",
            Self::Peripheral => "peripheral",
        }
    }
}

/// Main configuration structure for the simulator.
///
/// Every section and field is optional in JSON; missing values take their defaults.
///
/// # Examples
///
/// ```
/// use brewsim_core::config::{Config, Environment, ModelKind};
///
/// let json = r#"{
///     "general": {
///         "trace_instructions": true,
///         "environment": "Operating",
///         "model": "Protected"
///     },
///     "memory": {
///         "ram_size": 1048576
///     }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert!(config.general.trace_instructions);
/// assert_eq!(config.general.environment, Environment::Operating);
/// assert_eq!(config.general.model, ModelKind::Protected);
/// assert_eq!(config.memory.ram_size, 1 << 20);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General simulation settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Guest memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Memory-mapped device configuration (peripheral model)
    #[serde(default)]
    pub peripherals: PeripheralConfig,
}

impl Config {
    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Config` if the text is not a valid configuration.
    pub fn from_json(text: &str) -> Result<Self, SimError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Io` if the file cannot be read and `SimError::Config`
    /// if it does not parse.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    fn validate(&self) -> Result<(), SimError> {
        if self.memory.ram_size == 0 || self.memory.ram_size > 1 << 28 {
            return Err(SimError::Config(format!(
                "ram_size {} must be between 1 byte and 256 MiB",
                self.memory.ram_size
            )));
        }
        Ok(())
    }
}

/// General simulation settings and options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralConfig {
    /// Emit one trace line per retired instruction to the trace sink.
    #[serde(default)]
    pub trace_instructions: bool,

    /// Environment that handles guest exceptions.
    #[serde(default)]
    pub environment: Environment,

    /// Machine model to build.
    #[serde(default)]
    pub model: ModelKind,
}

/// Guest memory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// RAM size in bytes
    #[serde(default = "MemoryConfig::default_ram_size")]
    pub ram_size: usize,

    /// Initial stack pointer. Defaults to the top of RAM.
    #[serde(default)]
    pub stack_top: Option<u32>,
}

impl MemoryConfig {
    /// Returns the default RAM size.
    const fn default_ram_size() -> usize {
        defaults::RAM_SIZE
    }

    /// Returns the physical base address of RAM.
    pub const fn ram_base(&self) -> u32 {
        defaults::RAM_BASE
    }

    /// Returns the initial stack pointer: `stack_top`, or the word below the end of RAM.
    pub fn initial_sp(&self) -> u32 {
        self.stack_top
            .unwrap_or_else(|| (defaults::RAM_BASE as usize + self.ram_size) as u32 & !3)
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            ram_size: defaults::RAM_SIZE,
            stack_top: None,
        }
    }
}

/// One GPIO port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GpioConfig {
    /// Base address of the port's data register
    pub base: u32,

    /// Writing the port halts the simulator with the written value as exit code.
    #[serde(default)]
    pub terminate_on_write: bool,
}

/// Memory-mapped device configuration for the peripheral model.
#[derive(Debug, Clone, Deserialize)]
pub struct PeripheralConfig {
    /// Console register block base address
    #[serde(default = "PeripheralConfig::default_console_base")]
    pub console_base: u32,

    /// GPIO ports
    #[serde(default = "PeripheralConfig::default_gpio")]
    pub gpio: Vec<GpioConfig>,

    /// When true, console output goes to stderr instead of stdout.
    #[serde(default)]
    pub console_to_stderr: bool,
}

impl PeripheralConfig {
    /// Returns the default console base address.
    const fn default_console_base() -> u32 {
        defaults::CONSOLE_BASE
    }

    /// Returns the default GPIO ports: the first one halts the simulator when written.
    fn default_gpio() -> Vec<GpioConfig> {
        (0..4)
            .map(|i| GpioConfig {
                base: defaults::GPIO_BASE + i * defaults::GPIO_STRIDE,
                terminate_on_write: i == 0,
            })
            .collect()
    }
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self {
            console_base: defaults::CONSOLE_BASE,
            gpio: Self::default_gpio(),
            console_to_stderr: false,
        }
    }
}
