//! Runtime configuration.
//!
//! Settings are plain data loaded from TOML and installed per thread, since the
//! whole runtime lives on one event-loop thread.
//!
//! ```
//! use lumen_core::config::{RuntimeConfig, configure, current_config};
//!
//! let config = RuntimeConfig::from_toml_str("max_microtasks_per_flush = 64").unwrap();
//! configure(config);
//! assert_eq!(current_config().max_microtasks_per_flush, 64);
//! ```

use core::cell::RefCell;

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

/// Default cap on microtasks executed by a single flush.
pub const DEFAULT_MAX_MICROTASKS_PER_FLUSH: usize = 10_000;

/// Tunables for the component runtime.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
	/// Upper bound on tasks run by one `flush_microtasks()` call.
	pub max_microtasks_per_flush: usize,
	/// Emit a debug event with timing for every component render.
	pub trace_renders: bool,
	/// Warn when a reactive binding is created outside any render.
	pub warn_unmanaged_bindings: bool,
}

impl Default for RuntimeConfig {
	fn default() -> Self {
		Self {
			max_microtasks_per_flush: DEFAULT_MAX_MICROTASKS_PER_FLUSH,
			trace_renders: false,
			warn_unmanaged_bindings: true,
		}
	}
}

impl RuntimeConfig {
	/// Parses a configuration from TOML. Missing keys keep their defaults.
	pub fn from_toml_str(source: &str) -> CoreResult<Self> {
		let config: Self =
			toml::from_str(source).map_err(|err| CoreError::Config(err.to_string()))?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> CoreResult<()> {
		if self.max_microtasks_per_flush == 0 {
			return Err(CoreError::Config(
				"max_microtasks_per_flush must be greater than zero".to_string(),
			));
		}
		Ok(())
	}
}

thread_local! {
	static CONFIG: RefCell<RuntimeConfig> = RefCell::new(RuntimeConfig::default());
}

/// Installs `config` for the current thread.
pub fn configure(config: RuntimeConfig) {
	CONFIG.with(|current| *current.borrow_mut() = config);
}

/// Returns a copy of the configuration active on the current thread.
pub fn current_config() -> RuntimeConfig {
	CONFIG.with(|current| current.borrow().clone())
}
