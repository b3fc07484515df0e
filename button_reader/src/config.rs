use serde::Deserialize;

use crate::circuit::{ Bias, ButtonSettings, Polarity, Strategy };

/// The controller is always the Pi's SoC GPIO, so there is no chip setting;
/// `button_pin` uses BCM numbering on that controller.
#[derive(Debug, Deserialize)]
pub struct Config {
	button_pin: u8,
	#[serde(default)]
	strategy: Strategy,
	#[serde(default)]
	polarity: Polarity,
	bias: Option<Bias>,
	pub log_level: Option<String>,
}

impl Config {
	pub fn button_pin(&self) -> u8 {
		self.button_pin
	}

	pub fn button_settings(&self) -> ButtonSettings {
		ButtonSettings {
			strategy: self.strategy,
			polarity: self.polarity,
			bias: self.bias.unwrap_or_else(|| self.polarity.default_bias()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_to_active_low_level_compare() {
		let config: Config = toml::from_str("button_pin = 17").unwrap();

		assert_eq!(config.button_pin(), 17);
		assert_eq!(config.button_settings(), ButtonSettings::default());
		assert!(config.log_level.is_none());
	}

	#[test]
	fn bias_follows_polarity_unless_set() {
		let config: Config = toml::from_str(r#"
			button_pin = 4
			strategy = "edge"
			polarity = "active-high"
			log_level = "trace"
		"#).unwrap();

		let settings = config.button_settings();
		assert_eq!(settings.strategy, Strategy::Edge);
		assert_eq!(settings.polarity, Polarity::ActiveHigh);
		assert_eq!(settings.bias, Bias::PullDown);
		assert_eq!(config.log_level.as_deref(), Some("trace"));

		let config: Config = toml::from_str(r#"
			button_pin = 4
			polarity = "active-high"
			bias = "off"
		"#).unwrap();

		assert_eq!(config.button_settings().bias, Bias::Off);
	}

	#[test]
	fn rejects_missing_pin_and_unknown_strategy() {
		assert!(toml::from_str::<Config>("strategy = \"level\"").is_err());
		assert!(toml::from_str::<Config>("button_pin = 4\nstrategy = \"timed\"").is_err());
	}
}
