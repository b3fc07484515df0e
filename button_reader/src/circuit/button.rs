use std::fmt;
use std::sync::mpsc::{ self, SyncSender };

use log::{ debug, error, info, trace, warn };
use rppal::gpio::Level;
use serde::Deserialize;

use super::gpio::{ Bias, Chip, Edge, EventHandler, GpioError, Line, LineEvent, LineRequest };
use crate::message::Action;
use crate::shutdown::Shutdown;

const CONSUMER: &str = "button_reader";

/// How a notification is turned into a logical level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
	/// Trust the reported edge direction. Repeated edges repeat the action.
	Edge,
	/// Read the line and act only when it differs from the last level seen.
	Level,
}

impl Default for Strategy {
	fn default() -> Self {
		Strategy::Level
	}
}

/// Which level means the button is held down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Polarity {
	/// Button shorts the line to ground, idles high on a pull-up.
	ActiveLow,
	ActiveHigh,
}

impl Polarity {
	pub fn idle(self) -> Level {
		match self {
			Polarity::ActiveLow => Level::High,
			Polarity::ActiveHigh => Level::Low,
		}
	}

	pub fn action(self, level: Level) -> Action {
		if level == self.idle() {
			Action::Release
		} else {
			Action::Press
		}
	}

	pub fn default_bias(self) -> Bias {
		match self {
			Polarity::ActiveLow => Bias::PullUp,
			Polarity::ActiveHigh => Bias::PullDown,
		}
	}
}

impl Default for Polarity {
	fn default() -> Self {
		Polarity::ActiveLow
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonSettings {
	pub strategy: Strategy,
	pub polarity: Polarity,
	pub bias: Bias,
}

impl Default for ButtonSettings {
	fn default() -> Self {
		let polarity = Polarity::default();

		Self {
			strategy: Strategy::default(),
			polarity,
			bias: polarity.default_bias(),
		}
	}
}

/// Press/release state machine fed one notification at a time.
#[derive(Debug)]
pub struct Detector {
	strategy: Strategy,
	polarity: Polarity,
	previous: Level,
	faulted: bool,
}

impl Detector {
	pub fn new(strategy: Strategy, polarity: Polarity) -> Self {
		Self {
			strategy,
			polarity,
			previous: polarity.idle(),
			faulted: false,
		}
	}

	#[cfg(test)]
	pub fn previous(&self) -> Level {
		self.previous
	}

	pub fn is_faulted(&self) -> bool {
		self.faulted
	}

	/// Stops the detector for good; every later notification is ignored.
	pub fn fault(&mut self) {
		self.faulted = true;
	}

	pub fn on_edge(&mut self, edge: Edge) -> Option<Action> {
		if self.faulted {
			return None;
		}

		Some(self.polarity.action(edge.level()))
	}

	pub fn on_level(&mut self, level: Level) -> Option<Action> {
		if self.faulted || level == self.previous {
			return None;
		}

		self.previous = level;

		Some(self.polarity.action(level))
	}

	/// A failed read leaves `previous` untouched.
	pub fn observe(&mut self, event: &LineEvent<'_>) -> Result<Option<Action>, GpioError> {
		match self.strategy {
			Strategy::Edge => Ok(self.on_edge(event.edge())),
			Strategy::Level => {
				let level = event.level()?;

				trace!("read level {:?}, previous {:?}", level, self.previous);

				Ok(self.on_level(level))
			}
		}
	}
}

#[derive(Debug)]
pub enum WatchError {
	LineRequest { pin: u8, source: GpioError },
	LineRead { pin: u8, source: GpioError },
	LineClose { pin: u8, source: GpioError },
	ConsumerGone { pin: u8 },
}

impl fmt::Display for WatchError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		use WatchError::*;

		match self {
			LineRequest { pin, source } => write!(f, "request button line {}: {}", pin, source),
			LineRead { pin, source } => write!(f, "read button line {}: {}", pin, source),
			LineClose { pin, source } => write!(f, "close button line {}: {}", pin, source),
			ConsumerGone { pin } => write!(f, "action receiver for button line {} hung up", pin),
		}
	}
}

impl std::error::Error for WatchError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		use WatchError::*;

		match self {
			LineRequest { source, .. } | LineRead { source, .. } | LineClose { source, .. } => Some(source),
			ConsumerGone { .. } => None,
		}
	}
}

enum Exit {
	Cancelled,
	Fault(WatchError),
}

/// Watches one input line on a chip owned by the caller.
pub struct ButtonWatcher<'c, C: Chip> {
	chip: &'c C,
	pin: u8,
	settings: ButtonSettings,
}

impl<'c, C: Chip> ButtonWatcher<'c, C> {
	pub fn new(chip: &'c C, pin: u8, settings: ButtonSettings) -> Self {
		Self { chip, pin, settings }
	}

	pub fn pin(&self) -> u8 {
		self.pin
	}

	/// Sends actions until `shutdown` triggers or a fault occurs.
	///
	/// `actions` is dropped before this returns, so the receiving side sees
	/// the channel close on every exit path.
	pub fn run(&self, shutdown: &Shutdown, actions: SyncSender<Action>) -> Result<(), WatchError> {
		info!("button {} started", self.pin);

		let result = self.watch(shutdown, actions);

		match &result {
			Ok(()) => info!("button {} finished", self.pin),
			Err(e) => error!("button {} failed: {}", self.pin, e),
		}

		result
	}

	fn watch(&self, shutdown: &Shutdown, actions: SyncSender<Action>) -> Result<(), WatchError> {
		let pin = self.pin;
		let (exit_sender, exit_receiver) = mpsc::channel();

		let handler: EventHandler = {
			let exit_sender = exit_sender.clone();
			let mut detector = Detector::new(self.settings.strategy, self.settings.polarity);

			Box::new(move |event: Result<LineEvent<'_>, GpioError>| {
				if detector.is_faulted() {
					return;
				}

				trace!("button {} notified", pin);

				let fault = match event.and_then(|event| detector.observe(&event)) {
					Ok(Some(action)) => {
						debug!("button {} {}", pin, action);

						match actions.send(action) {
							Ok(()) => None,
							Err(_) => Some(WatchError::ConsumerGone { pin }),
						}
					}
					Ok(None) => None,
					Err(source) => Some(WatchError::LineRead { pin, source }),
				};

				if let Some(fault) = fault {
					detector.fault();
					// receiver only goes away once the line is closed
					let _ = exit_sender.send(Exit::Fault(fault));
				}
			})
		};

		let request = LineRequest { pin, bias: self.settings.bias, consumer: CONSUMER };

		let line = self.chip.request_line(request, handler)
			.map_err(|source| WatchError::LineRequest { pin, source })?;

		let listener = shutdown.on_trigger(move || {
			let _ = exit_sender.send(Exit::Cancelled);
		});

		// every sender lives on until the line closes or shutdown fires
		let exit = exit_receiver.recv().unwrap_or(Exit::Cancelled);

		// still registered when a fault ended the run
		shutdown.remove(listener);

		let closed = line.close()
			.map_err(|source| WatchError::LineClose { pin, source });

		match exit {
			Exit::Cancelled => closed,
			Exit::Fault(fault) => {
				if let Err(e) = closed {
					warn!("{}", e);
				}

				Err(fault)
			}
		}
	}
}
