use std::fmt;
use std::fs;
use std::sync::mpsc;
use std::thread;

use log::{ info, warn, LevelFilter };

mod circuit;
use circuit::{ ButtonWatcher, RpiChip, WatchError };

mod config;
use config::Config;

mod message;

mod shutdown;
use shutdown::Shutdown;

mod threads;
use threads::actions::print_actions;


#[derive(Debug)]
enum Error {
	Io(std::io::Error),
	Toml(toml::de::Error),
	LogLevel(log::ParseLevelError),
	Gpio(rppal::gpio::Error),
	Signal(ctrlc::Error),
	Watch(WatchError),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		use Error::*;

		match self {
			Io(e) => write!(f, "io: {}", e),
			Toml(e) => write!(f, "parse config: {}", e),
			LogLevel(e) => write!(f, "parse log level: {}", e),
			Gpio(e) => write!(f, "open gpio: {}", e),
			Signal(e) => write!(f, "install interrupt handler: {}", e),
			Watch(e) => write!(f, "run button: {}", e),
		}
	}
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
	fn from(from: std::io::Error) -> Self {
		Self::Io(from)
	}
}

impl From<toml::de::Error> for Error {
	fn from(from: toml::de::Error) -> Self {
		Self::Toml(from)
	}
}

impl From<log::ParseLevelError> for Error {
	fn from(from: log::ParseLevelError) -> Self {
		Self::LogLevel(from)
	}
}

impl From<rppal::gpio::Error> for Error {
	fn from(from: rppal::gpio::Error) -> Self {
		Self::Gpio(from)
	}
}

impl From<ctrlc::Error> for Error {
	fn from(from: ctrlc::Error) -> Self {
		Self::Signal(from)
	}
}

impl From<WatchError> for Error {
	fn from(from: WatchError) -> Self {
		Self::Watch(from)
	}
}

fn init_logger(level: Option<&str>) -> Result<(), Error> {
	let mut builder = env_logger::Builder::from_default_env();

	if let Some(level) = level {
		builder.filter_level(level.parse::<LevelFilter>()?);
	}

	builder.init();

	Ok(())
}

/// Exit status when usage should be printed instead of running.
fn usage_exit_code(args: &[String]) -> Option<i32> {
	match args.get(1).map(String::as_str) {
		Some("-h") | Some("--help") => Some(0),
		_ if args.len() != 2 => Some(1),
		_ => None,
	}
}

fn main() -> Result<(), Error> {
	let args = std::env::args().collect::<Vec<_>>();

	// parse arguments
	if let Some(code) = usage_exit_code(&args) {
		eprintln!("Usage: {} CONFIG", args.first().map_or("button_reader", String::as_str));
		std::process::exit(code);
	}

	let config: Config = toml::from_str(&fs::read_to_string(&args[1])?)?;

	init_logger(config.log_level.as_deref())?;

	// opened and closed here, the watcher only borrows it
	let chip = RpiChip::new()?;

	let shutdown = Shutdown::new();

	{
		let shutdown = shutdown.clone();
		ctrlc::set_handler(move || {
			info!("interrupt received");
			shutdown.trigger();
		})?;
	}

	// rendezvous, a slow consumer holds up the line
	let (action_sender, action_receiver) = mpsc::sync_channel(0);

	let thread_actions = thread::Builder::new()
		.name("actions".to_owned())
		.spawn(move || print_actions(action_receiver))?;

	let watcher = ButtonWatcher::new(&chip, config.button_pin(), config.button_settings());
	info!("watching pin {} with {:?}", watcher.pin(), config.button_settings());
	let result = watcher.run(&shutdown, action_sender);

	if thread_actions.join().is_err() {
		warn!("action handler panicked");
	}

	result?;

	Ok(())
}
