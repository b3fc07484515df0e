use std::fmt;

use rppal::gpio::Level;
use serde::Deserialize;

/// Direction of a hardware line notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
	Rising,
	Falling,
}

impl Edge {
	/// Level the line settled at after this edge.
	pub fn level(self) -> Level {
		match self {
			Edge::Rising => Level::High,
			Edge::Falling => Level::Low,
		}
	}
}

impl From<Level> for Edge {
	fn from(level: Level) -> Self {
		match level {
			Level::High => Edge::Rising,
			Level::Low => Edge::Falling,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bias {
	PullUp,
	PullDown,
	Off,
}

/// Everything needed to claim one input line with both edges detected.
#[derive(Clone, Debug)]
pub struct LineRequest {
	pub pin: u8,
	pub bias: Bias,
	pub consumer: &'static str,
}

pub trait LineReader {
	fn level(&self) -> Result<Level, GpioError>;
}

/// One notification delivered to an `EventHandler`.
pub struct LineEvent<'a> {
	edge: Edge,
	line: &'a dyn LineReader,
}

impl<'a> LineEvent<'a> {
	pub fn new(edge: Edge, line: &'a dyn LineReader) -> Self {
		Self { edge, line }
	}

	pub fn edge(&self) -> Edge {
		self.edge
	}

	/// Reads the line now, which may differ from what the edge reported.
	pub fn level(&self) -> Result<Level, GpioError> {
		self.line.level()
	}
}

/// Invoked on the chip's dispatch thread, one call at a time.
/// An `Err` means notifications could not be delivered and none will follow.
pub type EventHandler = Box<dyn FnMut(Result<LineEvent<'_>, GpioError>) + Send>;

pub trait Chip {
	type Line: Line;

	fn request_line(&self, request: LineRequest, handler: EventHandler) -> Result<Self::Line, GpioError>;
}

/// A claimed line. Dropping it releases the line as well, but only `close`
/// reports failures.
///
/// Once `close` returns, the handler has finished its last call and has been
/// dropped.
pub trait Line {
	fn close(self) -> Result<(), GpioError>;
}

#[derive(Debug)]
pub enum GpioError {
	Rppal(rppal::gpio::Error),
	Io(std::io::Error),
	Dispatch,
}

impl fmt::Display for GpioError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		use GpioError::*;

		match self {
			Rppal(e) => write!(f, "gpio: {}", e),
			Io(e) => write!(f, "io: {}", e),
			Dispatch => write!(f, "line dispatch thread panicked"),
		}
	}
}

impl std::error::Error for GpioError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		use GpioError::*;

		match self {
			Rppal(ref e) => Some(e),
			Io(ref e) => Some(e),
			Dispatch => None,
		}
	}
}

impl From<rppal::gpio::Error> for GpioError {
	fn from(err: rppal::gpio::Error) -> Self {
		GpioError::Rppal(err)
	}
}

impl From<std::io::Error> for GpioError {
	fn from(err: std::io::Error) -> Self {
		GpioError::Io(err)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn edge_levels() {
		assert_eq!(Edge::Rising.level(), Level::High);
		assert_eq!(Edge::Falling.level(), Level::Low);
		assert_eq!(Edge::from(Level::High), Edge::Rising);
		assert_eq!(Edge::from(Level::Low), Edge::Falling);
	}
}
