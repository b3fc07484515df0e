use std::sync::atomic::{ AtomicBool, Ordering };
use std::sync::Arc;
use std::thread::{ self, JoinHandle };
use std::time::Duration;

use log::{ error, trace, warn };
use rppal::gpio::{ Gpio, InputPin, Level, Trigger };

use super::gpio::{ Bias, Chip, EventHandler, GpioError, Line, LineEvent, LineReader, LineRequest };

// upper bound on how long closing a line waits for the dispatch thread
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The Raspberry Pi SoC GPIO controller.
pub struct RpiChip {
	gpio: Gpio,
}

impl RpiChip {
	pub fn new() -> rppal::gpio::Result<Self> {
		Ok(RpiChip { gpio: Gpio::new()? })
	}
}

impl Chip for RpiChip {
	type Line = RpiLine;

	fn request_line(&self, request: LineRequest, mut handler: EventHandler) -> Result<RpiLine, GpioError> {
		let pin = self.gpio.get(request.pin)?;

		let mut input = match request.bias {
			Bias::PullUp => pin.into_input_pullup(),
			Bias::PullDown => pin.into_input_pulldown(),
			Bias::Off => pin.into_input(),
		};

		input.set_interrupt(Trigger::Both)?;

		let stop = Arc::new(AtomicBool::new(false));

		let thread = {
			let stop = stop.clone();
			let LineRequest { pin: pin_num, consumer, .. } = request;

			thread::Builder::new()
				.name(format!("gpio-line-{}", pin_num))
				.spawn(move || {
					trace!("{} dispatching pin {}", consumer, pin_num);

					while !stop.load(Ordering::Acquire) {
						match input.poll_interrupt(false, Some(POLL_INTERVAL)) {
							Ok(Some(level)) => handler(Ok(LineEvent::new(level.into(), &input))),
							Ok(None) => (),
							Err(e) => {
								error!("polling pin {} failed: {}", pin_num, e);
								handler(Err(e.into()));
								break;
							}
						}
					}

					// input drops here, clearing the interrupt and resetting the pin
				})?
		};

		Ok(RpiLine { pin: request.pin, stop, thread: Some(thread) })
	}
}

impl LineReader for InputPin {
	fn level(&self) -> Result<Level, GpioError> {
		Ok(self.read())
	}
}

pub struct RpiLine {
	pin: u8,
	stop: Arc<AtomicBool>,
	thread: Option<JoinHandle<()>>,
}

impl RpiLine {
	fn release(&mut self) -> Result<(), GpioError> {
		self.stop.store(true, Ordering::Release);

		match self.thread.take() {
			Some(thread) => thread.join().map_err(|_| GpioError::Dispatch),
			None => Ok(()),
		}
	}
}

impl Line for RpiLine {
	fn close(mut self) -> Result<(), GpioError> {
		self.release()
	}
}

impl Drop for RpiLine {
	fn drop(&mut self) {
		if let Err(e) = self.release() {
			warn!("releasing pin {} failed: {}", self.pin, e);
		}
	}
}
