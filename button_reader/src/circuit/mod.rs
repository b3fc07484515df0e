mod button;
mod gpio;
mod rpi;

pub use button::{ ButtonSettings, ButtonWatcher, Polarity, Strategy, WatchError };
pub use gpio::Bias;
pub use rpi::RpiChip;

#[cfg(test)]
pub use gpio::{ Chip, Edge, EventHandler, GpioError, Line, LineEvent, LineReader, LineRequest };
