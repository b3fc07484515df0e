use std::sync::Arc;

use parking_lot::Mutex;

type Listener = Box<dyn FnOnce() + Send>;

/// Identifies a listener registered with `Shutdown::on_trigger`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListenerId(u64);

struct State {
	triggered: bool,
	next_id: u64,
	listeners: Vec<(ListenerId, Listener)>,
}

/// Cooperative cancellation shared between threads.
///
/// Triggering is one-way and idempotent; every clone observes it.
#[derive(Clone)]
pub struct Shutdown {
	inner: Arc<Mutex<State>>,
}

impl Shutdown {
	pub fn new() -> Self {
		Self {
			inner: Arc::new(Mutex::new(State { triggered: false, next_id: 0, listeners: Vec::new() })),
		}
	}

	pub fn trigger(&self) {
		let listeners = {
			let mut state = self.inner.lock();

			if state.triggered {
				return;
			}

			state.triggered = true;
			std::mem::take(&mut state.listeners)
		};

		// run outside the lock so listeners may touch this token
		for (_, listener) in listeners {
			listener();
		}
	}

	#[cfg(test)]
	pub fn is_triggered(&self) -> bool {
		self.inner.lock().triggered
	}

	#[cfg(test)]
	pub fn listener_count(&self) -> usize {
		self.inner.lock().listeners.len()
	}

	/// Runs `listener` once on trigger, or right away if already triggered.
	///
	/// Hand the returned id to `remove` once the listener is no longer wanted.
	pub fn on_trigger<F>(&self, listener: F) -> ListenerId
	where
		F: FnOnce() + Send + 'static,
	{
		let mut state = self.inner.lock();

		let id = ListenerId(state.next_id);
		state.next_id += 1;

		if state.triggered {
			drop(state);
			listener();
		} else {
			state.listeners.push((id, Box::new(listener)));
		}

		id
	}

	/// Drops a listener that has not run yet. Unknown ids are ignored.
	pub fn remove(&self, id: ListenerId) {
		self.inner.lock().listeners.retain(|(listener_id, _)| *listener_id != id);
	}
}

impl Default for Shutdown {
	fn default() -> Self {
		Self::new()
	}
}
