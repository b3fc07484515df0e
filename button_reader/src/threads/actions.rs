use std::sync::mpsc;

use log::{ info, trace };

use crate::message::Action;

/// Prints each action until every sender is gone.
pub fn print_actions(action_receiver: mpsc::Receiver<Action>) -> usize {
	info!("action handler started");

	let mut count = 0;

	for action in action_receiver {
		trace!("received action {}", action);

		match action {
			Action::Press => println!("Press"),
			Action::Release => println!("Release"),
		}

		count += 1;
	}

	info!("action handler finished after {} actions", count);

	count
}
