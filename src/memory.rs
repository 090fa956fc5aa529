mod demonstration_buffer;
mod experience;
mod transition_buffer;

pub use demonstration_buffer::{Demonstration, DemonstrationBuffer};
pub use experience::Experience;
pub use transition_buffer::TransitionBuffer;
