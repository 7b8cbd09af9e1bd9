pub mod controller;
pub mod dialogue;
pub mod pages;
pub mod texts;
pub mod transport;

pub use controller::Controller;
pub use dialogue::{DialogueState, Draft, Registration};
pub use pages::render;
pub use transport::Transport;
