mod common;
mod contact;
mod event;
mod interaction;

pub use common::*;
pub use contact::*;
pub use event::*;
pub use interaction::*;
