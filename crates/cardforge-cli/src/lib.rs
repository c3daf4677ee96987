//! Command surface for cardforge: registration gate, command dispatch,
//! reply delivery, settings, and logging.

pub mod bot;
pub mod registry;
pub mod workspace;

pub use bot::{Bot, BotError, Reply};
