mod post;
mod prediction;
mod result;
mod session;
mod stats;

pub use post::*;
pub use prediction::*;
pub use result::*;
pub use session::*;
pub use stats::*;

/// Telegram user id, as delivered by the bot API.
pub type TelegramId = i64;
