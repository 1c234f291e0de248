//! Mail transports for rendered notifications.

mod log;
mod smtp;

pub use self::log::LogMailer;
pub use self::smtp::{SmtpMailer, SmtpSettings};
