pub mod alert;
pub mod building;
pub mod daily_alert_count;
pub mod device;
pub mod group;
pub mod history;
pub mod json_document;
pub mod login_attempt;
pub mod notification;
pub mod ticket;
pub mod ticket_entry;
pub mod ticket_misc_entry;
pub mod user;
pub mod user_session;
pub mod verification_token;

// Re-export models for easier access
pub use alert::*;
pub use building::*;
pub use daily_alert_count::*;
pub use device::*;
pub use group::*;
pub use history::*;
pub use json_document::*;
pub use login_attempt::*;
pub use notification::*;
pub use ticket::*;
pub use ticket_entry::*;
pub use ticket_misc_entry::*;
pub use user::*;
pub use user_session::*;
pub use verification_token::*;
