//! Chat notifications for high-severity log calls

pub mod client;
pub mod sink;
#[cfg(feature = "slack")]
pub mod slack;

pub use client::{Attachment, AttachmentField, ChatMessage, NotificationClient};
pub use sink::{NotificationSink, DEFAULT_ICON, DEFAULT_USERNAME, DIRECT_ICON};
#[cfg(feature = "slack")]
pub use slack::{SlackWebClient, SLACK_POST_MESSAGE_URL};
