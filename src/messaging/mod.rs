//! Messaging backends.
//!
//! Two implementations of [`crate::core::MessagingProvider`]: the Slack Web
//! API and an in-memory demo fixture selected at configuration time.

pub mod demo;
pub mod slack;

pub use demo::DemoMessaging;
pub use slack::SlackMessaging;
