//! Realtime order change feed and user-facing notifications.

pub mod feed;
pub mod toast;

pub use feed::*;
pub use toast::*;
