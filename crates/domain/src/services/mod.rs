//! Domain services for the OFB catalog.
//!
//! Services contain the lifecycle logic and the interfaces it depends on.

pub mod dispatcher;
pub mod lifecycle;
pub mod messages;
pub mod notification;
pub mod session;
pub mod store;

pub use dispatcher::{
    parse_command, Command, ConversationDispatcher, DispatchOutcome, InboundMessage,
};
pub use lifecycle::{ApplicationLifecycle, LifecycleConfig, ReviewOutcome};
pub use notification::{
    MockNotificationGateway, NotificationError, NotificationGateway, Notifier, Recipient,
};
pub use session::{
    InMemorySessionStore, RegistrationSessions, SessionState, SessionStore, SessionStoreError,
};
pub use store::{ApplicationStore, StoreError, ViewStore};
