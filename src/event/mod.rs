// Topic-keyed event distribution between services and connected devices
//
// Push payloads travel on a per-device topic, notification responses on a
// per-request topic. Subscribers hold a guard; dropping the last guard for a
// topic releases its channel.

// Public API - what other modules can use
pub use bus::{EventBus, Subscription};
pub use events::{topics, AppEvent};

// Internal modules
mod bus;
mod events;
