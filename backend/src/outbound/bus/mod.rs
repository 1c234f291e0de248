//! Event bus adapters and the bus-backed application event publisher.
//!
//! Both transports deliver at most once: subscribers that are not connected
//! when a message is published never see it, and nothing is redelivered.

mod memory;
mod publisher;
mod redis;

pub use self::memory::InMemoryEventBus;
pub use self::publisher::BusApplicationEventPublisher;
pub use self::redis::RedisEventBus;

/// Buffered messages per subscription before backpressure applies.
pub const DEFAULT_SUBSCRIPTION_CAPACITY: usize = 256;
