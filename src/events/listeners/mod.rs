//! Built-in listeners for a [`ListenerRegistry`](crate::events::ListenerRegistry).

mod logging;
#[cfg(feature = "tracing")]
mod tracing;

pub use logging::LoggingListener;
#[cfg(feature = "tracing")]
pub use self::tracing::TracingListener;
