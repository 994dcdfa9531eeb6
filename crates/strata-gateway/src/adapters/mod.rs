pub mod in_memory;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod mock_driver;

pub use in_memory::{InMemoryJobQueue, InMemoryPostalService, InMemoryRequestQueue};
pub use mock_driver::MockDriver;
