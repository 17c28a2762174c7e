pub mod books;
pub mod executor;

pub use books::{BookRegistry, InMemoryBookRegistry};
pub use executor::{Executor, ExecutorError, SyncExecutor};
