pub mod batch;
pub mod pool;

pub use batch::{batch_ranges, seed_batches, SeedBatch};
pub use pool::WorkerPool;
