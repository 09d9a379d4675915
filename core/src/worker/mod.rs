//! Request execution
//!
//! A [`RequestExecutor`] performs exactly one generation request and turns
//! whatever happened into a [`ResultRecord`](crate::response::ResultRecord):
//!
//! 1. Starts the latency clock
//! 2. Waits for a permit from the shared admission gate
//! 3. Sends the request through the batch-scoped client
//! 4. Classifies the status and body
//! 5. Appends the record to the shared collection
//!
//! Nothing here raises on a failed request. Transport errors, non-200
//! statuses and malformed bodies all become records.
//!
//! # Example
//!
//! ```ignore
//! use ollama_bench_core::worker::RequestExecutorBuilder;
//!
//! let executor = RequestExecutorBuilder::new()
//!     .client(client)
//!     .gate(gate)
//!     .request(GenerateRequest::from_config(&config))
//!     .records_tx(tx)
//!     .build()?;
//!
//! tokio::spawn(executor.run(RequestId(0)));
//! ```

mod builder;
mod executor;
mod stats;

pub use builder::RequestExecutorBuilder;
pub use executor::{classify, RequestExecutor};
pub use stats::BatchProgress;
