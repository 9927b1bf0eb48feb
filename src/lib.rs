//! A single-host MapReduce execution engine: a coordinator partitions an input
//! corpus across map workers, shuffles the emitted intermediate pairs to reduce
//! workers through a deterministic partitioning function, and restarts map
//! workers that stop making forward progress.
//!
//! Workers are real child OS processes (the `mrworker` binary); the
//! [`mr::supervisor::Supervisor`] owns their lifecycle and the
//! [`mr::coordinator::Coordinator`] drives the two-phase map/reduce pipeline.

pub mod mr;
