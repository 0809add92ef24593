//! gRPC edge for the havoc agent.
//!
//! Thin tonic services over the core engine: lifecycle control per target
//! kind, batch recovery, and a liveness probe.

pub mod grpc;

pub use grpc::{proto, GrpcServerBuilder, GrpcServerHandle};
