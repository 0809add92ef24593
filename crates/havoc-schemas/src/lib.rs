//! Havoc Schema Library
//!
//! Re-exports the generated protobuf modules so other crates can depend on a
//! stable interface instead of running their own codegen.

pub mod havoc {
    pub mod agent {
        pub mod v1 {
            tonic::include_proto!("havoc.agent.v1");
        }
    }
}
