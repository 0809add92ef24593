// ---------------------------------------------------------------------------
// Build script for the schemas crate.
//
// Compiles the protobuf definitions under `proto/` into Rust modules with
// `tonic-build`. Keeping generation inside the crate means every consumer gets
// consistent types without a separate codegen step.
// ---------------------------------------------------------------------------

fn main() {
    println!("cargo:rerun-if-changed=proto");

    tonic_build::configure()
        .build_client(true)
        .build_server(true)
        .compile(&["proto/havoc/agent/v1/agent.proto"], &["proto"])
        .expect("failed to compile protobufs");
}
