use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/broker/proto/broker.proto");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    prost_build::Config::new()
        .out_dir(&out_dir)
        .compile_protos(&["src/broker/proto/broker.proto"], &["src/broker/proto"])
        .expect("Failed to compile .proto");
}
