use prost::Message;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);

    // protox compiles the proto in-process, no protoc binary required on the host.
    let fd_set = protox::compile(["proto/echo.proto"], ["proto"])?;

    std::fs::write(out_dir.join("descriptors.bin"), fd_set.encode_to_vec())?;

    tonic_prost_build::configure()
        .build_client(false)
        .compile_fds(fd_set)?;

    println!("cargo:rerun-if-changed=proto/echo.proto");

    Ok(())
}
