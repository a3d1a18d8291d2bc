fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Prefer an explicit PROTOC, otherwise use the vendored binary.
    if std::env::var_os("PROTOC").is_none() {
        match protoc_bin_vendored::protoc_bin_path() {
            Ok(path) => std::env::set_var("PROTOC", path),
            Err(e) => println!("cargo:warning=vendored protoc unavailable: {:?}", e),
        }
    }
    println!("cargo:rerun-if-changed=proto/echo.proto");
    tonic_build::compile_protos("proto/echo.proto")?;
    Ok(())
}
