use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

fn main() {
    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let rustc_version = Command::new(rustc)
        .arg("--version")
        .output()
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let out_dir = env::var("OUT_DIR").expect("cargo sets OUT_DIR for build scripts");
    let dest_path = Path::new(&out_dir).join("rustc_version.rs");
    fs::write(
        &dest_path,
        format!("pub const RUSTC_VERSION: &str = {:?};", rustc_version),
    )
    .expect("failed to write rustc_version.rs");
    println!("cargo:rerun-if-changed=build.rs");
}
