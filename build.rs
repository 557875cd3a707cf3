use std::env;
use std::fs;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");

    // Host builds (tests, the library alone) need no linker script
    let target = env::var("TARGET").unwrap_or_default();
    if env::var_os("CARGO_FEATURE_BOARD").is_none() || !target.starts_with("thumbv") {
        return;
    }

    let out_dir = env::var("OUT_DIR").unwrap();
    fs::write(Path::new(&out_dir).join("memory.x"), include_str!("memory.x")).unwrap();
    println!("cargo:rustc-link-search={}", out_dir);

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}
