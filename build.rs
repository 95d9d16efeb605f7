use std::env;

fn main() {
    let build_root = env::var("CARGO_MANIFEST_DIR").unwrap();
    println!("cargo:rerun-if-changed={}/src/lpc1114.ld", build_root);

    // Hosted builds (tests, CI) link normally.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("none") {
        return;
    }

    let out_dir = env::var("OUT_DIR").unwrap();
    println!("cargo:rustc-link-arg-bins=-T{}/src/lpc1114.ld", build_root);
    println!("cargo:rustc-link-arg-bins=-Map={}/lpc1114-blink.map", out_dir);
}
