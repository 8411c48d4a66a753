//! Records the crate directory so the generator can still find
//! `blocks/Blocks.yaml` when its executable lives outside the source tree.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        return;
    };
    let root = PathBuf::from(manifest_dir);
    let root = root.canonicalize().unwrap_or(root);
    println!("cargo:rustc-env=BLOCKGEN_ROOT_HINT={}", root.display());
}
