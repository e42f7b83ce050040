//! Compiles the stylesheet into the GResource bundle that `app.rs` registers
//! with `gio::resources_register_include!`.

use std::path::{Path, PathBuf};

const RESOURCE_DIR: &str = "resources";
const MANIFEST: &str = "resources/resources.gresource.xml";
const BUNDLE: &str = "sheetgate.gresource";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    for file in bundled_files(Path::new(RESOURCE_DIR)) {
        println!("cargo:rerun-if-changed={}", file.display());
    }

    glib_build_tools::compile_resources(&[RESOURCE_DIR], MANIFEST, BUNDLE);
}

/// Every file under `root`, manifest included.
fn bundled_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for path in entries.flatten().map(|entry| entry.path()) {
            if path.is_dir() {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }

    files
}
