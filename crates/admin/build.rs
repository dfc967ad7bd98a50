//! Build script for the admin crate.
//!
//! Hashes the stylesheet so templates can append a cache-busting version
//! to its URL. The file itself is served as-is from `static/`.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    let css_path = Path::new(&manifest_dir).join("static/css/main.css");

    println!("cargo:rerun-if-changed={}", css_path.display());

    // An empty version just means templates link the stylesheet unversioned.
    let version = match fs::read(&css_path) {
        Ok(content) => {
            let mut hasher = Sha256::new();
            hasher.update(&content);
            let digest = format!("{:x}", hasher.finalize());
            digest.chars().take(8).collect::<String>()
        }
        Err(e) => {
            println!("cargo:warning=Could not read main.css: {e}");
            String::new()
        }
    };

    println!("cargo:rustc-env=CSS_VERSION={version}");
}
