//! Build script for the storefront crate.
//!
//! Hashes the stylesheet so pages can link `main.css?v=<hash>` and browsers
//! refetch it only when it changes.

use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Hex characters of the digest kept in `CSS_HASH`.
const SHORT_HASH_LEN: usize = 8;

fn main() {
    hash_css();
}

/// Set `CSS_HASH` for use with `env!("CSS_HASH")`.
fn hash_css() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let css_path = Path::new(&manifest_dir).join("static/css/main.css");

    println!("cargo:rerun-if-changed={}", css_path.display());

    let content = match fs::read(&css_path) {
        Ok(content) => content,
        Err(e) => {
            println!("cargo:warning=Could not read main.css: {e}");
            println!("cargo:rustc-env=CSS_HASH=");
            return;
        }
    };

    let digest = Sha256::digest(&content);
    let short_hash = digest
        .iter()
        .take(SHORT_HASH_LEN / 2)
        .fold(String::with_capacity(SHORT_HASH_LEN), |mut hex, byte| {
            let _ = write!(hex, "{byte:02x}");
            hex
        });

    println!("cargo:rustc-env=CSS_HASH={short_hash}");
}
