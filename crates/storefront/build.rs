//! Build script for the storefront crate.
//!
//! Hashes the stylesheet so templates can version its URL and let browsers
//! cache it indefinitely.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Hex characters of the digest kept in the URL.
const HASH_LEN: usize = 8;

fn main() {
    hash_css();
}

/// Set `CSS_HASH` (first eight hex chars of the SHA-256 of `main.css`) for
/// `env!("CSS_HASH")`. An unreadable file yields an empty hash.
fn hash_css() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let css_path = Path::new(&manifest_dir).join("static/css/main.css");

    println!("cargo:rerun-if-changed={}", css_path.display());

    let hash = match fs::read(&css_path) {
        Ok(content) => {
            let digest = format!("{:x}", Sha256::digest(&content));
            digest.chars().take(HASH_LEN).collect::<String>()
        }
        Err(e) => {
            println!("cargo:warning=Could not read main.css: {e}");
            String::new()
        }
    };

    println!("cargo:rustc-env=CSS_HASH={hash}");
}
