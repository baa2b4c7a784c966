//! Stamps the binary with the commit it was built from
//!
//! `GIT_HASH` from the environment wins, so source tarballs without `.git`
//! can still be labelled by the packager.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-env-changed=GIT_HASH");
    println!("cargo:rerun-if-changed=.git/HEAD");

    let git_hash = env::var("GIT_HASH")
        .ok()
        .filter(|hash| !hash.trim().is_empty())
        .or_else(|| {
            let output = Command::new("git").args(["rev-parse", "--short", "HEAD"]).output().ok()?;
            output
                .status
                .success()
                .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
        })
        .unwrap_or_else(|| String::from("unknown"));

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
}
