//! Build script: stamps the binary with build time, profile and git commit
//! for the health endpoint.

use std::process::Command;

fn git_commit() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let commit = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!commit.is_empty()).then_some(commit)
}

fn main() {
    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        chrono::Utc::now().to_rfc3339()
    );

    if let Ok(profile) = std::env::var("PROFILE") {
        println!("cargo:rustc-env=BUILD_PROFILE={}", profile);
    }

    if let Some(commit) = git_commit() {
        println!("cargo:rustc-env=GIT_COMMIT={}", commit);
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
}
