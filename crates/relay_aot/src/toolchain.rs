//! External toolchain invocation and artifact caching.
//!
//! Generated source is content-hashed (FNV-1a) and compiled into a per-user
//! cache directory, so constructing a second simulator over the same netlist
//! and options skips the toolchain entirely. Compilation is one blocking
//! `rustc` invocation at construction time.

use std::path::PathBuf;
use std::process::Command;

use relay_harness::{Backend, SimError};

/// Returns whether `rustc` is present on this system.
pub fn toolchain_available() -> bool {
    Command::new("rustc")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// FNV-1a over the generated source, used as the cache key.
pub fn source_hash(source: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in source.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// The shared-object cache directory.
pub fn cache_dir() -> PathBuf {
    std::env::temp_dir().join("relay_aot_cache")
}

fn lib_file_name(hash: u64) -> String {
    let ext = if cfg!(target_os = "macos") {
        "dylib"
    } else if cfg!(target_os = "windows") {
        "dll"
    } else {
        "so"
    };
    format!("relay_{hash:016x}.{ext}")
}

fn toolchain_error(reason: impl Into<String>) -> SimError {
    SimError::CompileFailure {
        backend: Backend::Aot,
        reason: reason.into(),
    }
}

/// Compiles `source` into a loadable shared object, returning its path.
///
/// A cache hit returns the previously built artifact without invoking the
/// toolchain.
pub fn build(source: &str) -> Result<PathBuf, SimError> {
    let dir = cache_dir();
    let hash = source_hash(source);
    let lib_path = dir.join(lib_file_name(hash));
    if lib_path.exists() {
        return Ok(lib_path);
    }

    std::fs::create_dir_all(&dir).map_err(|e| toolchain_error(e.to_string()))?;
    let src_path = dir.join(format!("relay_{hash:016x}.rs"));
    std::fs::write(&src_path, source).map_err(|e| toolchain_error(e.to_string()))?;

    let output = Command::new("rustc")
        .args([
            "--crate-type=cdylib",
            "--edition=2021",
            "-C",
            "opt-level=3",
            "-C",
            "target-cpu=native",
            "-C",
            "panic=abort",
            "-C",
            "lto=thin",
            "-C",
            "codegen-units=1",
            "-A",
            "warnings",
            "-o",
        ])
        .arg(&lib_path)
        .arg(&src_path)
        .output()
        .map_err(|e| toolchain_error(format!("failed to spawn rustc: {e}")))?;

    if !output.status.success() {
        return Err(toolchain_error(String::from_utf8_lossy(&output.stderr).into_owned()));
    }
    Ok(lib_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_content_sensitive() {
        let a = source_hash("fn main() {}");
        assert_eq!(a, source_hash("fn main() {}"));
        assert_ne!(a, source_hash("fn main() { }"));
    }

    #[test]
    fn lib_name_encodes_hash() {
        let name = lib_file_name(0xDEAD);
        assert!(name.starts_with("relay_000000000000dead."));
    }
}
