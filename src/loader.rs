use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use libloading::Library;
use tracing::{debug, warn};

use crate::signer::native::NativeSigner;

/// Resolve the platform's signer shared library, load it, and wrap it
/// in the FFI adapter.  Any failure here is fatal to the process; the
/// caller emits the diagnostic frame and exits.
pub fn load() -> Result<NativeSigner> {
	let path = resolve_path()?;
	debug!(path = %path.display(), "loading signer library");
	let lib = load_library(&path)?;
	Ok(NativeSigner::new(lib))
}

/// The library file name for a platform/architecture pair.
fn library_filename(os: &str, arch: &str) -> Result<&'static str> {
	match (os, arch) {
		("macos", "aarch64") => Ok("signer-arm64.dylib"),
		("macos", _) => Ok("signer-amd64.dylib"),
		("linux", _) => Ok("signer-amd64.so"),
		_ => bail!("unsupported platform: {os} {arch}"),
	}
}

/// The signer libraries ship in a `signers/` directory next to the
/// bridge executable.
fn resolve_path() -> Result<PathBuf> {
	let exe = env::current_exe().context("cannot locate the bridge executable")?;
	let dir = exe.parent().unwrap_or_else(|| Path::new(".")).join("signers");
	let path = dir.join(library_filename(env::consts::OS, env::consts::ARCH)?);
	if !path.exists() {
		bail!("signer library missing: {}", path.display());
	}
	Ok(path)
}

fn load_library(path: &Path) -> Result<Library> {
	// SAFETY: loading runs the library's initializers; the signer
	// library ships alongside the bridge and is trusted.
	match unsafe { Library::new(path) } {
		Ok(lib) => Ok(lib),
		Err(first) => {
			if env::consts::OS == "macos" && first.to_string().contains("code signature") {
				warn!("signer library rejected by code signing, re-signing ad hoc");
				remediate_code_signature(path);
				// SAFETY: as above.
				return unsafe { Library::new(path) }.with_context(|| {
					format!("failed to load {} after re-signing", path.display())
				});
			}
			Err(first).with_context(|| format!("failed to load {}", path.display()))
		}
	}
}

/// Strip the quarantine attribute and re-sign ad hoc.  Tool failures
/// are ignored; the retried load reports the real error.
fn remediate_code_signature(path: &Path) {
	let _ = Command::new("/usr/bin/xattr")
		.args(["-d", "com.apple.quarantine"])
		.arg(path)
		.output();
	let _ = Command::new("/usr/bin/codesign")
		.args(["--force", "--sign", "-"])
		.arg(path)
		.output();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn filenames_cover_the_supported_matrix() {
		assert_eq!(
			library_filename("macos", "aarch64").unwrap(),
			"signer-arm64.dylib"
		);
		assert_eq!(
			library_filename("macos", "x86_64").unwrap(),
			"signer-amd64.dylib"
		);
		assert_eq!(library_filename("linux", "x86_64").unwrap(), "signer-amd64.so");
		// Linux has a single build regardless of reported arch.
		assert_eq!(
			library_filename("linux", "aarch64").unwrap(),
			"signer-amd64.so"
		);
	}

	#[test]
	fn other_platforms_are_rejected() {
		let err = library_filename("windows", "x86_64").unwrap_err();
		assert!(err.to_string().contains("unsupported platform"));
	}
}
