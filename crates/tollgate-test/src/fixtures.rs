//! Candidate builders for the built-in action kinds.

use tollgate_approval::ActionCandidate;

/// A `write-file` candidate for `path`.
#[must_use]
pub fn write_file(path: &str) -> ActionCandidate {
    ActionCandidate::new("write-file")
        .with_param("filePath", path)
        .with_param("content", "hello")
}

/// An `install-package` candidate for `package`.
#[must_use]
pub fn install_package(package: &str) -> ActionCandidate {
    ActionCandidate::new("install-package").with_param("packageName", package)
}

/// A `run-shell-command` candidate for `command`.
#[must_use]
pub fn shell_command(command: &str) -> ActionCandidate {
    ActionCandidate::new("run-shell-command").with_param("command", command)
}

/// A low-severity write outside any sensitive location.
#[must_use]
pub fn low_action() -> ActionCandidate {
    write_file("notes.txt")
}

/// A medium-severity write to a source file.
#[must_use]
pub fn medium_action() -> ActionCandidate {
    write_file("src/main.rs")
}

/// A high-severity write to an env file.
#[must_use]
pub fn high_action() -> ActionCandidate {
    write_file(".env")
}

/// A critical-severity destructive command.
#[must_use]
pub fn critical_action() -> ActionCandidate {
    shell_command("rm -rf build")
}

/// A candidate whose parameters carry a credential.
#[must_use]
pub fn credential_action() -> ActionCandidate {
    ActionCandidate::new("write-file")
        .with_param("filePath", "deploy.txt")
        .with_param("api_token", serde_json::json!("abc123"))
}
