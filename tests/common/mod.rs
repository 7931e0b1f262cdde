// SPDX-License-Identifier: MIT OR Apache-2.0

//! Docker detection shared by the container-backed test suites.

use std::sync::OnceLock;

static DOCKER_AVAILABLE: OnceLock<bool> = OnceLock::new();

/// True when `docker ps` succeeds. Checked once per test binary.
#[allow(dead_code)]
pub fn is_docker_available() -> bool {
    *DOCKER_AVAILABLE.get_or_init(|| {
        std::process::Command::new("docker")
            .arg("ps")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    })
}

/// Explains on stderr why a container test did nothing.
#[allow(dead_code)]
pub fn print_docker_unavailable_warning(suite: &str) {
    eprintln!("\n⚠️  SKIPPED: {} - Docker is not available", suite);
    eprintln!("   Start a Docker daemon to run the etcd and Redis suites.\n");
}
