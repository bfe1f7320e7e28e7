//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `routinely_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("routinely_core ping={}", routinely_core::ping());
    println!("routinely_core version={}", routinely_core::core_version());
}
