//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `listvault_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("listvault_core ping={}", listvault_core::ping());
    println!("listvault_core version={}", listvault_core::core_version());
}
