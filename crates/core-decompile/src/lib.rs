//! Bridges the container codec and the macro decompiler: collects shader
//! payloads per platform/pass/stage, feeds them through restoration, and
//! reconstructs the `varying.def.sc` interface file.

mod shaders;
mod varying;

pub use shaders::{RestoreConfig, RestoredShader, restore_shaders};
pub use varying::restore_varying;

use tracing::debug;

/// Forwards decompiler search diagnostics to `tracing`.
pub struct TracingObserver;

impl core_restore::SearchObserver for TracingObserver {
    fn slow_search(&self) {
        debug!("expression search falling back to brute force");
    }

    fn not_found(&self) {
        debug!("expression search finished without a perfect match");
    }
}
