use candle_core::Device;
use tracing::info;

/// Metal when built with the `metal` feature and a GPU answers, CPU otherwise.
pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(dev) => { info!("🚀 Device: Metal (MPS)"); return dev; }
            Err(e) => tracing::warn!("Metal unavailable, falling back to CPU: {}", e),
        }
    }
    info!("🖥️  Device: CPU");
    Device::Cpu
}
