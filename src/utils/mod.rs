use candle_core::Device;

use crate::core::LocalConfig;

/// Loads the device requested by the binding configuration.
///
/// Any positive `gpu_layers` asks for an accelerator: CUDA device 0, then
/// Metal, falling back to CPU when neither is available. candle keeps the
/// whole model on one device, so the layer count only acts as a switch.
pub fn load_device(config: &LocalConfig) -> anyhow::Result<Device> {
    check_instruction_set(config.use_avx2);

    if config.gpu_layers == 0 {
        return Ok(Device::Cpu);
    }

    if candle_core::utils::cuda_is_available() {
        tracing::info!(gpu_layers = config.gpu_layers, "using CUDA device 0");
        Ok(Device::new_cuda(0)?)
    } else if candle_core::utils::metal_is_available() {
        tracing::info!(gpu_layers = config.gpu_layers, "using Metal device 0");
        Ok(Device::new_metal(0)?)
    } else {
        tracing::warn!(
            gpu_layers = config.gpu_layers,
            "GPU offloading requested but no accelerator is available, using CPU"
        );
        Ok(Device::Cpu)
    }
}

/// Compare the requested kernel flavour with what candle was compiled for.
fn check_instruction_set(use_avx2: bool) {
    let with_avx = candle_core::utils::with_avx();
    if use_avx2 && !with_avx {
        tracing::warn!("use_avx2 is set but candle was built without AVX support");
    } else if !use_avx2 && with_avx {
        tracing::info!("use_avx2 is unset; candle was built with AVX and will keep using it");
    }
}
