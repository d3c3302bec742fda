// Fixed-function pipeline
//
// Modulation goes through the per-vertex color; no program is bound.

use crate::gpu::GpuDevice;

#[derive(Debug, Clone)]
pub struct FixedPipeline {
    color: [f32; 4],
}

impl FixedPipeline {
    pub fn new() -> Self {
        FixedPipeline { color: [1.0; 4] }
    }

    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    pub fn activate(&mut self, device: &mut dyn GpuDevice) {
        device.use_program(None);
        device.set_vertex_color(self.color);
    }

    pub fn set_color(&mut self, device: &mut dyn GpuDevice, color: [f32; 4]) {
        self.color = color;
        device.set_vertex_color(color);
    }
}

impl Default for FixedPipeline {
    fn default() -> Self {
        Self::new()
    }
}
