// Back buffer - Render target state of the output window
//
// State changes are remembered while the back buffer is inactive and
// applied to the device once a pipeline activates it.

use crate::display::ScissorBox;
use crate::gpu::GpuDevice;

/// Output framebuffer state: size, clear color, blending and scissoring
#[derive(Debug, Clone, Default)]
pub struct BackBuffer {
    active: bool,
    width: u32,
    height: u32,
    clear_color: [f32; 4],
    blend: bool,
    scissor_test: bool,
    scissor_box: ScissorBox,
}

impl BackBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn scissor_test_enabled(&self) -> bool {
        self.scissor_test
    }

    pub fn scissor_box(&self) -> ScissorBox {
        self.scissor_box
    }

    /// Apply the whole state to the device and track further changes
    pub fn activate(&mut self, device: &mut dyn GpuDevice) {
        self.active = true;
        device.set_viewport(self.width, self.height);
        device.set_clear_color(self.clear_color);
        device.set_blend(self.blend);
        device.set_scissor_test(self.scissor_test);
        let ScissorBox { x, y, width, height } = self.scissor_box;
        device.set_scissor_box(x, y, width, height);
    }

    /// Stop forwarding state changes, e.g. after the context is gone
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn set_dimensions(&mut self, device: &mut dyn GpuDevice, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        if self.active {
            device.set_viewport(width, height);
        }
    }

    pub fn set_clear_color(&mut self, device: &mut dyn GpuDevice, color: [f32; 4]) {
        self.clear_color = color;
        if self.active {
            device.set_clear_color(color);
        }
    }

    pub fn enable_blend(&mut self, device: &mut dyn GpuDevice, enable: bool) {
        self.blend = enable;
        if self.active {
            device.set_blend(enable);
        }
    }

    pub fn enable_scissor_test(&mut self, device: &mut dyn GpuDevice, enable: bool) {
        self.scissor_test = enable;
        if self.active {
            device.set_scissor_test(enable);
        }
    }

    pub fn set_scissor_box(&mut self, device: &mut dyn GpuDevice, scissor: ScissorBox) {
        self.scissor_box = scissor;
        if self.active {
            device.set_scissor_box(scissor.x, scissor.y, scissor.width, scissor.height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{Capabilities, SoftwareDevice};

    #[test]
    fn test_state_applied_on_activation() {
        let mut device = SoftwareDevice::new(Capabilities::desktop());
        let mut back_buffer = BackBuffer::new();

        back_buffer.set_dimensions(&mut device, 64, 32);
        assert_eq!(device.width(), 0);

        back_buffer.activate(&mut device);
        assert_eq!((device.width(), device.height()), (64, 32));

        back_buffer.set_dimensions(&mut device, 16, 16);
        assert_eq!(device.width(), 16);

        back_buffer.deactivate();
        back_buffer.set_dimensions(&mut device, 8, 8);
        assert_eq!(device.width(), 16);
        assert_eq!(back_buffer.width(), 8);
    }
}
