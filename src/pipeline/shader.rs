// Shader pipeline
//
// Owns the default textured-quad program and feeds the modulation color
// through its color uniform.

use crate::gpu::{DeviceError, GpuDevice, ProgramId};

#[derive(Debug)]
pub struct ShaderPipeline {
    program: ProgramId,
    color: [f32; 4],
}

impl ShaderPipeline {
    /// Build the default program on the device
    pub fn new(device: &mut dyn GpuDevice) -> Result<Self, DeviceError> {
        let program = device.create_program()?;
        Ok(ShaderPipeline {
            program,
            color: [1.0; 4],
        })
    }

    pub fn program(&self) -> ProgramId {
        self.program
    }

    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    pub fn activate(&mut self, device: &mut dyn GpuDevice) {
        device.use_program(Some(self.program));
        device.set_program_color(self.program, self.color);
    }

    pub fn set_color(&mut self, device: &mut dyn GpuDevice, color: [f32; 4]) {
        self.color = color;
        device.set_program_color(self.program, color);
    }

    pub fn destroy(self, device: &mut dyn GpuDevice) {
        device.use_program(None);
        device.delete_program(self.program);
    }
}
