pub mod gpu;
pub mod particles;
pub mod shader;

pub use gpu::{GpuDevice, GpuResourceBridge, HeadlessDevice, UniformBlock, WgpuDevice};
pub use particles::{Emitter, Integrator, Particle, ParticlePool};
pub use shader::{LoadReport, ProgramKind, ProgramState, ShaderManager};
