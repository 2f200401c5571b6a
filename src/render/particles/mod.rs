//! 粒子模拟
//!
//! 单线程、逐帧推进的 CPU 粒子模拟，结果每帧整体上传到 GPU 作为实例数据。
//!
//! ```text
//! timestep ─► Emitter::emit ─► ParticlePool ◄─ Integrator::step
//!                                   │
//!                                   └─► snapshot() ─► GpuResourceBridge
//! ```
//!
//! ## 使用示例
//!
//! ```
//! use std::num::NonZeroUsize;
//! use particle_workshop::config::EmitterConfig;
//! use particle_workshop::core::rng::XorShift32;
//! use particle_workshop::render::particles::{Emitter, Integrator, ParticlePool};
//!
//! let mut pool = ParticlePool::new(NonZeroUsize::new(1000).unwrap());
//! let mut emitter = Emitter::new(EmitterConfig::default());
//! let integrator = Integrator::new(-40.0);
//! let mut rng = XorShift32::default();
//!
//! let spawned = emitter.emit(0.1, &mut pool, &mut rng);
//! integrator.step(0.1, &mut pool);
//! assert_eq!(pool.cursor(), spawned as usize);
//! ```

pub mod emitter;
pub mod integrator;
pub mod particle;

mod property_tests;

pub use emitter::Emitter;
pub use integrator::Integrator;
pub use particle::{Particle, ParticlePool};
