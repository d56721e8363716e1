//! Vectorized intersection of sorted `u32` posting lists.
//!
//! Kernels live in [`intersect`]; results are delivered through the sinks in
//! [`visitor`]. Block kernels share the immutable lookup tables in [`tables`]
//! and run on the instruction set selected through [`instructions::Isa`].

pub mod aligned;
pub mod instructions;
pub mod intersect;
pub mod tables;
pub mod visitor;

pub use aligned::AlignedVec;
pub use instructions::Isa;
pub use intersect::Kernel;
