#![cfg_attr(not(test), no_std)]

//! # Caldera kernel core
//!
//! Boot-time glue around the physical memory manager: parses the boot
//! loader's memory map, owns the process-wide manager instance, and installs
//! the logging console. The architecture entry stub (descriptor tables,
//! interrupt setup, display drivers) lives outside this crate; during early
//! boot it installs the console, then hands the memory map to
//! [`mem::init_pmm`] before enabling interrupts.

pub mod console;
pub mod mem;
pub mod multiboot;
pub mod serial;
