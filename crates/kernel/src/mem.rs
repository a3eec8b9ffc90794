//! Kernel-wide physical memory state.
//!
//! Owns the single [`PhysicalMemoryManager`] instance and the boot-time
//! bring-up flow: register every boot-loader-reported region, then initialize
//! the manager exactly once. This runs before interrupts are enabled; after
//! that, the paging layer and the module loader go through [`pmm`] to acquire
//! and release backing frames.

use pmm::PhysicalMemoryManager;
use spin::Once;

use crate::multiboot::MemoryMap;

static PMM: Once<PhysicalMemoryManager> = Once::new();

/// Returns the process-wide physical memory manager.
pub fn pmm() -> &'static PhysicalMemoryManager {
    PMM.call_once(PhysicalMemoryManager::new)
}

/// Brings up the frame allocator from the boot loader's memory map.
///
/// A memory map that does not fit the region table, or a failed
/// initialization, leaves the kernel without a trustworthy picture of
/// physical memory; there is no safe continuation, so both are fatal.
pub fn init_pmm(memory_map: &MemoryMap<'_>) {
    let pmm = pmm();

    pmm.add_boot_map(memory_map.entries())
        .expect("boot memory map does not fit the region table");
    pmm.init()
        .expect("physical memory manager initialization failed");

    pmm.describe();
}
