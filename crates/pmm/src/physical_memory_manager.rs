//! Physical memory manager using a frame bitmap.
//!
//! The manager is the single authority over which physical page frames are
//! free. The boot sequence registers every region the boot loader reported,
//! then calls [`init`](PhysicalMemoryManager::init) exactly once; from then on
//! the virtual-memory layer and the module loader allocate and release frames
//! through it for the life of the system.
//!
//! Allocation policy is deterministic lowest-address-first: early boot
//! consumers (page-table bootstrap, module loading) rely on getting
//! predictable low addresses, and the tests rely on the determinism.

use core::fmt;

use spin::Mutex;

use crate::{
    BootMemoryRegion, FrameBitmap, HumanSize, PhysicalAddress, Region, RegionTable, arch,
};

/// Errors reported by the physical memory manager and its backing stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PmmError {
    /// The region table is full; the memory topology is incomplete. Fatal at boot.
    CapacityExceeded,
    /// No free page frame is left.
    OutOfMemory,
    /// The address or frame lies outside the bitmap's covered span.
    OutOfRange,
    /// An allocation operation was invoked before `init()`.
    UseBeforeInit,
    /// `init()` was called twice, or a region was registered after `init()`.
    AlreadyInitialized,
}

impl fmt::Display for PmmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            PmmError::CapacityExceeded => "region table capacity exceeded",
            PmmError::OutOfMemory => "no free page frame available",
            PmmError::OutOfRange => "address outside tracked physical memory",
            PmmError::UseBeforeInit => "physical memory manager not initialized",
            PmmError::AlreadyInitialized => "physical memory manager already initialized",
        };
        f.write_str(message)
    }
}

/// Lifecycle phase of the manager.
///
/// Regions may only be registered before initialization, and frames may only
/// be allocated after it. Every operation checks the phase instead of
/// trusting callers to sequence the boot correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No regions registered yet.
    Uninitialized,
    /// At least one region registered; the bitmap does not exist yet.
    Configured,
    /// `init()` has run; the allocation surface is live.
    Active,
}

struct Inner {
    phase: Phase,
    regions: RegionTable,
    bitmap: FrameBitmap,
    /// Frames currently marked free.
    available_pages: usize,
    /// Frames marked free at initialization, i.e. total usable RAM capacity.
    max_available_pages: usize,
}

/// The physical page-frame allocator.
///
/// All state lives behind one spin lock so that a bit transition and its
/// counter update are a single critical section: two concurrent callers can
/// never be handed the same frame, and the counters cannot drift from the
/// bitmap. The lock is held only for the bitmap scan and bit/counter writes;
/// no I/O happens inside the critical section.
pub struct PhysicalMemoryManager {
    inner: Mutex<Inner>,
}

impl PhysicalMemoryManager {
    /// Creates a new manager with no regions registered.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                phase: Phase::Uninitialized,
                regions: RegionTable::new(),
                bitmap: FrameBitmap::empty(),
                available_pages: 0,
                max_available_pages: 0,
            }),
        }
    }

    /// Returns the current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.inner.lock().phase
    }

    /// Registers a boot-reported memory region.
    ///
    /// Only valid before [`init`](Self::init); the memory topology is fixed
    /// for the life of the system once the bitmap has been sized.
    pub fn add_region(&self, region: Region) -> Result<(), PmmError> {
        let mut inner = self.inner.lock();
        if inner.phase == Phase::Active {
            return Err(PmmError::AlreadyInitialized);
        }
        inner.regions.push(region)?;
        inner.phase = Phase::Configured;
        Ok(())
    }

    /// Registers every entry of a boot-loader memory map.
    ///
    /// Empty entries are skipped; they contribute no frames.
    pub fn add_boot_map<R: BootMemoryRegion>(
        &self,
        boot_map: impl IntoIterator<Item = R>,
    ) -> Result<(), PmmError> {
        let mut inner = self.inner.lock();
        if inner.phase == Phase::Active {
            return Err(PmmError::AlreadyInitialized);
        }
        for entry in boot_map {
            let Some(region) = Region::from_boot(&entry) else {
                continue;
            };
            inner.regions.push(region)?;
            inner.phase = Phase::Configured;
        }
        Ok(())
    }

    /// Sizes the bitmap and marks every RAM frame free. Must run exactly once,
    /// after all regions are registered and before any allocation.
    ///
    /// Frames inside ROM or unknown regions stay permanently unavailable.
    pub fn init(&self) -> Result<(), PmmError> {
        let mut inner = self.inner.lock();
        if inner.phase == Phase::Active {
            return Err(PmmError::AlreadyInitialized);
        }

        // The bitmap covers the span from address zero through the highest
        // registered end, one bit per frame.
        let frames = inner
            .regions
            .highest_end()
            .map(|end| end.frame_number().as_usize() + 1)
            .unwrap_or(0);
        let mut bitmap = FrameBitmap::with_frames(frames);

        let mut usable = 0usize;
        for region in inner.regions.iter() {
            if !region.is_ram() {
                continue;
            }
            for frame in region.frames() {
                bitmap.set_free(frame)?;
            }
            usable += region.frame_count();
        }

        inner.bitmap = bitmap;
        inner.available_pages = usable;
        inner.max_available_pages = usable;
        inner.phase = Phase::Active;

        log::info!(
            "physical memory: {} regions, {} usable frames ({})",
            inner.regions.len(),
            usable,
            HumanSize::new(usable * arch::PAGE_SIZE)
        );
        Ok(())
    }

    /// Allocates the lowest-addressed free frame, marking it used.
    ///
    /// Fails with [`PmmError::OutOfMemory`] when no free frame exists; early
    /// boot callers treat that as fatal since the kernel cannot proceed
    /// without backing memory.
    pub fn get_available_page(&self) -> Result<PhysicalAddress, PmmError> {
        let mut inner = self.inner.lock();
        if inner.phase != Phase::Active {
            return Err(PmmError::UseBeforeInit);
        }
        let frame = inner.bitmap.first_free().ok_or(PmmError::OutOfMemory)?;
        inner.bitmap.set_used(frame)?;
        inner.available_pages -= 1;
        Ok(frame.start())
    }

    /// Marks the frame containing `addr` used.
    ///
    /// Idempotent: a frame that is already used stays used and the free
    /// counter is not touched again.
    pub fn mark_used(&self, addr: PhysicalAddress) -> Result<(), PmmError> {
        let mut inner = self.inner.lock();
        if inner.phase != Phase::Active {
            return Err(PmmError::UseBeforeInit);
        }
        let frame = addr.frame_number();
        if inner.bitmap.get(frame)? {
            inner.bitmap.set_used(frame)?;
            inner.available_pages -= 1;
        }
        Ok(())
    }

    /// Marks the frame containing `addr` free.
    ///
    /// Idempotent: a frame that is already free stays free and the counter is
    /// not touched again. Freeing a frame that was never RAM is caller misuse;
    /// the counter invariant is asserted in debug builds.
    pub fn mark_free(&self, addr: PhysicalAddress) -> Result<(), PmmError> {
        let mut inner = self.inner.lock();
        if inner.phase != Phase::Active {
            return Err(PmmError::UseBeforeInit);
        }
        let frame = addr.frame_number();
        if !inner.bitmap.get(frame)? {
            inner.bitmap.set_free(frame)?;
            inner.available_pages += 1;
            debug_assert!(inner.available_pages <= inner.max_available_pages);
        }
        Ok(())
    }

    /// Returns true iff the frame containing `addr` is free.
    pub fn page_available(&self, addr: PhysicalAddress) -> Result<bool, PmmError> {
        let inner = self.inner.lock();
        if inner.phase != Phase::Active {
            return Err(PmmError::UseBeforeInit);
        }
        inner.bitmap.get(addr.frame_number())
    }

    /// Returns the number of frames currently free.
    pub fn ram_available(&self) -> usize {
        self.inner.lock().available_pages
    }

    /// Returns the number of frames free right after initialization, i.e. the
    /// total usable RAM capacity.
    pub fn ram_max(&self) -> usize {
        self.inner.lock().max_available_pages
    }

    /// Logs a diagnostic listing of all registered regions and the frame
    /// counters. Non-mutating.
    pub fn describe(&self) {
        let inner = self.inner.lock();
        log::info!("{} memory regions:", inner.regions.len());
        for (index, region) in inner.regions.iter().enumerate() {
            log::info!(
                "  region {:2}: {} ({})",
                index,
                region,
                HumanSize::new(region.size())
            );
        }
        log::info!(
            "frames free: {} / {}",
            inner.available_pages,
            inner.max_available_pages
        );
    }
}

impl Default for PhysicalMemoryManager {
    fn default() -> Self {
        Self::new()
    }
}
