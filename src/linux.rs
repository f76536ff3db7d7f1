//! Kernel I/O hints for archive reads and extracted writes
//!
//! All of these are advisory. Failures are ignored and every function is a
//! no-op off Linux.

pub use imp::{fadvise_dontneed, fadvise_sequential, madvise_sequential, preallocate_file};

#[cfg(target_os = "linux")]
mod imp {
    use std::fs::File;
    use std::num::NonZeroU64;

    use rustix::fs::{Advice, FallocateFlags, fadvise, fallocate};
    use rustix::mm::{Advice as MemAdvice, madvise};

    /// Mapped archive will be scanned front to back and soon.
    pub fn madvise_sequential(addr: *const u8, len: usize) {
        let ptr = addr.cast_mut().cast::<std::ffi::c_void>();
        for advice in [MemAdvice::Sequential, MemAdvice::WillNeed] {
            // SAFETY: callers pass the bounds of a live mapping
            let _ = unsafe { madvise(ptr, len, advice) };
        }
    }

    /// Reserve `size` bytes so streaming the entry does not fragment.
    pub fn preallocate_file(file: &File, size: u64) {
        if size > 0 {
            let _ = fallocate(file, FallocateFlags::empty(), 0, size);
        }
    }

    pub fn fadvise_sequential(file: &File, len: u64) {
        advise(file, len, Advice::Sequential);
    }

    /// Written output will not be read back by this process.
    pub fn fadvise_dontneed(file: &File, len: u64) {
        advise(file, len, Advice::DontNeed);
    }

    fn advise(file: &File, len: u64, advice: Advice) {
        let _ = fadvise(file, 0, NonZeroU64::new(len), advice);
    }
}

#[cfg(not(target_os = "linux"))]
mod imp {
    use std::fs::File;

    pub fn madvise_sequential(_addr: *const u8, _len: usize) {}

    pub fn preallocate_file(_file: &File, _size: u64) {}

    pub fn fadvise_sequential(_file: &File, _len: u64) {}

    pub fn fadvise_dontneed(_file: &File, _len: u64) {}
}
