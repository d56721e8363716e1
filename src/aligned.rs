use std::{
    alloc::{self, Layout},
    fmt,
    ops::{Deref, DerefMut},
    ptr::NonNull,
};

/// Alignment of every [`AlignedVec`] allocation, wide enough for 256-bit loads.
pub const ALIGNMENT: usize = 32;

/// Allocations are rounded up to a multiple of this many elements.
pub const PADDING: usize = 8;

/// Fixed-length `u32` buffer starting on a 32-byte boundary. The allocation
/// is zero-filled and padded to a multiple of 8 elements, so a block kernel
/// may load the final partial block without leaving the allocation.
pub struct AlignedVec {
    ptr: NonNull<u32>,
    len: usize,
    capacity: usize,
}

// Owns its allocation like a Vec<u32>.
unsafe impl Send for AlignedVec {}
unsafe impl Sync for AlignedVec {}

impl AlignedVec {
    /// `len` zeroed elements. Aborts through `handle_alloc_error` when the
    /// allocator fails.
    pub fn zeroed(len: usize) -> Self {
        let capacity = padded_len(len);
        if capacity == 0 {
            return Self {
                ptr: aligned_dangling(),
                len: 0,
                capacity: 0,
            };
        }

        let layout = layout_for(capacity);
        let raw = unsafe { alloc::alloc_zeroed(layout) } as *mut u32;
        let ptr = match NonNull::new(raw) {
            Some(ptr) => ptr,
            None => alloc::handle_alloc_error(layout),
        };
        Self { ptr, len, capacity }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of allocated elements, always a multiple of 8.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The logical elements followed by the zeroed padding.
    pub fn padded(&self) -> &[u32] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.capacity) }
    }

    pub fn as_slice(&self) -> &[u32] {
        self
    }
}

fn padded_len(len: usize) -> usize {
    match len.checked_add(PADDING - 1) {
        Some(n) => n / PADDING * PADDING,
        None => capacity_overflow(),
    }
}

fn layout_for(capacity: usize) -> Layout {
    match Layout::array::<u32>(capacity).and_then(|l| l.align_to(ALIGNMENT)) {
        Ok(layout) => layout,
        Err(_) => capacity_overflow(),
    }
}

fn capacity_overflow() -> ! {
    panic!("capacity overflow")
}

fn aligned_dangling() -> NonNull<u32> {
    // An empty buffer still reports an aligned address.
    match NonNull::new(ALIGNMENT as *mut u32) {
        Some(ptr) => ptr,
        None => unreachable!(),
    }
}

impl Drop for AlignedVec {
    fn drop(&mut self) {
        if self.capacity != 0 {
            unsafe { alloc::dealloc(self.ptr.as_ptr() as *mut u8, layout_for(self.capacity)) }
        }
    }
}

impl Deref for AlignedVec {
    type Target = [u32];

    fn deref(&self) -> &[u32] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl DerefMut for AlignedVec {
    fn deref_mut(&mut self) -> &mut [u32] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl From<&[u32]> for AlignedVec {
    fn from(values: &[u32]) -> Self {
        let mut vec = Self::zeroed(values.len());
        vec.copy_from_slice(values);
        vec
    }
}

impl FromIterator<u32> for AlignedVec {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let values: Vec<u32> = iter.into_iter().collect();
        Self::from(values.as_slice())
    }
}

impl Clone for AlignedVec {
    fn clone(&self) -> Self {
        Self::from(self.as_slice())
    }
}

impl PartialEq for AlignedVec {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for AlignedVec {}

impl fmt::Debug for AlignedVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
