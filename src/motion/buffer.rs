//! Bounded ring of Blocks shared between the main loop and the step interrupt.
//!
//! The main loop is the only producer (it moves `tail`), the step interrupt
//! the only consumer (it moves `head`). Both indices are free-running counters
//! reduced modulo `N`, so all `N` slots are usable. Slot contents are only
//! touched inside critical sections.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use critical_section::{CriticalSection, Mutex};
use heapless::Vec;

use crate::error::BufferError;

use super::block::Block;
use super::request::ResolvedMove;

/// Fixed-capacity plan buffer.
pub struct PlanBuffer<const N: usize> {
    slots: [Mutex<RefCell<Block>>; N],
    busy: [AtomicBool; N],
    head: AtomicUsize,
    tail: AtomicUsize,
}

impl<const N: usize> PlanBuffer<N> {
    /// Empty buffer.
    pub const fn new() -> Self {
        Self {
            slots: [const { Mutex::new(RefCell::new(Block::EMPTY)) }; N],
            busy: [const { AtomicBool::new(false) }; N],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Number of slots.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of queued Blocks, including one being executed.
    #[inline]
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        self.tail.load(Ordering::Acquire).wrapping_sub(head)
    }

    /// No Block is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every slot is taken.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= N
    }

    /// Append a Block. Producer side only.
    pub fn push(&self, block: &Block) -> Result<(), BufferError> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail.wrapping_sub(self.head.load(Ordering::Acquire)) >= N {
            return Err(BufferError::Full { capacity: N });
        }

        let slot = tail % N;
        critical_section::with(|cs| {
            *self.slots[slot].borrow_ref_mut(cs) = *block;
            self.busy[slot].store(false, Ordering::Release);
        });
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// Counters of the first and one-past-last queued Blocks.
    #[inline]
    pub fn bounds(&self) -> (usize, usize) {
        let head = self.head.load(Ordering::Acquire);
        (head, self.tail.load(Ordering::Acquire))
    }

    /// Counter of the oldest Block, if any. Consumer side.
    pub fn head(&self) -> Option<usize> {
        let (head, tail) = self.bounds();
        (head != tail).then_some(head)
    }

    /// Whether the Block at `index` is being executed.
    #[inline]
    pub fn is_busy(&self, index: usize) -> bool {
        self.busy[index % N].load(Ordering::Acquire)
    }

    /// Mark the Block at `index` busy and copy it out. Consumer side.
    pub fn latch(&self, index: usize) -> Block {
        let slot = index % N;
        critical_section::with(|cs| {
            self.busy[slot].store(true, Ordering::Release);
            *self.slots[slot].borrow_ref(cs)
        })
    }

    /// Free the Block at `index`, which must be the head. Consumer side.
    pub fn retire(&self, index: usize) {
        self.busy[index % N].store(false, Ordering::Release);
        self.head.store(index.wrapping_add(1), Ordering::Release);
    }

    /// Copy of the Block at `index`.
    pub fn read(&self, index: usize) -> Block {
        critical_section::with(|cs| *self.slots[index % N].borrow_ref(cs))
    }

    /// Overwrite the Block at `index` unless it has been latched.
    ///
    /// Returns `false` and leaves the slot untouched if it is busy.
    pub fn write_unless_busy(&self, index: usize, block: &Block) -> bool {
        let slot = index % N;
        critical_section::with(|cs| {
            if self.busy[slot].load(Ordering::Acquire) {
                return false;
            }
            *self.slots[slot].borrow_ref_mut(cs) = *block;
            true
        })
    }

    /// Drop every queued Block that is not executing and collect their
    /// requests in queue order.
    ///
    /// Takes the caller's critical section so the drop can be made atomic
    /// with other shared updates.
    pub fn drain_pending(&self, cs: CriticalSection<'_>, out: &mut Vec<ResolvedMove, N>) {
        let (head, tail) = self.bounds();
        let first = if head != tail && self.is_busy(head) {
            head.wrapping_add(1)
        } else {
            head
        };

        let pending = tail.wrapping_sub(first);
        for k in 0..pending {
            let slot = first.wrapping_add(k) % N;
            // Capacity matches the buffer, so this never overflows
            let _ = out.push(self.slots[slot].borrow_ref(cs).request);
        }
        self.tail.store(first, Ordering::Release);
    }

    /// Copy of every queued Block in queue order.
    pub fn snapshot(&self) -> Vec<Block, N> {
        critical_section::with(|cs| {
            let (head, tail) = self.bounds();
            let mut blocks = Vec::new();
            for k in 0..tail.wrapping_sub(head) {
                let _ = blocks.push(*self.slots[head.wrapping_add(k) % N].borrow_ref(cs));
            }
            blocks
        })
    }
}

impl<const N: usize> Default for PlanBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
