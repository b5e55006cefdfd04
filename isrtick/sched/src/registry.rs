//! Task registry
//!
//! A fixed arena of descriptor slots threaded by two index lists: the order
//! list the dispatcher walks (most recently registered first) and the free
//! list of empty slots. Handles carry a per-slot generation so a handle that
//! outlives its task is rejected instead of aliasing the slot's next tenant.

use core::fmt;

use isrtick_core::{Duration, Error, Instant, Result};

/// Zero-argument task callback
pub type Callback = fn();

/// Handle to a registered task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    index: u8,
    generation: u8,
}

impl TaskId {
    /// Slot index inside the registry
    pub const fn index(self) -> u8 {
        self.index
    }

    /// Generation of the slot when the task was registered
    pub const fn generation(self) -> u8 {
        self.generation
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}.{}", self.index, self.generation)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TaskId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "task#{}.{}", self.index, self.generation);
    }
}

/// Schedule and identity of one periodic callback
#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    pub(crate) period: Duration,
    pub(crate) next_due: Instant,
    pub(crate) callback: Callback,
    next: Option<u8>,
}

impl Descriptor {
    /// Interval between dispatches
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Clock value of the next dispatch
    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    /// Function invoked on dispatch
    pub fn callback(&self) -> Callback {
        self.callback
    }
}

#[derive(Clone, Copy)]
enum Slot {
    Free { next_free: Option<u8> },
    Used(Descriptor),
}

#[derive(Clone, Copy)]
struct Entry {
    generation: u8,
    slot: Slot,
}

/// Fixed-capacity task registry
pub struct Registry<const N: usize> {
    entries: [Entry; N],
    head: Option<u8>,
    free: Option<u8>,
    len: u8,
}

impl<const N: usize> Registry<N> {
    const CAPACITY_FITS: () = assert!(N <= u8::MAX as usize, "registry capacity exceeds 255");

    const EMPTY: Entry = Entry {
        generation: 0,
        slot: Slot::Free { next_free: None },
    };

    /// Create an empty registry
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_FITS;

        let mut entries = [Self::EMPTY; N];
        let mut i = 0;
        while i + 1 < N {
            entries[i].slot = Slot::Free {
                next_free: Some((i + 1) as u8),
            };
            i += 1;
        }

        Self {
            entries,
            head: None,
            free: if N > 0 { Some(0) } else { None },
            len: 0,
        }
    }

    /// Link a new descriptor at the head of the order list
    pub fn insert(&mut self, period: Duration, next_due: Instant, callback: Callback) -> Result<TaskId> {
        if !period.is_valid_period() {
            return Err(Error::InvalidPeriod);
        }
        let index = self.free.ok_or(Error::RegistryFull)?;
        let entry = &mut self.entries[index as usize];

        let Slot::Free { next_free } = entry.slot else {
            return Err(Error::RegistryFull);
        };
        self.free = next_free;

        entry.slot = Slot::Used(Descriptor {
            period,
            next_due,
            callback,
            next: self.head,
        });
        self.head = Some(index);
        self.len += 1;

        Ok(TaskId {
            index,
            generation: entry.generation,
        })
    }

    /// Unlink a descriptor and return its slot to the free list
    pub fn remove(&mut self, id: TaskId) -> Result<Descriptor> {
        if self.get(id).is_none() {
            return Err(Error::UnknownTask);
        }

        // Find the predecessor in the order list
        let mut prev: Option<u8> = None;
        let mut cursor = self.head;
        while let Some(index) = cursor {
            if index == id.index {
                break;
            }
            prev = cursor;
            cursor = self.used(index).and_then(|d| d.next);
        }

        let entry = &mut self.entries[id.index as usize];
        let Slot::Used(descriptor) = entry.slot else {
            return Err(Error::UnknownTask);
        };
        entry.slot = Slot::Free { next_free: self.free };
        entry.generation = entry.generation.wrapping_add(1);
        self.free = Some(id.index);
        self.len -= 1;

        match prev {
            None => self.head = descriptor.next,
            Some(p) => {
                if let Slot::Used(before) = &mut self.entries[p as usize].slot {
                    before.next = descriptor.next;
                }
            }
        }

        Ok(descriptor)
    }

    /// Look up a live descriptor
    pub fn get(&self, id: TaskId) -> Option<&Descriptor> {
        let entry = self.entries.get(id.index as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        match &entry.slot {
            Slot::Used(d) => Some(d),
            Slot::Free { .. } => None,
        }
    }

    /// Look up a live descriptor mutably
    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Descriptor> {
        let entry = self.entries.get_mut(id.index as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        match &mut entry.slot {
            Slot::Used(d) => Some(d),
            Slot::Free { .. } => None,
        }
    }

    /// Check whether the handle refers to a live descriptor
    pub fn contains(&self, id: TaskId) -> bool {
        self.get(id).is_some()
    }

    /// Number of registered tasks
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Check if no task is registered
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if every slot is occupied
    pub fn is_full(&self) -> bool {
        self.free.is_none()
    }

    /// Maximum number of tasks
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Iterate in dispatch order (most recently registered first)
    pub fn iter(&self) -> Iter<'_, N> {
        Iter {
            registry: self,
            cursor: self.head,
        }
    }

    fn used(&self, index: u8) -> Option<&Descriptor> {
        match &self.entries[index as usize].slot {
            Slot::Used(d) => Some(d),
            Slot::Free { .. } => None,
        }
    }
}

impl<const N: usize> Default for Registry<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over registered tasks in dispatch order
pub struct Iter<'a, const N: usize> {
    registry: &'a Registry<N>,
    cursor: Option<u8>,
}

impl<'a, const N: usize> Iterator for Iter<'a, N> {
    type Item = (TaskId, &'a Descriptor);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let entry = &self.registry.entries[index as usize];
        let Slot::Used(descriptor) = &entry.slot else {
            self.cursor = None;
            return None;
        };
        self.cursor = descriptor.next;
        Some((
            TaskId {
                index,
                generation: entry.generation,
            },
            descriptor,
        ))
    }
}
