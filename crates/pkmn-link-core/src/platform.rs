use std::sync::atomic::{AtomicU8, Ordering};

/// The two data lines of the link port, seen from the follower side.
pub trait LinkPins {
    /// Logic level of the partner's output (our SI).
    fn read_input(&self) -> bool;
    /// Drives our output line (the partner's SI).
    fn write_output(&mut self, high: bool);
}

pub trait LinkPort: Send {
    /// Transfer a byte over the link. Returns the byte received from the
    /// partner during the same eight clocks.
    fn transfer(&mut self, byte: u8) -> u8;
}

/// Maps an encoded species id to whatever index the frontend displays.
pub trait SpeciesTable: Send + Sync {
    fn display_index(&self, species: u8) -> u8;
}

/// Shows the raw species id.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawSpecies;

impl SpeciesTable for RawSpecies {
    fn display_index(&self, species: u8) -> u8 {
        species
    }
}

/// Lookup table indexed by species id; unknown ids display as 0.
impl<const N: usize> SpeciesTable for [u8; N] {
    fn display_index(&self, species: u8) -> u8 {
        self.get(species as usize).copied().unwrap_or(0)
    }
}

/// Work the edge path hands off to the non-interrupt side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeferredTask {
    /// The local record changed; its patch list must be rebuilt.
    RebuildPatchList = 1 << 0,
}

impl DeferredTask {
    const ALL: [DeferredTask; 1] = [DeferredTask::RebuildPatchList];
}

/// Queues deferred work. `schedule` is called from the edge path and must
/// return without blocking.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, task: DeferredTask);
}

/// Lock-free set of pending tasks.
///
/// Scheduling the same task twice before it runs coalesces into one run.
#[derive(Debug, Default)]
pub struct PendingTasks {
    bits: AtomicU8,
}

impl PendingTasks {
    pub const fn new() -> Self {
        Self {
            bits: AtomicU8::new(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bits.load(Ordering::Acquire) == 0
    }

    /// Removes and returns every pending task.
    pub fn take_all(&self) -> impl Iterator<Item = DeferredTask> + use<> {
        let bits = self.bits.swap(0, Ordering::AcqRel);
        DeferredTask::ALL
            .into_iter()
            .filter(move |task| bits & *task as u8 != 0)
    }
}

impl Scheduler for PendingTasks {
    #[inline]
    fn schedule(&self, task: DeferredTask) {
        self.bits.fetch_or(task as u8, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_tasks_coalesce_and_drain() {
        let pending = PendingTasks::new();
        assert!(pending.is_empty());

        pending.schedule(DeferredTask::RebuildPatchList);
        pending.schedule(DeferredTask::RebuildPatchList);
        assert!(!pending.is_empty());

        let tasks: Vec<_> = pending.take_all().collect();
        assert_eq!(tasks, vec![DeferredTask::RebuildPatchList]);
        assert!(pending.is_empty());
        assert_eq!(pending.take_all().count(), 0);
    }

    #[test]
    fn table_lookup_falls_back_to_zero() {
        let table = [0u8, 112, 115, 32];
        assert_eq!(table.display_index(1), 112);
        assert_eq!(table.display_index(3), 32);
        assert_eq!(table.display_index(200), 0);
        assert_eq!(RawSpecies.display_index(0x99), 0x99);
    }
}
