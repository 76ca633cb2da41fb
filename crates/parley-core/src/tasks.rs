//! Task bookkeeping for in-flight backend requests.
//!
//! Every request the reducer starts is tagged with a [`TaskId`]. When the
//! completion comes back, the reducer only applies it if that id is still the
//! active one for its slot, so a superseded request can never overwrite newer
//! state.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

#[derive(Debug, Default)]
pub struct TaskSeq {
    next: u64,
}

impl TaskSeq {
    pub fn next_id(&mut self) -> TaskId {
        let id = TaskId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// Lifecycle of one request slot (stored in state, mutated only by the reducer).
#[derive(Debug, Default, Clone)]
pub struct TaskState {
    active: Option<TaskId>,
}

impl TaskState {
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Marks `id` as the latest request; any earlier one becomes stale.
    pub fn start(&mut self, id: TaskId) {
        self.active = Some(id);
    }

    /// Returns true (and frees the slot) only for the latest request.
    pub fn finish_if_active(&mut self, id: TaskId) -> bool {
        let ok = self.active == Some(id);
        if ok {
            self.active = None;
        }
        ok
    }

    /// Forgets the running request; its completion will be ignored.
    pub fn clear(&mut self) {
        self.active = None;
    }
}
