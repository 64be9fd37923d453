//! Frame-callback bookkeeping for every animation loop.
//!
//! The platform primitive (`requestAnimationFrame` on the web) sits behind
//! [`FrameClock`]. [`FrameScheduler`] keeps at most one outstanding handle per
//! task, so starting twice never doubles a loop and stopping always releases
//! the handle it holds.

use crate::Result;

/// Every loop the page runs. Each one owns a single canvas layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskId {
    Cursor,
    Background,
    Visualizer,
    /// One-shot: finishes on its own once the overlay batch drains.
    Transition,
}

impl TaskId {
    pub const ALL: [TaskId; 4] = [
        TaskId::Cursor,
        TaskId::Background,
        TaskId::Visualizer,
        TaskId::Transition,
    ];

    fn index(self) -> usize {
        match self {
            TaskId::Cursor => 0,
            TaskId::Background => 1,
            TaskId::Visualizer => 2,
            TaskId::Transition => 3,
        }
    }
}

/// Opaque id of one booked frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

pub trait FrameClock {
    /// Books a single callback for `task` on the next frame.
    fn request(&mut self, task: TaskId) -> Result<FrameHandle>;
    /// Withdraws a booked callback. Unknown or already-fired handles are ignored.
    fn cancel(&mut self, handle: FrameHandle);
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    running: bool,
    pending: Option<FrameHandle>,
}

pub struct FrameScheduler<C> {
    clock: C,
    slots: [Slot; 4],
}

impl<C: FrameClock> FrameScheduler<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            slots: [Slot::default(); 4],
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn is_running(&self, task: TaskId) -> bool {
        self.slots[task.index()].running
    }

    pub fn pending(&self, task: TaskId) -> Option<FrameHandle> {
        self.slots[task.index()].pending
    }

    /// Books the first frame of `task`. Returns `false` if it was already running.
    pub fn start(&mut self, task: TaskId) -> Result<bool> {
        if self.is_running(task) {
            return Ok(false);
        }
        let handle = self.clock.request(task)?;
        let slot = &mut self.slots[task.index()];
        slot.running = true;
        slot.pending = Some(handle);
        log::debug!("{task:?} started");
        Ok(true)
    }

    /// Stops `task` and cancels its outstanding callback. Returns whether it was running.
    pub fn stop(&mut self, task: TaskId) -> bool {
        let slot = &mut self.slots[task.index()];
        let was_running = slot.running;
        slot.running = false;
        if let Some(handle) = slot.pending.take() {
            self.clock.cancel(handle);
        }
        if was_running {
            log::debug!("{task:?} stopped");
        }
        was_running
    }

    pub fn restart(&mut self, task: TaskId) -> Result<()> {
        self.stop(task);
        self.start(task).map(|_| ())
    }

    /// Called when a callback for `task` fires. Consumes the pending handle and
    /// returns `false` for callbacks that belong to a stopped task.
    pub fn enter(&mut self, task: TaskId) -> bool {
        let slot = &mut self.slots[task.index()];
        if !slot.running {
            return false;
        }
        slot.pending.take().is_some()
    }

    /// Books the next frame for a task that is still running. A failed booking
    /// stops the task, so a later [`FrameScheduler::start`] can revive it.
    pub fn proceed(&mut self, task: TaskId) -> Result<()> {
        let slot = self.slots[task.index()];
        if !slot.running || slot.pending.is_some() {
            return Ok(());
        }
        match self.clock.request(task) {
            Ok(handle) => {
                self.slots[task.index()].pending = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.slots[task.index()].running = false;
                log::warn!("{task:?} lost its frame: {e}");
                Err(e)
            }
        }
    }

    /// Ends a run from inside its own tick without booking another frame.
    pub fn finish(&mut self, task: TaskId) {
        let slot = &mut self.slots[task.index()];
        slot.running = false;
        if let Some(handle) = slot.pending.take() {
            self.clock.cancel(handle);
        }
    }
}

/// Hand-cranked clock for headless runs: callbacks only fire when the owner
/// drains them with [`ManualClock::next_frame`].
#[derive(Debug, Default)]
pub struct ManualClock {
    next_id: i32,
    booked: Vec<(FrameHandle, TaskId)>,
    cancelled: usize,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes every callback booked so far, in booking order.
    pub fn next_frame(&mut self) -> Vec<TaskId> {
        self.booked.drain(..).map(|(_, task)| task).collect()
    }

    pub fn booked(&self, task: TaskId) -> usize {
        self.booked.iter().filter(|(_, t)| *t == task).count()
    }

    pub fn outstanding(&self) -> usize {
        self.booked.len()
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled
    }
}

impl FrameClock for ManualClock {
    fn request(&mut self, task: TaskId) -> Result<FrameHandle> {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.booked.push((handle, task));
        Ok(handle)
    }

    fn cancel(&mut self, handle: FrameHandle) {
        let before = self.booked.len();
        self.booked.retain(|(h, _)| *h != handle);
        self.cancelled += before - self.booked.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> FrameScheduler<ManualClock> {
        FrameScheduler::new(ManualClock::new())
    }

    #[test]
    fn start_is_idempotent() {
        let mut s = scheduler();
        assert!(s.start(TaskId::Cursor).unwrap());
        assert!(!s.start(TaskId::Cursor).unwrap());
        assert_eq!(s.clock().booked(TaskId::Cursor), 1);
    }

    #[test]
    fn stop_releases_the_handle() {
        let mut s = scheduler();
        s.start(TaskId::Background).unwrap();
        assert!(s.stop(TaskId::Background));
        assert_eq!(s.clock().outstanding(), 0);
        assert_eq!(s.clock().cancelled(), 1);
        assert!(!s.stop(TaskId::Background));
    }

    #[test]
    fn stale_callbacks_are_ignored() {
        let mut s = scheduler();
        s.start(TaskId::Visualizer).unwrap();
        let fired = s.clock_mut().next_frame();
        s.stop(TaskId::Visualizer);
        for task in fired {
            assert!(!s.enter(task));
        }
    }

    #[test]
    fn continuous_loop_books_one_frame_at_a_time() {
        let mut s = scheduler();
        s.start(TaskId::Cursor).unwrap();
        for _ in 0..5 {
            let fired = s.clock_mut().next_frame();
            assert_eq!(fired, vec![TaskId::Cursor]);
            assert!(s.enter(TaskId::Cursor));
            s.proceed(TaskId::Cursor).unwrap();
            s.proceed(TaskId::Cursor).unwrap();
            assert_eq!(s.clock().booked(TaskId::Cursor), 1);
        }
    }

    #[test]
    fn a_second_entry_in_the_same_frame_is_rejected() {
        let mut s = scheduler();
        s.start(TaskId::Cursor).unwrap();
        s.clock_mut().next_frame();
        assert!(s.enter(TaskId::Cursor));
        assert!(!s.enter(TaskId::Cursor));
    }

    #[test]
    fn finish_ends_a_one_shot() {
        let mut s = scheduler();
        s.start(TaskId::Transition).unwrap();
        s.clock_mut().next_frame();
        assert!(s.enter(TaskId::Transition));
        s.finish(TaskId::Transition);
        s.proceed(TaskId::Transition).unwrap();
        assert!(!s.is_running(TaskId::Transition));
        assert_eq!(s.clock().outstanding(), 0);
    }

    /// Clock that refuses bookings while `broken` is set.
    #[derive(Default)]
    struct FlakyClock {
        inner: ManualClock,
        broken: bool,
    }

    impl FrameClock for FlakyClock {
        fn request(&mut self, task: TaskId) -> Result<FrameHandle> {
            if self.broken {
                return Err("frame refused".into());
            }
            self.inner.request(task)
        }

        fn cancel(&mut self, handle: FrameHandle) {
            self.inner.cancel(handle);
        }
    }

    #[test]
    fn failed_booking_stops_the_task_and_start_revives_it() {
        let mut s = FrameScheduler::new(FlakyClock::default());
        s.start(TaskId::Visualizer).unwrap();
        s.clock_mut().inner.next_frame();
        assert!(s.enter(TaskId::Visualizer));

        s.clock_mut().broken = true;
        assert!(s.proceed(TaskId::Visualizer).is_err());
        assert!(!s.is_running(TaskId::Visualizer));
        assert_eq!(s.pending(TaskId::Visualizer), None);

        s.clock_mut().broken = false;
        assert!(s.start(TaskId::Visualizer).unwrap());
        assert_eq!(s.clock().inner.booked(TaskId::Visualizer), 1);
    }

    #[test]
    fn failed_restart_leaves_the_task_startable() {
        let mut s = FrameScheduler::new(FlakyClock::default());
        s.start(TaskId::Transition).unwrap();
        s.clock_mut().broken = true;
        assert!(s.restart(TaskId::Transition).is_err());
        assert!(!s.is_running(TaskId::Transition));

        s.clock_mut().broken = false;
        s.restart(TaskId::Transition).unwrap();
        assert_eq!(s.clock().inner.booked(TaskId::Transition), 1);
    }

    #[test]
    fn restart_swaps_the_pending_handle() {
        let mut s = scheduler();
        s.start(TaskId::Transition).unwrap();
        let first = s.pending(TaskId::Transition);
        s.restart(TaskId::Transition).unwrap();
        assert_ne!(s.pending(TaskId::Transition), first);
        assert_eq!(s.clock().booked(TaskId::Transition), 1);
        assert_eq!(s.clock().cancelled(), 1);
    }
}
