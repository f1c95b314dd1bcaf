//! Deferred work for views
//!
//! Timers, layout polls and staggered transitions are queued as tasks owned by
//! a view. The queue runs on a virtual clock advanced by the host, so there is
//! one thread of execution and tasks never overlap with event handlers.
//!
//! Every task checks its owner before running: a task whose owner has been
//! destroyed (or dropped) is discarded without being called. Destroying a view
//! also cancels its tasks eagerly.

use log::{debug, info, trace};

use crate::component::{Context, ViewId, ViewRef};

/// Identifier of a scheduled task
pub type TaskId = u64;

/// What a task wants after running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStep {
    /// Finished
    Done,
    /// Run again after the retry interval, if attempts remain
    Retry,
}

/// Bounded retry policy of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay between attempts
    pub interval_ms: u64,
    /// Total number of attempts, including the first
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Run once
    pub fn once() -> Self {
        Self {
            interval_ms: 0,
            max_attempts: 1,
        }
    }

    /// Poll up to `max_attempts` times, `interval_ms` apart
    pub fn poll(interval_ms: u64, max_attempts: u32) -> Self {
        Self {
            interval_ms,
            max_attempts: max_attempts.max(1),
        }
    }
}

/// Task body: receives its owner, the context and the 1-based attempt number
pub type TaskFn = Box<dyn FnMut(&ViewRef, &mut Context, u32) -> TaskStep>;

struct Task {
    id: TaskId,
    owner: ViewId,
    label: &'static str,
    due: u64,
    attempt: u32,
    policy: RetryPolicy,
    run: TaskFn,
}

/// Queue of pending tasks ordered by due time
#[derive(Default)]
pub struct TaskQueue {
    now: u64,
    next_id: TaskId,
    tasks: Vec<Task>,
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("now", &self.now)
            .field("pending", &self.tasks.len())
            .finish()
    }
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Number of pending tasks
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Number of pending tasks owned by a view
    pub fn pending_for(&self, owner: &ViewId) -> usize {
        self.tasks.iter().filter(|t| &t.owner == owner).count()
    }

    fn push(&mut self, task: Task) {
        self.tasks.push(task);
    }

    fn next_task_id(&mut self) -> TaskId {
        self.next_id += 1;
        self.next_id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        before != self.tasks.len()
    }

    /// Cancel every task of an owner, returning how many were dropped
    pub fn cancel_owner(&mut self, owner: &ViewId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| &t.owner != owner);
        before - self.tasks.len()
    }

    /// Take the earliest task due at or before `deadline`; ties go to the
    /// earlier scheduled task
    fn pop_due(&mut self, deadline: u64) -> Option<Task> {
        let index = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= deadline)
            .min_by_key(|(_, t)| (t.due, t.id))
            .map(|(i, _)| i)?;
        Some(self.tasks.remove(index))
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

impl Context {
    /// Schedule a task owned by a view
    pub fn schedule<F>(
        &mut self,
        owner: &ViewId,
        label: &'static str,
        delay_ms: u64,
        policy: RetryPolicy,
        run: F,
    ) -> TaskId
    where
        F: FnMut(&ViewRef, &mut Context, u32) -> TaskStep + 'static,
    {
        let id = self.tasks.next_task_id();
        let due = self.tasks.now + delay_ms;
        trace!("Scheduled {} for {} at {}ms", label, owner, due);
        self.tasks.push(Task {
            id,
            owner: owner.clone(),
            label,
            due,
            attempt: 0,
            policy,
            run: Box::new(run),
        });
        id
    }

    pub fn cancel_task(&mut self, id: TaskId) -> bool {
        self.tasks.cancel(id)
    }

    /// Cancel every task of a view
    pub fn cancel_tasks(&mut self, owner: &ViewId) -> usize {
        self.tasks.cancel_owner(owner)
    }

    /// Number of tasks waiting to run
    pub fn pending_tasks(&self) -> usize {
        self.tasks.pending()
    }

    pub fn pending_tasks_for(&self, owner: &ViewId) -> usize {
        self.tasks.pending_for(owner)
    }

    /// Advance the virtual clock and run every task that falls due
    ///
    /// Returns the number of task invocations.
    pub fn advance_clock(&mut self, elapsed_ms: u64) -> usize {
        let deadline = self.tasks.now + elapsed_ms;
        let mut runs = 0;

        while let Some(mut task) = self.tasks.pop_due(deadline) {
            self.tasks.now = task.due;

            let owner = match self.registry.get_view_by_id(&task.owner) {
                Some(view) => view,
                None => {
                    debug!("Dropping {} of {}: owner is gone", task.label, task.owner);
                    continue;
                }
            };
            let alive = owner
                .try_borrow()
                .map(|v| v.core().is_alive())
                .unwrap_or(false);
            if !alive {
                debug!("Dropping {} of {}: owner is not alive", task.label, task.owner);
                continue;
            }

            task.attempt += 1;
            runs += 1;
            let step = (task.run)(&owner, self, task.attempt);

            if step == TaskStep::Retry {
                if task.attempt >= task.policy.max_attempts {
                    info!(
                        "Giving up on {} of {} after {} attempts",
                        task.label, task.owner, task.attempt
                    );
                } else {
                    task.due = self.tasks.now + task.policy.interval_ms;
                    self.tasks.push(task);
                }
            }
        }

        self.tasks.now = deadline;
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{lifecycle, Design, View, ViewConfig};
    use crate::kit::components::LabelView;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_tasks_run_in_due_order() {
        let mut ctx = Context::in_memory();
        let label = LabelView::new().design(&mut ctx, ViewConfig::new());
        let id = label.borrow().core().id.clone();
        let order = Rc::new(std::cell::RefCell::new(Vec::new()));

        for (delay, tag) in [(30, "c"), (10, "a"), (20, "b")] {
            let order = order.clone();
            ctx.schedule(&id, "test", delay, RetryPolicy::once(), move |_, _, _| {
                order.borrow_mut().push(tag);
                TaskStep::Done
            });
        }

        assert_eq!(ctx.advance_clock(15), 1);
        assert_eq!(ctx.advance_clock(100), 2);
        assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
        assert_eq!(ctx.pending_tasks(), 0);
    }

    #[test]
    fn test_retry_is_bounded() {
        let mut ctx = Context::in_memory();
        let label = LabelView::new().design(&mut ctx, ViewConfig::new());
        let id = label.borrow().core().id.clone();
        let attempts = Rc::new(Cell::new(0));
        let counter = attempts.clone();

        ctx.schedule(&id, "poll", 0, RetryPolicy::poll(100, 5), move |_, _, attempt| {
            counter.set(attempt);
            TaskStep::Retry
        });

        ctx.advance_clock(10_000);
        assert_eq!(attempts.get(), 5);
        assert_eq!(ctx.pending_tasks(), 0);
    }

    #[test]
    fn test_tasks_of_destroyed_views_never_run() {
        let mut ctx = Context::in_memory();
        let label = LabelView::new().design(&mut ctx, ViewConfig::new());
        let id = label.borrow().core().id.clone();
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();

        ctx.schedule(&id, "late", 50, RetryPolicy::once(), move |_, _, _| {
            flag.set(true);
            TaskStep::Done
        });

        let label_ref: ViewRef = label.clone();
        lifecycle::destroy(&label_ref, &mut ctx).unwrap();
        assert_eq!(ctx.pending_tasks_for(&id), 0);

        ctx.advance_clock(100);
        assert!(!ran.get());
    }

    #[test]
    fn test_task_of_dead_owner_is_dropped_even_if_not_cancelled() {
        let mut ctx = Context::in_memory();
        let label = LabelView::new().design(&mut ctx, ViewConfig::new());
        let id = label.borrow().core().id.clone();
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();

        ctx.schedule(&id, "late", 50, RetryPolicy::once(), move |_, _, _| {
            flag.set(true);
            TaskStep::Done
        });
        label.borrow_mut().core_mut().alive = false;

        ctx.advance_clock(100);
        assert!(!ran.get());
    }
}
