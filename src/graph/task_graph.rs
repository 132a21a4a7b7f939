//! The task graph schedules tasks into sequential groups and computes the barriers between them.
//!
//! Tasks are added with an optional dependency group. A task without a dependency joins the head group. A task
//! with a dependency gets a new group that follows the given one. Groups form chains through their predecessor,
//! and the graph never reorders them: the caller decides which tasks must be serialized.
//!
//! Compiling the graph walks every group in creation order. For every use of every task, it scans backward through
//! the predecessor chain, starting at the group before the current one, for the most recent use of the same
//! resource. The first match is the source state of the barrier. If there is no match, the conservative default
//! state is used, which turns the barrier into an acquire. Uses of the same resource within one group are not
//! checked against each other.

use anyhow::Result;

use crate::command_buffer::traits::CommandStream;
use crate::graph::pass::{Pass, PassContext};
use crate::graph::resource::{ResourceId, ResourceUse};
use crate::sync::barrier::Barrier;
use crate::sync::batcher::CommandBatcher;
use crate::sync::state::{ResourceStateTracker, TrackedState};
use crate::{Error, Settings};

/// Index of a group in a task graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub(crate) usize);

impl GroupId {
    /// The head group every graph starts with.
    pub const HEAD: GroupId = GroupId(0);

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Index of a task in a task graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) usize);

impl TaskId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A batch of tasks sharing one set of entry barriers and one set of exit barriers.
#[derive(Debug, Default, Clone)]
pub struct TaskGroup {
    tasks: Vec<TaskId>,
    prev: Option<GroupId>,
    barriers: Vec<Barrier>,
    exit_barriers: Vec<Barrier>,
}

impl TaskGroup {
    /// Tasks in this group, in insertion order.
    pub fn tasks(&self) -> &[TaskId] {
        &self.tasks
    }

    /// The group this group depends on. Only the head group has no predecessor.
    pub fn prev(&self) -> Option<GroupId> {
        self.prev
    }

    /// Barriers recorded before the first task of this group.
    pub fn barriers(&self) -> &[Barrier] {
        &self.barriers
    }

    /// Barriers recorded after the last task, moving boundary resources into their final state.
    pub fn exit_barriers(&self) -> &[Barrier] {
        &self.exit_barriers
    }
}

/// Find the most recent use of `id`, scanning backward from the last task of `start` through its predecessors.
fn find_prior_use<S: ?Sized>(
    groups: &[TaskGroup],
    tasks: &[Pass<'_, S>],
    start: GroupId,
    id: ResourceId,
) -> Option<TrackedState> {
    let mut current = Some(start);
    while let Some(group) = current {
        for task in groups[group.0].tasks.iter().rev() {
            if let Some(resource) = tasks[task.0].uses.iter().rev().find(|resource| resource.id() == id) {
                return Some(resource.tracked_state(Some(group)));
            }
        }
        current = groups[group.0].prev;
    }
    None
}

/// A graph of tasks, grouped into batches, with the barriers needed between them.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct TaskGraph<'cb, S: CommandStream + ?Sized> {
    tasks: Vec<Pass<'cb, S>>,
    groups: Vec<TaskGroup>,
    boundaries: Vec<ResourceUse>,
    tracker: ResourceStateTracker,
    elide_redundant_barriers: bool,
    compiled: bool,
}

impl<'cb, S: CommandStream + ?Sized + 'cb> TaskGraph<'cb, S> {
    /// Create a new task graph with only an empty head group.
    pub fn new() -> Self {
        Self::with_settings(&Settings::default())
    }

    /// Create a new task graph using the barrier policy from the given settings.
    pub fn with_settings(settings: &Settings) -> Self {
        Self {
            tasks: Vec::new(),
            groups: vec![TaskGroup::default()],
            boundaries: Vec::new(),
            tracker: ResourceStateTracker::new(),
            elide_redundant_barriers: settings.elide_redundant_barriers,
            compiled: false,
        }
    }

    /// Add a task that only declares resource uses. See [`TaskGraph::add_pass()`].
    pub fn add_task(&mut self, uses: impl IntoIterator<Item = ResourceUse>, dependency: Option<GroupId>) -> Result<GroupId> {
        let name = format!("task_{}", self.tasks.len());
        self.add_pass(Pass::from_uses(name, uses), dependency)
    }

    /// Add a pass to the graph. Without a dependency, the pass joins the head group. With a dependency, a new group
    /// is created after the given group and the pass is placed there.
    /// # Errors
    /// * Fails with [`Error::GroupNotFound`] if the dependency group does not exist.
    pub fn add_pass(&mut self, pass: Pass<'cb, S>, dependency: Option<GroupId>) -> Result<GroupId> {
        let group = match dependency {
            None => GroupId::HEAD,
            Some(dependency) => {
                if dependency.0 >= self.groups.len() {
                    anyhow::bail!(Error::GroupNotFound(dependency.0));
                }
                self.groups.push(TaskGroup {
                    prev: Some(dependency),
                    ..Default::default()
                });
                GroupId(self.groups.len() - 1)
            }
        };

        let task = TaskId(self.tasks.len());
        self.tasks.push(pass);
        self.groups[group.0].tasks.push(task);
        self.compiled = false;
        Ok(group)
    }

    /// Register the state a resource must be left in once the graph has executed, for example a swapchain image
    /// that must end up in the present layout. The transition is recorded after the last group that uses the resource.
    pub fn add_boundary(&mut self, resource: ResourceUse) {
        self.boundaries.push(resource);
        self.compiled = false;
    }

    /// Compute the barriers of every group. Compiling an unchanged graph again yields the same barriers.
    pub fn compile(&mut self) -> Result<()> {
        self.tracker.reset();
        let mut total = 0;
        let mut elided = 0;

        for index in 0..self.groups.len() {
            let group = GroupId(index);
            let prev = self.groups[index].prev;
            let mut barriers = Vec::new();
            for task in &self.groups[index].tasks {
                for resource in &self.tasks[task.0].uses {
                    let prior = prev
                        .and_then(|prev| find_prior_use(&self.groups, &self.tasks, prev, resource.id()))
                        .unwrap_or_else(|| resource.initial_state());
                    let barrier = Barrier::between(&prior, resource);
                    self.tracker.record_use(resource, Some(group));
                    if self.elide_redundant_barriers && barrier.is_redundant() {
                        trace!("Eliding redundant barrier {barrier:?}");
                        elided += 1;
                        continue;
                    }
                    barriers.push(barrier);
                }
            }
            total += barriers.len();
            self.groups[index].barriers = barriers;
            self.groups[index].exit_barriers.clear();
        }

        let last = GroupId(self.groups.len() - 1);
        for boundary in &self.boundaries {
            let state = self.tracker.state(boundary.id());
            let group = state.and_then(|state| state.last_group()).unwrap_or_else(|| {
                warn!("Boundary resource {:?} is never used in the task graph", boundary.id());
                last
            });
            let prior = state.unwrap_or_else(|| boundary.initial_state());
            self.tracker.record_use(boundary, Some(group));
            self.groups[group.0].exit_barriers.push(Barrier::between(&prior, boundary));
            total += 1;
        }

        debug!(
            "Compiled task graph: {} tasks in {} groups, {total} barriers ({elided} elided)",
            self.tasks.len(),
            self.groups.len()
        );
        self.compiled = true;
        Ok(())
    }

    /// Record the graph to a command stream. Every group records its barriers in one batch, then its tasks in order,
    /// then its exit barriers.
    /// # Errors
    /// * Fails with [`Error::GraphNotCompiled`] if the graph changed since it was last compiled.
    /// * Fails if any pass executor fails.
    pub fn execute(&mut self, stream: &mut S) -> Result<()> {
        if !self.compiled {
            anyhow::bail!(Error::GraphNotCompiled);
        }

        let Self {
            tasks,
            groups,
            ..
        } = self;
        for (index, group) in groups.iter().enumerate() {
            {
                let mut batcher = CommandBatcher::new(&mut *stream);
                group.barriers.iter().for_each(|barrier| batcher.insert(*barrier));
            }

            for task in &group.tasks {
                let task = &mut tasks[task.0];
                #[cfg(feature = "debug-markers")]
                stream.begin_label(&task.name, task.color.unwrap_or([1.0, 1.0, 1.0, 1.0]));
                let mut ctx = PassContext::new(&mut *stream, &task.name, &task.uses, GroupId(index));
                task.execute.execute(&mut ctx)?;
                #[cfg(feature = "debug-markers")]
                stream.end_label();
            }

            let mut batcher = CommandBatcher::new(&mut *stream);
            group.exit_barriers.iter().for_each(|barrier| batcher.insert(*barrier));
        }
        Ok(())
    }

    /// Most recent use of a resource visible from `group`: its own tasks first, then its predecessors.
    pub fn prior_use(&self, group: GroupId, id: ResourceId) -> Option<TrackedState> {
        if group.0 >= self.groups.len() {
            return None;
        }
        find_prior_use(&self.groups, &self.tasks, group, id)
    }

    /// All groups, in creation order.
    pub fn groups(&self) -> &[TaskGroup] {
        &self.groups
    }

    /// Get a group by its id.
    pub fn group(&self, id: GroupId) -> Option<&TaskGroup> {
        self.groups.get(id.0)
    }

    /// Get a task by its id.
    pub fn task(&self, id: TaskId) -> Option<&Pass<'cb, S>> {
        self.tasks.get(id.0)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Every barrier of the compiled graph in recording order, exit barriers included.
    pub fn barriers(&self) -> impl Iterator<Item = &Barrier> {
        self.groups.iter().flat_map(|group| group.barriers.iter().chain(group.exit_barriers.iter()))
    }

    /// Tracked state of every resource after the graph has executed.
    pub fn tracker(&self) -> &ResourceStateTracker {
        &self.tracker
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Remove all tasks, groups and boundaries and forget all tracked state.
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.groups.clear();
        self.groups.push(TaskGroup::default());
        self.boundaries.clear();
        self.tracker.reset();
        self.compiled = false;
    }
}

impl<'cb, S: CommandStream + ?Sized + 'cb> Default for TaskGraph<'cb, S> {
    fn default() -> Self {
        Self::new()
    }
}
