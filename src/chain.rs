use crate::models::Task;

/// Returns every member of the lineage `task_id` belongs to, in store order.
///
/// The lineage is the root (whose id is the resolved root id) plus every
/// task pointing at that root through `parent_task_id`. Returns `None` when
/// `task_id` is unknown. If the root itself was deleted, the surviving
/// spawned instances still form the lineage.
pub fn resolve_chain<'a>(tasks: &'a [Task], task_id: &str) -> Option<Vec<&'a Task>> {
    let root_id = lineage_root(tasks, task_id)?;
    Some(
        tasks
            .iter()
            .filter(|t| in_lineage(t, root_id))
            .collect(),
    )
}

/// Positions of the lineage members, for callers that mutate in place.
pub fn chain_positions(tasks: &[Task], task_id: &str) -> Option<Vec<usize>> {
    let root_id = lineage_root(tasks, task_id)?;
    Some(
        tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| in_lineage(t, root_id))
            .map(|(i, _)| i)
            .collect(),
    )
}

/// Id of the lineage root for `task_id`.
pub fn lineage_root<'a>(tasks: &'a [Task], task_id: &str) -> Option<&'a str> {
    tasks.iter().find(|t| t.id == task_id).map(Task::root_id)
}

fn in_lineage(task: &Task, root_id: &str) -> bool {
    task.id == root_id || task.parent_task_id.as_deref() == Some(root_id)
}
