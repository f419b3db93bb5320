// Dependency resolver: validates the registry graph and orders the selected extractors

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use serde::Serialize;

use crate::error::ConfigurationError;
use crate::features::FeatureRegistry;

/// A dependency resolved to the plan step that produces it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanDependency {
    pub step: usize,
    pub offset: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    /// Declaration index in the registry
    pub extractor: usize,
    pub dependencies: Vec<PlanDependency>,
    /// Part of the output, not only pulled in as a dependency
    pub requested: bool,
    /// Reads only the current window, directly and transitively
    pub offset_free: bool,
}

/// Topological order over the selected extractors. Every dependency points at an earlier step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    pub steps: Vec<PlanStep>,
}

impl ExecutionPlan {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Validate the whole registry and build the plan for `requested`
/// (every registered feature when `None` or empty).
///
/// Fails on unknown dependencies, dependency cycles (self-dependencies included), sequential
/// features depending on overall-only ones, and requested names that are not registered.
pub fn resolve(
    registry: &FeatureRegistry,
    requested: Option<&[String]>,
) -> Result<ExecutionPlan, ConfigurationError> {
    let count = registry.len();

    // Edges as declaration indices, validated up front
    let mut dependencies: Vec<Vec<usize>> = Vec::with_capacity(count);
    for descriptor in registry.descriptors() {
        let mut resolved = Vec::with_capacity(descriptor.dependencies.len());
        for dep in &descriptor.dependencies {
            let index = registry
                .index_of(dep.name)
                .ok_or_else(|| ConfigurationError::UnknownDependency {
                    feature: descriptor.name.to_string(),
                    dependency: dep.name.to_string(),
                })?;
            if descriptor.is_sequential && !registry.extractor(index).descriptor().is_sequential {
                return Err(ConfigurationError::OverallOnlyDependency {
                    feature: descriptor.name.to_string(),
                    dependency: dep.name.to_string(),
                });
            }
            resolved.push(index);
        }
        dependencies.push(resolved);
    }

    let order = topological_order(registry, &dependencies)?;

    let selected = selection(registry, &dependencies, requested)?;
    let requested_set: Option<BTreeSet<usize>> = match requested {
        Some(names) if !names.is_empty() => Some(names.iter().filter_map(|n| registry.index_of(n)).collect()),
        _ => None,
    };

    let mut step_of = vec![usize::MAX; count];
    let mut steps: Vec<PlanStep> = Vec::with_capacity(selected.len());
    for extractor in order.into_iter().filter(|i| selected.contains(i)) {
        let descriptor = registry.extractor(extractor).descriptor();
        let deps: Vec<PlanDependency> = descriptor
            .dependencies
            .iter()
            .zip(&dependencies[extractor])
            .map(|(dep, &index)| PlanDependency { step: step_of[index], offset: dep.offset })
            .collect();
        let offset_free = deps.iter().all(|d| d.offset == 0 && steps[d.step].offset_free);
        step_of[extractor] = steps.len();
        steps.push(PlanStep {
            extractor,
            dependencies: deps,
            requested: requested_set.as_ref().map_or(true, |set| set.contains(&extractor)),
            offset_free,
        });
    }

    log::debug!(
        "Resolved {} plan steps ({} requested, {} offset-free)",
        steps.len(),
        steps.iter().filter(|s| s.requested).count(),
        steps.iter().filter(|s| s.offset_free).count()
    );

    Ok(ExecutionPlan { steps })
}

/// Kahn's algorithm over dependency -> dependent edges. The ready set is drained lowest
/// declaration index first, so independent extractors keep their declaration order.
fn topological_order(
    registry: &FeatureRegistry,
    dependencies: &[Vec<usize>],
) -> Result<Vec<usize>, ConfigurationError> {
    let count = dependencies.len();
    let mut in_degree = vec![0usize; count];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (node, deps) in dependencies.iter().enumerate() {
        for &dep in deps {
            in_degree[node] += 1;
            dependents[dep].push(node);
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..count)
        .filter(|&i| in_degree[i] == 0)
        .map(Reverse)
        .collect();
    let mut order = Vec::with_capacity(count);
    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for &next in &dependents[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() == count {
        return Ok(order);
    }

    let stuck: Vec<bool> = in_degree.iter().map(|&d| d > 0).collect();
    Err(ConfigurationError::Cycle(cycle_path(registry, dependencies, &stuck)))
}

/// Walk dependencies among the nodes Kahn could not order until a node repeats,
/// returning the names along the cycle with the first name repeated at the end.
fn cycle_path(registry: &FeatureRegistry, dependencies: &[Vec<usize>], stuck: &[bool]) -> Vec<String> {
    let name = |i: usize| registry.extractor(i).descriptor().name.to_string();
    let Some(start) = stuck.iter().position(|&s| s) else {
        return Vec::new();
    };

    // Every stuck node has at least one stuck dependency
    let mut visited_at = vec![usize::MAX; stuck.len()];
    let mut path = Vec::new();
    let mut node = start;
    while visited_at[node] == usize::MAX {
        visited_at[node] = path.len();
        path.push(node);
        match dependencies[node].iter().copied().find(|&d| stuck[d]) {
            Some(next) => node = next,
            None => break,
        }
    }

    let mut cycle: Vec<String> = path[visited_at[node]..].iter().map(|&i| name(i)).collect();
    cycle.push(name(node));
    cycle
}

/// Requested extractors plus everything they depend on, transitively
fn selection(
    registry: &FeatureRegistry,
    dependencies: &[Vec<usize>],
    requested: Option<&[String]>,
) -> Result<BTreeSet<usize>, ConfigurationError> {
    let roots: Vec<usize> = match requested {
        Some(names) if !names.is_empty() => names
            .iter()
            .map(|n| registry.index_of(n).ok_or_else(|| ConfigurationError::UnknownFeature(n.clone())))
            .collect::<Result<_, _>>()?,
        _ => (0..registry.len()).collect(),
    };

    let mut selected = BTreeSet::new();
    let mut stack = roots;
    while let Some(node) = stack.pop() {
        if selected.insert(node) {
            stack.extend(dependencies[node].iter().copied());
        }
    }
    Ok(selected)
}
