// Window scheduler: runs an execution plan over the overall window and sequential windows
//
// Sequential windows are evaluated in two phases. Phase 1 builds each window's IR and every
// offset-free feature, window by window in parallel. Phase 2 fills the remaining features one
// column at a time in plan order, reading neighbouring windows from columns already complete.

use std::time::Instant;

use super::resolver::{ExecutionPlan, PlanStep};
use super::results::{FeatureColumn, ResultTable};
use super::workers::parallel_map;
use crate::error::{ExtractionError, Result};
use crate::events::EventStream;
use crate::features::{FeatureRegistry, FeatureValue};
use crate::ir::{self, IntermediateRepresentation};
use crate::windows::{Window, WindowConfig, WindowIndex};

static UNAVAILABLE: FeatureValue = FeatureValue::Unavailable;

/// Evaluate `plan` for one piece.
///
/// The overall window always runs. Sequential windows run when `windows.sequential` is set,
/// and only for sequential features.
pub fn run(
    stream: &EventStream,
    registry: &FeatureRegistry,
    plan: &ExecutionPlan,
    windows: &WindowConfig,
    workers: usize,
) -> Result<ResultTable> {
    let started = Instant::now();

    let overall_window = Window::overall(stream);
    let overall_ir = ir::build(stream, &overall_window);
    let mut overall: Vec<FeatureValue> = Vec::with_capacity(plan.len());
    for step in &plan.steps {
        // The overall window is a one-window sequence: any offset leaves it
        let deps: Vec<&FeatureValue> = step
            .dependencies
            .iter()
            .map(|d| if d.offset == 0 { &overall[d.step] } else { &UNAVAILABLE })
            .collect();
        let value = evaluate(registry, step, &overall_ir, &deps, WindowIndex::Overall)?;
        overall.push(value);
    }

    let (sequential_windows, columns) = if windows.sequential {
        let partition = windows.spec.partition(stream)?;
        let columns = run_sequential(registry, plan, stream, &partition, workers)?;
        (partition, columns)
    } else {
        (Vec::new(), plan.steps.iter().map(|_| None).collect())
    };

    let mut features = Vec::new();
    for ((step, overall), sequential) in plan.steps.iter().zip(overall).zip(columns) {
        if !step.requested {
            continue;
        }
        let descriptor = registry.extractor(step.extractor).descriptor();
        features.push(FeatureColumn {
            name: descriptor.name.to_string(),
            code: descriptor.code.to_string(),
            dimensionality: descriptor.dimensionality,
            overall,
            sequential,
        });
    }

    log::info!(
        "Extracted {} features over {} windows in {:.1?}",
        features.len(),
        sequential_windows.len(),
        started.elapsed()
    );
    Ok(ResultTable::new(sequential_windows, features))
}

/// One column per plan step; `None` for overall-only steps
type Columns = Vec<Option<Vec<FeatureValue>>>;

/// A window's IR plus its phase 1 values, one slot per plan step
type WindowSlots = (IntermediateRepresentation, Vec<Option<FeatureValue>>);

fn run_sequential(
    registry: &FeatureRegistry,
    plan: &ExecutionPlan,
    stream: &EventStream,
    windows: &[Window],
    workers: usize,
) -> Result<Columns> {
    let is_sequential =
        |step: &PlanStep| registry.extractor(step.extractor).descriptor().is_sequential;

    // Phase 1: IR and offset-free features, one job per window
    let phase_one = parallel_map(windows.to_vec(), workers, |window| -> Result<WindowSlots> {
        let ir = ir::build(stream, &window);
        let mut slots: Vec<Option<FeatureValue>> = Vec::with_capacity(plan.len());
        for step in &plan.steps {
            if !(step.offset_free && is_sequential(step)) {
                slots.push(None);
                continue;
            }
            let mut deps = Vec::with_capacity(step.dependencies.len());
            for d in &step.dependencies {
                match &slots[d.step] {
                    Some(value) => deps.push(value),
                    None => deps.push(&UNAVAILABLE),
                }
            }
            let value = evaluate(registry, step, &ir, &deps, window.index)?;
            slots.push(Some(value));
        }
        Ok((ir, slots))
    });

    let mut irs = Vec::with_capacity(windows.len());
    let mut columns: Vec<Vec<FeatureValue>> = plan
        .steps
        .iter()
        .map(|_| Vec::with_capacity(windows.len()))
        .collect();
    for result in phase_one {
        let (ir, slots) = result?;
        irs.push(ir);
        for (column, slot) in columns.iter_mut().zip(slots) {
            if let Some(value) = slot {
                column.push(value);
            }
        }
    }
    log::debug!("Phase 1 complete for {} windows", windows.len());

    // Phase 2: remaining sequential features, one column at a time
    let count = windows.len() as i64;
    for (index, step) in plan.steps.iter().enumerate() {
        if step.offset_free || !is_sequential(step) {
            continue;
        }
        let done = &columns;
        let indices: Vec<usize> = (0..windows.len()).collect();
        let column = parallel_map(indices, workers, |w: usize| -> Result<FeatureValue> {
            let deps: Vec<&FeatureValue> = step
                .dependencies
                .iter()
                .map(|d| {
                    let target = w as i64 + d.offset as i64;
                    if (0..count).contains(&target) {
                        &done[d.step][target as usize]
                    } else {
                        &UNAVAILABLE
                    }
                })
                .collect();
            evaluate(registry, step, &irs[w], &deps, windows[w].index)
        });
        columns[index] = column.into_iter().collect::<Result<Vec<_>>>()?;
    }

    Ok(plan
        .steps
        .iter()
        .zip(columns)
        .map(|(step, column)| is_sequential(step).then_some(column))
        .collect())
}

/// Compute one (feature, window) slot. Unavailable dependencies make the slot unavailable
/// without calling the extractor.
fn evaluate(
    registry: &FeatureRegistry,
    step: &PlanStep,
    ir: &IntermediateRepresentation,
    dependencies: &[&FeatureValue],
    window: WindowIndex,
) -> Result<FeatureValue> {
    let mut values: Vec<&[f64]> = Vec::with_capacity(dependencies.len());
    for dep in dependencies {
        match dep.values() {
            Some(v) => values.push(v),
            None => return Ok(FeatureValue::Unavailable),
        }
    }

    let extractor = registry.extractor(step.extractor);
    let descriptor = extractor.descriptor();
    let result = extractor.compute(ir, &values);
    if result.len() != descriptor.dimensionality {
        return Err(ExtractionError::Dimensionality {
            feature: descriptor.name.to_string(),
            window,
            expected: descriptor.dimensionality,
            actual: result.len(),
        });
    }
    Ok(FeatureValue::Available(result))
}
