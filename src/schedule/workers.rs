// Scoped worker pool fed through crossbeam channels
//
// Jobs go out on one queue and come back tagged with their index on another, so the caller
// always sees results in input order whatever the worker count.

use crossbeam_channel::unbounded;

/// Apply `f` to every item on up to `workers` threads and return the results in input order.
///
/// With one worker (or at most one item) everything runs inline on the calling thread. The
/// calling thread also drains the job queue, so the map completes even if no thread spawns.
pub fn parallel_map<T, R, F>(items: Vec<T>, workers: usize, f: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    let count = items.len();
    if workers <= 1 || count <= 1 {
        return items.into_iter().map(f).collect();
    }

    let (job_sender, job_receiver) = unbounded::<(usize, T)>();
    let (result_sender, result_receiver) = unbounded::<(usize, R)>();
    for job in items.into_iter().enumerate() {
        // Receiver is alive for the whole function
        let _ = job_sender.send(job);
    }
    drop(job_sender);

    std::thread::scope(|scope| {
        let f = &f;
        for id in 1..workers.min(count) {
            let jobs = job_receiver.clone();
            let results = result_sender.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("symfeat-worker-{}", id))
                .spawn_scoped(scope, move || {
                    for (index, item) in jobs.iter() {
                        if results.send((index, f(item))).is_err() {
                            break;
                        }
                    }
                });
            if let Err(e) = spawned {
                log::warn!("Failed to spawn worker thread: {}", e);
                break;
            }
        }

        for (index, item) in job_receiver.iter() {
            let _ = result_sender.send((index, f(item)));
        }
    });
    drop(result_sender);

    let mut slots: Vec<Option<R>> = (0..count).map(|_| None).collect();
    for (index, result) in result_receiver.iter() {
        slots[index] = Some(result);
    }
    slots.into_iter().flatten().collect()
}
