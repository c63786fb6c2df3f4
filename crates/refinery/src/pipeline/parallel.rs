//! Scoped-thread mapping over slices.

use std::num::NonZeroUsize;
use std::panic;
use std::thread;

/// Map `items` with `f`, splitting the work across scoped threads when there
/// are at least `threshold` items. Output order matches input order.
pub fn map_slice<I, T, F>(items: &[I], threshold: usize, f: F) -> Vec<T>
where
    I: Sync,
    T: Send,
    F: Fn(&I) -> T + Sync,
{
    let workers = thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
        .min(items.len());

    if items.len() < threshold || workers <= 1 {
        return items.iter().map(&f).collect();
    }

    let chunk_size = items.len().div_ceil(workers);
    let f = &f;
    thread::scope(|scope| {
        let handles: Vec<_> = items
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || chunk.iter().map(f).collect::<Vec<T>>()))
            .collect();

        let mut out = Vec::with_capacity(items.len());
        for handle in handles {
            match handle.join() {
                Ok(part) => out.extend(part),
                Err(payload) => panic::resume_unwind(payload),
            }
        }
        out
    })
}
