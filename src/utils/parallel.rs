/// Parallel processing utilities

/// Resolve a thread hint, 0 meaning every available core.
pub fn resolve_threads(threads: usize) -> usize {
    if threads == 0 {
        num_cpus::get()
    } else {
        threads
    }
}

/// Build a dedicated pool for one run so that each run honours its own
/// thread hint, independent of the global rayon pool.
pub fn build_thread_pool(threads: usize) -> crate::Result<rayon::ThreadPool> {
    let threads = resolve_threads(threads);

    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("starling-search-{}", i))
        .build()
        .map_err(|e| crate::StarlingError::Resource(format!("Failed to build thread pool: {}", e)))
}

pub fn chunk_size_for_parallelism(total_items: usize, threads: usize) -> usize {
    let threads = resolve_threads(threads);

    // Aim for at least 10 items per thread, but not more than 1000 per chunk
    let ideal_chunk = total_items / (threads * 10);
    ideal_chunk.clamp(10, 1000)
}
