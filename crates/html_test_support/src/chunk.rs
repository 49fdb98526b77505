//! Deterministic chunk plans for streaming parity tests.
//!
//! Plans split raw bytes, so boundaries may fall inside a UTF-8 sequence.
//! Seeded plans are reproducible from the label printed on failure.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkPlan {
    Fixed(usize),
    /// Split before each byte index; indices must be ascending.
    Boundaries(Vec<usize>),
}

#[derive(Clone, Debug)]
pub struct ChunkPlanCase {
    pub label: String,
    pub plan: ChunkPlan,
}

impl ChunkPlan {
    pub fn split<'a>(&self, bytes: &'a [u8]) -> Vec<&'a [u8]> {
        match self {
            ChunkPlan::Fixed(size) => {
                assert!(*size > 0, "chunk size must be > 0");
                bytes.chunks(*size).collect()
            }
            ChunkPlan::Boundaries(indices) => {
                let mut chunks = Vec::with_capacity(indices.len() + 1);
                let mut start = 0usize;
                for &index in indices {
                    let index = index.min(bytes.len());
                    if index > start {
                        chunks.push(&bytes[start..index]);
                        start = index;
                    }
                }
                if start < bytes.len() {
                    chunks.push(&bytes[start..]);
                }
                chunks
            }
        }
    }
}

/// Fixed sizes, markup-aware boundaries, then `fuzz_runs` seeded plans.
pub fn build_chunk_plans(input: &[u8], fuzz_runs: usize, fuzz_seed: u64) -> Vec<ChunkPlanCase> {
    let mut plans = Vec::new();
    for size in [1usize, 2, 3, 4, 7, 16, 64] {
        plans.push(ChunkPlanCase {
            label: format!("fixed size={size}"),
            plan: ChunkPlan::Fixed(size),
        });
    }

    let markup = markup_boundaries(input);
    if !markup.is_empty() {
        plans.push(ChunkPlanCase {
            label: format!("markup-boundaries count={}", markup.len()),
            plan: ChunkPlan::Boundaries(markup),
        });
    }

    if input.len() > 1 {
        let candidates: Vec<usize> = (1..input.len()).collect();
        for i in 0..fuzz_runs {
            let seed = fuzz_seed.wrapping_add(i as u64);
            let mut rng = Lcg::new(seed);
            let mut picks = candidates.clone();
            rng.shuffle(&mut picks);
            let count = 1 + rng.gen_range(candidates.len().min(32));
            picks.truncate(count);
            picks.sort_unstable();
            plans.push(ChunkPlanCase {
                label: format!("fuzz boundaries seed=0x{seed:016x}"),
                plan: ChunkPlan::Boundaries(picks),
            });
        }
    }

    plans
}

fn markup_boundaries(input: &[u8]) -> Vec<usize> {
    let mut out = Vec::new();
    for (i, &b) in input.iter().enumerate() {
        if matches!(b, b'<' | b'>' | b'"' | b'\'' | b'&' | b';' | b'-') {
            out.push(i);
            out.push(i + 1);
        }
    }
    out.retain(|&i| i > 0 && i < input.len());
    out.sort_unstable();
    out.dedup();
    out
}

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn gen_range(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        (self.next_u64() >> 32) as usize % upper
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.gen_range(i + 1);
            items.swap(i, j);
        }
    }
}
