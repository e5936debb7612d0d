//! Multi-threaded executor for `ComputeDevice::Cpu`.
//!
//! The output buffer is split into fixed-size chunks and each chunk is
//! filled on the rayon pool. A chunk locates its first source element with a
//! binary search over the segment output offsets, then walks the plan
//! forward.

use rayon::prelude::*;

use crate::dtype::{Element, ElementType};
use crate::storage::Storage;
use crate::Result;

use super::host::HostExecutor;
use super::{dispatch, Executor, GatherKernel, GatherPlan};

/// Default minimum number of output elements per parallel chunk.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// Rayon-backed gather. Plans smaller than one chunk run on the calling thread.
#[derive(Debug, Clone, Copy)]
pub struct ParallelExecutor {
    chunk: usize,
}

impl ParallelExecutor {
    pub fn new(threshold: usize) -> Self {
        Self {
            chunk: threshold.max(1),
        }
    }
}

impl Default for ParallelExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_PARALLEL_THRESHOLD)
    }
}

impl GatherKernel for ParallelExecutor {
    fn run<S: Element, D: Element>(&self, src: &[S], plan: &GatherPlan) -> Vec<D> {
        let total = plan.output_len();
        if total <= self.chunk {
            return HostExecutor.run(src, plan);
        }

        let segments = plan.segments();
        let offsets: Vec<usize> = segments
            .iter()
            .scan(0usize, |acc, seg| {
                let start = *acc;
                *acc += seg.output_len();
                Some(start)
            })
            .collect();

        let mut out = vec![D::zeroed(); total];
        out.par_chunks_mut(self.chunk)
            .enumerate()
            .for_each(|(ci, dst)| {
                let base = ci * self.chunk;
                // offsets[0] == 0, so at least one segment qualifies.
                let mut seg_idx = offsets.partition_point(|&o| o <= base) - 1;
                let mut seg = segments[seg_idx];
                let i = base - offsets[seg_idx];
                let (mut j, mut k) = (i / seg.len, i % seg.len);
                for slot in dst.iter_mut() {
                    if k == seg.len {
                        k = 0;
                        j += 1;
                    }
                    if j == seg.repeat {
                        seg_idx += 1;
                        seg = segments[seg_idx];
                        j = 0;
                    }
                    *slot = src[seg.start + j * seg.step + k * seg.stride].cast::<D>();
                    k += 1;
                }
            });
        out
    }
}

impl Executor for ParallelExecutor {
    fn name(&self) -> &str {
        "cpu"
    }

    fn gather(&self, source: &Storage, plan: &GatherPlan, target: ElementType) -> Result<Storage> {
        Ok(dispatch(self, source, plan, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::Segment;
    use crate::layout::Layout;

    #[test]
    fn test_matches_host_across_chunk_boundaries() {
        let data: Vec<f64> = (0..1000).map(|i| i as f64 * 0.25).collect();
        let src = Storage::from_vec(data);
        let plan = GatherPlan::rows(Layout::ColumnMajor, 100, 10, 3..97);
        for chunk in [1, 7, 10, 64, 939, 940, 5000] {
            let par = ParallelExecutor::new(chunk)
                .gather(&src, &plan, ElementType::Float64)
                .unwrap();
            let host = HostExecutor.gather(&src, &plan, ElementType::Float64).unwrap();
            assert_eq!(par, host, "chunk {chunk}");
        }
    }

    #[test]
    fn test_long_strided_segment() {
        let data: Vec<i32> = (0..10_000).collect();
        let src = Storage::from_vec(data);
        let mut plan = GatherPlan::new();
        plan.push(Segment::new(5, 7, 1400));
        let out = ParallelExecutor::new(100)
            .gather(&src, &plan, ElementType::Int64)
            .unwrap();
        let out = out.as_slice::<i64>().unwrap();
        assert_eq!(out.len(), 1400);
        assert_eq!(out[0], 5);
        assert_eq!(out[1399], 5 + 7 * 1399);
    }

    #[test]
    fn test_chunks_inside_repeated_segment() {
        let data: Vec<i64> = (0..3000).collect();
        let src = Storage::from_vec(data);
        // 1000 x 3 column-major, rows 1..999 row by row, then a tail run
        let mut plan = GatherPlan::rows(Layout::ColumnMajor, 1000, 3, 1..999);
        plan.push(Segment::new(0, 1, 5));
        for chunk in [1, 2, 3, 4, 13, 2999] {
            let par = ParallelExecutor::new(chunk)
                .gather(&src, &plan, ElementType::Int64)
                .unwrap();
            let host = HostExecutor.gather(&src, &plan, ElementType::Int64).unwrap();
            assert_eq!(par, host, "chunk {chunk}");
        }
    }

    #[test]
    fn test_small_plan_runs_inline() {
        let src = Storage::from_vec(vec![1.0f32, 2.0, 3.0]);
        let plan = GatherPlan::rows(Layout::RowMajor, 3, 1, 0..3);
        let out = ParallelExecutor::default()
            .gather(&src, &plan, ElementType::Float32)
            .unwrap();
        assert_eq!(out.as_slice::<f32>().unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_zero_threshold_clamped() {
        assert_eq!(ParallelExecutor::new(0).chunk, 1);
    }
}
