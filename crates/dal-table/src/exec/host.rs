//! Scalar executor for `ComputeDevice::Host`.

use crate::dtype::{convert_slice, Element, ElementType};
use crate::storage::Storage;
use crate::Result;

use super::{dispatch, Executor, GatherKernel, GatherPlan};

/// Single-threaded gather on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostExecutor;

impl GatherKernel for HostExecutor {
    fn run<S: Element, D: Element>(&self, src: &[S], plan: &GatherPlan) -> Vec<D> {
        let mut out = Vec::with_capacity(plan.output_len());
        for seg in plan.segments() {
            for j in 0..seg.repeat {
                let base = seg.start + j * seg.step;
                if seg.stride == 1 {
                    out.extend(convert_slice::<S, D>(&src[base..base + seg.len]));
                } else {
                    out.extend(
                        src[base..]
                            .iter()
                            .step_by(seg.stride)
                            .take(seg.len)
                            .map(|&v| v.cast::<D>()),
                    );
                }
            }
        }
        out
    }
}

impl Executor for HostExecutor {
    fn name(&self) -> &str {
        "host"
    }

    fn gather(&self, source: &Storage, plan: &GatherPlan, target: ElementType) -> Result<Storage> {
        Ok(dispatch(self, source, plan, target))
    }
}
