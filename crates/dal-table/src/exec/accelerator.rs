//! Hook for accelerator (GPU) execution.
//!
//! The table layer does not drive devices itself. An external crate
//! implements [`Accelerator`] and registers it on an
//! [`ExecutionContext`](super::ExecutionContext); `gpu` requests are then
//! routed to it. Results coming back are checked for length and type before
//! they reach the caller.

use std::sync::Arc;

use crate::device::ComputeDevice;
use crate::dtype::ElementType;
use crate::error::TableError;
use crate::storage::Storage;
use crate::Result;

use super::{Executor, GatherPlan};

/// An external device able to run gather plans.
///
/// Implementations must be synchronous from the caller's point of view: if
/// the device queue is asynchronous, `gather` waits for completion.
pub trait Accelerator: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the device can currently take work.
    fn is_available(&self) -> bool {
        true
    }

    fn gather(&self, source: &Storage, plan: &GatherPlan, target: ElementType) -> Result<Storage>;
}

/// Adapts a registered accelerator to the `Executor` interface.
pub(crate) struct AcceleratorExecutor {
    inner: Arc<dyn Accelerator>,
}

impl AcceleratorExecutor {
    pub(crate) fn new(inner: Arc<dyn Accelerator>) -> Self {
        Self { inner }
    }
}

impl Executor for AcceleratorExecutor {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn gather(&self, source: &Storage, plan: &GatherPlan, target: ElementType) -> Result<Storage> {
        if !self.inner.is_available() {
            tracing::warn!("accelerator '{}' is unavailable", self.inner.name());
            return Err(TableError::DeviceUnavailable(ComputeDevice::Gpu));
        }
        let out = self.inner.gather(source, plan, target)?;
        if out.dtype() != target {
            return Err(TableError::TypeMismatch {
                expected: target,
                got: out.dtype(),
            });
        }
        if out.numel() != plan.output_len() {
            return Err(TableError::shape(vec![plan.output_len()], vec![out.numel()]));
        }
        Ok(out)
    }
}
