//! Execution layer: gather plans and per-device executors.
//!
//! Every extraction and merge is compiled into a [`GatherPlan`] (which
//! source elements to read, in output order) and handed to the executor the
//! requested [`ComputeDevice`] maps to:
//! - `host`: [`HostExecutor`], a scalar loop on the calling thread
//! - `cpu`: [`ParallelExecutor`], a rayon gather
//! - `gpu`: the [`Accelerator`] registered on the [`ExecutionContext`]
//!
//! Executors only decide where the copy runs. All of them produce the same
//! values for the same plan.

pub mod accelerator;
pub mod host;
pub mod parallel;

use std::ops::Range;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::config::ExecutionConfig;
use crate::device::ComputeDevice;
use crate::dtype::{Element, ElementType};
use crate::error::TableError;
use crate::layout::Layout;
use crate::storage::{Storage, StorageData};
use crate::Result;

pub use accelerator::Accelerator;
pub use host::HostExecutor;
pub use parallel::ParallelExecutor;

/// A strided run of source elements, optionally repeated.
///
/// Yields `repeat` passes of `len` elements; element `k` of pass `j` is
/// read from `start + j * step + k * stride`. A transposing read (one
/// table row out of a column-major buffer, row after row) is a single
/// segment, so plans stay O(1) in the row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub stride: usize,
    pub len: usize,
    pub repeat: usize,
    pub step: usize,
}

impl Segment {
    /// A single pass of `len` elements.
    pub fn new(start: usize, stride: usize, len: usize) -> Self {
        Self {
            start,
            stride: stride.max(1),
            len,
            repeat: 1,
            step: 0,
        }
    }

    /// `repeat` passes, each `step` past the previous one. Passes that
    /// tile a contiguous range collapse into one plain run.
    pub fn repeated(start: usize, stride: usize, len: usize, repeat: usize, step: usize) -> Self {
        let stride = stride.max(1);
        if repeat == 1 || (stride == 1 && step == len) {
            return Self::new(start, stride, len * repeat);
        }
        Self {
            start,
            stride,
            len,
            repeat,
            step,
        }
    }

    /// Number of elements the segment yields.
    pub fn output_len(&self) -> usize {
        self.len * self.repeat
    }

    /// Source index of the `i`-th element of this segment.
    #[inline]
    pub fn index(&self, i: usize) -> usize {
        let (j, k) = (i / self.len, i % self.len);
        self.start + j * self.step + k * self.stride
    }

    /// Last source index read, or None for an empty segment.
    pub fn last(&self) -> Option<usize> {
        if self.output_len() == 0 {
            return None;
        }
        Some(self.start + (self.repeat - 1) * self.step + (self.len - 1) * self.stride)
    }
}

/// Ordered list of segments describing an extraction.
///
/// The output is the concatenation of every segment's elements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GatherPlan {
    segments: SmallVec<[Segment; 2]>,
    output_len: usize,
}

impl GatherPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment. Empty segments are dropped.
    pub fn push(&mut self, segment: Segment) {
        if segment.output_len() == 0 {
            return;
        }
        self.output_len += segment.output_len();
        self.segments.push(segment);
    }

    /// One column over `rows` of a `row_count` x `col_count` table.
    pub fn column(layout: Layout, row_count: usize, col_count: usize, column: usize, rows: Range<usize>) -> Self {
        let mut plan = Self::new();
        let start = layout.offset(rows.start, column, row_count, col_count);
        plan.push(Segment::new(start, layout.row_stride(col_count), rows.len()));
        plan
    }

    /// Rows `rows` of the table, all columns, in row-major output order.
    pub fn rows(layout: Layout, row_count: usize, col_count: usize, rows: Range<usize>) -> Self {
        let mut plan = Self::new();
        plan.push(Segment::repeated(
            layout.offset(rows.start, 0, row_count, col_count),
            layout.column_stride(row_count),
            col_count,
            rows.len(),
            layout.row_stride(col_count),
        ));
        plan
    }

    /// The whole table in column-major output order.
    pub fn columns(layout: Layout, row_count: usize, col_count: usize) -> Self {
        let mut plan = Self::new();
        plan.push(Segment::repeated(
            0,
            layout.row_stride(col_count),
            row_count,
            col_count,
            layout.column_stride(row_count),
        ));
        plan
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of elements the plan produces.
    pub fn output_len(&self) -> usize {
        self.output_len
    }

    /// Check that every read falls inside a source of `source_len` elements.
    pub fn validate(&self, source_len: usize) -> Result<()> {
        for seg in &self.segments {
            if let Some(last) = seg.last() {
                if last >= source_len {
                    return Err(TableError::out_of_bounds("element", last, source_len));
                }
            }
        }
        Ok(())
    }
}

/// A backend that can run gather plans.
pub trait Executor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Read `plan` out of `source`, converting every element to `target`.
    ///
    /// Must block until the result is materialized.
    fn gather(&self, source: &Storage, plan: &GatherPlan, target: ElementType) -> Result<Storage>;
}

/// Typed inner loop of a host-side executor.
pub(crate) trait GatherKernel {
    fn run<S: Element, D: Element>(&self, src: &[S], plan: &GatherPlan) -> Vec<D>;
}

/// Resolve the source and target types and run `kernel` monomorphized for them.
pub(crate) fn dispatch<K: GatherKernel>(kernel: &K, source: &Storage, plan: &GatherPlan, target: ElementType) -> Storage {
    match source.data() {
        StorageData::Int32(v) => dispatch_target(kernel, v, plan, target),
        StorageData::Int64(v) => dispatch_target(kernel, v, plan, target),
        StorageData::Float32(v) => dispatch_target(kernel, v, plan, target),
        StorageData::Float64(v) => dispatch_target(kernel, v, plan, target),
    }
}

fn dispatch_target<K: GatherKernel, S: Element>(kernel: &K, src: &[S], plan: &GatherPlan, target: ElementType) -> Storage {
    match target {
        ElementType::Int32 => Storage::from_vec(kernel.run::<S, i32>(src, plan)),
        ElementType::Int64 => Storage::from_vec(kernel.run::<S, i64>(src, plan)),
        ElementType::Float32 => Storage::from_vec(kernel.run::<S, f32>(src, plan)),
        ElementType::Float64 => Storage::from_vec(kernel.run::<S, f64>(src, plan)),
    }
}

/// Executors and tuning shared by accessors and merges.
///
/// The accelerator slot is empty until a caller registers one; `gpu`
/// requests fail with `DeviceUnavailable` until then. There is no fallback
/// to the host.
pub struct ExecutionContext {
    config: ExecutionConfig,
    host: HostExecutor,
    cpu: ParallelExecutor,
    accelerator: RwLock<Option<Arc<dyn Accelerator>>>,
}

static SHARED: OnceLock<ExecutionContext> = OnceLock::new();

impl ExecutionContext {
    /// Build a context from a validated configuration.
    pub fn new(config: ExecutionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Process-wide context with default configuration and no accelerator.
    pub fn shared() -> &'static ExecutionContext {
        SHARED.get_or_init(|| Self::build(ExecutionConfig::default()))
    }

    fn build(config: ExecutionConfig) -> Self {
        Self {
            host: HostExecutor,
            cpu: ParallelExecutor::new(config.parallel_threshold),
            config,
            accelerator: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Install the accelerator that serves `gpu` requests, replacing any previous one.
    pub fn register_accelerator(&self, accelerator: Arc<dyn Accelerator>) {
        tracing::info!("registering accelerator '{}'", accelerator.name());
        *self.accelerator.write() = Some(accelerator);
    }

    /// Remove the registered accelerator, returning it.
    pub fn clear_accelerator(&self) -> Option<Arc<dyn Accelerator>> {
        let previous = self.accelerator.write().take();
        if let Some(acc) = &previous {
            tracing::info!("cleared accelerator '{}'", acc.name());
        }
        previous
    }

    /// Whether an accelerator is registered and reports itself available.
    pub fn has_accelerator(&self) -> bool {
        self.accelerator
            .read()
            .as_ref()
            .map(|acc| acc.is_available())
            .unwrap_or(false)
    }

    /// Fail with `DeviceUnavailable` unless `device` can run work right now.
    pub fn ensure_available(&self, device: ComputeDevice) -> Result<()> {
        if device.is_accelerator() && !self.has_accelerator() {
            tracing::warn!("refusing {} request: no accelerator available", device);
            return Err(TableError::DeviceUnavailable(device));
        }
        Ok(())
    }

    /// Run `plan` over `source` on `device`, converting to `target`.
    pub fn gather(&self, device: ComputeDevice, source: &Storage, plan: &GatherPlan, target: ElementType) -> Result<Storage> {
        plan.validate(source.numel())?;
        match device {
            ComputeDevice::Host => self.host.gather(source, plan, target),
            ComputeDevice::Cpu => self.cpu.gather(source, plan, target),
            ComputeDevice::Gpu => {
                let acc = self.accelerator.read().clone();
                match acc {
                    Some(acc) => accelerator::AcceleratorExecutor::new(acc).gather(source, plan, target),
                    None => {
                        tracing::warn!("refusing gpu request: no accelerator registered");
                        Err(TableError::DeviceUnavailable(device))
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let acc = self.accelerator.read().as_ref().map(|a| a.name().to_string());
        f.debug_struct("ExecutionContext")
            .field("config", &self.config)
            .field("accelerator", &acc)
            .finish()
    }
}
