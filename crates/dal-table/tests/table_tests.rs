//! Cross-module properties of tables, accessors, merge and devices.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dal_table::exec::{Executor, HostExecutor};
use dal_table::prelude::*;
use dal_table::{Accelerator, ExecutionConfig, GatherPlan, Storage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random `rows` x `cols` table in row-major order.
fn random_rows(rng: &mut StdRng, rows: usize, cols: usize) -> Vec<f64> {
    (0..rows * cols).map(|_| rng.gen_range(-1000.0..1000.0)).collect()
}

/// Reorder a row-major buffer into column-major.
fn to_column_major<T: Copy>(data: &[T], rows: usize, cols: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(data.len());
    for c in 0..cols {
        for r in 0..rows {
            out.push(data[r * cols + c]);
        }
    }
    out
}

fn small_ctx() -> ExecutionContext {
    ExecutionContext::new(ExecutionConfig {
        parallel_threshold: 5,
        ..ExecutionConfig::default()
    })
    .unwrap()
}

/// Software stand-in for a device backend that counts dispatches.
struct CountingAccelerator {
    calls: AtomicUsize,
}

impl CountingAccelerator {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

impl Accelerator for CountingAccelerator {
    fn name(&self) -> &str {
        "counting"
    }

    fn gather(&self, source: &Storage, plan: &GatherPlan, target: ElementType) -> Result<Storage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        HostExecutor.gather(source, plan, target)
    }
}

// ============================================================================
// Layout invariance
// ============================================================================

#[test]
fn test_layout_invariance_randomized() {
    let mut rng = StdRng::seed_from_u64(0x7ab1e);
    for _ in 0..20 {
        let rows = rng.gen_range(1..40);
        let cols = rng.gen_range(1..8);
        let data = random_rows(&mut rng, rows, cols);
        let rm = HomogenTable::from_slice(rows, cols, &data, Layout::RowMajor).unwrap();
        let cm = HomogenTable::from_vec(rows, cols, to_column_major(&data, rows, cols), Layout::ColumnMajor).unwrap();

        let start = rng.gen_range(0..=rows);
        let end = rng.gen_range(start..=rows);

        assert_eq!(
            RowAccessor::new(&rm).pull_rows::<f64>(start..end).unwrap(),
            RowAccessor::new(&cm).pull_rows::<f64>(start..end).unwrap()
        );
        for c in 0..cols {
            assert_eq!(
                ColumnAccessor::new(&rm).pull_rows::<f64>(c, start..end).unwrap(),
                ColumnAccessor::new(&cm).pull_rows::<f64>(c, start..end).unwrap()
            );
        }
    }
}

#[test]
fn test_column_pull_matches_row_stride() {
    let mut rng = StdRng::seed_from_u64(42);
    let (rows, cols) = (17, 5);
    let data = random_rows(&mut rng, rows, cols);
    let t = HomogenTable::from_slice(rows, cols, &data, Layout::RowMajor).unwrap();

    assert_eq!(RowAccessor::new(&t).pull::<f64>().unwrap(), data);

    let block = RowAccessor::new(&t).pull_rows::<f64>(3..11).unwrap();
    for c in 0..cols {
        let col = ColumnAccessor::new(&t).pull_rows::<f64>(c, 3..11).unwrap();
        assert_eq!(col.len(), 8);
        let strided: Vec<f64> = block.iter().skip(c).step_by(cols).copied().collect();
        assert_eq!(col, strided);
        assert_eq!(ColumnAccessor::new(&t).pull::<f64>(c).unwrap().len(), rows);
    }
}

// ============================================================================
// Conversion
// ============================================================================

#[test]
fn test_int_to_float_and_back() {
    let t = HomogenTable::from_vec(3, 1, vec![-7i32, 0, 16_777_217], Layout::RowMajor).unwrap();
    let acc = ColumnAccessor::new(&t);
    assert_eq!(acc.pull::<f64>(0).unwrap(), vec![-7.0, 0.0, 16_777_217.0]);
    // 2^24 + 1 has no exact f32; rounds to even.
    assert_eq!(acc.pull::<f32>(0).unwrap(), vec![-7.0, 0.0, 16_777_216.0]);

    let f = HomogenTable::from_vec(4, 1, vec![2.7f32, -2.7, f32::INFINITY, f32::NAN], Layout::ColumnMajor).unwrap();
    assert_eq!(
        ColumnAccessor::new(&f).pull::<i32>(0).unwrap(),
        vec![2, -2, i32::MAX, 0]
    );
}

// ============================================================================
// Merge
// ============================================================================

#[test]
fn test_merge_row_major_appends() {
    let mut rng = StdRng::seed_from_u64(3);
    let a_data = random_rows(&mut rng, 4, 3);
    let b_data = random_rows(&mut rng, 6, 3);
    let mut a = HomogenTable::from_slice(4, 3, &a_data, Layout::RowMajor).unwrap();
    let b = HomogenTable::from_slice(6, 3, &b_data, Layout::RowMajor).unwrap();
    a.add_homogen_table(&b).unwrap();

    assert_eq!(a.row_count(), 10);
    assert_eq!(a.column_count(), 3);
    let expected: Vec<f64> = a_data.iter().chain(b_data.iter()).copied().collect();
    assert_eq!(a.as_f64_slice().unwrap(), expected.as_slice());
}

#[test]
fn test_merge_preserves_logical_rows_any_layout() {
    let mut rng = StdRng::seed_from_u64(11);
    let a_data = random_rows(&mut rng, 5, 2);
    let b_data = random_rows(&mut rng, 3, 2);
    let expected: Vec<f64> = a_data.iter().chain(b_data.iter()).copied().collect();

    for (la, lb) in [
        (Layout::RowMajor, Layout::RowMajor),
        (Layout::RowMajor, Layout::ColumnMajor),
        (Layout::ColumnMajor, Layout::RowMajor),
        (Layout::ColumnMajor, Layout::ColumnMajor),
    ] {
        let build = |data: &[f64], rows: usize, layout: Layout| match layout {
            Layout::RowMajor => HomogenTable::from_slice(rows, 2, data, layout).unwrap(),
            Layout::ColumnMajor => HomogenTable::from_vec(rows, 2, to_column_major(data, rows, 2), layout).unwrap(),
        };
        let a = build(&a_data, 5, la);
        let b = build(&b_data, 3, lb);
        let merged = HomogenTable::merge(&a, &b).unwrap();
        assert_eq!(merged.layout(), la);
        assert_eq!(
            RowAccessor::new(&merged).pull::<f64>().unwrap(),
            expected,
            "receiver {la}, other {lb}"
        );
    }
}

#[test]
fn test_merge_on_cpu_matches_host() {
    let ctx = small_ctx();
    let mut rng = StdRng::seed_from_u64(99);
    let a_data = random_rows(&mut rng, 30, 4);
    let b_data = random_rows(&mut rng, 25, 4);

    let mut on_host = HomogenTable::from_slice(30, 4, &a_data, Layout::ColumnMajor).unwrap();
    let mut on_cpu = on_host.clone();
    let b = HomogenTable::from_slice(25, 4, &b_data, Layout::RowMajor).unwrap();

    on_host.add_homogen_table_on(&b, ComputeDevice::Host, &ctx).unwrap();
    on_cpu.add_homogen_table_on(&b, ComputeDevice::Cpu, &ctx).unwrap();
    assert_eq!(on_host, on_cpu);
}

#[test]
fn test_merge_on_accelerator_matches_host() {
    let ctx = small_ctx();
    let acc = CountingAccelerator::new();
    ctx.register_accelerator(acc.clone());

    let mut rng = StdRng::seed_from_u64(17);
    let a_data = random_rows(&mut rng, 12, 3);
    let b_data = random_rows(&mut rng, 9, 3);
    let b = HomogenTable::from_vec(9, 3, to_column_major(&b_data, 9, 3), Layout::ColumnMajor).unwrap();

    for layout in [Layout::RowMajor, Layout::ColumnMajor] {
        let a = match layout {
            Layout::RowMajor => HomogenTable::from_slice(12, 3, &a_data, layout).unwrap(),
            Layout::ColumnMajor => HomogenTable::from_vec(12, 3, to_column_major(&a_data, 12, 3), layout).unwrap(),
        };
        let mut on_host = a.clone();
        let mut on_gpu = a;
        on_host.add_homogen_table_on(&b, ComputeDevice::Host, &ctx).unwrap();
        on_gpu.add_homogen_table_on(&b, ComputeDevice::Gpu, &ctx).unwrap();
        assert_eq!(on_gpu, on_host, "receiver {layout}");
        assert_eq!(on_gpu.row_count(), 21);
    }
    assert_eq!(acc.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_merge_type_mismatch_is_shape_mismatch() {
    let mut a = HomogenTable::from_vec(1, 2, vec![1.0f64, 2.0], Layout::RowMajor).unwrap();
    let b = HomogenTable::from_vec(1, 2, vec![3i32, 4], Layout::RowMajor).unwrap();
    let err = a.add_homogen_table(&b).unwrap_err();
    assert!(matches!(err, TableError::ShapeMismatch { .. }), "got {err:?}");
    assert!(HomogenTable::merge(&b, &a).unwrap_err().is_shape_mismatch());
    assert_eq!(a.row_count(), 1);
}

// ============================================================================
// Devices
// ============================================================================

#[test]
fn test_device_invariance_with_accelerator() {
    let ctx = small_ctx();
    let acc = CountingAccelerator::new();
    ctx.register_accelerator(acc.clone());
    assert!(ctx.has_accelerator());

    let mut rng = StdRng::seed_from_u64(5);
    let data = random_rows(&mut rng, 23, 3);
    let t = HomogenTable::from_slice(23, 3, &data, Layout::ColumnMajor).unwrap();
    let cols = ColumnAccessor::with_context(&t, &ctx);
    let rows = RowAccessor::with_context(&t, &ctx);

    for device in ComputeDevice::ALL {
        assert_eq!(
            cols.pull_f32(2, 4..19, device).unwrap(),
            cols.pull_f32(2, 4..19, ComputeDevice::Host).unwrap(),
            "column pull on {device}"
        );
        assert_eq!(
            rows.pull_i64(.., device).unwrap(),
            rows.pull_i64(.., ComputeDevice::Host).unwrap(),
            "row pull on {device}"
        );
    }
    assert_eq!(acc.calls.load(Ordering::SeqCst), 2);

    let bound = HomogenTable::from_vec_on(1, 1, vec![1.0f64], Layout::RowMajor, ComputeDevice::Gpu, &ctx).unwrap();
    assert_eq!(bound.device(), ComputeDevice::Gpu);
}

#[test]
fn test_gpu_fails_closed_after_clear() {
    let ctx = small_ctx();
    ctx.register_accelerator(CountingAccelerator::new());
    let t = HomogenTable::from_vec(2, 2, vec![1i32, 2, 3, 4], Layout::RowMajor).unwrap();
    assert!(RowAccessor::with_context(&t, &ctx).pull_i32(.., ComputeDevice::Gpu).is_ok());

    assert!(ctx.clear_accelerator().is_some());
    assert!(matches!(
        RowAccessor::with_context(&t, &ctx).pull_i32(.., ComputeDevice::Gpu),
        Err(TableError::DeviceUnavailable(ComputeDevice::Gpu))
    ));
}

#[test]
fn test_concurrent_pulls() {
    let data: Vec<i64> = (0..10_000).collect();
    let t = HomogenTable::from_vec(1000, 10, data, Layout::ColumnMajor).unwrap();
    std::thread::scope(|s| {
        for c in 0..10 {
            let t = &t;
            s.spawn(move || {
                let col = ColumnAccessor::new(t).pull_i64(c, .., ComputeDevice::Cpu).unwrap();
                assert_eq!(col[0], (c * 1000) as i64);
                assert_eq!(col.len(), 1000);
            });
        }
    });
}
