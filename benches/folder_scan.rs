//! Folder scan benchmark suite.
//!
//! Measures both folder strategies over sidebar snapshots of growing size:
//! - Link counts: 100, 1000, 10000
//! - `targeted`: links under the first selector, a third of them duplicates
//! - `loose`: targeted selectors empty, every link scanned
//!
//! Run with: cargo bench --bench folder_scan
//! Results saved to: target/criterion/

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use shot_uploader::folders::{FolderScan, folder_selectors, scan_folders};
use shot_uploader::page::{FolderSnapshot, LinkNode, SelectorHits};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const LINK_COUNTS: &[usize] = &[100, 1_000, 10_000];
const MARKER: &str = "/g/";

// ============================================================================
// Snapshot builders
// ============================================================================

fn links(count: usize) -> Vec<LinkNode> {
    (0..count)
        .map(|i| {
            let id = i - i % 3;
            LinkNode {
                href: Some(format!("https://chatgpt.com/g/g-p-{id}-course/c/{i}")),
                text: if i % 5 == 0 { String::new() } else { format!("Course {id}") },
                child_text: format!("Course {id}"),
                parent_text: format!("Course {id} sidebar"),
            }
        })
        .collect()
}

fn targeted_scan(count: usize) -> FolderScan {
    let mut targeted: Vec<SelectorHits> = folder_selectors(MARKER)
        .into_iter()
        .map(|selector| SelectorHits {
            selector,
            links: Vec::new(),
        })
        .collect();
    targeted[0].links = links(count);

    FolderScan {
        snapshot: FolderSnapshot {
            targeted,
            all_links: Vec::new(),
        },
        marker: MARKER.to_string(),
    }
}

fn loose_scan(count: usize) -> FolderScan {
    FolderScan {
        snapshot: FolderSnapshot {
            targeted: Vec::new(),
            all_links: links(count),
        },
        marker: MARKER.to_string(),
    }
}

// ============================================================================
// Benchmark: Folder Scan
// ============================================================================

fn bench_folder_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("folder_scan");

    for &count in LINK_COUNTS {
        group.throughput(Throughput::Elements(count as u64));

        let scan = targeted_scan(count);
        group.bench_with_input(BenchmarkId::new("targeted", count), &scan, |b, scan| {
            b.iter(|| scan_folders(black_box(scan)));
        });

        let scan = loose_scan(count);
        group.bench_with_input(BenchmarkId::new("loose", count), &scan, |b, scan| {
            b.iter(|| scan_folders(black_box(scan)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_folder_scan);
criterion_main!(benches);
