//! Poll loop benchmark suite.
//!
//! Measures the engine's own overhead against the in-memory session:
//! - Immediate satisfaction of readiness queries
//! - Conditions satisfied after a number of polls
//! - Click fallback through the strategy chain
//!
//! Run with: cargo bench --bench poller
//! Results saved to: target/criterion/

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tokio::runtime::Runtime;

use careers_e2e::mock::{FakeNode, FakeSession};
use careers_e2e::waits::{Condition, FALLBACK_CHAIN, boxed_probe};
use careers_e2e::{By, ClickStrategy, ClickTarget, RetryBudget, WaitOptions, Waits};

// ============================================================================
// Fixtures
// ============================================================================

const URL: &str = "https://example.test/";

fn site(cards: usize) -> Arc<FakeSession> {
    let fake = FakeSession::new(URL);
    fake.with_page(|page| {
        page.add(By::css("header"), FakeNode::new("header"));
        page.add(
            By::css("#apply"),
            FakeNode::new("button").fail_clicks(ClickStrategy::Direct, u32::MAX),
        );
        for i in 0..cards {
            page.add(
                By::css(".position-list-item"),
                FakeNode::new("div").text(format!("Quality Assurance Engineer #{i}")),
            );
        }
    });
    fake
}

/// Satisfied on the `polls`-th evaluation.
fn after(polls: u32) -> Condition<u32> {
    let seen = Arc::new(AtomicU32::new(0));
    Condition::new(format!("satisfied after {polls} polls"), move |_session| {
        let seen = Arc::clone(&seen);
        boxed_probe(async move {
            let n = seen.fetch_add(1, Ordering::SeqCst) + 1;
            Ok((n >= polls).then_some(n))
        })
    })
}

// ============================================================================
// Benchmark: Immediate Satisfaction
// ============================================================================

fn bench_immediate(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let waits = Waits::new(site(0));

    let mut group = c.benchmark_group("immediate");
    group.bench_function("visible", |b| {
        b.to_async(&rt)
            .iter(|| async { waits.visible(&By::css("header")).await.unwrap() });
    });
    group.bench_function("clickable", |b| {
        b.to_async(&rt)
            .iter(|| async { waits.clickable(&By::css("#apply")).await.unwrap() });
    });
    group.finish();
}

// ============================================================================
// Benchmark: Card Scans
// ============================================================================

fn bench_all_visible(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("all_visible");
    for &cards in &[1usize, 10, 100] {
        let waits = Waits::new(site(cards));
        group.bench_with_input(BenchmarkId::new("cards", cards), &cards, |b, _| {
            b.to_async(&rt).iter(|| async {
                waits
                    .all_visible(&By::css(".position-list-item"))
                    .await
                    .unwrap()
            });
        });
    }
    group.finish();
}

// ============================================================================
// Benchmark: Repeated Polls
// ============================================================================

fn bench_polls(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let options = WaitOptions::new()
        .with_timeout(Duration::from_secs(5))
        .with_poll_interval(Duration::from_millis(1));
    let waits = Waits::with_options(site(0), options);

    let mut group = c.benchmark_group("polls");
    group.sample_size(20);
    for &polls in &[1u32, 3, 10] {
        group.bench_with_input(BenchmarkId::new("until", polls), &polls, |b, &polls| {
            b.to_async(&rt)
                .iter(|| async { waits.until(&after(polls)).await.unwrap() });
        });
    }
    group.finish();
}

// ============================================================================
// Benchmark: Click Fallback
// ============================================================================

fn bench_click_fallback(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let waits = Waits::new(site(0));
    let target = ClickTarget::located(&By::css("#apply"));

    c.bench_function("click_fallback/direct_intercepted", |b| {
        b.to_async(&rt).iter(|| async {
            waits
                .perform_click(&target, &FALLBACK_CHAIN, RetryBudget::DEFAULT)
                .await
                .unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_immediate,
    bench_all_visible,
    bench_polls,
    bench_click_fallback
);
criterion_main!(benches);
