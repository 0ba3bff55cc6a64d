#![allow(missing_docs)]

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tasklink_core::{SpecialFilter, Subtask, Task, TaskFilterBuilder};
use time::{Date, Duration, macros::date};

const TODAY: Date = date!(2025 - 06 - 15);

fn build_tasks(count: usize) -> Vec<Task> {
    (0..count)
        .map(|idx| {
            let offset = i64::try_from(idx % 60).unwrap_or_default() - 30;
            let mut task = Task::draft(format!("task number {idx}"))
                .with_date(TODAY.saturating_add(Duration::days(offset)))
                .with_tag(format!("tag-{}", idx % 7))
                .with_subtask(Subtask::new("first"));
            if idx % 3 == 0 {
                task = task.with_tag("Shared").with_subtask(Subtask::new("second").completed());
            }
            task.archived = idx % 11 == 0;
            task.done = idx % 2 == 0;
            task
        })
        .collect()
}

fn special_filter_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("special_filter");
    let tasks = build_tasks(2_000);
    for special in SpecialFilter::ALL {
        let filter = TaskFilterBuilder::new().special(Some(special)).build();
        group.bench_with_input(BenchmarkId::from_parameter(special), &filter, |b, filter| {
            b.iter(|| black_box(filter.apply(&tasks, TODAY)));
        });
    }
    group.finish();
}

fn predicate_pipeline_benchmark(c: &mut Criterion) {
    let filter = TaskFilterBuilder::new()
        .with_completion_switches(true, false, false)
        .due_soon(true)
        .with_tags("shared")
        .with_text("number 1")
        .build();
    c.bench_function("predicate_pipeline", |b| {
        b.iter_batched(
            || build_tasks(2_000),
            |tasks| black_box(filter.apply(&tasks, TODAY)),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, special_filter_benchmark, predicate_pipeline_benchmark);
criterion_main!(benches);
