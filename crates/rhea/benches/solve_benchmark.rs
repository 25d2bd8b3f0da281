//! Solver benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rhea::{Relation, Solver, Strength, Variable};

const ROWS: usize = 100;

/// A vertical stack of blocks: each block sits below the previous one,
/// every block has a preferred height, and the total height is pinned.
fn build_stack(rows: usize) -> (Solver, Vec<Variable>) {
    let mut solver = Solver::new();
    let tops: Vec<Variable> = (0..rows).map(|i| Variable::named(format!("top_{i}"))).collect();
    let heights: Vec<Variable> = (0..rows)
        .map(|i| Variable::named(format!("height_{i}")))
        .collect();

    solver
        .create_constraint(tops[0].clone(), Relation::Equal, 0.0, Strength::REQUIRED)
        .unwrap();
    for i in 1..rows {
        solver
            .create_constraint(
                tops[i].clone(),
                Relation::Equal,
                tops[i - 1].clone() + heights[i - 1].clone(),
                Strength::REQUIRED,
            )
            .unwrap();
    }
    for height in &heights {
        solver
            .create_constraint(height.clone(), Relation::GreaterOrEqual, 0.0, Strength::REQUIRED)
            .unwrap();
        solver
            .create_constraint(height.clone(), Relation::Equal, 20.0, Strength::MEDIUM)
            .unwrap();
    }

    (solver, heights)
}

fn add_constraints(c: &mut Criterion) {
    c.bench_function("add_constraints", |b| {
        b.iter(|| build_stack(black_box(ROWS)))
    });
}

fn suggest_values(c: &mut Criterion) {
    let (mut solver, heights) = build_stack(ROWS);
    let first = heights[0].clone();
    solver.add_edit_variable(&first, Strength::STRONG).unwrap();

    let mut value = 0.0;
    c.bench_function("suggest_value", |b| {
        b.iter(|| {
            value = (value + 7.0) % 100.0;
            solver.suggest_value(&first, black_box(value)).unwrap();
            solver.update_variables();
            first.value()
        })
    });
}

criterion_group!(benches, add_constraints, suggest_values);
criterion_main!(benches);
