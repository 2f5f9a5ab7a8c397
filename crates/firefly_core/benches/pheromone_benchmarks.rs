use criterion::{black_box, criterion_group, criterion_main, Criterion};
use firefly_core::config::PheromoneConfig;
use firefly_core::pheromone::PheromoneField;
use firefly_data::{TrailKind, Vec2};
use uuid::Uuid;

/// A field with a few hundred trails of every kind spread over the arena.
fn busy_field() -> PheromoneField {
    let mut field = PheromoneField::new(&PheromoneConfig::default());
    for i in 0..400u64 {
        let kind = TrailKind::ALL[(i % 5) as usize];
        let pos = Vec2::new((i % 20) as f64 * 60.0, (i / 20) as f64 * 40.0);
        field.deposit(pos, kind, Some(Uuid::from_u128(u128::from(i))), None, 0.0);
    }
    field
}

fn bench_influence(c: &mut Criterion) {
    let field = busy_field();

    c.bench_function("pheromone_influence_center", |b| {
        b.iter(|| black_box(field.influence_at(Vec2::new(600.0, 400.0), None, true)))
    });
}

fn bench_deposit_merge(c: &mut Criterion) {
    c.bench_function("pheromone_deposit_merge_100", |b| {
        b.iter(|| {
            let mut field = PheromoneField::new(&PheromoneConfig::default());
            let owner = Some(Uuid::from_u128(1));
            for i in 0..100 {
                let pos = Vec2::new(300.0 + f64::from(i % 3), 300.0);
                field.deposit(pos, TrailKind::Food, owner, None, f64::from(i));
            }
            black_box(field.len())
        })
    });
}

fn bench_decay(c: &mut Criterion) {
    c.bench_function("pheromone_update_400", |b| {
        b.iter(|| {
            let mut field = busy_field();
            field.update(1000.0);
            black_box(field.len())
        })
    });
}

criterion_group!(benches, bench_influence, bench_deposit_merge, bench_decay);
criterion_main!(benches);
