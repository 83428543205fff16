use criterion::{black_box, criterion_group, criterion_main, Criterion};

use barbershop_sim::clock::{VectorClock, CLIENT_SLOT, SERVER_SLOT};

fn bench_vector_clock(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector_clock");

    group.bench_function("increment", |b| {
        let mut clock = VectorClock::pair();
        b.iter(|| clock.increment(black_box(SERVER_SLOT)));
    });

    group.bench_function("exchange", |b| {
        let mut server = VectorClock::from_slots(vec![40, 3]);
        b.iter(|| {
            let mut client = VectorClock::pair();
            client.increment(CLIENT_SLOT);
            server.merge(black_box(&client));
            client.merge(&server);
            black_box(client)
        });
    });

    group.bench_function("partial_cmp", |b| {
        let a = VectorClock::from_slots(vec![3, 1]);
        let z = VectorClock::from_slots(vec![2, 4]);
        b.iter(|| black_box(a.partial_cmp(black_box(&z))));
    });

    group.finish();
}

criterion_group!(benches, bench_vector_clock);
criterion_main!(benches);
