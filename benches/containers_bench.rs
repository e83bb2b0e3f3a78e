//! Criterion-based benchmarks for the stowage containers
//!
//! Groups measure growth, editing, lookup and traversal of each container,
//! with pre-sized and default-sized variants side by side.

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};

use stowage::{
    Cursor, GenericQueue, GenericVector, Map, NarrowString, SList, TypeTag, TypedQueue,
    TypedVector, Value,
};

// =============================================================================
// BENCHMARK CONFIGURATION
// =============================================================================

const SMALL_SIZE: usize = 1_000;
const MEDIUM_SIZE: usize = 10_000;
const LARGE_SIZE: usize = 100_000;
const SIZES: &[usize] = &[SMALL_SIZE, MEDIUM_SIZE, LARGE_SIZE];

// =============================================================================
// VECTOR BENCHMARKS
// =============================================================================

fn bench_vector_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector_push");

    for &size in SIZES {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("TypedVector", size), &size, |b, &size| {
            b.iter(|| {
                let mut vec = TypedVector::new(8).unwrap();
                for i in 0..size as u64 {
                    vec.push_back(black_box(&i.to_ne_bytes())).unwrap();
                }
                black_box(vec)
            });
        });

        group.bench_with_input(BenchmarkId::new("GenericVector", size), &size, |b, &size| {
            b.iter(|| {
                let mut vec = GenericVector::new();
                for i in 0..size as u64 {
                    vec.push_back(TypeTag::UInt64, black_box(&i.to_ne_bytes())).unwrap();
                }
                black_box(vec)
            });
        });

        group.bench_with_input(BenchmarkId::new("TypedVector/presized", size), &size, |b, &size| {
            b.iter(|| {
                let mut vec = TypedVector::with_capacity(size, 8).unwrap();
                for i in 0..size as u64 {
                    vec.push_back(black_box(&i.to_ne_bytes())).unwrap();
                }
                black_box(vec)
            });
        });

        group.bench_with_input(BenchmarkId::new("SList", size), &size, |b, &size| {
            b.iter(|| {
                let mut list = SList::new();
                for i in 0..size as u64 {
                    list.push_back(TypeTag::UInt64, black_box(&i.to_ne_bytes())).unwrap();
                }
                black_box(list)
            });
        });
    }

    group.finish();
}

fn filled_typed_vector(size: usize) -> TypedVector {
    let mut vec = TypedVector::with_capacity(size, 8).unwrap();
    for i in 0..size as u64 {
        vec.push_back(&i.to_ne_bytes()).unwrap();
    }
    vec
}

fn bench_vector_edit(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector_edit");

    for &size in SIZES {
        let quarter = size / 4;

        group.bench_with_input(BenchmarkId::new("remove_range", size), &size, |b, &size| {
            b.iter_batched(
                || filled_typed_vector(size),
                |mut vec| {
                    vec.remove_range(black_box(quarter), quarter).unwrap();
                    black_box(vec)
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("swap_range", size), &size, |b, &size| {
            b.iter_batched(
                || filled_typed_vector(size),
                |mut vec| {
                    vec.swap_range(0, black_box(2 * quarter), quarter).unwrap();
                    black_box(vec)
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("generic_swap_range", size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let mut vec = GenericVector::with_capacity(size).unwrap();
                    for i in 0..size as u64 {
                        vec.push_back(TypeTag::UInt64, &i.to_ne_bytes()).unwrap();
                    }
                    vec
                },
                |mut vec| {
                    vec.swap_range(0, black_box(2 * quarter), quarter).unwrap();
                    black_box(vec)
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_vector_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector_traversal");

    for &size in SIZES {
        group.throughput(Throughput::Elements(size as u64));

        let mut vec = filled_typed_vector(size);

        group.bench_function(BenchmarkId::new("iter", size), |b| {
            b.iter(|| {
                let sum: u64 = vec
                    .iter()
                    .map(|chunk| u64::from_ne_bytes(chunk.try_into().unwrap_or([0; 8])))
                    .sum();
                black_box(sum)
            });
        });

        group.bench_function(BenchmarkId::new("cursor", size), |b| {
            b.iter(|| {
                let mut sum = 0u64;
                let mut cursor = vec.cursor();
                while cursor.next() {
                    let chunk = cursor.value().unwrap();
                    sum += u64::from_ne_bytes(chunk.try_into().unwrap_or([0; 8]));
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

fn bench_vector_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector_sort");

    for &size in &[SMALL_SIZE, MEDIUM_SIZE] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("TypedVector", size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let mut vec = TypedVector::with_capacity(size, 8).unwrap();
                    for i in 0..size as u64 {
                        let scrambled = i.wrapping_mul(0x9E37_79B9_7F4A_7C15);
                        vec.push_back(&scrambled.to_be_bytes()).unwrap();
                    }
                    vec
                },
                |mut vec| {
                    vec.sort(&stowage::RawComparator).unwrap();
                    black_box(vec)
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

// =============================================================================
// MAP BENCHMARKS
// =============================================================================

fn bench_map_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_insert");

    for &size in SIZES {
        group.throughput(Throughput::Elements(size as u64));
        let keys: Vec<String> = (1..=size).map(|i| i.to_string()).collect();

        group.bench_with_input(BenchmarkId::new("Map", size), &keys, |b, keys| {
            b.iter(|| {
                let mut map = Map::new();
                for (i, key) in keys.iter().enumerate() {
                    map.insert_value(Value::from_str(key), Value::from_u64(i as u64))
                        .unwrap();
                }
                black_box(map)
            });
        });

        group.bench_with_input(BenchmarkId::new("key_remove", size), &keys, |b, keys| {
            b.iter_batched(
                || {
                    let mut map = Map::new();
                    for (i, key) in keys.iter().enumerate() {
                        map.insert_value(Value::from_str(key), Value::from_u64(i as u64))
                            .unwrap();
                    }
                    map
                },
                |mut map| {
                    for key in keys.iter().step_by(2) {
                        map.key_remove(&Value::from_str(key)).unwrap();
                    }
                    black_box(map)
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_map_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_lookup");

    for &size in SIZES {
        group.throughput(Throughput::Elements(1000));

        let mut map = Map::new();
        for i in 0..size {
            map.insert_value(Value::from_str(&i.to_string()), Value::from_u64(i as u64))
                .unwrap();
        }
        let probes: Vec<Value> = (0..1000)
            .map(|i| Value::from_str(&((i * 73) % size).to_string()))
            .collect();

        group.bench_function(BenchmarkId::new("value_by_key", size), |b| {
            b.iter(|| {
                for probe in &probes {
                    black_box(map.get(black_box(probe)));
                }
            });
        });
    }

    group.finish();
}

// =============================================================================
// QUEUE BENCHMARKS
// =============================================================================

fn bench_queue_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_push_pop");

    for &size in SIZES {
        group.throughput(Throughput::Elements(size as u64 * 2));

        group.bench_with_input(BenchmarkId::new("TypedQueue", size), &size, |b, &size| {
            b.iter(|| {
                let mut queue = TypedQueue::with_capacity(10, 8, true).unwrap();
                for i in 0..size as u64 {
                    queue.push(&i.to_ne_bytes()).unwrap();
                }
                while let Some(elem) = queue.pop() {
                    black_box(elem);
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("GenericQueue", size), &size, |b, &size| {
            b.iter(|| {
                let mut queue = GenericQueue::with_capacity(10, true).unwrap();
                for i in 0..size as u64 {
                    queue.push(TypeTag::UInt64, &i.to_ne_bytes()).unwrap();
                }
                while let Some(value) = queue.pop() {
                    black_box(value);
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("TypedQueue/presized", size), &size, |b, &size| {
            b.iter(|| {
                let mut queue = TypedQueue::with_capacity(size, 8, false).unwrap();
                for i in 0..size as u64 {
                    queue.push(&i.to_ne_bytes()).unwrap();
                }
                while let Some(elem) = queue.pop() {
                    black_box(elem);
                }
            });
        });
    }

    group.finish();
}

// =============================================================================
// STRING BENCHMARKS
// =============================================================================

fn bench_string_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("string_operations");
    let sentence = "so, we can work with strings in simple way. ".repeat(200);
    let text = NarrowString::from_str(&sentence);

    group.bench_function("append_chr", |b| {
        b.iter(|| {
            let mut s = NarrowString::new();
            for _ in 0..SMALL_SIZE {
                s.append_chr(black_box(b'x')).unwrap();
            }
            black_box(s)
        });
    });

    group.bench_function("insert_replace_str", |b| {
        b.iter_batched(
            || text.clone(),
            |mut s| {
                s.insert_str(black_box(10), "inserted ").unwrap();
                s.replace_str(0, 3, black_box("and so")).unwrap();
                s.remove_range(20, 100).unwrap();
                black_box(s)
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("find_last_str", |b| {
        b.iter(|| black_box(text.find_last_str(black_box("so, we"))));
    });

    group.bench_function("create_splitter_str", |b| {
        b.iter(|| {
            let parts = text.create_splitter_str(black_box(", ")).unwrap();
            black_box(parts.len());
            parts.release();
        });
    });

    group.bench_function("numeric_round_trip", |b| {
        b.iter(|| {
            let s = NarrowString::from_f64(black_box(std::f64::consts::PI));
            black_box(s.to_f64().unwrap())
        });
    });

    group.finish();
}

criterion_group!(
    vector_benches,
    bench_vector_push,
    bench_vector_edit,
    bench_vector_traversal,
    bench_vector_sort
);

criterion_group!(map_benches, bench_map_insert, bench_map_lookup);

criterion_group!(queue_benches, bench_queue_cycle);

criterion_group!(string_benches, bench_string_operations);

criterion_main!(vector_benches, map_benches, queue_benches, string_benches);
