use castnet_network::features::{average_degree, network_heterogeneity};
use castnet_network::{
    ActorDirectorGraph, ActorGraph, CollaborationGraph, FeatureExtractor, MovieRecord,
    NetworkBuilder, SnapshotLabel, SnapshotStore, cosine_similarity,
};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tempfile::TempDir;

/// Deterministic synthetic catalogue: `count` movies over `pool` actors and 50 directors.
fn catalogue(count: usize, pool: usize, first_year: i32, years: i32) -> Vec<MovieRecord> {
    (0..count)
        .map(|i| {
            let cast: Vec<String> = (0..6).map(|k| format!("nm{}", (i * 31 + k * 97) % pool)).collect();
            MovieRecord::new(
                &format!("tt{i:07}"),
                first_year + (i as i32 % years),
                cast,
            )
            .with_crew([format!("dr{}", i % 50)])
        })
        .collect()
}

fn bench_ingest(c: &mut Criterion) {
    let movies = catalogue(2_000, 1_500, 2000, 1);

    c.bench_function("actor_graph_ingest_2k_movies", |b| {
        b.iter(|| {
            let mut graph = ActorGraph::new();
            for movie in &movies {
                let _ = graph.process_movie(black_box(movie));
            }
            graph
        })
    });

    c.bench_function("actor_director_graph_ingest_2k_movies", |b| {
        b.iter(|| {
            let mut graph = ActorDirectorGraph::new();
            for movie in &movies {
                let _ = graph.process_movie(black_box(movie));
            }
            graph
        })
    });
}

fn bench_features(c: &mut Criterion) {
    let movies = catalogue(2_000, 1_500, 2000, 1);
    let mut graph = ActorGraph::new();
    for movie in &movies {
        let _ = graph.process_movie(movie);
    }
    let cast: Vec<String> = (0..12).map(|k| format!("nm{}", k * 113)).collect();

    c.bench_function("average_degree_cast_12", |b| {
        b.iter(|| average_degree(&graph, black_box(&cast)))
    });

    c.bench_function("network_heterogeneity_cast_12", |b| {
        b.iter(|| network_heterogeneity(&graph, black_box(&cast)))
    });

    let idx = graph.actors().lookup("nm0").unwrap_or(0);
    let row = graph.vector(idx).to_vec();
    c.bench_function("cosine_similarity_row", |b| {
        b.iter(|| cosine_similarity(black_box(&row), black_box(&row)))
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let movies = catalogue(3_000, 2_000, 2000, 3);
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path().to_path_buf());
    NetworkBuilder::<ActorGraph>::new(&store)
        .run(1999..=2002, &movies)
        .unwrap();

    c.bench_function("snapshot_load_actor", |b| {
        b.iter(|| {
            store
                .load::<ActorGraph>(black_box(SnapshotLabel::Year(2001)))
                .unwrap()
        })
    });

    let extractor = FeatureExtractor::new(&store, 1999);
    c.bench_function("extract_features_parallel", |b| {
        b.iter(|| {
            extractor
                .extract_range::<ActorGraph>(2000..=2002, black_box(&movies))
                .unwrap()
        })
    });

    let sequential = extractor.clone().with_parallel(false);
    c.bench_function("extract_features_sequential", |b| {
        b.iter(|| {
            sequential
                .extract_range::<ActorGraph>(2000..=2002, black_box(&movies))
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_ingest, bench_features, bench_pipeline);
criterion_main!(benches);
