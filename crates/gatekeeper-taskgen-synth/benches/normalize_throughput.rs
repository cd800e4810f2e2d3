use criterion::{criterion_group, criterion_main, Criterion};
use gatekeeper_taskgen_synth::{normalize_document, NormalizationGate};

fn pod_with_containers(count: usize) -> String {
    let mut pod = String::from("apiVersion: v1\nkind: Pod\nmetadata:\n  name: bench\nspec:\n  containers:\n");
    for i in 0..count {
        pod.push_str(&format!(
            "  - name: c{i}\n    image: nginx\n    resources:\n      limits:\n        cpu: 500m\n        memory: 1Gi\n      requests:\n        cpu: 250m\n        memory: 512Mi\n"
        ));
    }
    pod
}

fn bench_normalize_throughput(c: &mut Criterion) {
    let small = pod_with_containers(2);
    let large = pod_with_containers(64);
    c.bench_function("normalize_pod_2_containers", |b| {
        b.iter(|| normalize_document(&small, NormalizationGate::ALL).expect("normalize"))
    });
    c.bench_function("normalize_pod_64_containers", |b| {
        b.iter(|| normalize_document(&large, NormalizationGate::ALL).expect("normalize"))
    });
}

criterion_group!(benches, bench_normalize_throughput);
criterion_main!(benches);
