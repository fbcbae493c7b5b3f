// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use meshport_processing::{
    FetchError, Fetcher, FormatParser, FormatTag, LoadConfig, LoadError, LoadRequest, MemoryFetcher,
    ModelLoader, NoProgress, ParseContext, ParseError, ParsedModel, ParserRegistry, RecordingProgress,
    Shading,
};

/// Binary STL with `count` small triangles laid out along X
fn binary_stl(count: u32) -> Vec<u8> {
    let mut bytes = vec![0u8; 80];
    bytes.extend_from_slice(&count.to_le_bytes());
    for i in 0..count {
        let x = i as f32 * 0.001;
        let facet = [0.0f32, 0.0, 1.0, x, 0.0, 0.0, x + 0.001, 0.0, 0.0, x, 0.001, 0.0];
        for v in facet {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.extend_from_slice(&[0, 0]);
    }
    bytes
}

const CUBE_OBJ: &str = "mtllib part.mtl
o part
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 0 0 1
v 1 0 1
v 1 1 1
v 0 1 1
usemtl red
f 1 2 3 4
f 5 6 7 8
f 1 2 6 5
f 4 3 7 8
";

const RED_MTL: &str = "newmtl red
Kd 1.0 0.0 0.0
Ns 50
d 1.0
";

fn loader_over(fetcher: &Arc<MemoryFetcher>) -> ModelLoader {
    ModelLoader::new(fetcher.clone(), LoadConfig::default())
}

/// Parser that fails every attempt with the given error and counts calls
struct FailingParser {
    calls: Arc<AtomicU32>,
    error: fn() -> ParseError,
}

impl FormatParser for FailingParser {
    fn parse<'a>(&'a self, _ctx: ParseContext<'a>) -> BoxFuture<'a, Result<ParsedModel, ParseError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        futures::future::ready(Err((self.error)())).boxed()
    }

    fn supported_formats(&self) -> Vec<FormatTag> {
        vec![FormatTag::Stl]
    }
}

fn failing_loader(error: fn() -> ParseError) -> (ModelLoader, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let mut registry = ParserRegistry::empty();
    registry.register(Box::new(FailingParser {
        calls: calls.clone(),
        error,
    }));
    let loader = ModelLoader::new(Arc::new(MemoryFetcher::new()), LoadConfig::default()).with_registry(registry);
    (loader, calls)
}

/// Fails the first `failures` fetches, then serves `bytes`
struct FlakyFetcher {
    failures: u32,
    calls: AtomicU32,
    bytes: Vec<u8>,
}

impl Fetcher for FlakyFetcher {
    fn fetch<'a>(&'a self, location: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let result = if call < self.failures {
            Err(FetchError::Network(format!("connection reset fetching {}", location)))
        } else {
            Ok(self.bytes.clone())
        };
        futures::future::ready(result).boxed()
    }
}

#[tokio::test]
async fn test_binary_stl_load() {
    let fetcher = Arc::new(MemoryFetcher::new().with_file("mem://bracket.stl", binary_stl(1200)));
    let loader = loader_over(&fetcher);

    let model = loader
        .load(&LoadRequest::new("mem://bracket.stl", "bracket.stl"), &NoProgress)
        .await
        .unwrap();

    let metadata = model.metadata();
    assert_eq!(metadata.format, FormatTag::Stl);
    assert_eq!(metadata.face_count, 1200);
    assert_eq!(metadata.vertex_count, 3600);
    assert_eq!(metadata.attempts, 1);
    assert_eq!(metadata.approx_file_size_bytes, Some(84 + 50 * 1200));
    assert!(!metadata.approximate);
    assert_eq!(model.materials().len(), 1);
    assert!(model.geometry().has_normals());

    // Centred on the origin after sanitization
    let center = model.analysis().center;
    assert!(center.coords.norm() < 1e-4, "center = {:?}", center);
}

#[tokio::test]
async fn test_unsupported_format_never_fetches() {
    let fetcher = Arc::new(MemoryFetcher::new().with_file("mem://part.xyz", b"1 2 3".to_vec()));
    let loader = loader_over(&fetcher);

    let err = loader
        .load(&LoadRequest::new("mem://part.xyz", "part.xyz"), &NoProgress)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        LoadError::UnsupportedFormat {
            extension: "xyz".to_string()
        }
    );
    assert!(!err.is_retryable());
    assert!(err.user_message().contains(".xyz"));
    assert_eq!(fetcher.fetch_count(), 0);
}

#[tokio::test]
async fn test_obj_with_missing_mtl_uses_default_material() {
    let fetcher = Arc::new(MemoryFetcher::new().with_file("mem://models/part.obj", CUBE_OBJ));
    let loader = loader_over(&fetcher);

    let model = loader
        .load(&LoadRequest::new("mem://models/part.obj", "part.obj"), &NoProgress)
        .await
        .unwrap();

    // OBJ plus the failed companion fetch
    assert_eq!(fetcher.fetch_count(), 2);
    assert_eq!(model.metadata().face_count, 8);
    assert_eq!(model.materials().len(), 1);
    let material = &model.materials()[0];
    assert_eq!(material.color, meshport_core::material::DEFAULT_COLOR);
    assert!(material.double_sided);
}

#[tokio::test]
async fn test_obj_with_companion_mtl() {
    let fetcher = Arc::new(
        MemoryFetcher::new()
            .with_file("mem://models/part.obj", CUBE_OBJ)
            .with_file("mem://models/part.mtl", RED_MTL),
    );
    let loader = loader_over(&fetcher);

    let model = loader
        .load(&LoadRequest::new("mem://models/part.obj", "part.obj"), &NoProgress)
        .await
        .unwrap();

    assert_eq!(model.materials().len(), 1);
    let material = &model.materials()[0];
    assert_eq!(material.color, [1.0, 0.0, 0.0]);
    assert!(matches!(material.shading, Shading::Phong { .. }));
    assert!(material.double_sided);
}

#[tokio::test]
async fn test_gltf_external_buffer_is_fetched_relative() {
    let mut buffer = Vec::new();
    for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        buffer.extend_from_slice(&v.to_le_bytes());
    }
    let document = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [{ "mesh": 0 }],
  "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
  "buffers": [{ "byteLength": 36, "uri": "mesh.bin" }],
  "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }],
  "accessors": [
    { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0] }
  ]
}"#;
    let fetcher = Arc::new(
        MemoryFetcher::new()
            .with_file("mem://models/scene.gltf", document)
            .with_file("mem://models/mesh.bin", buffer),
    );
    let loader = loader_over(&fetcher);

    let model = loader
        .load(&LoadRequest::new("mem://models/scene.gltf", "scene.gltf"), &NoProgress)
        .await
        .unwrap();

    assert_eq!(fetcher.fetch_count(), 2);
    assert_eq!(model.metadata().format, FormatTag::Gltf);
    assert_eq!(model.metadata().vertex_count, 3);
    assert_eq!(model.metadata().approx_file_size_bytes, Some(document.len() as u64 + 36));
}

#[tokio::test]
async fn test_step_placeholder_skips_fetch() {
    let fetcher = Arc::new(MemoryFetcher::new());
    let loader = loader_over(&fetcher);

    let model = loader
        .load(&LoadRequest::new("mem://housing.step", "housing.step"), &NoProgress)
        .await
        .unwrap();

    assert_eq!(fetcher.fetch_count(), 0);
    assert_eq!(model.metadata().format, FormatTag::Step);
    assert_eq!(model.metadata().vertex_count, meshport_geometry::PLACEHOLDER_VERTEX_COUNT);
    assert!(model.metadata().approximate);
    assert_eq!(model.metadata().approx_file_size_bytes, None);
    assert_eq!(model.materials().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retries_with_backoff_then_fails() {
    let (loader, calls) = failing_loader(|| ParseError::Fetch(FetchError::Network("connection refused".into())));
    let progress = RecordingProgress::new();

    let started = tokio::time::Instant::now();
    let err = loader
        .load(&LoadRequest::new("mem://a.stl", "a.stl"), &progress)
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(err.code(), "NETWORK_FAILURE");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // 2s after the first failure, 4s after the second, none after the last
    assert!(elapsed >= Duration::from_secs(6), "elapsed = {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(7), "elapsed = {:?}", elapsed);

    let retries: Vec<String> = progress
        .updates()
        .into_iter()
        .filter(|p| p.stage.starts_with("Retrying"))
        .map(|p| p.stage)
        .collect();
    assert_eq!(retries, vec!["Retrying (attempt 2 of 3)", "Retrying (attempt 3 of 3)"]);
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_decode_error_is_not_retried() {
    let (loader, calls) = failing_loader(|| {
        ParseError::Decode(meshport_core::Error::UnsupportedFormat {
            extension: "stl".into(),
        })
    });

    let err = loader
        .load(&LoadRequest::new("mem://a.stl", "a.stl"), &NoProgress)
        .await
        .unwrap_err();

    assert_eq!(err.code(), "UNSUPPORTED_FORMAT");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_when_retries_disabled() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut registry = ParserRegistry::empty();
    registry.register(Box::new(FailingParser {
        calls: calls.clone(),
        error: || ParseError::Task("panicked".into()),
    }));
    let config = LoadConfig {
        max_retries: 0,
        ..LoadConfig::default()
    };
    let loader = ModelLoader::new(Arc::new(MemoryFetcher::new()), config).with_registry(registry);

    let err = loader
        .load(&LoadRequest::new("mem://a.stl", "a.stl"), &NoProgress)
        .await
        .unwrap_err();

    assert_eq!(err.code(), "UNKNOWN");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_stl_is_classified_empty_or_corrupt() {
    let fetcher = Arc::new(MemoryFetcher::new().with_file("mem://empty.stl", "solid empty\nendsolid empty\n"));
    let loader = loader_over(&fetcher);

    let err = loader
        .load(&LoadRequest::new("mem://empty.stl", "empty.stl"), &NoProgress)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LoadError::EmptyOrCorrupt {
            format: FormatTag::Stl,
            ..
        }
    ));
    assert_eq!(fetcher.fetch_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_recovers_on_second_attempt() {
    let fetcher = Arc::new(FlakyFetcher {
        failures: 1,
        calls: AtomicU32::new(0),
        bytes: binary_stl(12),
    });
    let loader = ModelLoader::new(fetcher, LoadConfig::default());
    let progress = RecordingProgress::new();

    let model = loader
        .load(&LoadRequest::new("https://cdn.example.com/a.stl", "a.stl"), &progress)
        .await
        .unwrap();

    assert_eq!(model.metadata().attempts, 2);
    assert_eq!(model.metadata().face_count, 12);

    // Monotonic within each attempt, ending at 100
    let updates = progress.updates();
    for pair in updates.windows(2) {
        if pair[0].attempt == pair[1].attempt {
            assert!(pair[0].percent <= pair[1].percent, "{:?}", pair);
        }
    }
    assert_eq!(updates.last().map(|p| (p.percent, p.attempt)), Some((100, 2)));
}

#[tokio::test]
async fn test_progress_milestones() {
    let fetcher = Arc::new(MemoryFetcher::new().with_file("mem://a.stl", binary_stl(4)));
    let loader = loader_over(&fetcher);
    let progress = RecordingProgress::new();

    loader
        .load(&LoadRequest::new("mem://a.stl", "a.stl"), &progress)
        .await
        .unwrap();

    let percents: Vec<u8> = progress.updates().iter().map(|p| p.percent).collect();
    assert_eq!(percents, vec![10, 30, 80, 90, 100]);
}

#[tokio::test]
async fn test_wireframe_request() {
    let fetcher = Arc::new(MemoryFetcher::new().with_file("mem://a.stl", binary_stl(4)));
    let loader = loader_over(&fetcher);

    let request = LoadRequest::new("mem://a.stl", "a.stl").with_wireframe(true);
    let model = loader.load(&request, &NoProgress).await.unwrap();

    assert_eq!(model.materials().len(), 1);
    assert!(model.materials()[0].wireframe);
    assert!(model.materials()[0].is_transparent());
}

#[tokio::test]
async fn test_concurrent_loads_are_independent() {
    let fetcher = Arc::new(
        MemoryFetcher::new()
            .with_file("mem://small.stl", binary_stl(10))
            .with_file("mem://large.stl", binary_stl(500)),
    );
    let loader = loader_over(&fetcher);

    let small = LoadRequest::new("mem://small.stl", "small.stl");
    let large = LoadRequest::new("mem://large.stl", "large.stl");
    let (a, b) = tokio::join!(loader.load(&small, &NoProgress), loader.load(&large, &NoProgress));

    assert_eq!(a.unwrap().metadata().face_count, 10);
    assert_eq!(b.unwrap().metadata().face_count, 500);
}

const COLORED_PLY: &str = "\
ply
format ascii 1.0
element vertex 3
property float x
property float y
property float z
property uchar red
property uchar green
property uchar blue
element face 1
property list uchar int vertex_indices
end_header
0 0 0 255 0 0
1 0 0 0 255 0
0 1 0 0 0 255
3 0 1 2
";

#[tokio::test]
async fn test_colored_ply_load() {
    let fetcher = Arc::new(MemoryFetcher::new().with_file("mem://scan.ply", COLORED_PLY));
    let loader = loader_over(&fetcher);

    let model = loader
        .load(&LoadRequest::new("mem://scan.ply", "scan.ply"), &NoProgress)
        .await
        .unwrap();

    assert_eq!(model.metadata().format, FormatTag::Ply);
    assert_eq!(model.metadata().vertex_count, 3);
    assert_eq!(model.metadata().face_count, 1);
    assert!(model.geometry().colors.is_some());
    assert!(model.geometry().has_normals());

    assert_eq!(model.materials().len(), 1);
    let material = &model.materials()[0];
    assert!(material.vertex_colors);
    assert!(material.double_sided);
}

#[tokio::test(start_paused = true)]
async fn test_out_of_range_index_fails_load() {
    let broken = COLORED_PLY.replace("3 0 1 2", "3 0 1 99");
    let fetcher = Arc::new(MemoryFetcher::new().with_file("mem://broken.ply", broken));
    let loader = loader_over(&fetcher);

    let err = loader
        .load(&LoadRequest::new("mem://broken.ply", "broken.ply"), &NoProgress)
        .await
        .unwrap_err();

    match err {
        LoadError::ParseFailure { format, detail } => {
            assert_eq!(format, FormatTag::Ply);
            assert!(detail.contains("out of range"), "{}", detail);
        }
        other => panic!("expected a parse failure, got {:?}", other),
    }
    assert_eq!(fetcher.fetch_count(), 3);
}

#[tokio::test]
async fn test_oversized_model_is_rescaled() {
    let mut bytes = vec![0u8; 80];
    bytes.extend_from_slice(&1u32.to_le_bytes());
    for v in [0.0f32, 0.0, 1.0, 0.0, 0.0, 0.0, 1000.0, 0.0, 0.0, 0.0, 500.0, 0.0] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes.extend_from_slice(&[0, 0]);
    let fetcher = Arc::new(MemoryFetcher::new().with_file("mem://big.stl", bytes));
    let loader = loader_over(&fetcher);

    let model = loader
        .load(&LoadRequest::new("mem://big.stl", "big.stl"), &NoProgress)
        .await
        .unwrap();

    approx::assert_relative_eq!(model.analysis().max_extent(), 5.0, epsilon = 1e-4);
    let framing = model.framing();
    assert!(framing.distance() >= 3.0);
}
