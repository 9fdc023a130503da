use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tandem::engine::echo::{EchoLoader, EchoTranslator};
use tandem::engine::{EngineOutput, LoadRequest, ModelLoader, Translator};
use tandem::{DecodingParams, EngineError, ModelLoadError, RequestOptions, ServiceHandle, TranslateError};

fn echo_service(pool_size: usize, translator: EchoTranslator) -> (ServiceHandle, tempfile::TempDir) {
    let model_dir = tempfile::tempdir().unwrap();
    let service = ServiceHandle::create(&EchoLoader::new(translator), model_dir.path(), "cpu", 0, pool_size).unwrap();
    (service, model_dir)
}

fn words(ws: &[&str]) -> Vec<String> {
    ws.iter().map(|w| w.to_string()).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_single_item_batches_get_their_own_results() {
    let (service, _dir) = echo_service(2, EchoTranslator::new().with_latency(Duration::from_millis(30)));
    let service = Arc::new(service);

    let first = tokio::spawn({
        let service = service.clone();
        async move { service.translate_batch(vec![vec!["left", "side"]], DecodingParams::default()).await }
    });
    let second = tokio::spawn({
        let service = service.clone();
        async move { service.translate_batch(vec![vec!["right"]], DecodingParams::default()).await }
    });

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_eq!(first[0].best().unwrap().tokens, words(&["left", "side"]));
    assert_eq!(second[0].best().unwrap().tokens, words(&["right"]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_concurrent_batches_have_no_cross_talk() {
    let (service, _dir) = echo_service(3, EchoTranslator::new());
    let service = Arc::new(service);

    let handles = (0..20)
        .map(|caller| {
            let service = service.clone();
            tokio::spawn(async move {
                let batch: Vec<Vec<String>> = (0..5).map(|item| vec![format!("c{caller}"), format!("i{item}")]).collect();
                let result = service.translate_batch(batch.clone(), DecodingParams::default()).await.unwrap();
                (batch, result)
            })
        })
        .collect::<Vec<_>>();

    for handle in futures::future::join_all(handles).await {
        let (batch, result) = handle.unwrap();
        assert_eq!(result.len(), batch.len());
        for (source, translated) in batch.iter().zip(result.iter()) {
            assert_eq!(&translated.best().unwrap().tokens, source);
        }
    }
}

#[tokio::test]
async fn test_requested_hypotheses_are_an_upper_bound() {
    let (service, _dir) = echo_service(1, EchoTranslator::new());
    let params = DecodingParams { num_hypotheses: 2, ..Default::default() };

    let result = service.translate_batch(vec![vec!["a", "b"]], params).await.unwrap();

    assert_eq!(result.len(), 1);
    assert!(result[0].len() <= 2);
    assert_eq!(result[0].len(), 2);
    for hypothesis in &result[0].hypotheses {
        assert!(hypothesis.score.is_finite());
        assert!(!hypothesis.tokens.is_empty());
        assert!(hypothesis.attention.is_none());
    }
}

#[tokio::test]
async fn test_attention_presence_is_uniform_per_result() {
    let (service, _dir) = echo_service(1, EchoTranslator::new());
    let params = DecodingParams {
        num_hypotheses: 3,
        return_attention: true,
        ..Default::default()
    };

    let result = service
        .translate_batch(vec![vec!["a", "b", "c"], vec!["d"]], params)
        .await
        .unwrap();

    for translation in &result {
        let with_attention = translation.hypotheses.iter().filter(|h| h.attention.is_some()).count();
        assert!(with_attention == 0 || with_attention == translation.len());
        assert!(translation.has_attention());
    }
    let attention = result[0].best().unwrap().attention.as_ref().unwrap();
    assert_eq!(attention.len(), 3, "one row per output token");
    assert!(attention.iter().all(|row| row.len() == 3), "one column per source token");
}

#[tokio::test]
async fn test_missing_input_file_raises_io_error_without_output() {
    let (service, dir) = echo_service(1, EchoTranslator::new());
    let output = dir.path().join("out.txt");

    let err = service
        .translate_file(dir.path().join("missing.txt"), &output, 16, DecodingParams::default())
        .await
        .unwrap_err();

    assert!(matches!(err, TranslateError::Io { .. }));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_translate_file_round_trip_with_scores() {
    let (service, dir) = echo_service(2, EchoTranslator::new());
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    let lines: Vec<String> = (0..10).map(|i| format!("w{i} v{i}")).collect();
    fs::write(&input, lines.join("\n")).unwrap();

    let count = service
        .translate_file(&input, &output, 3, DecodingParams { with_scores: true, ..Default::default() })
        .await
        .unwrap();

    assert_eq!(count, 10);
    let written = fs::read_to_string(&output).unwrap();
    let bodies: Vec<&str> = written
        .lines()
        .map(|line| line.split_once(" ||| ").unwrap().1)
        .collect();
    assert_eq!(bodies, lines.iter().map(String::as_str).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_engine_error_propagates_unchanged() {
    let (service, _dir) = echo_service(1, EchoTranslator::new().with_vocabulary(["known"]));

    let err = service
        .translate_batch(vec![vec!["known"], vec!["unknown"]], DecodingParams::default())
        .await
        .unwrap_err();

    match err {
        TranslateError::Engine(engine) => assert!(engine.reason().contains("unknown")),
        other => panic!("expected engine error, got {other:?}"),
    }
    assert_eq!(service.in_flight(), 0);
}

/// Flags completion only after a slow translation finishes.
struct SlowTranslator {
    finished: Arc<AtomicBool>,
}

impl Translator for SlowTranslator {
    fn translate(&self, batch: &[Vec<String>], _options: &RequestOptions) -> Result<Vec<EngineOutput>, EngineError> {
        std::thread::sleep(Duration::from_millis(100));
        self.finished.store(true, Ordering::SeqCst);
        Ok(batch.iter().map(|_| EngineOutput::default()).collect())
    }
}

struct SlowLoader {
    finished: Arc<AtomicBool>,
    loads: AtomicUsize,
}

impl ModelLoader for SlowLoader {
    fn load(&self, _request: &LoadRequest) -> Result<Arc<dyn Translator>, ModelLoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(SlowTranslator { finished: self.finished.clone() }))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_waits_for_abandoned_file_job() {
    let (service, dir) = echo_service(1, EchoTranslator::new().with_latency(Duration::from_millis(50)));
    let service = Arc::new(service);
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    let lines: Vec<String> = (0..6).map(|i| format!("line{i}")).collect();
    fs::write(&input, lines.join("\n")).unwrap();

    let job = tokio::spawn({
        let service = service.clone();
        let (input, output) = (input.clone(), output.clone());
        async move { service.translate_file(input, output, 1, DecodingParams::default()).await }
    });
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(service.in_flight(), 1, "file job should be running");

    // The caller gives up; the blocking job keeps going without it.
    job.abort();
    assert!(job.await.unwrap_err().is_cancelled());
    assert_eq!(service.in_flight(), 1);

    let service = Arc::into_inner(service).expect("no other references remain");
    service.shutdown().await;

    let written: Vec<String> = fs::read_to_string(&output).unwrap().lines().map(str::to_string).collect();
    assert_eq!(written, lines, "shutdown returned before the file was complete");
}

#[test]
fn test_dropping_handle_blocks_until_submitted_work_completes() {
    let finished = Arc::new(AtomicBool::new(false));
    let loader = SlowLoader { finished: finished.clone(), loads: AtomicUsize::new(0) };
    let service = ServiceHandle::create(&loader, "slow", "cpu", 0, 1).unwrap();
    assert_eq!(loader.loads.load(Ordering::SeqCst), 1, "one model load per service");

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
    let dispatch = runtime.block_on(async {
        let service = &service;
        tokio::time::timeout(
            Duration::from_millis(10),
            service.translate_batch(vec![vec!["x"]], DecodingParams::default()),
        )
        .await
    });
    assert!(dispatch.is_err(), "the batch is still running when the caller gives up");

    drop(service);

    assert!(finished.load(Ordering::SeqCst), "drop returned before the batch completed");
}
