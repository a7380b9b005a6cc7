use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chatreplay_core::errors::SourceError;
use chatreplay_core::live::ChunkStream;
use chatreplay_core::replay::FsTranscriptFetcher;
use chatreplay_core::{
    AbortHandle, ChatClient, ChatParams, ChatRequest, ChunkSource, DomainEvent, EventKind,
    PlaybackConfig, ReplayParams, StreamState, TranscriptFetcher,
};
use futures::StreamExt as _;
use tokio::time::Instant;

const RECORDING: &str = "eiffel-tower-vs-tallest-building";

struct Offline;

#[async_trait::async_trait]
impl ChunkSource for Offline {
    async fn open(&self, _request: &ChatRequest) -> Result<ChunkStream, SourceError> {
        Err(SourceError::Transport("offline".into()))
    }
}

#[derive(Default)]
struct MapFetcher {
    files: HashMap<String, String>,
    calls: AtomicUsize,
}

impl MapFetcher {
    fn with(path: &str, text: &str) -> Self {
        let mut files = HashMap::new();
        files.insert(path.to_string(), text.to_string());
        Self {
            files,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl TranscriptFetcher for MapFetcher {
    async fn fetch(&self, path: &str) -> Result<String, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.files.get(path).cloned().ok_or_else(|| SourceError::Fetch {
            path: path.into(),
            message: "no such transcript".into(),
        })
    }
}

fn fixtures_client() -> ChatClient {
    ChatClient::builder()
        .live_source(Arc::new(Offline))
        .transcript_fetcher(Arc::new(FsTranscriptFetcher::new(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures"
        ))))
        .build()
        .expect("client")
}

fn map_client(fetcher: Arc<MapFetcher>) -> ChatClient {
    ChatClient::builder()
        .live_source(Arc::new(Offline))
        .transcript_fetcher(fetcher)
        .build()
        .expect("client")
}

fn recording_params() -> ChatParams {
    ChatParams::default().replay(ReplayParams::recording(RECORDING))
}

async fn collect_timed(
    client: &ChatClient,
    params: ChatParams,
    playback: PlaybackConfig,
) -> (Vec<DomainEvent>, Vec<Duration>, Duration, StreamState) {
    let start = Instant::now();
    let mut chat = client.stream("ignored", params, playback);
    let mut events = Vec::new();
    let mut at = Vec::new();
    while let Some(event) = chat.next_event().await {
        at.push(start.elapsed());
        events.push(event);
    }
    (events, at, start.elapsed(), chat.state())
}

#[tokio::test(start_paused = true)]
async fn fast_forward_and_paced_replay_yield_the_same_events() {
    let client = fixtures_client();

    let (fast, _, fast_elapsed, fast_state) = collect_timed(
        &client,
        recording_params(),
        PlaybackConfig::default().fast_forward(true),
    )
    .await;
    let (paced, _, paced_elapsed, paced_state) =
        collect_timed(&client, recording_params(), PlaybackConfig::default()).await;

    assert_eq!(fast.len(), 8);
    assert_eq!(fast, paced);
    assert_eq!(fast_state, StreamState::Completed);
    assert_eq!(paced_state, StreamState::Completed);
    assert!(fast_elapsed < Duration::from_millis(50));
    assert!(paced_elapsed >= Duration::from_millis(3250));
    assert_eq!(client.cache().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn paced_replay_follows_the_recorded_rhythm() {
    let (events, at, _, _) =
        collect_timed(&fixtures_client(), recording_params(), PlaybackConfig::default()).await;

    let kinds: Vec<EventKind> = events.iter().map(DomainEvent::kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::MessageChunk,
            EventKind::MessageChunk,
            EventKind::MessageChunk,
            EventKind::ToolCalls,
            EventKind::ToolCallResult,
            EventKind::ToolCallResult,
            EventKind::MessageChunk,
            EventKind::MessageChunk,
        ]
    );
    // user message: 50 ms lead, then 500 ms settle before the next chunk's 50 ms
    assert!(at[0] >= Duration::from_millis(50));
    assert!(at[1] - at[0] >= Duration::from_millis(550));
    assert!(at[4] - at[3] >= Duration::from_millis(500));
    assert!(at[5] - at[4] >= Duration::from_millis(1300));
    assert!(at[6] - at[5] >= Duration::from_millis(850));
}

#[tokio::test(start_paused = true)]
async fn finished_message_chunk_is_not_delayed() {
    let text = "event: message_chunk\ndata: {\"id\":\"1\",\"thread_id\":\"t\",\"agent\":\"reporter\",\"role\":\"assistant\",\"content\":\"Hi\",\"finish_reason\":\"stop\"}\n\n";
    let fetcher = Arc::new(MapFetcher::with("replay/hi.txt", text));
    let (events, _, elapsed, _) = collect_timed(
        &map_client(fetcher),
        ChatParams::default().replay(ReplayParams::recording("hi")),
        PlaybackConfig::default(),
    )
    .await;

    assert_eq!(events.len(), 1);
    let DomainEvent::MessageChunk(chunk) = &events[0] else {
        panic!("expected message_chunk");
    };
    assert_eq!(chunk.content.as_deref(), Some("Hi"));
    assert!(elapsed < Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn consecutive_tool_results_are_padded() {
    let record = |id: &str| {
        format!(
            "event: tool_call_result\ndata: {{\"tool_call_id\":\"{id}\",\"content\":\"ok\"}}\n\n"
        )
    };
    let text = format!("{}{}", record("a"), record("b"));
    let fetcher = Arc::new(MapFetcher::with("replay/tools.txt", &text));
    let (events, at, elapsed, _) = collect_timed(
        &map_client(fetcher),
        ChatParams::default().replay(ReplayParams::recording("tools")),
        PlaybackConfig::default(),
    )
    .await;

    assert_eq!(events.len(), 2);
    let ids: Vec<&str> = events
        .iter()
        .map(|e| match e {
            DomainEvent::ToolCallResult(r) => r.tool_call_id.as_str(),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert!(at[0] >= Duration::from_millis(500));
    assert!(at[1] - at[0] >= Duration::from_millis(800 + 500));
    assert!(elapsed - at[1] >= Duration::from_millis(800));
}

#[tokio::test(start_paused = true)]
async fn timed_out_pull_does_not_lose_the_pending_event() {
    let text: String = (0..3)
        .map(|id| {
            format!(
                "event: message_chunk\ndata: {{\"id\":\"{id}\",\"thread_id\":\"t\",\"role\":\"assistant\",\"content\":\"x\"}}\n\n"
            )
        })
        .collect();
    let fetcher = Arc::new(MapFetcher::with("replay/three.txt", &text));
    let client = map_client(fetcher);
    let mut chat = client.stream(
        "ignored",
        ChatParams::default().replay(ReplayParams::recording("three")),
        PlaybackConfig::default(),
    );

    // gives up during the first chunk's 50 ms lead
    let first = tokio::time::timeout(Duration::from_millis(10), chat.next_event()).await;
    assert!(first.is_err());
    assert_eq!(chat.yielded(), 0);

    let mut ids = Vec::new();
    while let Some(event) = chat.next_event().await {
        let DomainEvent::MessageChunk(chunk) = event else {
            panic!("expected message_chunk");
        };
        ids.push(chunk.id);
    }
    assert_eq!(ids, vec!["0", "1", "2"]);
    assert_eq!(chat.state(), StreamState::Completed);
}

#[tokio::test]
async fn malformed_records_and_trailing_fragment_are_dropped() {
    let valid = "event: interrupt\ndata: {\"options\":[{\"text\":\"Go\",\"value\":\"accepted\"}]}\n\n";
    let text = format!(
        "event: bogus\n\n{valid}event: message_chunk\ndata: not-json\n\n{valid}event: message_chunk\ndata: {{\"id\""
    );
    let fetcher = Arc::new(MapFetcher::with("replay/mixed.txt", &text));
    let (events, _, _, state) = collect_timed(
        &map_client(fetcher),
        ChatParams::default().replay(ReplayParams::recording("mixed")),
        PlaybackConfig::default().fast_forward(true),
    )
    .await;

    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.kind() == EventKind::Interrupt));
    assert_eq!(state, StreamState::Completed);
}

#[tokio::test]
async fn transcript_is_fetched_once_per_path() {
    let fetcher = Arc::new(MapFetcher::with(
        "replay/once.txt",
        "event: tool_call_result\r\ndata: {\"tool_call_id\":\"x\"}\r\n\r\n",
    ));
    let client = map_client(fetcher.clone());
    let params = || ChatParams::default().replay(ReplayParams::recording("once"));
    let ff = || PlaybackConfig::default().fast_forward(true);

    let (first, ..) = collect_timed(&client, params(), ff()).await;
    let (second, ..) = collect_timed(&client.clone(), params(), ff()).await;
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

    let a = client.cache().get("replay/once.txt").await.expect("cached");
    let b = client.cache().get("replay/once.txt").await.expect("cached");
    assert_eq!(a, b);
    assert!(!a.contains('\r'));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_transcript_ends_stream_as_errored_and_is_retried() {
    let fetcher = Arc::new(MapFetcher::default());
    let client = map_client(fetcher.clone());
    for _ in 0..2 {
        let mut chat = client.stream(
            "ignored",
            ChatParams::default().replay(ReplayParams::recording("nope")),
            PlaybackConfig::default(),
        );
        assert!(chat.next_event().await.is_none());
        assert_eq!(chat.state(), StreamState::Errored);
        assert!(matches!(chat.error(), Some(SourceError::Fetch { .. })));
    }
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn mock_fixtures_follow_feedback_and_play_fast_forward() {
    let client = fixtures_client();

    let (first, _, elapsed, _) = collect_timed(
        &client,
        ChatParams::default().replay(ReplayParams::mock()),
        PlaybackConfig::default(),
    )
    .await;
    assert_eq!(
        first.iter().map(DomainEvent::kind).collect::<Vec<_>>(),
        vec![EventKind::MessageChunk, EventKind::Interrupt]
    );
    assert!(elapsed < Duration::from_millis(50));

    let (final_answer, _, elapsed, _) = collect_timed(
        &client,
        ChatParams::default()
            .interrupt_feedback("accepted")
            .replay(ReplayParams::mock()),
        PlaybackConfig::default(),
    )
    .await;
    assert_eq!(final_answer.len(), 3);
    assert_eq!(final_answer[1].kind(), EventKind::ToolCallResult);
    assert!(elapsed < Duration::from_millis(50));

    let (re_plan, ..) = collect_timed(
        &client,
        ChatParams::default()
            .interrupt_feedback("edit_plan")
            .replay(ReplayParams::mock()),
        PlaybackConfig::default(),
    )
    .await;
    let DomainEvent::MessageChunk(chunk) = &re_plan[0] else {
        panic!("expected planner chunk");
    };
    assert!(chunk.content.as_deref().unwrap_or_default().contains("Revised plan"));
}

#[tokio::test(start_paused = true)]
async fn abort_mid_replay_stops_within_one_step() {
    let client = fixtures_client();
    let (handle, signal) = AbortHandle::pair();
    let mut chat = client.stream(
        "ignored",
        recording_params(),
        PlaybackConfig::default().abort_signal(signal),
    );

    for _ in 0..4 {
        assert!(chat.next_event().await.is_some());
    }
    // the next event is a tool result with a 500 ms lead; abort during it
    let start = Instant::now();
    let aborter = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();
    };
    let (next, ()) = tokio::join!(chat.next_event(), aborter);
    assert!(next.is_none());
    assert!(start.elapsed() < Duration::from_millis(500));
    assert_eq!(chat.state(), StreamState::Cancelled);
    assert_eq!(chat.yielded(), 4);
    assert!(chat.next_event().await.is_none());
}

#[tokio::test]
async fn abort_before_first_pull_yields_nothing() {
    let (handle, signal) = AbortHandle::pair();
    handle.abort();
    let chat = fixtures_client().stream(
        "ignored",
        recording_params(),
        PlaybackConfig::default().abort_signal(signal),
    );
    let events: Vec<DomainEvent> = chat.into_stream().collect().await;
    assert!(events.is_empty());
}
