use async_trait::async_trait;
use pmolastfm::envelope::Payload;
use pmolastfm::models::Tag;
use pmolastfm::{
    ApiError, CacheProvider, CachedOutcome, CallIdentity, Dispatcher, LastFmClient, LastFmError,
    Params, RecentTracks, TopTags, Transport, TransportResponse, User,
};
use reqwest::header::HeaderMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

const ALICE_RECENT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<lfm status="ok">
  <recenttracks user="alice" page="1" perPage="10" totalPages="1" total="3">
    <track nowplaying="true">
      <artist><name>Portishead</name></artist>
      <loved>0</loved>
      <name>Roads</name>
      <album mbid="">Dummy</album>
    </track>
    <track>
      <artist><name>Massive Attack</name></artist>
      <loved>1</loved>
      <name>Teardrop</name>
      <album mbid="">Mezzanine</album>
      <date uts="1700000000">14 Nov 2023, 22:13</date>
    </track>
    <track>
      <artist><name>Tricky</name></artist>
      <loved>0</loved>
      <name>Overcome</name>
      <album mbid="">Maxinquaye</album>
      <date uts="1699990000">14 Nov 2023, 19:26</date>
    </track>
  </recenttracks>
</lfm>"#;

const INVALID_USER: &str = r#"<lfm status="failed"><error code="6">
No user with that name was found
</error></lfm>"#;

const ERROR_AND_RESULT: &str = r#"<lfm status="failed">
  <error code="8">Operation failed</error>
  <user><name>alice</name></user>
</lfm>"#;

const BAD_REGISTRATION: &str = r#"<lfm status="ok">
  <user><name>alice</name><registered unixtime="yesterday">yesterday</registered></user>
</lfm>"#;

enum Reply {
    Body(&'static str),
    Status(u16),
}

/// Transport simulé qui compte ses appels
struct MockTransport {
    reply: Reply,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, Params)>>,
}

impl MockTransport {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn invoke(&self, method: &str, params: &Params) -> pmolastfm::Result<TransportResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((method.to_string(), params.clone()));

        match &self.reply {
            Reply::Body(body) => Ok(TransportResponse::new(body.as_bytes(), HeaderMap::new())),
            Reply::Status(status) => Err(LastFmError::from_status_code(*status, "")),
        }
    }
}

/// Cache simulé qui signale chaque écriture
#[derive(Default)]
struct MockCache {
    entries: Mutex<HashMap<CallIdentity, CachedOutcome>>,
    stored: Mutex<Vec<(CallIdentity, CachedOutcome)>>,
    store_signal: Notify,
    fail_lookup: bool,
    fail_store: bool,
}

impl MockCache {
    fn with_entry(identity: CallIdentity, outcome: CachedOutcome) -> Arc<Self> {
        let cache = Self::default();
        cache.entries.lock().unwrap().insert(identity, outcome);
        Arc::new(cache)
    }

    async fn wait_for_store(&self) {
        tokio::time::timeout(Duration::from_secs(2), self.store_signal.notified())
            .await
            .expect("store was never called");
    }

    fn stored(&self) -> Vec<(CallIdentity, CachedOutcome)> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl CacheProvider for MockCache {
    async fn lookup(&self, identity: &CallIdentity) -> pmolastfm::Result<Option<CachedOutcome>> {
        if self.fail_lookup {
            return Err(LastFmError::Cache("lookup unavailable".to_string()));
        }
        Ok(self.entries.lock().unwrap().get(identity).cloned())
    }

    async fn store(
        &self,
        identity: &CallIdentity,
        outcome: CachedOutcome,
        _headers: &HeaderMap,
    ) -> pmolastfm::Result<()> {
        self.stored
            .lock()
            .unwrap()
            .push((identity.clone(), outcome.clone()));
        self.store_signal.notify_one();

        if self.fail_store {
            return Err(LastFmError::Cache("disk full".to_string()));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(identity.clone(), outcome);
        Ok(())
    }
}

fn alice_params() -> Params {
    Params::from([
        ("user".to_string(), "alice".to_string()),
        ("limit".to_string(), "10".to_string()),
    ])
}

fn cher_tags() -> TopTags {
    TopTags {
        artist: "Cher".to_string(),
        tags: vec![Tag {
            name: "pop".to_string(),
            count: 100,
            url: "https://www.last.fm/tag/pop".to_string(),
        }],
        ..Default::default()
    }
}

async fn assert_nothing_stored(cache: &MockCache) {
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(cache.stored().is_empty());
}

#[tokio::test]
async fn cached_payload_skips_transport() -> anyhow::Result<()> {
    let identity = CallIdentity::from_pairs("artist.getTopTags", [("artist", "Cher")]);
    let cache = MockCache::with_entry(identity, CachedOutcome::Payload(Payload::TopTags(cher_tags())));
    let transport = MockTransport::new(Reply::Status(500));
    let dispatcher = Dispatcher::new(transport.clone(), cache.clone());

    let params = Params::from([("artist".to_string(), "Cher".to_string())]);
    let tags: TopTags = dispatcher.query("artist.getTopTags", params).await?;

    assert_eq!(tags, cher_tags());
    assert_eq!(transport.calls(), 0);
    assert_nothing_stored(&cache).await;
    Ok(())
}

#[tokio::test]
async fn cached_error_skips_transport() -> anyhow::Result<()> {
    let identity = CallIdentity::new("user.getRecentTracks", alice_params());
    let error = ApiError::new(6, "No user with that name was found");
    let cache = MockCache::with_entry(identity, CachedOutcome::Error(error.clone()));
    let transport = MockTransport::new(Reply::Body(ALICE_RECENT));
    let dispatcher = Dispatcher::new(transport.clone(), cache);

    let result = dispatcher
        .query::<RecentTracks>("user.getRecentTracks", alice_params())
        .await;

    match result {
        Err(LastFmError::Api(e)) => assert_eq!(e, error),
        other => panic!("expected cached service error, got {:?}", other),
    }
    assert_eq!(transport.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn cached_payload_of_another_kind_is_a_miss() -> anyhow::Result<()> {
    let identity = CallIdentity::new("user.getRecentTracks", alice_params());
    let cache = MockCache::with_entry(identity, CachedOutcome::Payload(Payload::TopTags(cher_tags())));
    let transport = MockTransport::new(Reply::Body(ALICE_RECENT));
    let dispatcher = Dispatcher::new(transport.clone(), cache);

    let recent: RecentTracks = dispatcher
        .query("user.getRecentTracks", alice_params())
        .await?;

    assert_eq!(recent.tracks.len(), 3);
    assert_eq!(transport.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn recent_tracks_are_normalized_and_stored() -> anyhow::Result<()> {
    let cache = Arc::new(MockCache::default());
    let transport = MockTransport::new(Reply::Body(ALICE_RECENT));
    let dispatcher = Dispatcher::new(transport.clone(), cache.clone());

    let recent: RecentTracks = dispatcher
        .query("user.getRecentTracks", alice_params())
        .await?;

    assert_eq!(recent.total, 3);
    assert_eq!(recent.tracks.len(), 3);
    assert_eq!(recent.now_playing_index(), Some(0));
    let playing = recent.now_playing().expect("now playing");
    assert!(std::ptr::eq(playing, &recent.tracks[0]));
    assert_eq!(playing.name, "Roads");
    assert!(playing.played_at.is_none());
    assert_eq!(recent.scrobbles().count(), 2);
    assert_eq!(
        recent.tracks[1].played_at.map(|d| d.timestamp()),
        Some(1_700_000_000)
    );

    let seen = transport.seen.lock().unwrap().clone();
    assert_eq!(seen, vec![("user.getRecentTracks".to_string(), alice_params())]);

    cache.wait_for_store().await;
    let stored = cache.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored[0].0,
        CallIdentity::new("user.getRecentTracks", alice_params())
    );
    assert_eq!(
        stored[0].1,
        CachedOutcome::Payload(Payload::RecentTracks(recent.clone()))
    );

    // Le second appel est servi par le cache
    let again: RecentTracks = dispatcher
        .query("user.getRecentTracks", alice_params())
        .await?;
    assert_eq!(again, recent);
    assert_eq!(transport.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn service_error_is_returned_and_stored() -> anyhow::Result<()> {
    let cache = Arc::new(MockCache::default());
    let transport = MockTransport::new(Reply::Body(INVALID_USER));
    let dispatcher = Dispatcher::new(transport, cache.clone());

    let params = Params::from([("user".to_string(), "ghost".to_string())]);
    let err = dispatcher
        .query::<User>("user.getInfo", params.clone())
        .await
        .unwrap_err();

    let api = err.as_api_error().expect("service error");
    assert_eq!(api.code, ApiError::INVALID_PARAMETERS);
    assert_eq!(api.message, "No user with that name was found");

    cache.wait_for_store().await;
    assert_eq!(
        cache.stored(),
        vec![(
            CallIdentity::new("user.getInfo", params),
            CachedOutcome::Error(api.clone())
        )]
    );
    Ok(())
}

#[tokio::test]
async fn service_error_takes_precedence_over_result() -> anyhow::Result<()> {
    let cache = Arc::new(MockCache::default());
    let transport = MockTransport::new(Reply::Body(ERROR_AND_RESULT));
    let dispatcher = Dispatcher::new(transport, cache.clone());

    let params = Params::from([("user".to_string(), "alice".to_string())]);
    let err = dispatcher
        .query::<User>("user.getInfo", params)
        .await
        .unwrap_err();

    assert!(matches!(err, LastFmError::Api(ref e) if e.code == ApiError::OPERATION_FAILED));
    cache.wait_for_store().await;
    assert!(matches!(cache.stored()[0].1, CachedOutcome::Error(_)));
    Ok(())
}

#[tokio::test]
async fn transport_failure_is_not_stored() -> anyhow::Result<()> {
    let cache = Arc::new(MockCache::default());
    let transport = MockTransport::new(Reply::Status(503));
    let dispatcher = Dispatcher::new(transport, cache.clone());

    let err = dispatcher
        .query::<RecentTracks>("user.getRecentTracks", alice_params())
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert!(matches!(err, LastFmError::Status { status: 503, .. }));
    assert_nothing_stored(&cache).await;
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_not_stored() -> anyhow::Result<()> {
    let cache = Arc::new(MockCache::default());
    let transport = MockTransport::new(Reply::Body("<html>Bad gateway</html"));
    let dispatcher = Dispatcher::new(transport, cache.clone());

    let result = dispatcher
        .query::<RecentTracks>("user.getRecentTracks", alice_params())
        .await;

    assert!(matches!(
        result,
        Err(LastFmError::XmlParse(_)) | Err(LastFmError::Envelope(_))
    ));
    assert_nothing_stored(&cache).await;
    Ok(())
}

#[tokio::test]
async fn normalization_failure_is_not_stored() -> anyhow::Result<()> {
    let cache = Arc::new(MockCache::default());
    let transport = MockTransport::new(Reply::Body(BAD_REGISTRATION));
    let dispatcher = Dispatcher::new(transport, cache.clone());

    let params = Params::from([("user".to_string(), "alice".to_string())]);
    let result = dispatcher.query::<User>("user.getInfo", params).await;

    assert!(matches!(result, Err(LastFmError::Normalize(_))));
    assert_nothing_stored(&cache).await;
    Ok(())
}

#[tokio::test]
async fn lookup_failure_falls_back_to_transport() -> anyhow::Result<()> {
    let cache = Arc::new(MockCache {
        fail_lookup: true,
        ..Default::default()
    });
    let transport = MockTransport::new(Reply::Body(ALICE_RECENT));
    let dispatcher = Dispatcher::new(transport.clone(), cache.clone());

    let recent: RecentTracks = dispatcher
        .query("user.getRecentTracks", alice_params())
        .await?;

    assert_eq!(recent.tracks.len(), 3);
    assert_eq!(transport.calls(), 1);
    cache.wait_for_store().await;
    Ok(())
}

#[tokio::test]
async fn store_failure_is_not_reported() -> anyhow::Result<()> {
    let cache = Arc::new(MockCache {
        fail_store: true,
        ..Default::default()
    });
    let transport = MockTransport::new(Reply::Body(ALICE_RECENT));
    let dispatcher = Dispatcher::new(transport, cache.clone());

    let recent: RecentTracks = dispatcher
        .query("user.getRecentTracks", alice_params())
        .await?;

    assert!(recent.now_playing().is_some());
    cache.wait_for_store().await;
    assert!(cache.entries.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn concurrent_identical_calls_both_succeed() -> anyhow::Result<()> {
    let cache = Arc::new(MockCache::default());
    let transport = MockTransport::new(Reply::Body(ALICE_RECENT));
    let dispatcher = Dispatcher::new(transport.clone(), cache);

    let (first, second) = tokio::join!(
        dispatcher.query::<RecentTracks>("user.getRecentTracks", alice_params()),
        dispatcher.query::<RecentTracks>("user.getRecentTracks", alice_params()),
    );

    assert_eq!(first?, second?);
    assert!((1..=2).contains(&transport.calls()));
    Ok(())
}

#[tokio::test]
async fn client_builds_recent_tracks_params() -> anyhow::Result<()> {
    let transport = MockTransport::new(Reply::Body(ALICE_RECENT));
    let client = LastFmClient::with_providers(transport.clone(), Arc::new(MockCache::default()));

    let recent = client.get_recent_tracks("alice", 10).await?;
    assert_eq!(recent.user, "alice");

    let seen = transport.seen.lock().unwrap().clone();
    let (method, params) = &seen[0];
    assert_eq!(method, "user.getRecentTracks");
    assert_eq!(params.get("user").map(String::as_str), Some("alice"));
    assert_eq!(params.get("limit").map(String::as_str), Some("10"));
    assert_eq!(params.get("extended").map(String::as_str), Some("1"));
    Ok(())
}
