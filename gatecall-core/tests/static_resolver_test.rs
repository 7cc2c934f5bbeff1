use echo_service::{FILE_DESCRIPTOR_SET, SERVICE_NAME};
use gatecall_core::resolver::file::{StaticResolveError, split_full_method_name};
use gatecall_core::{DescriptorSource, DirectorySource, MemorySource, StaticResolver};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};


/// Wraps a source and counts how many times it was asked for a descriptor.
#[derive(Clone)]
struct CountingSource {
    inner: MemorySource,
    fetches: Arc<AtomicUsize>,
}

impl CountingSource {
    fn new(inner: MemorySource) -> Self {
        Self {
            inner,
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl DescriptorSource for CountingSource {
    fn fetch(&self, service: &str) -> io::Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(service)
    }
}

#[test]
fn test_split_full_method_name() {
    assert_eq!(
        split_full_method_name("/echo.EchoService/Echo"),
        Some(("echo.EchoService", "Echo"))
    );

    for invalid in [
        "echo.EchoService/Echo",
        "/echo.EchoService",
        "/echo.EchoService/",
        "//Echo",
        "/echo.EchoService/Echo/Extra",
        "",
        "/",
    ] {
        assert_eq!(split_full_method_name(invalid), None, "{invalid}");
    }
}

#[test]
fn test_resolves_from_directory() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let source = DirectorySource::new(dir.path());
    std::fs::write(source.path_for(SERVICE_NAME), FILE_DESCRIPTOR_SET).unwrap();

    assert_eq!(
        source.path_for(SERVICE_NAME),
        dir.path().join("echo.EchoService.pb")
    );

    let resolver = StaticResolver::new(source);
    let resolved = resolver.resolve("/echo.EchoService/Echo").unwrap();

    assert_eq!(resolved.path(), "/echo.EchoService/Echo");
    assert_eq!(resolved.service_full_name, "echo.EchoService");
    assert_eq!(resolver.cached_len(), 1);
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let resolver = StaticResolver::new(DirectorySource::new(dir.path()));

    let err = resolver.resolve("/echo.EchoService/Echo").unwrap_err();

    match err {
        StaticResolveError::Source { service, source } => {
            assert_eq!(service, "echo.EchoService");
            assert_eq!(source.kind(), io::ErrorKind::NotFound);
            assert!(source.to_string().contains("echo.EchoService.pb"));
        }
        other => panic!("Expected Source error, got {other:?}"),
    }
}

#[test]
fn test_cache_hit_performs_no_io() {
    let source = CountingSource::new(MemorySource::new().with(SERVICE_NAME, FILE_DESCRIPTOR_SET));
    let resolver = StaticResolver::new(source.clone());

    let first = resolver.resolve("/echo.EchoService/Echo").unwrap();
    let second = resolver.resolve("/echo.EchoService/Echo").unwrap();

    assert_eq!(first, second);
    assert_eq!(source.fetches(), 1);

    // Another method of the same service is a distinct cache entry
    resolver
        .resolve("/echo.EchoService/ServerStreamingEcho")
        .unwrap();
    assert_eq!(source.fetches(), 2);
    assert_eq!(resolver.cached_len(), 2);
}

#[test]
fn test_failed_resolutions_are_not_cached() {
    let source = CountingSource::new(MemorySource::new().with(SERVICE_NAME, FILE_DESCRIPTOR_SET));
    let resolver = StaticResolver::new(source.clone());

    for _ in 0..2 {
        let err = resolver.resolve("/echo.EchoService/Ghost").unwrap_err();
        assert!(matches!(err, StaticResolveError::MethodNotFound(name) if name == "/echo.EchoService/Ghost"));
    }

    assert_eq!(source.fetches(), 2);
    assert_eq!(resolver.cached_len(), 0);
}

#[test]
fn test_invalid_names_fail_before_fetching() {
    let source = CountingSource::new(MemorySource::new().with(SERVICE_NAME, FILE_DESCRIPTOR_SET));
    let resolver = StaticResolver::new(source.clone());

    for invalid in ["echo.EchoService/Echo", "/echo.EchoService", "Echo"] {
        let err = resolver.resolve(invalid).unwrap_err();
        assert!(
            matches!(err, StaticResolveError::InvalidFullMethodName(_)),
            "{invalid}"
        );
        assert!(err.to_string().contains("Invalid full method name"));
    }

    assert_eq!(source.fetches(), 0);
}

#[test]
fn test_corrupt_descriptor_is_a_parse_error() {
    let resolver = StaticResolver::new(MemorySource::new().with(SERVICE_NAME, vec![0xff_u8; 4]));

    let err = resolver.resolve("/echo.EchoService/Echo").unwrap_err();

    assert!(matches!(err, StaticResolveError::Parse(_)));
}

#[test]
fn test_searches_every_service_of_the_file() {
    // The file named after alpha.v1.Farewell also describes both Greeters
    let resolver = StaticResolver::new(
        MemorySource::new().with("alpha.v1.Farewell", protos::colliding_services()),
    );

    let resolved = resolver.resolve("/alpha.v1.Farewell/SayGoodbye").unwrap();
    assert_eq!(resolved.service_full_name, "alpha.v1.Farewell");

    // Short names are not accepted on this path
    let err = resolver.resolve("/Farewell/SayGoodbye").unwrap_err();
    assert!(matches!(err, StaticResolveError::Source { .. }));
}
