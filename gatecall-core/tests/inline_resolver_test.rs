use echo_service::FILE_DESCRIPTOR_SET;
use gatecall_core::InlineResolver;
use gatecall_core::pool::ResolveError;
use gatecall_core::resolver::inline::{InlineResolveError, descriptor_key};
use sha2::{Digest, Sha256};
use std::sync::Arc;


#[test]
fn test_descriptor_key() {
    assert_eq!(
        descriptor_key(Some(FILE_DESCRIPTOR_SET), Some("echo-v1")).unwrap(),
        "echo-v1"
    );

    let digest = hex::encode(Sha256::digest(FILE_DESCRIPTOR_SET));
    assert_eq!(digest.len(), 64);
    assert_eq!(
        descriptor_key(Some(FILE_DESCRIPTOR_SET), None).unwrap(),
        digest
    );
    assert_eq!(
        descriptor_key(Some(FILE_DESCRIPTOR_SET), Some("")).unwrap(),
        digest
    );

    assert!(matches!(
        descriptor_key(None, None),
        Err(InlineResolveError::EmptyDescriptorId)
    ));
    assert!(matches!(
        descriptor_key(Some(&[][..]), Some("")),
        Err(InlineResolveError::EmptyDescriptorId)
    ));
}

#[test]
fn test_upload_then_resolve_by_id() {
    let resolver = InlineResolver::new();

    let (uploaded, key) = resolver
        .resolve(Some(FILE_DESCRIPTOR_SET), Some("echo-v1"), "", "/echo.EchoService/Echo")
        .unwrap();
    assert_eq!(key, "echo-v1");

    let (cached, key) = resolver
        .resolve(None, Some("echo-v1"), "EchoService", "Echo")
        .unwrap();
    assert_eq!(key, "echo-v1");

    // Same cached pool, same method
    assert_eq!(uploaded, cached);
    assert_eq!(resolver.cached_ids(), vec!["echo-v1".to_string()]);
}

#[test]
fn test_resolve_by_id_before_upload_fails() {
    let resolver = InlineResolver::new();

    let err = resolver
        .resolve(None, Some("echo-v1"), "EchoService", "Echo")
        .unwrap_err();

    assert!(matches!(err, InlineResolveError::DescriptorNotFound(id) if id == "echo-v1"));
    assert!(resolver.cached_ids().is_empty());
}

#[test]
fn test_content_digest_is_used_without_id() {
    let resolver = InlineResolver::new();

    let (_, key) = resolver
        .resolve(Some(FILE_DESCRIPTOR_SET), None, "EchoService", "Echo")
        .unwrap();

    assert_eq!(key, hex::encode(Sha256::digest(FILE_DESCRIPTOR_SET)));

    // The digest works as an id afterwards
    let (resolved, _) = resolver
        .resolve(None, Some(key.as_str()), "echo.EchoService", "Echo")
        .unwrap();
    assert_eq!(resolved.path(), "/echo.EchoService/Echo");
}

#[test]
fn test_missing_bytes_and_id() {
    let resolver = InlineResolver::new();

    let err = resolver
        .resolve(None, None, "EchoService", "Echo")
        .unwrap_err();
    assert!(matches!(err, InlineResolveError::EmptyDescriptorId));

    let err = resolver
        .resolve(Some(&[][..]), Some(""), "EchoService", "Echo")
        .unwrap_err();
    assert!(matches!(err, InlineResolveError::EmptyDescriptorId));
}

#[test]
fn test_new_bytes_overwrite_the_entry() {
    let resolver = InlineResolver::new();

    resolver
        .resolve(Some(FILE_DESCRIPTOR_SET), Some("shared"), "EchoService", "Echo")
        .unwrap();

    let old_pool = resolver.get("shared").unwrap();

    resolver
        .resolve(
            Some(protos::colliding_services().as_slice()),
            Some("shared"),
            "Farewell",
            "SayGoodbye",
        )
        .unwrap();

    // The id now refers to the new descriptor set
    let err = resolver
        .resolve(None, Some("shared"), "EchoService", "Echo")
        .unwrap_err();
    assert!(matches!(
        err,
        InlineResolveError::Resolve(ResolveError::ServiceNotFound(_))
    ));

    let (resolved, _) = resolver
        .resolve(None, Some("shared"), "alpha.v1.Greeter", "SayHello")
        .unwrap();
    assert_eq!(resolved.path(), "/alpha.v1.Greeter/SayHello");

    // Holders of the previous pool are unaffected
    assert!(old_pool.resolve("EchoService", "Echo").is_ok());
    assert_eq!(resolver.cached_ids(), vec!["shared".to_string()]);
}

#[test]
fn test_resolution_errors_are_forwarded() {
    let resolver = InlineResolver::new();

    let err = resolver
        .resolve(
            Some(protos::colliding_services().as_slice()),
            Some("greeters"),
            "Greeter",
            "SayHello",
        )
        .unwrap_err();

    match err {
        InlineResolveError::Resolve(ResolveError::AmbiguousService { candidates, .. }) => {
            assert_eq!(candidates, vec!["alpha.v1.Greeter", "beta.v1.Greeter"]);
        }
        other => panic!("Expected AmbiguousService, got {other:?}"),
    }

    // The descriptor was still cached
    assert!(resolver.get("greeters").is_some());
}

#[test]
fn test_corrupt_bytes_are_not_cached() {
    let resolver = InlineResolver::new();

    let err = resolver
        .resolve(Some(&[0xff_u8; 4][..]), Some("broken"), "EchoService", "Echo")
        .unwrap_err();

    assert!(matches!(err, InlineResolveError::Parse(_)));
    assert!(resolver.get("broken").is_none());
}

#[test]
fn test_concurrent_first_registrations_stay_consistent() {
    let resolver = Arc::new(InlineResolver::new());
    let greeters = protos::colliding_services();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let resolver = Arc::clone(&resolver);
                let greeters = &greeters;
                scope.spawn(move || {
                    // Half of the writers race with a different descriptor set under the same id
                    if i % 2 == 0 {
                        let (resolved, key) = resolver
                            .resolve(Some(FILE_DESCRIPTOR_SET), Some("race"), "EchoService", "Echo")
                            .unwrap();
                        assert_eq!(key, "race");
                        assert_eq!(resolved.path(), "/echo.EchoService/Echo");
                        assert_eq!(resolved.method.input().full_name(), "echo.EchoRequest");
                    } else {
                        let (resolved, key) = resolver
                            .resolve(Some(greeters.as_slice()), Some("race"), "Farewell", "SayGoodbye")
                            .unwrap();
                        assert_eq!(key, "race");
                        assert_eq!(resolved.path(), "/alpha.v1.Farewell/SayGoodbye");
                        assert_eq!(
                            resolved.method.input().full_name(),
                            "alpha.v1.HelloRequest"
                        );
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("resolver thread panicked");
        }
    });

    // Whichever writer came last, the cached pool is complete
    let pool = resolver.get("race").unwrap();
    let services = pool.service_names();
    assert!(
        services == vec!["echo.EchoService"]
            || (services.iter().any(|s| s == "alpha.v1.Farewell") && services.len() == 3)
    );
}
