#[cfg(test)]
mod test {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::Barrier;

    use crate::errors::TokenError;
    use crate::parser::parser::parse_token_response;
    use crate::tests::common::{token, CacheFixture, FakeFetcher};

    const MARGIN: u64 = 300;

    async fn get_concurrently(fixture: &CacheFixture, callers: usize) -> Vec<Result<String, TokenError>> {
        let barrier = Arc::new(Barrier::new(callers));
        let handles: Vec<_> = (0..callers)
            .map(|_| {
                let cache = fixture.cache.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    cache.get_token().await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(callers);
        for handle in handles {
            results.push(handle.await.expect("caller panicked"));
        }
        results
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_on_empty_cache_share_one_fetch() {
        let fixture = CacheFixture::new(FakeFetcher::issuing(7200, Duration::from_millis(50)), 1000, MARGIN);

        let results = get_concurrently(&fixture, 32).await;

        assert_eq!(fixture.calls(), 1);
        for result in results {
            assert_eq!(result.unwrap(), "T1");
        }
    }

    #[tokio::test]
    async fn valid_token_is_served_without_fetching() {
        let fixture = CacheFixture::new(FakeFetcher::issuing(7200, Duration::ZERO), 1000, MARGIN);

        assert_eq!(fixture.cache.get_token().await.unwrap(), "T1");
        for _ in 0..10 {
            assert_eq!(fixture.cache.get_token().await.unwrap(), "T1");
        }
        assert_eq!(fixture.calls(), 1);
    }

    #[tokio::test]
    async fn expiry_honours_safety_margin() {
        let fixture = CacheFixture::new(FakeFetcher::issuing(7200, Duration::ZERO), 1000, MARGIN);

        assert_eq!(fixture.cache.get_token().await.unwrap(), "T1");
        assert_eq!(fixture.cache.current().unwrap().expires_at_unix_ts, 7900);

        fixture.clock.set(7899);
        assert_eq!(fixture.cache.get_token().await.unwrap(), "T1");
        assert_eq!(fixture.calls(), 1);

        fixture.clock.set(7901);
        assert_eq!(fixture.cache.get_token().await.unwrap(), "T2");
        assert_eq!(fixture.calls(), 2);
        assert_eq!(fixture.cache.current().unwrap().expires_at_unix_ts, 7901 + 7200 - 300);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn expired_token_is_refreshed_once_under_concurrency() {
        let fixture = CacheFixture::new(FakeFetcher::issuing(7200, Duration::from_millis(50)), 1000, MARGIN);
        assert_eq!(fixture.cache.get_token().await.unwrap(), "T1");

        fixture.clock.set(8000);
        let results = get_concurrently(&fixture, 16).await;

        assert_eq!(fixture.calls(), 2);
        for result in results {
            assert_eq!(result.unwrap(), "T2");
        }
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_token() {
        let fetcher = FakeFetcher::new(Duration::ZERO, |n| match n {
            1 => Ok(token("T1", 7200)),
            _ => Err(crate::errors::FetchError::MissingField("expires_in")),
        });
        let fixture = CacheFixture::new(fetcher, 1000, MARGIN);
        assert_eq!(fixture.cache.get_token().await.unwrap(), "T1");

        fixture.clock.set(7901);
        let err = fixture.cache.get_token().await.unwrap_err();
        assert!(matches!(err, TokenError::Fetch(_)));
        assert_eq!(fixture.calls(), 2);

        let current = fixture.cache.current().expect("token must survive failed refresh");
        assert_eq!(current.value, "T1");
        assert_eq!(current.expires_at_unix_ts, 7900);

        // a caller whose clock still sees the token as valid is served without fetching
        fixture.clock.set(7899);
        assert_eq!(fixture.cache.get_token().await.unwrap(), "T1");
        assert_eq!(fixture.calls(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn waiting_callers_retry_after_failed_fetch_one_at_a_time() {
        let fixture = CacheFixture::new(FakeFetcher::failing(Duration::from_millis(20)), 1000, MARGIN);

        let results = get_concurrently(&fixture, 8).await;

        assert!(results.iter().all(|r| r.is_err()));
        assert_eq!(fixture.calls(), 8);
        assert_eq!(fixture.max_in_flight.load(Ordering::SeqCst), 1);
        assert!(fixture.cache.current().is_none());
    }

    #[tokio::test]
    async fn non_positive_ttl_is_unusable() {
        let fetcher = FakeFetcher::new(Duration::ZERO, |n| match n {
            1 => Ok(token("T1", 0)),
            _ => Ok(token("T2", 7200)),
        });
        let fixture = CacheFixture::new(fetcher, 1000, MARGIN);

        let err = fixture.cache.get_token().await.unwrap_err();
        assert!(matches!(err, TokenError::Unusable { ttl: 0 }));
        assert!(fixture.cache.current().is_none());

        assert_eq!(fixture.cache.get_token().await.unwrap(), "T2");
        assert_eq!(fixture.calls(), 2);
    }

    #[tokio::test]
    async fn ttl_shorter_than_margin_is_kept_for_one_second() {
        let fixture = CacheFixture::new(FakeFetcher::issuing(100, Duration::ZERO), 1000, MARGIN);

        assert_eq!(fixture.cache.get_token().await.unwrap(), "T1");
        assert_eq!(fixture.cache.current().unwrap().expires_at_unix_ts, 1001);
        for _ in 0..5 {
            assert_eq!(fixture.cache.get_token().await.unwrap(), "T1");
        }
        assert_eq!(fixture.calls(), 1);

        fixture.clock.set(1001);
        assert_eq!(fixture.cache.get_token().await.unwrap(), "T2");
        assert_eq!(fixture.calls(), 2);
    }

    #[tokio::test]
    async fn huge_upstream_ttl_does_not_overflow_expiry() {
        let body = r#"{"access_token":"T1","expires_in":9223372036854775807}"#;
        let fetcher = FakeFetcher::new(Duration::ZERO, move |_| parse_token_response(body));
        let fixture = CacheFixture::new(fetcher, 1000, MARGIN);

        assert_eq!(fixture.cache.get_token().await.unwrap(), "T1");
        assert_eq!(fixture.cache.current().unwrap().expires_at_unix_ts, i64::MAX - 300);

        fixture.clock.set(4_000_000_000);
        assert_eq!(fixture.cache.get_token().await.unwrap(), "T1");
        assert_eq!(fixture.calls(), 1);
    }
}
