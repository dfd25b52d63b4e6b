//! Tests for the metered provider client.

#[cfg(test)]
mod tests {
    use crate::calls::{sweep_call_log, CallLogStore, CallRecord, ProviderClient};
    use crate::clock::Clock;
    use crate::errors::{Error, MarketDataError};
    use crate::test_support::{entity, Harness};
    use chrono::Duration;
    use std::sync::atomic::Ordering;
    use std::time::Duration as StdDuration;

    fn harness(used: i32) -> Harness {
        Harness::new(&[entity("AAPL", "Technology", Some(3_000))], used, 25)
    }

    #[tokio::test]
    async fn test_denied_gate_makes_no_call_and_no_record() {
        let h = harness(25);

        let err = h.service.trigger_single("AAPL").await.unwrap_err();

        assert!(err.is_quota_denial());
        assert!(h.provider.calls().is_empty());
        assert!(h.calls.records().is_empty());
        assert_eq!(h.used(), 25);
    }

    #[tokio::test]
    async fn test_success_records_one_call_and_one_unit() {
        let h = harness(3);

        h.service.trigger_single("aapl").await.unwrap();

        assert_eq!(h.provider.calls(), vec!["AAPL"]);
        let records = h.calls.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_success());
        assert_eq!(records[0].service, "alpha_vantage");
        assert_eq!(records[0].endpoint, "TIME_SERIES_DAILY");
        assert_eq!(records[0].http_status, Some(200));
        assert_eq!(records[0].params, r#"{"symbol":"AAPL"}"#);
        assert_eq!(h.used(), 4);
    }

    #[tokio::test]
    async fn test_failed_call_still_recorded_and_charged() {
        let h = harness(3);
        h.provider.script(
            "AAPL",
            Err(MarketDataError::SymbolNotFound("AAPL".to_string())),
        );

        let err = h.service.trigger_single("AAPL").await.unwrap_err();

        assert!(matches!(err, Error::MarketData(MarketDataError::SymbolNotFound(_))));
        let records = h.calls.records();
        assert_eq!(records.len(), 1);
        assert!(!records[0].is_success());
        assert!(records[0].error.as_deref().unwrap().contains("AAPL"));
        assert_eq!(h.used(), 4);
    }

    #[tokio::test]
    async fn test_soft_limit_is_not_retried() {
        let h = harness(3);
        h.provider.script(
            "AAPL",
            Err(MarketDataError::SoftLimit {
                provider: "FAKE".to_string(),
                message: "Thank you for using Alpha Vantage!".to_string(),
            }),
        );

        let err = h.service.trigger_single("AAPL").await.unwrap_err();

        match err {
            Error::MarketData(e) => assert!(e.is_soft_limit()),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(h.provider.calls().len(), 1);
        assert_eq!(h.calls.records().len(), 1);
    }

    #[tokio::test]
    async fn test_lost_audit_row_does_not_hide_result() {
        let h = harness(0);
        h.calls.fail.store(true, Ordering::SeqCst);

        let report = h.service.trigger_single("AAPL").await.unwrap();

        assert_eq!(report.records_inserted, 40);
        assert_eq!(h.used(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_fetch_still_records_its_call() {
        let h = harness(3);
        h.provider.set_delay(StdDuration::from_secs(60));
        let client = ProviderClient::new(
            h.provider.clone(),
            h.ledger.clone(),
            h.calls.clone(),
            h.clock.clone(),
        );

        let outcome = tokio::time::timeout(StdDuration::from_secs(30), client.fetch("AAPL")).await;

        assert!(outcome.is_err());
        assert_eq!(h.used(), 4);

        // The call started before the caller gave up, so it runs to the end
        // and leaves its audit row.
        tokio::time::sleep(StdDuration::from_secs(31)).await;
        let records = h.calls.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_success());
        assert_eq!(h.used(), 4);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired_records() {
        let h = harness(0);
        let now = h.clock.now();
        for age in [45, 31, 29, 0] {
            let mut record = sample_record();
            record.created_at = now - Duration::days(age);
            h.calls.push(record);
        }

        let removed = sweep_call_log(h.calls.as_ref(), h.clock.as_ref(), 30)
            .await
            .unwrap();

        assert_eq!(removed, 2);
        assert_eq!(h.calls.recent(10).unwrap().len(), 2);
    }

    fn sample_record() -> CallRecord {
        CallRecord {
            id: uuid::Uuid::now_v7().to_string(),
            service: "alpha_vantage".to_string(),
            endpoint: "TIME_SERIES_DAILY".to_string(),
            params: "{}".to_string(),
            http_status: Some(200),
            response_snippet: None,
            error: None,
            latency_ms: 10,
            created_at: chrono::Utc::now(),
        }
    }
}
