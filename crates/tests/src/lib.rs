//! # Integration Tests
//!
//! Cross-crate tests.
//!
//! Covers:
//! - Contract smoke checks
//! - End-to-end replay without a broker: file -> index -> scheduler -> recording sink
//! - Configuration to index wiring

#[cfg(test)]
mod contract_tests {
    use contracts::{ConfigVersion, ReplayBlueprint};

    #[test]
    fn test_default_blueprint_is_valid() {
        let blueprint = ReplayBlueprint::default();
        assert_eq!(blueprint.version, ConfigVersion::V1);
        assert!(config_loader::validate(&blueprint).is_ok());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::Sentence;
    use dispatcher::{MemorySink, SinkHandle};
    use ingestion::TimeBucketIndex;
    use replay_engine::{shutdown_channel, Pacer, ReplayScheduler, SchedulerConfig, TokioPacer};

    /// A slice of a recorded drive, interleaved with noise the extractor must skip
    const LOG: &str = "\
boot banner $GPTXT,01,01,02,ANTSTATUS=OK*3B
$GPGGA,074056.00,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47
$GNRMC,074056.40,A,4807.038,N,01131.000,E,022.4,084.4,210923,,,A[R4-Lidar]*6C
$GPGSA,A,3,04,05,,09,12,,,24,,,,,2.5,1.3,2.1*39
$PSSN,HRP,074057.00,1.2,0.3*00
$GPGGA,074058.00,4807.039,N,01131.001,E,1,08,0.9,545.4,M,46.9,M,,*4A garbage
$GPGGA,074058.50,4807.040,N,01131.002,E,1,08,0.9,545.4,M,46.9,M,,
$GNGGA,074102.00,4807.041,N[cam-front]*11
$GPGGA,074059.00,4807.042,N,01131.003,E,1,08,0.9,545.4,M,46.9,M,,*4C
";

    /// Counts pauses without sleeping
    #[derive(Default)]
    struct InstantPacer {
        pauses: u64,
    }

    impl Pacer for InstantPacer {
        async fn pause(&mut self, _duration: Duration) {
            self.pauses += 1;
            tokio::task::yield_now().await;
        }
    }

    fn config_toml(path: &std::path::Path) -> String {
        format!(
            r#"
[source]
path = "{}"

[source.interval]
start = "2023-09-21 07:40:56"
end = "2023-09-21 07:40:59"

[sink]
kind = "log"
topic_prefix = "producers/mycar/data"

[replay]
pacing_ms = 1000
max_passes = 2
"#,
            path.display()
        )
    }

    /// End-to-end: config -> file -> index -> scheduler -> MemorySink
    #[tokio::test]
    async fn test_e2e_file_to_sink() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LOG.as_bytes()).unwrap();

        let blueprint =
            ConfigLoader::load_from_str(&config_toml(file.path()), ConfigFormat::Toml).unwrap();
        let index = TimeBucketIndex::from_source(&blueprint.source).unwrap();

        assert_eq!(index.len(), 4);
        let stats = index.stats();
        assert_eq!(stats.candidates, 8);
        assert_eq!(stats.without_timestamp, 3);
        assert_eq!(stats.out_of_range, 1);
        assert_eq!(stats.indexed, 4);

        let sink = MemorySink::new("memory");
        let handle = SinkHandle::spawn(sink.clone(), 64);
        let (_trigger, signal) = shutdown_channel();
        let mut pacer = InstantPacer::default();

        let replay = ReplayScheduler::new(&index, SchedulerConfig::from_blueprint(&blueprint))
            .run(&handle, &mut pacer, signal)
            .await;
        let delivery = handle.shutdown().await;

        assert_eq!(replay.passes, 2);
        assert_eq!(pacer.pauses, 8);
        assert_eq!(delivery.published, 8);
        assert!(sink.is_closed());

        let first_pass: Vec<(String, String)> = sink
            .messages()
            .into_iter()
            .take(3)
            .map(|m| (m.channel, m.payload.to_string()))
            .collect();
        assert_eq!(
            first_pass,
            vec![
                (
                    "producers/mycar/data/track".to_string(),
                    "$GPGGA,074056.00,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47"
                        .to_string()
                ),
                (
                    "producers/mycar/data/R4-Lidar".to_string(),
                    "$GNRMC,074056.40,A,4807.038,N,01131.000,E,022.4,084.4,210923,,,A[R4-Lidar]*6C"
                        .to_string()
                ),
                (
                    "producers/mycar/data/track".to_string(),
                    "$GPGGA,074058.00,4807.039,N,01131.001,E,1,08,0.9,545.4,M,46.9,M,,*4A"
                        .to_string()
                ),
            ]
        );
    }

    /// Sink failures are counted and never stall the replay
    #[tokio::test]
    async fn test_e2e_publish_failures_do_not_stop_replay() {
        let interval = contracts::Interval::parse("2023-09-21 07:40:56", "2023-09-21 07:40:57")
            .unwrap();
        let index = TimeBucketIndex::from_text(
            "$GPGGA,074056.00[bad]*47 $GPGGA,074057.00*47",
            interval,
        );

        let sink = MemorySink::new("memory").failing_on("producers/mycar/data/bad");
        let handle = SinkHandle::spawn(sink.clone(), 8);
        let (_trigger, signal) = shutdown_channel();
        let config = SchedulerConfig {
            max_passes: Some(3),
            ..SchedulerConfig::default()
        };

        let replay = ReplayScheduler::new(&index, config)
            .run(&handle, &mut InstantPacer::default(), signal)
            .await;
        let delivery = handle.shutdown().await;

        assert_eq!(replay.passes, 3);
        assert_eq!(replay.dispatched, 6);
        assert_eq!(delivery.failed, 3);
        assert_eq!(delivery.published, 3);
        assert!(sink
            .messages()
            .iter()
            .all(|m| m.payload == Sentence::from("$GPGGA,074057.00*47")));
    }

    /// Real-time pacing: a stop request during the pause ends the run
    #[tokio::test(start_paused = true)]
    async fn test_e2e_stop_during_real_time_replay() {
        let interval = contracts::Interval::parse("2023-09-21 07:40:56", "2023-09-21 07:41:55")
            .unwrap();
        let index = TimeBucketIndex::from_text("$GPGGA,074056.00*47", interval);

        let sink = MemorySink::new("memory");
        let handle = SinkHandle::spawn(sink.clone(), 8);
        let (trigger, signal) = shutdown_channel();
        let scheduler = ReplayScheduler::new(&index, SchedulerConfig::default());
        let mut pacer = TokioPacer;

        let (replay, ()) = tokio::join!(scheduler.run(&handle, &mut pacer, signal), async {
            tokio::time::sleep(Duration::from_millis(10_500)).await;
            trigger.trigger();
        });
        handle.shutdown().await;

        assert_eq!(replay.passes, 0);
        assert_eq!(replay.buckets, 11);
        assert_eq!(replay.pacing_delays, 10);
        assert_eq!(sink.len(), 1);
    }
}
