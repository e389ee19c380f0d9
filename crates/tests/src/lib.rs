//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置契约测试（文件 -> 配置 -> 数据源）
//! - 基于进程内 hub 的 e2e 同步：主设备服务应答表盘、两种模式渲染、失败路径

#[cfg(test)]
mod contract_tests {
    use chrono::NaiveDate;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{RequestPolicy, TemperatureUnits, WeatherSource};
    use sync_engine::InMemoryWeatherSource;

    const CONFIG: &str = r#"
        [primary]
        location = "98109"
        units = "imperial"

        [companion]
        request_policy = "once_per_activation"

        [[forecasts]]
        location = "98109"
        date = "2026-10-17"
        high = 20.0
        low = 11.0
        condition = 500

        [[forecasts]]
        location = "98109"
        date = "2026-10-16"
        high = 24.0
        low = 14.5
        condition = 800
    "#;

    #[test]
    fn test_wire_paths() {
        assert_eq!(contracts::UPDATE_REQUEST_PATH, "/update_req");
        assert_eq!(contracts::WEATHER_DATA_PATH, "/weather_data");
    }

    #[test]
    fn test_config_seeds_source_in_date_order() {
        let config = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        assert_eq!(config.primary.units, TemperatureUnits::Imperial);
        assert_eq!(config.companion.request_policy, RequestPolicy::OncePerActivation);

        let source = InMemoryWeatherSource::from_config(&config);
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let row = source.latest_forecast("98109", today).unwrap().unwrap();
        assert_eq!(row.date, today);
        assert_eq!(row.condition_code, 800);

        let tomorrow = today.succ_opt().unwrap();
        let row = source.latest_forecast("98109", tomorrow).unwrap().unwrap();
        assert_eq!(row.condition_code, 500);

        assert!(source
            .latest_forecast("98109", tomorrow.succ_opt().unwrap())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_config_survives_json_conversion() {
        let config = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let reloaded = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(reloaded.forecasts.len(), 2);
        assert_eq!(reloaded.primary.location, "98109");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{NaiveDate, TimeZone, Utc};
    use contracts::{
        keys, ChannelProvider, DataChannel, DataItem, DataValue, Forecast, ManualClock, RequestPolicy,
        TemperatureUnits, WEATHER_DATA_PATH,
    };
    use data_channel::{MemoryHub, MemoryHubConfig};
    use sync_engine::{InMemoryWeatherSource, PrimaryHandle, PrimaryService, SyncResponder};
    use tokio::sync::watch;
    use watchface::{
        OwmConditionCatalog, RecordingSurface, RenderState, WatchFace, WatchFaceConfig,
        WatchFaceHandle, WeatherLine,
    };

    type Listener = data_channel::MemoryChannel;

    struct Session {
        hub: MemoryHub,
        clock: Arc<ManualClock>,
        primary: PrimaryHandle<Listener>,
        face: WatchFaceHandle,
        surface: RecordingSurface,
        state: watch::Receiver<RenderState>,
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn seeded_source() -> InMemoryWeatherSource {
        let source = InMemoryWeatherSource::new();
        source.insert(
            "98109",
            Forecast {
                date: day(),
                high: 75.0,
                low: 58.0,
                condition_code: 800,
            },
        );
        source
    }

    fn start(hub: MemoryHub, source: InMemoryWeatherSource, policy: RequestPolicy) -> Session {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap(),
        ));

        let phone = hub.node("phone");
        let responder = SyncResponder::new(phone.clone(), source, "98109", TemperatureUnits::Metric)
            .with_clock(clock.clone());
        let primary = PrimaryService::spawn(responder, phone.channel());

        let surface = RecordingSurface::new();
        let face = WatchFace::spawn(
            hub.node("watch").channel(),
            OwmConditionCatalog,
            surface.clone(),
            WatchFaceConfig {
                policy,
                ..WatchFaceConfig::default()
            },
            clock.clone(),
        );
        let state = face.subscribe_state();

        Session {
            hub,
            clock,
            primary,
            face,
            surface,
            state,
        }
    }

    impl Session {
        async fn wait_until<F>(&mut self, condition: F)
        where
            F: FnMut(&RenderState) -> bool,
        {
            tokio::time::timeout(Duration::from_secs(2), self.state.wait_for(condition))
                .await
                .expect("render state not reached in time")
                .expect("watch face loop stopped");
        }

        /// Let queued deliveries and spawned publishes settle
        async fn settle(&self) {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Scenario "98109": primary row {75, 58, 800} ends up on the watch face
    #[tokio::test]
    async fn test_e2e_98109_round_trip() {
        let mut session = start(
            MemoryHub::default(),
            seeded_source(),
            RequestPolicy::OncePerInstance,
        );

        session.face.set_visible(true);
        session.wait_until(|s| s.snapshot().is_some()).await;

        let interactive = session.surface.last().unwrap();
        assert_eq!(
            interactive.weather,
            WeatherLine::Panel {
                icon: Some(contracts::WeatherIcon::Clear),
                high: "75°".into(),
                low: "58°".into(),
            }
        );

        session.face.set_ambient(true);
        session.wait_until(|s| s.ambient().is_ambient()).await;
        let ambient = session.surface.last().unwrap();
        assert_eq!(
            ambient.weather,
            WeatherLine::Summary("75° / 58° — clear sky".into())
        );
        assert_eq!(ambient.time_text, "9:30");

        let face_stats = session.face.shutdown().await;
        let primary_stats = session.primary.shutdown().await;

        // What the primary published is exactly what the companion decoded
        assert!(primary_stats.last_published.is_some());
        assert_eq!(primary_stats.last_published, face_stats.last_snapshot);
        assert_eq!(face_stats.requester.requests_published, 1);
        assert_eq!(primary_stats.published, 1);
        assert_eq!(session.hub.subscriber_count(), 0);
    }

    /// Scenario: no rows -> nothing published, nothing rendered
    #[tokio::test]
    async fn test_e2e_no_rows() {
        let mut session = start(
            MemoryHub::default(),
            InMemoryWeatherSource::new(),
            RequestPolicy::OncePerInstance,
        );

        session.face.set_visible(true);
        session.wait_until(|s| s.visibility().is_visible()).await;
        session.settle().await;

        assert!(session.hub.item(WEATHER_DATA_PATH).is_none());

        session.face.set_ambient(true);
        session.wait_until(|s| s.ambient().is_ambient()).await;
        assert!(session.face.state().snapshot().is_none());
        assert_eq!(session.surface.last().unwrap().weather, WeatherLine::Omitted);

        let face_stats = session.face.shutdown().await;
        let primary_stats = session.primary.shutdown().await;
        assert_eq!(face_stats.requester.requests_published, 1);
        assert_eq!(primary_stats.no_data, 1);
        assert_eq!(primary_stats.published, 0);
    }

    /// A malformed weather change is dropped and the prior snapshot stays
    #[tokio::test]
    async fn test_e2e_malformed_payload_keeps_prior_snapshot() {
        let mut session = start(
            MemoryHub::default(),
            seeded_source(),
            RequestPolicy::OncePerInstance,
        );

        session.face.set_visible(true);
        session.wait_until(|s| s.snapshot().is_some()).await;

        let rogue = session.hub.node("rogue").channel();
        rogue.connect().await.unwrap();
        let partial = DataItem::new(WEATHER_DATA_PATH)
            .with(keys::HIGH_TEMP, DataValue::String("99°".into()))
            .with(keys::WEATHER_CONDITION, DataValue::Int(500));
        rogue.publish(partial, true).await;
        session.settle().await;

        let state = session.face.state();
        assert_eq!(state.snapshot().unwrap().high_temp(), "75°");

        let face_stats = session.face.shutdown().await;
        session.primary.shutdown().await;
        assert_eq!(face_stats.requester.payloads_dropped, 1);
        assert_eq!(face_stats.snapshots, 1);
    }

    /// Hide/show cycles: one request per lifetime by default, one per
    /// activation when configured
    #[tokio::test]
    async fn test_e2e_request_policies() {
        for (policy, expected) in [
            (RequestPolicy::OncePerInstance, 1),
            (RequestPolicy::OncePerActivation, 2),
        ] {
            let mut session = start(MemoryHub::default(), seeded_source(), policy);

            session.face.set_visible(true);
            session.wait_until(|s| s.snapshot().is_some()).await;
            session.settle().await;

            session.face.set_visible(false);
            session.wait_until(|s| !s.visibility().is_visible()).await;
            session.clock.advance(chrono::Duration::seconds(5));

            session.face.set_visible(true);
            session.wait_until(|s| s.visibility().is_visible()).await;
            session.settle().await;

            let face_stats = session.face.shutdown().await;
            session.primary.shutdown().await;
            assert_eq!(
                face_stats.requester.requests_published, expected,
                "policy {policy:?}"
            );
            assert_eq!(face_stats.requester.activations, 2);
        }
    }

    /// Companion cannot connect: no request, face still renders without data
    #[tokio::test]
    async fn test_e2e_unreachable_companion() {
        let hub = MemoryHub::new(MemoryHubConfig {
            unreachable_nodes: vec!["watch".to_string()],
            ..MemoryHubConfig::default()
        });
        let mut session = start(hub, seeded_source(), RequestPolicy::OncePerInstance);

        session.face.set_visible(true);
        session.wait_until(|s| s.visibility().is_visible()).await;
        session.settle().await;

        assert_eq!(session.surface.last().unwrap().weather, WeatherLine::Placeholder);

        let face_stats = session.face.shutdown().await;
        let primary_stats = session.primary.shutdown().await;
        assert_eq!(face_stats.requester.connection_failures, 1);
        assert_eq!(face_stats.requester.requests_published, 0);
        assert_eq!(primary_stats.signals, 0);
    }

    /// Delivery latency on the hub still ends in exactly one snapshot
    #[tokio::test]
    async fn test_e2e_with_channel_latency() {
        let hub = MemoryHub::new(MemoryHubConfig {
            connect_latency: Duration::from_millis(20),
            delivery_latency: Duration::from_millis(30),
            ..MemoryHubConfig::default()
        });
        let mut session = start(hub, seeded_source(), RequestPolicy::OncePerInstance);

        session.face.set_visible(true);
        session.wait_until(|s| s.snapshot().is_some()).await;

        let face_stats = session.face.shutdown().await;
        session.primary.shutdown().await;
        assert_eq!(face_stats.snapshots, 1);
        assert_eq!(
            face_stats.last_snapshot.as_ref().map(|s| s.low_temp()),
            Some("58°")
        );
    }
}
