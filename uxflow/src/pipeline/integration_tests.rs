//! End-to-end tests for pipeline runs.

#[cfg(test)]
mod tests {
    use crate::config::PipelineConfig;
    use crate::core::{PipelineStage, EVALUATION_ARTIFACT, RUN_ARTIFACT};
    use crate::errors::{ModelError, UxflowError};
    use crate::events::{CollectingEventSink, EventKind, ProgressNotifier};
    use crate::model::GenerativeModel;
    use crate::pipeline::{PipelineOrchestrator, PipelineService, StageInvoker};
    use crate::store::{FileResultStore, MemoryResultStore, ResultStore};
    use crate::testing::{assert_failed_at, assert_progress_steps, fixtures, ScriptedModel};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn build(
        model: Arc<dyn GenerativeModel>,
        config: &PipelineConfig,
    ) -> (PipelineOrchestrator, Arc<MemoryResultStore>) {
        let store = Arc::new(MemoryResultStore::new());
        let orchestrator = PipelineOrchestrator::from_config(
            model,
            Arc::clone(&store) as Arc<dyn ResultStore>,
            config,
        );
        (orchestrator, store)
    }

    #[tokio::test]
    async fn test_malformed_then_valid_retries_once() {
        let model = Arc::new(ScriptedModel::from_texts([
            "I could not see the image clearly.",
            fixtures::VISION_JSON,
            fixtures::HEURISTICS_JSON,
            fixtures::FEEDBACK_JSON,
            fixtures::WIREFRAME_HTML,
        ]));
        let (orchestrator, _) = build(model.clone(), &PipelineConfig::default());

        let outcome = orchestrator
            .run(&fixtures::screenshot(), None)
            .await
            .unwrap();

        assert_eq!(model.call_count(), 5);
        assert_eq!(outcome.run.attempts[&PipelineStage::Vision], 2);
        assert_eq!(outcome.run.attempts[&PipelineStage::Heuristics], 1);
        // The retry resends the same request, image included.
        let requests = model.requests();
        assert_eq!(requests[0], requests[1]);
    }

    #[tokio::test]
    async fn test_always_malformed_exhausts_attempts() {
        let model = Arc::new(ScriptedModel::always(Ok("no json here".to_string())));
        let config = PipelineConfig::default().with_max_attempts(3);
        let (orchestrator, store) = build(model.clone(), &config);

        let err = assert_failed_at(
            orchestrator.run(&fixtures::screenshot(), None).await,
            PipelineStage::Vision,
            "StageOutputInvalid",
        );

        assert_eq!(model.call_count(), 3);
        let dict = err.to_dict();
        assert_eq!(dict["attempts"], 3);
        assert_eq!(dict["raw_output"], "no json here");
        assert!(store.list(err.run_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_is_not_retried() {
        let model = Arc::new(ScriptedModel::new());
        model.push_error(ModelError::Status {
            status: 503,
            body: "overloaded".to_string(),
        });
        let (orchestrator, _) = build(model.clone(), &PipelineConfig::default());

        assert_failed_at(
            orchestrator.run(&fixtures::screenshot(), None).await,
            PipelineStage::Vision,
            "ModelCallFailed",
        );
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_wireframe_failure_returns_no_artifacts() {
        let model = Arc::new(ScriptedModel::from_texts([
            fixtures::VISION_JSON,
            fixtures::HEURISTICS_JSON,
            fixtures::FEEDBACK_JSON,
        ]));
        model.push_error(ModelError::Connection("https://example.invalid".to_string()));
        let (orchestrator, store) = build(model.clone(), &PipelineConfig::default());

        let err = assert_failed_at(
            orchestrator.run(&fixtures::screenshot(), None).await,
            PipelineStage::Wireframe,
            "ModelCallFailed",
        );

        let stored = store.list(err.run_id).await.unwrap();
        assert!(stored.contains(&EVALUATION_ARTIFACT.to_string()));
        assert!(!stored.contains(&RUN_ARTIFACT.to_string()));
        assert!(!stored.contains(&"wireframe.html".to_string()));
    }

    #[tokio::test]
    async fn test_empty_wireframe_is_invalid() {
        let model = Arc::new(ScriptedModel::from_texts([
            fixtures::VISION_JSON,
            fixtures::HEURISTICS_JSON,
            fixtures::FEEDBACK_JSON,
            "",
            "```html\n```",
        ]));
        let (orchestrator, _) = build(model.clone(), &PipelineConfig::default());

        assert_failed_at(
            orchestrator.run(&fixtures::screenshot(), None).await,
            PipelineStage::Wireframe,
            "StageOutputInvalid",
        );
        assert_eq!(model.call_count(), 5);
    }

    #[tokio::test]
    async fn test_progress_steps_in_order() {
        let notifier = Arc::new(ProgressNotifier::new());
        let (orchestrator, _) = build(
            Arc::new(fixtures::happy_path_model()),
            &PipelineConfig::default(),
        );
        let orchestrator = orchestrator.with_progress(notifier.clone());

        let mut subscription = notifier.register("client-1");
        orchestrator
            .run(&fixtures::screenshot(), Some("client-1"))
            .await
            .unwrap();

        assert_progress_steps(&mut subscription, &[1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_progress_stops_at_failed_stage() {
        let notifier = Arc::new(ProgressNotifier::new());
        let model = Arc::new(ScriptedModel::from_texts([fixtures::VISION_JSON]));
        model.push_error(ModelError::Timeout(120));
        let (orchestrator, _) = build(model, &PipelineConfig::default());
        let orchestrator = orchestrator.with_progress(notifier.clone());

        let mut subscription = notifier.register("client-1");
        let _ = orchestrator
            .run(&fixtures::screenshot(), Some("client-1"))
            .await;

        assert_progress_steps(&mut subscription, &[1]);
    }

    #[tokio::test]
    async fn test_unknown_client_does_not_affect_run() {
        let notifier = Arc::new(ProgressNotifier::new());
        let (orchestrator, _) = build(
            Arc::new(fixtures::happy_path_model()),
            &PipelineConfig::default(),
        );
        let orchestrator = orchestrator.with_progress(notifier.clone());

        let outcome = orchestrator
            .run(&fixtures::screenshot(), Some("nobody"))
            .await;

        assert!(outcome.is_ok());
        assert_eq!(notifier.client_count(), 0);
    }

    #[tokio::test]
    async fn test_client_disconnect_mid_run() {
        let notifier = Arc::new(ProgressNotifier::new());
        let model = Arc::new(fixtures::happy_path_model().with_delay(Duration::from_millis(5)));
        let (orchestrator, _) = build(model, &PipelineConfig::default());
        let orchestrator = Arc::new(orchestrator.with_progress(notifier.clone()));

        let mut subscription = notifier.register("client-1");
        let handle = orchestrator.spawn(fixtures::screenshot(), Some("client-1".to_string()));

        let first = subscription.recv().await.unwrap();
        assert_eq!(first.step, 1);
        drop(subscription);

        assert!(handle.await.unwrap().is_ok());
        assert!(!notifier.is_registered("client-1"));
    }

    #[tokio::test]
    async fn test_concurrent_runs_are_isolated() {
        let notifier = Arc::new(ProgressNotifier::new());
        let events = Arc::new(CollectingEventSink::new());
        let model = Arc::new(fixtures::routed_model().with_delay(Duration::from_millis(2)));
        let store = Arc::new(MemoryResultStore::new());
        let orchestrator = Arc::new(
            PipelineOrchestrator::new(StageInvoker::new(
                model.clone(),
                Arc::clone(&store) as Arc<dyn ResultStore>,
            ))
            .with_progress(notifier.clone())
            .with_events(events.clone()),
        );

        let clients: Vec<String> = (0..8).map(|i| format!("client-{i}")).collect();
        let mut subscriptions: Vec<_> = clients.iter().map(|c| notifier.register(c)).collect();

        let handles: Vec<_> = clients
            .iter()
            .map(|c| orchestrator.spawn(fixtures::screenshot(), Some(c.clone())))
            .collect();

        let mut run_ids = Vec::new();
        for handle in handles {
            run_ids.push(handle.await.unwrap().unwrap().run_id());
        }
        run_ids.sort();
        run_ids.dedup();
        assert_eq!(run_ids.len(), clients.len());

        for subscription in &mut subscriptions {
            assert_progress_steps(subscription, &[1, 2, 3, 4]);
        }
        for run_id in run_ids {
            assert_eq!(store.list(run_id).await.unwrap().len(), 7);
        }
        assert_eq!(model.call_count(), 32);
        assert_eq!(
            events.events_of_kind(EventKind::PipelineCompleted).len(),
            clients.len()
        );
    }

    #[tokio::test]
    async fn test_two_phase_flow_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::default().with_output_dir(dir.path());

        let first = PipelineService::from_config(
            Arc::new(ScriptedModel::from_texts([
                fixtures::VISION_JSON,
                fixtures::HEURISTICS_JSON,
                fixtures::FEEDBACK_JSON,
            ])),
            Arc::new(FileResultStore::new(&config.output_dir)),
            &config,
        );
        let (run_id, report) = first.evaluate(&fixtures::screenshot(), None).await.unwrap();
        assert_eq!(report.total_issues(), 1);

        // A fresh service over the same directory knows nothing in memory.
        let model = Arc::new(ScriptedModel::from_texts([fixtures::WIREFRAME_HTML]));
        let second = PipelineService::from_config(
            model.clone(),
            Arc::new(FileResultStore::new(&config.output_dir)),
            &config,
        );

        let wireframe = second
            .generate_wireframe(&run_id.to_string(), None)
            .await
            .unwrap();
        assert!(wireframe.html().contains("mobile-frame"));
        assert_eq!(model.call_count(), 1);

        let run_json = dir
            .path()
            .join(run_id.to_string())
            .join(RUN_ARTIFACT);
        assert!(run_json.exists());

        let record = second.run_record(&run_id.to_string()).await.unwrap();
        assert_eq!(record.total_attempts(), 4);
        assert_eq!(record.feedback, report);
    }

    #[tokio::test]
    async fn test_wireframe_for_unknown_run() {
        let service = PipelineService::from_config(
            Arc::new(ScriptedModel::new()),
            Arc::new(MemoryResultStore::new()),
            &PipelineConfig::default(),
        );

        let err = service
            .generate_wireframe(&uuid::Uuid::new_v4().to_string(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, UxflowError::RunNotFound(_)));
    }
}
