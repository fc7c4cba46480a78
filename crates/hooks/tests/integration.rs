//! Integration tests for the hook registry and pipeline

#[cfg(test)]
mod tests {
    use stagehook_config::Config;
    use stagehook_errors::{Error, HookError};
    use stagehook_events::{AppEvent, HookEvent};
    use stagehook_hooks::*;
    use stagehook_types::Stage;
    use std::sync::{Arc, Mutex};

    type Journal = Arc<Mutex<Vec<String>>>;

    fn action(journal: &Journal, name: &'static str, fail: bool) -> Arc<dyn Action> {
        let journal = Arc::clone(journal);
        Arc::new(FnAction::new(name, move || {
            journal.lock().unwrap().push(name.to_string());
            if fail {
                Err(HookError::ActionFailed {
                    action: name.to_string(),
                    message: "exited with 1".to_string(),
                }
                .into())
            } else {
                Ok(())
            }
        }))
    }

    fn entries(journal: &Journal) -> Vec<String> {
        journal.lock().unwrap().clone()
    }

    #[test]
    fn test_upload_firmware_aborts_before_main() {
        let journal = Journal::default();
        let mut registry = HookRegistry::new();
        registry.register(Stage::UploadFirmware, action(&journal, "a", false));
        registry.register(Stage::UploadFirmware, action(&journal, "b", true));

        let mut pipeline = Pipeline::new(&registry)
            .with_main(Stage::UploadFirmware, action(&journal, "upload", false));
        let err = pipeline.run_stage(Stage::UploadFirmware).unwrap_err();

        assert_eq!(entries(&journal), ["a", "b"]);
        assert!(matches!(
            err,
            Error::StageAborted { position: 2, ref action, .. } if action == "b"
        ));
        assert_eq!(pipeline.state(), StageState::Aborted(Stage::UploadFirmware));
    }

    #[test]
    fn test_no_pre_actions_runs_main_immediately() {
        let journal = Journal::default();
        let registry = HookRegistry::new();

        let mut pipeline = Pipeline::new(&registry).with_main(
            Stage::AssembleFilesystemImage,
            action(&journal, "buildfs", false),
        );
        let report = pipeline.run_stage(Stage::AssembleFilesystemImage).unwrap();

        assert_eq!(report.pre_actions, 0);
        assert!(report.ran_main);
        assert_eq!(entries(&journal), ["buildfs"]);
        assert_eq!(
            pipeline.state(),
            StageState::Completed(Stage::AssembleFilesystemImage)
        );
    }

    #[test]
    fn test_duplicate_registration_runs_twice_in_order() {
        let journal = Journal::default();
        let bundle = action(&journal, "bundle", false);
        let mut registry = HookRegistry::new();
        registry.register(Stage::UploadFilesystemImage, Arc::clone(&bundle));
        registry.register(
            Stage::UploadFilesystemImage,
            action(&journal, "between", false),
        );
        registry.register(Stage::UploadFilesystemImage, bundle);

        let ran = registry
            .run_pre_actions(&ActionContext::new(Stage::UploadFilesystemImage))
            .unwrap();

        assert_eq!(ran, 3);
        assert_eq!(entries(&journal), ["bundle", "between", "bundle"]);
    }

    #[test]
    fn test_rerunning_a_stage_reexecutes_pre_actions() {
        let journal = Journal::default();
        let mut registry = HookRegistry::new();
        registry.register(Stage::UploadFirmware, action(&journal, "bundle", false));

        let mut pipeline = Pipeline::new(&registry);
        pipeline.run_stage(Stage::UploadFirmware).unwrap();
        pipeline.run_stage(Stage::UploadFirmware).unwrap();

        assert_eq!(entries(&journal), ["bundle", "bundle"]);
    }

    #[test]
    fn test_pipeline_halts_after_failed_stage() {
        let journal = Journal::default();
        let mut registry = HookRegistry::new();
        registry.register(
            Stage::AssembleFilesystemImage,
            action(&journal, "bundle", true),
        );
        registry.register(
            Stage::UploadFilesystemImage,
            action(&journal, "never", false),
        );

        let mut pipeline = Pipeline::new(&registry);
        let err = pipeline
            .run(&[Stage::AssembleFilesystemImage, Stage::UploadFilesystemImage])
            .unwrap_err();

        assert!(matches!(err, Error::StageAborted { .. }));
        assert_eq!(entries(&journal), ["bundle"]);

        // No resumption: the aborted invocation refuses further stages
        let err = pipeline.run_stage(Stage::UploadFilesystemImage).unwrap_err();
        assert!(matches!(err, Error::PipelineAborted { .. }));
        assert_eq!(entries(&journal), ["bundle"]);

        pipeline.reset();
        assert_eq!(pipeline.state(), StageState::Idle);
        pipeline.run_stage(Stage::UploadFilesystemImage).unwrap();
        assert_eq!(entries(&journal), ["bundle", "never"]);
    }

    #[test]
    fn test_main_action_failure_is_reported_as_stage_failure() {
        let journal = Journal::default();
        let registry = HookRegistry::new();
        let mut pipeline = Pipeline::new(&registry)
            .with_main(Stage::UploadFirmware, action(&journal, "upload", true));

        let err = pipeline.run_stage(Stage::UploadFirmware).unwrap_err();
        assert!(matches!(err, Error::StageFailed { .. }));
        assert!(matches!(
            err.root_cause(),
            Error::Hook(HookError::ActionFailed { .. })
        ));
    }

    #[test]
    fn test_register_fn_runs_closures_in_registration_order() {
        let journal = Journal::default();
        let mut registry = HookRegistry::new();
        for name in ["first", "second"] {
            let journal = Arc::clone(&journal);
            registry.register_fn(Stage::AssembleFilesystemImage, name, move || {
                journal.lock().unwrap().push(name.to_string());
                Ok(())
            });
        }

        let mut pipeline = Pipeline::new(&registry);
        let report = pipeline.run_stage(Stage::AssembleFilesystemImage).unwrap();

        assert_eq!(report.pre_actions, 2);
        assert!(!report.ran_main);
        assert_eq!(entries(&journal), ["first", "second"]);
    }

    #[test]
    fn test_stage_commands_from_config_become_main_actions() {
        let config = Config::from_toml_str(
            r#"
[stages.upload-firmware]
command = ["pio", "run", "--target", "upload"]
"#,
        )
        .unwrap();
        let registry = HookRegistry::from_config(&config).unwrap();
        let pipeline = Pipeline::new(&registry).with_config_mains(&config).unwrap();

        assert!(registry.is_empty());
        assert!(pipeline.has_main(Stage::UploadFirmware));
        assert!(!pipeline.has_main(Stage::AssembleFilesystemImage));
        assert!(!pipeline.has_main(Stage::UploadFilesystemImage));
    }

    struct AwaitsAcknowledgement {
        ack: Mutex<std::sync::mpsc::Receiver<()>>,
    }

    impl Action for AwaitsAcknowledgement {
        fn name(&self) -> &str {
            "frontend-bundle"
        }

        fn execute(&self, ctx: &ActionContext) -> Result<(), Error> {
            use stagehook_events::EventEmitter;

            ctx.emit_hook(HookEvent::ActionMessage {
                action: self.name().to_string(),
                message: "Building react app...".to_string(),
            });
            self.ack
                .lock()
                .unwrap()
                .recv_timeout(std::time::Duration::from_secs(10))
                .map_err(|_| {
                    Error::from(HookError::ActionFailed {
                        action: self.name().to_string(),
                        message: "message was not delivered while running".to_string(),
                    })
                })
        }
    }

    #[test]
    fn test_events_reach_consumer_while_action_runs() {
        let (ack_tx, ack_rx) = std::sync::mpsc::channel();
        let mut registry = HookRegistry::new();
        registry.register(
            Stage::AssembleFilesystemImage,
            Arc::new(AwaitsAcknowledgement {
                ack: Mutex::new(ack_rx),
            }),
        );

        let (tx, rx) = stagehook_events::channel();
        let result = std::thread::scope(|scope| {
            scope.spawn(move || {
                for message in rx.iter() {
                    if let AppEvent::Hook(HookEvent::ActionMessage { .. }) = message.event {
                        let _ = ack_tx.send(());
                    }
                }
            });
            Pipeline::new(&registry)
                .with_event_sender(tx)
                .run(&[Stage::AssembleFilesystemImage])
        });

        assert!(result.is_ok(), "{result:?}");
    }

    #[test]
    fn test_events_follow_stage_lifecycle() {
        let journal = Journal::default();
        let mut registry = HookRegistry::new();
        registry.register(Stage::UploadFirmware, action(&journal, "a", false));
        registry.register(Stage::UploadFirmware, action(&journal, "b", true));

        let (tx, rx) = stagehook_events::channel();
        let mut pipeline = Pipeline::new(&registry).with_event_sender(tx);
        pipeline.run_stage(Stage::UploadFirmware).unwrap_err();

        let events: Vec<HookEvent> = rx
            .try_iter()
            .filter_map(|message| match message.event {
                AppEvent::Hook(event) => Some(event),
                AppEvent::General(_) => None,
            })
            .collect();

        assert!(matches!(
            events.first(),
            Some(HookEvent::StageStarted { pre_actions: 2, .. })
        ));
        assert!(events.iter().any(|e| matches!(
            e,
            HookEvent::PreActionCompleted { position: 1, .. }
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            HookEvent::PreActionFailed { position: 2, .. }
        )));
        assert!(matches!(events.last(), Some(HookEvent::StageAborted { .. })));
        assert!(!events
            .iter()
            .any(|e| matches!(e, HookEvent::StageMainStarted { .. })));
    }

    #[cfg(unix)]
    mod processes {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use std::path::Path;

        fn write_script(dir: &Path, name: &str, body: &str) {
            let path = dir.join(name);
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }

        #[test]
        fn test_script_runs_in_project_root() {
            let dir = tempfile::tempdir().unwrap();
            write_script(dir.path(), "create_www.sh", "mkdir -p data && touch data/index.html");

            let bundle = CommandAction::new("frontend-bundle", "./create_www.sh", dir.path());
            bundle
                .execute(&ActionContext::new(Stage::AssembleFilesystemImage))
                .unwrap();

            assert!(dir.path().join("data/index.html").exists());
        }

        #[test]
        fn test_nonzero_exit_is_action_exit_error() {
            let dir = tempfile::tempdir().unwrap();
            let failing = CommandAction::new("frontend-bundle", "sh", dir.path())
                .args(["-c", "echo 'npm ERR! missing script: build' >&2; exit 3"]);

            let err = failing
                .execute(&ActionContext::new(Stage::UploadFirmware))
                .unwrap_err();

            match err {
                Error::Hook(HookError::ActionExit { code, stderr, .. }) => {
                    assert_eq!(code, Some(3));
                    assert!(stderr.contains("missing script"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_missing_executable_is_launch_error() {
            let dir = tempfile::tempdir().unwrap();
            let mut registry = HookRegistry::new();
            registry.register(
                Stage::UploadFilesystemImage,
                Arc::new(CommandAction::new(
                    "frontend-bundle",
                    "./does-not-exist.sh",
                    dir.path(),
                )),
            );

            let journal = Journal::default();
            let mut pipeline = Pipeline::new(&registry).with_main(
                Stage::UploadFilesystemImage,
                action(&journal, "uploadfs", false),
            );
            let err = pipeline.run_stage(Stage::UploadFilesystemImage).unwrap_err();

            assert!(matches!(
                err.root_cause(),
                Error::Hook(HookError::ActionLaunch { .. })
            ));
            assert!(entries(&journal).is_empty());
        }

        #[test]
        fn test_command_output_is_captured_as_events() {
            let dir = tempfile::tempdir().unwrap();
            let echo = CommandAction::new("frontend-bundle", "sh", dir.path())
                .args(["-c", "echo built; echo warn >&2"])
                .with_message("Building react app...");

            let (tx, rx) = stagehook_events::channel();
            echo.execute(&ActionContext::new(Stage::UploadFirmware).with_event_sender(tx))
                .unwrap();

            let events: Vec<HookEvent> = rx
                .try_iter()
                .filter_map(|message| match message.event {
                    AppEvent::Hook(event) => Some(event),
                    AppEvent::General(_) => None,
                })
                .collect();

            assert!(matches!(
                events.first(),
                Some(HookEvent::ActionMessage { message, .. }) if message == "Building react app..."
            ));
            assert!(events.iter().any(|e| matches!(
                e,
                HookEvent::CommandOutput { line, is_stderr: false, .. } if line == "built"
            )));
            assert!(events.iter().any(|e| matches!(
                e,
                HookEvent::CommandOutput { line, is_stderr: true, .. } if line == "warn"
            )));
            assert!(matches!(
                events.last(),
                Some(HookEvent::CommandCompleted { exit_code: Some(0), .. })
            ));
        }

        #[test]
        fn test_command_output_streams_before_exit() {
            let dir = tempfile::tempdir().unwrap();
            write_script(
                dir.path(),
                "create_www.sh",
                "echo ready\ni=0\nwhile [ ! -f go ]; do\n  i=$((i+1))\n  [ $i -gt 200 ] && exit 7\n  sleep 0.05\ndone",
            );
            let action = CommandAction::new("frontend-bundle", "./create_www.sh", dir.path())
                .with_message("Building react app...");

            let (tx, rx) = stagehook_events::channel();
            let go = dir.path().join("go");
            let result = std::thread::scope(|scope| {
                scope.spawn(|| {
                    let mut saw_message = false;
                    for message in rx.iter() {
                        match message.event {
                            AppEvent::Hook(HookEvent::ActionMessage { .. }) => {
                                saw_message = true;
                            }
                            AppEvent::Hook(HookEvent::CommandOutput { ref line, .. })
                                if line == "ready" && saw_message =>
                            {
                                fs::write(&go, "").unwrap();
                            }
                            _ => {}
                        }
                    }
                });
                let ctx = ActionContext::new(Stage::AssembleFilesystemImage).with_event_sender(tx);
                action.execute(&ctx)
            });

            assert!(result.is_ok(), "{result:?}");
        }

        #[test]
        fn test_registry_from_config_shares_one_action() {
            let dir = tempfile::tempdir().unwrap();
            write_script(dir.path(), "create_www.sh", "echo run >> bundle.log");
            let config_path = dir.path().join("stagehook.toml");
            fs::write(
                &config_path,
                r#"
[[hooks]]
name = "frontend-bundle"
message = "Building react app..."
stages = ["assemble-filesystem-image", "upload-filesystem-image"]
command = ["./create_www.sh"]

[stages.assemble-filesystem-image]
command = ["sh", "-c", "echo image >> bundle.log"]
"#,
            )
            .unwrap();

            let config = Config::load_from_file(&config_path).unwrap();
            let registry = HookRegistry::from_config(&config).unwrap();
            assert_eq!(registry.len(), 2);
            assert!(Arc::ptr_eq(
                &registry.actions(Stage::AssembleFilesystemImage)[0],
                &registry.actions(Stage::UploadFilesystemImage)[0]
            ));

            let mut pipeline = Pipeline::new(&registry).with_config_mains(&config).unwrap();
            assert!(pipeline.has_main(Stage::AssembleFilesystemImage));
            assert!(!pipeline.has_main(Stage::UploadFilesystemImage));

            let report = pipeline
                .run(&[Stage::AssembleFilesystemImage, Stage::UploadFilesystemImage])
                .unwrap();
            assert_eq!(report.stages.len(), 2);

            let log = fs::read_to_string(dir.path().join("bundle.log")).unwrap();
            assert_eq!(log, "run\nimage\nrun\n");
        }
    }
}
