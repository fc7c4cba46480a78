//! Integration tests for error types

#[cfg(test)]
mod tests {
    use stagehook_errors::*;

    #[test]
    fn test_error_conversion() {
        let hook_err = HookError::ActionLaunch {
            action: "frontend-bundle".into(),
            program: "./create_www.sh".into(),
            message: "No such file or directory".into(),
        };
        let err: Error = hook_err.into();
        assert!(matches!(err, Error::Hook(HookError::ActionLaunch { .. })));
    }

    #[test]
    fn test_exit_error_display() {
        let err = HookError::ActionExit {
            action: "frontend-bundle".into(),
            program: "./create_www.sh".into(),
            code: Some(2),
            stderr: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "frontend-bundle: ./create_www.sh exited with status 2"
        );

        let signalled = HookError::ActionExit {
            action: "frontend-bundle".into(),
            program: "./create_www.sh".into(),
            code: None,
            stderr: String::new(),
        };
        assert!(signalled.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_stage_aborted_root_cause() {
        let inner: Error = HookError::ActionFailed {
            action: "b".into(),
            message: "boom".into(),
        }
        .into();
        let err = Error::StageAborted {
            stage: "upload-firmware".into(),
            position: 2,
            action: "b".into(),
            error: Box::new(inner),
        };

        assert!(matches!(
            err.root_cause(),
            Error::Hook(HookError::ActionFailed { .. })
        ));
        assert_eq!(err.user_code(), Some("hook.action_failed"));
        assert!(err
            .to_string()
            .starts_with("stage upload-firmware aborted at pre-action #2 (b)"));
    }

    #[test]
    fn test_user_message_includes_stderr() {
        let err = HookError::ActionExit {
            action: "frontend-bundle".into(),
            program: "./create_www.sh".into(),
            code: Some(1),
            stderr: "npm: command not found".into(),
        };
        assert!(err.user_message().contains("npm: command not found"));
        assert!(err.user_hint().is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.user_code(), Some("error.io"));
    }

    #[test]
    fn test_config_error_codes() {
        let err: Error = ConfigError::UnknownStage {
            name: "buildfs".into(),
        }
        .into();
        assert_eq!(err.user_code(), Some("config.unknown_stage"));
        assert!(err.user_hint().is_some());
    }
}
