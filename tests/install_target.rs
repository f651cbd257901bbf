mod common;

#[cfg(test)]
mod tests {
    use super::common::{RecordingProcess, ScriptedPrompter};
    use bunnypad_updater::libs::{
        error::UpdateError,
        install::{probe_writable, resolve_install_target, InstallCandidates, InstallLauncher, InstallTarget, LaunchOutcome},
    };
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;
    use test_context::{test_context, AsyncTestContext};

    /// `root/programs/BunnyPad` as the system directory, `root/Downloads`
    /// as the fallback and a staged artifact in `root/staging`.
    struct InstallTestContext {
        _temp_dir: TempDir,
        root: PathBuf,
        candidates: InstallCandidates,
        artifact: PathBuf,
    }

    impl AsyncTestContext for InstallTestContext {
        async fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let root = temp_dir.path().to_path_buf();
            fs::create_dir_all(root.join("programs")).unwrap();
            fs::create_dir_all(root.join("staging")).unwrap();
            let artifact = root.join("staging").join("BunnyPad-setup.bin");
            fs::write(&artifact, b"#!/bin/sh\nexit 0\n").unwrap();

            InstallTestContext {
                candidates: InstallCandidates::new(root.join("programs").join("BunnyPad"), root.join("Downloads")),
                artifact,
                root,
                _temp_dir: temp_dir,
            }
        }
    }

    fn nothing_writable(_: &Path) -> bool {
        false
    }

    fn everything_writable(_: &Path) -> bool {
        true
    }

    #[test_context(InstallTestContext)]
    #[test]
    fn test_existing_writable_system_dir_is_used(ctx: &mut InstallTestContext) {
        fs::create_dir_all(&ctx.candidates.system_dir).unwrap();
        let target = resolve_install_target(&ctx.candidates, everything_writable);
        assert_eq!(
            target,
            InstallTarget {
                dir: ctx.candidates.system_dir.clone(),
                writable: true
            }
        );
    }

    #[test_context(InstallTestContext)]
    #[test]
    fn test_missing_system_dir_is_created_in_writable_parent(ctx: &mut InstallTestContext) {
        let target = resolve_install_target(&ctx.candidates, everything_writable);
        assert_eq!(target.dir, ctx.candidates.system_dir);
        assert!(ctx.candidates.system_dir.is_dir());
    }

    #[test_context(InstallTestContext)]
    #[test]
    fn test_read_only_system_dir_and_parent_fall_back_to_downloads(ctx: &mut InstallTestContext) {
        fs::create_dir_all(&ctx.candidates.system_dir).unwrap();
        let target = resolve_install_target(&ctx.candidates, nothing_writable);
        assert_eq!(target.dir, ctx.candidates.downloads_dir);
        assert!(ctx.candidates.downloads_dir.is_dir());
    }

    #[test_context(InstallTestContext)]
    #[test]
    fn test_read_only_parent_is_not_used_to_create_the_system_dir(ctx: &mut InstallTestContext) {
        let programs = ctx.root.join("programs");
        let target = resolve_install_target(&ctx.candidates, |dir: &Path| dir != programs.as_path());
        assert_eq!(target.dir, ctx.candidates.downloads_dir);
        assert!(target.writable);
        assert!(!ctx.candidates.system_dir.exists());
    }

    #[test_context(InstallTestContext)]
    #[test]
    fn test_system_dir_is_never_returned_unwritable(ctx: &mut InstallTestContext) {
        fs::create_dir_all(&ctx.candidates.system_dir).unwrap();
        let system = ctx.candidates.system_dir.clone();
        let target = resolve_install_target(&ctx.candidates, |dir: &Path| dir != system.as_path());
        assert_ne!(target.dir, system);
    }

    #[test_context(InstallTestContext)]
    #[test]
    fn test_probe_writable(ctx: &mut InstallTestContext) {
        assert!(probe_writable(&ctx.root));
        assert!(!probe_writable(&ctx.root.join("does-not-exist")));
        assert!(!probe_writable(&ctx.artifact));
        assert_eq!(fs::read_dir(&ctx.root).unwrap().count(), 2);
    }

    #[test_context(InstallTestContext)]
    #[tokio::test]
    async fn test_install_places_and_launches_the_artifact(ctx: &mut InstallTestContext) {
        let process = RecordingProcess::new();
        let prompter = ScriptedPrompter::agreeing();
        let launcher = InstallLauncher::new(ctx.candidates.clone(), &process, &prompter)
            .with_protected_roots(Vec::new())
            .with_writable_probe(everything_writable);

        let outcome = launcher.install(&ctx.artifact).await.unwrap();

        let installed = ctx.candidates.system_dir.join("BunnyPad-setup.bin");
        assert_eq!(outcome, LaunchOutcome::Launched { pid: 4242, elevated: false });
        assert_eq!(process.spawned.borrow().as_slice(), &[(installed.clone(), false)]);
        assert!(installed.is_file());
        assert!(!ctx.artifact.exists());
        assert!(!process.terminated.get());
        assert!(prompter.asked.borrow().is_empty());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&installed).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test_context(InstallTestContext)]
    #[tokio::test]
    async fn test_protected_target_asks_for_elevation(ctx: &mut InstallTestContext) {
        let process = RecordingProcess::new();
        let prompter = ScriptedPrompter::agreeing();
        let launcher = InstallLauncher::new(ctx.candidates.clone(), &process, &prompter)
            .with_protected_roots(vec![ctx.root.join("programs")])
            .with_writable_probe(everything_writable);

        let outcome = launcher.install(&ctx.artifact).await.unwrap();

        assert_eq!(outcome, LaunchOutcome::Launched { pid: 4343, elevated: true });
        assert!(prompter.was_asked("elevation"));
        assert!(!prompter.was_asked("continue_unelevated"));
    }

    #[test_context(InstallTestContext)]
    #[tokio::test]
    async fn test_elevated_process_is_not_asked(ctx: &mut InstallTestContext) {
        let mut process = RecordingProcess::new();
        process.elevated = true;
        let prompter = ScriptedPrompter::agreeing();
        let launcher = InstallLauncher::new(ctx.candidates.clone(), &process, &prompter)
            .with_protected_roots(vec![ctx.root.join("programs")])
            .with_writable_probe(everything_writable);

        let outcome = launcher.install(&ctx.artifact).await.unwrap();

        assert_eq!(outcome, LaunchOutcome::Launched { pid: 4242, elevated: false });
        assert!(prompter.asked.borrow().is_empty());
    }

    #[test_context(InstallTestContext)]
    #[tokio::test]
    async fn test_failed_elevation_can_continue_unelevated(ctx: &mut InstallTestContext) {
        let mut process = RecordingProcess::new();
        process.fail_elevation = true;
        let prompter = ScriptedPrompter::agreeing();
        let launcher = InstallLauncher::new(ctx.candidates.clone(), &process, &prompter)
            .with_protected_roots(vec![ctx.root.join("programs")])
            .with_writable_probe(everything_writable);

        let outcome = launcher.install(&ctx.artifact).await.unwrap();

        assert_eq!(outcome, LaunchOutcome::Launched { pid: 4242, elevated: false });
        assert!(prompter.was_asked("continue_unelevated"));
    }

    #[test_context(InstallTestContext)]
    #[tokio::test]
    async fn test_declining_elevation_and_continuing_aborts(ctx: &mut InstallTestContext) {
        let process = RecordingProcess::new();
        let prompter = ScriptedPrompter::declining();
        let launcher = InstallLauncher::new(ctx.candidates.clone(), &process, &prompter)
            .with_protected_roots(vec![ctx.root.join("programs")])
            .with_writable_probe(everything_writable);

        let err = launcher.install(&ctx.artifact).await.unwrap_err();

        assert!(matches!(err, UpdateError::Aborted));
        assert!(process.spawned.borrow().is_empty());
        assert_eq!(*prompter.asked.borrow(), vec!["elevation".to_string(), "continue_unelevated".to_string()]);
    }

    #[test_context(InstallTestContext)]
    #[tokio::test]
    async fn test_spawn_failure_is_reported(ctx: &mut InstallTestContext) {
        let mut process = RecordingProcess::new();
        process.fail_spawn = true;
        let prompter = ScriptedPrompter::agreeing();
        let launcher = InstallLauncher::new(ctx.candidates.clone(), &process, &prompter)
            .with_protected_roots(Vec::new())
            .with_writable_probe(nothing_writable);

        let err = launcher.install(&ctx.artifact).await.unwrap_err();

        assert!(matches!(err, UpdateError::Spawn { .. }));
        assert!(err.offers_log());
        assert!(ctx.candidates.downloads_dir.join("BunnyPad-setup.bin").is_file());
    }
}
