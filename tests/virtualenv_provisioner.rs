// tests/virtualenv_provisioner.rs

use with_env_test_utils::builders::ConfigFileBuilder;
use with_env_test_utils::fake_runner::FakeCommandRunner;
use with_env_test_utils::init_tracing;

use std::error::Error;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use with_env::errors::ProvisionError;
use with_env::fs::mock::MockFileSystem;
use with_env::fs::FileSystem;
use with_env::provision::virtualenv::BIN_DIR;
use with_env::provision::{Provisioner, VirtualenvProvisioner};

type TestResult = Result<(), Box<dyn Error>>;

const TEMP_ROOT: &str = "/tmp";
const REQUIREMENTS: &str = "/work/requirements.txt";

fn setup(requirements: Option<&str>) -> (MockFileSystem, FakeCommandRunner) {
    let fs = MockFileSystem::new();
    fs.add_dir(TEMP_ROOT);
    fs.add_dir("/work");
    if let Some(contents) = requirements {
        fs.add_file(REQUIREMENTS, contents);
    }
    (fs, FakeCommandRunner::new())
}

fn provisioner(
    fs: &MockFileSystem,
    runner: &FakeCommandRunner,
    builder: ConfigFileBuilder,
) -> VirtualenvProvisioner<FakeCommandRunner, MockFileSystem> {
    let cfg = builder.temp_root(TEMP_ROOT).requirements(REQUIREMENTS).build();
    VirtualenvProvisioner::new(
        cfg.virtualenv,
        Some(OsString::from("/usr/local/bin:/usr/bin")),
        runner.clone(),
        fs.clone(),
    )
}

#[tokio::test]
async fn acquire_then_release_leaves_filesystem_unchanged() -> TestResult {
    init_tracing();
    let (fs, runner) = setup(Some("requests==2.31.0\n"));
    let before = fs.paths();
    let mut venv = provisioner(&fs, &runner, ConfigFileBuilder::new());

    let handle = venv.acquire().await?;
    let root = handle.virtualenv_root().expect("virtualenv handle").to_path_buf();
    assert!(root.starts_with(TEMP_ROOT));
    assert!(fs.is_dir(&root));
    assert_ne!(fs.paths(), before);

    venv.release().await;
    assert_eq!(fs.paths(), before);
    assert!(venv.current_dir().is_none());
    Ok(())
}

#[tokio::test]
async fn runs_virtualenv_then_pip_inside_the_environment() -> TestResult {
    init_tracing();
    let (fs, runner) = setup(Some("# deps\nrequests==2.31.0\n"));
    let mut venv = provisioner(&fs, &runner, ConfigFileBuilder::new().python("python3.12"));

    let handle = venv.acquire().await?;
    let root = handle.virtualenv_root().unwrap().to_path_buf();

    let calls = runner.calls();
    assert_eq!(runner.steps(), vec!["virtualenv", "pip install"]);

    assert_eq!(calls[0].program, "virtualenv");
    assert_eq!(
        calls[0].args,
        vec![
            "--quiet".to_string(),
            "--python".to_string(),
            "python3.12".to_string(),
            root.display().to_string(),
        ]
    );

    let pip = root.join(BIN_DIR).join("pip");
    assert_eq!(PathBuf::from(&calls[1].program), pip);
    assert_eq!(
        calls[1].args,
        vec![
            "install".to_string(),
            "-r".to_string(),
            REQUIREMENTS.to_string(),
            "--quiet".to_string(),
        ]
    );
    assert_eq!(
        calls[1].env.get("VIRTUAL_ENV").map(Path::new),
        Some(root.as_path())
    );

    venv.release().await;
    Ok(())
}

#[tokio::test]
async fn exposure_activates_the_environment() -> TestResult {
    init_tracing();
    let (fs, runner) = setup(Some("requests\n"));
    let mut venv = provisioner(&fs, &runner, ConfigFileBuilder::new());

    let handle = venv.acquire().await?;
    let root = handle.virtualenv_root().unwrap().to_path_buf();
    let env = handle.exposure();

    assert_eq!(env.get("VIRTUAL_ENV").map(Path::new), Some(root.as_path()));
    let path: Vec<PathBuf> = std::env::split_paths(env.get("PATH").unwrap()).collect();
    assert_eq!(
        path,
        vec![
            root.join(BIN_DIR),
            PathBuf::from("/usr/local/bin"),
            PathBuf::from("/usr/bin"),
        ]
    );
    assert!(env.is_unset("PYTHONHOME"));

    venv.release().await;
    Ok(())
}

#[tokio::test]
async fn empty_requirements_skip_pip() -> TestResult {
    init_tracing();
    let (fs, runner) = setup(Some("\n# nothing pinned yet\n"));
    let mut venv = provisioner(&fs, &runner, ConfigFileBuilder::new());

    venv.acquire().await?;
    assert_eq!(runner.steps(), vec!["virtualenv"]);

    venv.release().await;
    Ok(())
}

#[tokio::test]
async fn missing_requirements_file_creates_nothing() -> TestResult {
    init_tracing();
    let (fs, runner) = setup(None);
    let before = fs.paths();
    let mut venv = provisioner(&fs, &runner, ConfigFileBuilder::new());

    match venv.acquire().await {
        Err(ProvisionError::MissingRequirements(path)) => {
            assert_eq!(path, PathBuf::from(REQUIREMENTS));
        }
        other => panic!("expected MissingRequirements, got {other:?}"),
    }
    assert!(runner.calls().is_empty());
    assert_eq!(fs.paths(), before);

    venv.release().await;
    Ok(())
}

#[tokio::test]
async fn failed_install_removes_directory() -> TestResult {
    init_tracing();
    let (fs, runner) = setup(Some("this-package-does-not-exist==0.0.0\n"));
    runner.fail_step("pip install", 1);
    let before = fs.paths();
    let mut venv = provisioner(&fs, &runner, ConfigFileBuilder::new());

    match venv.acquire().await {
        Err(ProvisionError::CommandFailed { step, .. }) => assert_eq!(step, "pip install"),
        other => panic!("expected CommandFailed, got {other:?}"),
    }
    assert_eq!(fs.paths(), before, "no leaked directories");
    assert!(venv.current_dir().is_none());

    venv.release().await;
    assert_eq!(runner.steps(), vec!["virtualenv", "pip install"]);
    Ok(())
}

#[tokio::test]
async fn failed_virtualenv_removes_directory() -> TestResult {
    init_tracing();
    let (fs, runner) = setup(Some("requests\n"));
    runner.fail_step("virtualenv", 2);
    let before = fs.paths();
    let mut venv = provisioner(&fs, &runner, ConfigFileBuilder::new());

    assert!(venv.acquire().await.is_err());
    assert_eq!(fs.paths(), before);
    assert_eq!(runner.steps(), vec!["virtualenv"]);
    Ok(())
}

#[tokio::test]
async fn removal_failure_is_logged_not_raised() -> TestResult {
    init_tracing();
    let (fs, runner) = setup(Some("requests\n"));
    let mut venv = provisioner(&fs, &runner, ConfigFileBuilder::new());

    venv.acquire().await?;
    fs.fail_removals();
    venv.release().await;

    assert!(venv.current_dir().is_none());
    venv.release().await;
    Ok(())
}

#[tokio::test]
async fn streamed_requirements_are_left_to_pip() -> TestResult {
    init_tracing();
    let (fs, runner) = setup(None);
    fs.add_stream("/dev/fd/63");
    let cfg = ConfigFileBuilder::new()
        .temp_root(TEMP_ROOT)
        .requirements("/dev/fd/63")
        .build();
    let mut venv = VirtualenvProvisioner::new(cfg.virtualenv, None, runner.clone(), fs.clone());

    venv.acquire().await?;
    let calls = runner.calls();
    assert_eq!(runner.steps(), vec!["virtualenv", "pip install"]);
    assert_eq!(calls[1].args[2], "/dev/fd/63");

    venv.release().await;
    Ok(())
}

#[tokio::test]
async fn directory_is_not_a_requirements_file() -> TestResult {
    init_tracing();
    let (fs, runner) = setup(None);
    fs.add_dir(REQUIREMENTS);
    let mut venv = provisioner(&fs, &runner, ConfigFileBuilder::new());

    assert!(matches!(
        venv.acquire().await,
        Err(ProvisionError::MissingRequirements(_))
    ));
    assert!(runner.calls().is_empty());
    Ok(())
}
