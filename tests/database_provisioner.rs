// tests/database_provisioner.rs

use with_env_test_utils::builders::ConfigFileBuilder;
use with_env_test_utils::fake_runner::FakeCommandRunner;
use with_env_test_utils::{init_tracing, with_timeout};

use std::error::Error;
use std::time::Duration;

use with_env::errors::ProvisionError;
use with_env::provision::{DatabaseProvisioner, Provisioner};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn acquire_creates_and_release_drops_same_database() -> TestResult {
    init_tracing();
    let runner = FakeCommandRunner::new();
    let cfg = ConfigFileBuilder::new().prefix("ci").build();
    let mut provisioner = DatabaseProvisioner::new(cfg.database, runner.clone());

    let handle = provisioner.acquire().await?;
    let name = handle.database_name().expect("database handle").to_string();
    assert!(name.starts_with("ci_"), "unexpected name {name}");
    assert_eq!(
        handle.exposure().get("PGDATABASE").and_then(|v| v.to_str()),
        Some(name.as_str())
    );

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, "createdb");
    assert_eq!(calls[0].args, vec!["--encoding=UTF8".to_string(), name.clone()]);

    provisioner.release().await;
    let calls = runner.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].program, "dropdb");
    assert_eq!(calls[1].args, vec![name]);
    assert!(provisioner.current_database().is_none());
    Ok(())
}

#[tokio::test]
async fn release_is_idempotent() -> TestResult {
    init_tracing();
    let runner = FakeCommandRunner::new();
    let mut provisioner =
        DatabaseProvisioner::new(ConfigFileBuilder::new().build().database, runner.clone());

    provisioner.release().await;
    provisioner.acquire().await?;
    provisioner.release().await;
    provisioner.release().await;

    assert_eq!(runner.steps(), vec!["createdb", "dropdb"]);
    Ok(())
}

#[tokio::test]
async fn server_settings_reach_helpers_and_child() -> TestResult {
    init_tracing();
    let runner = FakeCommandRunner::new();
    let cfg = ConfigFileBuilder::new()
        .server("db.internal", 6543, "ci")
        .build();
    let mut provisioner = DatabaseProvisioner::new(cfg.database, runner.clone());

    let handle = provisioner.acquire().await?;
    let name = handle.database_name().unwrap().to_string();
    provisioner.release().await;

    let calls = runner.calls();
    assert_eq!(
        calls[0].args,
        vec![
            "--encoding=UTF8".to_string(),
            "--host=db.internal".to_string(),
            "--port=6543".to_string(),
            "--username=ci".to_string(),
            name.clone(),
        ]
    );
    assert_eq!(
        calls[1].args,
        vec![
            "--host=db.internal".to_string(),
            "--port=6543".to_string(),
            "--username=ci".to_string(),
            name,
        ]
    );

    let env = handle.exposure();
    assert_eq!(env.get("PGHOST").and_then(|v| v.to_str()), Some("db.internal"));
    assert_eq!(env.get("PGPORT").and_then(|v| v.to_str()), Some("6543"));
    assert_eq!(env.get("PGUSER").and_then(|v| v.to_str()), Some("ci"));
    Ok(())
}

#[tokio::test]
async fn failed_createdb_does_not_drop_anything() -> TestResult {
    init_tracing();
    let runner = FakeCommandRunner::new();
    runner.fail_step("createdb", 1);
    let mut provisioner =
        DatabaseProvisioner::new(ConfigFileBuilder::new().build().database, runner.clone());

    match provisioner.acquire().await {
        Err(ProvisionError::CommandFailed { step, status, .. }) => {
            assert_eq!(step, "createdb");
            assert!(!status.success());
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }

    provisioner.release().await;
    assert_eq!(runner.steps(), vec!["createdb"]);
    Ok(())
}

#[tokio::test]
async fn second_acquire_is_rejected() -> TestResult {
    init_tracing();
    let runner = FakeCommandRunner::new();
    let mut provisioner =
        DatabaseProvisioner::new(ConfigFileBuilder::new().build().database, runner.clone());

    provisioner.acquire().await?;
    let err = provisioner.acquire().await.unwrap_err();
    assert!(matches!(err, ProvisionError::AlreadyAcquired(_)));
    assert_eq!(runner.steps(), vec!["createdb"]);

    provisioner.release().await;
    Ok(())
}

#[tokio::test]
async fn dropdb_failure_is_swallowed() -> TestResult {
    init_tracing();
    let runner = FakeCommandRunner::new();
    runner.fail_step("dropdb", 1);
    let mut provisioner =
        DatabaseProvisioner::new(ConfigFileBuilder::new().build().database, runner.clone());

    provisioner.acquire().await?;
    provisioner.release().await;

    assert_eq!(runner.steps(), vec!["createdb", "dropdb"]);
    assert!(provisioner.current_database().is_none());
    Ok(())
}

#[tokio::test]
async fn interrupted_createdb_is_dropped_if_it_exists() -> TestResult {
    init_tracing();
    let runner = FakeCommandRunner::new();
    runner.block_step("createdb");
    let mut provisioner =
        DatabaseProvisioner::new(ConfigFileBuilder::new().build().database, runner.clone());

    let timed_out = tokio::time::timeout(Duration::from_millis(50), provisioner.acquire()).await;
    assert!(timed_out.is_err());
    let pending = provisioner
        .current_database()
        .expect("name is reserved while createdb runs")
        .to_string();

    with_timeout(provisioner.release()).await;

    let calls = runner.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].program, "dropdb");
    assert_eq!(calls[1].args, vec!["--if-exists".to_string(), pending]);
    Ok(())
}
