// tests/common/mod.rs
//
// Fake `createdb`/`dropdb`/`virtualenv` scripts for driving the real
// binaries without a PostgreSQL server or a Python toolchain.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tempfile::TempDir;

/// A scratch directory holding fake helper programs, their call log and a
/// config file pointing at them.
pub struct Sandbox {
    pub dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let sandbox = Self {
            dir: tempfile::tempdir().expect("create sandbox"),
        };
        fs::create_dir(sandbox.venv_root()).expect("create venv root");
        sandbox.install_database_helpers();
        sandbox.install_virtualenv_helper();
        sandbox.write_config();
        sandbox
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// File the fake helpers append `create <name>` / `drop <name>` to.
    pub fn log(&self) -> PathBuf {
        self.path().join("helpers.log")
    }

    pub fn log_lines(&self) -> Vec<String> {
        fs::read_to_string(self.log())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn config(&self) -> PathBuf {
        self.path().join("with-env.toml")
    }

    /// Directory temporary virtualenvs are created in.
    pub fn venv_root(&self) -> PathBuf {
        self.path().join("venvs")
    }

    pub fn leftover_venvs(&self) -> Vec<PathBuf> {
        fs::read_dir(self.venv_root())
            .expect("read venv root")
            .map(|e| e.expect("dir entry").path())
            .collect()
    }

    pub fn requirements(&self, contents: &str) -> PathBuf {
        let path = self.path().join("requirements.txt");
        fs::write(&path, contents).expect("write requirements");
        path
    }

    /// Make the fake `createdb` exit with `code` instead of succeeding.
    pub fn break_createdb(&self, code: i32) {
        self.script(
            "createdb",
            &format!("for a; do last=$a; done\necho \"create-failed $last\" >> '{}'\nexit {code}\n", self.log().display()),
        );
    }

    fn write_config(&self) {
        let contents = format!(
            "[database]\ncreatedb = '{createdb}'\ndropdb = '{dropdb}'\n\n\
             [virtualenv]\nvirtualenv = '{virtualenv}'\ntemp_root = '{root}'\n\n\
             [executor]\nkill_grace = \"2s\"\n",
            createdb = self.bin("createdb").display(),
            dropdb = self.bin("dropdb").display(),
            virtualenv = self.bin("virtualenv").display(),
            root = self.venv_root().display(),
        );
        fs::write(self.config(), contents).expect("write config");
    }

    fn bin(&self, name: &str) -> PathBuf {
        self.path().join("bin").join(name)
    }

    fn install_database_helpers(&self) {
        let log = self.log();
        self.script(
            "createdb",
            &format!("for a; do last=$a; done\necho \"create $last\" >> '{}'\n", log.display()),
        );
        self.script(
            "dropdb",
            &format!("for a; do last=$a; done\necho \"drop $last\" >> '{}'\n", log.display()),
        );
    }

    // The fake `virtualenv` lays down a `bin/pip` that fails for any
    // requirements file mentioning a package called "nonexistent".
    fn install_virtualenv_helper(&self) {
        let body = r#"for a; do dir=$a; done
mkdir -p "$dir/bin"
cat > "$dir/bin/pip" <<'PIP'
#!/bin/sh
if grep -q nonexistent "$3"; then
    echo "ERROR: No matching distribution found for nonexistent" >&2
    exit 1
fi
PIP
chmod +x "$dir/bin/pip"
"#;
        self.script("virtualenv", body);
    }

    fn script(&self, name: &str, body: &str) {
        let path = self.bin(name);
        fs::create_dir_all(path.parent().expect("bin dir")).expect("create bin dir");
        fs::write(&path, format!("#!/bin/sh\n{body}")).expect("write script");
        let mut perms = fs::metadata(&path).expect("stat script").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("chmod script");
    }
}

/// Poll `ready` until it holds, panicking after ten seconds.
pub fn wait_for(what: &str, mut ready: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !ready() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(20));
    }
}

/// Send SIGTERM to a running wrapper and wait for it to exit.
pub fn terminate(mut wrapper: Child) -> ExitStatus {
    let pid = i32::try_from(wrapper.id()).expect("pid fits in i32");
    kill(Pid::from_raw(pid), Signal::SIGTERM).expect("send SIGTERM");

    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if let Some(status) = wrapper.try_wait().expect("poll wrapper") {
            return status;
        }
        if Instant::now() >= deadline {
            let _ = wrapper.kill();
            panic!("wrapper did not exit after SIGTERM");
        }
        thread::sleep(Duration::from_millis(20));
    }
}
