use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

fn run_shell(lines: &[&str]) -> std::process::Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_mysh"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn mysh");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        for line in lines {
            writeln!(stdin, "{line}").expect("write line");
        }
        writeln!(stdin, "exit").expect("write exit");
    }

    child.wait_with_output().expect("wait output")
}

/// RAII temp directory, removed on drop.
struct TempDir(PathBuf);

impl TempDir {
    fn new(label: &str) -> Self {
        let dir = std::env::temp_dir().join(format!(
            "mysh_redirect_{label}_{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        TempDir(dir)
    }

    fn file(&self, name: &str) -> PathBuf {
        self.0.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("read redirect target")
}

#[test]
fn truncate_keeps_only_last_run() {
    let dir = TempDir::new("truncate");
    let out = dir.file("out.txt");

    let first = format!("echo first > {}", out.display());
    let second = format!("echo second > {}", out.display());
    let output = run_shell(&[first.as_str(), second.as_str()]);

    assert!(output.status.success());
    assert_eq!(read(&out), "second\n");
}

#[test]
fn append_concatenates_runs_in_order() {
    let dir = TempDir::new("append");
    let out = dir.file("out.txt");

    let first = format!("echo first >> {}", out.display());
    let second = format!("echo second >> {}", out.display());
    run_shell(&[first.as_str(), second.as_str()]);

    assert_eq!(read(&out), "first\nsecond\n");
}

#[cfg(unix)]
#[test]
fn created_file_uses_0644() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new("mode");
    let out = dir.file("out.txt");
    let line = format!("echo x > {}", out.display());

    // Pin the umask so the requested mode is observable.
    let cmd = format!("sh -c 'umask 022; exec {} -c \"{line}\"'", env!("CARGO_BIN_EXE_mysh"));
    run_shell(&[cmd.as_str()]);

    let mode = std::fs::metadata(&out).expect("metadata").permissions().mode();
    assert_eq!(mode & 0o777, 0o644);
}

#[test]
fn input_and_output_together() {
    let dir = TempDir::new("both");
    let input = dir.file("in.txt");
    let out = dir.file("out.txt");
    std::fs::write(&input, "b\na\n").expect("write input");

    let line = format!("sort < {} > {}", input.display(), out.display());
    run_shell(&[line.as_str()]);

    assert_eq!(read(&out), "a\nb\n");
}

#[test]
fn missing_input_file_fails_child_with_status_1() {
    let output = run_shell(&["cat < /nonexistent-mysh-dir/in.txt", "echo ALIVE"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(
        stderr.contains("mysh: /nonexistent-mysh-dir/in.txt: cannot open file"),
        "stderr was: {stderr}"
    );
    assert!(stderr.contains("mysh: cat: exited with code 1"), "stderr was: {stderr}");
    assert_eq!(stdout.matches("ALIVE").count(), 1, "stdout was: {stdout}");
}

#[test]
fn redirect_failure_happens_before_exec() {
    let dir = TempDir::new("noexec");
    let marker = dir.file("ran.txt");

    // If exec happened despite the failed redirect, the marker would exist.
    let line = format!(
        "touch {} > /nonexistent-mysh-dir/out.txt",
        marker.display()
    );
    run_shell(&[line.as_str()]);

    assert!(!marker.exists());
}

#[test]
fn builtin_pwd_honours_output_redirect() {
    let dir = TempDir::new("pwd");
    let out = dir.file("pwd.txt");

    let line = format!("pwd > {}", out.display());
    let output = run_shell(&[line.as_str()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let cwd = std::env::current_dir().expect("cwd");
    assert_eq!(read(&out).trim_end(), cwd.display().to_string());
    assert!(!stdout.contains(&cwd.display().to_string()), "stdout was: {stdout}");
}
