//! Command execution.
//!
//! `run` takes a resolved command through the full lifecycle: freshness gate,
//! dependency recursion, chain execution, argument materialization, script
//! assembly and the actual sub-shell spawn. Synchronous commands inherit the
//! parent's stdio and are awaited; async commands detach into a `screen`
//! session whose liveness is probed until it exits.

use crate::constants::{ASYNC_LAUNCH_DELAY, DETACH_POLL_INTERVAL};
use crate::core::arguments;
use crate::core::driver::ChainProgress;
use crate::core::workspace::Workspace;
use crate::models::Command;
use crate::system::process;
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::{Command as StdCommand, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("invalid dependency: '{0}'")]
    InvalidDependency(String),
    #[error("command '{0}' has no backing script and no inline body")]
    MissingBody(String),
    #[error("failed to prepare script '{path}'")]
    ScriptAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to start command '{0}'")]
    SpawnFailed(String, #[source] io::Error),
    #[error("failed to wait for command '{0}'")]
    WaitFailed(String, #[source] io::Error),
    #[error("command '{0}' exited with a non-zero status")]
    NonZeroExitStatus(String),
}

/// Runs one command.
///
/// With `detach` set the body is spawned on a separate task and this call
/// returns after a short pacing delay, so the caller's log lines stay ordered;
/// errors of the detached body are logged, not propagated.
pub fn run(
    ws: &Arc<Workspace>,
    progress: &Arc<ChainProgress>,
    command: &Arc<Command>,
    args: &[String],
    detach: bool,
) -> Result<()> {
    if detach {
        let ws = Arc::clone(ws);
        let progress = Arc::clone(progress);
        let command = Arc::clone(command);
        let args = args.to_vec();
        thread::spawn(move || {
            if let Err(e) = run(&ws, &progress, &command, &args, false) {
                log::error!("failed to run command '{}': {:#}", command.name, e);
            }
        });
        thread::sleep(ASYNC_LAUNCH_DELAY);
        return Ok(());
    }

    let start = Instant::now();

    // Freshness gate: the first existing output skips the whole command,
    // dependencies and chain included.
    for output in &command.outputs {
        log::debug!("checking output: {}", output.display());
        if output.exists() {
            log::info!(
                "skipping command '{}' because output '{}' exists",
                command.name,
                output.display()
            );
            return Ok(());
        }
    }

    handle_dependencies(ws, progress, command)?;

    log::debug!(
        "running command '{}', args: {:?}, params: {:?}",
        command.name,
        args,
        command.params
    );

    // Predefined chain params win over call-site arguments.
    let args: Vec<String> = if command.params.is_empty() {
        args.to_vec()
    } else {
        log::debug!("found predefined params: {:?}", command.params);
        command.params.clone()
    };

    // Chained commands must satisfy their needs via their own params or
    // defaults, so the call-site arguments are not passed down.
    for link in &command.command_chain {
        run(ws, progress, link, &[], link.async_run).with_context(|| {
            format!("failed to execute chain link '{}'", link.name)
        })?;
    }

    let (current, total) = progress.advance();

    let arg_buffer = arguments::parse_arguments(command, &args)?;
    let (shell_command, script) = assemble_command(ws, command, &arg_buffer)?;

    if command.build_number {
        let number = ws.project.increment_build_number()?;
        log::debug!("build number is now {}", number);
    }

    let tag = format!("[{}/{}]", current, total);
    if command.async_run {
        println!("{} detaching {}", tag.dimmed(), command.name.cyan().bold());
    } else {
        println!("{} executing {}", tag.dimmed(), command.name.cyan().bold());
    }

    let mut invocation = StdCommand::new(&shell_command[0]);
    invocation.args(&shell_command[1..]);
    if command.async_run {
        invocation
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
    }

    let mut child = invocation
        .spawn()
        .map_err(|e| ExecutionError::SpawnFailed(command.name.clone(), e))?;

    let id = Uuid::new_v4();
    let pid = child.id();
    log::debug!("pid: {}", pid);
    ws.processes.add(id, &command.name, pid);

    let status = child.wait();
    ws.processes.delete_by_pid(pid);

    let success = match status {
        Ok(status) => status.success(),
        Err(e) => {
            return Err(ExecutionError::WaitFailed(command.name.clone(), e).into());
        }
    };

    if !success {
        // Without globals the assembled script may be empty; reload the body
        // from disk so the dump stays useful.
        let mut script = script;
        if script.is_empty() {
            if let Some(path) = &command.path {
                script = fs::read_to_string(path).unwrap_or_default();
            }
        }
        if ws.config.dump_script_on_error {
            dump_script(&script, &command.name);
        }
        return Err(ExecutionError::NonZeroExitStatus(command.name.clone()).into());
    }

    if command.async_run {
        // The multiplexer launcher forks; the session's child lands on the
        // next pid. Track it until the session disappears.
        let detached_pid = pid + 1;
        log::debug!("detached pid: {}", detached_pid);
        ws.processes.add(id, &command.name, detached_pid);

        loop {
            if !process::detached_session_alive(&command.name) {
                log::debug!("detached session '{}' exited", command.name);
                ws.processes.delete_by_pid(detached_pid);
                break;
            }
            thread::sleep(DETACH_POLL_INTERVAL);
        }
    } else {
        println!(
            "{} finished {} in {:?}",
            tag.dimmed(),
            command.name.cyan().bold(),
            start.elapsed()
        );
    }

    Ok(())
}

/// Runs every dependency whose declared outputs are incomplete. A dependency
/// that declares no outputs is never triggered here.
fn handle_dependencies(
    ws: &Arc<Workspace>,
    progress: &Arc<ChainProgress>,
    command: &Arc<Command>,
) -> Result<()> {
    for dependency in &command.dependencies {
        progress.add_total(1);

        let fields = shlex::split(dependency)
            .filter(|fields| !fields.is_empty())
            .ok_or_else(|| ExecutionError::InvalidDependency(dependency.clone()))?;
        let name = &fields[0];

        let dep_command = ws
            .registry
            .lookup(name)
            .ok_or_else(|| ExecutionError::InvalidDependency(name.clone()))?;

        if dep_command.outputs.is_empty() {
            continue;
        }

        let output_missing = dep_command.outputs.iter().any(|output| !output.exists());
        if output_missing {
            run(ws, progress, &dep_command, &fields[1..], command.async_run).with_context(
                || format!("failed to execute dependency command '{}'", name),
            )?;
        }
    }

    Ok(())
}

/// Builds the shell invocation and the generated script for one command:
/// `globals ∥ argument buffer ∥ body`.
fn assemble_command(
    ws: &Workspace,
    command: &Command,
    arg_buffer: &str,
) -> Result<(Vec<String>, String), ExecutionError> {
    let mut shell_command: Vec<String> = Vec::new();

    if command.async_run {
        shell_command.extend(
            ["screen", "-L", "-S", command.name.as_str(), "-dm"]
                .iter()
                .map(|s| s.to_string()),
        );
    }

    shell_command.push(ws.config.interpreter.clone());
    if ws.config.stop_on_error {
        shell_command.push("-e".to_string());
    }
    shell_command.push("-c".to_string());

    let globals = String::from_utf8_lossy(&ws.globals()).into_owned();

    let script = match &command.run_command {
        Some(body) => format!("{}{}\n{}", globals, arg_buffer, body),
        None => {
            let path = command
                .path
                .as_ref()
                .ok_or_else(|| ExecutionError::MissingBody(command.name.clone()))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(path, fs::Permissions::from_mode(0o700)).map_err(
                    |source| ExecutionError::ScriptAccess {
                        path: path.clone(),
                        source,
                    },
                )?;
            }

            let body =
                fs::read_to_string(path).map_err(|source| ExecutionError::ScriptAccess {
                    path: path.clone(),
                    source,
                })?;
            format!("{}{}{}", globals, arg_buffer, body)
        }
    };

    shell_command.push(script.clone());
    log::debug!("shell command: {:?}", shell_command);

    if ws.config.debug {
        print_script(&script, &command.name);
    }

    Ok((shell_command, script))
}

/// Prints the assembled script for inspection (debug mode).
fn print_script(script: &str, name: &str) {
    println!("{}", format!("--- script: {} ---", name).dimmed());
    print!("{}", script);
    println!("{}", "--- end ---".dimmed());
}

/// Prints the failed script with 1-based line numbers.
fn dump_script(script: &str, name: &str) {
    eprintln!(
        "{}",
        format!("--- script dump: {} ---", name).red().bold()
    );
    for (number, line) in script.lines().enumerate() {
        eprintln!("{:>4}  {}", (number + 1).to_string().dimmed(), line);
    }
    eprintln!("{}", "--- end of dump ---".red().bold());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{BOLT_DIR, CONFIG_FILENAME};
    use crate::core::discovery;
    use tempfile::TempDir;

    fn scaffold(config: &str, scripts: &[(&str, String)]) -> (TempDir, Arc<Workspace>) {
        let dir = TempDir::new().unwrap();
        let script_dir = dir.path().join(BOLT_DIR);
        fs::create_dir(&script_dir).unwrap();
        if !config.is_empty() {
            fs::write(script_dir.join(CONFIG_FILENAME), config).unwrap();
        }
        for (name, contents) in scripts {
            fs::write(script_dir.join(format!("{}.sh", name)), contents).unwrap();
        }
        let ws = Workspace::open(dir.path()).unwrap();
        discovery::find_commands(&ws).unwrap();
        (dir, ws)
    }

    fn progress() -> Arc<ChainProgress> {
        Arc::new(ChainProgress::new(1))
    }

    #[test]
    fn test_existing_output_skips_the_command() {
        // --- Setup ---
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("bin");
        let marker = dir.path().join("ran.txt");
        fs::write(&output, "built").unwrap();

        let (_scripts, ws) = scaffold(
            "",
            &[(
                "build",
                format!(
                    "# @outputs: {}\nprintf ran > {}\n",
                    output.display(),
                    marker.display()
                ),
            )],
        );
        let command = ws.registry.lookup("build").unwrap();

        // --- Execute ---
        run(&ws, &progress(), &command, &[], false).unwrap();

        // --- Assert: the body never ran, no process was spawned. ---
        assert!(!marker.exists());
        assert!(ws.processes.is_empty());
    }

    #[test]
    fn test_freshness_gate_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("bin");
        fs::write(&output, "built").unwrap();

        let (_scripts, ws) = scaffold(
            "",
            &[("build", format!("# @outputs: {}\nexit 1\n", output.display()))],
        );
        let command = ws.registry.lookup("build").unwrap();

        run(&ws, &progress(), &command, &[], false).unwrap();
        run(&ws, &progress(), &command, &[], false).unwrap();
    }

    #[test]
    fn test_missing_output_runs_the_command() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("bin");

        let (_scripts, ws) = scaffold(
            "",
            &[(
                "build",
                format!("# @outputs: {}\nprintf built > {}\n", output.display(), output.display()),
            )],
        );
        let command = ws.registry.lookup("build").unwrap();

        run(&ws, &progress(), &command, &[], false).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "built");
    }

    #[test]
    fn test_unknown_dependency_is_an_error() {
        let (_dir, ws) = scaffold(
            "",
            &[("build", "# @deps: nonexistent\necho build\n".to_string())],
        );
        let command = ws.registry.lookup("build").unwrap();

        let err = run(&ws, &progress(), &command, &[], false).unwrap_err();
        let execution_error = err.downcast_ref::<ExecutionError>().unwrap();
        assert!(matches!(
            execution_error,
            ExecutionError::InvalidDependency(name) if name == "nonexistent"
        ));
    }

    #[test]
    fn test_dependency_with_missing_output_runs_first() {
        let dir = TempDir::new().unwrap();
        let generated = dir.path().join("generated.txt");
        let marker = dir.path().join("order.txt");

        let (_scripts, ws) = scaffold(
            "",
            &[
                (
                    "generate",
                    format!(
                        "# @outputs: {}\nprintf gen > {}\nprintf 'generate\\n' >> {}\n",
                        generated.display(),
                        generated.display(),
                        marker.display()
                    ),
                ),
                (
                    "build",
                    format!(
                        "# @deps: generate\nprintf 'build\\n' >> {}\n",
                        marker.display()
                    ),
                ),
            ],
        );
        let command = ws.registry.lookup("build").unwrap();

        run(&ws, &progress(), &command, &[], false).unwrap();

        assert_eq!(fs::read_to_string(&marker).unwrap(), "generate\nbuild\n");
    }

    #[test]
    fn test_dependency_without_outputs_is_never_triggered() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("dep.txt");

        let (_scripts, ws) = scaffold(
            "",
            &[
                ("helper", format!("printf ran > {}\n", marker.display())),
                ("build", "# @deps: helper\necho build\n".to_string()),
            ],
        );
        let command = ws.registry.lookup("build").unwrap();

        run(&ws, &progress(), &command, &[], false).unwrap();
        assert!(!marker.exists());
    }

    #[test]
    fn test_dependency_with_satisfied_outputs_is_skipped() {
        let dir = TempDir::new().unwrap();
        let generated = dir.path().join("generated.txt");
        let marker = dir.path().join("dep.txt");
        fs::write(&generated, "cached").unwrap();

        let (_scripts, ws) = scaffold(
            "",
            &[
                (
                    "generate",
                    format!(
                        "# @outputs: {}\nprintf ran > {}\n",
                        generated.display(),
                        marker.display()
                    ),
                ),
                ("build", "# @deps: generate\necho build\n".to_string()),
            ],
        );
        let command = ws.registry.lookup("build").unwrap();

        run(&ws, &progress(), &command, &[], false).unwrap();
        assert!(!marker.exists());
    }

    #[test]
    fn test_missing_mandatory_argument_fails_before_spawn() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("ran.txt");
        let (_scripts, ws) = scaffold(
            "",
            &[(
                "deploy",
                format!("# @args: env:string\nprintf ran > {}\n", marker.display()),
            )],
        );
        let command = ws.registry.lookup("deploy").unwrap();

        let err = run(&ws, &progress(), &command, &[], false).unwrap_err();
        assert!(err
            .downcast_ref::<arguments::ArgumentError>()
            .is_some());
        assert!(!marker.exists());
    }

    #[test]
    fn test_failing_script_surfaces_nonzero_exit() {
        let (_dir, ws) = scaffold(
            "dump_script_on_error = false\n",
            &[("boom", "exit 7\n".to_string())],
        );
        let command = ws.registry.lookup("boom").unwrap();

        let err = run(&ws, &progress(), &command, &[], false).unwrap_err();
        let execution_error = err.downcast_ref::<ExecutionError>().unwrap();
        assert!(matches!(
            execution_error,
            ExecutionError::NonZeroExitStatus(name) if name == "boom"
        ));
        // The failed child is no longer tracked.
        assert!(ws.processes.is_empty());
    }

    #[test]
    fn test_build_number_increments_on_run() {
        let (_dir, ws) = scaffold(
            "",
            &[("release", "# @build-number: true\necho release\n".to_string())],
        );
        let command = ws.registry.lookup("release").unwrap();

        assert_eq!(ws.project.build_number(), 0);
        run(&ws, &progress(), &command, &[], false).unwrap();
        assert_eq!(ws.project.build_number(), 1);
    }

    #[test]
    fn test_globals_and_arg_buffer_prefix_the_script() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("combined.txt");
        let (_scripts, ws) = scaffold(
            "",
            &[(
                "combine",
                format!(
                    "# @args: suffix:string?=end\nprintf '%s-%s' \"$PRELUDE\" \"$suffix\" > {}\n",
                    marker.display()
                ),
            )],
        );
        ws.set_globals(b"PRELUDE=shared\n\n".to_vec());
        let command = ws.registry.lookup("combine").unwrap();

        run(&ws, &progress(), &command, &[], false).unwrap();
        assert_eq!(fs::read_to_string(&marker).unwrap(), "shared-end");
    }

    #[test]
    fn test_assemble_respects_stop_on_error_and_interpreter() {
        let (_dir, ws) = scaffold(
            "stop_on_error = true\ninterpreter = \"sh\"\n",
            &[("build", "echo build\n".to_string())],
        );
        let command = ws.registry.lookup("build").unwrap();

        let (shell_command, script) = assemble_command(&ws, &command, "n=1\n").unwrap();
        assert_eq!(&shell_command[..3], &["sh", "-e", "-c"]);
        assert!(script.starts_with("n=1\n"));
        assert!(script.contains("echo build"));
    }

    #[test]
    fn test_assemble_prepends_multiplexer_for_async() {
        let (_dir, ws) = scaffold(
            "",
            &[("watch", "# @async: true\necho watching\n".to_string())],
        );
        let command = ws.registry.lookup("watch").unwrap();

        let (shell_command, _script) = assemble_command(&ws, &command, "").unwrap();
        assert_eq!(
            &shell_command[..5],
            &["screen", "-L", "-S", "watch", "-dm"]
        );
        assert_eq!(&shell_command[5..7], &["sh", "-c"]);
    }

    #[test]
    fn test_inline_body_is_used_when_present() {
        let (_dir, ws) = scaffold("", &[]);
        let command = Command {
            name: "inline".to_string(),
            run_command: Some("echo inline".to_string()),
            ..Command::default()
        };

        let (_shell_command, script) = assemble_command(&ws, &command, "a=1\n").unwrap();
        assert_eq!(script, "a=1\n\necho inline");
    }

    #[test]
    fn test_command_without_body_or_script_is_rejected() {
        let (_dir, ws) = scaffold("", &[]);
        let command = Command {
            name: "ghost".to_string(),
            ..Command::default()
        };

        let err = assemble_command(&ws, &command, "").unwrap_err();
        assert!(matches!(err, ExecutionError::MissingBody(name) if name == "ghost"));
    }
}
