use super::protocol::{self, Event, Request};
use super::{Artifact, BundleError, BundleOutput, BundleRequest, Bundler};
use crate::loader::ModuleLoader;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::Arc;

const DRIVER_SOURCE: &str = include_str!("driver.mjs");
const DRIVER_FILE: &str = "esbuild-driver.mjs";

/// Bundles with esbuild, hosted in a node driver process.
///
/// The driver is written into the request's working directory so `esbuild`
/// resolves from the site's own `node_modules`.
pub struct EsbuildBundler {
    node: PathBuf,
    session: Option<Session>,
}

impl EsbuildBundler {
    /// Use `node` to run the driver.
    pub fn new(node: impl Into<PathBuf>) -> Self {
        Self {
            node: node.into(),
            session: None,
        }
    }
}

impl Bundler for EsbuildBundler {
    fn build(
        &mut self,
        request: &BundleRequest,
        loader: Arc<dyn ModuleLoader>,
    ) -> Result<BundleOutput, BundleError> {
        self.dispose();

        let mut session = Session::spawn(&self.node, &request.working_dir, loader)?;
        let id = session.next_id();
        let output = session.run(Request::Build {
            id,
            options: protocol::esbuild_options(request),
            incremental: request.incremental,
        });

        if request.incremental && output.is_ok() {
            self.session = Some(session);
        } else {
            session.close();
        }
        output
    }

    fn rebuild(&mut self) -> Result<BundleOutput, BundleError> {
        let session = self.session.as_mut().ok_or(BundleError::NoSession)?;
        let id = session.next_id();
        session.run(Request::Rebuild { id })
    }

    fn dispose(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
        }
    }
}

impl Drop for EsbuildBundler {
    fn drop(&mut self) {
        self.dispose();
    }
}

struct Session {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    loader: Arc<dyn ModuleLoader>,
    next_id: u64,
}

impl Session {
    fn spawn(
        node: &Path,
        working_dir: &Path,
        loader: Arc<dyn ModuleLoader>,
    ) -> Result<Self, BundleError> {
        fs::create_dir_all(working_dir)?;
        let driver = working_dir.join(DRIVER_FILE);
        fs::write(&driver, DRIVER_SOURCE)?;

        let mut child = Command::new(node)
            .arg(&driver)
            .current_dir(working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(BundleError::Spawn)?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(BundleError::Protocol("driver stdio is not piped".to_string()));
        };
        log::debug!("started esbuild driver (pid {})", child.id());

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            loader,
            next_id: 0,
        })
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn send(&mut self, request: &Request) -> Result<(), BundleError> {
        self.stdin.write_all(protocol::encode(request)?.as_bytes())?;
        self.stdin.flush()?;
        Ok(())
    }

    /// Send `request` and serve load requests until its result arrives.
    fn run(&mut self, request: Request) -> Result<BundleOutput, BundleError> {
        let expected = match &request {
            Request::Build { id, .. } | Request::Rebuild { id } => *id,
            _ => return Err(BundleError::Protocol("not a build request".to_string())),
        };
        self.send(&request)?;

        let mut line = String::new();
        loop {
            line.clear();
            if self.stdout.read_line(&mut line)? == 0 {
                return Err(BundleError::Exited);
            }
            if line.trim().is_empty() {
                continue;
            }

            match protocol::decode(line.trim())? {
                Event::Load { id, path } => {
                    let loaded = self.loader.load(&path);
                    self.send(&Request::Loaded {
                        id,
                        contents: loaded.contents,
                        errors: loaded.diagnostics.errors,
                        warnings: loaded.diagnostics.warnings,
                    })?;
                }
                Event::Done {
                    id,
                    errors,
                    warnings,
                    outputs,
                } if id == expected => {
                    if !errors.is_empty() {
                        return Err(BundleError::Failed { errors, warnings });
                    }
                    return Ok(BundleOutput {
                        artifacts: outputs.into_iter().map(Artifact::from).collect(),
                        warnings,
                    });
                }
                Event::Done { id, .. } => {
                    return Err(BundleError::Protocol(format!(
                        "result for build {id} while waiting for {expected}"
                    )));
                }
            }
        }
    }

    fn close(mut self) {
        let _ = self.send(&Request::Dispose);
        let Session {
            mut child, stdin, ..
        } = self;
        drop(stdin);
        if let Err(err) = child.wait() {
            log::warn!("esbuild driver did not exit cleanly: {err}");
        }
    }
}
