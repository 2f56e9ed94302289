//! Scripted fakes for the transport and subprocess seams.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use config::Config;
use pipeline::process::{CommandError, CommandOutput, CommandRunner, Invocation};
use registry::ModelDescriptor;
use transport::{HttpRequest, HttpResponse, Method, Transport, TransportError};

pub const SPEC_BASE: &str = "http://models.test";
pub const CONVERTER_BASE: &str = "http://converter.test/api";
pub const RAW_JSON: &str = r#"{"swagger":"2.0","info":{"title":"x","version":"1"}}"#;
pub const YAML: &str = "openapi: 3.0.1\ninfo:\n  title: x\n  version: \"1\"\n";

/// Canned behaviour for a route.
#[derive(Clone)]
pub enum Reply {
    Respond(HttpResponse),
    Timeout,
    Refused,
}

pub fn ok(body: &str) -> Reply { Reply::Respond(HttpResponse::ok(body)) }

pub fn status(code: u16, reason: &str) -> Reply {
    Reply::Respond(HttpResponse::new(code, reason, ""))
}

/// Routes requests by method and URL prefix; unmatched requests get a 404.
#[derive(Default)]
pub struct FakeTransport {
    routes: Vec<(Method, String, Reply)>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self { Self::default() }

    pub fn route(mut self, method: Method, url_prefix: &str, reply: Reply) -> Self {
        self.routes.push((method, url_prefix.to_string(), reply));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn count(&self, method: Method, url_prefix: &str) -> usize {
        self.requests().iter().filter(|r| r.method == method && r.url.starts_with(url_prefix)).count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().expect("requests lock").push(request.clone());
        let reply = self
            .routes
            .iter()
            .find(|(m, prefix, _)| *m == request.method && request.url.starts_with(prefix))
            .map(|(_, _, reply)| reply.clone());
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Timeout) => {
                Err(TransportError::Timeout { url: request.url, timeout: request.timeout })
            }
            Some(Reply::Refused) => Err(TransportError::Http("connection refused".to_string())),
            None => Ok(HttpResponse::new(404, "Not Found", "")),
        }
    }

    fn name(&self) -> &str { "fake" }
}

/// Records invocations; fails those whose rendering contains a configured
/// needle and creates files for those matching a `creates` needle.
#[derive(Default)]
pub struct FakeRunner {
    fail_when: Vec<String>,
    creates: Vec<(String, PathBuf)>,
    calls: Mutex<Vec<Invocation>>,
}

impl FakeRunner {
    pub fn new() -> Self { Self::default() }

    pub fn fail_when(mut self, needle: &str) -> Self {
        self.fail_when.push(needle.to_string());
        self
    }

    pub fn creates(mut self, needle: &str, path: impl Into<PathBuf>) -> Self {
        self.creates.push((needle.to_string(), path.into()));
        self
    }

    pub fn calls(&self) -> Vec<Invocation> { self.calls.lock().expect("calls lock").clone() }

    pub fn calls_to(&self, program: &Path) -> Vec<Invocation> {
        self.calls().into_iter().filter(|c| c.program == program).collect()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        self.calls.lock().expect("calls lock").push(invocation.clone());
        let command = invocation.to_string();
        if self.fail_when.iter().any(|needle| command.contains(needle.as_str())) {
            return Err(CommandError::Failed {
                command,
                status: "exit code 1".to_string(),
                stderr: "simulated failure".to_string(),
            });
        }
        for (needle, path) in &self.creates {
            if command.contains(needle.as_str()) {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).expect("create parent");
                }
                std::fs::write(path, b"#!/bin/sh\n").expect("create file");
            }
        }
        Ok(CommandOutput::default())
    }
}

/// Path of the fake generator inside `root`.
pub fn generator_path(root: &Path) -> PathBuf { root.join("bin").join("oapi-codegen") }

/// Put a placeholder generator in place so installation is skipped.
pub fn install_fake_generator(root: &Path) -> PathBuf {
    let path = generator_path(root);
    std::fs::create_dir_all(path.parent().expect("bin dir")).expect("create bin dir");
    std::fs::write(&path, b"#!/bin/sh\n").expect("write fake generator");
    path
}

/// A config pointing at the fakes, with a single `x.json` model.
pub fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.workspace.root = root.to_path_buf();
    config.sources.base_url = SPEC_BASE.to_string();
    config.converter.base_url = CONVERTER_BASE.to_string();
    config.generator.executable = Some(generator_path(root));
    config.models = vec![ModelDescriptor::new("x.json", "p/x.json", "out/x")];
    config
}

/// Transport answering the nominal path for `x.json`.
pub fn nominal_transport() -> FakeTransport {
    FakeTransport::new()
        .route(Method::Get, &format!("{}/p/x.json", SPEC_BASE), ok(RAW_JSON))
        .route(Method::Get, &format!("{}/convert?", CONVERTER_BASE), ok(YAML))
}
