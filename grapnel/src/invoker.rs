//! # Dynamic RPC Invoker
//!
//! This module implements the high-level logic for executing dynamic gRPC requests
//! from test suites.
//!
//! An [`Invoker`] binds to exactly one remote address and one trust configuration
//! for its entire lifetime. On every call it resolves the method schema fresh via
//! Server Reflection, binds the caller's JSON payload to the resolved input type,
//! performs a single unary call and hands back the response as indented JSON text,
//! notifying its [`Reporter`] along the way so the exchange shows up in test
//! reports.
//!
//! ## Example
//!
//! ```rust,no_run
//! use grapnel::invoker::Invoker;
//! use std::path::Path;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! // Plaintext channel
//! let mut invoker = Invoker::connect("localhost:50051", None).await?;
//!
//! // TLS channel with a custom trust root
//! let mut secure = Invoker::connect("api.internal:443", Some(Path::new("ca.pem"))).await?;
//!
//! let body = invoker
//!     .send_request("echo.EchoService", "Echo", serde_json::json!({"message": "hi"}))
//!     .await?;
//! # Ok(())
//! # }
//! ```
use crate::{
    BoxError,
    grpc::client::{GrpcClient, GrpcRequestError},
    reflection::client::{ReflectionClient, ReflectionResolveError},
};
use http_body::Body as HttpBody;
use prost_reflect::{DescriptorPool, DynamicMessage, MethodDescriptor};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};
use tonic::{
    Code,
    client::GrpcService,
    transport::{Certificate, Channel, ClientTlsConfig, Endpoint},
};

use crate::report::{ContentKind, Reporter, StdoutReporter};

/// Label of the report artifact carrying the outgoing call rendering.
pub const REQUEST_ATTACHMENT: &str = "gRPC Request";
/// Label of the report artifact carrying the formatted response.
pub const RESPONSE_ATTACHMENT: &str = "gRPC Response";

/// Errors that can occur when constructing an [`Invoker`].
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Failed to read trust root '{0}': {1}")]
    ReadTrustRoot(PathBuf, #[source] std::io::Error),
    #[error("Invalid address '{0}': {1}")]
    InvalidAddress(String, #[source] tonic::transport::Error),
    #[error("Invalid TLS configuration: {0}")]
    InvalidTlsConfig(#[source] tonic::transport::Error),
    #[error("Failed to connect to '{0}': {1}")]
    ConnectionFailed(String, #[source] tonic::transport::Error),
}

/// Errors that can occur while resolving a method schema via reflection.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Service '{0}' not found")]
    ServiceNotFound(String),
    #[error("Method '{0}' not found in service '{1}'")]
    MethodNotFound(String, String),
    #[error("Reflection resolution failed: '{0}'")]
    Reflection(#[from] ReflectionResolveError),
    #[error("Failed to decode file descriptor set: '{0}'")]
    Descriptor(#[from] prost_reflect::DescriptorError),
}

/// Errors that can occur during [`Invoker::send_request`].
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("Payload does not match schema of '{message}': {source}")]
    MalformedPayload {
        message: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("gRPC transport failure: '{0}'")]
    Transport(#[from] GrpcRequestError),
    #[error("Failed to decode response: '{0}'")]
    Decode(#[source] tonic::Status),
    #[error("RPC failed with status '{0}'")]
    Rpc(tonic::Status),
    #[error("Failed to render response as JSON: '{0}'")]
    ResponseFormat(#[from] serde_json::Error),
}

/// A dynamic gRPC invoker bound to a single remote endpoint.
///
/// The generic parameter `S` is the underlying transport; it defaults to a tonic
/// [`Channel`] and can be any cloneable `GrpcService` (e.g. in-process
/// [`Routes`](tonic::service::Routes) in tests).
pub struct Invoker<S = Channel> {
    address: String,
    cert_path: Option<PathBuf>,
    reflection_client: ReflectionClient<S>,
    grpc_client: GrpcClient<S>,
    reporter: Arc<dyn Reporter>,
}

impl Invoker<Channel> {
    /// Opens a channel to `address` (`host:port`) and binds an invoker to it.
    ///
    /// Without a `cert_path` the channel is plaintext. With one, the file is read
    /// as a PEM trust root and the channel is TLS-secured, authenticating the
    /// server against that root. An unreadable file fails construction before any
    /// channel is created.
    pub async fn connect(
        address: &str,
        cert_path: Option<&Path>,
    ) -> Result<Self, ConnectError> {
        let tls_config = match cert_path {
            Some(path) => {
                let pem = std::fs::read(path)
                    .map_err(|e| ConnectError::ReadTrustRoot(path.to_path_buf(), e))?;
                Some(ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem)))
            }
            None => None,
        };

        let scheme = if tls_config.is_some() { "https" } else { "http" };
        let uri = format!("{scheme}://{address}");

        let mut endpoint = Endpoint::new(uri)
            .map_err(|e| ConnectError::InvalidAddress(address.to_string(), e))?;

        if let Some(tls_config) = tls_config {
            endpoint = endpoint
                .tls_config(tls_config)
                .map_err(ConnectError::InvalidTlsConfig)?;
        }

        let channel = endpoint
            .connect()
            .await
            .map_err(|e| ConnectError::ConnectionFailed(address.to_string(), e))?;

        let mut invoker = Self::from_service(channel, address);
        invoker.cert_path = cert_path.map(Path::to_path_buf);
        Ok(invoker)
    }
}

impl<S> Invoker<S>
where
    S: GrpcService<tonic::body::Body> + Clone,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    /// Creates an invoker from an existing tonic service/channel.
    ///
    /// `address` is only used for report artifacts, the service itself decides
    /// where requests actually go.
    pub fn from_service(service: S, address: impl Into<String>) -> Self {
        let reflection_client = ReflectionClient::new(service.clone());
        let grpc_client = GrpcClient::new(service);
        Self {
            address: address.into(),
            cert_path: None,
            reflection_client,
            grpc_client,
            reporter: Arc::new(StdoutReporter),
        }
    }

    /// Replaces the reporting collaborator (default: [`StdoutReporter`]).
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Lists all services exposed by the remote reflection service.
    pub async fn list_services(&mut self) -> Result<Vec<String>, ResolveError> {
        Ok(self.reflection_client.list_services().await?)
    }

    /// Resolves the schema of `service_name`/`method_name` via Server Reflection.
    ///
    /// One reflection round trip per call, no cross-call caching: the descriptor
    /// set containing the service is fetched, a pool is built from it and the
    /// service's method list is scanned for an exact name match.
    pub async fn resolve_method(
        &mut self,
        service_name: &str,
        method_name: &str,
    ) -> Result<MethodDescriptor, ResolveError> {
        let fd_set = self
            .reflection_client
            .file_descriptor_set_by_symbol(service_name)
            .await
            .map_err(|err| match err {
                ReflectionResolveError::ServerStreamFailure(status)
                    if status.code() == Code::NotFound =>
                {
                    ResolveError::ServiceNotFound(service_name.to_string())
                }
                err => ResolveError::Reflection(err),
            })?;

        let pool = DescriptorPool::from_file_descriptor_set(fd_set)?;

        let service = pool
            .get_service_by_name(service_name)
            .ok_or_else(|| ResolveError::ServiceNotFound(service_name.to_string()))?;

        service
            .methods()
            .find(|m| m.name() == method_name)
            .ok_or_else(|| {
                ResolveError::MethodNotFound(method_name.to_string(), service_name.to_string())
            })
    }

    /// Executes one unary gRPC call and returns the response as indented JSON.
    ///
    /// The method schema is resolved fresh, the payload is bound to the input type
    /// before anything is sent, and both the outgoing call and the formatted
    /// response are attached to the configured [`Reporter`]. The returned string
    /// uses a 2-space indent and leaves non-ASCII text unescaped.
    ///
    /// No retries, no timeouts: the call either completes or the first failure
    /// propagates to the caller.
    pub async fn send_request(
        &mut self,
        service_name: &str,
        method_name: &str,
        payload: serde_json::Value,
    ) -> Result<String, InvokeError> {
        let title = format!("gRPC Request -> {}", self.address);
        let reporter = Arc::clone(&self.reporter);

        reporter.step_started(&title);
        let started = Instant::now();
        let result = self.dispatch(service_name, method_name, payload).await;
        reporter.step_finished(&title, started.elapsed());

        result
    }

    async fn dispatch(
        &mut self,
        service_name: &str,
        method_name: &str,
        payload: serde_json::Value,
    ) -> Result<String, InvokeError> {
        let method = self.resolve_method(service_name, method_name).await?;

        let artifact = render_request_artifact(
            &self.address,
            self.cert_path.as_deref(),
            service_name,
            method_name,
            &payload,
        );

        // Bind the payload to the input schema before touching the network.
        let request =
            DynamicMessage::deserialize(method.input(), payload).map_err(|source| {
                InvokeError::MalformedPayload {
                    message: method.input().full_name().to_string(),
                    source,
                }
            })?;

        self.reporter
            .attach(REQUEST_ATTACHMENT, ContentKind::Text, &artifact);

        let response = match self.grpc_client.unary(method, request).await? {
            Ok(message) => message,
            Err(status) if status.code() == Code::DataLoss => {
                return Err(InvokeError::Decode(status));
            }
            Err(status) => return Err(InvokeError::Rpc(status)),
        };

        let value = serde_json::to_value(&response)?;
        let formatted = serde_json::to_string_pretty(&value)?;

        self.reporter
            .attach(RESPONSE_ATTACHMENT, ContentKind::Text, &formatted);

        Ok(formatted)
    }
}

/// Renders the outgoing call as a `grpcurl` command line, the shape testers are
/// used to copy-pasting from reports.
fn render_request_artifact(
    address: &str,
    cert_path: Option<&Path>,
    service_name: &str,
    method_name: &str,
    payload: &serde_json::Value,
) -> String {
    let trust = match cert_path {
        Some(path) => format!("-cacert {}", path.display()),
        None => "-plaintext".to_string(),
    };

    format!("grpcurl {trust} -d '{payload}' {address} {service_name}/{method_name}")
}

#[cfg(test)]
mod tests {
    use super::render_request_artifact;
    use std::path::Path;

    #[test]
    fn renders_plaintext_call() {
        let rendered = render_request_artifact(
            "localhost:50051",
            None,
            "echo.EchoService",
            "Echo",
            &serde_json::json!({ "message": "hi" }),
        );

        assert_eq!(
            rendered,
            r#"grpcurl -plaintext -d '{"message":"hi"}' localhost:50051 echo.EchoService/Echo"#
        );
    }

    #[test]
    fn renders_trust_root_reference() {
        let rendered = render_request_artifact(
            "api.internal:443",
            Some(Path::new("certs/ca.pem")),
            "echo.EchoService",
            "Echo",
            &serde_json::json!({}),
        );

        assert_eq!(
            rendered,
            "grpcurl -cacert certs/ca.pem -d '{}' api.internal:443 echo.EchoService/Echo"
        );
    }
}
