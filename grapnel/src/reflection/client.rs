//! # Reflection Client
//!
//! A client implementation for `grpc.reflection.v1`.
//!
//! This client is responsible for building a complete `FileDescriptorSet` by querying
//! a server that supports reflection. It handles the complexity of dependency management
//! by inspecting imports and recursively fetching missing files until the entire schema
//! tree for a requested symbol is resolved.
//!
//! The protocol types come from the `tonic-reflection` crate, which ships the generated
//! bindings for `grpc.reflection.v1` under its `pb` module.
//!
//! ## References
//!
//! * [gRPC Server Reflection Protocol](https://github.com/grpc/grpc/blob/master/doc/server-reflection.md)
use crate::BoxError;
use futures_util::stream::once;
use http_body::Body as HttpBody;
use prost::Message;
use prost_types::{FileDescriptorProto, FileDescriptorSet};
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::Channel;
use tonic::{Streaming, client::GrpcService};
use tonic_reflection::pb::v1::{
    ServerReflectionRequest, ServerReflectionResponse,
    server_reflection_client::ServerReflectionClient, server_reflection_request::MessageRequest,
    server_reflection_response::MessageResponse,
};

#[derive(Debug, thiserror::Error)]
pub enum ReflectionResolveError {
    #[error(
        "Failed to start a stream request with the reflection server, reflection might not be supported: '{0}'"
    )]
    ServerStreamInitFailed(#[source] tonic::Status),

    #[error("The server stream returned an error status: '{0}'")]
    ServerStreamFailure(#[source] tonic::Status),

    #[error("Reflection stream closed unexpectedly")]
    StreamClosed,

    #[error("Internal error: Failed to send request to stream")]
    SendFailed,

    #[error("Server returned reflection error code {code}: {message}")]
    ServerError { code: i32, message: String },

    #[error("Protocol error: Received unexpected response type: {0}")]
    UnexpectedResponseType(String),

    #[error("Failed to decode FileDescriptorProto: {0}")]
    DecodeError(#[from] prost::DecodeError),
}

// The host field of a reflection request is undocumented and servers ignore it.
const EMPTY_HOST: &str = "";

fn request_for(message_request: MessageRequest) -> ServerReflectionRequest {
    ServerReflectionRequest {
        host: EMPTY_HOST.to_string(),
        message_request: Some(message_request),
    }
}

/// A client for the gRPC Server Reflection Protocol, generic over the underlying
/// transport so it works against a live [`Channel`] or an in-process service.
#[derive(Debug, Clone)]
pub struct ReflectionClient<T = Channel> {
    client: ServerReflectionClient<T>,
}

impl<S> ReflectionClient<S>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    pub fn new(service: S) -> Self {
        let client = ServerReflectionClient::new(service);
        Self { client }
    }

    /// Asks the reflection service for the file containing the requested symbol
    /// (e.g., `my.package.MyService`) and every file it transitively imports.
    ///
    /// The server only ever answers with single `FileDescriptorProto`s, so the client
    /// inspects the imports of each received file and keeps requesting the missing
    /// ones over the same stream until the whole schema tree is collected.
    ///
    /// # Returns
    ///
    /// * `Ok(fd_set)` - The complete descriptor set for the symbol.
    /// * `Err(ReflectionResolveError)` - Failed to request file descriptors from the reflection service.
    pub async fn file_descriptor_set_by_symbol(
        &mut self,
        symbol: &str,
    ) -> Result<FileDescriptorSet, ReflectionResolveError> {
        let (tx, rx) = mpsc::channel(100);

        let response_stream = self
            .client
            .server_reflection_info(ReceiverStream::new(rx))
            .await
            .map_err(ReflectionResolveError::ServerStreamInitFailed)?
            .into_inner();

        tx.send(request_for(MessageRequest::FileContainingSymbol(
            symbol.to_string(),
        )))
        .await
        .map_err(|_| ReflectionResolveError::SendFailed)?;

        let collector = DescriptorCollector::new(response_stream, tx);
        let files = collector.run().await?;

        Ok(FileDescriptorSet {
            file: files.into_values().collect(),
        })
    }

    /// Lists all services exposed by the server.
    pub async fn list_services(&mut self) -> Result<Vec<String>, ReflectionResolveError> {
        let req = request_for(MessageRequest::ListServices(String::new()));

        let mut response_stream = self
            .client
            .server_reflection_info(once(async { req }))
            .await
            .map_err(ReflectionResolveError::ServerStreamInitFailed)?
            .into_inner();

        let response = response_stream
            .message()
            .await
            .map_err(ReflectionResolveError::ServerStreamFailure)?
            .ok_or(ReflectionResolveError::StreamClosed)?;

        match response.message_response {
            Some(MessageResponse::ListServicesResponse(resp)) => {
                Ok(resp.service.into_iter().map(|s| s.name).collect())
            }
            other => Err(unexpected_response(other)),
        }
    }
}

fn unexpected_response(response: Option<MessageResponse>) -> ReflectionResolveError {
    match response {
        Some(MessageResponse::ErrorResponse(e)) => ReflectionResolveError::ServerError {
            code: e.error_code,
            message: e.error_message,
        },
        Some(other) => ReflectionResolveError::UnexpectedResponseType(format!("{other:?}")),
        None => ReflectionResolveError::UnexpectedResponseType("Empty Message".into()),
    }
}

/// Drains the reflection stream, requesting unseen imports as they are discovered.
///
/// `inflight` tracks how many requests are still awaiting an answer; once a
/// response arrives for each request and no new imports remain, the stream is done.
struct DescriptorCollector {
    responses: Streaming<ServerReflectionResponse>,
    requests: mpsc::Sender<ServerReflectionRequest>,
    files: HashMap<String, FileDescriptorProto>,
    requested: HashSet<String>,
    inflight: usize,
}

impl DescriptorCollector {
    fn new(
        responses: Streaming<ServerReflectionResponse>,
        requests: mpsc::Sender<ServerReflectionRequest>,
    ) -> Self {
        Self {
            responses,
            requests,
            files: HashMap::new(),
            requested: HashSet::new(),
            inflight: 1,
        }
    }

    async fn run(
        mut self,
    ) -> Result<HashMap<String, FileDescriptorProto>, ReflectionResolveError> {
        while self.inflight > 0 {
            let response = self
                .responses
                .message()
                .await
                .map_err(ReflectionResolveError::ServerStreamFailure)?
                .ok_or(ReflectionResolveError::StreamClosed)?;

            self.inflight -= 1;

            match response.message_response {
                Some(MessageResponse::FileDescriptorResponse(res)) => {
                    self.collect_batch(res.file_descriptor_proto).await?;
                }
                other => return Err(unexpected_response(other)),
            }
        }

        Ok(self.files)
    }

    async fn collect_batch(
        &mut self,
        raw_protos: Vec<Vec<u8>>,
    ) -> Result<(), ReflectionResolveError> {
        for raw in raw_protos {
            let fd = FileDescriptorProto::decode(raw.as_ref())?;

            if let Some(name) = &fd.name
                && !self.files.contains_key(name)
            {
                self.request_missing_imports(&fd).await?;
                self.files.insert(name.clone(), fd);
            }
        }

        Ok(())
    }

    async fn request_missing_imports(
        &mut self,
        fd: &FileDescriptorProto,
    ) -> Result<(), ReflectionResolveError> {
        for dep in &fd.dependency {
            if !self.files.contains_key(dep) && self.requested.insert(dep.clone()) {
                self.requests
                    .send(request_for(MessageRequest::FileByFilename(dep.clone())))
                    .await
                    .map_err(|_| ReflectionResolveError::SendFailed)?;
                self.inflight += 1;
            }
        }

        Ok(())
    }
}
