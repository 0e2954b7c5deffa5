//! # Generic gRPC Client
//!
//! This module wraps a standard `tonic` client to provide a generic interface for
//! unary gRPC communication. It is agnostic to the specific Protobuf messages being
//! exchanged.
//!
//! The [`GrpcClient`] uses the [`super::codec::DynamicCodec`] for serialization: it
//! never needs to know the structure of the data it is sending, it simply ensures
//! the connection is ready, builds the HTTP/2 path (e.g., `/package.Service/Method`)
//! at runtime and hands the message plus its [`MethodDescriptor`] to the codec.
use super::codec::DynamicCodec;
use crate::BoxError;
use http_body::Body as HttpBody;
use prost_reflect::{DynamicMessage, MethodDescriptor};
use std::str::FromStr;
use tonic::{client::GrpcService, transport::Channel};

#[derive(thiserror::Error, Debug)]
pub enum GrpcRequestError {
    #[error("Internal error, the client was not ready: '{0}'")]
    ClientNotReady(#[source] BoxError),
}

/// A generic client performing unary gRPC calls with runtime-resolved schemas.
#[derive(Debug, Clone)]
pub struct GrpcClient<S = Channel> {
    client: tonic::client::Grpc<S>,
}

impl<S> GrpcClient<S>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    pub fn new(service: S) -> Self {
        let client = tonic::client::Grpc::new(service);
        Self { client }
    }

    /// Performs a Unary gRPC call (Single Request -> Single Response).
    ///
    /// # Returns
    /// * `Ok(Ok(message))` - Successful RPC execution.
    /// * `Ok(Err(Status))` - RPC reached the transport, but the call failed.
    /// * `Err(GrpcRequestError)` - The underlying service never became ready.
    pub async fn unary(
        &mut self,
        method: MethodDescriptor,
        request: DynamicMessage,
    ) -> Result<Result<DynamicMessage, tonic::Status>, GrpcRequestError> {
        self.client
            .ready()
            .await
            .map_err(|e| GrpcRequestError::ClientNotReady(e.into()))?;

        let codec = DynamicCodec::new(method.input(), method.output());
        let path = http_path(&method);

        match self
            .client
            .unary(tonic::Request::new(request), path, codec)
            .await
        {
            Ok(response) => Ok(Ok(response.into_inner())),
            Err(status) => Ok(Err(status)),
        }
    }
}

fn http_path(method: &MethodDescriptor) -> http::uri::PathAndQuery {
    let path = format!("/{}/{}", method.parent_service().full_name(), method.name());
    http::uri::PathAndQuery::from_str(&path).expect("valid gRPC path")
}
