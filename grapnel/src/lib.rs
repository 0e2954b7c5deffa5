//! # Grapnel
//!
//! `grapnel` lets automated test suites invoke arbitrary gRPC methods dynamically.
//! It discovers message schemas at runtime through the gRPC Server Reflection
//! Protocol, so test code never has to compile Protobuf definitions ahead of time.
//!
//! ## Key Components
//!
//! * **[`Invoker`](invoker::Invoker):** The main entry point. It owns the transport
//!   channel, resolves method schemas via reflection and performs generic unary
//!   calls, taking JSON in and returning formatted JSON out.
//! * **[`Reporter`](report::Reporter):** A pluggable observer that receives a
//!   human-readable artifact for every request and response, so calls show up in
//!   test reports. The default implementation mirrors artifacts to standard output.
//!
//! ## Internal clients
//!
//! The lower-level pieces are exposed as well, in case a test harness wants to
//! talk to a reflection service or perform raw dynamic calls directly:
//!
//! * **[`GrpcClient`](grpc::client::GrpcClient):** A generic unary gRPC client
//!   moving [`prost_reflect::DynamicMessage`] values over the wire.
//! * **[`ReflectionClient`](reflection::client::ReflectionClient):** A
//!   `grpc.reflection.v1` client that assembles complete `FileDescriptorSet`s.
//!
//! ## Example
//!
//! ```rust,no_run
//! use grapnel::invoker::Invoker;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut invoker = Invoker::connect("localhost:50051", None).await?;
//! let response = invoker
//!     .send_request(
//!         "echo.EchoService",
//!         "Echo",
//!         serde_json::json!({ "message": "hi" }),
//!     )
//!     .await?;
//! println!("{response}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports `prost`, `prost-reflect`, and `tonic` to ensure that
//! consumers use compatible versions of these underlying dependencies.
pub mod grpc;
pub mod invoker;
pub mod reflection;
pub mod report;

// Re-exports
pub use prost;
pub use prost_reflect;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
