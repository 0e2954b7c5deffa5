//! # Server Reflection
//!
//! This module contains the logic necessary to interact with the gRPC Server Reflection Protocol.
//!
//! It enables the invoker to query a server for its own Protobuf schema at runtime, so test
//! suites can call services without pre-compiled descriptors.
pub mod client;
