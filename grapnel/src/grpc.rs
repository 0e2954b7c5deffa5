//! # Generic gRPC Transport
//!
//! This module provides the pieces needed to move Protobuf messages over the wire
//! without compile-time knowledge of their schema: a generic unary client and a
//! `tonic` codec driven by runtime-resolved message descriptors.
pub mod client;
pub mod codec;
