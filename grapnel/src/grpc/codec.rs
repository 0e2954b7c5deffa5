//! # Dynamic Protobuf Codec
//!
//! An implementation of `tonic::codec::Codec` that works with
//! [`prost_reflect::DynamicMessage`] instead of generated Rust structs.
//!
//! Unlike tonic's `ProstCodec`, which relies on compile-time generated types, this
//! codec is built from a pair of runtime-resolved [`MessageDescriptor`]s, enabling
//! dynamic RPC invocation without pre-compiled service stubs.
//!
//! The encoder assumes its input message was already validated against the request
//! schema (the invoker binds the JSON payload before the call), so encoding is a
//! plain wire serialization. The decoder reports undecodable response bytes with a
//! `DataLoss` status so callers can tell schema violations apart from remote errors.
use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor};
use tonic::{
    Status,
    codec::{Codec, DecodeBuf, Decoder, EncodeBuf, Encoder},
};

/// A codec bridging [`DynamicMessage`] values and the Protobuf binary format.
///
/// It holds the descriptors (schemas) for both the request and the response messages,
/// allowing it to perform dynamic serialization.
pub struct DynamicCodec {
    /// Schema for the input message.
    req_desc: MessageDescriptor,
    /// Schema for the output message.
    res_desc: MessageDescriptor,
}

impl DynamicCodec {
    pub fn new(req_desc: MessageDescriptor, res_desc: MessageDescriptor) -> Self {
        Self { req_desc, res_desc }
    }
}

impl Codec for DynamicCodec {
    type Encode = DynamicMessage;
    type Decode = DynamicMessage;

    type Encoder = DynamicEncoder;
    type Decoder = DynamicDecoder;

    fn encoder(&mut self) -> Self::Encoder {
        DynamicEncoder(self.req_desc.clone())
    }

    fn decoder(&mut self) -> Self::Decoder {
        DynamicDecoder(self.res_desc.clone())
    }
}

/// Serializes a [`DynamicMessage`] into Protobuf wire bytes.
pub struct DynamicEncoder(MessageDescriptor);

impl Encoder for DynamicEncoder {
    type Item = DynamicMessage;
    type Error = Status;

    fn encode(&mut self, item: Self::Item, dst: &mut EncodeBuf<'_>) -> Result<(), Self::Error> {
        item.encode_raw(dst);
        Ok(())
    }
}

/// Decodes Protobuf wire bytes into a [`DynamicMessage`] of the response schema.
pub struct DynamicDecoder(MessageDescriptor);

impl Decoder for DynamicDecoder {
    type Item = DynamicMessage;
    type Error = Status;

    fn decode(&mut self, src: &mut DecodeBuf<'_>) -> Result<Option<Self::Item>, Self::Error> {
        let mut msg = DynamicMessage::new(self.0.clone());
        msg.merge(src).map_err(|e| {
            Status::data_loss(format!(
                "response bytes do not match schema '{}': {e}",
                self.0.full_name()
            ))
        })?;

        Ok(Some(msg))
    }
}
