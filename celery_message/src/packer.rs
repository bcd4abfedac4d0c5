use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// A failure serializing, compressing, encoding a value for the wire, or the
/// inverse on the way back in.
#[derive(Debug, Error)]
pub enum PackError {
    /// The value could not be turned into bytes by the configured serializer.
    #[error("serialization failed: {0}")]
    Serialize(String),

    /// The bytes could not be turned back into a value by the configured
    /// serializer.
    #[error("deserialization failed: {0}")]
    Deserialize(String),

    /// The configured compressor failed to compress or decompress the bytes.
    #[error("compression failed: {0}")]
    Compress(String),

    /// A `Plaintext`-encoded body was not valid UTF-8, which can only happen
    /// if it was paired with a non-identity compressor.
    #[error("plaintext encoding requires UTF-8 bytes, which only the identity compressor guarantees")]
    NotUtf8,

    /// A `Base64`-encoded body did not decode to valid base64.
    #[error("invalid base64: {0}")]
    Base64(String),
}

/// The value-to-bytes half of the packing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Serializer {
    /// `serde_json`, producing `application/json`.
    #[default]
    Json,
    /// `serde_yml`, producing `application/x-yaml`.
    Yaml,
}

impl Serializer {
    /// The MIME type this serializer's output is labeled with on the wire.
    pub fn content_type(self) -> &'static str {
        match self {
            Serializer::Json => "application/json",
            Serializer::Yaml => "application/x-yaml",
        }
    }

    fn serialize<T: Serialize>(self, value: &T) -> Result<Vec<u8>, PackError> {
        match self {
            Serializer::Json => {
                serde_json::to_vec(value).map_err(|e| PackError::Serialize(e.to_string()))
            }
            Serializer::Yaml => serde_yml::to_string(value)
                .map(String::into_bytes)
                .map_err(|e| PackError::Serialize(e.to_string())),
        }
    }

    fn deserialize<T: DeserializeOwned>(self, bytes: &[u8]) -> Result<T, PackError> {
        match self {
            Serializer::Json => {
                serde_json::from_slice(bytes).map_err(|e| PackError::Deserialize(e.to_string()))
            }
            Serializer::Yaml => {
                let text = std::str::from_utf8(bytes).map_err(|_| PackError::NotUtf8)?;
                serde_yml::from_str(text).map_err(|e| PackError::Deserialize(e.to_string()))
            }
        }
    }
}

/// The bytes-to-bytes compression stage of the packing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compressor {
    /// Pass-through; no compression.
    #[default]
    Identity,
    /// Raw zlib (`Content-Encoding: deflate`-style) compression.
    Zlib,
    /// Gzip compression.
    Gzip,
}

impl Compressor {
    fn compress(self, bytes: &[u8]) -> Result<Vec<u8>, PackError> {
        match self {
            Compressor::Identity => Ok(bytes.to_vec()),
            Compressor::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder
                    .write_all(bytes)
                    .and_then(|_| encoder.finish())
                    .map_err(|e| PackError::Compress(e.to_string()))
            }
            Compressor::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder
                    .write_all(bytes)
                    .and_then(|_| encoder.finish())
                    .map_err(|e| PackError::Compress(e.to_string()))
            }
        }
    }

    fn decompress(self, bytes: &[u8]) -> Result<Vec<u8>, PackError> {
        match self {
            Compressor::Identity => Ok(bytes.to_vec()),
            Compressor::Zlib => {
                let mut decoder = ZlibDecoder::new(bytes);
                let mut out = Vec::new();
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| PackError::Compress(e.to_string()))?;
                Ok(out)
            }
            Compressor::Gzip => {
                let mut decoder = GzDecoder::new(bytes);
                let mut out = Vec::new();
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| PackError::Compress(e.to_string()))?;
                Ok(out)
            }
        }
    }
}

/// The bytes-to-transport-string stage of the packing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoder {
    /// The compressed bytes are interpreted directly as a UTF-8 string. Only
    /// valid when paired with [`Compressor::Identity`] and a text-producing
    /// serializer.
    Plaintext,
    /// Standard base64, always round-trips regardless of compressor.
    #[default]
    Base64,
}

impl Encoder {
    /// The `body_encoding` value this encoder is labeled with on the wire.
    pub fn body_encoding(self) -> &'static str {
        match self {
            Encoder::Plaintext => "utf-8",
            Encoder::Base64 => "base64",
        }
    }

    fn encode(self, bytes: &[u8]) -> Result<String, PackError> {
        match self {
            Encoder::Plaintext => {
                String::from_utf8(bytes.to_vec()).map_err(|_| PackError::NotUtf8)
            }
            Encoder::Base64 => Ok(BASE64.encode(bytes)),
        }
    }

    fn decode(self, text: &str) -> Result<Vec<u8>, PackError> {
        match self {
            Encoder::Plaintext => Ok(text.as_bytes().to_vec()),
            Encoder::Base64 => BASE64.decode(text).map_err(|e| PackError::Base64(e.to_string())),
        }
    }
}

/// A configured serializer × compressor × encoder pipeline for turning task
/// arguments into a wire-ready string and back.
///
/// The default packer is `Json` / `Identity` / `Base64`, matching what a
/// client with no explicit configuration publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packer {
    serializer: Serializer,
    compressor: Compressor,
    encoder: Encoder,
}

impl Default for Packer {
    fn default() -> Self {
        Self {
            serializer: Serializer::Json,
            compressor: Compressor::Identity,
            encoder: Encoder::Base64,
        }
    }
}

impl Packer {
    /// Builds a packer from its three stages.
    pub fn new(serializer: Serializer, compressor: Compressor, encoder: Encoder) -> Self {
        Self {
            serializer,
            compressor,
            encoder,
        }
    }

    /// The serializer this packer was configured with.
    pub fn serializer(&self) -> Serializer {
        self.serializer
    }

    /// The compressor this packer was configured with.
    pub fn compressor(&self) -> Compressor {
        self.compressor
    }

    /// The encoder this packer was configured with.
    pub fn encoder(&self) -> Encoder {
        self.encoder
    }

    /// The MIME content type this packer's serializer produces.
    pub fn content_type(&self) -> &'static str {
        self.serializer.content_type()
    }

    /// The `body_encoding` label for this packer's encoder.
    pub fn body_encoding(&self) -> &'static str {
        self.encoder.body_encoding()
    }

    /// Serializes, compresses, and encodes `value` into a transport string.
    pub fn pack<T: Serialize>(&self, value: &T) -> Result<String, PackError> {
        let serialized = self.serializer.serialize(value)?;
        let compressed = self.compressor.compress(&serialized)?;

        if self.encoder == Encoder::Plaintext && self.compressor != Compressor::Identity {
            return Err(PackError::NotUtf8);
        }

        self.encoder.encode(&compressed)
    }

    /// Decodes, decompresses, and deserializes `body` back into a value.
    pub fn unpack<T: DeserializeOwned>(&self, body: &str) -> Result<T, PackError> {
        let decoded = self.encoder.decode(body)?;
        let decompressed = self.compressor.decompress(&decoded)?;
        self.serializer.deserialize(&decompressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn default_packer_is_json_identity_base64() {
        // Given
        let packer = Packer::default();
        let value = json!({"arr": [0, 5, 10], "num": 15, "obj": {"bar": 10, "foo": 5}, "str": "foo"});

        // When
        let packed = packer.pack(&value).unwrap();

        // Then
        let expected = BASE64.encode(serde_json::to_vec(&value).unwrap());
        assert_eq!(packed, expected);
    }

    #[test]
    fn round_trips_across_every_combination() {
        // Given
        let value = json!({"arr": [0, 5, 10], "num": 15, "obj": {"bar": 10, "foo": 5}, "str": "foo"});

        let serializers = [Serializer::Json, Serializer::Yaml];
        let compressors = [Compressor::Identity, Compressor::Zlib, Compressor::Gzip];
        let encoders = [Encoder::Plaintext, Encoder::Base64];

        for &serializer in &serializers {
            for &compressor in &compressors {
                for &encoder in &encoders {
                    if encoder == Encoder::Plaintext && compressor != Compressor::Identity {
                        continue;
                    }

                    let packer = Packer::new(serializer, compressor, encoder);

                    // When
                    let packed = packer.pack(&value).unwrap();
                    let unpacked: serde_json::Value = packer.unpack(&packed).unwrap();

                    // Then
                    assert_eq!(unpacked, value, "{serializer:?}/{compressor:?}/{encoder:?}");
                }
            }
        }
    }

    #[test]
    fn plaintext_with_non_identity_compressor_errors_at_pack_time() {
        // Given
        let packer = Packer::new(Serializer::Json, Compressor::Gzip, Encoder::Plaintext);

        // Then
        assert!(packer.pack(&json!({"a": 1})).is_err());
    }

    #[test]
    fn content_type_and_body_encoding_reflect_configuration() {
        let packer = Packer::new(Serializer::Yaml, Compressor::Identity, Encoder::Plaintext);
        assert_eq!(packer.content_type(), "application/x-yaml");
        assert_eq!(packer.body_encoding(), "utf-8");
    }
}
