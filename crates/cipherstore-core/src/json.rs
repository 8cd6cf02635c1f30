use std::io::{Read, Write};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::serializer::{Serializer, SerializerError};

/// JSON codec for any serde type. Empty input decodes to the configured default.
#[derive(Debug, Clone)]
pub struct JsonSerializer<T> {
    default: T,
}

impl<T> JsonSerializer<T> {
    pub fn new(default: T) -> Self {
        Self { default }
    }
}

impl<T: Default> Default for JsonSerializer<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[async_trait]
impl<T> Serializer for JsonSerializer<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    type Value = T;

    fn default_value(&self) -> T {
        self.default.clone()
    }

    async fn read_from(&self, input: &mut (dyn Read + Send)) -> Result<T, SerializerError> {
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;
        if bytes.is_empty() {
            return Ok(self.default_value());
        }
        serde_json::from_slice(&bytes).map_err(SerializerError::codec)
    }

    async fn write_to(
        &self,
        value: &T,
        output: &mut (dyn Write + Send),
    ) -> Result<(), SerializerError> {
        serde_json::to_writer(&mut *output, value).map_err(|err| {
            if err.is_io() {
                SerializerError::Io(err.into())
            } else {
                SerializerError::codec(err)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    struct Counter {
        count: u32,
    }

    #[tokio::test]
    async fn empty_input_yields_default() {
        let serializer = JsonSerializer::new(Counter { count: 7 });
        let value = serializer.read_from(&mut &b""[..]).await.expect("read");
        assert_eq!(value, Counter { count: 7 });
    }

    #[tokio::test]
    async fn writes_plain_json() {
        let serializer = JsonSerializer::<Counter>::default();
        let mut out = Vec::new();
        serializer
            .write_to(&Counter { count: 3 }, &mut out)
            .await
            .expect("write");
        assert_eq!(out, br#"{"count":3}"#);

        let back = serializer
            .read_from(&mut out.as_slice())
            .await
            .expect("read");
        assert_eq!(back, Counter { count: 3 });
    }

    #[tokio::test]
    async fn malformed_json_is_a_codec_error() {
        let serializer = JsonSerializer::<BTreeMap<String, String>>::default();
        let err = serializer
            .read_from(&mut &b"{not json"[..])
            .await
            .expect_err("should fail");
        assert!(matches!(err, SerializerError::Codec { .. }));
    }
}
