use super::TransportResponse;
use crate::core::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteMessage {
    #[serde(default)]
    pub message: String,
}

/// `{data, errors?}` wrapper around every item response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub data: Option<Value>,
    /// Absent and `null` both mean no errors.
    #[serde(default)]
    pub errors: Option<Vec<RemoteMessage>>,
}

impl Envelope {
    pub fn parse(response: &TransportResponse) -> Result<Self> {
        match serde_json::from_slice::<Envelope>(&response.body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !response.is_success() => Err(Error::UnexpectedStatus(response.status)),
            Err(err) => Err(Error::Decode(err)),
        }
    }

    /// Fails when the remote reported errors or the status is not 2xx.
    pub fn check(self, status: u16) -> Result<Self> {
        if let Some(first) = self.errors.iter().flatten().next() {
            return Err(Error::Remote(first.message.clone()));
        }
        if !(200..300).contains(&status) {
            return Err(Error::UnexpectedStatus(status));
        }
        Ok(self)
    }
}

/// Decodes the `data` member of a response into `T`.
pub fn decode<T: DeserializeOwned>(response: &TransportResponse) -> Result<T> {
    let envelope = Envelope::parse(response)?.check(response.status)?;
    let data = envelope.data.unwrap_or(Value::Null);
    Ok(serde_json::from_value(data)?)
}

/// Checks a response for errors and discards its payload.
pub fn acknowledge(response: &TransportResponse) -> Result<()> {
    if response.body.is_empty() {
        return if response.is_success() {
            Ok(())
        } else {
            Err(Error::UnexpectedStatus(response.status))
        };
    }
    Envelope::parse(response)?.check(response.status)?;
    Ok(())
}
