use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

const IMAGE_PREFIX: &str = "data:image/";
/// Prefix added when the service returns bare base64.
pub const DEFAULT_IMAGE_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Debug, Error)]
pub enum DataUrlError {
    #[error("data url has no payload separator")]
    MissingSeparator,
    #[error("data url payload is not base64")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Self-describing image payload: `data:<mime>;base64,<payload>`.
#[derive(Clone, PartialEq, Eq)]
pub struct DataUrl(String);

impl std::fmt::Debug for DataUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataUrl")
            .field("mime", &self.mime_type())
            .field("len", &self.0.len())
            .finish()
    }
}

impl DataUrl {
    /// Keeps an existing `data:image/` prefix; otherwise treats the input as JPEG base64.
    pub fn normalize(payload: &str) -> Self {
        let payload = payload.trim();
        if payload.starts_with(IMAGE_PREFIX) {
            Self(payload.to_string())
        } else {
            Self(format!("{DEFAULT_IMAGE_PREFIX}{payload}"))
        }
    }

    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn mime_type(&self) -> Option<&str> {
        let header = self.0.strip_prefix("data:")?.split(',').next()?;
        header.split(';').next().filter(|mime| !mime.is_empty())
    }

    pub fn decode(&self) -> Result<Vec<u8>, DataUrlError> {
        let (header, payload) = self
            .0
            .split_once(',')
            .ok_or(DataUrlError::MissingSeparator)?;
        if !header.ends_with(";base64") {
            return Err(DataUrlError::NotBase64);
        }
        Ok(STANDARD.decode(payload.trim())?)
    }
}
