//! Binary resources behind pasted images.
//!
//! Pasted image data lives outside the tree. The tree refers to it through
//! a `blob:quire/<uuid>` source, and the registry owns the bytes until the
//! handle is released. Handles are released explicitly when the session
//! closes or its document is replaced.

use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

const BLOB_PREFIX: &str = "blob:quire/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(Uuid);

impl ResourceHandle {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn url(&self) -> String {
        self.to_string()
    }

    /// The handle named by a `blob:quire/` URL.
    pub fn from_url(url: &str) -> Option<Self> {
        let id = url.strip_prefix(BLOB_PREFIX)?;
        Uuid::parse_str(id).ok().map(Self)
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", BLOB_PREFIX, self.0)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResourceError {
    #[error("Unknown resource: {0}")]
    Unknown(String),
    #[error("Unsupported media type for inline data: {0}")]
    UnsupportedType(String),
    #[error("Resource {0} is empty")]
    Empty(String),
}

#[derive(Debug, Clone)]
struct Resource {
    media_type: String,
    bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct ResourceRegistry {
    resources: HashMap<ResourceHandle, Resource>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, media_type: impl Into<String>, bytes: Vec<u8>) -> ResourceHandle {
        let handle = ResourceHandle::generate();
        let media_type = media_type.into();
        log::debug!("registered {} ({} bytes of {})", handle, bytes.len(), media_type);
        self.resources
            .insert(handle, Resource { media_type, bytes });
        handle
    }

    pub fn contains(&self, handle: ResourceHandle) -> bool {
        self.resources.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Media type and bytes of a live handle.
    pub fn get(&self, handle: ResourceHandle) -> Option<(&str, &[u8])> {
        self.resources
            .get(&handle)
            .map(|r| (r.media_type.as_str(), r.bytes.as_slice()))
    }

    pub fn release(&mut self, handle: ResourceHandle) -> bool {
        self.resources.remove(&handle).is_some()
    }

    /// Release every handle, returning how many were live.
    pub fn release_all(&mut self) -> usize {
        let count = self.resources.len();
        self.resources.clear();
        count
    }

    /// A self-contained `data:` URL for an image resource.
    pub fn to_data_url(&self, handle: ResourceHandle) -> Result<String, ResourceError> {
        let resource = self
            .resources
            .get(&handle)
            .ok_or_else(|| ResourceError::Unknown(handle.url()))?;
        if !resource.media_type.starts_with("image/") {
            return Err(ResourceError::UnsupportedType(resource.media_type.clone()));
        }
        if resource.bytes.is_empty() {
            return Err(ResourceError::Empty(handle.url()));
        }
        Ok(format!(
            "data:{},{}",
            resource.media_type,
            urlencoding::encode_binary(&resource.bytes)
        ))
    }
}
