//! In-memory blobs addressed by opaque handles.
//!
//! A [`ResourceHandle`] plays the role of a blob URL: the session hands it to
//! whoever needs to display or save the bytes, and the [`ResourceStore`] owns
//! the bytes until the handle is released. The session releases a handle as
//! soon as the preview or result it backs is superseded, so repeated
//! conversions never accumulate blobs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(u64);

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Resource {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Resource {
    /// `data:<mime>;base64,<payload>`
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

#[derive(Debug, Default)]
pub struct ResourceStore {
    next_id: u64,
    live: HashMap<ResourceHandle, Resource>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, bytes: Vec<u8>, mime: impl Into<String>) -> ResourceHandle {
        self.next_id += 1;
        let handle = ResourceHandle(self.next_id);
        self.live.insert(
            handle,
            Resource {
                mime: mime.into(),
                bytes,
            },
        );
        handle
    }

    pub fn get(&self, handle: ResourceHandle) -> Option<&Resource> {
        self.live.get(&handle)
    }

    pub fn data_uri(&self, handle: ResourceHandle) -> Option<String> {
        self.get(handle).map(Resource::data_uri)
    }

    /// Drop the bytes behind `handle`. Returns false if it was already gone.
    pub fn release(&mut self, handle: ResourceHandle) -> bool {
        let released = self.live.remove(&handle).is_some();
        if released {
            log::debug!("released {handle}");
        }
        released
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
