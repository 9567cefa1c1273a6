use std::fmt;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::host::RemoteDescriptor;
use crate::util::lock;
use crate::Result;

#[derive(Clone)]
pub struct Descriptor {
    descriptor: Arc<dyn RemoteDescriptor>,
    value: Arc<Mutex<Option<Vec<u8>>>>,
}

impl Descriptor {
    pub(crate) fn new(descriptor: Arc<dyn RemoteDescriptor>) -> Self {
        Self {
            descriptor,
            value: Arc::default(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.descriptor.uuid()
    }

    /// Value from the last [`read`](Self::read), if any.
    pub fn value(&self) -> Option<Vec<u8>> {
        lock(&self.value).clone()
    }

    pub async fn read(&self) -> Result<Vec<u8>> {
        let value = self.descriptor.read_value().await?;
        *lock(&self.value) = Some(value.clone());
        Ok(value)
    }

    pub async fn write(&self, data: &[u8]) -> Result<()> {
        Ok(self.descriptor.write_value(data).await?)
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("uuid", &self.uuid())
            .field("value", &self.value())
            .finish()
    }
}
