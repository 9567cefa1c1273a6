use std::fmt;
use std::sync::{Arc, Mutex};

use btleplug::api::{CharPropFlags, WriteType};
use futures::StreamExt;
use stream_cancel::{Trigger, Valved};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::OnceCell;
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use crate::host::{ChangeStream, RemoteCharacteristic};
use crate::util::lock;
use crate::{Descriptor, Result};

/// Stream of new values of a characteristic, returned by [`Characteristic::subscribe`].
pub type ValueStream = UnboundedReceiverStream<Vec<u8>>;

/// A GATT characteristic of a connected device.
///
/// Cloning is cheap and clones share the value cache, the descriptor list and the
/// notification subscription.
#[derive(Clone)]
pub struct Characteristic {
    inner: Arc<Inner>,
}

struct Inner {
    shared: Arc<Shared>,
    descriptors: OnceCell<Vec<Descriptor>>,
    forwarder: tokio::sync::Mutex<Option<Forwarder>>,
}

/// State the forwarding task needs. Kept apart from [`Inner`] so that dropping the last
/// handle drops the forwarder and ends the task.
struct Shared {
    characteristic: Arc<dyn RemoteCharacteristic>,
    value: Mutex<Option<Vec<u8>>>,
}

/// A running native subscription.
struct Forwarder {
    _stopper: Trigger,
    listeners: Arc<Mutex<Listeners>>,
}

/// Listeners of one native subscription. Once closed, no listener may be added.
#[derive(Default)]
struct Listeners {
    senders: Vec<UnboundedSender<Vec<u8>>>,
    closed: bool,
}

impl Listeners {
    /// Drops the senders of listeners whose streams were dropped.
    fn prune(&mut self) {
        self.senders.retain(|sender| !sender.is_closed());
    }

    fn close(&mut self) {
        self.closed = true;
        self.senders.clear();
    }
}

impl Forwarder {
    /// Adds a listener unless the subscription has already ended.
    fn attach(&self, sender: &UnboundedSender<Vec<u8>>) -> bool {
        let mut listeners = lock(&self.listeners);

        if listeners.closed {
            return false;
        }

        listeners.prune();
        listeners.senders.push(sender.clone());
        true
    }
}

impl Characteristic {
    pub(crate) fn new(characteristic: Arc<dyn RemoteCharacteristic>) -> Self {
        Self {
            inner: Arc::new(Inner {
                shared: Arc::new(Shared {
                    characteristic,
                    value: Mutex::new(None),
                }),
                descriptors: OnceCell::new(),
                forwarder: tokio::sync::Mutex::new(None),
            }),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.inner.shared.characteristic.uuid()
    }

    /// Operations supported by the characteristic
    pub fn properties(&self) -> CharPropFlags {
        self.inner.shared.characteristic.properties()
    }

    /// Value from the last read or the last change notification.
    pub fn value(&self) -> Option<Vec<u8>> {
        lock(&self.inner.shared.value).clone()
    }

    pub async fn read(&self) -> Result<Vec<u8>> {
        let value = self.inner.shared.characteristic.read_value().await?;
        self.inner.shared.store(value.clone());
        Ok(value)
    }

    /// Write with response
    pub async fn write(&self, data: &[u8]) -> Result<()> {
        self.write_with(data, WriteType::WithResponse).await
    }

    /// Write without response
    pub async fn write_command(&self, data: &[u8]) -> Result<()> {
        self.write_with(data, WriteType::WithoutResponse).await
    }

    async fn write_with(&self, data: &[u8], write_type: WriteType) -> Result<()> {
        Ok(self
            .inner
            .shared
            .characteristic
            .write_value(data, write_type)
            .await?)
    }

    /// Descriptors of the characteristic. They are discovered on the first call.
    pub async fn descriptors(&self) -> Result<Vec<Descriptor>> {
        let descriptors = self
            .inner
            .descriptors
            .get_or_try_init(|| async {
                let descriptors = self.inner.shared.characteristic.descriptors(None).await?;
                log::debug!(
                    "Discovered {} descriptors for {}",
                    descriptors.len(),
                    self.uuid()
                );
                Ok::<_, btleplug::Error>(descriptors.into_iter().map(Descriptor::new).collect())
            })
            .await?;

        Ok(descriptors.clone())
    }

    /// Descriptors with the given UUID
    pub async fn descriptors_by_uuid(&self, uuid: Uuid) -> Result<Vec<Descriptor>> {
        Ok(self
            .descriptors()
            .await?
            .into_iter()
            .filter(|descriptor| descriptor.uuid() == uuid)
            .collect())
    }

    /// Get descriptor by UUID
    pub async fn descriptor(&self, uuid: Uuid) -> Result<Option<Descriptor>> {
        Ok(self
            .descriptors()
            .await?
            .into_iter()
            .find(|descriptor| descriptor.uuid() == uuid))
    }

    /// Attach a listener for value changes.
    ///
    /// The first listener enables notifications on the device. Every time the device reports a
    /// change, the value is read again and queued for every listener, however far behind it is.
    /// Dropping the returned stream detaches the listener. Listeners are not detached when the
    /// device disconnects; their streams end once the host stops delivering change events.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn subscribe(&self) -> Result<ValueStream> {
        let (sender, receiver) = mpsc::unbounded_channel();

        let mut guard = self.inner.forwarder.lock().await;
        let forwarder = match guard.take() {
            Some(forwarder) if forwarder.attach(&sender) => forwarder,
            _ => {
                let forwarder = self.start_forwarding().await?;
                forwarder.attach(&sender);
                forwarder
            }
        };
        *guard = Some(forwarder);

        Ok(UnboundedReceiverStream::new(receiver))
    }

    /// Disable notifications and end the streams of all listeners.
    pub async fn unsubscribe(&self) -> Result<()> {
        if let Some(forwarder) = self.inner.forwarder.lock().await.take() {
            lock(&forwarder.listeners).close();
        }

        Ok(self.inner.shared.characteristic.stop_notifications().await?)
    }

    /// Number of listeners whose streams are still alive.
    pub async fn listener_count(&self) -> usize {
        match self.inner.forwarder.lock().await.as_ref() {
            Some(forwarder) => {
                let mut listeners = lock(&forwarder.listeners);
                listeners.prune();
                listeners.senders.len()
            }
            None => 0,
        }
    }

    async fn start_forwarding(&self) -> Result<Forwarder> {
        let changes = self.inner.shared.characteristic.start_notifications().await?;
        let (stopper, changes) = Valved::new(changes);
        let listeners = Arc::new(Mutex::new(Listeners::default()));

        log::debug!("Listening for value changes of {}", self.uuid());

        tokio::spawn(forward(
            self.inner.shared.clone(),
            changes,
            listeners.clone(),
        ));

        Ok(Forwarder {
            _stopper: stopper,
            listeners,
        })
    }
}

impl Shared {
    fn store(&self, value: Vec<u8>) {
        *lock(&self.value) = Some(value);
    }
}

/// Re-reads the value on every change event and hands it to the listeners.
async fn forward(
    shared: Arc<Shared>,
    mut changes: Valved<ChangeStream>,
    listeners: Arc<Mutex<Listeners>>,
) {
    let uuid = shared.characteristic.uuid();

    while changes.next().await.is_some() {
        match shared.characteristic.read_value().await {
            Ok(value) => {
                log::trace!("Value of {} changed: {:?}", uuid, value);
                shared.store(value.clone());
                lock(&listeners)
                    .senders
                    .retain(|sender| sender.send(value.clone()).is_ok());
            }
            Err(e) => log::warn!("Could not read changed value of {}: {:?}", uuid, e),
        }
    }

    lock(&listeners).close();

    log::debug!("Stopped listening for value changes of {}", uuid);
}

impl fmt::Debug for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Characteristic")
            .field("uuid", &self.uuid())
            .field("properties", &self.properties())
            .field("value", &self.value())
            .finish()
    }
}
