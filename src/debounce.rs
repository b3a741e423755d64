use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Output side of [`debounce`].
///
/// Dropping it cancels the background timer, so a pending value is never
/// delivered to a consumer that has gone away.
pub struct Debounced<T> {
    output: watch::Receiver<T>,
    task: JoinHandle<()>,
}

/// Forwards values from `input` only once they have been stable for `delay`.
///
/// Every change restarts the full delay, so a burst of changes is coalesced
/// into its last value. Values equal to the last forwarded one are dropped.
pub fn debounce<T>(mut input: watch::Receiver<T>, delay: Duration) -> Debounced<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    let (tx, output) = watch::channel(input.borrow_and_update().clone());
    let task = tokio::spawn(run(input, tx, delay));
    Debounced { output, task }
}

async fn run<T>(mut input: watch::Receiver<T>, output: watch::Sender<T>, delay: Duration)
where
    T: Clone + PartialEq,
{
    loop {
        if input.changed().await.is_err() {
            return;
        }

        let mut closed = false;
        loop {
            tokio::select! {
                changed = input.changed() => {
                    if changed.is_err() {
                        closed = true;
                        break;
                    }
                }
                _ = tokio::time::sleep(delay) => break,
            }
        }

        let latest = input.borrow_and_update().clone();
        output.send_if_modified(|current| {
            if *current == latest {
                return false;
            }
            *current = latest;
            true
        });

        if closed || output.is_closed() {
            return;
        }
    }
}

impl<T> Debounced<T> {
    /// Waits for the next forwarded value.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.output.changed().await
    }

    pub fn borrow(&self) -> watch::Ref<'_, T> {
        self.output.borrow()
    }

    pub fn borrow_and_update(&mut self) -> watch::Ref<'_, T> {
        self.output.borrow_and_update()
    }

    /// Additional receiver of the forwarded values. It stops receiving once
    /// this handle is dropped.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.clone()
    }
}

impl<T> Drop for Debounced<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
