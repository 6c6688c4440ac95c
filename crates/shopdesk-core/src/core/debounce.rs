use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Mirrors an input value once it has stayed unchanged for `delay`.
///
/// Every `set` with a new value restarts the quiet window, so only the last
/// value of a burst is ever published. Must be created inside a Tokio
/// runtime; dropping it aborts the timer task.
pub struct Debounced<T> {
    input: watch::Sender<T>,
    output: watch::Receiver<T>,
    delay: Duration,
    task: JoinHandle<()>,
}

impl<T> Debounced<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        let (input, mut input_rx) = watch::channel(initial.clone());
        let (output_tx, output) = watch::channel(initial);

        let task = tokio::spawn(async move {
            loop {
                if input_rx.changed().await.is_err() {
                    return;
                }
                // quiet window, restarted by every further change
                loop {
                    tokio::select! {
                        biased;
                        changed = input_rx.changed() => {
                            if changed.is_err() {
                                return;
                            }
                        }
                        _ = tokio::time::sleep(delay) => break,
                    }
                }
                let latest = input_rx.borrow_and_update().clone();
                output_tx.send_if_modified(|current| {
                    if *current == latest {
                        false
                    } else {
                        *current = latest;
                        true
                    }
                });
            }
        });

        Self {
            input,
            output,
            delay,
            task,
        }
    }

    /// Feed a new input value. Setting the current input again is a no-op.
    pub fn set(&self, value: T) {
        self.input.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Latest raw input.
    pub fn input(&self) -> T {
        self.input.borrow().clone()
    }

    /// Latest debounced value.
    pub fn get(&self) -> T {
        self.output.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.clone()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T> Drop for Debounced<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
