//! # Quit Signalling
//!
//! A [`QuitSignal`] is the only way to stop an event loop. It is fired by
//! the key watcher, by the process-wide Ctrl-C handler, or by the owner of
//! the session, and observed by the loop through a `watch` receiver.
//!
//! ## Interrupt frames
//! The [`ctrlc`](https://docs.rs/ctrlc) crate only allows one handler per
//! process. The handler is installed once and signals the innermost frame
//! of a global stack. Each running session pushes a frame and pops it when
//! dropped, so nested sessions quit from the inside out.

use std::sync::{Arc, LazyLock, Mutex};

use tokio::sync::watch;

use crate::{Context as _, check};

/// Cloneable handle to fire or observe a quit request
#[derive(Debug, Clone)]
pub struct QuitSignal {
    id: usize,
    send: Arc<watch::Sender<bool>>,
}

impl Default for QuitSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl QuitSignal {
    pub fn new() -> Self {
        let (send, _) = watch::channel(false);
        Self {
            id: crate::atomic::next_atomic_usize(),
            send: Arc::new(send),
        }
    }

    /// Request the loop to stop. Signalling more than once has no effect
    pub fn signal(&self) {
        // send_replace works even when no receiver is alive
        let was_signaled = self.send.send_replace(true);
        if !was_signaled {
            log::debug!("quit requested");
        }
    }

    pub fn is_signaled(&self) -> bool {
        *self.send.borrow()
    }

    /// Receiver to await the signal with
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.send.subscribe()
    }

    /// Block the current thread until the signal is fired.
    ///
    /// Must not be called from inside an async runtime.
    pub fn wait(&self) -> crate::Result<()> {
        let mut recv = self.subscribe();
        let runtime = check!(
            tokio::runtime::Builder::new_current_thread().build(),
            "failed to build tokio runtime to wait for quit"
        )?;
        runtime.block_on(co_wait_quit(&mut recv));
        Ok(())
    }
}

/// Wait until the signal is fired, or until every sender is gone
pub async fn co_wait_quit(recv: &mut watch::Receiver<bool>) {
    // _: a closed channel can never be signalled, which is treated as quit
    let _ = recv.wait_for(|quit| *quit).await;
}

static INTERRUPT_STACK: Mutex<Vec<QuitSignal>> = Mutex::new(Vec::new());
static INIT_ONCE: LazyLock<Result<(), String>> = LazyLock::new(|| {
    let set_result = ctrlc::try_set_handler(|| {
        if let Ok(stack) = INTERRUPT_STACK.lock() {
            if let Some(frame) = stack.last() {
                frame.signal();
            }
        }
    });
    match set_result {
        Err(ctrlc::Error::MultipleHandlers) => Err(
            "failed to set ctrl-c handler: a handler is already set using the `ctrlc` crate"
                .to_string(),
        ),
        Err(other_error) => Err(format!("failed to set ctrl-c handler: {other_error}")),
        Ok(_) => Ok(()),
    }
});

/// Route Ctrl-C to `signal` until the returned scope is dropped
pub fn push_interrupt_frame(signal: &QuitSignal) -> crate::Result<InterruptScope> {
    {
        let Ok(mut stack) = INTERRUPT_STACK.lock() else {
            crate::bail!("global interrupt stack is poisoned");
        };
        stack.push(signal.clone());
    }
    let scope = InterruptScope(signal.id);
    if let Err(e) = &*INIT_ONCE {
        // scope is dropped here, which pops the frame again
        crate::bail!("{e}");
    }
    Ok(scope)
}

/// Pops the interrupt frame when dropped
#[derive(Debug)]
pub struct InterruptScope(usize);

impl Drop for InterruptScope {
    fn drop(&mut self) {
        if let Ok(mut stack) = INTERRUPT_STACK.lock() {
            stack.retain(|x| x.id != self.0);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_signal_is_sticky() {
        let signal = QuitSignal::new();
        assert!(!signal.is_signaled());
        signal.signal();
        signal.signal();
        assert!(signal.is_signaled());
        assert!(signal.clone().is_signaled());
    }

    #[test]
    fn test_subscribe_after_signal_sees_it() {
        let signal = QuitSignal::new();
        signal.signal();
        let recv = signal.subscribe();
        assert!(*recv.borrow());
    }

    #[test]
    fn test_wait_returns_once_signalled() {
        let signal = QuitSignal::new();
        let waiter = {
            let signal = signal.clone();
            std::thread::spawn(move || signal.wait())
        };
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert!(!waiter.is_finished());
        signal.signal();
        waiter.join().unwrap().unwrap();
        // already fired, returns right away
        signal.wait().unwrap();
    }

    #[test]
    fn test_innermost_frame_is_signalled() {
        let outer = QuitSignal::new();
        let inner = QuitSignal::new();
        let _outer_scope = push_interrupt_frame(&outer).unwrap();
        {
            let _inner_scope = push_interrupt_frame(&inner).unwrap();
            // what the handler does on Ctrl-C
            if let Some(frame) = INTERRUPT_STACK.lock().unwrap().last() {
                frame.signal();
            }
            assert!(inner.is_signaled());
            assert!(!outer.is_signaled());
        }
        let stack = INTERRUPT_STACK.lock().unwrap();
        assert!(stack.iter().all(|x| x.id != inner.id));
    }
}
