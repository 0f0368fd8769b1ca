use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::QuitSignal;

/// How often the reader thread checks if it should stop
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Watches the controlling terminal for the quit key.
///
/// The terminal is put in non-canonical, no-echo mode so single key presses
/// are delivered without Enter. `q`, `Q` or a Ctrl+C byte fire the signal.
/// Interrupt processing stays on, so Ctrl+C normally arrives as a signal
/// instead and is handled by the interrupt frame of the session.
///
/// The terminal mode is restored when the watcher is dropped.
pub struct KeyWatcher {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl KeyWatcher {
    /// Start watching. Fails if there is no controlling terminal.
    pub fn start(signal: QuitSignal) -> crate::Result<Self> {
        let console = imp::RawConsole::open()?;
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let stop = Arc::clone(&stop);
            std::thread::Builder::new()
                .name("arbor-keys".to_string())
                .spawn(move || watch_keys(console, signal, stop))?
        };
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for KeyWatcher {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn watch_keys(mut console: imp::RawConsole, signal: QuitSignal, stop: Arc<AtomicBool>) {
    let mut buf = [0u8; 32];
    while !stop.load(Ordering::Acquire) && !signal.is_signaled() {
        match console.read_keys(&mut buf, POLL_INTERVAL) {
            Ok(0) => {}
            Ok(n) => {
                if buf[..n].iter().copied().any(is_quit_key) {
                    log::debug!("quit key pressed");
                    signal.signal();
                    break;
                }
            }
            Err(e) => {
                log::warn!("stopped watching keys: {e}");
                break;
            }
        }
    }
    // console drops here, restoring the terminal mode
}

fn is_quit_key(b: u8) -> bool {
    matches!(b, b'q' | b'Q' | 0x03)
}

#[cfg(unix)]
mod imp {
    use std::fs::File;
    use std::io::{self, Read as _};
    use std::os::unix::io::AsRawFd;
    use std::time::Duration;

    use libc::{ECHO, ICANON, TCSANOW, VMIN, VTIME, c_int, tcsetattr, termios};

    pub struct RawConsole {
        tty: File,
        original_attr: termios,
    }

    impl RawConsole {
        pub fn open() -> crate::Result<Self> {
            use crate::Context as _;
            let tty = crate::check!(File::open("/dev/tty"), "failed to open /dev/tty")?;
            let fd = tty.as_raw_fd();
            let mut term = crate::check!(safe_tcgetattr(fd), "failed to get terminal mode")?;
            let original_attr = term;
            // keys without Enter and without echo, ISIG is kept for Ctrl+C
            term.c_lflag &= !(ICANON | ECHO);
            term.c_cc[VMIN] = 1;
            term.c_cc[VTIME] = 0;
            crate::check!(
                io_result(unsafe { tcsetattr(fd, TCSANOW, &term) }),
                "failed to set terminal mode"
            )?;
            Ok(Self { tty, original_attr })
        }

        /// Wait up to `timeout` for input, then read what is available
        pub fn read_keys(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
            let mut pollfd = libc::pollfd {
                fd: self.tty.as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            };
            let ret = unsafe { libc::poll(&mut pollfd, 1, timeout.as_millis() as c_int) };
            if ret < 0 {
                let e = io::Error::last_os_error();
                if e.kind() == io::ErrorKind::Interrupted {
                    return Ok(0);
                }
                return Err(e);
            }
            if ret == 0 || pollfd.revents & libc::POLLIN == 0 {
                return Ok(0);
            }
            self.tty.read(buf)
        }
    }

    impl Drop for RawConsole {
        fn drop(&mut self) {
            unsafe {
                tcsetattr(self.tty.as_raw_fd(), TCSANOW, &self.original_attr);
            }
        }
    }

    fn safe_tcgetattr(fd: c_int) -> io::Result<termios> {
        let mut term = std::mem::MaybeUninit::<termios>::uninit();
        io_result(unsafe { libc::tcgetattr(fd, term.as_mut_ptr()) })?;
        Ok(unsafe { term.assume_init() })
    }

    fn io_result(ret: c_int) -> io::Result<()> {
        match ret {
            0 => Ok(()),
            _ => Err(io::Error::last_os_error()),
        }
    }
}

#[cfg(windows)]
mod imp {
    use std::io;
    use std::time::Duration;

    use windows_sys::Win32::Foundation::{
        CloseHandle, GENERIC_READ, GENERIC_WRITE, HANDLE, INVALID_HANDLE_VALUE,
    };
    use windows_sys::Win32::Storage::FileSystem::{
        CreateFileA, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING,
    };
    use windows_sys::Win32::System::Console::{
        CONSOLE_MODE, ENABLE_ECHO_INPUT, ENABLE_LINE_INPUT, GetConsoleMode,
        GetNumberOfConsoleInputEvents, INPUT_RECORD, KEY_EVENT, ReadConsoleInputW,
        SetConsoleMode,
    };
    use windows_sys::core::PCSTR;

    pub struct RawConsole {
        // stored as an address so the console can move to the reader thread
        handle: isize,
        original_mode: u32,
    }

    impl RawConsole {
        pub fn open() -> crate::Result<Self> {
            let handle = unsafe {
                CreateFileA(
                    c"CONIN$".as_ptr() as PCSTR,
                    GENERIC_READ | GENERIC_WRITE,
                    FILE_SHARE_READ | FILE_SHARE_WRITE,
                    std::ptr::null(),
                    OPEN_EXISTING,
                    0,
                    std::ptr::null_mut(),
                )
            };
            if handle == INVALID_HANDLE_VALUE {
                crate::bail!("failed to open console input: {}", io::Error::last_os_error());
            }
            let mut original_mode = 0u32;
            if unsafe { GetConsoleMode(handle, &mut original_mode as *mut CONSOLE_MODE) } == 0 {
                let e = io::Error::last_os_error();
                unsafe { CloseHandle(handle) };
                crate::bail!("failed to get console mode: {e}");
            }
            // keys without Enter and without echo, processed input is kept for Ctrl+C
            let new_mode = original_mode & !(ENABLE_LINE_INPUT | ENABLE_ECHO_INPUT);
            if unsafe { SetConsoleMode(handle, new_mode) } == 0 {
                let e = io::Error::last_os_error();
                unsafe { CloseHandle(handle) };
                crate::bail!("failed to set console mode: {e}");
            }
            Ok(Self {
                handle: handle as isize,
                original_mode,
            })
        }

        fn handle(&self) -> HANDLE {
            self.handle as HANDLE
        }

        /// Wait up to `timeout` for input, then read what is available.
        /// Only characters of key presses are written to `buf`.
        pub fn read_keys(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
            let mut count = 0u32;
            if unsafe { GetNumberOfConsoleInputEvents(self.handle(), &mut count) } == 0 {
                return Err(io::Error::last_os_error());
            }
            if count == 0 {
                std::thread::sleep(timeout);
                return Ok(0);
            }
            let mut records: [INPUT_RECORD; 16] = unsafe { std::mem::zeroed() };
            let mut read = 0u32;
            if unsafe {
                ReadConsoleInputW(
                    self.handle(),
                    records.as_mut_ptr(),
                    records.len() as u32,
                    &mut read,
                )
            } == 0
            {
                return Err(io::Error::last_os_error());
            }
            let mut n = 0;
            for record in records.iter().take(read as usize) {
                if n >= buf.len() {
                    break;
                }
                if record.EventType as u32 != KEY_EVENT as u32 {
                    continue;
                }
                let key = unsafe { record.Event.KeyEvent };
                if key.bKeyDown == 0 {
                    continue;
                }
                let c = unsafe { key.uChar.UnicodeChar };
                if let Ok(b) = u8::try_from(c) {
                    buf[n] = b;
                    n += 1;
                }
            }
            Ok(n)
        }
    }

    impl Drop for RawConsole {
        fn drop(&mut self) {
            unsafe {
                SetConsoleMode(self.handle(), self.original_mode);
                CloseHandle(self.handle());
            }
        }
    }
}
