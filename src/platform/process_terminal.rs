//! Controlling-terminal implementation over termios.
//!
//! Input is delivered as raw chunks (one `read(2)` each, decoded as UTF-8) so the classifier can
//! judge paste bursts by chunk shape. Escape splitting happens downstream.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::core::terminal::Terminal;

#[cfg(unix)]
use libc::{self, c_int};
#[cfg(unix)]
use signal_hook::iterator::Signals;

const READ_CHUNK_BYTES: usize = 4096;
const READER_POLL_MS: i32 = 50;
const FALLBACK_SIZE: (u16, u16) = (80, 24);

/// Turns raw reads into UTF-8 chunks, carrying a split multi-byte tail into the next read.
#[derive(Debug, Default)]
struct Utf8Carry {
    tail: Vec<u8>,
}

impl Utf8Carry {
    fn decode(&mut self, bytes: &[u8]) -> String {
        // Meta-sends-high-bit terminals: one byte with the top bit set is alt+char.
        if let ([byte], true) = (bytes, self.tail.is_empty()) {
            if *byte >= 0x80 {
                return format!("\x1b{}", char::from(byte & 0x7f));
            }
        }

        let mut pending = std::mem::take(&mut self.tail);
        pending.extend_from_slice(bytes);

        let mut decoded = String::with_capacity(pending.len());
        let mut cursor = 0;
        while cursor < pending.len() {
            match std::str::from_utf8(&pending[cursor..]) {
                Ok(valid) => {
                    decoded.push_str(valid);
                    break;
                }
                Err(err) => {
                    let good_end = cursor + err.valid_up_to();
                    if let Ok(valid) = std::str::from_utf8(&pending[cursor..good_end]) {
                        decoded.push_str(valid);
                    }
                    match err.error_len() {
                        Some(bad) => cursor = good_end + bad,
                        None => {
                            self.tail = pending[good_end..].to_vec();
                            break;
                        }
                    }
                }
            }
        }
        decoded
    }
}

type InputCallback = Box<dyn FnMut(String) + Send>;
type NotifyCallback = Box<dyn FnMut() + Send>;

/// Callbacks shared with the reader and signal threads.
#[derive(Default)]
struct Callbacks {
    input: Option<InputCallback>,
    resize: Option<NotifyCallback>,
    resume: Option<NotifyCallback>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Milliseconds since a fixed origin, shareable across threads.
#[derive(Debug)]
struct ActivityClock {
    origin: Instant,
    last_ms: AtomicU64,
}

impl ActivityClock {
    fn new() -> Self {
        Self {
            origin: Instant::now(),
            last_ms: AtomicU64::new(0),
        }
    }

    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn touch(&self) {
        self.last_ms.store(self.now_ms(), Ordering::SeqCst);
    }

    fn idle_for(&self) -> Duration {
        Duration::from_millis(self.now_ms().saturating_sub(self.last_ms.load(Ordering::SeqCst)))
    }
}

#[cfg(unix)]
fn last_os_error() -> io::Error {
    io::Error::last_os_error()
}

/// `poll(2)` one descriptor. `Ok(false)` on timeout or EINTR.
#[cfg(unix)]
fn poll_fd(fd: c_int, events: libc::c_short, timeout_ms: c_int) -> io::Result<bool> {
    let mut pfd = libc::pollfd {
        fd,
        events,
        revents: 0,
    };
    match unsafe { libc::poll(&mut pfd, 1, timeout_ms) } {
        n if n < 0 => {
            let err = last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                Ok(false)
            } else {
                Err(err)
            }
        }
        0 => Ok(false),
        _ if pfd.revents & events != 0 => Ok(true),
        _ => Err(io::Error::other(format!(
            "poll on fd {fd} reported revents 0x{:x}",
            pfd.revents
        ))),
    }
}

/// Write every byte through `write_once`, retrying EINTR and short writes and calling `wait`
/// before retrying a would-block.
#[cfg(unix)]
fn write_all_with(
    bytes: &[u8],
    mut write_once: impl FnMut(&[u8]) -> io::Result<usize>,
    mut wait: impl FnMut() -> io::Result<()>,
) -> io::Result<()> {
    let mut remaining = bytes;
    while !remaining.is_empty() {
        match write_once(remaining) {
            Ok(0) => return Err(io::Error::new(io::ErrorKind::WriteZero, "terminal write returned 0")),
            Ok(count) => remaining = &remaining[count.min(remaining.len())..],
            Err(err) => match err.kind() {
                io::ErrorKind::Interrupted => {}
                io::ErrorKind::WouldBlock => wait()?,
                _ => return Err(err),
            },
        }
    }
    Ok(())
}

#[cfg(unix)]
fn raw_write(fd: c_int, buf: &[u8]) -> io::Result<usize> {
    let written = unsafe { libc::write(fd, buf.as_ptr().cast(), buf.len()) };
    if written < 0 {
        Err(last_os_error())
    } else {
        Ok(written as usize)
    }
}

#[cfg(unix)]
fn write_fd(fd: c_int, data: &str) -> io::Result<()> {
    write_all_with(
        data.as_bytes(),
        |buf| raw_write(fd, buf),
        || loop {
            if poll_fd(fd, libc::POLLOUT, -1)? {
                return Ok(());
            }
        },
    )
}

#[cfg(unix)]
fn window_size(fd: c_int) -> Option<(u16, u16)> {
    let mut size: libc::winsize = unsafe { std::mem::zeroed() };
    let ok = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) } == 0;
    (ok && size.ws_col > 0 && size.ws_row > 0).then_some((size.ws_col, size.ws_row))
}

#[cfg(unix)]
fn get_termios(fd: c_int) -> io::Result<libc::termios> {
    let mut termios: libc::termios = unsafe { std::mem::zeroed() };
    if unsafe { libc::tcgetattr(fd, &mut termios) } != 0 {
        return Err(last_os_error());
    }
    Ok(termios)
}

#[cfg(unix)]
fn set_termios(fd: c_int, termios: &libc::termios) -> io::Result<()> {
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) } != 0 {
        return Err(last_os_error());
    }
    Ok(())
}

/// Cooked-mode settings for crash cleanup, which has no access to the terminal value.
#[cfg(unix)]
static COOKED_MODE: Mutex<Option<(c_int, libc::termios)>> = Mutex::new(None);

#[cfg(unix)]
fn remember_cooked_mode(saved: Option<(c_int, libc::termios)>) {
    *lock(&COOKED_MODE) = saved;
}

/// Put the terminal back in cooked mode if a `ProcessTerminal` is running. Never blocks or panics.
#[cfg(unix)]
pub(crate) fn restore_saved_termios_best_effort() {
    let saved = COOKED_MODE.try_lock().ok().and_then(|slot| *slot);
    if let Some((fd, termios)) = saved {
        let _ = set_termios(fd, &termios);
    }
}

#[cfg(unix)]
pub struct ProcessTerminal {
    input_fd: c_int,
    output_fd: c_int,
    cooked: Option<libc::termios>,
    callbacks: Arc<Mutex<Callbacks>>,
    reader: Option<JoinHandle<()>>,
    stop_reader: Arc<AtomicBool>,
    discard_input: Arc<AtomicBool>,
    activity: Arc<ActivityClock>,
    signals: Option<(signal_hook::iterator::Handle, JoinHandle<()>)>,
    write_log: Option<PathBuf>,
}

#[cfg(unix)]
impl ProcessTerminal {
    pub fn new() -> Self {
        Self {
            input_fd: libc::STDIN_FILENO,
            output_fd: libc::STDOUT_FILENO,
            cooked: None,
            callbacks: Arc::default(),
            reader: None,
            stop_reader: Arc::new(AtomicBool::new(false)),
            discard_input: Arc::new(AtomicBool::new(false)),
            activity: Arc::new(ActivityClock::new()),
            signals: None,
            write_log: None,
        }
    }

    /// Append every byte written to the terminal to `path`.
    pub fn with_write_log(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        self.write_log = path.map(Into::into);
        self
    }

    /// Switch to raw mode; returns the raw settings for re-entry after SIGCONT.
    fn enter_raw_mode(&mut self) -> io::Result<libc::termios> {
        let cooked = match self.cooked {
            Some(cooked) => cooked,
            None => *self.cooked.insert(get_termios(self.input_fd)?),
        };
        let mut raw = cooked;
        unsafe { libc::cfmakeraw(&mut raw) };
        set_termios(self.input_fd, &raw)?;
        remember_cooked_mode(Some((self.input_fd, cooked)));
        Ok(raw)
    }

    fn leave_raw_mode(&mut self) -> io::Result<()> {
        remember_cooked_mode(None);
        match self.cooked.as_ref() {
            Some(cooked) => set_termios(self.input_fd, cooked),
            None => Ok(()),
        }
    }

    fn spawn_reader(&mut self) {
        let fd = self.input_fd;
        let callbacks = Arc::clone(&self.callbacks);
        let stop = Arc::clone(&self.stop_reader);
        let discard = Arc::clone(&self.discard_input);
        let activity = Arc::clone(&self.activity);

        self.reader = Some(thread::spawn(move || {
            let mut buf = [0u8; READ_CHUNK_BYTES];
            let mut carry = Utf8Carry::default();
            while !stop.load(Ordering::SeqCst) {
                match poll_fd(fd, libc::POLLIN, READER_POLL_MS) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(err) => {
                        trace!(%err, "input poll failed");
                        thread::sleep(Duration::from_millis(READER_POLL_MS as u64));
                        continue;
                    }
                }
                let len = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
                if len <= 0 {
                    continue;
                }
                activity.touch();
                if discard.load(Ordering::SeqCst) {
                    trace!(bytes = len, "input discarded while draining");
                    continue;
                }
                let chunk = carry.decode(&buf[..len as usize]);
                if chunk.is_empty() {
                    continue;
                }
                if let Some(on_input) = lock(&callbacks).input.as_mut() {
                    on_input(chunk);
                }
            }
        }));
    }

    fn join_reader(&mut self) {
        self.stop_reader.store(true, Ordering::SeqCst);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }

    fn spawn_signal_thread(&mut self, raw: libc::termios) -> io::Result<()> {
        let mut signals = Signals::new([libc::SIGWINCH, libc::SIGCONT])?;
        let handle = signals.handle();
        let fd = self.input_fd;
        let callbacks = Arc::clone(&self.callbacks);

        let thread = thread::spawn(move || {
            for signal in signals.forever() {
                let mut callbacks = lock(&callbacks);
                if signal == libc::SIGCONT {
                    // The shell put the terminal back in cooked mode while we were stopped.
                    if let Err(err) = set_termios(fd, &raw) {
                        warn!(%err, "raw mode not restored after SIGCONT");
                    }
                    if let Some(on_resume) = callbacks.resume.as_mut() {
                        on_resume();
                    }
                } else if let Some(on_resize) = callbacks.resize.as_mut() {
                    on_resize();
                }
            }
        });
        self.signals = Some((handle, thread));
        Ok(())
    }

    fn join_signal_thread(&mut self) {
        if let Some((handle, thread)) = self.signals.take() {
            handle.close();
            let _ = thread.join();
        }
    }

    fn log_write(&mut self, data: &str) {
        let Some(path) = self.write_log.as_ref() else {
            return;
        };
        let appended = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(data.as_bytes()));
        if let Err(err) = appended {
            warn!(%err, path = %path.display(), "write log disabled");
            self.write_log = None;
        }
    }
}

#[cfg(unix)]
impl Default for ProcessTerminal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl Terminal for ProcessTerminal {
    fn start(
        &mut self,
        on_input: Box<dyn FnMut(String) + Send>,
        on_resize: Box<dyn FnMut() + Send>,
        on_resume: Box<dyn FnMut() + Send>,
    ) -> io::Result<()> {
        *lock(&self.callbacks) = Callbacks {
            input: Some(on_input),
            resize: Some(on_resize),
            resume: Some(on_resume),
        };
        self.stop_reader.store(false, Ordering::SeqCst);
        self.discard_input.store(false, Ordering::SeqCst);
        self.activity.touch();

        let started = self
            .enter_raw_mode()
            .and_then(|raw| match self.spawn_signal_thread(raw) {
                Ok(()) => Ok(()),
                Err(err) => {
                    let _ = self.leave_raw_mode();
                    Err(err)
                }
            });
        if let Err(err) = started {
            *lock(&self.callbacks) = Callbacks::default();
            return Err(err);
        }
        self.spawn_reader();
        debug!(fd = self.input_fd, "terminal in raw mode");
        Ok(())
    }

    fn stop(&mut self) -> io::Result<()> {
        self.join_reader();
        self.join_signal_thread();
        *lock(&self.callbacks) = Callbacks::default();

        // Unread input would otherwise be echoed by the shell.
        unsafe { libc::tcflush(self.input_fd, libc::TCIFLUSH) };
        self.leave_raw_mode()
    }

    fn drain_input(&mut self, max_ms: u64, idle_ms: u64) {
        self.discard_input.store(true, Ordering::SeqCst);
        self.activity.touch();

        let idle = Duration::from_millis(idle_ms);
        let deadline = Instant::now() + Duration::from_millis(max_ms);
        while let Some(left) = deadline.checked_duration_since(Instant::now()) {
            if left.is_zero() || self.activity.idle_for() >= idle {
                break;
            }
            thread::sleep(idle.min(left).max(Duration::from_millis(1)));
        }

        self.discard_input.store(false, Ordering::SeqCst);
    }

    fn write(&mut self, data: &str) {
        if data.is_empty() {
            return;
        }
        if let Err(err) = write_fd(self.output_fd, data) {
            warn!(%err, bytes = data.len(), "terminal write failed");
        }
        self.log_write(data);
    }

    fn columns(&self) -> u16 {
        window_size(self.output_fd).unwrap_or(FALLBACK_SIZE).0
    }

    fn rows(&self) -> u16 {
        window_size(self.output_fd).unwrap_or(FALLBACK_SIZE).1
    }

    fn suspend(&mut self) -> io::Result<()> {
        debug!("suspending on ctrl+z");
        if let Some(cooked) = self.cooked.as_ref() {
            set_termios(self.input_fd, cooked)?;
        }
        // SIGCONT comes back through the signal thread, which re-enters raw mode.
        if unsafe { libc::raise(libc::SIGTSTP) } != 0 {
            return Err(last_os_error());
        }
        Ok(())
    }
}

/// Keeps the SIGINT/SIGTERM cleanup thread alive.
#[cfg(unix)]
pub struct SignalHookGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<JoinHandle<()>>,
}

#[cfg(unix)]
impl Drop for SignalHookGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Run `cleanup` on SIGINT/SIGTERM, restore cooked mode, then exit with `128 + signal`.
#[cfg(unix)]
pub fn install_signal_handlers<F>(cleanup: F) -> io::Result<SignalHookGuard>
where
    F: Fn() + Send + Sync + 'static,
{
    let mut signals = Signals::new([libc::SIGINT, libc::SIGTERM])?;
    let handle = signals.handle();
    let thread = thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            cleanup();
            restore_saved_termios_best_effort();
            std::process::exit(128 + signal);
        }
    });
    Ok(SignalHookGuard {
        handle,
        thread: Some(thread),
    })
}

/// Dropping the guard disarms the cleanup; the chained hook itself stays installed.
#[cfg(unix)]
pub struct PanicHookGuard {
    armed: Arc<AtomicBool>,
}

#[cfg(unix)]
impl PanicHookGuard {
    /// Disarm cleanup around a panic that is about to be caught, then re-arm it.
    pub fn set_armed(&self, armed: bool) {
        self.armed.store(armed, Ordering::SeqCst);
    }
}

#[cfg(unix)]
impl Drop for PanicHookGuard {
    fn drop(&mut self) {
        self.armed.store(false, Ordering::SeqCst);
    }
}

/// Run `cleanup` once on the first panic while armed, then hand over to the previous hook so the
/// message lands on a cooked terminal.
#[cfg(unix)]
pub fn install_panic_hook<F>(cleanup: F) -> PanicHookGuard
where
    F: Fn() + Send + Sync + 'static,
{
    let armed = Arc::new(AtomicBool::new(true));
    let hook_armed = Arc::clone(&armed);
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if hook_armed.swap(false, Ordering::SeqCst) {
            cleanup();
            restore_saved_termios_best_effort();
        }
        previous(info);
    }));
    PanicHookGuard { armed }
}

/// Writer used from panic and signal cleanup. Opens `/dev/tty` non-blocking so it works with
/// redirected stdout, and gives up instead of blocking.
#[cfg(unix)]
pub(crate) struct HookTerminal {
    fd: Option<c_int>,
}

#[cfg(unix)]
impl HookTerminal {
    pub(crate) fn new() -> Self {
        let flags = libc::O_WRONLY | libc::O_NONBLOCK | libc::O_NOCTTY | libc::O_CLOEXEC;
        let fd = unsafe { libc::open(b"/dev/tty\0".as_ptr().cast(), flags) };
        Self {
            fd: (fd >= 0).then_some(fd),
        }
    }
}

#[cfg(unix)]
impl Drop for HookTerminal {
    fn drop(&mut self) {
        if let Some(fd) = self.fd.take() {
            unsafe { libc::close(fd) };
        }
    }
}

#[cfg(unix)]
impl Terminal for HookTerminal {
    fn start(
        &mut self,
        _on_input: Box<dyn FnMut(String) + Send>,
        _on_resize: Box<dyn FnMut() + Send>,
        _on_resume: Box<dyn FnMut() + Send>,
    ) -> io::Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn drain_input(&mut self, _max_ms: u64, _idle_ms: u64) {}

    fn write(&mut self, data: &str) {
        let Some(fd) = self.fd else {
            return;
        };
        // A full tty buffer drops the rest.
        let would_block = || Err(io::Error::from(io::ErrorKind::WouldBlock));
        let _ = write_all_with(data.as_bytes(), |buf| raw_write(fd, buf), would_block);
    }

    fn columns(&self) -> u16 {
        FALLBACK_SIZE.0
    }

    fn rows(&self) -> u16 {
        FALLBACK_SIZE.1
    }
}

#[cfg(not(unix))]
pub struct ProcessTerminal;

#[cfg(not(unix))]
impl ProcessTerminal {
    pub fn new() -> Self {
        Self
    }

    pub fn with_write_log(self, _path: Option<impl Into<PathBuf>>) -> Self {
        self
    }
}

#[cfg(not(unix))]
impl Terminal for ProcessTerminal {
    fn start(
        &mut self,
        _on_input: Box<dyn FnMut(String) + Send>,
        _on_resize: Box<dyn FnMut() + Send>,
        _on_resume: Box<dyn FnMut() + Send>,
    ) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "ProcessTerminal needs a Unix tty",
        ))
    }

    fn stop(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn drain_input(&mut self, _max_ms: u64, _idle_ms: u64) {}

    fn write(&mut self, _data: &str) {}

    fn columns(&self) -> u16 {
        FALLBACK_SIZE.0
    }

    fn rows(&self) -> u16 {
        FALLBACK_SIZE.1
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::io;
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    use super::{poll_fd, write_all_with, HookTerminal, ProcessTerminal, Utf8Carry};
    use crate::core::terminal::Terminal;

    use libc::c_int;

    struct Pty {
        master: c_int,
        slave: c_int,
    }

    impl Pty {
        fn open() -> Self {
            let (mut master, mut slave) = (0, 0);
            let result = unsafe {
                libc::openpty(
                    &mut master,
                    &mut slave,
                    std::ptr::null_mut(),
                    std::ptr::null_mut(),
                    std::ptr::null_mut(),
                )
            };
            assert_eq!(result, 0, "openpty failed");
            Self { master, slave }
        }

        fn terminal(&self) -> ProcessTerminal {
            let mut terminal = ProcessTerminal::new();
            terminal.input_fd = self.slave;
            terminal.output_fd = self.slave;
            terminal
        }

        fn read_master(&self, wait: Duration) -> Vec<u8> {
            let mut out = Vec::new();
            let mut buf = [0u8; 512];
            while matches!(poll_fd(self.master, libc::POLLIN, wait.as_millis() as i32), Ok(true)) {
                let len = unsafe { libc::read(self.master, buf.as_mut_ptr().cast(), buf.len()) };
                if len <= 0 {
                    break;
                }
                out.extend_from_slice(&buf[..len as usize]);
            }
            out
        }
    }

    impl Drop for Pty {
        fn drop(&mut self) {
            unsafe {
                libc::close(self.master);
                libc::close(self.slave);
            }
        }
    }

    fn noop_start(terminal: &mut ProcessTerminal) -> io::Result<()> {
        terminal.start(Box::new(|_| {}), Box::new(|| {}), Box::new(|| {}))
    }

    #[test]
    fn split_utf8_sequence_waits_for_its_tail() {
        let mut carry = Utf8Carry::default();
        let bytes = "x€".as_bytes();
        assert_eq!(carry.decode(&bytes[..2]), "x");
        assert_eq!(carry.decode(&bytes[2..]), "€");
    }

    #[test]
    fn lone_high_bit_byte_becomes_escape_prefix() {
        let mut carry = Utf8Carry::default();
        assert_eq!(carry.decode(&[b'v' | 0x80]), "\x1bv");
    }

    #[test]
    fn invalid_bytes_are_dropped() {
        let mut carry = Utf8Carry::default();
        assert_eq!(carry.decode(&[b'o', 0xfe, b'k']), "ok");
    }

    #[test]
    fn raw_mode_round_trip_is_silent() {
        let pty = Pty::open();
        let mut terminal = pty.terminal();
        noop_start(&mut terminal).expect("start");
        terminal.stop().expect("stop");
        assert!(pty.read_master(Duration::from_millis(150)).is_empty());
    }

    #[test]
    fn paste_bytes_arrive_as_one_chunk() {
        let pty = Pty::open();
        let mut terminal = pty.terminal();
        let (tx, rx) = mpsc::channel();
        terminal
            .start(
                Box::new(move |chunk| {
                    let _ = tx.send(chunk);
                }),
                Box::new(|| {}),
                Box::new(|| {}),
            )
            .expect("start");

        let payload = "\x1b[200~two\nlines\x1b[201~";
        let sent = unsafe { libc::write(pty.master, payload.as_ptr().cast(), payload.len()) };
        assert_eq!(sent as usize, payload.len());

        let mut received = String::new();
        let deadline = Instant::now() + Duration::from_secs(2);
        while received.len() < payload.len() && Instant::now() < deadline {
            if let Ok(chunk) = rx.recv_timeout(Duration::from_millis(50)) {
                received.push_str(&chunk);
            }
        }
        terminal.stop().expect("stop");
        assert_eq!(received, payload);
    }

    #[test]
    fn drain_returns_once_input_goes_quiet() {
        let pty = Pty::open();
        let mut terminal = pty.terminal();
        noop_start(&mut terminal).expect("start");
        let started = Instant::now();
        terminal.drain_input(500, 40);
        assert!(started.elapsed() < Duration::from_millis(400));
        terminal.stop().expect("stop");
    }

    #[test]
    fn start_on_a_pipe_fails_and_leaves_no_callbacks() {
        let mut fds = [0 as c_int; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let mut terminal = ProcessTerminal::new();
        terminal.input_fd = fds[0];
        terminal.output_fd = fds[1];
        assert!(noop_start(&mut terminal).is_err());
        assert!(super::lock(&terminal.callbacks).input.is_none());
        unsafe {
            libc::close(fds[0]);
            libc::close(fds[1]);
        }
    }

    #[test]
    fn hook_terminal_without_tty_is_a_noop() {
        let mut terminal = HookTerminal { fd: None };
        terminal.write("\x1b[?25h");
    }

    #[test]
    fn short_and_interrupted_writes_are_retried() {
        let mut out = Vec::new();
        let mut attempt = 0;
        write_all_with(
            b"pinned",
            |buf| {
                attempt += 1;
                match attempt {
                    1 => Err(io::Error::from(io::ErrorKind::Interrupted)),
                    2 => {
                        out.extend_from_slice(&buf[..3]);
                        Ok(3)
                    }
                    _ => {
                        out.extend_from_slice(buf);
                        Ok(buf.len())
                    }
                }
            },
            || panic!("no would-block expected"),
        )
        .expect("write");
        assert_eq!(out, b"pinned");
    }

    #[test]
    fn would_block_waits_then_retries() {
        let mut log = Vec::new();
        let mut blocked = false;
        let log_cell = std::cell::RefCell::new(&mut log);
        write_all_with(
            b"ok",
            |buf| {
                log_cell.borrow_mut().push("write");
                if !blocked {
                    blocked = true;
                    return Err(io::Error::from(io::ErrorKind::WouldBlock));
                }
                Ok(buf.len())
            },
            || {
                log_cell.borrow_mut().push("wait");
                Ok(())
            },
        )
        .expect("write");
        assert_eq!(log, vec!["write", "wait", "write"]);
    }

    #[test]
    fn would_block_error_from_wait_aborts() {
        let result = write_all_with(
            b"abc",
            |_| Err(io::Error::from(io::ErrorKind::WouldBlock)),
            || Err(io::Error::from(io::ErrorKind::WouldBlock)),
        );
        assert_eq!(
            result.map_err(|err| err.kind()),
            Err(io::ErrorKind::WouldBlock)
        );
    }
}
