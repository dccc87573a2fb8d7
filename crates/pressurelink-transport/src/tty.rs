use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Line settings applied when a serial device is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtyConfig {
    /// Line speed. Default: 115200.
    pub baud_rate: u32,
    /// How long a read may wait for the first byte. Rounded down to tenths
    /// of a second and capped at 25.5 s by the termios `VTIME` field.
    pub read_timeout: Duration,
}

impl Default for TtyConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            read_timeout: Duration::from_secs(1),
        }
    }
}

/// A serial device node (`/dev/ttyUSB0`, `/dev/cu.usbmodem1101`, ...).
///
/// The device is put in raw mode (8N1, no echo, no line editing). Port
/// discovery is the host's job; this type only opens the path it is given.
pub struct TtyStream {
    file: File,
    path: PathBuf,
}

impl TtyStream {
    /// Open and configure a serial device.
    pub fn open(path: impl AsRef<Path>, config: TtyConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&path)
            .map_err(|source| TransportError::Open {
                path: path.clone(),
                source,
            })?;

        let stream = Self { file, path };
        stream.configure(&config)?;
        info!(path = ?stream.path, baud = config.baud_rate, "opened serial device");
        Ok(stream)
    }

    /// The device path this stream was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "tty"
    }

    fn configure(&self, config: &TtyConfig) -> Result<()> {
        let speed = baud_constant(config.baud_rate)?;
        let fd = self.file.as_raw_fd();

        // SAFETY: an all-zero `termios` is a valid value to hand to tcgetattr,
        // which overwrites it entirely.
        let mut tio: libc::termios = unsafe { std::mem::zeroed() };

        // SAFETY: `fd` is an open descriptor owned by `self.file` and `tio` is
        // a valid writable pointer for the duration of each call below.
        unsafe {
            if libc::tcgetattr(fd, &mut tio) != 0 {
                return Err(self.configure_error());
            }
            libc::cfmakeraw(&mut tio);
            if libc::cfsetispeed(&mut tio, speed) != 0 || libc::cfsetospeed(&mut tio, speed) != 0
            {
                return Err(self.configure_error());
            }
        }

        tio.c_cflag |= libc::CLOCAL | libc::CREAD;
        tio.c_cc[libc::VMIN] = 0;
        tio.c_cc[libc::VTIME] = deciseconds(config.read_timeout);

        // SAFETY: see above; `tio` is fully initialized.
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) } != 0 {
            return Err(self.configure_error());
        }

        debug!(path = ?self.path, vtime = tio.c_cc[libc::VTIME], "applied raw line settings");
        Ok(())
    }

    fn configure_error(&self) -> TransportError {
        TransportError::Configure {
            path: self.path.clone(),
            source: std::io::Error::last_os_error(),
        }
    }
}

impl Transport for TtyStream {
    fn bytes_available(&mut self) -> Result<usize> {
        let mut count: libc::c_int = 0;
        // SAFETY: FIONREAD stores a `c_int` through the pointer; `count` is a
        // valid writable `c_int` and the descriptor is open.
        let rc = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                libc::FIONREAD,
                &mut count as *mut libc::c_int,
            )
        };
        if rc != 0 {
            return Err(classify(std::io::Error::last_os_error()));
        }
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0usize;
        while filled < buf.len() {
            match self.file.read(&mut buf[filled..]) {
                // Only called after FIONREAD promised the bytes, so an empty
                // read here means the line went away rather than a timeout.
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(classify(err)),
            }
        }
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.file.write(&bytes[offset..]) {
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(classify(err)),
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        loop {
            // SAFETY: the descriptor is open for the lifetime of `self.file`.
            if unsafe { libc::tcdrain(self.file.as_raw_fd()) } == 0 {
                return Ok(());
            }
            let err = std::io::Error::last_os_error();
            if err.kind() != ErrorKind::Interrupted {
                return Err(classify(err));
            }
        }
    }
}

impl std::fmt::Debug for TtyStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtyStream")
            .field("path", &self.path)
            .finish()
    }
}

fn classify(err: std::io::Error) -> TransportError {
    let hung_up = matches!(
        err.kind(),
        ErrorKind::BrokenPipe | ErrorKind::NotConnected | ErrorKind::UnexpectedEof
    ) || matches!(err.raw_os_error(), Some(libc::EIO) | Some(libc::ENXIO));

    if hung_up {
        TransportError::Disconnected
    } else {
        TransportError::Io(err)
    }
}

fn deciseconds(timeout: Duration) -> libc::cc_t {
    let tenths = timeout.as_millis() / 100;
    libc::cc_t::try_from(tenths).unwrap_or(libc::cc_t::MAX)
}

fn baud_constant(baud_rate: u32) -> Result<libc::speed_t> {
    let speed = match baud_rate {
        9_600 => libc::B9600,
        19_200 => libc::B19200,
        38_400 => libc::B38400,
        57_600 => libc::B57600,
        115_200 => libc::B115200,
        230_400 => libc::B230400,
        _ => return Err(TransportError::UnsupportedBaudRate(baud_rate)),
    };
    Ok(speed)
}
