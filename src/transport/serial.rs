//! # Serial Port Transport
//!
//! Talks to the printer over a plain TTY (`/dev/serial0`, `/dev/ttyUSB0`,
//! `/dev/ttyAMA0`, ...). The printer's RX line has no handshake, so nothing
//! here waits on the printer; the encoder's throttle does that.
//!
//! ## TTY Configuration
//!
//! The device is opened read/write and put into raw mode:
//!
//! - **No input processing**: IGNBRK, BRKINT, PARMRK, ISTRIP, INLCR, IGNCR,
//!   ICRNL cleared
//! - **No flow control**: IXON/IXOFF/IXANY and CRTSCTS cleared. `0x11` and
//!   `0x13` occur in bitmap data and must not be taken as XON/XOFF
//! - **No output processing**: OPOST cleared (no LF to CRLF)
//! - **8N1**: CS8, no parity, one stop bit
//! - **Non-canonical reads**: VMIN 0, VTIME 10, so a read returns after one
//!   second even if the printer stays silent
//!
//! ## Permissions
//!
//! The user usually needs to be in the `dialout` group, and on a Raspberry
//! Pi the serial console must be disabled so the kernel does not write to
//! the printer.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

use tracing::{debug, info};

use super::ByteChannel;
use crate::error::TermicaError;

/// Baud rates the TTY layer can be set to
pub const SUPPORTED_BAUD_RATES: [u32; 6] = [4800, 9600, 19200, 38400, 57600, 115200];

/// # Serial Printer Transport
///
/// ```no_run
/// use termica::transport::{ByteChannel, SerialTransport};
///
/// let mut transport = SerialTransport::open("/dev/serial0", 19200)?;
/// transport.send(&[0x1B, 0x40])?;
/// # Ok::<(), termica::TermicaError>(())
/// ```
pub struct SerialTransport {
    file: File,
}

impl SerialTransport {
    /// Open a serial device and configure it for raw binary at `baud`.
    ///
    /// ## Errors
    ///
    /// - The device doesn't exist or permission is denied
    /// - `baud` is not in [`SUPPORTED_BAUD_RATES`]
    /// - TTY configuration fails
    pub fn open<P: AsRef<Path>>(device: P, baud: u32) -> Result<Self, TermicaError> {
        let path = device.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                TermicaError::Transport(format!("Failed to open {}: {}", path.display(), e))
            })?;

        configure_tty_raw(&file, baud)?;
        info!(device = %path.display(), baud, "opened serial port");

        Ok(Self { file })
    }
}

impl ByteChannel for SerialTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TermicaError> {
        self.file
            .write_all(bytes)
            .map_err(|e| TermicaError::Transport(format!("Write failed: {}", e)))?;
        self.file
            .flush()
            .map_err(|e| TermicaError::Transport(format!("Flush failed: {}", e)))
    }

    fn receive(&mut self, n: usize) -> Result<Vec<u8>, TermicaError> {
        let mut buf = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            match self.file.read(&mut buf[filled..]) {
                // VTIME expired with nothing to read
                Ok(0) => break,
                Ok(count) => filled += count,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(TermicaError::Transport(format!("Read failed: {}", e)));
                }
            }
        }
        buf.truncate(filled);
        debug!(requested = n, received = filled, "serial read");
        Ok(buf)
    }
}

/// Map a numeric baud rate to its termios speed constant.
#[cfg(unix)]
fn speed_constant(baud: u32) -> Result<libc::speed_t, TermicaError> {
    let speed = match baud {
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        other => {
            return Err(TermicaError::Transport(format!(
                "Unsupported baud rate {} (supported: {:?})",
                other, SUPPORTED_BAUD_RATES
            )));
        }
    };
    Ok(speed)
}

/// Put the TTY into raw 8N1 mode at `baud` with all flow control disabled.
#[cfg(unix)]
fn configure_tty_raw(file: &File, baud: u32) -> Result<(), TermicaError> {
    use std::mem::MaybeUninit;
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();
    let speed = speed_constant(baud)?;

    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(TermicaError::Transport(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);

    termios.c_oflag &= !libc::OPOST;

    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);

    termios.c_cflag &= !(libc::CSIZE | libc::PARENB | libc::CSTOPB | libc::CRTSCTS);
    termios.c_cflag |= libc::CS8 | libc::CREAD | libc::CLOCAL;

    termios.c_cc[libc::VMIN] = 0;
    termios.c_cc[libc::VTIME] = 10;

    let result = unsafe {
        libc::cfsetispeed(&mut termios, speed) | libc::cfsetospeed(&mut termios, speed)
    };
    if result != 0 {
        return Err(TermicaError::Transport(format!(
            "cfsetspeed failed: {}",
            io::Error::last_os_error()
        )));
    }

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(TermicaError::Transport(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

#[cfg(not(unix))]
fn configure_tty_raw(_file: &File, baud: u32) -> Result<(), TermicaError> {
    // The port keeps whatever settings the OS driver has.
    if !SUPPORTED_BAUD_RATES.contains(&baud) {
        return Err(TermicaError::Transport(format!(
            "Unsupported baud rate {}",
            baud
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_device() {
        let result = SerialTransport::open("/dev/termica-does-not-exist", 19200);
        assert!(matches!(result, Err(TermicaError::Transport(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_speed_constants() {
        assert_eq!(speed_constant(19200).unwrap(), libc::B19200);
        assert_eq!(speed_constant(9600).unwrap(), libc::B9600);
        assert!(speed_constant(12345).is_err());
        for baud in SUPPORTED_BAUD_RATES {
            assert!(speed_constant(baud).is_ok());
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_configure_rejects_non_tty() {
        // /dev/null is not a terminal, so tcgetattr fails
        let file = File::open("/dev/null").unwrap();
        assert!(configure_tty_raw(&file, 19200).is_err());
    }

    // Talking to a real port needs hardware; run the CLI against a
    // connected printer to check the full path.
}
