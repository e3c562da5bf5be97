//! termios 串口实现
//!
//! `TtyPort` 独占一个串口设备：打开时申请独占访问、保存原始线路配置并切换到
//! 原始模式；关闭时恢复原始配置再释放句柄。

use crate::{SerialError, SerialTransport, TtyConfig};
use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use nix::sys::termios::{
    self, BaudRate, ControlFlags, FlushArg, InputFlags, LocalFlags, OutputFlags, SetArg,
    SpecialCharacterIndices, Termios,
};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::time::Duration;
use tracing::{error, info, trace, warn};

mod ioctl {
    // 之后其他进程（非特权）再打开同一终端会得到 EBUSY
    nix::ioctl_none_bad!(tiocexcl, libc::TIOCEXCL);
}

/// 将整数波特率映射到 termios 常量
fn baud_rate(baud: u32) -> Result<BaudRate, SerialError> {
    let rate = match baud {
        1200 => BaudRate::B1200,
        2400 => BaudRate::B2400,
        4800 => BaudRate::B4800,
        9600 => BaudRate::B9600,
        19200 => BaudRate::B19200,
        38400 => BaudRate::B38400,
        57600 => BaudRate::B57600,
        115200 => BaudRate::B115200,
        other => return Err(SerialError::UnsupportedBaudRate(other)),
    };
    Ok(rate)
}

/// 原始模式线路配置：8 数据位、忽略调制解调器控制线、允许接收、无流控
fn raw_line_settings(original: &Termios, baud: BaudRate) -> Result<Termios, SerialError> {
    let mut options = original.clone();
    options.input_flags = InputFlags::empty();
    options.output_flags = OutputFlags::empty();
    options.local_flags = LocalFlags::empty();
    options.control_flags = ControlFlags::CS8 | ControlFlags::CREAD | ControlFlags::CLOCAL;
    // 非阻塞读取：poll 负责等待
    options.control_chars[SpecialCharacterIndices::VMIN as usize] = 0;
    options.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
    termios::cfsetspeed(&mut options, baud).map_err(|e| SerialError::setup("set speed", e))?;
    Ok(options)
}

/// 已打开的端口
struct OpenPort {
    file: File,
    original: Termios,
}

/// 基于 termios 的串口
///
/// # Example
///
/// ```no_run
/// use amplink_serial::{SerialTransport, TtyConfig, TtyPort};
///
/// let mut port = TtyPort::new(TtyConfig::default());
/// port.open()?;
/// port.write_all(b"A")?;
/// port.close();
/// # Ok::<(), amplink_serial::SerialError>(())
/// ```
pub struct TtyPort {
    config: TtyConfig,
    port: Option<OpenPort>,
}

impl TtyPort {
    pub fn new(config: TtyConfig) -> Self {
        Self { config, port: None }
    }

    pub fn config(&self) -> &TtyConfig {
        &self.config
    }

    fn open_configured(&self) -> Result<OpenPort, SerialError> {
        let baud = baud_rate(self.config.baud_rate)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(&self.config.path)
            .map_err(|e| SerialError::setup("open serial", e))?;

        // SAFETY: fd 在 file 的生命周期内有效，TIOCEXCL 不读写用户内存
        unsafe { ioctl::tiocexcl(file.as_raw_fd()) }
            .map_err(|e| SerialError::setup("acquire exclusive access", e))?;

        let original =
            termios::tcgetattr(&file).map_err(|e| SerialError::setup("get original attrs", e))?;
        let options = raw_line_settings(&original, baud)?;
        termios::tcsetattr(&file, SetArg::TCSANOW, &options)
            .map_err(|e| SerialError::setup("set attrs", e))?;

        // 从这里开始 close 需要恢复原始配置
        let port = OpenPort { file, original };

        if let Err(e) = termios::tcflush(&port.file, FlushArg::TCIFLUSH) {
            warn!("flush stale input on {}: {}", self.config.path, e);
        }

        Ok(port)
    }
}

impl SerialTransport for TtyPort {
    fn open(&mut self) -> Result<(), SerialError> {
        if self.port.is_some() {
            return Ok(());
        }

        let port = match self.open_configured() {
            Ok(port) => port,
            Err(e) => {
                error!("open {}: {}", self.config.path, e);
                return Err(e);
            },
        };
        self.port = Some(port);

        // 设备需要静默期，否则之后的 Ping 读不到回显
        std::thread::sleep(self.config.settle_delay());
        info!("opened serial {}", self.config.path);
        Ok(())
    }

    fn close(&mut self) {
        let Some(port) = self.port.take() else {
            return;
        };

        if let Err(e) = termios::tcflush(&port.file, FlushArg::TCIOFLUSH) {
            trace!("flush on close: {}", e);
        }
        if let Err(e) = termios::tcsetattr(&port.file, SetArg::TCSANOW, &port.original) {
            warn!("restore line settings of {}: {}", self.config.path, e);
        }
        drop(port);
        info!("closed serial {}", self.config.path);
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        let port = self.port.as_mut().ok_or(SerialError::NotOpen)?;
        port.file.write_all(bytes)?;
        Ok(())
    }

    fn drain(&mut self) -> Result<(), SerialError> {
        let port = self.port.as_ref().ok_or(SerialError::NotOpen)?;
        termios::tcdrain(&port.file).map_err(io::Error::from)?;
        Ok(())
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, SerialError> {
        let port = self.port.as_mut().ok_or(SerialError::NotOpen)?;

        // PollTimeout 以毫秒为单位（u16，最大 65535ms）
        let timeout_ms = timeout.as_millis().min(u16::MAX as u128) as u16;
        let ready = {
            let mut fds = [PollFd::new(port.file.as_fd(), PollFlags::POLLIN)];
            poll(&mut fds, PollTimeout::from(timeout_ms))
        };
        match ready {
            Ok(0) | Err(Errno::EINTR) => return Err(SerialError::Timeout),
            Ok(_) => {},
            Err(e) => return Err(SerialError::Io(e.into())),
        }

        match port.file.read(buf) {
            Ok(0) => Err(SerialError::Timeout),
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Err(SerialError::Timeout),
            Err(e) => Err(SerialError::Io(e)),
        }
    }
}

impl Drop for TtyPort {
    /// 自动清理：恢复原始线路配置并关闭句柄
    fn drop(&mut self) {
        self.close();
    }
}
