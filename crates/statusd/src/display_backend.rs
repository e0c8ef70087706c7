use anyhow::Result;
use std::io::Write;

/// Something that can show the status line.
pub trait DisplayBackend {
    fn publish(&mut self, line: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendKind {
    /// Set the name of the X root window, which is where dwm and friends read their status from.
    #[cfg(feature = "x11")]
    X11,
    /// Print every new line to standard output.
    Stdout,
}

impl Default for BackendKind {
    #[cfg(feature = "x11")]
    fn default() -> Self {
        BackendKind::X11
    }

    #[cfg(not(feature = "x11"))]
    fn default() -> Self {
        BackendKind::Stdout
    }
}

pub fn open(kind: BackendKind) -> Result<Box<dyn DisplayBackend>> {
    match kind {
        #[cfg(feature = "x11")]
        BackendKind::X11 => Ok(Box::new(x11::X11Backend::new()?)),
        BackendKind::Stdout => Ok(Box::new(StdoutBackend)),
    }
}

pub struct StdoutBackend;

impl DisplayBackend for StdoutBackend {
    fn publish(&mut self, line: &str) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        stdout.flush()?;
        Ok(())
    }
}

#[cfg(feature = "x11")]
mod x11 {
    use super::DisplayBackend;
    use anyhow::{Context, Result};
    use x11rb::{
        connection::Connection,
        protocol::xproto::{AtomEnum, PropMode, Window},
        rust_connection::{DefaultStream, RustConnection},
        wrapper::ConnectionExt,
    };

    pub struct X11Backend {
        conn: RustConnection<DefaultStream>,
        root_window: Window,
    }

    impl X11Backend {
        pub fn new() -> Result<Self> {
            let (conn, screen_num) = RustConnection::connect(None).context("Failed to connect to the X server")?;
            let root_window = conn.setup().roots.get(screen_num).context("X server reported no such screen")?.root;
            Ok(X11Backend { conn, root_window })
        }
    }

    impl DisplayBackend for X11Backend {
        fn publish(&mut self, line: &str) -> Result<()> {
            self.conn.change_property8(PropMode::REPLACE, self.root_window, AtomEnum::WM_NAME, AtomEnum::STRING, line.as_bytes())?;
            self.conn.flush()?;
            Ok(())
        }
    }
}
