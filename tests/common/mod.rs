use std::{
    io::Read,
    net::TcpStream,
    path::Path,
    process::{Child, Command, Stdio},
};

use assert_cmd::cargo::CommandCargoExt;
use nix::{
    sys::signal::{kill, Signal},
    unistd::Pid,
};
use pf_messages::{Frame, FrameDecoder, HEARTBEAT};

/// Spawns the pathfinder with a configuration file and a log directory.
pub fn spawn(config: &Path, log_dir: &Path) -> Child {
    Command::cargo_bin(env!("CARGO_PKG_NAME"))
        .unwrap()
        .arg("--config")
        .arg(config)
        .arg("--log-dir")
        .arg(log_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .spawn()
        .unwrap()
}

pub fn term_and_wait(mut child: Child) {
    let pid = Pid::from_raw(child.id().try_into().unwrap());
    kill(pid, Signal::SIGTERM).unwrap();
    child.wait().unwrap();
}

/// Server side of a message bus connection.
pub struct Bus {
    stream: TcpStream,
    decoder: FrameDecoder,
}

impl Bus {
    /// Reads the client name sent at the start of the connection.
    pub fn handshake(mut stream: TcpStream) -> (Self, String) {
        let mut len = [0; 2];
        stream.read_exact(&mut len).unwrap();
        let mut name = vec![0; usize::from(u16::from_be_bytes(len))];
        stream.read_exact(&mut name).unwrap();

        let bus = Self {
            stream,
            decoder: FrameDecoder::new(),
        };
        (bus, String::from_utf8(name).unwrap())
    }

    /// Blocks until a frame other than a heartbeat is received.
    pub fn next_frame(&mut self) -> Frame {
        let mut buffer = [0; 1024];
        loop {
            while let Some(frame) = self.decoder.decode().unwrap() {
                if frame.name() != HEARTBEAT {
                    return frame;
                }
            }
            let len = self.stream.read(&mut buffer).unwrap();
            assert!(len > 0, "pathfinder closed the connection");
            self.decoder.extend(&buffer[..len]);
        }
    }

    pub fn send(&mut self, frame: &Frame) {
        use std::io::Write;

        self.stream.write_all(&frame.encode().unwrap()).unwrap();
    }
}
