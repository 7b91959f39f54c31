use std::{
    net::Shutdown,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use async_std::{
    channel::{bounded, unbounded, Receiver, RecvError, SendError, Sender},
    io::{ReadExt, WriteExt},
    net::TcpStream,
    prelude::FutureExt,
    task,
};
use pf_messages::{
    disconnect_frame, heartbeat_frame, listen_frame, write_str, Frame, FrameDecoder, HEARTBEAT,
};
use tracing::{debug, info, warn};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);
const RECONNECT_DELAY: Duration = Duration::from_secs(1);
const READ_BUFFER_SIZE: usize = 4096;

/// Client of the message bus.
///
/// The connection is maintained by a background task which reconnects after
/// any failure. Frames sent while the connection is down are delivered once
/// it is re-established. Dropping the messenger disconnects from the bus.
pub struct Messenger {
    outputs: Sender<Frame>,
    inputs: Receiver<Frame>,
}

impl Messenger {
    /// Spawns the connection task.
    ///
    /// # Arguments
    ///
    /// * `address` - address of the message bus server.
    ///
    /// * `name` - name of the client used by the server for logging.
    ///
    /// * `listening` - names of messages to be delivered to the client.
    pub fn connect(address: String, name: String, listening: &[&str]) -> Self {
        let (outputs_sender, outputs_receiver) = unbounded();
        let (inputs_sender, inputs_receiver) = unbounded();

        let connection = Connection {
            address,
            name,
            listening: listening.iter().map(|&name| name.to_owned()).collect(),
            outputs: outputs_receiver,
            inputs: inputs_sender,
        };
        task::spawn(connection.run());

        Self {
            outputs: outputs_sender,
            inputs: inputs_receiver,
        }
    }

    /// Waits for the next received frame. Heartbeats are never returned.
    pub async fn recv(&self) -> Result<Frame, RecvError> {
        self.inputs.recv().await
    }

    pub async fn send(&self, frame: Frame) -> Result<(), SendError<Frame>> {
        self.outputs.send(frame).await
    }
}

enum Served {
    /// The messenger was dropped.
    Closed,
    /// The server closed the connection.
    Disconnected,
}

struct Connection {
    address: String,
    name: String,
    listening: Vec<String>,
    outputs: Receiver<Frame>,
    inputs: Sender<Frame>,
}

impl Connection {
    async fn run(self) {
        loop {
            match TcpStream::connect(self.address.as_str()).await {
                Ok(stream) => {
                    info!("Connected to message bus at {}", self.address);
                    let result = self.serve(stream.clone()).await;
                    let _ = stream.shutdown(Shutdown::Both);

                    match result {
                        Ok(Served::Closed) => {
                            info!("Disconnected from message bus.");
                            break;
                        }
                        Ok(Served::Disconnected) => {
                            warn!("Message bus at {} closed the connection", self.address)
                        }
                        Err(err) => warn!("Message bus connection failed: {:?}", err),
                    }
                }
                Err(err) => debug!("Failed to connect to {}: {err}", self.address),
            }

            if self.outputs.is_closed() {
                break;
            }
            task::sleep(RECONNECT_DELAY).await;
        }
    }

    async fn serve(&self, mut stream: TcpStream) -> Result<Served> {
        let mut handshake = Vec::new();
        write_str(&mut handshake, self.name.as_str())?;
        for name in self.listening.iter() {
            handshake.extend(listen_frame(name)?.encode()?);
        }
        handshake.extend(heartbeat_frame().encode()?);
        stream
            .write_all(&handshake)
            .await
            .context("Failed to send handshake")?;
        let mut last_heartbeat = Instant::now();

        // The reader drops its sender when it finishes.
        let (reader_alive, reader_done) = bounded::<()>(1);
        task::spawn(read_frames(
            stream.clone(),
            self.inputs.clone(),
            reader_alive,
        ));

        loop {
            if reader_done.is_closed() {
                return Ok(Served::Disconnected);
            }

            let wait = HEARTBEAT_INTERVAL.saturating_sub(last_heartbeat.elapsed());
            match self.outputs.recv().timeout(wait).await {
                Ok(Ok(frame)) => write_frame(&mut stream, &frame).await?,
                Ok(Err(_)) => {
                    write_frame(&mut stream, &disconnect_frame()).await?;
                    return Ok(Served::Closed);
                }
                Err(_) => (),
            }

            if last_heartbeat.elapsed() >= HEARTBEAT_INTERVAL {
                write_frame(&mut stream, &heartbeat_frame()).await?;
                last_heartbeat = Instant::now();
            }
        }
    }
}

async fn write_frame(stream: &mut TcpStream, frame: &Frame) -> Result<()> {
    let bytes = frame.encode()?;
    stream
        .write_all(&bytes)
        .await
        .with_context(|| format!("Failed to send message {}", frame.name()))
}

async fn read_frames(mut stream: TcpStream, inputs: Sender<Frame>, _alive: Sender<()>) {
    let mut decoder = FrameDecoder::new();
    let mut buffer = [0; READ_BUFFER_SIZE];

    loop {
        let len = match stream.read(&mut buffer).await {
            Ok(0) => return,
            Ok(len) => len,
            Err(err) => {
                warn!("Failed to read from message bus: {err}");
                return;
            }
        };
        decoder.extend(&buffer[..len]);

        loop {
            match decoder.decode() {
                Ok(Some(frame)) => {
                    if frame.name() == HEARTBEAT {
                        continue;
                    }
                    if inputs.send(frame).await.is_err() {
                        return;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!("Corrupted message bus stream: {err}");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_std::net::TcpListener;
    use ntest::timeout;
    use pf_messages::DISCONNECT;

    use super::*;

    struct Peer {
        stream: TcpStream,
        decoder: FrameDecoder,
    }

    impl Peer {
        /// Accepts a client and returns it together with its name.
        async fn accept(listener: &TcpListener) -> (Self, String) {
            let (mut stream, _) = listener.accept().await.unwrap();

            let mut len = [0; 2];
            stream.read_exact(&mut len).await.unwrap();
            let mut name = vec![0; usize::from(u16::from_be_bytes(len))];
            stream.read_exact(&mut name).await.unwrap();

            let peer = Self {
                stream,
                decoder: FrameDecoder::new(),
            };
            (peer, String::from_utf8(name).unwrap())
        }

        /// Returns the next frame other than a heartbeat.
        async fn next_frame(&mut self) -> Frame {
            let mut buffer = [0; 256];
            loop {
                while let Some(frame) = self.decoder.decode().unwrap() {
                    if frame.name() != HEARTBEAT {
                        return frame;
                    }
                }
                let len = self.stream.read(&mut buffer).await.unwrap();
                assert!(len > 0, "client closed the connection");
                self.decoder.extend(&buffer[..len]);
            }
        }

        async fn send(&mut self, frame: &Frame) {
            self.stream
                .write_all(&frame.encode().unwrap())
                .await
                .unwrap();
        }
    }

    #[test]
    #[timeout(10000)]
    fn test_messenger() {
        task::block_on(async {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let address = listener.local_addr().unwrap().to_string();

            let messenger = Messenger::connect(address, "Test".to_owned(), &["A:B", "C"]);
            let (mut peer, name) = Peer::accept(&listener).await;
            assert_eq!(name, "Test");
            assert_eq!(peer.next_frame().await, listen_frame("A:B").unwrap());
            assert_eq!(peer.next_frame().await, listen_frame("C").unwrap());

            peer.send(&heartbeat_frame()).await;
            peer.send(&Frame::new("C", vec![1, 2])).await;
            assert_eq!(messenger.recv().await.unwrap(), Frame::new("C", vec![1, 2]));

            messenger.send(Frame::new("D", vec![3])).await.unwrap();
            assert_eq!(peer.next_frame().await, Frame::new("D", vec![3]));

            drop(peer);
            let (mut peer, name) = Peer::accept(&listener).await;
            assert_eq!(name, "Test");
            assert_eq!(peer.next_frame().await, listen_frame("A:B").unwrap());
            assert_eq!(peer.next_frame().await, listen_frame("C").unwrap());

            drop(messenger);
            assert_eq!(peer.next_frame().await.name(), DISCONNECT);
        });
    }
}
