use core::net::SocketAddrV4;

use embedded_nal::UdpClientStack;

use crate::clock::{elapsed, Millis, Monotonic};

/// Longest wait for the stack to accept an outgoing datagram
pub const SEND_TIMEOUT: Millis = Millis::from_ticks(1000);

/// Unreliable datagram link used for the one-shot clock synchronization
pub trait DatagramChannel {
    type Error: core::fmt::Debug;

    /// Sends one datagram to `remote`
    fn send(&mut self, remote: SocketAddrV4, payload: &[u8]) -> Result<(), Self::Error>;

    /// Waits at most `timeout` for one datagram
    /// returns the number of bytes received, None if the wait timed out
    fn receive(&mut self, buffer: &mut [u8], timeout: Millis) -> Result<Option<usize>, Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError<E: core::fmt::Debug> {
    /// `receive` was called without a preceding `send`
    #[error("no open socket")]
    NotConnected,

    #[error("send did not complete in time")]
    SendTimeout,

    #[error("network stack error: {0:?}")]
    Stack(E),
}

/// `embedded-nal` 0.8 addresses are the `no-std-net` types
fn nal_address(remote: SocketAddrV4) -> embedded_nal::SocketAddr {
    let ip = embedded_nal::Ipv4Addr::from(remote.ip().octets());
    embedded_nal::SocketAddr::V4(embedded_nal::SocketAddrV4::new(ip, remote.port()))
}

/// [`DatagramChannel`] over any `embedded-nal` UDP stack.
/// The socket is opened by `send` and closed once `receive` returns.
pub struct NalChannel<S: UdpClientStack, M> {
    stack: S,
    timer: M,
    socket: Option<S::UdpSocket>,
}

impl<S: UdpClientStack, M: Monotonic> NalChannel<S, M> {
    pub fn new(stack: S, timer: M) -> NalChannel<S, M> {
        Self {
            stack,
            timer,
            socket: None,
        }
    }

    pub fn release(mut self) -> S {
        self.close();
        self.stack
    }

    fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            if self.stack.close(socket).is_err() {
                warn!("udp: close failed");
            }
        }
    }
}

impl<S: UdpClientStack, M: Monotonic> DatagramChannel for NalChannel<S, M> {
    type Error = ChannelError<S::Error>;

    fn send(&mut self, remote: SocketAddrV4, payload: &[u8]) -> Result<(), Self::Error> {
        self.close();
        let mut socket = self.stack.socket().map_err(ChannelError::Stack)?;
        if let Err(e) = self.stack.connect(&mut socket, nal_address(remote)) {
            let _ = self.stack.close(socket);
            return Err(ChannelError::Stack(e));
        }

        let started = self.timer.now();
        let sent = loop {
            match self.stack.send(&mut socket, payload) {
                Ok(()) => break Ok(()),
                Err(nb::Error::WouldBlock) => {
                    if elapsed(self.timer.now(), started) >= SEND_TIMEOUT {
                        break Err(ChannelError::SendTimeout);
                    }
                }
                Err(nb::Error::Other(e)) => break Err(ChannelError::Stack(e)),
            }
        };

        self.socket = Some(socket);
        if sent.is_err() {
            self.close();
        }
        sent
    }

    fn receive(&mut self, buffer: &mut [u8], timeout: Millis) -> Result<Option<usize>, Self::Error> {
        let Some(mut socket) = self.socket.take() else {
            return Err(ChannelError::NotConnected);
        };

        let started = self.timer.now();
        let result = loop {
            match self.stack.receive(&mut socket, buffer) {
                Ok((len, _from)) => break Ok(Some(len)),
                Err(nb::Error::WouldBlock) => {
                    if elapsed(self.timer.now(), started) >= timeout {
                        break Ok(None);
                    }
                }
                Err(nb::Error::Other(e)) => break Err(ChannelError::Stack(e)),
            }
        };

        self.socket = Some(socket);
        self.close();
        result
    }
}
