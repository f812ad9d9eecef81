//! Trade bridge over the BGB link protocol.
//!
//! Implements the passive side of BGB 1.4 so an emulator running a Gen I game
//! can trade with the session. See: <https://bgb.bircd.org/bgblink.html>
//!
//! The emulator drives the clock. Every SYNC1 byte is clocked through the
//! session's edge path and answered with the bits it drove, carried in SYNC2.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel as cb;
use log::{debug, info, trace, warn};
use pkmn_link_core::platform::{LinkPort, PendingTasks};
use pkmn_link_core::session::Session;
use pkmn_link_core::soft_link::SoftLink;
use pkmn_link_core::status::LinkStatus;
use thiserror::Error;

const CMD_VERSION: u8 = 1;
const CMD_JOYPAD: u8 = 101;
const CMD_SYNC1: u8 = 104;
const CMD_SYNC2: u8 = 105;
const CMD_SYNC3: u8 = 106;
const CMD_STATUS: u8 = 108;
const CMD_WANTDISCONNECT: u8 = 109;

const STATUS_RUNNING: u8 = 0x01;
const STATUS_PAUSED: u8 = 0x02;
const STATUS_SUPPORT_RECONNECT: u8 = 0x04;

/// Port BGB listens on by default.
pub const DEFAULT_PORT: u16 = 8765;

const PACKET_SIZE: usize = 8;
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const CONNECT_RETRY_INTERVAL: Duration = Duration::from_millis(300);
const CONNECT_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(800);
const CONNECT_ATTEMPTS: u32 = 40;
const POLL_INTERVAL: Duration = Duration::from_micros(100);

#[derive(Error, Debug)]
pub enum BgbError {
    #[error("link I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("peer sent VERSION {major}.{minor} (cmd {cmd}), expected 1.4")]
    Version { cmd: u8, major: u8, minor: u8 },
    #[error("expected STATUS during handshake, got command {0}")]
    UnexpectedCommand(u8),
    #[error("invalid endpoint {0:?}, expected HOST:PORT")]
    Endpoint(String),
    #[error("no address resolved for {0}")]
    Resolve(String),
    #[error("connection to {endpoint} failed after {attempts} attempt(s): {detail}")]
    Connect {
        endpoint: String,
        attempts: u32,
        detail: String,
    },
    #[error("link thread panicked")]
    ThreadPanicked,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BgbPacket {
    pub b1: u8,
    pub b2: u8,
    pub b3: u8,
    pub b4: u8,
    pub i1: u32,
}

impl BgbPacket {
    pub fn to_bytes(self) -> [u8; PACKET_SIZE] {
        let mut buf = [0u8; PACKET_SIZE];
        buf[0] = self.b1;
        buf[1] = self.b2;
        buf[2] = self.b3;
        buf[3] = self.b4;
        buf[4..8].copy_from_slice(&self.i1.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8; PACKET_SIZE]) -> Self {
        Self {
            b1: buf[0],
            b2: buf[1],
            b3: buf[2],
            b4: buf[3],
            i1: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
        }
    }

    pub fn version() -> Self {
        Self {
            b1: CMD_VERSION,
            b2: 1,
            b3: 4,
            b4: 0,
            i1: 0,
        }
    }

    pub fn status(running: bool, paused: bool, support_reconnect: bool) -> Self {
        let mut flags = 0u8;
        if running {
            flags |= STATUS_RUNNING;
        }
        if paused {
            flags |= STATUS_PAUSED;
        }
        if support_reconnect {
            flags |= STATUS_SUPPORT_RECONNECT;
        }
        Self {
            b1: CMD_STATUS,
            b2: flags,
            ..Self::default()
        }
    }

    /// Master transfer of `data` on the internal clock at normal speed.
    pub fn sync1(data: u8, timestamp: u32) -> Self {
        Self {
            b1: CMD_SYNC1,
            b2: data,
            b3: 0x81,
            b4: 0,
            i1: timestamp & 0x7FFF_FFFF,
        }
    }

    pub fn sync2(data: u8, response_to_sync1: bool) -> Self {
        Self {
            b1: CMD_SYNC2,
            b2: data,
            b3: 0x80,
            b4: u8::from(response_to_sync1),
            i1: 0,
        }
    }

    pub fn sync3_timestamp(timestamp: u32) -> Self {
        Self {
            b1: CMD_SYNC3,
            i1: timestamp & 0x7FFF_FFFF,
            ..Self::default()
        }
    }

    pub fn want_disconnect() -> Self {
        Self {
            b1: CMD_WANTDISCONNECT,
            ..Self::default()
        }
    }

    pub fn is_sync2(&self) -> bool {
        self.b1 == CMD_SYNC2
    }

    fn is_version_1_4(&self) -> bool {
        self.b1 == CMD_VERSION && self.b2 == 1 && self.b3 == 4 && self.b4 == 0
    }
}

/// Where the bridge finds its peer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BridgeMode {
    Listen { port: u16 },
    Connect { host: String, port: u16 },
}

impl BridgeMode {
    /// Parses `HOST:PORT`; bracketed IPv6 hosts are accepted.
    pub fn connect_to(endpoint: &str) -> Result<Self, BgbError> {
        let invalid = || BgbError::Endpoint(endpoint.to_string());
        let (host, port) = endpoint.rsplit_once(':').ok_or_else(invalid)?;
        let port = port.parse::<u16>().map_err(|_| invalid())?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(invalid());
        }
        Ok(Self::Connect {
            host: host.to_string(),
            port,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkEvent {
    Listening { port: u16 },
    Connected { peer: SocketAddr },
    StatusChanged(LinkStatus),
    /// A pokemon arrived in local slot 0.
    Traded { display_index: u8 },
    RemotePaused,
    RemoteResumed,
    Disconnected,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RemoteStatus {
    pub paused: bool,
    pub supports_reconnect: bool,
}

impl RemoteStatus {
    fn from_flags(flags: u8) -> Self {
        Self {
            paused: flags & STATUS_PAUSED != 0,
            supports_reconnect: flags & STATUS_SUPPORT_RECONNECT != 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketOutcome {
    Continue,
    Disconnect,
}

/// The session as seen from the BGB socket.
pub struct LinkPeer {
    link: SoftLink,
    pending: Arc<PendingTasks>,
    events: cb::Sender<LinkEvent>,
    remote: RemoteStatus,
    last_remote_sync3_timestamp: Option<u32>,
    last_status: LinkStatus,
}

impl LinkPeer {
    pub fn new(
        session: Session,
        pending: Arc<PendingTasks>,
        events: cb::Sender<LinkEvent>,
    ) -> Self {
        let last_status = session.status();
        Self {
            link: SoftLink::bind(session),
            pending,
            events,
            remote: RemoteStatus::default(),
            last_remote_sync3_timestamp: None,
            last_status,
        }
    }

    pub fn session(&self) -> &Session {
        self.link.session()
    }

    pub fn remote(&self) -> RemoteStatus {
        self.remote
    }

    pub fn into_session(self) -> Session {
        self.link.unbind()
    }

    fn connected(&mut self, peer: SocketAddr, remote: RemoteStatus) {
        self.remote = remote;
        self.last_remote_sync3_timestamp = None;
        self.notify(LinkEvent::Connected { peer });
    }

    fn notify(&self, event: LinkEvent) {
        let _ = self.events.try_send(event);
    }

    pub fn handle_packet(
        &mut self,
        packet: BgbPacket,
        tx_queue: &mut VecDeque<u8>,
    ) -> PacketOutcome {
        match packet.b1 {
            CMD_VERSION => {
                trace!("Link: received late VERSION packet");
            }
            CMD_JOYPAD => {
                // Remote joypad control does not apply to a trade partner.
            }
            CMD_STATUS => {
                let remote = RemoteStatus::from_flags(packet.b2);
                if remote.paused != self.remote.paused {
                    self.notify(if remote.paused {
                        LinkEvent::RemotePaused
                    } else {
                        LinkEvent::RemoteResumed
                    });
                }
                self.remote = remote;
            }
            CMD_SYNC1 => {
                let reply = self.link.transfer(packet.b2);
                trace!("Link: SYNC1 0x{:02X} -> 0x{:02X}", packet.b2, reply);
                queue_packet(tx_queue, BgbPacket::sync2(reply, true));
                self.run_deferred();
                self.report_status();
            }
            CMD_SYNC2 => {
                // We never start a transfer, so there is nothing to answer.
                trace!("Link: ignoring unexpected SYNC2");
            }
            CMD_SYNC3 => {
                if packet.b2 == 1 {
                    trace!("Link: ignoring SYNC3 ack");
                } else {
                    // Echo each remote timestamp once; echoing echoes would
                    // ping-pong forever.
                    let is_new = self.last_remote_sync3_timestamp != Some(packet.i1);
                    self.last_remote_sync3_timestamp = Some(packet.i1);
                    if is_new {
                        queue_packet(tx_queue, BgbPacket::sync3_timestamp(packet.i1));
                    }
                }
            }
            CMD_WANTDISCONNECT => {
                info!("Link: peer asked to disconnect");
                return PacketOutcome::Disconnect;
            }
            _ => {
                trace!("Link: ignoring unknown command {}", packet.b1);
            }
        }
        PacketOutcome::Continue
    }

    fn run_deferred(&mut self) {
        for task in self.pending.take_all() {
            self.link.session_mut().run_deferred(task);
        }
    }

    fn report_status(&mut self) {
        let status = self.link.session().status();
        if status == self.last_status {
            return;
        }
        info!("Link: {} -> {}", self.last_status, status);
        self.last_status = status;
        self.notify(LinkEvent::StatusChanged(status));

        if status == LinkStatus::Trading {
            let display_index = self.link.session().status_cell().display_index();
            self.notify(LinkEvent::Traded { display_index });
        }
    }
}

fn send_packet(stream: &mut TcpStream, packet: &BgbPacket) -> io::Result<()> {
    stream.write_all(&packet.to_bytes())?;
    stream.flush()
}

pub fn read_blocking_packet(stream: &mut TcpStream) -> io::Result<BgbPacket> {
    let mut buf = [0u8; PACKET_SIZE];
    stream.read_exact(&mut buf)?;
    Ok(BgbPacket::from_bytes(&buf))
}

fn read_version(stream: &mut TcpStream) -> Result<(), BgbError> {
    let version = read_blocking_packet(stream)?;
    if !version.is_version_1_4() {
        return Err(BgbError::Version {
            cmd: version.b1,
            major: version.b2,
            minor: version.b3,
        });
    }
    Ok(())
}

fn read_status(stream: &mut TcpStream) -> Result<RemoteStatus, BgbError> {
    let status = read_blocking_packet(stream)?;
    if status.b1 != CMD_STATUS {
        return Err(BgbError::UnexpectedCommand(status.b1));
    }
    Ok(RemoteStatus::from_flags(status.b2))
}

pub fn handshake_client(stream: &mut TcpStream) -> Result<RemoteStatus, BgbError> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT))?;

    send_packet(stream, &BgbPacket::version())?;
    read_version(stream)?;
    let remote = read_status(stream)?;
    send_packet(stream, &BgbPacket::status(true, false, true))?;

    stream.set_read_timeout(None)?;
    info!("Link: BGB client handshake complete");
    Ok(remote)
}

pub fn handshake_server(stream: &mut TcpStream) -> Result<RemoteStatus, BgbError> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT))?;

    read_version(stream)?;
    send_packet(stream, &BgbPacket::version())?;
    // BGB announces itself paused first, then running.
    send_packet(stream, &BgbPacket::status(true, true, true))?;
    send_packet(stream, &BgbPacket::status(true, false, true))?;
    let remote = read_status(stream)?;

    stream.set_read_timeout(None)?;
    info!("Link: BGB server handshake complete");
    Ok(remote)
}

fn resolve_socket_addr(host: &str, port: u16) -> Result<SocketAddr, BgbError> {
    let endpoint = format!("{host}:{port}");
    if let Ok(addr) = endpoint.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = host.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }

    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or(BgbError::Resolve(endpoint))
}

fn queue_packet(tx_queue: &mut VecDeque<u8>, packet: BgbPacket) {
    tx_queue.extend(packet.to_bytes());
}

fn flush_send_queue(stream: &mut TcpStream, tx_queue: &mut VecDeque<u8>) -> io::Result<()> {
    while !tx_queue.is_empty() {
        let (front, _) = tx_queue.as_slices();
        match stream.write(front) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "socket closed while writing",
                ));
            }
            Ok(written) => {
                tx_queue.drain(..written);
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

enum ReadState {
    Alive,
    Disconnected,
}

fn poll_stream_read(stream: &mut TcpStream, rx_buf: &mut Vec<u8>) -> io::Result<ReadState> {
    let mut temp = [0u8; 1024];
    loop {
        match stream.read(&mut temp) {
            Ok(0) => return Ok(ReadState::Disconnected),
            Ok(n) => {
                rx_buf.extend_from_slice(&temp[..n]);
                if n < temp.len() {
                    return Ok(ReadState::Alive);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(ReadState::Alive),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}

fn drain_packets(rx_buf: &mut Vec<u8>) -> Vec<BgbPacket> {
    let packets = rx_buf
        .chunks_exact(PACKET_SIZE)
        .filter_map(|chunk| <&[u8; PACKET_SIZE]>::try_from(chunk).ok())
        .map(BgbPacket::from_bytes)
        .collect::<Vec<_>>();
    rx_buf.drain(..packets.len() * PACKET_SIZE);
    packets
}

fn accept_peer(
    port: u16,
    peer: &LinkPeer,
    shutdown: &AtomicBool,
) -> Result<Option<(TcpStream, SocketAddr, RemoteStatus)>, BgbError> {
    let listener = TcpListener::bind(("0.0.0.0", port))?;
    listener.set_nonblocking(true)?;
    let port = listener.local_addr()?.port();
    info!("Link: listening on port {port}");
    peer.notify(LinkEvent::Listening { port });

    while !shutdown.load(Ordering::Acquire) {
        match listener.accept() {
            Ok((mut stream, addr)) => {
                info!("Link: accepted connection from {addr}");
                let _ = stream.set_nodelay(true);
                match handshake_server(&mut stream) {
                    Ok(remote) => return Ok(Some((stream, addr, remote))),
                    Err(e) => warn!("Link: BGB handshake failed with {addr}: {e}"),
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(POLL_INTERVAL * 10),
            Err(e) => warn!("Link: listener accept error: {e}"),
        }
    }
    Ok(None)
}

fn connect_peer(
    host: &str,
    port: u16,
    shutdown: &AtomicBool,
) -> Result<Option<(TcpStream, SocketAddr, RemoteStatus)>, BgbError> {
    let addr = resolve_socket_addr(host, port)?;
    info!("Link: connecting to {addr}");

    let mut detail = String::from("timed out while waiting for peer");
    for attempt in 1..=CONNECT_ATTEMPTS {
        if shutdown.load(Ordering::Acquire) {
            return Ok(None);
        }
        debug!("Link: connection attempt {attempt} to {addr}");

        match TcpStream::connect_timeout(&addr, CONNECT_ATTEMPT_TIMEOUT) {
            Ok(mut stream) => {
                let _ = stream.set_nodelay(true);
                match handshake_client(&mut stream) {
                    Ok(remote) => {
                        info!("Link: connected to {addr} after {attempt} attempt(s)");
                        return Ok(Some((stream, addr, remote)));
                    }
                    Err(e) => detail = e.to_string(),
                }
            }
            Err(e) => detail = e.to_string(),
        }
        thread::sleep(CONNECT_RETRY_INTERVAL);
    }

    Err(BgbError::Connect {
        endpoint: addr.to_string(),
        attempts: CONNECT_ATTEMPTS,
        detail,
    })
}

/// Serves one BGB connection until the peer leaves or `shutdown` is set.
pub fn run_bridge(
    mode: &BridgeMode,
    peer: &mut LinkPeer,
    shutdown: &AtomicBool,
) -> Result<(), BgbError> {
    let established = match mode {
        BridgeMode::Listen { port } => accept_peer(*port, peer, shutdown)?,
        BridgeMode::Connect { host, port } => connect_peer(host, *port, shutdown)?,
    };
    let Some((mut stream, addr, remote)) = established else {
        return Ok(());
    };
    stream.set_nonblocking(true)?;
    peer.connected(addr, remote);

    let mut rx_buf: Vec<u8> = Vec::new();
    let mut tx_queue: VecDeque<u8> = VecDeque::new();

    'serve: while !shutdown.load(Ordering::Acquire) {
        match poll_stream_read(&mut stream, &mut rx_buf) {
            Ok(ReadState::Alive) => {}
            Ok(ReadState::Disconnected) => {
                info!("Link: peer closed the connection");
                break;
            }
            Err(e) => {
                warn!("Link: read error: {e}");
                break;
            }
        }

        for packet in drain_packets(&mut rx_buf) {
            trace!(
                "Link: received cmd={} b2=0x{:02X} b3=0x{:02X} b4=0x{:02X} ts={}",
                packet.b1, packet.b2, packet.b3, packet.b4, packet.i1
            );
            if peer.handle_packet(packet, &mut tx_queue) == PacketOutcome::Disconnect {
                let _ = flush_send_queue(&mut stream, &mut tx_queue);
                break 'serve;
            }
        }

        if let Err(e) = flush_send_queue(&mut stream, &mut tx_queue) {
            warn!("Link: write error: {e}");
            break;
        }

        thread::sleep(POLL_INTERVAL);
    }

    if shutdown.load(Ordering::Acquire) && peer.remote().supports_reconnect {
        let _ = stream.set_nonblocking(false);
        let _ = send_packet(&mut stream, &BgbPacket::want_disconnect());
    }
    Ok(())
}

/// A bridge running on its own thread.
pub struct BridgeHandle {
    thread: JoinHandle<Result<Session, BgbError>>,
    events: cb::Receiver<LinkEvent>,
    shutdown: Arc<AtomicBool>,
}

impl BridgeHandle {
    /// Events end once the bridge thread has finished.
    pub fn events(&self) -> &cb::Receiver<LinkEvent> {
        &self.events
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    /// Waits for the bridge and hands the session back.
    pub fn join(self) -> Result<Session, BgbError> {
        self.thread.join().map_err(|_| BgbError::ThreadPanicked)?
    }
}

pub fn spawn_bridge(
    mode: BridgeMode,
    session: Session,
    pending: Arc<PendingTasks>,
) -> io::Result<BridgeHandle> {
    let (event_tx, event_rx) = cb::unbounded();
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);

    let thread = thread::Builder::new()
        .name("bgb-link".to_string())
        .spawn(move || {
            let mut peer = LinkPeer::new(session, pending, event_tx);
            let result = run_bridge(&mode, &mut peer, &shutdown_flag);
            peer.notify(LinkEvent::Disconnected);
            result.map(|()| peer.into_session())
        })?;

    Ok(BridgeHandle {
        thread,
        events: event_rx,
        shutdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkmn_link_core::platform::RawSpecies;
    use pkmn_link_core::record::TradeRecord;
    use pkmn_link_core::status::StatusCell;
    use pkmn_link_core::wire::{BLANK, CONNECTED, MASTER, SLAVE};

    fn pop_packet(tx_queue: &mut VecDeque<u8>) -> BgbPacket {
        assert!(tx_queue.len() >= PACKET_SIZE, "expected a queued packet");
        let mut bytes = [0u8; PACKET_SIZE];
        for byte in &mut bytes {
            *byte = tx_queue.pop_front().expect("queued byte");
        }
        BgbPacket::from_bytes(&bytes)
    }

    fn peer() -> (LinkPeer, cb::Receiver<LinkEvent>) {
        let (event_tx, event_rx) = cb::unbounded();
        let pending = Arc::new(PendingTasks::new());
        let session = Session::enter(
            TradeRecord::zeroed(),
            Arc::new(RawSpecies),
            Arc::new(StatusCell::new()),
            pending.clone(),
        );
        (LinkPeer::new(session, pending, event_tx), event_rx)
    }

    #[test]
    fn packet_layout_is_little_endian() {
        let packet = BgbPacket::sync1(0xA5, 0x8123_4567);
        let bytes = packet.to_bytes();
        assert_eq!(bytes, [CMD_SYNC1, 0xA5, 0x81, 0, 0x67, 0x45, 0x23, 0x01]);
        assert_eq!(BgbPacket::from_bytes(&bytes), packet);
    }

    #[test]
    fn sync1_answers_with_previous_reply() {
        let (mut peer, _events) = peer();
        let mut tx_queue = VecDeque::new();

        peer.handle_packet(BgbPacket::sync1(MASTER, 0), &mut tx_queue);
        let first = pop_packet(&mut tx_queue);
        assert_eq!(first, BgbPacket::sync2(BLANK, true));

        peer.handle_packet(BgbPacket::sync1(MASTER, 100), &mut tx_queue);
        let second = pop_packet(&mut tx_queue);
        assert_eq!(second.b1, CMD_SYNC2);
        assert_eq!(second.b2, SLAVE);
        assert_eq!(second.b3, 0x80);
        assert_eq!(second.b4, 1);
        assert!(tx_queue.is_empty());
    }

    #[test]
    fn status_changes_are_reported_once() {
        let (mut peer, events) = peer();
        let mut tx_queue = VecDeque::new();

        peer.handle_packet(BgbPacket::sync1(CONNECTED, 0), &mut tx_queue);
        peer.handle_packet(BgbPacket::sync1(CONNECTED, 0), &mut tx_queue);
        assert_eq!(
            events.try_iter().collect::<Vec<_>>(),
            vec![LinkEvent::StatusChanged(LinkStatus::Connected)]
        );
    }

    #[test]
    fn sync3_timestamp_echoes_once_per_unique_remote_timestamp() {
        let (mut peer, _events) = peer();
        let mut tx_queue = VecDeque::new();

        peer.handle_packet(BgbPacket::sync3_timestamp(0x0012_3456), &mut tx_queue);
        let first = pop_packet(&mut tx_queue);
        assert_eq!(first.b1, CMD_SYNC3);
        assert_eq!(first.b2, 0);
        assert_eq!(first.i1, 0x0012_3456);

        peer.handle_packet(BgbPacket::sync3_timestamp(0x0012_3456), &mut tx_queue);
        assert!(tx_queue.is_empty());

        peer.handle_packet(BgbPacket::sync3_timestamp(0x0012_3856), &mut tx_queue);
        assert_eq!(pop_packet(&mut tx_queue).i1, 0x0012_3856);
    }

    #[test]
    fn sync3_ack_and_stray_sync2_are_ignored() {
        let (mut peer, _events) = peer();
        let mut tx_queue = VecDeque::new();
        let ack = BgbPacket {
            b1: CMD_SYNC3,
            b2: 1,
            ..BgbPacket::default()
        };
        assert_eq!(peer.handle_packet(ack, &mut tx_queue), PacketOutcome::Continue);
        peer.handle_packet(BgbPacket::sync2(0x42, true), &mut tx_queue);
        assert!(tx_queue.is_empty());
        assert_eq!(peer.session().status(), LinkStatus::NotConnected);
    }

    #[test]
    fn remote_pause_is_tracked() {
        let (mut peer, events) = peer();
        let mut tx_queue = VecDeque::new();

        peer.handle_packet(BgbPacket::status(true, true, true), &mut tx_queue);
        assert!(peer.remote().paused);
        assert!(peer.remote().supports_reconnect);
        peer.handle_packet(BgbPacket::status(true, false, false), &mut tx_queue);
        assert!(!peer.remote().supports_reconnect);

        assert_eq!(
            events.try_iter().collect::<Vec<_>>(),
            vec![LinkEvent::RemotePaused, LinkEvent::RemoteResumed]
        );
    }

    #[test]
    fn want_disconnect_ends_the_connection() {
        let (mut peer, _events) = peer();
        let mut tx_queue = VecDeque::new();
        assert_eq!(
            peer.handle_packet(BgbPacket::want_disconnect(), &mut tx_queue),
            PacketOutcome::Disconnect
        );
    }

    #[test]
    fn drain_packets_keeps_partial_tail() {
        let mut rx_buf = BgbPacket::version().to_bytes().to_vec();
        rx_buf.extend_from_slice(&[CMD_SYNC1, 0x60, 0x81]);
        let packets = drain_packets(&mut rx_buf);
        assert_eq!(packets, vec![BgbPacket::version()]);
        assert_eq!(rx_buf, vec![CMD_SYNC1, 0x60, 0x81]);
    }

    #[test]
    fn connect_endpoint_parsing() {
        assert_eq!(
            BridgeMode::connect_to("localhost:8765").unwrap(),
            BridgeMode::Connect {
                host: "localhost".to_string(),
                port: 8765
            }
        );
        assert_eq!(
            BridgeMode::connect_to("[::1]:9000").unwrap(),
            BridgeMode::Connect {
                host: "::1".to_string(),
                port: 9000
            }
        );
        assert!(BridgeMode::connect_to("localhost").is_err());
        assert!(BridgeMode::connect_to(":8765").is_err());
        assert!(BridgeMode::connect_to("host:99999").is_err());
    }

    #[test]
    fn resolve_socket_addr_accepts_numeric_host() {
        let addr = resolve_socket_addr("127.0.0.1", 5000).expect("numeric host should parse");
        assert_eq!(addr.port(), 5000);
        assert!(addr.ip().is_ipv4());

        let v6 = resolve_socket_addr("::1", 5000).expect("numeric v6 host should parse");
        assert!(v6.ip().is_ipv6());
    }

    #[test]
    fn server_and_client_handshakes_agree() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");

        let server = thread::spawn(move || {
            let (mut accepted, _) = listener.accept().expect("accept client");
            accepted
                .set_nonblocking(true)
                .expect("set accepted socket non-blocking");
            handshake_server(&mut accepted).map_err(|e| e.to_string())
        });

        let mut client = TcpStream::connect(addr).expect("connect client");
        let client_remote = handshake_client(&mut client).expect("client handshake");
        let server_remote = server
            .join()
            .expect("join server thread")
            .expect("server handshake");

        // The server's second STATUS is still in flight after the handshake.
        assert!(client_remote.paused);
        assert!(client_remote.supports_reconnect);
        assert!(!server_remote.paused);
        assert!(server_remote.supports_reconnect);
    }
}
