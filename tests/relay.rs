//! End-to-end tests driving a real server over loopback TCP

use std::net::SocketAddr;
use std::time::Duration;

use parley::{ChatServer, ServerConfig};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

async fn start_server(save_dir: std::path::PathBuf) -> SocketAddr {
    let config = ServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        save_dir,
        ..ServerConfig::default()
    };
    let mut server = ChatServer::new(config);
    let addr = server.bind().await.expect("bind");
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect");
        let (read, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read).lines(),
            writer,
        }
    }

    /// Connect and claim a name; waits for the guide so the session is Active
    async fn login(addr: SocketAddr, name: &str) -> Self {
        let mut client = Self::connect(addr).await;
        client.send(name).await;
        client.expect("Disconnect : /bye").await;
        client
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .expect("send");
    }

    async fn recv(&mut self) -> String {
        timeout(RECV_TIMEOUT, self.lines.next_line())
            .await
            .expect("timed out waiting for a line")
            .expect("read")
            .expect("server closed the connection")
    }

    /// Read lines until one contains `needle`, returning it.
    /// Panics (via timeout) when the server never says it.
    async fn expect(&mut self, needle: &str) -> String {
        loop {
            let line = self.recv().await;
            if line.contains(needle) {
                return line;
            }
        }
    }
}

fn temp_save_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("tempdir")
}

#[tokio::test]
async fn test_create_join_and_broadcast() {
    let dir = temp_save_dir();
    let addr = start_server(dir.path().to_path_buf()).await;

    let mut alice = Client::login(addr, "alice").await;
    alice.send("/create").await;
    alice.expect("alice has joined the room.").await;

    let mut bob = Client::login(addr, "bob").await;
    bob.send("/join 1").await;
    bob.expect("bob has joined the room.").await;
    alice.expect("bob has joined the room.").await;

    alice.send("hello").await;
    alice.expect("alice: hello").await;
    bob.expect("alice: hello").await;
}

#[tokio::test]
async fn test_duplicate_identity_is_rejected_then_retried() {
    let dir = temp_save_dir();
    let addr = start_server(dir.path().to_path_buf()).await;

    let _alice = Client::login(addr, "alice").await;

    let mut second = Client::connect(addr).await;
    second.send("alice").await;
    second.expect("already taken").await;
    second.send("alice2").await;
    second.expect("Disconnect : /bye").await;

    second.send("/users").await;
    let line = second.expect("Connected users:").await;
    assert!(line.contains("alice"));
    assert!(line.contains("alice2"));
}

#[tokio::test]
async fn test_blank_identity_is_reprompted() {
    let dir = temp_save_dir();
    let addr = start_server(dir.path().to_path_buf()).await;

    let mut client = Client::connect(addr).await;
    client.send("   ").await;
    client.expect("cannot be blank").await;
    client.send("carol").await;
    client.expect("Disconnect : /bye").await;
}

#[tokio::test]
async fn test_lobby_chat_yields_guidance() {
    let dir = temp_save_dir();
    let addr = start_server(dir.path().to_path_buf()).await;

    let mut alice = Client::login(addr, "alice").await;
    alice.send("hello").await;
    alice.expect("Join a room first").await;
}

#[tokio::test]
async fn test_whisper_to_absent_user() {
    let dir = temp_save_dir();
    let addr = start_server(dir.path().to_path_buf()).await;

    let mut alice = Client::login(addr, "alice").await;
    alice.send("@bob hi").await;
    alice.expect("bob is not connected.").await;
}

#[tokio::test]
async fn test_whisper_between_users() {
    let dir = temp_save_dir();
    let addr = start_server(dir.path().to_path_buf()).await;

    let mut alice = Client::login(addr, "alice").await;
    let mut bob = Client::login(addr, "bob").await;

    alice.send("@bob psst").await;
    alice.expect("Whisper sent.").await;
    bob.expect("alice's whisper: psst").await;
}

#[tokio::test]
async fn test_exit_notifies_room_and_room_stays_live() {
    let dir = temp_save_dir();
    let addr = start_server(dir.path().to_path_buf()).await;

    let mut alice = Client::login(addr, "alice").await;
    alice.send("/create").await;
    alice.expect("alice has joined the room.").await;

    let mut bob = Client::login(addr, "bob").await;
    bob.send("/join 1").await;
    bob.expect("bob has joined the room.").await;

    bob.send("/exit").await;
    bob.expect("You left the room.").await;
    bob.expect("Disconnect : /bye").await; // guide re-shown
    alice.expect("bob has left the room.").await;

    alice.send("/list").await;
    alice.expect("Rooms: 1").await;
}

#[tokio::test]
async fn test_bye_closes_the_session_and_frees_the_name() {
    let dir = temp_save_dir();
    let addr = start_server(dir.path().to_path_buf()).await;

    let mut alice = Client::login(addr, "alice").await;
    alice.send("/bye").await;
    alice.expect("Goodbye.").await;
    // the server closes; next_line eventually yields None
    let closed = timeout(RECV_TIMEOUT, async {
        while let Ok(Some(_)) = alice.lines.next_line().await {}
    })
    .await;
    assert!(closed.is_ok(), "connection should close after /bye");

    // the identity is free again
    let _alice_again = Client::login(addr, "alice").await;
}

#[tokio::test]
async fn test_abrupt_disconnect_cleans_up() {
    let dir = temp_save_dir();
    let addr = start_server(dir.path().to_path_buf()).await;

    let bob = Client::login(addr, "bob").await;
    drop(bob); // hang up without /bye

    let mut alice = Client::login(addr, "alice").await;
    // cleanup is asynchronous; poll /users until bob is gone
    let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
    loop {
        alice.send("/users").await;
        let line = alice.expect("Connected users:").await;
        if !line.contains("bob") {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "bob was never deregistered"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[tokio::test]
async fn test_save_writes_room_history() {
    let dir = temp_save_dir();
    let addr = start_server(dir.path().to_path_buf()).await;

    let mut alice = Client::login(addr, "alice").await;
    alice.send("/create").await;
    alice.expect("alice has joined the room.").await;
    alice.send("hello room").await;
    alice.expect("alice: hello room").await;

    alice.send("/save").await;
    alice.expect("Chat log saved.").await;

    let path = dir.path().join("alice_room1_chatlog.txt");
    let contents = std::fs::read_to_string(&path).expect("saved log");
    assert_eq!(contents, "alice: hello room\n");
}
